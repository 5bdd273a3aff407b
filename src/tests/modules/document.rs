use pretty_assertions::assert_eq;

use crate::{doc, oid::ObjectId, Bson, Document};

#[test]
fn ordered_insert() {
    let mut doc = Document::new();
    doc.insert("first", 1);
    doc.insert("second", "foo");
    doc.insert("alphanumeric", "bar");

    let expected_keys = vec![
        "first".to_owned(),
        "second".to_owned(),
        "alphanumeric".to_owned(),
    ];
    let keys: Vec<_> = doc.iter().map(|(key, _)| key.to_owned()).collect();
    assert_eq!(expected_keys, keys);
}

#[test]
fn reinsert_keeps_position() {
    let mut doc = doc! { "a": 1, "b": 2 };
    doc.insert("a", 3);
    let entries: Vec<_> = doc.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    assert_eq!(
        entries,
        vec![
            ("a".to_string(), Bson::Int32(3)),
            ("b".to_string(), Bson::Int32(2)),
        ]
    );
}

#[test]
fn remove_preserves_order() {
    let mut doc = doc! { "a": 1, "b": 2, "c": 3 };
    assert_eq!(doc.remove("b"), Some(Bson::Int32(2)));
    let keys: Vec<_> = doc.keys().cloned().collect();
    assert_eq!(keys, vec!["a".to_string(), "c".to_string()]);
    assert_eq!(doc.remove("b"), None);
}

#[test]
fn test_getters() {
    let datetime = crate::DateTime::from_millis(25_500_000_000);
    let cloned_dbpointer = crate::DbPointer {
        namespace: "db.coll".to_string(),
        id: ObjectId::from_bytes([1; 12]),
    };
    let doc = doc! {
        "floating_point": 10.0,
        "string": "a value",
        "array": [10, 20, 30],
        "doc": { "key": 1 },
        "bool": true,
        "i32": 1i32,
        "i64": 1i64,
        "datetime": datetime,
        "object_id": ObjectId::from_bytes([1; 12]),
        "dbpointer": cloned_dbpointer,
    };

    assert_eq!(doc.get_f64("floating_point").unwrap(), 10.0);
    assert_eq!(doc.get_str("string").unwrap(), "a value");
    assert_eq!(
        doc.get_array("array").unwrap(),
        &vec![Bson::Int32(10), Bson::Int32(20), Bson::Int32(30)]
    );
    assert_eq!(doc.get_document("doc").unwrap(), &doc! { "key": 1 });
    assert!(doc.get_bool("bool").unwrap());
    assert_eq!(doc.get_i32("i32").unwrap(), 1);
    assert_eq!(doc.get_i64("i64").unwrap(), 1);
    assert_eq!(doc.get_datetime("datetime").unwrap(), &datetime);
    assert_eq!(
        doc.get_object_id("object_id").unwrap(),
        ObjectId::from_bytes([1; 12])
    );

    assert!(doc.get_f64("string").unwrap_err().is_value_access_unexpected_type());
    assert!(doc.get_str("nonexistent").unwrap_err().is_value_access_not_present());
    assert!(doc.get("nonexistent").is_none());
}

#[test]
fn value_access_errors_carry_the_key() {
    let doc = doc! { "a": 1 };
    let err = doc.get_str("a").unwrap_err();
    assert_eq!(err.key.as_deref(), Some("a"));
    assert!(err.to_string().contains("a"));
}

#[test]
fn display_format() {
    let doc = doc! { "a": 1, "b": "two" };
    assert_eq!(format!("{}", doc), "{ \"a\": 1, \"b\": \"two\" }");
    assert_eq!(format!("{}", Document::new()), "{}");
}

#[test]
fn extend_and_from_iterator() {
    let mut doc = doc! { "a": 1 };
    doc.extend(doc! { "b": 2, "a": 3 });
    assert_eq!(doc, doc! { "a": 3, "b": 2 });

    let collected: Document = vec![
        ("x".to_string(), Bson::Int32(1)),
        ("y".to_string(), Bson::Boolean(false)),
    ]
    .into_iter()
    .collect();
    assert_eq!(collected, doc! { "x": 1, "y": false });
}
