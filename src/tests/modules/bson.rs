use assert_matches::assert_matches;
use pretty_assertions::assert_eq;

use crate::{bson, doc, spec::ElementType, Bson, DateTime, ObjectId, Regex, Timestamp};

#[test]
fn element_types() {
    assert_eq!(bson!(1.5).element_type(), ElementType::Double);
    assert_eq!(bson!("s").element_type(), ElementType::String);
    assert_eq!(bson!([1]).element_type(), ElementType::Array);
    assert_eq!(bson!({ "a": 1 }).element_type(), ElementType::EmbeddedDocument);
    assert_eq!(bson!(true).element_type(), ElementType::Boolean);
    assert_eq!(bson!(null).element_type(), ElementType::Null);
    assert_eq!(bson!(1).element_type(), ElementType::Int32);
    assert_eq!(bson!(1i64).element_type(), ElementType::Int64);
    assert_eq!(Bson::MinKey.element_type(), ElementType::MinKey);
    assert_eq!(Bson::MaxKey.element_type(), ElementType::MaxKey);
    assert_eq!(Bson::Undefined.element_type(), ElementType::Undefined);
    assert_eq!(
        Bson::Timestamp(Timestamp { time: 0, increment: 0 }).element_type(),
        ElementType::Timestamp
    );
}

#[test]
fn from_impls_choose_wire_types() {
    assert_matches!(Bson::from(1.5f32), Bson::Double(_));
    assert_matches!(Bson::from(1.5f64), Bson::Double(_));
    assert_matches!(Bson::from("s"), Bson::String(_));
    assert_matches!(Bson::from(String::from("s")), Bson::String(_));
    assert_matches!(Bson::from(5i32), Bson::Int32(5));
    assert_matches!(Bson::from(5i64), Bson::Int64(5));
    assert_matches!(Bson::from(5u8), Bson::Int32(5));
    assert_matches!(Bson::from(5u16), Bson::Int32(5));
    assert_matches!(Bson::from(5u32), Bson::Int64(5));
    assert_matches!(Bson::from(true), Bson::Boolean(true));
    assert_matches!(Bson::from(vec![1, 2]), Bson::Array(_));
    assert_matches!(Bson::from(Some(5i32)), Bson::Int32(5));
    assert_matches!(Bson::from(None::<i32>), Bson::Null);
    assert_matches!(
        Bson::from(ObjectId::from_bytes([0; 12])),
        Bson::ObjectId(_)
    );
    assert_matches!(
        Bson::from(DateTime::from_millis(0)),
        Bson::DateTime(_)
    );
}

#[test]
fn accessors() {
    let value = bson!({ "x": 1 });
    assert_eq!(value.as_document(), Some(&doc! { "x": 1 }));
    assert_eq!(value.as_array(), None);

    assert_eq!(bson!(42).as_i32(), Some(42));
    assert_eq!(bson!(42).as_i64(), Some(42));
    assert_eq!(bson!(42i64).as_i64(), Some(42));
    assert_eq!(bson!(42i64).as_i32(), None);
    assert_eq!(bson!(1.5).as_f64(), Some(1.5));
    assert_eq!(bson!("s").as_str(), Some("s"));
    assert_eq!(bson!(true).as_bool(), Some(true));
    assert_eq!(bson!(null).as_null(), Some(()));
    assert_eq!(bson!(null).as_bool(), None);
}

#[test]
fn display() {
    assert_eq!(format!("{}", bson!([1, "two", true])), "[1, \"two\", true]");
    assert_eq!(
        format!(
            "{}",
            Bson::RegularExpression(Regex {
                pattern: "^ab".to_string(),
                options: "i".to_string()
            })
        ),
        "/^ab/i"
    );
    assert_eq!(
        format!("{}", Bson::Timestamp(Timestamp { time: 1, increment: 2 })),
        "Timestamp(1, 2)"
    );
}

#[test]
fn object_id_hex_round_trip() {
    let oid = ObjectId::parse_str("506f77525c994ef7389f6abc").unwrap();
    assert_eq!(oid.to_hex(), "506f77525c994ef7389f6abc");
    assert_eq!(oid.timestamp(), 0x506f7752);
    assert!(ObjectId::parse_str("deadbeef").is_err());
    assert!(ObjectId::parse_str("zzzzzzzzzzzzzzzzzzzzzzzz").is_err());
}
