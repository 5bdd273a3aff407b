use std::collections::{HashMap, HashSet};

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use crate::{
    bson,
    de::{decode_array, decode_document, DecodeOptions, Utf8Validation},
    doc,
    error::ErrorKind,
    oid::ObjectId,
    spec::BinarySubtype,
    Bson,
    DateTime,
    Decimal128,
    Document,
    Timestamp,
};

/// Wraps an element body in document framing: length prefix and terminator.
fn doc_bytes(body: &[u8]) -> Vec<u8> {
    let size = (4 + body.len() + 1) as i32;
    let mut out = size.to_le_bytes().to_vec();
    out.extend_from_slice(body);
    out.push(0);
    out
}

/// One element: type tag, key cstring, payload.
fn elem(tag: u8, key: &str, payload: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    out.extend_from_slice(key.as_bytes());
    out.push(0);
    out.extend_from_slice(payload);
    out
}

/// A length-prefixed string payload.
fn string_payload(s: &str) -> Vec<u8> {
    let mut out = ((s.len() + 1) as i32).to_le_bytes().to_vec();
    out.extend_from_slice(s.as_bytes());
    out.push(0);
    out
}

fn decode(bytes: &[u8]) -> crate::error::Result<Document> {
    decode_document(bytes, &DecodeOptions::default())
}

#[test]
fn decode_empty_document() {
    let doc = decode(&[5, 0, 0, 0, 0]).unwrap();
    assert_eq!(doc, doc! {});
}

#[test]
fn decode_string_element() {
    let bytes = b"\x16\x00\x00\x00\x02hello\x00\x06\x00\x00\x00world\x00\x00";
    let doc = decode(bytes).unwrap();
    assert_eq!(doc, doc! { "hello": "world" });
}

#[test]
fn decode_int32_element() {
    let bytes = hex::decode("0C0000001069000100000000").unwrap();
    let doc = decode(&bytes).unwrap();
    assert_eq!(doc, doc! { "i": 1 });
}

#[test]
fn decode_scalar_elements() {
    let mut body = Vec::new();
    body.extend(elem(0x01, "double", &1020.123f64.to_le_bytes()));
    body.extend(elem(0x08, "t", &[1]));
    body.extend(elem(0x08, "f", &[0]));
    body.extend(elem(0x0A, "null", &[]));
    body.extend(elem(0x06, "undefined", &[]));
    body.extend(elem(0x09, "date", &1672531200000i64.to_le_bytes()));
    body.extend(elem(0xFF, "min", &[]));
    body.extend(elem(0x7F, "max", &[]));
    let doc = decode(&doc_bytes(&body)).unwrap();

    assert_eq!(
        doc,
        doc! {
            "double": 1020.123,
            "t": true,
            "f": false,
            "null": null,
            "undefined": Bson::Undefined,
            "date": DateTime::from_millis(1672531200000),
            "min": Bson::MinKey,
            "max": Bson::MaxKey,
        }
    );
}

#[test]
fn decode_nested_document_and_array() {
    let inner = doc_bytes(&elem(0x10, "subkey", &1i32.to_le_bytes()));
    let mut arr_body = Vec::new();
    arr_body.extend(elem(0x01, "0", &1.01f64.to_le_bytes()));
    arr_body.extend(elem(0x02, "1", &string_payload("xyz")));
    let arr = doc_bytes(&arr_body);

    let mut body = Vec::new();
    body.extend(elem(0x03, "doc", &inner));
    body.extend(elem(0x04, "arr", &arr));
    let doc = decode(&doc_bytes(&body)).unwrap();

    assert_eq!(
        doc,
        doc! {
            "doc": { "subkey": 1 },
            "arr": [1.01, "xyz"],
        }
    );
}

#[test]
fn decode_array_discards_wire_keys() {
    // Array keys are synthetic; whatever is stored is replaced positionally.
    let mut body = Vec::new();
    body.extend(elem(0x10, "x", &7i32.to_le_bytes()));
    body.extend(elem(0x10, "y", &8i32.to_le_bytes()));
    let arr = decode_array(&doc_bytes(&body), &DecodeOptions::default()).unwrap();
    assert_eq!(arr, vec![Bson::Int32(7), Bson::Int32(8)]);
}

#[test]
fn decode_object_id_and_decimal_copy_out() {
    let oid_bytes: [u8; 12] = *b"\x50\x6f\x77\x52\x5c\x99\x4e\xf7\x38\x9f\x6a\xbc";
    let mut dec_bytes = [0u8; 16];
    dec_bytes[..8].copy_from_slice(&1u64.to_le_bytes());
    dec_bytes[8..].copy_from_slice(&0x3040000000000000u64.to_le_bytes());

    let mut body = Vec::new();
    body.extend(elem(0x07, "id", &oid_bytes));
    body.extend(elem(0x13, "dec", &dec_bytes));
    let doc = decode(&doc_bytes(&body)).unwrap();

    assert_eq!(
        doc.get_object_id("id").unwrap(),
        ObjectId::from_bytes(oid_bytes)
    );
    assert_eq!(
        *doc.get_decimal128("dec").unwrap(),
        Decimal128::from_bytes(dec_bytes)
    );
}

#[test]
fn decode_binary_generic() {
    let mut payload = 3i32.to_le_bytes().to_vec();
    payload.push(0x00);
    payload.extend_from_slice(&[1, 2, 3]);
    let doc = decode(&doc_bytes(&elem(0x05, "b", &payload))).unwrap();

    let binary = doc.get_binary("b").unwrap();
    assert_eq!(binary.subtype, BinarySubtype::Generic);
    assert_eq!(binary.bytes, vec![1, 2, 3]);
}

#[test]
fn decode_binary_old_strips_inner_length() {
    // Subtype 0x02 carries a second length prefix equal to the outer
    // length minus four.
    let mut payload = 7i32.to_le_bytes().to_vec();
    payload.push(0x02);
    payload.extend_from_slice(&3i32.to_le_bytes());
    payload.extend_from_slice(&[1, 2, 3]);
    let doc = decode(&doc_bytes(&elem(0x05, "b", &payload))).unwrap();

    let binary = doc.get_binary("b").unwrap();
    assert_eq!(binary.subtype, BinarySubtype::BinaryOld);
    assert_eq!(binary.bytes, vec![1, 2, 3]);
}

#[test]
fn decode_binary_old_inner_length_mismatch() {
    for inner in [2i32, 4i32] {
        let mut payload = 7i32.to_le_bytes().to_vec();
        payload.push(0x02);
        payload.extend_from_slice(&inner.to_le_bytes());
        payload.extend_from_slice(&[1, 2, 3]);
        let err = decode(&doc_bytes(&elem(0x05, "b", &payload))).unwrap_err();
        assert!(err.is_malformed_bson(), "inner length {}: {}", inner, err);
    }
}

#[test]
fn decode_regexp_translates_options() {
    let mut payload = b"^ab\x00".to_vec();
    payload.extend_from_slice(b"imsx\x00");
    let doc = decode(&doc_bytes(&elem(0x0B, "re", &payload))).unwrap();
    assert_matches!(
        doc.get("re"),
        Some(Bson::RegularExpression(re)) if re.pattern == "^ab" && re.options == "img"
    );

    let mut options = DecodeOptions::default();
    options.bson_regexp = true;
    let mut payload = b"^ab\x00".to_vec();
    payload.extend_from_slice(b"imsx\x00");
    let doc = decode_document(&doc_bytes(&elem(0x0B, "re", &payload)), &options).unwrap();
    assert_matches!(
        doc.get("re"),
        Some(Bson::RegularExpression(re)) if re.pattern == "^ab" && re.options == "imsx"
    );
}

#[test]
fn decode_code_and_scope() {
    let code = string_payload("function() {}");
    let doc = decode(&doc_bytes(&elem(0x0D, "code", &code))).unwrap();
    assert_eq!(doc, doc! { "code": Bson::JavaScriptCode("function() {}".to_string()) });

    let scope = doc_bytes(&elem(0x10, "x", &1i32.to_le_bytes()));
    let code = string_payload("f");
    let total = (4 + code.len() + scope.len()) as i32;
    let mut payload = total.to_le_bytes().to_vec();
    payload.extend_from_slice(&code);
    payload.extend_from_slice(&scope);
    let doc = decode(&doc_bytes(&elem(0x0F, "cws", &payload))).unwrap();

    assert_matches!(
        doc.get("cws"),
        Some(Bson::JavaScriptCodeWithScope(cws))
            if cws.code == "f" && cws.scope == doc! { "x": 1 }
    );
}

#[test]
fn decode_code_with_scope_size_mismatch() {
    // Both an overshooting and an undershooting declared total are framing
    // errors.
    for delta in [-1i32, 1i32] {
        let scope = doc_bytes(&elem(0x10, "x", &1i32.to_le_bytes()));
        let code = string_payload("f");
        let total = (4 + code.len() + scope.len()) as i32 + delta;
        let mut payload = total.to_le_bytes().to_vec();
        payload.extend_from_slice(&code);
        payload.extend_from_slice(&scope);
        let err = decode(&doc_bytes(&elem(0x0F, "cws", &payload))).unwrap_err();
        assert!(err.is_malformed_bson(), "delta {}: {}", delta, err);
    }
}

#[test]
fn decode_db_pointer() {
    let mut payload = string_payload("db.coll");
    payload.extend_from_slice(b"\x50\x6f\x77\x52\x5c\x99\x4e\xf7\x38\x9f\x6a\xbc");
    let doc = decode(&doc_bytes(&elem(0x0C, "ptr", &payload))).unwrap();
    assert_matches!(
        doc.get("ptr"),
        Some(Bson::DbPointer(p)) if p.namespace == "db.coll"
    );
}

#[test]
fn decode_symbol_promotion() {
    let payload = string_payload("sym");
    let doc = decode(&doc_bytes(&elem(0x0E, "s", &payload))).unwrap();
    assert_eq!(doc.get("s"), Some(&Bson::String("sym".to_string())));

    let mut options = DecodeOptions::default();
    options.promote_values = false;
    let doc = decode_document(&doc_bytes(&elem(0x0E, "s", &payload)), &options).unwrap();
    assert_eq!(doc.get("s"), Some(&Bson::Symbol("sym".to_string())));
}

#[test]
fn decode_int32_stays_wrapped_without_promotion() {
    let bytes = doc_bytes(&elem(0x10, "x", &42i32.to_le_bytes()));
    let mut options = DecodeOptions::default();
    options.promote_values = false;
    let doc = decode_document(&bytes, &options).unwrap();
    assert_eq!(doc.get("x"), Some(&Bson::Int32(42)));
}

#[test]
fn decode_int64_promotion() {
    let bytes = |n: i64| doc_bytes(&elem(0x12, "n", &n.to_le_bytes()));

    // Defaults narrow to the plain host integer when the value fits.
    let doc = decode(&bytes(5)).unwrap();
    assert_eq!(doc.get("n"), Some(&Bson::Int32(5)));

    let doc = decode(&bytes(1 << 40)).unwrap();
    assert_eq!(doc.get("n"), Some(&Bson::Int64(1 << 40)));

    let mut options = DecodeOptions::default();
    options.use_big_int64 = true;
    let doc = decode_document(&bytes(5), &options).unwrap();
    assert_eq!(doc.get("n"), Some(&Bson::Int64(5)));

    let mut options = DecodeOptions::default();
    options.promote_values = false;
    let doc = decode_document(&bytes(5), &options).unwrap();
    assert_eq!(doc.get("n"), Some(&Bson::Int64(5)));

    let mut options = DecodeOptions::default();
    options.promote_longs = false;
    let doc = decode_document(&bytes(5), &options).unwrap();
    assert_eq!(doc.get("n"), Some(&Bson::Int64(5)));
}

#[test]
fn decode_int64_option_conflicts() {
    let bytes = doc_bytes(&elem(0x12, "n", &5i64.to_le_bytes()));

    let mut options = DecodeOptions::default();
    options.use_big_int64 = true;
    options.promote_values = false;
    assert!(decode_document(&bytes, &options).unwrap_err().is_option_conflict());

    let mut options = DecodeOptions::default();
    options.use_big_int64 = true;
    options.promote_longs = false;
    assert!(decode_document(&bytes, &options).unwrap_err().is_option_conflict());
}

#[test]
fn decode_timestamp_unsigned() {
    let mut payload = u32::MAX.to_le_bytes().to_vec();
    payload.extend_from_slice(&u32::MAX.to_le_bytes());
    let doc = decode(&doc_bytes(&elem(0x11, "ts", &payload))).unwrap();
    assert_eq!(
        doc.get_timestamp("ts").unwrap(),
        Timestamp {
            time: u32::MAX,
            increment: u32::MAX
        }
    );
}

#[test]
fn decode_boolean_out_of_range() {
    let err = decode(&doc_bytes(&elem(0x08, "b", &[2]))).unwrap_err();
    assert!(err.is_malformed_bson());
}

#[test]
fn decode_unknown_element_type() {
    let err = decode(&doc_bytes(&elem(0x20, "x", &[]))).unwrap_err();
    assert_matches!(err.kind, ErrorKind::UnrecognizedElementType { tag: 0x20 });
}

#[test]
fn decode_size_too_small() {
    let err = decode(&[4, 0, 0, 0, 0]).unwrap_err();
    assert!(err.is_malformed_bson());
}

#[test]
fn decode_missing_terminator() {
    let err = decode(&[5, 0, 0, 0, 1]).unwrap_err();
    assert!(err.is_malformed_bson());
}

#[test]
fn decode_early_terminator() {
    // The element loop ends at offset 5, two bytes before the declared size.
    let err = decode(&[7, 0, 0, 0, 0, 1, 0]).unwrap_err();
    assert!(err.is_malformed_bson());
}

#[test]
fn decode_size_exceeds_buffer() {
    let err = decode(&[6, 0, 0, 0, 0]).unwrap_err();
    assert!(err.is_malformed_bson());
}

#[test]
fn decode_buffer_length_policy() {
    let mut bytes = doc_bytes(&elem(0x10, "i", &1i32.to_le_bytes()));
    bytes.extend_from_slice(&[0xAA, 0xBB]);

    assert!(decode(&bytes).unwrap_err().is_malformed_bson());

    let mut options = DecodeOptions::default();
    options.allow_object_smaller_than_buffer_size = true;
    let doc = decode_document(&bytes, &options).unwrap();
    assert_eq!(doc, doc! { "i": 1 });
}

#[test]
fn decode_at_offset() {
    let mut bytes = vec![0xFF; 3];
    bytes.extend(doc_bytes(&elem(0x10, "i", &1i32.to_le_bytes())));

    let mut options = DecodeOptions::default();
    options.index = 3;
    let doc = decode_document(&bytes, &options).unwrap();
    assert_eq!(doc, doc! { "i": 1 });
}

#[test]
fn decode_string_length_violations() {
    // Zero length: the terminating null must always be counted.
    let mut payload = 0i32.to_le_bytes().to_vec();
    payload.push(0);
    let err = decode(&doc_bytes(&elem(0x02, "s", &payload))).unwrap_err();
    assert_matches!(err.kind, ErrorKind::MalformedString { .. });

    // Length extending past the end of the document.
    let payload = 100i32.to_le_bytes().to_vec();
    let err = decode(&doc_bytes(&elem(0x02, "s", &payload))).unwrap_err();
    assert_matches!(err.kind, ErrorKind::MalformedString { .. });

    // Payload not null terminated.
    let mut payload = 3i32.to_le_bytes().to_vec();
    payload.extend_from_slice(b"abc");
    let err = decode(&doc_bytes(&elem(0x02, "s", &payload))).unwrap_err();
    assert_matches!(err.kind, ErrorKind::MalformedString { .. });
}

fn invalid_utf8_string_doc(key: &str) -> Vec<u8> {
    let mut payload = 3i32.to_le_bytes().to_vec();
    payload.extend_from_slice(&[0x80, 0xAE]);
    payload.push(0);
    doc_bytes(&elem(0x02, key, &payload))
}

#[test]
fn utf8_validation_default_rejects() {
    let err = decode(&invalid_utf8_string_doc("key")).unwrap_err();
    assert_matches!(err.kind, ErrorKind::Utf8Encoding);
    assert_eq!(err.key.as_deref(), Some("key"));
}

#[test]
fn utf8_validation_disabled_is_lossy() {
    let mut options = DecodeOptions::default();
    options.validation = Utf8Validation::All(false);
    let doc = decode_document(&invalid_utf8_string_doc("key"), &options).unwrap();
    assert_eq!(doc.get_str("key").unwrap(), "\u{FFFD}\u{FFFD}");
}

#[test]
fn utf8_validation_per_key() {
    // All-true: only the listed keys are validated.
    let mut options = DecodeOptions::default();
    options.validation = Utf8Validation::Keys(HashMap::from([("checked".to_string(), true)]));

    let err = decode_document(&invalid_utf8_string_doc("checked"), &options).unwrap_err();
    assert_matches!(err.kind, ErrorKind::Utf8Encoding);

    let doc = decode_document(&invalid_utf8_string_doc("other"), &options).unwrap();
    assert_eq!(doc.get_str("other").unwrap(), "\u{FFFD}\u{FFFD}");

    // All-false: every key except the listed ones is validated.
    let mut options = DecodeOptions::default();
    options.validation = Utf8Validation::Keys(HashMap::from([("skipped".to_string(), false)]));

    let doc = decode_document(&invalid_utf8_string_doc("skipped"), &options).unwrap();
    assert_eq!(doc.get_str("skipped").unwrap(), "\u{FFFD}\u{FFFD}");

    let err = decode_document(&invalid_utf8_string_doc("other"), &options).unwrap_err();
    assert_matches!(err.kind, ErrorKind::Utf8Encoding);
}

#[test]
fn utf8_validation_inherited_by_subtree() {
    let inner = invalid_utf8_string_doc("inner");
    let bytes = doc_bytes(&elem(0x03, "skipped", &inner));

    let mut options = DecodeOptions::default();
    options.validation = Utf8Validation::Keys(HashMap::from([("skipped".to_string(), false)]));
    let doc = decode_document(&bytes, &options).unwrap();
    assert_eq!(
        doc.get_document("skipped").unwrap().get_str("inner").unwrap(),
        "\u{FFFD}\u{FFFD}"
    );

    // The same subtree is validated when its key is not exempt.
    let bytes = doc_bytes(&elem(0x03, "checked", &inner));
    let err = decode_document(&bytes, &options).unwrap_err();
    assert_matches!(err.kind, ErrorKind::Utf8Encoding);
}

#[test]
fn utf8_validation_map_conflicts() {
    let bytes = doc_bytes(&elem(0x10, "i", &1i32.to_le_bytes()));

    let mut options = DecodeOptions::default();
    options.validation = Utf8Validation::Keys(HashMap::new());
    assert!(decode_document(&bytes, &options).unwrap_err().is_option_conflict());

    let mut options = DecodeOptions::default();
    options.validation = Utf8Validation::Keys(HashMap::from([
        ("a".to_string(), true),
        ("b".to_string(), false),
    ]));
    assert!(decode_document(&bytes, &options).unwrap_err().is_option_conflict());
}

fn dbref_body(with_db: bool, extra_dollar: bool) -> Vec<u8> {
    let mut inner_body = Vec::new();
    inner_body.extend(elem(0x02, "$ref", &string_payload("coll")));
    inner_body.extend(elem(0x10, "$id", &1i32.to_le_bytes()));
    if with_db {
        inner_body.extend(elem(0x02, "$db", &string_payload("db")));
    }
    if extra_dollar {
        inner_body.extend(elem(0x10, "$extra", &2i32.to_le_bytes()));
    }
    inner_body.extend(elem(0x10, "note", &3i32.to_le_bytes()));
    doc_bytes(&elem(0x03, "ref", &doc_bytes(&inner_body)))
}

#[test]
fn dbref_recognition() {
    let doc = decode(&dbref_body(true, false)).unwrap();
    let dbref = match doc.get("ref") {
        Some(Bson::DbRef(dbref)) => dbref,
        other => panic!("expected DbRef, got {:?}", other),
    };
    assert_eq!(dbref.collection, "coll");
    assert_eq!(*dbref.id, Bson::Int32(1));
    assert_eq!(dbref.db.as_deref(), Some("db"));
    assert_eq!(dbref.extra, doc! { "note": 3 });
}

#[test]
fn dbref_rejects_extra_dollar_keys() {
    let doc = decode(&dbref_body(false, true)).unwrap();
    assert_matches!(doc.get("ref"), Some(Bson::Document(_)));
}

#[test]
fn dbref_requires_string_ref() {
    let mut inner_body = Vec::new();
    inner_body.extend(elem(0x10, "$ref", &1i32.to_le_bytes()));
    inner_body.extend(elem(0x10, "$id", &1i32.to_le_bytes()));
    let bytes = doc_bytes(&elem(0x03, "ref", &doc_bytes(&inner_body)));
    let doc = decode(&bytes).unwrap();
    assert_matches!(doc.get("ref"), Some(Bson::Document(_)));
}

#[test]
fn dbref_not_rewritten_at_top_level() {
    let mut body = Vec::new();
    body.extend(elem(0x02, "$ref", &string_payload("coll")));
    body.extend(elem(0x10, "$id", &1i32.to_le_bytes()));
    let doc = decode(&doc_bytes(&body)).unwrap();
    assert_eq!(doc.get_str("$ref").unwrap(), "coll");
}

#[test]
fn raw_option_keeps_embedded_documents_unparsed() {
    let inner = doc_bytes(&elem(0x10, "x", &1i32.to_le_bytes()));
    let bytes = doc_bytes(&elem(0x03, "doc", &inner));

    let mut options = DecodeOptions::default();
    options.raw = true;
    let doc = decode_document(&bytes, &options).unwrap();

    let raw = match doc.get("doc") {
        Some(Bson::RawDocument(raw)) => raw,
        other => panic!("expected RawDocument, got {:?}", other),
    };
    assert_eq!(raw.as_bytes(), &inner[..]);
    assert_eq!(raw.decode().unwrap(), doc! { "x": 1 });
}

#[test]
fn fields_as_raw_applies_to_array_children() {
    let inner = doc_bytes(&elem(0x10, "x", &1i32.to_le_bytes()));
    let arr = doc_bytes(&elem(0x03, "0", &inner));
    let bytes = doc_bytes(&elem(0x04, "items", &arr));

    let mut options = DecodeOptions::default();
    options.fields_as_raw = HashSet::from(["items".to_string()]);
    let doc = decode_document(&bytes, &options).unwrap();

    let items = doc.get_array("items").unwrap();
    assert_matches!(&items[0], Bson::RawDocument(raw) if raw.as_bytes() == &inner[..]);

    // Other keys are unaffected.
    let bytes = doc_bytes(&elem(0x04, "other", &arr));
    let doc = decode_document(&bytes, &options).unwrap();
    assert_eq!(doc.get_array("other").unwrap()[0], bson!({ "x": 1 }));
}

#[test]
fn proto_key_is_plain_data() {
    let bytes = doc_bytes(&elem(0x10, "__proto__", &1i32.to_le_bytes()));
    let doc = decode(&bytes).unwrap();
    assert_eq!(doc.get("__proto__"), Some(&Bson::Int32(1)));
}

#[test]
fn duplicate_keys_last_write_wins() {
    let mut body = Vec::new();
    body.extend(elem(0x10, "x", &1i32.to_le_bytes()));
    body.extend(elem(0x10, "x", &2i32.to_le_bytes()));
    let doc = decode(&doc_bytes(&body)).unwrap();
    assert_eq!(doc.len(), 1);
    assert_eq!(doc.get("x"), Some(&Bson::Int32(2)));
}

proptest! {
    #[test]
    fn timestamp_decodes_unsigned_halves(time in any::<u32>(), increment in any::<u32>()) {
        let mut payload = increment.to_le_bytes().to_vec();
        payload.extend_from_slice(&time.to_le_bytes());
        let doc = decode(&doc_bytes(&elem(0x11, "ts", &payload))).unwrap();
        prop_assert_eq!(
            doc.get_timestamp("ts").unwrap(),
            Timestamp { time, increment }
        );
    }

    #[test]
    fn int64_promotion_preserves_value(n in -9_007_199_254_740_991i64..=9_007_199_254_740_991i64) {
        let doc = decode(&doc_bytes(&elem(0x12, "n", &n.to_le_bytes()))).unwrap();
        prop_assert_eq!(doc.get("n").and_then(Bson::as_i64), Some(n));
    }
}
