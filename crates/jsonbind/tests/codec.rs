use std::any::Any;
use std::collections::{BTreeSet, BinaryHeap, VecDeque};

use ahash::AHashSet;
use indexmap::IndexMap;
use jsonbind::{
    parse, print, reflect_enum, reflect_struct, reflect_union, Codec, CodecError, Converter,
    DynValue, JsValue, Number, PrintMode, Reflected, TypeDesc, TypeInfo,
};

#[derive(Debug, PartialEq)]
struct Point {
    x: i64,
    y: i64,
}

reflect_struct!(Point { x: i64, y: i64 });

#[derive(Debug, PartialEq)]
struct Player {
    name: String,
    score: Option<i64>,
    tags: Vec<String>,
}

reflect_struct!(Player {
    name: String,
    score: Option<i64>,
    tags: Vec<String>,
});

#[derive(Debug, PartialEq, Clone, Copy)]
enum Suit {
    Hearts,
    Spades,
}

reflect_enum!(Suit { Hearts, Spades });

#[derive(Debug, PartialEq)]
struct Message {
    body: String,
}

reflect_struct!(Message { body: String });

#[derive(Debug, PartialEq)]
enum Event {
    Ping,
    Message(Message),
}

reflect_union!(Event { Ping, Message(Message) });

#[derive(Debug, PartialEq)]
struct UserId(i64);

impl Reflected for UserId {
    fn type_desc() -> TypeDesc {
        TypeDesc::simple::<UserId>("UserId")
    }

    fn type_info() -> TypeInfo {
        TypeInfo::wrapper::<UserId, i64, _, _>(|id| &id.0, UserId)
    }
}

#[derive(Debug, PartialEq)]
struct Unset;

impl Reflected for Unset {
    fn type_desc() -> TypeDesc {
        TypeDesc::simple::<Unset>("Unset")
    }

    fn type_info() -> TypeInfo {
        TypeInfo::singleton(|| Unset)
    }
}

#[derive(Debug, PartialEq)]
struct Timestamp {
    millis: i64,
}

reflect_struct!(Timestamp { millis: i64 });

/// Represents a `Timestamp` as its bare millisecond count.
struct MillisConverter;

impl Converter for MillisConverter {
    fn encode(&self, value: &dyn Any, _codec: &Codec) -> Result<JsValue, CodecError> {
        let timestamp = value.downcast_ref::<Timestamp>().expect("selected by accepts");
        Ok(JsValue::from(timestamp.millis))
    }

    fn decode(&self, value: &JsValue, _codec: &Codec) -> Result<DynValue, CodecError> {
        match value.as_number().and_then(Number::as_i64) {
            Some(millis) => Ok(Box::new(Timestamp { millis })),
            None => Err(CodecError::TypeMismatch {
                expected: "a millisecond count".to_string(),
                found: value.kind().to_string(),
            }),
        }
    }
}

fn codec() -> Codec {
    let mut codec = Codec::new();
    codec
        .register::<Point>()
        .register::<Player>()
        .register::<Suit>()
        .register::<Event>()
        .register::<UserId>()
        .register::<Unset>();
    codec
}

/// Encode, render in the given mode, reparse and decode back.
fn through_text<T: Reflected>(codec: &Codec, value: &T, mode: PrintMode) -> T {
    let encoded = codec.encode_as(value).expect("encodable value");
    let text = print(&encoded, mode);
    let reparsed = parse(&text).expect("printed text reparses");
    codec.decode_as(&reparsed).expect("round-trip decodes")
}

#[test]
fn declared_int_stays_bare() {
    let codec = codec();
    let encoded = codec.encode_as(&42i32).expect("scalar");
    assert_eq!(print(&encoded, PrintMode::Compact), "42");
    assert_eq!(codec.decode_as::<i32>(&encoded), Ok(42));
}

#[test]
fn any_declared_int_gets_an_envelope() {
    let codec = codec();
    let encoded = codec.encode(&TypeDesc::any(), &42i32).expect("scalar");
    assert_eq!(
        print(&encoded, PrintMode::Compact),
        r#"{"value":42,"_type":"int"}"#
    );
    let decoded = codec.decode(&TypeDesc::any(), &encoded).expect("witnessed");
    assert_eq!(decoded.downcast_ref::<i32>(), Some(&42));
}

#[test]
fn nan_sentinel_decodes_to_a_nan_double() {
    let codec = codec();
    let value = parse("\"NaN\"").expect("valid JSON");
    let decoded = codec.decode_as::<f64>(&value).expect("sentinel");
    assert!(decoded.is_nan());
}

#[test]
fn duplicate_keys_decode_with_the_last_value() {
    let mut codec = codec();
    codec.register::<IndexMap<String, i64>>();
    let value = parse(r#"{"a":1,"a":2}"#).expect("valid JSON");
    let decoded: IndexMap<String, i64> = codec.decode_as(&value).expect("map");
    assert_eq!(decoded.len(), 1);
    assert_eq!(decoded.get("a"), Some(&2));
}

#[test]
fn vec_round_trips_in_order() {
    let mut codec = codec();
    codec.register::<Vec<i64>>();
    for mode in [PrintMode::Compact, PrintMode::Pretty] {
        assert_eq!(through_text(&codec, &vec![1i64, 2, 3], mode), vec![1, 2, 3]);
    }
}

#[test]
fn out_of_range_byte_is_a_range_error() {
    let codec = codec();
    let value = parse("1000").expect("valid JSON");
    assert_eq!(
        codec.decode_as::<i8>(&value),
        Err(CodecError::Range {
            value: "1000".to_string(),
            target: "i8",
        })
    );
}

#[test]
fn aggregates_round_trip_under_both_modes() {
    let codec = codec();
    for mode in [PrintMode::Compact, PrintMode::Pretty] {
        let player = Player {
            name: "ada".to_string(),
            score: Some(17),
            tags: vec!["fast".to_string(), "quiet".to_string()],
        };
        assert_eq!(through_text(&codec, &player, mode), player);
        let anonymous = Player {
            name: "grace".to_string(),
            score: None,
            tags: Vec::new(),
        };
        assert_eq!(through_text(&codec, &anonymous, mode), anonymous);
    }
}

#[test]
fn aggregate_witness_is_injected_first() {
    let codec = codec();
    let encoded = codec
        .encode(&TypeDesc::any(), &Point { x: 1, y: 2 })
        .expect("registered aggregate");
    let object = encoded.as_object().expect("object");
    let keys: Vec<&str> = object.keys().map(String::as_str).collect();
    assert_eq!(keys, ["_type", "x", "y"]);
    assert_eq!(encoded.get("_type").and_then(JsValue::as_str), Some("Point"));
}

#[test]
fn witnessed_aggregate_reconstructs_under_any() {
    let codec = codec();
    let value = parse(r#"{"_type":"Point","x":5,"y":6}"#).expect("valid JSON");
    let decoded = codec.decode(&TypeDesc::any(), &value).expect("witnessed");
    assert_eq!(decoded.downcast_ref::<Point>(), Some(&Point { x: 5, y: 6 }));
}

#[test]
fn missing_required_field_fails() {
    let codec = codec();
    let value = parse(r#"{"x":1}"#).expect("valid JSON");
    assert_eq!(
        codec.decode_as::<Point>(&value),
        Err(CodecError::MissingField {
            field: "y".to_string(),
            container: "Point".to_string(),
        })
    );
}

#[test]
fn missing_optional_field_becomes_none() {
    let codec = codec();
    let value = parse(r#"{"name":"ada","tags":[]}"#).expect("valid JSON");
    let player: Player = codec.decode_as(&value).expect("optional absent");
    assert_eq!(player.score, None);
}

#[test]
fn enums_are_their_constant_names() {
    let codec = codec();
    let encoded = codec.encode_as(&Suit::Spades).expect("enum");
    assert_eq!(encoded, JsValue::from("Spades"));
    assert_eq!(codec.decode_as::<Suit>(&encoded), Ok(Suit::Spades));
    assert_eq!(
        codec.decode_as::<Suit>(&JsValue::from("Clubs")),
        Err(CodecError::UnknownVariant {
            name: "Clubs".to_string(),
            ty: "Suit".to_string(),
        })
    );
}

#[test]
fn union_unit_variants_are_witness_strings() {
    let codec = codec();
    let encoded = codec.encode_as(&Event::Ping).expect("union");
    assert_eq!(encoded, JsValue::from("Ping"));
    assert_eq!(codec.decode_as::<Event>(&encoded), Ok(Event::Ping));
}

#[test]
fn union_data_variants_carry_the_payload_witness() {
    let codec = codec();
    let event = Event::Message(Message {
        body: "hi".to_string(),
    });
    let encoded = codec.encode_as(&event).expect("union");
    assert_eq!(
        print(&encoded, PrintMode::Compact),
        r#"{"_type":"Message","body":"hi"}"#
    );
    assert_eq!(codec.decode_as::<Event>(&encoded), Ok(event));
}

#[test]
fn union_payloads_reassociate_under_any() {
    let codec = codec();
    let value = parse(r#"{"_type":"Message","body":"hi"}"#).expect("valid JSON");
    let decoded = codec.decode(&TypeDesc::any(), &value).expect("witnessed");
    assert_eq!(
        decoded.downcast_ref::<Event>(),
        Some(&Event::Message(Message {
            body: "hi".to_string()
        }))
    );
}

#[test]
fn unions_without_a_witness_are_rejected() {
    let codec = codec();
    let value = parse(r#"{"body":"hi"}"#).expect("valid JSON");
    assert!(matches!(
        codec.decode_as::<Event>(&value),
        Err(CodecError::TypeMismatch { .. })
    ));
}

#[test]
fn wrappers_are_transparent() {
    let codec = codec();
    let encoded = codec.encode_as(&UserId(7)).expect("wrapper");
    assert_eq!(encoded, JsValue::from(7));
    assert_eq!(codec.decode_as::<UserId>(&encoded), Ok(UserId(7)));

    let enveloped = codec.encode(&TypeDesc::any(), &UserId(7)).expect("wrapper");
    assert_eq!(
        print(&enveloped, PrintMode::Compact),
        r#"{"value":7,"_type":"UserId"}"#
    );
    let decoded = codec.decode(&TypeDesc::any(), &enveloped).expect("witnessed");
    assert_eq!(decoded.downcast_ref::<UserId>(), Some(&UserId(7)));
}

#[test]
fn singletons_are_a_bare_witness_object() {
    let codec = codec();
    let encoded = codec.encode_as(&Unset).expect("singleton");
    assert_eq!(print(&encoded, PrintMode::Compact), r#"{"_type":"Unset"}"#);
    assert_eq!(codec.decode_as::<Unset>(&encoded), Ok(Unset));
}

#[test]
fn converters_override_the_shape_paths() {
    let mut codec = codec();
    codec.register_converter::<Timestamp, _>(MillisConverter);
    let encoded = codec.encode_as(&Timestamp { millis: 1234 }).expect("converter");
    assert_eq!(encoded, JsValue::from(1234));
    assert_eq!(
        codec.decode_as::<Timestamp>(&encoded),
        Ok(Timestamp { millis: 1234 })
    );

    let enveloped = codec
        .encode(&TypeDesc::any(), &Timestamp { millis: 1234 })
        .expect("converter");
    assert_eq!(
        print(&enveloped, PrintMode::Compact),
        r#"{"value":1234,"_type":"Timestamp"}"#
    );
    let decoded = codec.decode(&TypeDesc::any(), &enveloped).expect("witnessed");
    assert_eq!(
        decoded.downcast_ref::<Timestamp>(),
        Some(&Timestamp { millis: 1234 })
    );
}

#[test]
fn aliases_replace_full_names_in_witnesses() {
    let mut codec = codec();
    codec.alias::<Point>("pt");
    let encoded = codec
        .encode(&TypeDesc::any(), &Point { x: 1, y: 2 })
        .expect("aliased aggregate");
    assert_eq!(encoded.get("_type").and_then(JsValue::as_str), Some("pt"));
    let decoded = codec.decode(&TypeDesc::any(), &encoded).expect("alias resolves");
    assert_eq!(decoded.downcast_ref::<Point>(), Some(&Point { x: 1, y: 2 }));
}

#[test]
fn ordered_collections_preserve_order() {
    let mut codec = codec();
    codec.register::<VecDeque<i64>>();
    let deque: VecDeque<i64> = [3, 1, 2].into_iter().collect();
    assert_eq!(through_text(&codec, &deque, PrintMode::Compact), deque);
}

#[test]
fn sets_round_trip_set_equal() {
    let mut codec = codec();
    codec.register::<AHashSet<String>>();
    let set: AHashSet<String> = ["a", "b", "c"].iter().map(ToString::to_string).collect();
    assert_eq!(through_text(&codec, &set, PrintMode::Compact), set);
}

#[test]
fn sorted_sets_decode_into_key_order() {
    let mut codec = codec();
    codec.register::<BTreeSet<i64>>();
    let set: BTreeSet<i64> = [3, 1, 2].into_iter().collect();
    assert_eq!(through_text(&codec, &set, PrintMode::Compact), set);

    let value = parse("[9,7,8,7]").expect("valid JSON");
    let decoded: BTreeSet<i64> = codec.decode_as(&value).expect("sorted set");
    assert_eq!(decoded.into_iter().collect::<Vec<_>>(), vec![7, 8, 9]);
}

#[test]
fn heaps_decode_to_priority_order() {
    let mut codec = codec();
    codec.register::<BinaryHeap<i64>>();
    let value = parse("[3,1,2]").expect("valid JSON");
    let decoded: BinaryHeap<i64> = codec.decode_as(&value).expect("heap");
    assert_eq!(decoded.peek(), Some(&3));
    assert_eq!(decoded.into_sorted_vec(), vec![1, 2, 3]);
}

#[test]
fn fixed_arrays_check_their_length() {
    let mut codec = codec();
    codec.register::<[i64; 3]>();
    assert_eq!(
        through_text(&codec, &[1i64, 2, 3], PrintMode::Compact),
        [1, 2, 3]
    );
    let short = parse("[1,2]").expect("valid JSON");
    assert!(codec.decode_as::<[i64; 3]>(&short).is_err());
}

#[test]
fn maps_preserve_entry_order_and_typed_keys() {
    let mut codec = codec();
    codec.register::<IndexMap<String, i64>>();
    codec.register::<IndexMap<i64, String>>();

    let mut by_name: IndexMap<String, i64> = IndexMap::new();
    by_name.insert("z".to_string(), 1);
    by_name.insert("a".to_string(), 2);
    let encoded = codec.encode_as(&by_name).expect("map");
    assert_eq!(print(&encoded, PrintMode::Compact), r#"{"z":1,"a":2}"#);
    assert_eq!(codec.decode_as::<IndexMap<String, i64>>(&encoded), Ok(by_name));

    let mut by_id: IndexMap<i64, String> = IndexMap::new();
    by_id.insert(7, "seven".to_string());
    let encoded = codec.encode_as(&by_id).expect("map");
    assert_eq!(print(&encoded, PrintMode::Compact), r#"{"7":"seven"}"#);
    assert_eq!(codec.decode_as::<IndexMap<i64, String>>(&encoded), Ok(by_id));
}

#[test]
fn nested_aggregates_and_optionals_round_trip() {
    #[derive(Debug, PartialEq)]
    struct Board {
        origin: Point,
        extra: Option<Point>,
        cells: Vec<Vec<i64>>,
    }

    reflect_struct!(Board {
        origin: Point,
        extra: Option<Point>,
        cells: Vec<Vec<i64>>,
    });

    let mut codec = codec();
    codec.register::<Board>();
    let board = Board {
        origin: Point { x: 0, y: 0 },
        extra: Some(Point { x: 3, y: 4 }),
        cells: vec![vec![1, 2], vec![], vec![3]],
    };
    for mode in [PrintMode::Compact, PrintMode::Pretty] {
        assert_eq!(through_text(&codec, &board, mode), board);
    }
}

#[test]
fn null_decodes_as_the_document_null_under_any() {
    let codec = codec();
    let decoded = codec.decode(&TypeDesc::any(), &JsValue::Null).expect("null");
    assert_eq!(decoded.downcast_ref::<JsValue>(), Some(&JsValue::Null));
}
