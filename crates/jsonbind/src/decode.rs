//! Document model to native graph.
//!
//! Decoding is driven by the declared type, except that a `_type` witness in
//! an object always outranks it. A failing decode never hands back a
//! partially constructed value.

use std::any::TypeId;

use indexmap::IndexMap;
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use tracing::trace;

use crate::codec::Codec;
use crate::error::CodecError;
use crate::registry::NameEntry;
use crate::ty::{
    DynValue, FieldValues, ScalarKind, Shape, TypeDesc, TypeInfo, Variant,
};
use crate::value::{Decimal, JsObject, JsValue, Number};

pub(crate) fn decode(
    codec: &Codec,
    declared: &TypeDesc,
    value: &JsValue,
) -> Result<DynValue, CodecError> {
    if value.is_null() {
        if declared.is_any() {
            // There is no native null; the document model's is the answer.
            return Ok(Box::new(JsValue::Null));
        }
        if let Some(info) = codec.types.get(declared.id()) {
            if let Shape::Optional(optional) = &info.shape {
                return Ok((optional.lift)(None));
            }
        }
        return Err(CodecError::mismatch(declared.to_string(), value));
    }
    if !declared.is_any() {
        if let Some(info) = codec.types.get(declared.id()) {
            if let Shape::Optional(optional) = &info.shape {
                let inner = decode(codec, &optional.inner, value)?;
                return Ok((optional.lift)(Some(inner)));
            }
        }
    }
    if let JsValue::Object(object) = value {
        return decode_object(codec, declared, object, value);
    }
    if let Some(entry) = codec.converters.for_target(declared.id()) {
        return entry.converter.decode(value, codec);
    }
    if declared.is_any() {
        return decode_any(codec, value);
    }
    let info = lookup(codec, declared)?;
    match (&info.shape, value) {
        (Shape::Value, _) => Ok(Box::new(value.clone())),
        // A wrapper is represented as its inner value; objects were already
        // routed through the witness path above.
        (Shape::Wrapper(wrapper), _) => {
            let inner = decode(codec, &wrapper.inner, value)?;
            Ok((wrapper.wrap)(inner))
        }
        (Shape::Scalar(ScalarKind::Bool), JsValue::Bool(b)) => Ok(Box::new(*b)),
        (Shape::Scalar(kind), JsValue::Number(number)) => decode_number(*kind, number, value),
        (Shape::Scalar(kind), JsValue::String(text)) => decode_scalar_string(*kind, text, value),
        (Shape::Enum(shape), JsValue::String(name)) => {
            (shape.from_name)(name).ok_or_else(|| CodecError::UnknownVariant {
                name: name.clone(),
                ty: info.desc.to_string(),
            })
        }
        (Shape::Union(shape), JsValue::String(name)) => {
            for variant in &shape.variants {
                if let Variant::Unit { name: unit, make, .. } = variant {
                    if *unit == name.as_str() {
                        return Ok(make());
                    }
                }
            }
            Err(CodecError::UnknownVariant {
                name: name.clone(),
                ty: info.desc.to_string(),
            })
        }
        (Shape::List(list), JsValue::Array(items)) => {
            if let Some(expected) = list.len {
                if items.len() != expected {
                    return Err(CodecError::TypeMismatch {
                        expected: format!("an array of {expected} elements"),
                        found: format!("an array of {} elements", items.len()),
                    });
                }
            }
            let mut decoded = Vec::with_capacity(items.len());
            for item in items {
                decoded.push(decode(codec, &list.element, item)?);
            }
            (list.collect)(decoded)
        }
        _ => Err(CodecError::mismatch(info.desc.to_string(), value)),
    }
}

/// Decode with no declared type at all: reconstruct what the document model
/// states. Strings naming a registered union unit variant come back as that
/// variant; every other string is just a string.
fn decode_any(codec: &Codec, value: &JsValue) -> Result<DynValue, CodecError> {
    match value {
        JsValue::Null => Ok(Box::new(JsValue::Null)),
        JsValue::Bool(b) => Ok(Box::new(*b)),
        JsValue::Number(Number::Int(v)) => Ok(Box::new(*v)),
        JsValue::Number(Number::BigInt(v)) => Ok(Box::new(v.clone())),
        JsValue::Number(Number::Decimal(v)) => Ok(Box::new(v.clone())),
        JsValue::Number(Number::Float(v)) => Ok(Box::new(*v)),
        JsValue::String(text) => {
            if let Some(NameEntry::UnionUnit { union, index }) = codec.types.resolve(text) {
                return make_unit(codec, *union, *index);
            }
            Ok(Box::new(text.clone()))
        }
        JsValue::Array(items) => {
            let mut decoded = Vec::with_capacity(items.len());
            for item in items {
                decoded.push(decode(codec, &TypeDesc::any(), item)?);
            }
            Ok(Box::new(decoded))
        }
        JsValue::Object(object) => {
            let mut decoded: IndexMap<String, DynValue> = IndexMap::with_capacity(object.len());
            for (key, item) in object {
                decoded.insert(key.clone(), decode(codec, &TypeDesc::any(), item)?);
            }
            Ok(Box::new(decoded))
        }
    }
}

fn decode_object(
    codec: &Codec,
    declared: &TypeDesc,
    object: &JsObject,
    value: &JsValue,
) -> Result<DynValue, CodecError> {
    if let Some(witness_value) = object.get("_type") {
        let Some(witness) = witness_value.as_str() else {
            return Err(CodecError::mismatch("a string type witness", witness_value));
        };
        return decode_witnessed(codec, declared, witness, object, value);
    }
    if let Some(entry) = codec.converters.for_target(declared.id()) {
        return entry.converter.decode(value, codec);
    }
    if declared.is_any() {
        return decode_any(codec, value);
    }
    let info = lookup(codec, declared)?;
    match &info.shape {
        Shape::Value => Ok(Box::new(value.clone())),
        Shape::Map(map) => {
            let mut entries = Vec::with_capacity(object.len());
            for (key, item) in object {
                entries.push((key.clone(), decode(codec, &map.value, item)?));
            }
            (map.from_entries)(entries)
        }
        Shape::Aggregate(aggregate) => decode_aggregate(codec, info, aggregate, object),
        Shape::Singleton(singleton) => Ok((singleton.make)()),
        Shape::Wrapper(wrapper) => {
            let inner = decode(codec, &wrapper.inner, value)?;
            Ok((wrapper.wrap)(inner))
        }
        Shape::Union(_) => Err(CodecError::mismatch(
            format!("a type witness for `{}`", info.desc),
            value,
        )),
        _ => Err(CodecError::mismatch(info.desc.to_string(), value)),
    }
}

fn decode_witnessed(
    codec: &Codec,
    declared: &TypeDesc,
    witness: &str,
    object: &JsObject,
    value: &JsValue,
) -> Result<DynValue, CodecError> {
    trace!(witness, "resolving type witness");
    if let Some(effective) = codec.aliases.resolve(witness) {
        return decode_effective(codec, declared, effective, witness, object, value);
    }
    match codec.types.resolve(witness) {
        Some(NameEntry::Type(effective)) => {
            decode_effective(codec, declared, *effective, witness, object, value)
        }
        Some(NameEntry::UnionUnit { union, index }) => {
            let decoded = make_unit(codec, *union, *index)?;
            if declared.is_any() || declared.id() == *union {
                Ok(decoded)
            } else {
                Err(CodecError::TypeMismatch {
                    expected: declared.to_string(),
                    found: format!("`{witness}`"),
                })
            }
        }
        None => Err(CodecError::UnknownType(witness.to_string())),
    }
}

fn decode_effective(
    codec: &Codec,
    declared: &TypeDesc,
    effective: TypeId,
    witness: &str,
    object: &JsObject,
    value: &JsValue,
) -> Result<DynValue, CodecError> {
    if let Some(entry) = codec.converters.for_target(effective) {
        let payload = object.get("value").unwrap_or(value);
        let decoded = entry.converter.decode(payload, codec)?;
        return rewrap(codec, declared, effective, witness, decoded);
    }
    let info = codec
        .types
        .get(effective)
        .ok_or_else(|| CodecError::UnknownType(witness.to_string()))?;
    let decoded = match &info.shape {
        Shape::Aggregate(aggregate) => decode_aggregate(codec, info, aggregate, object)?,
        Shape::Singleton(singleton) => (singleton.make)(),
        // Everything else was enveloped on the way out.
        _ => {
            let inner = object.get("value").ok_or_else(|| CodecError::MissingField {
                field: "value".to_string(),
                container: witness.to_string(),
            })?;
            decode(codec, &info.desc, inner)?
        }
    };
    rewrap(codec, declared, effective, witness, decoded)
}

/// Re-associates a witnessed payload with its owning union when the caller
/// asked for the union (or for anything at all).
fn rewrap(
    codec: &Codec,
    declared: &TypeDesc,
    effective: TypeId,
    witness: &str,
    decoded: DynValue,
) -> Result<DynValue, CodecError> {
    if declared.id() == effective {
        return Ok(decoded);
    }
    if let Some((union, index)) = codec.types.variant_of(effective) {
        if declared.is_any() || declared.id() == union {
            let info = codec.types.get(union).expect("unions register their variants");
            let Shape::Union(shape) = &info.shape else {
                unreachable!("variant table points at a union")
            };
            let Variant::Data { wrap, .. } = &shape.variants[index] else {
                unreachable!("payload variants carry data")
            };
            return Ok(wrap(decoded));
        }
    }
    if declared.is_any() {
        return Ok(decoded);
    }
    Err(CodecError::TypeMismatch {
        expected: declared.to_string(),
        found: format!("`{witness}`"),
    })
}

fn make_unit(codec: &Codec, union: TypeId, index: usize) -> Result<DynValue, CodecError> {
    let info = codec.types.get(union).expect("unions register their variants");
    let Shape::Union(shape) = &info.shape else {
        unreachable!("variant table points at a union")
    };
    let Variant::Unit { make, .. } = &shape.variants[index] else {
        unreachable!("unit names resolve to unit variants")
    };
    Ok(make())
}

fn decode_aggregate(
    codec: &Codec,
    info: &TypeInfo,
    aggregate: &crate::ty::AggregateShape,
    object: &JsObject,
) -> Result<DynValue, CodecError> {
    let mut values = Vec::with_capacity(aggregate.fields.len());
    for field in &aggregate.fields {
        let decoded = match object.get(field.name) {
            Some(item) => decode(codec, &field.desc, item)?,
            None => (field.absent)().ok_or_else(|| CodecError::MissingField {
                field: field.name.to_string(),
                container: info.desc.to_string(),
            })?,
        };
        values.push((field.name, Some(decoded)));
    }
    Ok((aggregate.construct)(FieldValues::new(values)))
}

fn lookup<'a>(codec: &'a Codec, declared: &TypeDesc) -> Result<&'a TypeInfo, CodecError> {
    codec
        .types
        .get(declared.id())
        .ok_or_else(|| CodecError::UnsupportedType(declared.to_string()))
}

fn decode_number(
    kind: ScalarKind,
    number: &Number,
    value: &JsValue,
) -> Result<DynValue, CodecError> {
    match kind {
        ScalarKind::I8 => integer::<i8>(number),
        ScalarKind::I16 => integer::<i16>(number),
        ScalarKind::I32 => integer::<i32>(number),
        ScalarKind::I64 => integer::<i64>(number),
        ScalarKind::U8 => integer::<u8>(number),
        ScalarKind::U16 => integer::<u16>(number),
        ScalarKind::U32 => integer::<u32>(number),
        ScalarKind::U64 => integer::<u64>(number),
        ScalarKind::F32 => {
            #[allow(clippy::cast_possible_truncation)]
            let narrow = number_to_f64(number) as f32;
            Ok(Box::new(narrow))
        }
        ScalarKind::F64 => Ok(Box::new(number_to_f64(number))),
        ScalarKind::BigInt => match number {
            Number::Int(v) => Ok(Box::new(BigInt::from(*v))),
            Number::BigInt(v) => Ok(Box::new(v.clone())),
            Number::Decimal(d) => d
                .to_bigint_exact()
                .map(|v| Box::new(v) as DynValue)
                .ok_or_else(|| integral_mismatch("bigint", number)),
            Number::Float(_) => Err(integral_mismatch("bigint", number)),
        },
        ScalarKind::Decimal => match number {
            Number::Int(v) => Ok(Box::new(Decimal::new(BigInt::from(*v), 0))),
            Number::BigInt(v) => Ok(Box::new(Decimal::new(v.clone(), 0))),
            Number::Decimal(d) => Ok(Box::new(d.clone())),
            Number::Float(_) => Err(CodecError::TypeMismatch {
                expected: "an exact decimal".to_string(),
                found: format!("`{number}`"),
            }),
        },
        ScalarKind::Bool | ScalarKind::Char | ScalarKind::Str => {
            Err(CodecError::mismatch(scalar_name(kind), value))
        }
    }
}

trait IntegerTarget: TryFrom<i128> + 'static {
    const NAME: &'static str;
    const MIN: i128;
    const MAX: i128;
}

macro_rules! integer_target {
    ($($ty:ty),+) => {
        $(impl IntegerTarget for $ty {
            const NAME: &'static str = stringify!($ty);
            const MIN: i128 = <$ty>::MIN as i128;
            const MAX: i128 = <$ty>::MAX as i128;
        })+
    };
}

integer_target!(i8, i16, i32, i64, u8, u16, u32, u64);

/// Exact integral conversion. Out-of-domain integrals are a [`CodecError::Range`];
/// fractional sources are a mismatch. Truncation never happens.
fn integer<T: IntegerTarget>(number: &Number) -> Result<DynValue, CodecError> {
    let exact = match number {
        Number::Int(v) => Some(i128::from(*v)),
        Number::BigInt(v) => v.to_i128(),
        Number::Decimal(d) => match d.to_bigint_exact() {
            Some(digits) => digits.to_i128(),
            None => return Err(integral_mismatch(T::NAME, number)),
        },
        Number::Float(_) => return Err(integral_mismatch(T::NAME, number)),
    };
    match exact {
        Some(v) if (T::MIN..=T::MAX).contains(&v) => match T::try_from(v) {
            Ok(narrow) => Ok(Box::new(narrow)),
            Err(_) => unreachable!("range checked above"),
        },
        _ => Err(CodecError::Range {
            value: number.to_string(),
            target: T::NAME,
        }),
    }
}

fn integral_mismatch(target: &str, number: &Number) -> CodecError {
    CodecError::TypeMismatch {
        expected: format!("an integral number for `{target}`"),
        found: format!("`{number}`"),
    }
}

fn number_to_f64(number: &Number) -> f64 {
    match number {
        #[allow(clippy::cast_precision_loss)]
        Number::Int(v) => *v as f64,
        Number::BigInt(v) => v.to_f64().unwrap_or(f64::NAN),
        Number::Decimal(d) => d.to_f64(),
        Number::Float(v) => *v,
    }
}

fn decode_scalar_string(
    kind: ScalarKind,
    text: &str,
    value: &JsValue,
) -> Result<DynValue, CodecError> {
    match kind {
        ScalarKind::Str => Ok(Box::new(text.to_string())),
        ScalarKind::Char => {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(Box::new(c)),
                _ => Err(CodecError::mismatch("a single-codepoint string", value)),
            }
        }
        ScalarKind::F64 => float_sentinel(text)
            .map(|v| Box::new(v) as DynValue)
            .ok_or_else(|| CodecError::mismatch("f64", value)),
        ScalarKind::F32 => float_sentinel(text)
            .map(|v| {
                #[allow(clippy::cast_possible_truncation)]
                let narrow = v as f32;
                Box::new(narrow) as DynValue
            })
            .ok_or_else(|| CodecError::mismatch("f32", value)),
        _ => Err(CodecError::mismatch(scalar_name(kind), value)),
    }
}

/// The quoted forms the printer emits for non-finite floats, plus the
/// explicitly signed positive infinity.
fn float_sentinel(text: &str) -> Option<f64> {
    match text {
        "NaN" => Some(f64::NAN),
        "Infinity" | "+Infinity" => Some(f64::INFINITY),
        "-Infinity" => Some(f64::NEG_INFINITY),
        _ => None,
    }
}

fn scalar_name(kind: ScalarKind) -> &'static str {
    match kind {
        ScalarKind::Bool => "bool",
        ScalarKind::I8 => "i8",
        ScalarKind::I16 => "i16",
        ScalarKind::I32 => "i32",
        ScalarKind::I64 => "i64",
        ScalarKind::U8 => "u8",
        ScalarKind::U16 => "u16",
        ScalarKind::U32 => "u32",
        ScalarKind::U64 => "u64",
        ScalarKind::F32 => "f32",
        ScalarKind::F64 => "f64",
        ScalarKind::Char => "char",
        ScalarKind::Str => "string",
        ScalarKind::BigInt => "bigint",
        ScalarKind::Decimal => "decimal",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;
    use crate::parse;

    #[test_case("42", 42i8)]
    #[test_case("-128", -128i8)]
    #[test_case("127", 127i8)]
    fn integers_in_range_narrow(input: &str, expected: i8) {
        let codec = Codec::new();
        let value = parse(input).expect("valid JSON");
        assert_eq!(codec.decode_as::<i8>(&value), Ok(expected));
    }

    #[test_case("1000")]
    #[test_case("-129")]
    #[test_case("9223372036854775808")]
    fn out_of_range_integers_never_truncate(input: &str) {
        let codec = Codec::new();
        let value = parse(input).expect("valid JSON");
        let error = codec.decode_as::<i8>(&value).expect_err("out of range");
        assert!(matches!(error, CodecError::Range { target: "i8", .. }));
    }

    #[test]
    fn integral_decimals_convert_exactly() {
        let codec = Codec::new();
        let value = parse("1e2").expect("valid JSON");
        assert_eq!(codec.decode_as::<i32>(&value), Ok(100));
        let fractional = parse("1.5").expect("valid JSON");
        assert!(codec.decode_as::<i32>(&fractional).is_err());
    }

    #[test_case("\"NaN\""; "nan")]
    #[test_case("\"Infinity\""; "infinity")]
    #[test_case("\"+Infinity\""; "positive infinity")]
    #[test_case("\"-Infinity\""; "negative infinity")]
    fn float_sentinels_decode(input: &str) {
        let codec = Codec::new();
        let value = parse(input).expect("valid JSON");
        let decoded = codec.decode_as::<f64>(&value).expect("sentinel");
        assert!(!decoded.is_finite());
    }

    #[test]
    fn null_needs_an_optional_target() {
        let mut codec = Codec::new();
        codec.register::<Option<i64>>();
        assert_eq!(codec.decode_as::<Option<i64>>(&JsValue::Null), Ok(None));
        assert!(codec.decode_as::<i64>(&JsValue::Null).is_err());
    }

    #[test]
    fn unknown_witnesses_are_rejected() {
        let codec = Codec::new();
        let value = parse(r#"{"value":1,"_type":"mystery"}"#).expect("valid JSON");
        assert_eq!(
            codec.decode(&TypeDesc::any(), &value).expect_err("unknown witness"),
            CodecError::UnknownType("mystery".to_string())
        );
    }
}
