//! Native graph to document model.
//!
//! Encoding dispatches on the runtime type's registered shape; the declared
//! type only decides whether a `_type` witness travels along. Aggregates get
//! the witness injected as their first entry, everything else is wrapped in a
//! `{"value": ..., "_type": ...}` envelope.

use std::any::{Any, TypeId};

use num_bigint::BigInt;

use crate::codec::Codec;
use crate::error::CodecError;
use crate::ty::{downcast_ref, ScalarKind, Shape, TypeDesc, TypeInfo, Variant};
use crate::value::{Decimal, JsObject, JsValue, Number};

pub(crate) fn encode(
    codec: &Codec,
    declared: &TypeDesc,
    value: &dyn Any,
    force_witness: bool,
) -> Result<JsValue, CodecError> {
    // The document model encodes as itself.
    if let Some(json) = value.downcast_ref::<JsValue>() {
        return Ok(json.clone());
    }
    if let Some(entry) = codec.converters.for_value(value) {
        let encoded = entry.converter.encode(value, codec)?;
        if force_witness || needs_witness(declared, entry.target.id()) {
            return Ok(envelope(codec, encoded, &entry.target));
        }
        return Ok(encoded);
    }
    let runtime = value.type_id();
    let Some(info) = codec.types.get(runtime) else {
        return Err(CodecError::UnsupportedType(declared.to_string()));
    };
    let witness = force_witness || needs_witness(declared, runtime);
    match &info.shape {
        Shape::Value => Ok(downcast_ref::<JsValue>(value).clone()),
        Shape::Scalar(kind) => Ok(wrap_if(codec, encode_scalar(*kind, value), info, witness)),
        Shape::Optional(optional) => match (optional.project)(value) {
            None => Ok(JsValue::Null),
            Some(inner) => {
                let inner_declared = if declared.id() == runtime {
                    &optional.inner
                } else {
                    declared
                };
                encode(codec, inner_declared, inner, force_witness)
            }
        },
        Shape::List(list) => {
            let mut items = Vec::new();
            for item in (list.iter)(value) {
                items.push(encode(codec, &list.element, item, false)?);
            }
            Ok(wrap_if(codec, JsValue::Array(items), info, witness))
        }
        Shape::Map(map) => {
            let mut object = JsObject::new();
            for (key, item) in (map.entries)(value) {
                object.insert(key, encode(codec, &map.value, item, false)?);
            }
            // Maps envelope instead of injecting, so a "_type" key in the
            // data cannot collide with the witness.
            Ok(wrap_if(codec, JsValue::Object(object), info, witness))
        }
        Shape::Wrapper(wrapper) => {
            let encoded = encode(codec, &wrapper.inner, (wrapper.project)(value), false)?;
            Ok(wrap_if(codec, encoded, info, witness))
        }
        Shape::Aggregate(aggregate) => {
            let mut object = JsObject::new();
            if witness {
                object.insert(
                    "_type".to_string(),
                    JsValue::String(codec.witness_for(&info.desc)),
                );
            }
            for field in &aggregate.fields {
                let encoded = encode(codec, &field.desc, (field.get)(value), false)?;
                object.insert(field.name.to_string(), encoded);
            }
            Ok(JsValue::Object(object))
        }
        Shape::Enum(shape) => {
            let encoded = JsValue::String((shape.name_of)(value).to_string());
            Ok(wrap_if(codec, encoded, info, witness))
        }
        Shape::Singleton(_) => {
            let mut object = JsObject::new();
            object.insert(
                "_type".to_string(),
                JsValue::String(codec.witness_for(&info.desc)),
            );
            Ok(JsValue::Object(object))
        }
        Shape::Union(shape) => {
            for variant in &shape.variants {
                match variant {
                    Variant::Unit { name, is, .. } => {
                        if is(value) {
                            return Ok(JsValue::String((*name).to_string()));
                        }
                    }
                    Variant::Data {
                        payload, project, ..
                    } => {
                        if let Some(inner) = project(value) {
                            // Data variants always carry the payload witness.
                            return encode(codec, payload, inner, true);
                        }
                    }
                }
            }
            Err(CodecError::UnsupportedType(info.desc.to_string()))
        }
    }
}

/// A witness travels whenever the declared type alone could not get the
/// runtime type back. Under `any`, the types the document model represents
/// losslessly stay bare.
fn needs_witness(declared: &TypeDesc, runtime: TypeId) -> bool {
    if declared.id() == runtime {
        return false;
    }
    if declared.is_any() {
        return !reconstructible(runtime);
    }
    true
}

fn reconstructible(runtime: TypeId) -> bool {
    runtime == TypeId::of::<bool>()
        || runtime == TypeId::of::<i64>()
        || runtime == TypeId::of::<f64>()
        || runtime == TypeId::of::<String>()
        || runtime == TypeId::of::<BigInt>()
        || runtime == TypeId::of::<Decimal>()
        || runtime == TypeId::of::<JsValue>()
}

fn wrap_if(codec: &Codec, encoded: JsValue, info: &TypeInfo, witness: bool) -> JsValue {
    if witness {
        envelope(codec, encoded, &info.desc)
    } else {
        encoded
    }
}

fn envelope(codec: &Codec, encoded: JsValue, desc: &TypeDesc) -> JsValue {
    let mut object = JsObject::new();
    object.insert("value".to_string(), encoded);
    object.insert(
        "_type".to_string(),
        JsValue::String(codec.witness_for(desc)),
    );
    JsValue::Object(object)
}

fn encode_scalar(kind: ScalarKind, value: &dyn Any) -> JsValue {
    match kind {
        ScalarKind::Bool => JsValue::Bool(*downcast_ref::<bool>(value)),
        ScalarKind::I8 => JsValue::from(i64::from(*downcast_ref::<i8>(value))),
        ScalarKind::I16 => JsValue::from(i64::from(*downcast_ref::<i16>(value))),
        ScalarKind::I32 => JsValue::from(i64::from(*downcast_ref::<i32>(value))),
        ScalarKind::I64 => JsValue::from(*downcast_ref::<i64>(value)),
        ScalarKind::U8 => JsValue::from(i64::from(*downcast_ref::<u8>(value))),
        ScalarKind::U16 => JsValue::from(i64::from(*downcast_ref::<u16>(value))),
        ScalarKind::U32 => JsValue::from(i64::from(*downcast_ref::<u32>(value))),
        ScalarKind::U64 => {
            let wide = *downcast_ref::<u64>(value);
            match i64::try_from(wide) {
                Ok(narrow) => JsValue::from(narrow),
                Err(_) => JsValue::Number(Number::BigInt(BigInt::from(wide))),
            }
        }
        ScalarKind::F32 => JsValue::Number(Number::Float(f64::from(*downcast_ref::<f32>(value)))),
        ScalarKind::F64 => JsValue::Number(Number::Float(*downcast_ref::<f64>(value))),
        ScalarKind::Char => JsValue::String(downcast_ref::<char>(value).to_string()),
        ScalarKind::Str => JsValue::String(downcast_ref::<String>(value).clone()),
        ScalarKind::BigInt => JsValue::Number(Number::BigInt(downcast_ref::<BigInt>(value).clone())),
        ScalarKind::Decimal => {
            JsValue::Number(Number::Decimal(downcast_ref::<Decimal>(value).clone()))
        }
    }
}
