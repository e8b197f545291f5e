//! The type-directed bidirectional codec.

use std::any::{Any, TypeId};
use std::sync::Arc;

use num_bigint::BigInt;
use tracing::debug;

use crate::error::CodecError;
use crate::registry::{Aliases, Converter, ConverterEntry, Converters, TypeRegistry};
use crate::ty::{DynValue, Reflected, TypeDesc, TypeInfo};
use crate::value::{Decimal, JsValue};
use crate::{decode, encode};

/// Converts between the document model and native object graphs.
///
/// A codec is configured up front: registering types, aliases and converters
/// takes `&mut self`, while [`encode`](Codec::encode) and
/// [`decode`](Codec::decode) take `&self`. Mutating the configuration
/// concurrently with conversions is therefore ruled out structurally.
///
/// The scalar built-ins are pre-registered, as are the conventional witness
/// tags for the numeric types (`"int"` for `i32`, `"long"` for `i64` and so
/// on). Everything else, including each container instantiation, is
/// registered explicitly; component types are picked up transitively.
pub struct Codec {
    pub(crate) types: TypeRegistry,
    pub(crate) aliases: Aliases,
    pub(crate) converters: Converters,
}

impl Default for Codec {
    fn default() -> Self {
        Self::new()
    }
}

impl Codec {
    pub fn new() -> Self {
        let mut codec = Self {
            types: TypeRegistry::default(),
            aliases: Aliases::with_builtins(),
            converters: Converters::default(),
        };
        codec
            .register::<bool>()
            .register::<i8>()
            .register::<i16>()
            .register::<i32>()
            .register::<i64>()
            .register::<u8>()
            .register::<u16>()
            .register::<u32>()
            .register::<u64>()
            .register::<f32>()
            .register::<f64>()
            .register::<char>()
            .register::<String>()
            .register::<BigInt>()
            .register::<Decimal>()
            .register::<JsValue>();
        codec
    }

    /// Registers `T` and, transitively, every component type its schema
    /// refers to. Re-registration is a no-op.
    pub fn register<T: Reflected>(&mut self) -> &mut Self {
        self.register_info(T::type_info());
        self
    }

    fn register_info(&mut self, info: TypeInfo) {
        if self.types.contains(info.desc.id()) {
            return;
        }
        let deps = info.deps.clone();
        self.types.insert(info);
        for dep in deps {
            self.register_info(dep());
        }
    }

    /// Registers `T` under a short witness tag. The tag replaces the full
    /// type name in `_type` witnesses.
    pub fn alias<T: Reflected>(&mut self, tag: &str) -> &mut Self {
        self.register::<T>();
        debug!(tag, ty = %T::type_desc(), "registering alias");
        self.aliases.insert(tag, TypeId::of::<T>());
        self
    }

    /// Registers a converter that takes over the representation of `T`.
    pub fn register_converter<T: Reflected, C: Converter + 'static>(
        &mut self,
        converter: C,
    ) -> &mut Self {
        self.register::<T>();
        self.converters.push(ConverterEntry {
            target: T::type_desc(),
            accepts: Box::new(|value: &dyn Any| value.is::<T>()),
            converter: Arc::new(converter),
        });
        self
    }

    /// Registers a converter selected by a runtime predicate, for families
    /// of types sharing one representation. The first matching converter in
    /// registration order wins, so register the most specific one first.
    pub fn register_converter_matching(
        &mut self,
        target: TypeDesc,
        accepts: impl Fn(&dyn Any) -> bool + Send + Sync + 'static,
        converter: impl Converter + 'static,
    ) -> &mut Self {
        self.converters.push(ConverterEntry {
            target,
            accepts: Box::new(accepts),
            converter: Arc::new(converter),
        });
        self
    }

    /// Encodes a native value against the declared type. A `_type` witness
    /// is attached whenever the declared type alone could not reconstruct
    /// the runtime type.
    pub fn encode(&self, declared: &TypeDesc, value: &dyn Any) -> Result<JsValue, CodecError> {
        encode::encode(self, declared, value, false)
    }

    /// [`encode`](Codec::encode) with the declared type taken from `T`.
    pub fn encode_as<T: Reflected>(&self, value: &T) -> Result<JsValue, CodecError> {
        self.encode(&T::type_desc(), value)
    }

    /// Decodes a document value against the declared type. A `_type` witness
    /// in the value outranks the declared type.
    pub fn decode(&self, declared: &TypeDesc, value: &JsValue) -> Result<DynValue, CodecError> {
        decode::decode(self, declared, value)
    }

    /// [`decode`](Codec::decode) with the declared type taken from `T`,
    /// downcast to it.
    pub fn decode_as<T: Reflected>(&self, value: &JsValue) -> Result<T, CodecError> {
        let decoded = self.decode(&T::type_desc(), value)?;
        match decoded.downcast::<T>() {
            Ok(boxed) => Ok(*boxed),
            // Reachable only through a converter that produced a foreign
            // type for its declared target.
            Err(_) => Err(CodecError::TypeMismatch {
                expected: T::type_desc().to_string(),
                found: "a converter-produced value of another type".to_string(),
            }),
        }
    }

    /// The witness string for a type: its alias tag when one is registered,
    /// else the rendered type name.
    pub(crate) fn witness_for(&self, desc: &TypeDesc) -> String {
        match self.aliases.tag_for(desc.id()) {
            Some(tag) => tag.to_string(),
            None => desc.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_preregistered() {
        let codec = Codec::new();
        assert!(codec.types.contains(TypeId::of::<i32>()));
        assert!(codec.types.contains(TypeId::of::<String>()));
        assert!(codec.types.contains(TypeId::of::<JsValue>()));
        assert!(!codec.types.contains(TypeId::of::<Vec<i64>>()));
    }

    #[test]
    fn registration_pulls_in_component_types() {
        let mut codec = Codec::new();
        codec.register::<Vec<Option<Vec<i64>>>>();
        assert!(codec.types.contains(TypeId::of::<Option<Vec<i64>>>()));
        assert!(codec.types.contains(TypeId::of::<Vec<i64>>()));
    }

    #[test]
    fn witnesses_prefer_alias_tags() {
        let codec = Codec::new();
        assert_eq!(codec.witness_for(&i32::type_desc()), "int");
        assert_eq!(codec.witness_for(&String::type_desc()), "string");
        assert_eq!(codec.witness_for(&Vec::<i64>::type_desc()), "list<i64>");
    }
}
