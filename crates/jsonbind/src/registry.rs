//! Codec configuration state: registered type schemas, witness aliases and
//! pluggable converters.
//!
//! All three tables are populated at start-up through `&mut` registration and
//! read-only afterwards; the encode/decode paths never mutate them.

use std::any::{Any, TypeId};
use std::sync::Arc;

use ahash::AHashMap;
use tracing::debug;

use crate::codec::Codec;
use crate::error::CodecError;
use crate::ty::{DynValue, Shape, TypeDesc, TypeInfo, Variant};
use crate::value::JsValue;

/// What a type name in a witness position resolves to.
pub(crate) enum NameEntry {
    Type(TypeId),
    /// A unit variant of a registered union, e.g. `"Ping"`.
    UnionUnit { union: TypeId, index: usize },
}

#[derive(Default)]
pub(crate) struct TypeRegistry {
    infos: AHashMap<TypeId, TypeInfo>,
    by_name: AHashMap<String, NameEntry>,
    /// Payload type to the union variant that owns it.
    variant_of: AHashMap<TypeId, (TypeId, usize)>,
}

impl TypeRegistry {
    pub(crate) fn insert(&mut self, info: TypeInfo) {
        let id = info.desc.id();
        let rendered = info.desc.to_string();
        debug!(ty = %rendered, "registering type");
        if let Shape::Union(shape) = &info.shape {
            for (index, variant) in shape.variants.iter().enumerate() {
                match variant {
                    Variant::Unit { name, .. } => {
                        self.by_name
                            .insert((*name).to_string(), NameEntry::UnionUnit { union: id, index });
                    }
                    Variant::Data { payload, .. } => {
                        self.variant_of.insert(payload.id(), (id, index));
                    }
                }
            }
        }
        self.by_name.insert(rendered, NameEntry::Type(id));
        self.infos.insert(id, info);
    }

    pub(crate) fn contains(&self, id: TypeId) -> bool {
        self.infos.contains_key(&id)
    }

    pub(crate) fn get(&self, id: TypeId) -> Option<&TypeInfo> {
        self.infos.get(&id)
    }

    pub(crate) fn resolve(&self, name: &str) -> Option<&NameEntry> {
        self.by_name.get(name)
    }

    pub(crate) fn variant_of(&self, payload: TypeId) -> Option<(TypeId, usize)> {
        self.variant_of.get(&payload).copied()
    }
}

/// Bijective short tag to type mapping used in witness strings.
#[derive(Default)]
pub(crate) struct Aliases {
    by_tag: AHashMap<String, TypeId>,
    by_id: AHashMap<TypeId, String>,
}

impl Aliases {
    /// The conventional tags for the numeric built-ins.
    pub(crate) fn with_builtins() -> Self {
        let mut aliases = Self::default();
        aliases.insert("byte", TypeId::of::<i8>());
        aliases.insert("short", TypeId::of::<i16>());
        aliases.insert("int", TypeId::of::<i32>());
        aliases.insert("long", TypeId::of::<i64>());
        aliases.insert("ubyte", TypeId::of::<u8>());
        aliases.insert("ushort", TypeId::of::<u16>());
        aliases.insert("uint", TypeId::of::<u32>());
        aliases.insert("ulong", TypeId::of::<u64>());
        aliases.insert("float", TypeId::of::<f32>());
        aliases.insert("double", TypeId::of::<f64>());
        aliases
    }

    /// Registers a tag, displacing any previous pairing of either side.
    pub(crate) fn insert(&mut self, tag: &str, id: TypeId) {
        if let Some(previous) = self.by_id.remove(&id) {
            self.by_tag.remove(&previous);
        }
        if let Some(previous) = self.by_tag.remove(tag) {
            self.by_id.remove(&previous);
        }
        self.by_tag.insert(tag.to_string(), id);
        self.by_id.insert(id, tag.to_string());
    }

    pub(crate) fn resolve(&self, tag: &str) -> Option<TypeId> {
        self.by_tag.get(tag).copied()
    }

    pub(crate) fn tag_for(&self, id: TypeId) -> Option<&str> {
        self.by_id.get(&id).map(String::as_str)
    }
}

/// Pluggable per-type codec, overriding the shape-driven paths.
///
/// Converters recurse through the owning [`Codec`] for nested values.
pub trait Converter: Send + Sync {
    fn encode(&self, value: &dyn Any, codec: &Codec) -> Result<JsValue, CodecError>;

    fn decode(&self, value: &JsValue, codec: &Codec) -> Result<DynValue, CodecError>;
}

pub(crate) struct ConverterEntry {
    pub(crate) target: TypeDesc,
    pub(crate) accepts: Box<dyn Fn(&dyn Any) -> bool + Send + Sync>,
    pub(crate) converter: Arc<dyn Converter>,
}

/// Ordered converter list. Lookup takes the first match, so the most
/// specific converter must be registered first.
#[derive(Default)]
pub(crate) struct Converters {
    entries: Vec<ConverterEntry>,
}

impl Converters {
    pub(crate) fn push(&mut self, entry: ConverterEntry) {
        debug!(target = %entry.target, "registering converter");
        self.entries.push(entry);
    }

    pub(crate) fn for_value(&self, value: &dyn Any) -> Option<&ConverterEntry> {
        self.entries.iter().find(|entry| (entry.accepts)(value))
    }

    pub(crate) fn for_target(&self, id: TypeId) -> Option<&ConverterEntry> {
        self.entries.iter().find(|entry| entry.target.id() == id)
    }
}
