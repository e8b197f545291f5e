//! Built-in schemas: scalars, the document model, optionals, sequences and
//! maps.
//!
//! Container impls are blanket over their element schemas; each concrete
//! instantiation is its own registered type. The canonical container mapping
//! is documented on each impl: `list` is `Vec`, `set` is `AHashSet`,
//! `sorted-set` is `BTreeSet`, `deque` is `VecDeque`, `heap` is
//! `BinaryHeap`, `arrayN` is `[T; N]`, `map` is `IndexMap` and `hashmap` is
//! `AHashMap`.

use std::collections::{BTreeSet, BinaryHeap, VecDeque};
use std::hash::Hash;

use ahash::{AHashMap, AHashSet};
use indexmap::IndexMap;
use num_bigint::BigInt;

use crate::error::CodecError;
use crate::ty::{
    downcast, option_lift, option_project, DynValue, JsonKey, ListShape, Reflected, ScalarKind,
    Shape, TypeDesc, TypeInfo,
};
use crate::value::{Decimal, JsValue};

macro_rules! reflect_scalar {
    ($ty:ty, $name:literal, $kind:ident) => {
        impl Reflected for $ty {
            fn type_desc() -> TypeDesc {
                TypeDesc::simple::<$ty>($name)
            }

            fn type_info() -> TypeInfo {
                TypeInfo::scalar(Self::type_desc(), ScalarKind::$kind)
            }
        }
    };
}

reflect_scalar!(bool, "bool", Bool);
reflect_scalar!(i8, "i8", I8);
reflect_scalar!(i16, "i16", I16);
reflect_scalar!(i32, "i32", I32);
reflect_scalar!(i64, "i64", I64);
reflect_scalar!(u8, "u8", U8);
reflect_scalar!(u16, "u16", U16);
reflect_scalar!(u32, "u32", U32);
reflect_scalar!(u64, "u64", U64);
reflect_scalar!(f32, "f32", F32);
reflect_scalar!(f64, "f64", F64);
reflect_scalar!(char, "char", Char);
reflect_scalar!(String, "string", Str);
reflect_scalar!(BigInt, "bigint", BigInt);
reflect_scalar!(Decimal, "decimal", Decimal);

impl Reflected for JsValue {
    fn type_desc() -> TypeDesc {
        TypeDesc::simple::<JsValue>("json")
    }

    fn type_info() -> TypeInfo {
        TypeInfo {
            desc: Self::type_desc(),
            shape: Shape::Value,
            deps: Vec::new(),
        }
    }
}

impl<T: Reflected> Reflected for Option<T> {
    fn type_desc() -> TypeDesc {
        TypeDesc::generic::<Option<T>>("option", vec![T::type_desc()])
    }

    fn type_info() -> TypeInfo {
        TypeInfo {
            desc: Self::type_desc(),
            shape: Shape::Optional(crate::ty::OptionalShape {
                inner: T::type_desc(),
                project: option_project::<T>,
                lift: option_lift::<T>,
            }),
            deps: vec![T::type_info],
        }
    }

    /// A missing field is a present `None`.
    fn absent() -> Option<DynValue> {
        Some(Box::new(None::<T>))
    }
}

impl<T: Reflected> Reflected for Vec<T> {
    fn type_desc() -> TypeDesc {
        TypeDesc::generic::<Vec<T>>("list", vec![T::type_desc()])
    }

    fn type_info() -> TypeInfo {
        TypeInfo::sequence::<Vec<T>, T>(Self::type_desc(), None)
    }
}

impl<T: Reflected> Reflected for VecDeque<T> {
    fn type_desc() -> TypeDesc {
        TypeDesc::generic::<VecDeque<T>>("deque", vec![T::type_desc()])
    }

    fn type_info() -> TypeInfo {
        TypeInfo::sequence::<VecDeque<T>, T>(Self::type_desc(), None)
    }
}

impl<T: Reflected + Eq + Hash> Reflected for AHashSet<T> {
    fn type_desc() -> TypeDesc {
        TypeDesc::generic::<AHashSet<T>>("set", vec![T::type_desc()])
    }

    fn type_info() -> TypeInfo {
        TypeInfo::sequence::<AHashSet<T>, T>(Self::type_desc(), None)
    }
}

impl<T: Reflected + Ord> Reflected for BTreeSet<T> {
    fn type_desc() -> TypeDesc {
        TypeDesc::generic::<BTreeSet<T>>("sorted-set", vec![T::type_desc()])
    }

    fn type_info() -> TypeInfo {
        TypeInfo::sequence::<BTreeSet<T>, T>(Self::type_desc(), None)
    }
}

impl<T: Reflected + Ord> Reflected for BinaryHeap<T> {
    fn type_desc() -> TypeDesc {
        TypeDesc::generic::<BinaryHeap<T>>("heap", vec![T::type_desc()])
    }

    fn type_info() -> TypeInfo {
        TypeInfo::sequence::<BinaryHeap<T>, T>(Self::type_desc(), None)
    }
}

impl<T: Reflected, const N: usize> Reflected for [T; N] {
    /// The length is part of the identity: `array3<i64>`.
    fn type_desc() -> TypeDesc {
        TypeDesc::generic_named::<[T; N]>(format!("array{N}"), vec![T::type_desc()])
    }

    fn type_info() -> TypeInfo {
        TypeInfo {
            desc: Self::type_desc(),
            shape: Shape::List(ListShape {
                element: T::type_desc(),
                len: Some(N),
                iter: super::seq_iter::<[T; N], T>,
                collect: array_collect::<T, N>,
            }),
            deps: vec![T::type_info],
        }
    }
}

fn array_collect<T: 'static, const N: usize>(items: Vec<DynValue>) -> Result<DynValue, CodecError> {
    if items.len() != N {
        return Err(CodecError::TypeMismatch {
            expected: format!("an array of {N} elements"),
            found: format!("an array of {} elements", items.len()),
        });
    }
    let collected: Vec<T> = items.into_iter().map(downcast::<T>).collect();
    let Ok(array) = <[T; N]>::try_from(collected) else {
        unreachable!("length checked above")
    };
    Ok(Box::new(array))
}

impl<K: JsonKey + Eq + Hash, V: Reflected> Reflected for IndexMap<K, V> {
    fn type_desc() -> TypeDesc {
        TypeDesc::generic::<IndexMap<K, V>>("map", vec![K::type_desc(), V::type_desc()])
    }

    fn type_info() -> TypeInfo {
        TypeInfo::mapping::<IndexMap<K, V>, K, V>(Self::type_desc())
    }
}

impl<K: JsonKey + Eq + Hash, V: Reflected> Reflected for AHashMap<K, V> {
    fn type_desc() -> TypeDesc {
        TypeDesc::generic::<AHashMap<K, V>>("hashmap", vec![K::type_desc(), V::type_desc()])
    }

    fn type_info() -> TypeInfo {
        TypeInfo::mapping::<AHashMap<K, V>, K, V>(Self::type_desc())
    }
}

impl JsonKey for String {
    fn to_key(&self) -> String {
        self.clone()
    }

    fn from_key(key: &str) -> Result<Self, CodecError> {
        Ok(key.to_string())
    }
}

impl JsonKey for bool {
    fn to_key(&self) -> String {
        self.to_string()
    }

    fn from_key(key: &str) -> Result<Self, CodecError> {
        match key {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(key_error("bool", key)),
        }
    }
}

impl JsonKey for char {
    fn to_key(&self) -> String {
        self.to_string()
    }

    fn from_key(key: &str) -> Result<Self, CodecError> {
        let mut chars = key.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(key_error("char", key)),
        }
    }
}

macro_rules! integer_key {
    ($($ty:ty),+) => {
        $(impl JsonKey for $ty {
            fn to_key(&self) -> String {
                self.to_string()
            }

            fn from_key(key: &str) -> Result<Self, CodecError> {
                key.parse().map_err(|_| key_error(stringify!($ty), key))
            }
        })+
    };
}

integer_key!(i8, i16, i32, i64, u8, u16, u32, u64);

fn key_error(target: &str, key: &str) -> CodecError {
    CodecError::TypeMismatch {
        expected: format!("a `{target}` map key"),
        found: format!("`{key}`"),
    }
}
