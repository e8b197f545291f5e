//! Runtime type schemas.
//!
//! There is no reflection to lean on, so every codec-visible type carries an
//! explicit, hand-registered schema: a [`TypeDesc`] naming the type and its
//! generic arguments, and a [`TypeInfo`] describing its shape together with
//! the accessors the encode/decode paths drive. Generic containers are
//! covered per instantiation: registering `Vec<Point>` registers exactly that
//! monomorphization, nothing else.

mod builtin;

use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;

use crate::error::CodecError;

/// A decoded native value with its static type erased.
pub type DynValue = Box<dyn Any>;

/// Uninhabited marker behind [`TypeDesc::any`].
enum AnyMarker {}

/// A declared-type descriptor: identity, name and generic arguments.
///
/// Equality and hashing use the [`TypeId`] alone; the name exists for witness
/// strings and diagnostics. `TypeDesc::any()` is the fully open type that
/// accepts every registered value.
#[derive(Debug, Clone)]
pub struct TypeDesc {
    id: TypeId,
    name: Cow<'static, str>,
    args: Vec<TypeDesc>,
}

impl TypeDesc {
    pub fn simple<T: 'static>(name: &'static str) -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: Cow::Borrowed(name),
            args: Vec::new(),
        }
    }

    pub fn generic<T: 'static>(name: &'static str, args: Vec<TypeDesc>) -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: Cow::Borrowed(name),
            args,
        }
    }

    /// Variant of [`TypeDesc::generic`] for names that must be computed, such
    /// as fixed-size arrays whose length is part of the identity.
    pub fn generic_named<T: 'static>(name: String, args: Vec<TypeDesc>) -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: Cow::Owned(name),
            args,
        }
    }

    pub fn of<T: Reflected>() -> Self {
        T::type_desc()
    }

    /// The fully open declared type. Values encoded against it carry a type
    /// witness whenever their runtime type is not reconstructible from the
    /// document model alone.
    pub fn any() -> Self {
        TypeDesc::simple::<AnyMarker>("any")
    }

    pub fn is_any(&self) -> bool {
        self.id == TypeId::of::<AnyMarker>()
    }

    pub(crate) fn id(&self) -> TypeId {
        self.id
    }
}

impl PartialEq for TypeDesc {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeDesc {}

impl std::hash::Hash for TypeDesc {
    fn hash<H: std::hash::Hasher>(&self, h: &mut H) {
        self.id.hash(h);
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if let Some((first, rest)) = self.args.split_first() {
            write!(f, "<{first}")?;
            for arg in rest {
                write!(f, ", {arg}")?;
            }
            f.write_str(">")?;
        }
        Ok(())
    }
}

/// Registration hook tying a native type to its schema.
///
/// Implemented by hand, by the [`reflect_struct!`](crate::reflect_struct) and
/// [`reflect_enum!`](crate::reflect_enum) macros, or by the blanket container
/// impls in this module.
pub trait Reflected: Sized + 'static {
    fn type_desc() -> TypeDesc;

    fn type_info() -> TypeInfo;

    /// The value a missing field materializes as, if the type has one.
    /// `Option<T>` overrides this to `None`; everything else is required.
    fn absent() -> Option<DynValue> {
        None
    }
}

/// Map-key codec: types usable as object keys.
pub trait JsonKey: Reflected {
    fn to_key(&self) -> String;

    fn from_key(key: &str) -> Result<Self, CodecError>;
}

type Thunk = fn() -> TypeInfo;
type ProjectFn = Box<dyn (for<'a> Fn(&'a dyn Any) -> &'a dyn Any) + Send + Sync>;

/// A registered type schema: descriptor plus shape vtable.
pub struct TypeInfo {
    pub(crate) desc: TypeDesc,
    pub(crate) shape: Shape,
    /// Schemas of component types, registered transitively.
    pub(crate) deps: Vec<Thunk>,
}

pub(crate) enum Shape {
    Scalar(ScalarKind),
    /// The document model itself; encodes and decodes by identity.
    Value,
    Optional(OptionalShape),
    List(ListShape),
    Map(MapShape),
    Wrapper(WrapperShape),
    Aggregate(AggregateShape),
    Enum(EnumShape),
    Singleton(SingletonShape),
    Union(UnionShape),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScalarKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Char,
    Str,
    BigInt,
    Decimal,
}

pub(crate) struct OptionalShape {
    pub(crate) inner: TypeDesc,
    /// `Some` projection; `None` when the value holds nothing.
    pub(crate) project: fn(&dyn Any) -> Option<&dyn Any>,
    /// Rebuilds the optional from a decoded inner value (or its absence).
    pub(crate) lift: fn(Option<DynValue>) -> DynValue,
}

pub(crate) struct ListShape {
    pub(crate) element: TypeDesc,
    /// Fixed length, for array-backed sequences.
    pub(crate) len: Option<usize>,
    pub(crate) iter: fn(&dyn Any) -> Vec<&dyn Any>,
    pub(crate) collect: fn(Vec<DynValue>) -> Result<DynValue, CodecError>,
}

pub(crate) struct MapShape {
    pub(crate) key: TypeDesc,
    pub(crate) value: TypeDesc,
    pub(crate) entries: fn(&dyn Any) -> Vec<(String, &dyn Any)>,
    pub(crate) from_entries: fn(Vec<(String, DynValue)>) -> Result<DynValue, CodecError>,
}

pub(crate) struct WrapperShape {
    pub(crate) inner: TypeDesc,
    pub(crate) project: ProjectFn,
    pub(crate) wrap: Box<dyn Fn(DynValue) -> DynValue + Send + Sync>,
}

pub(crate) struct FieldInfo {
    pub(crate) name: &'static str,
    pub(crate) desc: TypeDesc,
    pub(crate) get: ProjectFn,
    pub(crate) absent: fn() -> Option<DynValue>,
}

pub(crate) struct AggregateShape {
    pub(crate) fields: Vec<FieldInfo>,
    pub(crate) construct: Box<dyn Fn(FieldValues) -> DynValue + Send + Sync>,
}

pub(crate) struct EnumShape {
    pub(crate) name_of: Box<dyn Fn(&dyn Any) -> &'static str + Send + Sync>,
    pub(crate) from_name: Box<dyn Fn(&str) -> Option<DynValue> + Send + Sync>,
}

pub(crate) struct SingletonShape {
    pub(crate) make: Box<dyn Fn() -> DynValue + Send + Sync>,
}

pub(crate) struct UnionShape {
    pub(crate) variants: Vec<Variant>,
}

pub(crate) enum Variant {
    /// Stateless variant, represented by its name alone.
    Unit {
        name: &'static str,
        is: Box<dyn Fn(&dyn Any) -> bool + Send + Sync>,
        make: Box<dyn Fn() -> DynValue + Send + Sync>,
    },
    /// Variant carrying a registered payload type.
    Data {
        payload: TypeDesc,
        project: Box<dyn for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Any> + Send + Sync>,
        wrap: Box<dyn Fn(DynValue) -> DynValue + Send + Sync>,
    },
}

impl TypeInfo {
    pub(crate) fn scalar(desc: TypeDesc, kind: ScalarKind) -> Self {
        Self {
            desc,
            shape: Shape::Scalar(kind),
            deps: Vec::new(),
        }
    }

    /// Schema for an ordered or unordered sequence container.
    pub fn sequence<C, T>(desc: TypeDesc, len: Option<usize>) -> Self
    where
        C: FromIterator<T> + 'static,
        T: Reflected,
        for<'a> &'a C: IntoIterator<Item = &'a T>,
    {
        Self {
            desc,
            shape: Shape::List(ListShape {
                element: T::type_desc(),
                len,
                iter: seq_iter::<C, T>,
                collect: seq_collect::<C, T>,
            }),
            deps: vec![T::type_info],
        }
    }

    /// Schema for a key/value container. Keys travel through [`JsonKey`].
    pub fn mapping<M, K, V>(desc: TypeDesc) -> Self
    where
        M: FromIterator<(K, V)> + 'static,
        K: JsonKey,
        V: Reflected,
        for<'a> &'a M: IntoIterator<Item = (&'a K, &'a V)>,
    {
        Self {
            desc,
            shape: Shape::Map(MapShape {
                key: K::type_desc(),
                value: V::type_desc(),
                entries: map_entries::<M, K, V>,
                from_entries: map_from_entries::<M, K, V>,
            }),
            deps: vec![K::type_info, V::type_info],
        }
    }

    /// Schema for a single-field transparent wrapper: the wrapper is
    /// represented as its inner value.
    pub fn wrapper<W, I, P, F>(project: P, wrap: F) -> Self
    where
        W: Reflected,
        I: Reflected,
        P: for<'a> Fn(&'a W) -> &'a I + Send + Sync + 'static,
        F: Fn(I) -> W + Send + Sync + 'static,
    {
        Self {
            desc: W::type_desc(),
            shape: Shape::Wrapper(WrapperShape {
                inner: I::type_desc(),
                project: Box::new(move |value: &dyn Any| {
                    project(downcast_ref::<W>(value)) as &dyn Any
                }),
                wrap: Box::new(move |inner| Box::new(wrap(downcast::<I>(inner)))),
            }),
            deps: vec![I::type_info],
        }
    }

    /// Starts the schema of a plain field aggregate. Usually written through
    /// [`reflect_struct!`](crate::reflect_struct).
    pub fn aggregate<T: Reflected>() -> AggregateBuilder<T> {
        AggregateBuilder {
            fields: Vec::new(),
            deps: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Schema for a C-like enum: a closed set of named constants.
    pub fn enumeration<E: Reflected>(
        name_of: fn(&E) -> &'static str,
        from_name: fn(&str) -> Option<E>,
    ) -> Self {
        Self {
            desc: E::type_desc(),
            shape: Shape::Enum(EnumShape {
                name_of: Box::new(move |value| name_of(downcast_ref::<E>(value))),
                from_name: Box::new(move |name| {
                    from_name(name).map(|value| Box::new(value) as DynValue)
                }),
            }),
            deps: Vec::new(),
        }
    }

    /// Schema for a stateless singleton, represented as its witness alone.
    pub fn singleton<T: Reflected>(make: impl Fn() -> T + Send + Sync + 'static) -> Self {
        Self {
            desc: T::type_desc(),
            shape: Shape::Singleton(SingletonShape {
                make: Box::new(move || Box::new(make())),
            }),
            deps: Vec::new(),
        }
    }

    /// Starts the schema of a closed variant set. Usually written through
    /// [`reflect_union!`](crate::reflect_union).
    pub fn union<U: Reflected>() -> UnionBuilder<U> {
        UnionBuilder {
            variants: Vec::new(),
            deps: Vec::new(),
            _marker: PhantomData,
        }
    }
}

/// Incremental schema construction for aggregates.
pub struct AggregateBuilder<T> {
    fields: Vec<FieldInfo>,
    deps: Vec<Thunk>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Reflected> AggregateBuilder<T> {
    pub fn field<F, G>(mut self, name: &'static str, get: G) -> Self
    where
        F: Reflected,
        G: for<'a> Fn(&'a T) -> &'a F + Send + Sync + 'static,
    {
        self.deps.push(F::type_info);
        self.fields.push(FieldInfo {
            name,
            desc: F::type_desc(),
            get: Box::new(move |value: &dyn Any| get(downcast_ref::<T>(value)) as &dyn Any),
            absent: F::absent,
        });
        self
    }

    /// Finishes the schema with the field-binding constructor. The closure
    /// receives every declared field, already decoded.
    pub fn construct(self, build: impl Fn(&mut FieldValues) -> T + Send + Sync + 'static) -> TypeInfo {
        TypeInfo {
            desc: T::type_desc(),
            shape: Shape::Aggregate(AggregateShape {
                fields: self.fields,
                construct: Box::new(move |mut values| Box::new(build(&mut values)) as DynValue),
            }),
            deps: self.deps,
        }
    }
}

/// Incremental schema construction for closed variant sets.
pub struct UnionBuilder<U> {
    variants: Vec<Variant>,
    deps: Vec<Thunk>,
    _marker: PhantomData<fn() -> U>,
}

impl<U: Reflected> UnionBuilder<U> {
    /// A variant without payload, represented by `name`.
    pub fn unit(
        mut self,
        name: &'static str,
        is: impl Fn(&U) -> bool + Send + Sync + 'static,
        make: impl Fn() -> U + Send + Sync + 'static,
    ) -> Self {
        self.variants.push(Variant::Unit {
            name,
            is: Box::new(move |value| is(downcast_ref::<U>(value))),
            make: Box::new(move || Box::new(make())),
        });
        self
    }

    /// A variant carrying a payload type, represented as the payload with a
    /// type witness.
    pub fn data<P, G, W>(mut self, project: G, wrap: W) -> Self
    where
        P: Reflected,
        G: for<'a> Fn(&'a U) -> Option<&'a P> + Send + Sync + 'static,
        W: Fn(P) -> U + Send + Sync + 'static,
    {
        self.deps.push(P::type_info);
        self.variants.push(Variant::Data {
            payload: P::type_desc(),
            project: Box::new(move |value: &dyn Any| {
                project(downcast_ref::<U>(value)).map(|payload| payload as &dyn Any)
            }),
            wrap: Box::new(move |payload| Box::new(wrap(downcast::<P>(payload)))),
        });
        self
    }

    pub fn finish(self) -> TypeInfo {
        TypeInfo {
            desc: U::type_desc(),
            shape: Shape::Union(UnionShape {
                variants: self.variants,
            }),
            deps: self.deps,
        }
    }
}

/// Decoded field values handed to an aggregate constructor, keyed by the
/// declared field names.
pub struct FieldValues {
    entries: Vec<(&'static str, Option<DynValue>)>,
}

impl FieldValues {
    pub(crate) fn new(entries: Vec<(&'static str, Option<DynValue>)>) -> Self {
        Self { entries }
    }

    /// Removes and downcasts the named field. Every declared field is bound
    /// exactly once before the constructor runs, so a second `take` of the
    /// same name is a programming error.
    pub fn take<F: Reflected>(&mut self, name: &str) -> F {
        let entry = self
            .entries
            .iter_mut()
            .find(|(field, value)| *field == name && value.is_some())
            .expect("every declared field is bound before construction");
        downcast::<F>(entry.1.take().expect("presence checked above"))
    }
}

// Downcasts below run only after dispatch on the matching TypeId, so a
// failure is an internal invariant violation, never user input.

pub(crate) fn downcast_ref<T: 'static>(value: &dyn Any) -> &T {
    value
        .downcast_ref::<T>()
        .expect("shape dispatch matches the runtime type")
}

pub(crate) fn downcast<T: 'static>(value: DynValue) -> T {
    match value.downcast::<T>() {
        Ok(boxed) => *boxed,
        Err(_) => unreachable!("shape dispatch matches the runtime type"),
    }
}

pub(crate) fn option_project<T: Reflected>(value: &dyn Any) -> Option<&dyn Any> {
    downcast_ref::<Option<T>>(value)
        .as_ref()
        .map(|inner| inner as &dyn Any)
}

pub(crate) fn option_lift<T: Reflected>(inner: Option<DynValue>) -> DynValue {
    match inner {
        None => Box::new(None::<T>),
        Some(value) => Box::new(Some(downcast::<T>(value))),
    }
}

fn seq_iter<C, T>(value: &dyn Any) -> Vec<&dyn Any>
where
    C: 'static,
    T: 'static,
    for<'a> &'a C: IntoIterator<Item = &'a T>,
{
    downcast_ref::<C>(value)
        .into_iter()
        .map(|item| item as &dyn Any)
        .collect()
}

fn seq_collect<C, T>(items: Vec<DynValue>) -> Result<DynValue, CodecError>
where
    C: FromIterator<T> + 'static,
    T: 'static,
{
    let collected: C = items.into_iter().map(downcast::<T>).collect();
    Ok(Box::new(collected))
}

fn map_entries<M, K, V>(value: &dyn Any) -> Vec<(String, &dyn Any)>
where
    M: 'static,
    K: JsonKey,
    V: 'static,
    for<'a> &'a M: IntoIterator<Item = (&'a K, &'a V)>,
{
    downcast_ref::<M>(value)
        .into_iter()
        .map(|(key, item)| (key.to_key(), item as &dyn Any))
        .collect()
}

fn map_from_entries<M, K, V>(entries: Vec<(String, DynValue)>) -> Result<DynValue, CodecError>
where
    M: FromIterator<(K, V)> + 'static,
    K: JsonKey,
    V: 'static,
{
    let mut pairs = Vec::with_capacity(entries.len());
    for (key, value) in entries {
        pairs.push((K::from_key(&key)?, downcast::<V>(value)));
    }
    Ok(Box::new(pairs.into_iter().collect::<M>()))
}

/// Implements [`Reflected`] for a plain field struct.
///
/// ```
/// use jsonbind::reflect_struct;
///
/// #[derive(Debug, PartialEq)]
/// struct Point {
///     x: i64,
///     y: i64,
/// }
///
/// reflect_struct!(Point { x: i64, y: i64 });
/// ```
#[macro_export]
macro_rules! reflect_struct {
    ($ty:ident { $($field:ident: $fty:ty),* $(,)? }) => {
        impl $crate::Reflected for $ty {
            fn type_desc() -> $crate::TypeDesc {
                $crate::TypeDesc::simple::<$ty>(stringify!($ty))
            }

            fn type_info() -> $crate::TypeInfo {
                $crate::TypeInfo::aggregate::<$ty>()
                    $(.field::<$fty, _>(stringify!($field), |value: &$ty| &value.$field))*
                    .construct(|fields| $ty {
                        $($field: fields.take::<$fty>(stringify!($field))),*
                    })
            }
        }
    };
}

/// Implements [`Reflected`] for a C-like enum, represented by its variant
/// names.
#[macro_export]
macro_rules! reflect_enum {
    ($ty:ident { $($variant:ident),+ $(,)? }) => {
        impl $crate::Reflected for $ty {
            fn type_desc() -> $crate::TypeDesc {
                $crate::TypeDesc::simple::<$ty>(stringify!($ty))
            }

            fn type_info() -> $crate::TypeInfo {
                $crate::TypeInfo::enumeration::<$ty>(
                    |value| match value { $($ty::$variant => stringify!($variant)),+ },
                    |name| match name {
                        $(stringify!($variant) => Some($ty::$variant),)+
                        _ => None,
                    },
                )
            }
        }
    };
}

/// Implements [`Reflected`] for a closed variant set. Unit variants are
/// represented by their names, data variants by their payload with a type
/// witness.
///
/// ```ignore
/// reflect_union!(Event { Ping, Message(ChatMessage), Leave(LeaveNotice) });
/// ```
#[macro_export]
macro_rules! reflect_union {
    ($ty:ident { $($variants:tt)+ }) => {
        impl $crate::Reflected for $ty {
            fn type_desc() -> $crate::TypeDesc {
                $crate::TypeDesc::simple::<$ty>(stringify!($ty))
            }

            fn type_info() -> $crate::TypeInfo {
                $crate::__reflect_union_variants!(
                    $ty,
                    $crate::TypeInfo::union::<$ty>(),
                    $($variants)+
                )
                .finish()
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __reflect_union_variants {
    ($ty:ident, $builder:expr, $variant:ident ($payload:ty) $(, $($rest:tt)*)?) => {
        $crate::__reflect_union_variants!(
            $ty,
            $builder.data::<$payload, _, _>(
                |value| match value {
                    $ty::$variant(payload) => Some(payload),
                    _ => None,
                },
                $ty::$variant,
            ),
            $($($rest)*)?
        )
    };
    ($ty:ident, $builder:expr, $variant:ident $(, $($rest:tt)*)?) => {
        $crate::__reflect_union_variants!(
            $ty,
            $builder.unit(
                stringify!($variant),
                |value| matches!(value, $ty::$variant),
                || $ty::$variant,
            ),
            $($($rest)*)?
        )
    };
    ($ty:ident, $builder:expr $(,)?) => {
        $builder
    };
}
