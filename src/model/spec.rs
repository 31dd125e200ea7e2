//! Statically declared field descriptors.
//!
//! Replaces runtime field introspection with an explicit per-type descriptor
//! table: each [`FieldSpec`] names a field and carries its typed get/set
//! accessors. Types usually implement [`Bindable`] through the [`bindable!`]
//! macro; the same descriptors can also be handed directly to
//! [`FieldModel::from_specs`](crate::FieldModel::from_specs) as a builder API.

use crate::{Error, Result};
use std::any::{Any, TypeId};
use std::fmt::Display;
use std::sync::Arc;

pub(crate) type AssignFn<T> = Arc<dyn Fn(&mut T, Option<Box<dyn Any>>) -> Result<()> + Send + Sync>;
pub(crate) type FetchFn<T> = Arc<dyn Fn(&T) -> Option<Box<dyn Any>> + Send + Sync>;
pub(crate) type LiteralParseFn = Arc<dyn Fn(&str) -> Option<Box<dyn Any>> + Send + Sync>;
pub(crate) type RenderFn = Arc<dyn Fn(&dyn Any) -> String + Send + Sync>;

/// Literal-based conversion for enumerated field kinds.
///
/// An unknown literal parses to `None` (the absent value) rather than
/// raising a data fault. This asymmetry with every other kind is deliberate
/// and relied upon by callers feeding partially dirty data.
pub trait EnumLiteral: Clone + Sized + 'static {
    /// Returns the variant named by `text`, or `None` for unknown literals.
    fn from_literal(text: &str) -> Option<Self>;

    /// Returns the textual literal for this variant.
    fn literal(&self) -> &'static str;
}

/// A type whose fields can be bound to positional records.
///
/// Usually implemented via the [`bindable!`] macro. Declaration order of the
/// returned specs is the stable field order used for both conversion and
/// formatting.
pub trait Bindable: Default + 'static {
    /// Returns the declared field descriptors, in declaration order.
    fn field_specs() -> Vec<FieldSpec<Self>>;
}

pub(crate) struct LiteralTable {
    pub(crate) parse: LiteralParseFn,
    pub(crate) render: RenderFn,
}

/// One field's statically declared descriptor: name, value kind, and typed
/// get/set accessors.
///
/// The parse and format functions are *not* part of the descriptor; they are
/// resolved later, against a [`BindingRegistry`](crate::BindingRegistry),
/// when a [`FieldModel`](crate::FieldModel) is constructed.
pub struct FieldSpec<T> {
    name: &'static str,
    kind: &'static str,
    type_id: TypeId,
    pub(crate) assign: AssignFn<T>,
    pub(crate) fetch: FetchFn<T>,
    pub(crate) fallback_render: RenderFn,
    pub(crate) literals: Option<LiteralTable>,
}

impl<T: 'static> FieldSpec<T> {
    /// Declares a field holding a plain value kind.
    ///
    /// The value kind's `Display` impl is captured as the universal to-text
    /// fallback used when no formatter is registered for the kind.
    pub fn new<V>(
        name: &'static str,
        set: impl Fn(&mut T, Option<V>) + Send + Sync + 'static,
        get: impl Fn(&T) -> Option<V> + Send + Sync + 'static,
    ) -> Self
    where
        V: Display + 'static,
    {
        Self {
            name,
            kind: std::any::type_name::<V>(),
            type_id: TypeId::of::<V>(),
            assign: assign_fn(name, set),
            fetch: fetch_fn(get),
            fallback_render: Arc::new(|value: &dyn Any| {
                value.downcast_ref::<V>().map(V::to_string).unwrap_or_default()
            }),
            literals: None,
        }
    }

    /// Declares a field holding an enumerated value kind.
    ///
    /// Parsing and formatting go through the [`EnumLiteral`] table unless a
    /// registry override is registered for the enum's own type.
    pub fn enumerated<V>(
        name: &'static str,
        set: impl Fn(&mut T, Option<V>) + Send + Sync + 'static,
        get: impl Fn(&T) -> Option<V> + Send + Sync + 'static,
    ) -> Self
    where
        V: EnumLiteral,
    {
        let render: RenderFn = Arc::new(|value: &dyn Any| {
            value
                .downcast_ref::<V>()
                .map(|v| v.literal().to_string())
                .unwrap_or_default()
        });
        Self {
            name,
            kind: std::any::type_name::<V>(),
            type_id: TypeId::of::<V>(),
            assign: assign_fn(name, set),
            fetch: fetch_fn(get),
            fallback_render: Arc::clone(&render),
            literals: Some(LiteralTable {
                parse: Arc::new(|text: &str| {
                    V::from_literal(text).map(|v| Box::new(v) as Box<dyn Any>)
                }),
                render,
            }),
        }
    }

    /// Returns the declared field name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the human-readable label of the declared value kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        self.kind
    }

    pub(crate) const fn type_id(&self) -> TypeId {
        self.type_id
    }
}

fn assign_fn<T, V: 'static>(
    name: &'static str,
    set: impl Fn(&mut T, Option<V>) + Send + Sync + 'static,
) -> AssignFn<T> {
    Arc::new(move |target: &mut T, value: Option<Box<dyn Any>>| {
        match value {
            None => set(target, None),
            Some(boxed) => match boxed.downcast::<V>() {
                Ok(v) => set(target, Some(*v)),
                Err(_) => {
                    return Err(Error::Data {
                        field: name,
                        value: "<parsed value>".to_string(),
                        cause: format!("parser produced a value that is not {}", std::any::type_name::<V>()),
                    });
                }
            },
        }
        Ok(())
    })
}

fn fetch_fn<T, V: 'static>(get: impl Fn(&T) -> Option<V> + Send + Sync + 'static) -> FetchFn<T> {
    Arc::new(move |target: &T| get(target).map(|v| Box::new(v) as Box<dyn Any>))
}

/// Implements [`Bindable`] for a struct whose bindable fields are `Option`s.
///
/// Field order in the macro invocation is the binding order. Enumerated
/// fields are marked with the `enum` keyword:
///
/// ```rust,ignore
/// #[derive(Debug, Default, Clone)]
/// struct Reading {
///     station: Option<String>,
///     level: Option<Level>,
///     value: Option<f64>,
/// }
/// linebind::bindable!(Reading { station: String, level: enum Level, value: f64 });
/// ```
#[macro_export]
macro_rules! bindable {
    (@field $ty:ident, $specs:ident,) => {};
    (@field $ty:ident, $specs:ident, $field:ident : enum $kind:ty $(, $($rest:tt)*)?) => {
        $specs.push($crate::model::FieldSpec::enumerated(
            stringify!($field),
            |t: &mut $ty, v: ::std::option::Option<$kind>| t.$field = v,
            |t: &$ty| t.$field.clone(),
        ));
        $crate::bindable!(@field $ty, $specs, $($($rest)*)?);
    };
    (@field $ty:ident, $specs:ident, $field:ident : $kind:ty $(, $($rest:tt)*)?) => {
        $specs.push($crate::model::FieldSpec::new(
            stringify!($field),
            |t: &mut $ty, v: ::std::option::Option<$kind>| t.$field = v,
            |t: &$ty| t.$field.clone(),
        ));
        $crate::bindable!(@field $ty, $specs, $($($rest)*)?);
    };
    ($ty:ident { $($body:tt)* }) => {
        impl $crate::model::Bindable for $ty {
            fn field_specs() -> ::std::vec::Vec<$crate::model::FieldSpec<Self>> {
                let mut specs = ::std::vec::Vec::new();
                $crate::bindable!(@field $ty, specs, $($body)*);
                specs
            }
        }
    };
}

/// Implements [`EnumLiteral`] for a fieldless enum, using variant names as
/// the wire literals.
///
/// ```rust,ignore
/// #[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// enum Level { Low, Mid, High }
/// linebind::enum_literals!(Level { Low, Mid, High });
/// ```
#[macro_export]
macro_rules! enum_literals {
    ($ty:ident { $($variant:ident),+ $(,)? }) => {
        impl $crate::model::EnumLiteral for $ty {
            fn from_literal(text: &str) -> ::std::option::Option<Self> {
                match text {
                    $(stringify!($variant) => ::std::option::Option::Some(Self::$variant),)+
                    _ => ::std::option::Option::None,
                }
            }

            fn literal(&self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant),)+
                }
            }
        }
    };
}
