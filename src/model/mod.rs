//! The field-binding model.
//!
//! A [`FieldModel`] is the one table that drives both directions of a type's
//! record binding: its ordered [`AttributeBinding`]s are shared by
//! [`RecordConverter`](crate::RecordConverter) and
//! [`RecordFormatter`](crate::RecordFormatter), so position `i` always means
//! the same field whether a record is being read or written.
//!
//! Models are resolved once, eagerly, against a [`BindingRegistry`]; any
//! field kind without a parser aborts construction with a configuration
//! fault. No partially usable model is ever exposed.

mod binding;
mod policy;
mod registry;
mod spec;

pub use binding::AttributeBinding;
pub use policy::SelectionPolicy;
pub use registry::BindingRegistry;
pub use spec::{Bindable, EnumLiteral, FieldSpec};

use crate::Result;
use std::fmt;

/// Ordered set of resolved field bindings for one type.
///
/// Built once per (type, policy, registry) and immutable afterwards; wrap it
/// in an [`Arc`](std::sync::Arc) to share between a converter and a
/// formatter.
pub struct FieldModel<T> {
    owner: &'static str,
    bindings: Vec<AttributeBinding<T>>,
}

impl<T: Bindable> FieldModel<T> {
    /// Resolves the model for a [`Bindable`] type with every declared field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`](crate::Error::Configuration) if any
    /// field kind has no resolvable parser.
    pub fn of(registry: &BindingRegistry) -> Result<Self> {
        Self::with_policy(registry, &SelectionPolicy::all())
    }

    /// Resolves the model with a selection policy applied to declared fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`](crate::Error::Configuration) if any
    /// surviving field kind has no resolvable parser.
    pub fn with_policy(registry: &BindingRegistry, policy: &SelectionPolicy) -> Result<Self> {
        Self::from_specs(registry, policy, T::field_specs())
    }
}

impl<T: 'static> FieldModel<T> {
    /// Resolves a model from explicitly supplied field descriptors: the
    /// builder-API path for types that do not implement [`Bindable`].
    ///
    /// Surviving specs keep their declaration order. An empty result is a
    /// legal degenerate model.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`](crate::Error::Configuration) if any
    /// surviving field kind has no resolvable parser.
    pub fn from_specs(
        registry: &BindingRegistry,
        policy: &SelectionPolicy,
        specs: Vec<FieldSpec<T>>,
    ) -> Result<Self> {
        let owner = std::any::type_name::<T>();
        let bindings = specs
            .into_iter()
            .filter(|spec| policy.selects(spec.name()))
            .map(|spec| AttributeBinding::resolve(spec, registry, owner))
            .collect::<Result<Vec<_>>>()?;
        tracing::debug!(owner, fields = bindings.len(), "resolved field model");
        Ok(Self { owner, bindings })
    }

    /// Returns the owning type's name, as used in fault messages.
    #[must_use]
    pub const fn owner(&self) -> &'static str {
        self.owner
    }

    /// Returns the number of bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns whether the model is the degenerate empty model.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Returns the binding names, in binding order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.bindings.iter().map(AttributeBinding::name).collect()
    }

    pub(crate) fn bindings(&self) -> &[AttributeBinding<T>] {
        &self.bindings
    }
}

impl<T> fmt::Debug for FieldModel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldModel")
            .field("owner", &self.owner)
            .field("fields", &self.bindings.len())
            .finish()
    }
}
