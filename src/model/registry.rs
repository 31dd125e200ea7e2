//! The binding registry: parse/format resolution tables.
//!
//! A [`BindingRegistry`] is the explicit context object every model is
//! resolved against. It owns the built-in parser/formatter tables for the
//! fixed primitive kinds and any caller-registered overrides, and is
//! constructed once during startup; there is no process-wide mutable state.
//!
//! Overrides are registered explicitly, per value kind, optionally scoped to
//! a subset of fields through a [`SelectionPolicy`]:
//!
//! ```rust,ignore
//! let registry = BindingRegistry::new()
//!     .with_parser(|s| u16::from_str_radix(s, 16).map_err(|e| e.to_string()))
//!     .with_premap(SelectionPolicy::all().with_use(["name"]), |s| s.trim().to_string());
//! ```

use crate::model::policy::SelectionPolicy;
use crate::row::CellValue;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub(crate) type ParseFn = dyn Fn(&str) -> std::result::Result<Box<dyn Any>, String> + Send + Sync;
pub(crate) type FormatFn = dyn Fn(&dyn Any) -> String + Send + Sync;
pub(crate) type PremapFn = dyn Fn(&str) -> String + Send + Sync;
pub(crate) type CellExtractFn = dyn Fn(&CellValue) -> Option<Box<dyn Any>> + Send + Sync;

/// Parse/format resolution tables for field bindings.
///
/// Holds built-ins for the fixed primitive set (`String`, `char`, `bool`,
/// `i32`, `i64`, `f64`) plus explicitly registered overrides. Read-only after
/// construction; share it freely across models and streams.
pub struct BindingRegistry {
    parsers: HashMap<TypeId, Arc<ParseFn>>,
    formatters: HashMap<TypeId, Arc<FormatFn>>,
    scoped_parsers: Vec<(SelectionPolicy, TypeId, Arc<ParseFn>)>,
    scoped_formatters: Vec<(SelectionPolicy, TypeId, Arc<FormatFn>)>,
    premaps: Vec<(SelectionPolicy, Arc<PremapFn>)>,
    cell_extractors: HashMap<TypeId, Arc<CellExtractFn>>,
}

impl BindingRegistry {
    /// Creates a registry with the built-in tables installed.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // numeric cells narrow like the formatted source did
    pub fn new() -> Self {
        let mut registry = Self {
            parsers: HashMap::new(),
            formatters: HashMap::new(),
            scoped_parsers: Vec::new(),
            scoped_formatters: Vec::new(),
            premaps: Vec::new(),
            cell_extractors: HashMap::new(),
        };

        registry.insert_parser(|s| Ok(s.to_string()));
        registry.insert_parser(|s| s.chars().next().ok_or_else(|| "empty input".to_string()));
        registry.insert_parser(|s| s.parse::<bool>().map_err(|e| e.to_string()));
        registry.insert_parser(|s| s.parse::<i32>().map_err(|e| e.to_string()));
        registry.insert_parser(|s| s.parse::<i64>().map_err(|e| e.to_string()));
        registry.insert_parser(|s| s.parse::<f64>().map_err(|e| e.to_string()));

        registry.insert_formatter(|v: &String| v.clone());
        registry.insert_formatter(char::to_string);
        registry.insert_formatter(bool::to_string);
        registry.insert_formatter(i32::to_string);
        registry.insert_formatter(i64::to_string);
        registry.insert_formatter(f64::to_string);

        registry.insert_cell_extractor(|cell| match cell {
            CellValue::Text(s) => Some(s.clone()),
            CellValue::Number(_) | CellValue::Bool(_) => None,
        });
        registry.insert_cell_extractor(|cell| match cell {
            CellValue::Bool(b) => Some(*b),
            _ => None,
        });
        registry.insert_cell_extractor(|cell| match cell {
            CellValue::Number(n) => Some(*n as i32),
            _ => None,
        });
        registry.insert_cell_extractor(|cell| match cell {
            CellValue::Number(n) => Some(*n as i64),
            _ => None,
        });
        registry.insert_cell_extractor(|cell| match cell {
            CellValue::Number(n) => Some(*n),
            _ => None,
        });

        registry
    }

    /// Registers a parser for the value kind `V`, replacing any built-in.
    #[must_use]
    pub fn with_parser<V: 'static>(
        mut self,
        parse: impl Fn(&str) -> std::result::Result<V, String> + Send + Sync + 'static,
    ) -> Self {
        self.insert_parser(parse);
        self
    }

    /// Registers a parser for `V` scoped to fields the policy selects.
    ///
    /// Scoped registrations win over global ones; among scoped registrations
    /// the most recent match wins.
    #[must_use]
    pub fn with_parser_for<V: 'static>(
        mut self,
        policy: SelectionPolicy,
        parse: impl Fn(&str) -> std::result::Result<V, String> + Send + Sync + 'static,
    ) -> Self {
        self.scoped_parsers
            .push((policy, TypeId::of::<V>(), erase_parser(parse)));
        self
    }

    /// Registers a formatter for the value kind `V`, replacing any built-in.
    #[must_use]
    pub fn with_formatter<V: 'static>(
        mut self,
        format: impl Fn(&V) -> String + Send + Sync + 'static,
    ) -> Self {
        self.insert_formatter(format);
        self
    }

    /// Registers a formatter for `V` scoped to fields the policy selects.
    #[must_use]
    pub fn with_formatter_for<V: 'static>(
        mut self,
        policy: SelectionPolicy,
        format: impl Fn(&V) -> String + Send + Sync + 'static,
    ) -> Self {
        self.scoped_formatters
            .push((policy, TypeId::of::<V>(), erase_formatter(format)));
        self
    }

    /// Registers a string pre-mapper composed before parsing, for fields the
    /// policy selects. The most recent matching premap wins.
    #[must_use]
    pub fn with_premap(
        mut self,
        policy: SelectionPolicy,
        map: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Self {
        self.premaps.push((policy, Arc::new(map)));
        self
    }

    /// Registers a typed-cell extractor for the value kind `V`.
    ///
    /// Returning `None` falls back to parsing the cell's formatted text.
    #[must_use]
    pub fn with_cell_extractor<V: 'static>(
        mut self,
        extract: impl Fn(&CellValue) -> Option<V> + Send + Sync + 'static,
    ) -> Self {
        self.insert_cell_extractor(extract);
        self
    }

    pub(crate) fn parser_for(&self, field: &str, kind: TypeId) -> Option<Arc<ParseFn>> {
        self.scoped_parsers
            .iter()
            .rev()
            .find(|(policy, id, _)| *id == kind && policy.selects(field))
            .map(|(_, _, parse)| Arc::clone(parse))
            .or_else(|| self.parsers.get(&kind).map(Arc::clone))
    }

    pub(crate) fn formatter_for(&self, field: &str, kind: TypeId) -> Option<Arc<FormatFn>> {
        self.scoped_formatters
            .iter()
            .rev()
            .find(|(policy, id, _)| *id == kind && policy.selects(field))
            .map(|(_, _, format)| Arc::clone(format))
            .or_else(|| self.formatters.get(&kind).map(Arc::clone))
    }

    pub(crate) fn premap_for(&self, field: &str) -> Option<Arc<PremapFn>> {
        self.premaps
            .iter()
            .rev()
            .find(|(policy, _)| policy.selects(field))
            .map(|(_, map)| Arc::clone(map))
    }

    pub(crate) fn cell_extractor(&self, kind: TypeId) -> Option<Arc<CellExtractFn>> {
        self.cell_extractors.get(&kind).map(Arc::clone)
    }

    fn insert_parser<V: 'static>(
        &mut self,
        parse: impl Fn(&str) -> std::result::Result<V, String> + Send + Sync + 'static,
    ) {
        self.parsers.insert(TypeId::of::<V>(), erase_parser(parse));
    }

    fn insert_formatter<V: 'static>(&mut self, format: impl Fn(&V) -> String + Send + Sync + 'static) {
        self.formatters
            .insert(TypeId::of::<V>(), erase_formatter(format));
    }

    fn insert_cell_extractor<V: 'static>(
        &mut self,
        extract: impl Fn(&CellValue) -> Option<V> + Send + Sync + 'static,
    ) {
        self.cell_extractors.insert(
            TypeId::of::<V>(),
            Arc::new(move |cell: &CellValue| {
                extract(cell).map(|v| Box::new(v) as Box<dyn Any>)
            }),
        );
    }
}

fn erase_parser<V: 'static>(
    parse: impl Fn(&str) -> std::result::Result<V, String> + Send + Sync + 'static,
) -> Arc<ParseFn> {
    Arc::new(move |s: &str| parse(s).map(|v| Box::new(v) as Box<dyn Any>))
}

fn erase_formatter<V: 'static>(
    format: impl Fn(&V) -> String + Send + Sync + 'static,
) -> Arc<FormatFn> {
    Arc::new(move |value: &dyn Any| value.downcast_ref::<V>().map(&format).unwrap_or_default())
}

impl Default for BindingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BindingRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingRegistry")
            .field("parsers", &self.parsers.len())
            .field("formatters", &self.formatters.len())
            .field("scoped_parsers", &self.scoped_parsers.len())
            .field("scoped_formatters", &self.scoped_formatters.len())
            .field("premaps", &self.premaps.len())
            .field("cell_extractors", &self.cell_extractors.len())
            .finish()
    }
}
