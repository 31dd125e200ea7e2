//! Resolved per-field bindings.

use crate::model::registry::{BindingRegistry, CellExtractFn, PremapFn};
use crate::model::spec::{AssignFn, FetchFn, FieldSpec, RenderFn};
use crate::row::CellValue;
use crate::{Error, Result};
use std::any::Any;
use std::sync::Arc;

type ResolvedParseFn =
    dyn Fn(&str) -> std::result::Result<Option<Box<dyn Any>>, String> + Send + Sync;

/// One field's fully resolved binding: premap, parse, format, accessors, and
/// the optional typed-cell extractor.
///
/// Both functions are guaranteed resolved before the binding exists; an
/// unresolvable parser is a configuration fault raised by
/// [`FieldModel`](crate::FieldModel) construction.
pub struct AttributeBinding<T> {
    name: &'static str,
    kind: &'static str,
    assign: AssignFn<T>,
    fetch: FetchFn<T>,
    premap: Option<Arc<PremapFn>>,
    parse: Arc<ResolvedParseFn>,
    render: RenderFn,
    extract: Option<Arc<CellExtractFn>>,
}

impl<T: 'static> AttributeBinding<T> {
    pub(crate) fn resolve(
        spec: FieldSpec<T>,
        registry: &BindingRegistry,
        owner: &'static str,
    ) -> Result<Self> {
        let name = spec.name();
        let kind = spec.kind();

        let parse: Arc<ResolvedParseFn> =
            if let Some(parse) = registry.parser_for(name, spec.type_id()) {
                Arc::new(move |s: &str| parse(s).map(Some))
            } else if let Some(table) = &spec.literals {
                let lookup = Arc::clone(&table.parse);
                Arc::new(move |s: &str| Ok(lookup(s)))
            } else {
                return Err(Error::Configuration {
                    owner,
                    field: name,
                    kind,
                    role: "parser",
                });
            };

        let render = registry
            .formatter_for(name, spec.type_id())
            .unwrap_or_else(|| Arc::clone(&spec.fallback_render));

        let extract = registry.cell_extractor(spec.type_id());

        Ok(Self {
            name,
            kind,
            assign: spec.assign,
            fetch: spec.fetch,
            premap: registry.premap_for(name),
            parse,
            render,
            extract,
        })
    }

    /// Returns the bound field's name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the bound field's declared value kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        self.kind
    }

    /// Parses one raw value into the target's field.
    ///
    /// An empty raw string short-circuits to the absent value without
    /// invoking the premap or the parser, uniformly across kinds.
    pub(crate) fn fill(&self, target: &mut T, raw: &str) -> Result<()> {
        if raw.is_empty() {
            return (self.assign)(target, None);
        }
        let parsed = match &self.premap {
            Some(premap) => (self.parse)(&premap(raw)),
            None => (self.parse)(raw),
        };
        match parsed {
            Ok(value) => (self.assign)(target, value),
            Err(cause) => Err(Error::Data {
                field: self.name,
                value: raw.to_string(),
                cause,
            }),
        }
    }

    /// Assigns the explicit absent value.
    pub(crate) fn fill_absent(&self, target: &mut T) -> Result<()> {
        (self.assign)(target, None)
    }

    /// Fills from a typed cell: typed extraction first, falling back to the
    /// formatted cell text through the text pipeline.
    pub(crate) fn fill_cell(&self, target: &mut T, cell: &CellValue) -> Result<()> {
        if let Some(extract) = &self.extract {
            if let Some(value) = extract(cell) {
                return (self.assign)(target, Some(value));
            }
        }
        self.fill(target, &cell.formatted())
    }

    /// Formats the target's field; the absent value renders as empty text.
    pub(crate) fn render(&self, target: &T) -> String {
        (self.fetch)(target).map_or_else(String::new, |value| (self.render)(value.as_ref()))
    }
}
