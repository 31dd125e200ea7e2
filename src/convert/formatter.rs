//! Typed records → positional values.

use crate::model::FieldModel;
use std::sync::Arc;

/// Formats typed records back into positional string values, mirroring the
/// converter derived from the same [`FieldModel`].
///
/// Absent fields format to empty text. Header lines and output-file markers
/// belong to the write session, not here.
pub struct RecordFormatter<T> {
    model: Arc<FieldModel<T>>,
    sep: String,
}

impl<T: 'static> RecordFormatter<T> {
    /// Creates a formatter over the model with the given separator.
    pub fn new(model: Arc<FieldModel<T>>, sep: impl Into<String>) -> Self {
        Self {
            model,
            sep: sep.into(),
        }
    }

    /// Returns the shared field model.
    #[must_use]
    pub const fn model(&self) -> &Arc<FieldModel<T>> {
        &self.model
    }

    /// Formats each bound field, in binding order.
    #[must_use]
    pub fn values(&self, record: &T) -> Vec<String> {
        self.model
            .bindings()
            .iter()
            .map(|binding| binding.render(record))
            .collect()
    }

    /// Formats the record as one joined line.
    #[must_use]
    pub fn format(&self, record: &T) -> String {
        self.values(record).join(&self.sep)
    }

    /// Joins the binding names into a header line.
    #[must_use]
    pub fn header(&self) -> String {
        self.model.names().join(&self.sep)
    }
}

impl<T> Clone for RecordFormatter<T> {
    fn clone(&self) -> Self {
        Self {
            model: Arc::clone(&self.model),
            sep: self.sep.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::RecordConverter;
    use crate::model::{BindingRegistry, FieldModel, SelectionPolicy};
    use crate::{bindable, enum_literals};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Grade {
        A,
        B,
    }
    enum_literals!(Grade { A, B });

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Row {
        name: Option<String>,
        count: Option<i64>,
        grade: Option<Grade>,
    }
    bindable!(Row { name: String, count: i64, grade: enum Grade });

    fn model(registry: &BindingRegistry) -> Arc<FieldModel<Row>> {
        Arc::new(FieldModel::<Row>::of(registry).unwrap())
    }

    #[test]
    fn formats_in_binding_order() {
        let registry = BindingRegistry::new();
        let formatter = RecordFormatter::new(model(&registry), ",");
        let row = Row {
            name: Some("ada".to_string()),
            count: Some(7),
            grade: Some(Grade::B),
        };
        assert_eq!(formatter.values(&row), vec!["ada", "7", "B"]);
        assert_eq!(formatter.format(&row), "ada,7,B");
    }

    #[test]
    fn absent_fields_format_to_empty_text() {
        let registry = BindingRegistry::new();
        let formatter = RecordFormatter::new(model(&registry), ",");
        assert_eq!(formatter.format(&Row::default()), ",,");
    }

    #[test]
    fn header_joins_binding_names() {
        let registry = BindingRegistry::new();
        let formatter = RecordFormatter::new(model(&registry), ";");
        assert_eq!(formatter.header(), "name;count;grade");
    }

    #[test]
    fn formatter_override_applies_to_its_kind() {
        let registry = BindingRegistry::new().with_formatter(|v: &i64| format!("{v:03}"));
        let formatter = RecordFormatter::new(model(&registry), ",");
        let row = Row {
            count: Some(7),
            ..Row::default()
        };
        assert_eq!(formatter.format(&row), ",007,");
    }

    #[test]
    fn scoped_formatter_respects_the_policy() {
        let registry = BindingRegistry::new().with_formatter_for(
            SelectionPolicy::all().with_use(["count"]),
            |v: &i64| format!("<{v}>"),
        );
        let formatter = RecordFormatter::new(model(&registry), ",");
        let row = Row {
            name: Some("x".to_string()),
            count: Some(1),
            grade: None,
        };
        assert_eq!(formatter.format(&row), "x,<1>,");
    }

    #[test]
    fn converter_and_formatter_round_trip_well_formed_lines() {
        let registry = BindingRegistry::new();
        let shared = model(&registry);
        let converter = RecordConverter::new(Arc::clone(&shared), ",");
        let formatter = RecordFormatter::new(shared, ",");
        for line in ["ada,7,B", "ada,,", ",,", "x,-3,A"] {
            let parsed = converter.parse_line(line).unwrap();
            assert_eq!(formatter.format(&parsed), line);
        }
    }
}
