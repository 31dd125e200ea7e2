//! Column-order overrides.

use crate::{Error, Result};

/// Mapping from declared-binding index to source value index.
///
/// Replaces the default identity fill mapping of a converter. Built from
/// explicit zero-based indices, spreadsheet letter codes, or a header-name
/// lookup against a parsed header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnOrder {
    slots: Vec<usize>,
}

impl ColumnOrder {
    /// Creates an order from explicit zero-based source indices.
    #[must_use]
    pub const fn new(slots: Vec<usize>) -> Self {
        Self { slots }
    }

    /// Creates an order from comma-separated spreadsheet letter codes
    /// (`"A,C,BB"`). One-letter codes map to `0..=25`; two-letter codes to
    /// `(first + 1) * 26 + second`. An empty string yields an empty order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Lookup`] naming the first malformed code.
    pub fn from_letters(codes: &str) -> Result<Self> {
        if codes.trim().is_empty() {
            return Ok(Self::new(Vec::new()));
        }
        let mut slots = Vec::new();
        for raw in codes.split(',') {
            let code = raw.trim();
            slots.push(letter_slot(code)?);
        }
        Ok(Self::new(slots))
    }

    /// Resolves each required binding name against a separator-split header
    /// line by exact match.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Lookup`] carrying the first name with no match.
    pub fn from_header(header: &str, sep: &str, names: &[&str]) -> Result<Self> {
        let tokens: Vec<&str> = header.split(sep).collect();
        let mut slots = Vec::with_capacity(names.len());
        for name in names {
            match tokens.iter().position(|token| token == name) {
                Some(index) => slots.push(index),
                None => {
                    return Err(Error::Lookup {
                        name: (*name).to_string(),
                        context: format!("header '{header}'"),
                    });
                }
            }
        }
        Ok(Self::new(slots))
    }

    /// Returns the source index for each declared-binding index.
    #[must_use]
    pub fn slots(&self) -> &[usize] {
        &self.slots
    }

    /// Returns the number of mapped bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns whether the order maps no bindings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

fn letter_slot(code: &str) -> Result<usize> {
    let letters: Vec<char> = code.chars().collect();
    let valid = matches!(letters.len(), 1 | 2) && letters.iter().all(char::is_ascii_uppercase);
    if !valid {
        return Err(Error::Lookup {
            name: code.to_string(),
            context: "column letter codes".to_string(),
        });
    }
    let first = letters[0] as usize - 'A' as usize;
    Ok(match letters.get(1) {
        Some(second) => (first + 1) * 26 + (*second as usize - 'A' as usize),
        None => first,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_letters_map_to_their_offset() {
        let order = ColumnOrder::from_letters("A,C,Z").unwrap();
        assert_eq!(order.slots(), &[0, 2, 25]);
    }

    #[test]
    fn double_letters_continue_past_z() {
        let order = ColumnOrder::from_letters("AA,AB,BA").unwrap();
        assert_eq!(order.slots(), &[26, 27, 52]);
    }

    #[test]
    fn codes_tolerate_surrounding_whitespace() {
        let order = ColumnOrder::from_letters(" B , D ").unwrap();
        assert_eq!(order.slots(), &[1, 3]);
    }

    #[test]
    fn empty_input_yields_an_empty_order() {
        assert!(ColumnOrder::from_letters("").unwrap().is_empty());
    }

    #[test]
    fn malformed_code_is_a_lookup_fault() {
        let err = ColumnOrder::from_letters("A,4x").unwrap_err();
        assert!(err.to_string().contains("4x"));
    }

    #[test]
    fn header_lookup_maps_names_to_token_positions() {
        let order = ColumnOrder::from_header("b,a,c", ",", &["a", "b", "c"]).unwrap();
        assert_eq!(order.slots(), &[1, 0, 2]);
    }

    #[test]
    fn missing_header_name_is_a_lookup_fault() {
        let err = ColumnOrder::from_header("a,b,c", ",", &["a", "d"]).unwrap_err();
        let message = err.to_string();
        assert!(message.contains('d'), "{message}");
        assert!(message.contains("a,b,c"), "{message}");
    }
}
