//! Canonical category ordering
//!
//! Report payloads carry fuel-type codes in whatever order the upstream
//! service produced them. Every sheet renders categories in one fixed master
//! order, so lists and category-keyed mappings are re-projected through a
//! [`CategorySet`] before they reach the layout engine.
//!
//! ```rust
//! use std::collections::HashMap;
//! use fuelsheet_core::CategorySet;
//!
//! let set = CategorySet::fuel_types();
//! let order = set.canonicalize(&["DSL", "NL", "XYZ"]);
//! assert_eq!(order, vec!["NL", "DSL"]);
//!
//! let values = HashMap::from([("DSL".to_string(), 5.0)]);
//! assert_eq!(CategorySet::project(&values, &order), vec![0.0, 5.0]);
//! ```

use serde::{Deserialize, Serialize};

use crate::CategoryValues;

/// Fuel-type codes in the order every report renders them
pub const FUEL_TYPES: [&str; 4] = ["NL", "SNL", "DSL", "CDSL"];

/// Fixed, ordered set of category codes
///
/// Built once at startup (from configuration) and shared read-only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct CategorySet {
    codes: Vec<String>,
}

impl CategorySet {
    /// Create a set from codes; later duplicates are ignored.
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for code in codes {
            let code = code.into();
            if !unique.contains(&code) {
                unique.push(code);
            }
        }
        Self { codes: unique }
    }

    /// The standard fuel-type master list
    pub fn fuel_types() -> Self {
        Self::new(FUEL_TYPES)
    }

    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.codes.iter().any(|c| c == code)
    }

    /// Master-list codes present in `categories`, in master order.
    ///
    /// Unknown codes are dropped and duplicates collapse to one entry.
    pub fn canonicalize<S: AsRef<str>>(&self, categories: &[S]) -> Vec<String> {
        self.codes
            .iter()
            .filter(|code| categories.iter().any(|c| c.as_ref() == code.as_str()))
            .cloned()
            .collect()
    }

    /// Values of `mapping` in `order`, zero for absent keys.
    pub fn project<S: AsRef<str>>(mapping: &CategoryValues, order: &[S]) -> Vec<f64> {
        order
            .iter()
            .map(|code| mapping.get(code.as_ref()).copied().unwrap_or(0.0))
            .collect()
    }
}

impl Default for CategorySet {
    fn default() -> Self {
        Self::fuel_types()
    }
}

impl From<Vec<String>> for CategorySet {
    fn from(codes: Vec<String>) -> Self {
        Self::new(codes)
    }
}

impl From<CategorySet> for Vec<String> {
    fn from(set: CategorySet) -> Self {
        set.codes
    }
}
