//! Stable name-to-index mapping for the variables of one analyzed formula.

use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::FormulaError;
use crate::formula::Formula;
use crate::kind::VariableKind;

/// Dense, zero-based variable index.
pub type VariableIndex = usize;

/// Variables in first-encounter order. Indices are assigned monotonically and
/// never reused; the registry only grows, except when a failed translation is
/// undone with [`VariableRegistry::truncate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableRegistry {
    variables: IndexMap<String, VariableKind>,
}

impl VariableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry from every variable occurring in `formula`.
    pub fn from_formula(formula: &Formula) -> Result<Self, FormulaError> {
        let mut registry = Self::new();
        for (name, kind) in formula.variable_occurrences() {
            registry.register(name, kind)?;
        }
        Ok(registry)
    }

    /// Register `name`, returning its index. Registering an existing name with
    /// the same kind returns the existing index.
    pub fn register(&mut self, name: &str, kind: VariableKind) -> Result<VariableIndex, FormulaError> {
        match self.variables.entry(name.to_string()) {
            Entry::Occupied(entry) => {
                if *entry.get() != kind {
                    return Err(FormulaError::KindConflict {
                        name: name.to_string(),
                        existing: *entry.get(),
                        requested: kind,
                    });
                }
                Ok(entry.index())
            }
            Entry::Vacant(entry) => {
                let index = entry.index();
                entry.insert(kind);
                Ok(index)
            }
        }
    }

    pub fn get_index(&self, name: &str) -> Option<VariableIndex> {
        self.variables.get_index_of(name)
    }

    pub fn index_of(&self, name: &str) -> Result<VariableIndex, FormulaError> {
        self.get_index(name)
            .ok_or_else(|| FormulaError::UnknownVariable(name.to_string()))
    }

    pub fn kind_of(&self, index: VariableIndex) -> Result<VariableKind, FormulaError> {
        self.variables
            .get_index(index)
            .map(|(_, kind)| *kind)
            .ok_or(FormulaError::IndexOutOfRange {
                index,
                count: self.count(),
            })
    }

    pub fn name_of(&self, index: VariableIndex) -> Result<&str, FormulaError> {
        self.variables
            .get_index(index)
            .map(|(name, _)| name.as_str())
            .ok_or(FormulaError::IndexOutOfRange {
                index,
                count: self.count(),
            })
    }

    /// Forget every variable registered after the first `count`.
    pub fn truncate(&mut self, count: usize) {
        self.variables.truncate(count);
    }

    pub fn count(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (VariableIndex, &str, VariableKind)> {
        self.variables
            .iter()
            .enumerate()
            .map(|(index, (name, kind))| (index, name.as_str(), *kind))
    }
}
