//! Partial variable assignments used as solver assumptions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::FormulaError;
use crate::registry::VariableIndex;
use crate::value::Value;

/// What happens when an index that already holds a value is assigned a
/// different one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// The later value replaces the earlier one.
    #[default]
    LastWriteWins,
    /// The later value is refused with [`FormulaError::AssumptionConflict`].
    Reject,
}

/// At most one value per variable index, iterated in index order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    values: BTreeMap<VariableIndex, Value>,
    #[serde(default)]
    policy: ConflictPolicy,
}

impl Assignment {
    pub fn new(policy: ConflictPolicy) -> Self {
        Self {
            values: BTreeMap::new(),
            policy,
        }
    }

    pub fn policy(&self) -> ConflictPolicy {
        self.policy
    }

    /// Assign `value` to `index`. Returns the value it replaced, if any.
    /// Re-assigning the same value is a no-op under either policy.
    pub fn assign(&mut self, index: VariableIndex, value: Value) -> Result<Option<Value>, FormulaError> {
        match self.values.get(&index) {
            Some(existing) if *existing == value => Ok(None),
            Some(existing) if self.policy == ConflictPolicy::Reject => {
                Err(FormulaError::AssumptionConflict {
                    index,
                    existing: existing.clone(),
                    requested: value,
                })
            }
            _ => Ok(self.values.insert(index, value)),
        }
    }

    pub fn get(&self, index: VariableIndex) -> Option<&Value> {
        self.values.get(&index)
    }

    pub fn remove(&mut self, index: VariableIndex) -> Option<Value> {
        self.values.remove(&index)
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (VariableIndex, &Value)> {
        self.values.iter().map(|(index, value)| (*index, value))
    }
}
