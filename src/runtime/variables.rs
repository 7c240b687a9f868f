use std::collections::BTreeMap;

use crate::parser::{Variable, VARIABLE_COUNT};
use crate::runtime::Value;

/// Variable store: one slot per letter `A`-`Z`
///
/// There is a single namespace per run. CALL writes its arguments straight
/// into this store, so procedures and the main program see the same slots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Variables {
    slots: [Option<Value>; VARIABLE_COUNT],
}

impl Variables {
    /// Creates a store with every slot empty
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the value of a variable, `None` if never assigned
    pub fn get(&self, variable: Variable) -> Option<&Value> {
        self.slots[variable.index()].as_ref()
    }

    /// Gets a variable's integer value, `None` if unset or not an integer
    pub fn int(&self, variable: Variable) -> Option<i64> {
        self.get(variable).and_then(Value::as_int)
    }

    /// Sets a variable, overwriting any prior value
    pub fn set(&mut self, variable: Variable, value: impl Into<Value>) {
        self.slots[variable.index()] = Some(value.into());
    }

    /// Checks if a variable has been assigned
    pub fn exists(&self, variable: Variable) -> bool {
        self.slots[variable.index()].is_some()
    }

    /// Returns a snapshot of all assigned variables keyed by letter
    pub fn snapshot(&self) -> BTreeMap<char, Value> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                let variable = Variable::new(index)?;
                slot.clone().map(|value| (variable.letter(), value))
            })
            .collect()
    }
}
