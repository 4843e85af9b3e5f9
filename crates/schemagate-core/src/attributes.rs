//! Attribute sets and pending change sets.

use std::collections::HashMap;

use serde_json::{Map, Value};

/// Committed key-value state of a model.
pub type AttributeSet = Map<String, Value>;

/// One pending entry of a change set.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// Write a new value. `null` is a value, not a removal.
    Set(Value),
    /// Drop the attribute.
    Remove,
}

/// The changes requested by a single mutation.
///
/// Entries keep insertion order; a later entry for the same name replaces the
/// earlier one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    entries: Vec<(String, Change)>,
    /// Position of each name in `entries`.
    index: HashMap<String, usize>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// A change set removing every given name.
    pub fn removing<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names
            .into_iter()
            .fold(Self::new(), |changes, name| changes.remove(name))
    }

    /// Add a write of `value` to `name`.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name.into(), Change::Set(value.into()));
        self
    }

    /// Add a removal of `name`.
    pub fn remove(mut self, name: impl Into<String>) -> Self {
        self.insert(name.into(), Change::Remove);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Change)> {
        self.entries
            .iter()
            .map(|(name, change)| (name.as_str(), change))
    }

    /// Compute the candidate state: a copy of `current` with every write
    /// applied and every removed name deleted. No other key is touched.
    pub fn overlay(&self, current: &AttributeSet) -> AttributeSet {
        let mut candidate = current.clone();
        for (name, change) in &self.entries {
            match change {
                Change::Set(value) => {
                    candidate.insert(name.clone(), value.clone());
                }
                Change::Remove => {
                    candidate.remove(name);
                }
            }
        }
        candidate
    }

    fn insert(&mut self, name: String, change: Change) {
        match self.index.get(&name) {
            Some(&position) => self.entries[position].1 = change,
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, change));
            }
        }
    }
}

impl From<AttributeSet> for ChangeSet {
    fn from(attributes: AttributeSet) -> Self {
        // Map keys are already unique, so entries can be pushed directly.
        let mut changes = Self {
            entries: Vec::with_capacity(attributes.len()),
            index: HashMap::with_capacity(attributes.len()),
        };
        for (name, value) in attributes {
            changes.index.insert(name.clone(), changes.entries.len());
            changes.entries.push((name, Change::Set(value)));
        }
        changes
    }
}

impl<S: Into<String>> FromIterator<(S, Change)> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = (S, Change)>>(iter: I) -> Self {
        let mut changes = Self::new();
        for (name, change) in iter {
            changes.insert(name.into(), change);
        }
        changes
    }
}
