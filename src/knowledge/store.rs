//! In-memory fact store

use super::models::Fact;
use crate::error::{AssistantError, Result};
use indexmap::IndexMap;
use std::collections::HashSet;
use tracing::{debug, info};

/// Ordered, id-keyed collection of facts
///
/// Iteration follows insertion order, which is also the tie-break order
/// for retrieval.
#[derive(Debug, Clone, Default)]
pub struct FactStore {
    facts: IndexMap<String, Fact>,
}

impl FactStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from plain texts, assigning ids `id_0`, `id_1`, ...
    pub fn from_texts<I, S>(texts: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut store = Self::new();
        for (i, text) in texts.into_iter().enumerate() {
            store.insert(Fact::new(format!("id_{}", i), text)?)?;
        }

        debug!("Fact store built with {} facts", store.len());
        Ok(store)
    }

    /// Insert a fact, rejecting duplicate ids
    pub fn insert(&mut self, fact: Fact) -> Result<()> {
        if fact.text.trim().is_empty() {
            return Err(AssistantError::InvalidFact(format!(
                "Fact {} has empty text",
                fact.id
            )));
        }

        if self.facts.contains_key(&fact.id) {
            return Err(AssistantError::DuplicateFactId(fact.id));
        }

        self.facts.insert(fact.id.clone(), fact);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Fact> {
        self.facts.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Fact> {
        self.facts.values()
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// Drop facts whose normalized text repeats an earlier fact
    ///
    /// First occurrence wins; order of the survivors is unchanged.
    pub fn collapse_duplicates(self) -> Self {
        let before = self.facts.len();
        let mut seen = HashSet::new();

        let facts: IndexMap<String, Fact> = self
            .facts
            .into_iter()
            .filter(|(_, fact)| seen.insert(fact.content_hash()))
            .collect();

        if facts.len() < before {
            info!("Collapsed {} duplicate facts", before - facts.len());
        }

        Self { facts }
    }
}
