//! Access to the solved model output via a key-value store of named arrays.
//!
//! The store backend (file reading, solver bindings) lives outside this crate; the
//! reporting pipeline only depends on the [`ArrayStore`] trait. Variable names differ
//! between model versions, so every read goes through the [`Resolver`], which tries an
//! ordered list of candidate names with first-match-wins semantics.
use crate::array::MultiDimArray;
use anyhow::{Context, Result, bail};
use indexmap::{IndexMap, IndexSet};
use log::warn;

/// A read-only store of named multidimensional arrays and label sets.
pub trait ArrayStore {
    /// Look up an array by its exact name.
    fn query(&self, name: &str) -> Option<MultiDimArray>;

    /// Look up a set of labels by its exact name (empty if absent).
    fn query_set(&self, name: &str) -> IndexSet<String>;
}

/// What to do when none of the candidate names of a query exists in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbsencePolicy {
    /// Return nothing, without a diagnostic
    Silent,
    /// Return nothing, but emit a warning
    Warning,
    /// Abort the pipeline (the default for required variables)
    Error,
}

/// An in-memory [`ArrayStore`], used by tests and embedding callers.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    arrays: IndexMap<String, MultiDimArray>,
    sets: IndexMap<String, IndexSet<String>>,
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an array under the given name, replacing any existing entry
    pub fn insert_array(&mut self, name: &str, array: MultiDimArray) {
        self.arrays.insert(name.to_string(), array);
    }

    /// Add a label set under the given name, replacing any existing entry
    pub fn insert_set<I: IntoIterator<Item = String>>(&mut self, name: &str, labels: I) {
        self.sets.insert(name.to_string(), labels.into_iter().collect());
    }
}

impl ArrayStore for InMemoryStore {
    fn query(&self, name: &str) -> Option<MultiDimArray> {
        self.arrays.get(name).cloned()
    }

    fn query_set(&self, name: &str) -> IndexSet<String> {
        self.sets.get(name).cloned().unwrap_or_default()
    }
}

/// Resolves raw variables from an [`ArrayStore`], restricted to the reporting-year grid.
pub struct Resolver<'a> {
    store: &'a dyn ArrayStore,
    reporting_years: Vec<u32>,
}

impl<'a> Resolver<'a> {
    /// Create a resolver over the given store and reporting-year grid.
    pub fn new(store: &'a dyn ArrayStore, reporting_years: &[u32]) -> Self {
        Self {
            store,
            reporting_years: reporting_years.to_vec(),
        }
    }

    /// Try each candidate name in order and return the first array found, restricted to
    /// the reporting years present in it.
    fn lookup(&self, candidates: &[&str]) -> Option<MultiDimArray> {
        candidates
            .iter()
            .find_map(|name| self.store.query(name))
            .map(|array| array.restrict_years(&self.reporting_years))
    }

    /// Resolve a variable under the given absence policy.
    ///
    /// Returns `Ok(None)` only under the `Silent` and `Warning` policies; under `Error`
    /// an absent variable fails the whole pipeline.
    pub fn resolve(
        &self,
        candidates: &[&str],
        policy: AbsencePolicy,
    ) -> Result<Option<MultiDimArray>> {
        match self.lookup(candidates) {
            Some(array) => Ok(Some(array)),
            None => match policy {
                AbsencePolicy::Silent => Ok(None),
                AbsencePolicy::Warning => {
                    warn!(
                        "None of the candidate variables [{}] present in the store",
                        candidates.join(", ")
                    );
                    Ok(None)
                }
                AbsencePolicy::Error => bail!(
                    "None of the candidate variables [{}] present in the store",
                    candidates.join(", ")
                ),
            },
        }
    }

    /// Resolve a required variable, failing if none of the candidates exists.
    pub fn required(&self, candidates: &[&str]) -> Result<MultiDimArray> {
        self.lookup(candidates).with_context(|| {
            format!(
                "None of the candidate variables [{}] present in the store",
                candidates.join(", ")
            )
        })
    }

    /// Resolve a required variable and extract one named sub-category of it.
    pub fn required_field(&self, candidates: &[&str], field: &str) -> Result<MultiDimArray> {
        let array = self.required(candidates)?;
        array.select(field).with_context(|| {
            format!(
                "Variable [{}] has no {field} sub-category",
                candidates.join(", ")
            )
        })
    }
}
