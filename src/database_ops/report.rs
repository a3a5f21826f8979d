use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::errors::CatalogError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadAction {
    Created,
    Updated,
    Skipped,
}

impl fmt::Display for LoadAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            LoadAction::Created => "created",
            LoadAction::Updated => "updated",
            LoadAction::Skipped => "skipped",
        })
    }
}

/// Which loader produced a row of the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadStage {
    Bikes,
    Parts,
    DefaultParts,
}

impl fmt::Display for LoadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            LoadStage::Bikes => "bikes",
            LoadStage::Parts => "parts",
            LoadStage::DefaultParts => "default-parts",
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EntryOutcome {
    pub stage: LoadStage,
    pub index: usize,
    pub label: String,
    pub action: LoadAction,
}

/// A per-entry failure with the raw input it came from.
#[derive(Debug, Clone, Serialize)]
pub struct EntryError {
    pub stage: LoadStage,
    /// Position of the entry in its batch array.
    pub index: usize,
    /// Position of the component inside a bike entry, for component-level failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<usize>,
    pub entry: Value,
    pub kind: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadResult {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errors: Vec<EntryError>,
    pub outcomes: Vec<EntryOutcome>,
}

impl LoadResult {
    pub fn record(&mut self, stage: LoadStage, index: usize, label: String, action: LoadAction) {
        match action {
            LoadAction::Created => self.created += 1,
            LoadAction::Updated => self.updated += 1,
            LoadAction::Skipped => self.skipped += 1,
        }
        self.outcomes.push(EntryOutcome {
            stage,
            index,
            label,
            action,
        });
    }

    pub fn record_error(
        &mut self,
        stage: LoadStage,
        index: usize,
        component: Option<usize>,
        entry: Value,
        error: &CatalogError,
    ) {
        self.errors.push(EntryError {
            stage,
            index,
            component,
            entry,
            kind: error.kind(),
            message: error.to_string(),
        });
    }

    pub fn merge(&mut self, other: LoadResult) {
        self.created += other.created;
        self.updated += other.updated;
        self.skipped += other.skipped;
        self.errors.extend(other.errors);
        self.outcomes.extend(other.outcomes);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn processed(&self) -> usize {
        self.created + self.updated + self.skipped
    }
}
