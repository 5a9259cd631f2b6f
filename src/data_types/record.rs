use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};

/// A raw data row as supplied by a Gantt series.
///
/// Every field is optional; missing pieces are treated as absent rather than
/// rejected.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub start: Option<f64>,
    #[serde(default)]
    pub end: Option<f64>,
    #[serde(default)]
    pub milestone: bool,
    #[serde(default)]
    pub collapsed: bool,
    #[serde(default)]
    pub name: Option<String>,
    /// Index of the series this record belongs to, used to offset rows shared by several series.
    #[serde(default)]
    pub series_index: usize,
}

impl Record {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    /// A record without an id. It can never be the parent of another record.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_range(mut self, start: f64, end: f64) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    pub fn with_start(mut self, start: f64) -> Self {
        self.start = Some(start);
        self
    }

    pub fn with_series_index(mut self, series_index: usize) -> Self {
        self.series_index = series_index;
        self
    }

    pub fn as_milestone(mut self) -> Self {
        self.milestone = true;
        self
    }

    pub fn as_collapsed(mut self) -> Self {
        self.collapsed = true;
        self
    }

    /// Row label: the explicit name, falling back to the empty string.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    /// Value the record contributes as the upper bound of its parent's range.
    pub fn effective_end(&self) -> Option<f64> {
        if self.milestone {
            self.start
        } else {
            self.end
        }
    }
}

/// Parses a JSON array of records.
pub fn records_from_json(json: &str) -> Result<Vec<Record>> {
    serde_json::from_str(json).wrap_err("failed to parse gantt records")
}
