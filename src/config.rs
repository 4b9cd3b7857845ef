//! Rendering configuration for timetable grids.
//!
//! Day columns and their labels are data, not logic: the enumerator only
//! knows [`Day`] values, and everything user-facing is looked up here.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::time::Day;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Day columns, in display order.
    #[serde(default = "default_days")]
    pub days: Vec<Day>,
    /// Column label keyed by English day name; days without an entry use
    /// that name.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default = "default_time_header")]
    pub time_header: String,
    #[serde(default = "default_group_prefix")]
    pub group_prefix: String,
}

fn default_days() -> Vec<Day> {
    Day::WEEKDAYS.to_vec()
}

fn default_time_header() -> String {
    "Time".to_string()
}

fn default_group_prefix() -> String {
    "Group".to_string()
}

impl Default for GridConfig {
    fn default() -> Self {
        GridConfig {
            days: default_days(),
            labels: BTreeMap::new(),
            time_header: default_time_header(),
            group_prefix: default_group_prefix(),
        }
    }
}

impl GridConfig {
    /// Every day of the week as a column.
    pub fn full_week() -> Self {
        GridConfig {
            days: Day::ALL.to_vec(),
            ..Default::default()
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: GridConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse grid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::Config(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn label(&self, day: Day) -> &str {
        self.labels
            .iter()
            .find(|(key, _)| key.parse::<Day>().ok() == Some(day))
            .map(|(_, label)| label.as_str())
            .unwrap_or_else(|| day.name())
    }

    /// Column headers must be unique and at least one day must be shown.
    pub fn validate(&self) -> Result<()> {
        if self.days.is_empty() {
            return Err(Error::Config("no day columns configured".to_string()));
        }
        for key in self.labels.keys() {
            key.parse::<Day>()
                .map_err(|e| Error::Config(format!("bad label key: {}", e)))?;
        }
        let mut headers = BTreeSet::new();
        headers.insert(self.time_header.as_str());
        for day in &self.days {
            if !headers.insert(self.label(*day)) {
                return Err(Error::Config(format!(
                    "duplicate column header {:?}",
                    self.label(*day)
                )));
            }
        }
        Ok(())
    }
}
