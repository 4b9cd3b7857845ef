//! JSON records exchanged with the catalogue store.
//!
//! Records carry times as `"HH:MM"` strings and days as names; turning a
//! record into a [`ClassSection`] is where malformed data gets rejected.

use serde::{Deserialize, Serialize};
use std::{fs, io::ErrorKind, path::Path};

use crate::course::{Catalogue, ClassSection, Session};
use crate::error::{Error, Result};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub day: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SectionRecord {
    pub name: String,
    pub group: String,
    #[serde(alias = "schedule")]
    pub sessions: Vec<SessionRecord>,
}

impl SessionRecord {
    pub fn to_session(&self) -> Result<Session> {
        let location = self
            .location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string);
        Session::new(
            self.day.parse()?,
            self.start_time.parse()?,
            self.end_time.parse()?,
            location,
        )
    }
}

impl SectionRecord {
    pub fn to_section(&self) -> Result<ClassSection> {
        let sessions = self
            .sessions
            .iter()
            .map(SessionRecord::to_session)
            .collect::<Result<Vec<_>>>()
            .map_err(|e| {
                Error::InvalidInput(format!("section {} (group {}): {}", self.name, self.group, e))
            })?;
        ClassSection::new(&self.name, &self.group, sessions)
    }
}

impl From<&Session> for SessionRecord {
    fn from(session: &Session) -> Self {
        SessionRecord {
            day: session.day().to_string(),
            start_time: session.start().to_string(),
            end_time: session.end().to_string(),
            location: session.location().map(str::to_string),
        }
    }
}

impl From<&ClassSection> for SectionRecord {
    fn from(section: &ClassSection) -> Self {
        SectionRecord {
            name: section.name().to_string(),
            group: section.group().to_string(),
            sessions: section.sessions().iter().map(SessionRecord::from).collect(),
        }
    }
}

impl TryFrom<&SectionRecord> for ClassSection {
    type Error = Error;

    fn try_from(record: &SectionRecord) -> Result<Self> {
        record.to_section()
    }
}

/// Reads the stored records; a missing file is an empty store.
pub fn read_records<P: AsRef<Path>>(file_path: P) -> Result<Vec<SectionRecord>> {
    match fs::read_to_string(file_path.as_ref()) {
        Ok(content) => Ok(serde_json::from_str(&content)?),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

pub fn write_records<P: AsRef<Path>>(file_path: P, records: &[SectionRecord]) -> Result<()> {
    let content = serde_json::to_string_pretty(records)?;
    fs::write(file_path.as_ref(), content)?;
    Ok(())
}

/// Loads and validates a catalogue. Unlike [`read_records`], a missing file
/// is an error: there is nothing to schedule yet.
pub fn load_catalogue<P: AsRef<Path>>(file_path: P) -> Result<Catalogue> {
    let content = fs::read_to_string(file_path.as_ref())?;
    let records: Vec<SectionRecord> = serde_json::from_str(&content)?;
    let catalogue = records
        .iter()
        .map(SectionRecord::to_section)
        .collect::<Result<Catalogue>>()?;
    log::info!(
        "loaded {} sections from {}",
        catalogue.len(),
        file_path.as_ref().display()
    );
    Ok(catalogue)
}

pub fn save_catalogue<P: AsRef<Path>>(file_path: P, catalogue: &Catalogue) -> Result<()> {
    let records: Vec<SectionRecord> = catalogue.iter().map(SectionRecord::from).collect();
    write_records(file_path, &records)
}

/// Validates `record` and appends its normalized form to the store.
pub fn append_section<P: AsRef<Path>>(file_path: P, record: &SectionRecord) -> Result<ClassSection> {
    let section = record.to_section()?;
    let mut records = read_records(file_path.as_ref())?;
    records.push(SectionRecord::from(&section));
    write_records(file_path.as_ref(), &records)?;
    log::info!(
        "saved {} (group {}) to {}",
        section.name(),
        section.group(),
        file_path.as_ref().display()
    );
    Ok(section)
}
