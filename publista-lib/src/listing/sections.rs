use regex::Regex;

use crate::bibtex::{BibType, Entry};
use crate::config::Config;
use crate::error::{Error, Result};

pub const OTHER_ID: &str = "other";

#[derive(Debug, Clone)]
pub struct Section {
    pub id: String,
    pub title: String,
    types: Vec<BibType>,
    note: Option<Regex>,
}

impl Section {
    fn accepts(&self, entry: &Entry) -> bool {
        let type_ok = self.types.is_empty() || self.types.contains(&entry.bibtype());
        let note_ok = match &self.note {
            Some(re) => entry.get_nonblank("note").is_some_and(|n| re.is_match(n)),
            None => true,
        };
        type_ok && note_ok
    }
}

/// Headings of the assembled page, in display order.
#[derive(Debug, Clone)]
pub struct Sections {
    sections: Vec<Section>,
    other: Section,
}

impl Sections {
    pub fn from_config(config: &Config) -> Result<Sections> {
        let sections = config
            .sections
            .iter()
            .map(|s| -> Result<Section> {
                let types = s
                    .types
                    .iter()
                    .map(|t| t.parse::<BibType>())
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(|e| Error::InvalidConfig {
                        message: format!("section '{}': {e}", s.id),
                    })?;
                let note = s
                    .note_pattern
                    .as_deref()
                    .map(Regex::new)
                    .transpose()
                    .map_err(|e| Error::InvalidConfig {
                        message: format!("section '{}': {e}", s.id),
                    })?;
                Ok(Section {
                    id: s.id.clone(),
                    title: s.title.clone(),
                    types,
                    note,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Sections {
            sections,
            other: Section {
                id: OTHER_ID.to_string(),
                title: "Other".to_string(),
                types: Vec::new(),
                note: None,
            },
        })
    }

    /// Sections with a note pattern are tried first, then the plain ones in
    /// order; entries matching nothing land in "Other".
    pub fn classify(&self, entry: &Entry) -> &Section {
        let patterned = self.sections.iter().filter(|s| s.note.is_some());
        let plain = self.sections.iter().filter(|s| s.note.is_none());
        patterned
            .chain(plain)
            .find(|s| s.accepts(entry))
            .unwrap_or(&self.other)
    }

    /// Display order, "Other" last.
    pub fn iter(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter().chain(std::iter::once(&self.other))
    }
}
