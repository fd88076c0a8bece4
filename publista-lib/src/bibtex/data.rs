use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BibType {
    Article,
    Book,
    InCollection,
    InProceedings,
    Misc,
    Proceedings,
    TechReport,
    PhdThesis,
    MastersThesis,
    Unpublished,
}

impl BibType {
    pub const ALL: [BibType; 10] = [
        BibType::Article,
        BibType::Book,
        BibType::InCollection,
        BibType::InProceedings,
        BibType::Misc,
        BibType::Proceedings,
        BibType::TechReport,
        BibType::PhdThesis,
        BibType::MastersThesis,
        BibType::Unpublished,
    ];

    /// The lowercase name used after `@` in BibTeX sources.
    pub fn name(self) -> &'static str {
        match self {
            BibType::Article => "article",
            BibType::Book => "book",
            BibType::InCollection => "incollection",
            BibType::InProceedings => "inproceedings",
            BibType::Misc => "misc",
            BibType::Proceedings => "proceedings",
            BibType::TechReport => "techreport",
            BibType::PhdThesis => "phdthesis",
            BibType::MastersThesis => "mastersthesis",
            BibType::Unpublished => "unpublished",
        }
    }
}

impl fmt::Display for BibType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownBibType(pub String);

impl fmt::Display for UnknownBibType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown entry type '@{}'", self.0)
    }
}

impl FromStr for BibType {
    type Err = UnknownBibType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        if lower == "conference" {
            return Ok(BibType::InProceedings);
        }
        BibType::ALL
            .into_iter()
            .find(|t| t.name() == lower)
            .ok_or_else(|| UnknownBibType(s.to_string()))
    }
}

/// One parsed bibliography record. Field names are lowercase; values have
/// their outer delimiters stripped and line wrapping collapsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    key: String,
    itemtype: BibType,
    entries: BTreeMap<String, String>,
    position: Position,
}

impl Entry {
    pub fn new(
        key: impl Into<String>,
        itemtype: BibType,
        entries: BTreeMap<String, String>,
        position: Position,
    ) -> Self {
        Entry {
            key: key.into(),
            itemtype,
            entries,
            position,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn bibtype(&self) -> BibType {
        self.itemtype
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.entries
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.entries.get(field).map(String::as_str)
    }

    /// Like [`get`](Entry::get), but a value of only whitespace counts as absent.
    pub fn get_nonblank(&self, field: &str) -> Option<&str> {
        self.get(field).filter(|v| !v.trim().is_empty())
    }

    pub fn has(&self, field: &str) -> bool {
        self.get_nonblank(field).is_some()
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Publication year: leading digits of `year`, falling back to `date`.
    pub fn year(&self) -> Option<u32> {
        ["year", "date"].iter().find_map(|f| {
            let value = self.get_nonblank(f)?.trim();
            let digits: String = value.chars().take_while(char::is_ascii_digit).collect();
            digits.parse().ok()
        })
    }
}
