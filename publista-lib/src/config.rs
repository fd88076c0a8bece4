//! Run configuration, read from TOML. Every key is optional; the defaults
//! reproduce the stock publication page.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::Result;
use crate::listing::order::SortKey;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Author names (as written in the source) to underline in listings.
    pub highlight_authors: Vec<String>,
    /// Directory holding `<key><suffix>.pdf` attachments, also used as link prefix.
    pub attachment_dir: String,
    /// When set, every block links to `<bib_link_dir>/<key>.bib`.
    pub bib_link_dir: Option<String>,
    /// Placed between rendered blocks.
    pub separator: String,
    pub order: Vec<SortKey>,
    pub attachments: Vec<AttachmentKind>,
    /// Per-type overrides of the required fields, `"a|b"` meaning either.
    pub required: BTreeMap<String, Vec<String>>,
    pub sections: Vec<SectionConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttachmentKind {
    pub label: String,
    #[serde(default)]
    pub suffix: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SectionConfig {
    pub id: String,
    pub title: String,
    /// Entry types belonging here; empty means any type.
    #[serde(default)]
    pub types: Vec<String>,
    /// Regex matched against the `note` field.
    #[serde(default)]
    pub note_pattern: Option<String>,
}

impl AttachmentKind {
    fn new(label: &str, suffix: &str) -> Self {
        AttachmentKind {
            label: label.to_string(),
            suffix: suffix.to_string(),
        }
    }
}

impl SectionConfig {
    fn new(id: &str, title: &str, types: &[&str]) -> Self {
        SectionConfig {
            id: id.to_string(),
            title: title.to_string(),
            types: types.iter().map(|t| t.to_string()).collect(),
            note_pattern: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut shared_task = SectionConfig::new("sharedtask", "Shared Tasks", &[]);
        shared_task.note_pattern = Some(r"(?i)shared\s?task".to_string());

        Config {
            highlight_authors: Vec::new(),
            attachment_dir: "pdf".to_string(),
            bib_link_dir: None,
            separator: "\n".to_string(),
            order: vec![SortKey::YearDesc, SortKey::Surname, SortKey::Key],
            attachments: vec![
                AttachmentKind::new("abstract", "_abstract"),
                AttachmentKind::new("pdf", ""),
                AttachmentKind::new("slides", "_slides"),
                AttachmentKind::new("poster", "_poster"),
            ],
            required: BTreeMap::new(),
            sections: vec![
                SectionConfig::new("article", "Journal Articles", &["article"]),
                SectionConfig::new("book", "Edited Volumes", &["book"]),
                SectionConfig::new("proceedings", "Edited Conference Proceedings", &["proceedings"]),
                SectionConfig::new(
                    "inproceedings",
                    "Articles in Conference Proceedings",
                    &["inproceedings"],
                ),
                SectionConfig::new("incollection", "Articles in Collections", &["incollection"]),
                shared_task,
                SectionConfig::new("techreport", "Technical Reports", &["techreport"]),
                SectionConfig::new("thesis", "Theses", &["phdthesis", "mastersthesis"]),
                SectionConfig::new("misc", "Talks and Presentations", &["misc"]),
                SectionConfig::new("unpublished", "Unpublished", &["unpublished"]),
            ],
        }
    }
}

impl Config {
    pub fn from_toml(text: &str) -> Result<Config> {
        Ok(toml::from_str(text)?)
    }
}
