use std::collections::BTreeMap;
use std::fmt;

use crate::bibtex::{BibType, Entry};
use crate::config::Config;
use crate::error::{Error, Result};

/// A field that must be present, or a set of alternatives of which one must be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    alternatives: Vec<String>,
}

impl Requirement {
    /// `"author|editor"` accepts either field.
    pub fn parse(spec: &str) -> Result<Requirement> {
        let alternatives: Vec<String> = spec
            .split('|')
            .map(|f| f.trim().to_lowercase())
            .filter(|f| !f.is_empty())
            .collect();
        if alternatives.is_empty() {
            return Err(Error::InvalidConfig {
                message: format!("empty required field '{spec}'"),
            });
        }
        Ok(Requirement { alternatives })
    }

    pub fn is_met(&self, entry: &Entry) -> bool {
        self.alternatives.iter().any(|f| entry.has(f))
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.alternatives.join(" or "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    required: BTreeMap<BibType, Vec<Requirement>>,
}

fn defaults(t: BibType) -> &'static [&'static str] {
    match t {
        BibType::Article => &["author", "title", "journal|venue", "year"],
        BibType::Book => &["author|editor", "title", "publisher", "year"],
        BibType::Proceedings => &["title", "year"],
        BibType::InProceedings => &["author", "title", "booktitle|venue", "year"],
        BibType::InCollection => &["author", "title", "booktitle", "publisher", "year"],
        BibType::TechReport => &["author", "title", "institution", "year"],
        BibType::PhdThesis | BibType::MastersThesis => &["author", "title", "school", "year"],
        BibType::Misc => &["author", "title", "year"],
        BibType::Unpublished => &["author", "title", "note"],
    }
}

fn requirements(specs: &[impl AsRef<str>]) -> Result<Vec<Requirement>> {
    specs.iter().map(|s| Requirement::parse(s.as_ref())).collect()
}

impl Default for RuleSet {
    fn default() -> Self {
        let required = BibType::ALL
            .into_iter()
            .map(|t| {
                let reqs = defaults(t)
                    .iter()
                    .map(|s| Requirement {
                        alternatives: s.split('|').map(str::to_string).collect(),
                    })
                    .collect();
                (t, reqs)
            })
            .collect();
        RuleSet { required }
    }
}

impl RuleSet {
    /// Start from the default table and replace the types named in `config.required`.
    pub fn from_config(config: &Config) -> Result<RuleSet> {
        let mut rules = RuleSet::default();
        for (name, specs) in &config.required {
            let t = name.parse::<BibType>().map_err(|e| Error::InvalidConfig {
                message: format!("[required]: {e}"),
            })?;
            rules.required.insert(t, requirements(specs)?);
        }
        Ok(rules)
    }

    pub fn required(&self, t: BibType) -> &[Requirement] {
        self.required.get(&t).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The first unmet requirement of `entry`, as a `MissingField` error.
    pub fn check(&self, entry: &Entry) -> Result<()> {
        match self.required(entry.bibtype()).iter().find(|r| !r.is_met(entry)) {
            Some(missing) => Err(Error::MissingField {
                key: entry.key().to_string(),
                field: missing.to_string(),
            }),
            None => Ok(()),
        }
    }

    pub fn check_all(&self, entries: &[Entry]) -> Result<()> {
        entries.iter().try_for_each(|e| self.check(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bibtex::parse_bibliography;

    #[test]
    fn test_article_needs_venue() {
        let rules = RuleSet::default();
        let ok = parse_bibliography(
            "@article{abc2020, author={A}, title={T}, year={2020}, venue={V}}",
        )
        .unwrap();
        assert!(rules.check_all(&ok).is_ok());

        let bad = parse_bibliography("@article{abc2020, author={A}, title={T}, year={2020}}").unwrap();
        match rules.check_all(&bad) {
            Err(Error::MissingField { key, field }) => {
                assert_eq!(key, "abc2020");
                assert_eq!(field, "journal or venue");
            }
            other => panic!("expected missing field, got {other:?}"),
        }
    }

    #[test]
    fn test_book_accepts_editor() {
        let rules = RuleSet::default();
        let entries = parse_bibliography(
            "@book{b, editor={E}, title={T}, publisher={P}, year={2001}}",
        )
        .unwrap();
        assert!(rules.check(&entries[0]).is_ok());
    }

    #[test]
    fn test_blank_value_counts_as_missing() {
        let rules = RuleSet::default();
        let entries = parse_bibliography("@misc{m, author={A}, title={ }, year={2001}}").unwrap();
        let e = rules.check(&entries[0]).unwrap_err();
        assert_eq!(e.to_string(), "entry 'm' is missing required field 'title'");
    }

    #[test]
    fn test_config_override() {
        let mut cfg = Config::default();
        cfg.required
            .insert("misc".to_string(), vec!["title".to_string(), "HowPublished".to_string()]);
        let rules = RuleSet::from_config(&cfg).unwrap();
        assert_eq!(rules.required(BibType::Misc).len(), 2);
        assert_eq!(rules.required(BibType::Misc)[1].to_string(), "howpublished");
        assert_eq!(rules.required(BibType::Article), RuleSet::default().required(BibType::Article));

        cfg.required.insert("patent".to_string(), vec![]);
        assert!(matches!(
            RuleSet::from_config(&cfg),
            Err(Error::InvalidConfig { .. })
        ));
    }
}
