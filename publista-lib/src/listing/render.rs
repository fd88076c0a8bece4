use std::fmt;

use tracing::debug;

use crate::bibtex::{BibType, Entry};
use crate::config::{AttachmentKind, Config};
use crate::error::Result;
use crate::listing::markup::{Link, Markup};
use crate::listing::order::{sort_entries, SortKey};
use crate::listing::rules::RuleSet;
use crate::listing::sections::Sections;
use crate::listing::template::Templates;

/// Answers whether an attachment path exists. The renderer never touches
/// the filesystem itself.
pub trait AttachmentProbe {
    fn exists(&self, path: &str) -> bool;
}

impl<F> AttachmentProbe for F
where
    F: Fn(&str) -> bool,
{
    fn exists(&self, path: &str) -> bool {
        self(path)
    }
}

/// Probe for runs without attachments.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAttachments;

impl AttachmentProbe for NoAttachments {
    fn exists(&self, _path: &str) -> bool {
        false
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedBlock {
    pub key: String,
    pub bibtype: BibType,
    /// Id of the page section the entry belongs to.
    pub section: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedListing {
    blocks: Vec<RenderedBlock>,
    separator: String,
    markup: Markup,
}

impl RenderedListing {
    pub fn blocks(&self) -> &[RenderedBlock] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn markup(&self) -> Markup {
        self.markup
    }

    /// All blocks joined with the configured separator.
    pub fn joined(&self) -> String {
        self.blocks
            .iter()
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join(&self.separator)
    }
}

impl fmt::Display for RenderedListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.joined())
    }
}

#[derive(Debug, Clone)]
pub struct Renderer {
    rules: RuleSet,
    sections: Sections,
    order: Vec<SortKey>,
    highlight: Vec<String>,
    attachment_dir: String,
    attachments: Vec<AttachmentKind>,
    bib_link_dir: Option<String>,
    separator: String,
    markup: Markup,
}

fn join_path(dir: &str, file: &str) -> String {
    let dir = dir.trim_end_matches('/');
    if dir.is_empty() {
        file.to_string()
    } else {
        format!("{dir}/{file}")
    }
}

impl Renderer {
    pub fn new(config: &Config, markup: Markup) -> Result<Renderer> {
        Ok(Renderer {
            rules: RuleSet::from_config(config)?,
            sections: Sections::from_config(config)?,
            order: config.order.clone(),
            highlight: config.highlight_authors.clone(),
            attachment_dir: config.attachment_dir.clone(),
            attachments: config.attachments.clone(),
            bib_link_dir: config.bib_link_dir.clone(),
            separator: config.separator.clone(),
            markup,
        })
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn sections(&self) -> &Sections {
        &self.sections
    }

    /// Check all entries, then put them in listing order. Nothing is returned
    /// unless every entry passes.
    pub fn arrange<'a>(&self, entries: &'a [Entry]) -> Result<Vec<&'a Entry>> {
        self.rules.check_all(entries)?;
        Ok(sort_entries(entries, &self.order))
    }

    pub fn render<P>(&self, entries: &[Entry], probe: &P) -> Result<RenderedListing>
    where
        P: AttachmentProbe + ?Sized,
    {
        let blocks = self
            .arrange(entries)?
            .into_iter()
            .map(|e| self.block(e, probe))
            .collect();
        Ok(RenderedListing {
            blocks,
            separator: self.separator.clone(),
            markup: self.markup,
        })
    }

    /// Attachment paths for `key`, in configured order, whether or not they exist.
    pub fn attachment_paths(&self, key: &str) -> Vec<(String, String)> {
        self.attachments
            .iter()
            .map(|a| {
                let file = format!("{key}{}.pdf", a.suffix);
                (a.label.clone(), join_path(&self.attachment_dir, &file))
            })
            .collect()
    }

    fn links<P>(&self, entry: &Entry, probe: &P) -> Vec<Link>
    where
        P: AttachmentProbe + ?Sized,
    {
        let mut links = Vec::new();
        if let Some(dir) = &self.bib_link_dir {
            links.push(Link {
                label: "bib".to_string(),
                href: join_path(dir, &format!("{}.bib", entry.key())),
            });
        }
        if let Some(url) = entry.get_nonblank("url") {
            links.push(Link {
                label: "web".to_string(),
                href: url.to_string(),
            });
        }
        for (label, path) in self.attachment_paths(entry.key()) {
            if probe.exists(&path) {
                links.push(Link { label, href: path });
            }
        }
        links
    }

    fn block<P>(&self, entry: &Entry, probe: &P) -> RenderedBlock
    where
        P: AttachmentProbe + ?Sized,
    {
        let templates = Templates {
            highlight: &self.highlight,
        };
        let mut text = self.markup.fragment(&templates.format(entry));
        text.push_str(&self.markup.links(&self.links(entry, probe)));
        let section = self.sections.classify(entry).id.clone();
        debug!(key = entry.key(), %section, "rendered entry");
        RenderedBlock {
            key: entry.key().to_string(),
            bibtype: entry.bibtype(),
            section,
            text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bibtex::parse_bibliography;
    use crate::error::Error;

    fn html() -> Renderer {
        Renderer::new(&Config::default(), Markup::Html).unwrap()
    }

    #[test]
    fn test_single_article_scenario() {
        let entries = parse_bibliography(
            "@article{abc2020, author = {Doe, Jane}, title = {Parsing Things}, year = {2020}, venue = {Journal of Tests}}",
        )
        .unwrap();
        let listing = html().render(&entries, &NoAttachments).unwrap();
        assert_eq!(listing.len(), 1);
        let block = &listing.blocks()[0];
        assert_eq!(block.key, "abc2020");
        for value in ["Doe, Jane", "Parsing Things", "2020", "Journal of Tests"] {
            assert!(block.text.contains(value), "{value} missing from {}", block.text);
        }
        assert!(!block.text.contains("pdf"));
        assert_eq!(
            block.text,
            "Doe, Jane (2020). <b>Parsing Things</b>. <i>Journal of Tests</i>."
        );
    }

    #[test]
    fn test_attachment_only_when_present() {
        let entries = parse_bibliography(
            r#"
@misc{K1, author = {A}, title = {One}, year = 2020}
@misc{K2, author = {B}, title = {Two}, year = 2020}
"#,
        )
        .unwrap();
        let probe = |path: &str| path == "pdf/K1.pdf";
        let listing = html().render(&entries, &probe).unwrap();
        let k1 = listing.blocks().iter().find(|b| b.key == "K1").unwrap();
        let k2 = listing.blocks().iter().find(|b| b.key == "K2").unwrap();
        assert!(k1.text.ends_with(" [<a href=\"pdf/K1.pdf\">pdf</a>]"), "{}", k1.text);
        assert!(!k2.text.contains("pdf/K2.pdf"));
        assert!(!k2.text.contains('['));
    }

    #[test]
    fn test_links_order() {
        let mut cfg = Config::default();
        cfg.bib_link_dir = Some("bib/".to_string());
        let renderer = Renderer::new(&cfg, Markup::Text).unwrap();
        let entries = parse_bibliography(
            "@misc{t, author={A}, title={T}, year=2001, url={https://example.org}}",
        )
        .unwrap();
        let probe = |path: &str| path.ends_with("_slides.pdf") || path.ends_with("_abstract.pdf");
        let listing = renderer.render(&entries, &probe).unwrap();
        assert_eq!(
            listing.joined(),
            "A (2001). T. [bib: bib/t.bib, web: https://example.org, abstract: pdf/t_abstract.pdf, slides: pdf/t_slides.pdf]"
        );
    }

    #[test]
    fn test_missing_field_produces_nothing() {
        let entries = parse_bibliography(
            r#"
@misc{fine, author = {A}, title = {T}, year = 2020}
@inproceedings{broken, author = {A}, title = {T}, year = 2020}
"#,
        )
        .unwrap();
        match html().render(&entries, &NoAttachments) {
            Err(Error::MissingField { key, field }) => {
                assert_eq!(key, "broken");
                assert_eq!(field, "booktitle or venue");
            }
            other => panic!("expected missing field, got {other:?}"),
        }
    }

    #[test]
    fn test_idempotent_and_one_block_per_key() {
        let src = r#"
@article{a1, author={Lee, A}, title={X}, journal={J}, year=2021}
@misc{m1, author={Smith, B}, title={Y}, year=2019}
@misc{m2, author={Adams, C}, title={Z}, year=2019}
"#;
        let first = html().render(&parse_bibliography(src).unwrap(), &NoAttachments).unwrap();
        let second = html().render(&parse_bibliography(src).unwrap(), &NoAttachments).unwrap();
        assert_eq!(first.joined(), second.joined());
        assert_eq!(first.len(), 3);
        let keys: Vec<&str> = first.blocks().iter().map(|b| b.key.as_str()).collect();
        assert_eq!(keys, vec!["a1", "m2", "m1"]);
        assert_eq!(first.joined().lines().count(), 3);
    }
}
