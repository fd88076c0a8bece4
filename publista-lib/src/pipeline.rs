//! Source texts in, one output document out.

use tracing::info;

use crate::bibtex::{BibParser, Entry};
use crate::config::Config;
use crate::error::Result;
use crate::export;
use crate::listing::{page, AttachmentProbe, Markup, Renderer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Html,
    Text,
    Bib,
    Tsv,
}

/// How listings are laid out: grouped under section headings, or the bare
/// blocks joined by the configured separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    #[default]
    Page,
    Flat,
}

/// A bibliography text together with the name it is reported under.
#[derive(Debug, Clone)]
pub struct Source {
    pub origin: String,
    pub text: String,
}

impl Source {
    pub fn new(origin: impl Into<String>, text: impl Into<String>) -> Self {
        Source {
            origin: origin.into(),
            text: text.into(),
        }
    }
}

pub fn parse_sources(sources: &[Source]) -> Result<Vec<Entry>> {
    let mut parser = BibParser::new();
    for source in sources {
        parser.feed(&source.origin, &source.text)?;
    }
    Ok(parser.finish())
}

/**
Parse every source, check and order the entries, and produce the requested
output. Either the whole document comes back or the first error does.
*/
pub fn build<P>(
    sources: &[Source],
    config: &Config,
    probe: &P,
    format: OutputFormat,
    layout: Layout,
) -> Result<String>
where
    P: AttachmentProbe + ?Sized,
{
    let entries = parse_sources(sources)?;
    emit(&entries, config, probe, format, layout)
}

/// Like [`build`], for several formats from a single parse. Outputs come back
/// in the order of `formats`.
pub fn build_all<P>(
    sources: &[Source],
    config: &Config,
    probe: &P,
    formats: &[OutputFormat],
    layout: Layout,
) -> Result<Vec<String>>
where
    P: AttachmentProbe + ?Sized,
{
    let entries = parse_sources(sources)?;
    formats
        .iter()
        .map(|&format| emit(&entries, config, probe, format, layout))
        .collect()
}

fn emit<P>(
    entries: &[Entry],
    config: &Config,
    probe: &P,
    format: OutputFormat,
    layout: Layout,
) -> Result<String>
where
    P: AttachmentProbe + ?Sized,
{
    let markup = match format {
        OutputFormat::Text => Markup::Text,
        _ => Markup::Html,
    };
    let renderer = Renderer::new(config, markup)?;

    let out = match format {
        OutputFormat::Html | OutputFormat::Text => {
            let listing = renderer.render(entries, probe)?;
            match layout {
                Layout::Page => page::page(&listing, renderer.sections()),
                Layout::Flat => listing.joined(),
            }
        }
        OutputFormat::Bib => export::bibtex(&renderer.arrange(entries)?, renderer.sections()),
        OutputFormat::Tsv => export::tsv(&renderer.arrange(entries)?),
    };
    info!(entries = entries.len(), ?format, "built output");
    Ok(out)
}
