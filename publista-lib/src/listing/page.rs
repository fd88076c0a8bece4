//! Full pages: the listing grouped under section headings. Blocks keep
//! their listing order inside each section; empty sections are left out.

use crate::listing::markup::{escape_html, Markup};
use crate::listing::render::{RenderedBlock, RenderedListing};
use crate::listing::sections::{Section, Sections};

fn grouped<'a>(
    listing: &'a RenderedListing,
    sections: &'a Sections,
) -> impl Iterator<Item = (&'a Section, Vec<&'a RenderedBlock>)> {
    sections.iter().filter_map(move |section| {
        let blocks: Vec<&RenderedBlock> = listing
            .blocks()
            .iter()
            .filter(|b| b.section == section.id)
            .collect();
        (!blocks.is_empty()).then_some((section, blocks))
    })
}

pub fn html_page(listing: &RenderedListing, sections: &Sections) -> String {
    let mut out = String::from("<html>\n");
    for (section, blocks) in grouped(listing, sections) {
        out.push_str(&format!("<h3>{}</h3>\n<ul>\n", escape_html(&section.title)));
        for block in blocks {
            out.push_str(&format!("<li> {}\n", block.text));
        }
        out.push_str("</ul>\n");
    }
    out.push_str("</html>\n");
    out
}

pub fn text_page(listing: &RenderedListing, sections: &Sections) -> String {
    let mut parts = Vec::new();
    for (section, blocks) in grouped(listing, sections) {
        let mut part = format!(
            "{}\n{}\n\n",
            section.title,
            "=".repeat(section.title.chars().count())
        );
        for block in blocks {
            part.push_str(&block.text);
            part.push('\n');
        }
        parts.push(part);
    }
    parts.join("\n")
}

/// Page in the listing's own markup.
pub fn page(listing: &RenderedListing, sections: &Sections) -> String {
    match listing.markup() {
        Markup::Html => html_page(listing, sections),
        Markup::Text => text_page(listing, sections),
    }
}
