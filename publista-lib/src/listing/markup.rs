use crate::listing::template::{Fragment, Style};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Markup {
    Html,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub label: String,
    pub href: String,
}

/**
Turn the LaTeX bits that commonly appear in field values into plain
characters: escapes, quote ligatures, dashes, ties and the braces used to
protect capitalisation.
*/
pub fn clean_latex(value: &str) -> String {
    let replaced = value
        .replace(r"\&", "&")
        .replace(r"\_", "_")
        .replace(r"\%", "%")
        .replace(r"\$", "$")
        .replace(r"\#", "#")
        .replace("``", "\u{201c}")
        .replace("''", "\u{201d}")
        .replace("---", "\u{2014}")
        .replace("--", "\u{2013}")
        .replace('~', "\u{a0}");
    replaced.chars().filter(|c| *c != '{' && *c != '}').collect()
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

impl Markup {
    pub fn fragment(self, fragment: &Fragment) -> String {
        let mut out = String::new();
        for segment in fragment.segments() {
            let text = clean_latex(&segment.text);
            match self {
                Markup::Text => out.push_str(&text),
                Markup::Html => {
                    let text = escape_html(&text);
                    let tag = match segment.style {
                        Style::Plain => None,
                        Style::Bold => Some("b"),
                        Style::Italic => Some("i"),
                        Style::Underline => Some("u"),
                    };
                    match tag {
                        Some(t) => out.push_str(&format!("<{t}>{text}</{t}>")),
                        None => out.push_str(&text),
                    }
                }
            }
        }
        out
    }

    /// ` [bib, web, pdf]` style trailer, empty when there are no links.
    pub fn links(self, links: &[Link]) -> String {
        if links.is_empty() {
            return String::new();
        }
        let items: Vec<String> = links
            .iter()
            .map(|l| match self {
                Markup::Html => format!(
                    "<a href=\"{}\">{}</a>",
                    escape_html(&l.href),
                    escape_html(&l.label)
                ),
                Markup::Text => format!("{}: {}", l.label, l.href),
            })
            .collect();
        format!(" [{}]", items.join(", "))
    }
}
