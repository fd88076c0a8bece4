//! One layout per entry type. Layouts produce styled segments; turning
//! them into HTML or plain text is left to [`Markup`](super::markup::Markup).

use crate::bibtex::normalize;
use crate::bibtex::{BibType, Entry};
use crate::listing::order::{split_names, strip_braces};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Plain,
    Bold,
    Italic,
    Underline,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub style: Style,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    segments: Vec<Segment>,
}

impl Fragment {
    fn push(&mut self, style: Style, text: impl Into<String>) -> &mut Self {
        let text = text.into();
        if text.is_empty() {
            return self;
        }
        match self.segments.last_mut() {
            Some(last) if last.style == style => last.text.push_str(&text),
            _ => self.segments.push(Segment { style, text }),
        }
        self
    }

    pub fn plain(&mut self, text: impl Into<String>) -> &mut Self {
        self.push(Style::Plain, text)
    }

    pub fn bold(&mut self, text: impl Into<String>) -> &mut Self {
        self.push(Style::Bold, text)
    }

    pub fn italic(&mut self, text: impl Into<String>) -> &mut Self {
        self.push(Style::Italic, text)
    }

    pub fn underline(&mut self, text: impl Into<String>) -> &mut Self {
        self.push(Style::Underline, text)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The text with styling dropped.
    pub fn plain_text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }

    fn extend(&mut self, other: Fragment) {
        for s in other.segments {
            self.push(s.style, s.text);
        }
    }
}

pub struct Templates<'a> {
    /// Names to underline in author and editor lists.
    pub highlight: &'a [String],
}

fn ends_sentence(text: &str) -> bool {
    strip_braces(text).trim_end().ends_with(['.', '?', '!'])
}

impl Templates<'_> {
    pub fn format(&self, entry: &Entry) -> Fragment {
        let mut out = self.head(entry);
        let tail = match entry.bibtype() {
            BibType::Article => article(entry),
            BibType::Book | BibType::Proceedings => book(entry),
            BibType::InProceedings => inproceedings(entry),
            BibType::InCollection => self.incollection(entry),
            BibType::TechReport => techreport(entry),
            BibType::PhdThesis => thesis(entry, "PhD thesis"),
            BibType::MastersThesis => thesis(entry, "Master's thesis"),
            BibType::Misc => misc(entry),
            BibType::Unpublished => unpublished(entry),
        };
        if !tail.is_empty() {
            if !out.is_empty() {
                out.plain(" ");
            }
            out.extend(tail);
        }
        out
    }

    fn names(&self, out: &mut Fragment, list: &str) {
        for (i, name) in split_names(list).into_iter().enumerate() {
            if i > 0 {
                out.plain("; ");
            }
            if self.highlight.iter().any(|h| h == name || *h == strip_braces(name)) {
                out.underline(name);
            } else {
                out.plain(name);
            }
        }
    }

    /// `Authors (year). Title.` with whatever of it is present. Books and
    /// proceedings fall back to their editors.
    fn head(&self, entry: &Entry) -> Fragment {
        let mut out = Fragment::default();
        let editors_only = matches!(entry.bibtype(), BibType::Book | BibType::Proceedings)
            && !entry.has("author");
        let who = if editors_only {
            entry.get_nonblank("editor")
        } else {
            entry.get_nonblank("author")
        };

        if let Some(names) = who {
            self.names(&mut out, names);
            if editors_only {
                out.plain(if split_names(names).len() > 1 { " (eds.)" } else { " (ed.)" });
            }
        }
        match (out.is_empty(), entry.get_nonblank("year").or_else(|| entry.get_nonblank("date"))) {
            (true, Some(year)) => out.plain(format!("({year}).")),
            (false, Some(year)) => out.plain(format!(" ({year}).")),
            (false, None) => out.plain("."),
            (true, None) => &mut out,
        };
        if let Some(title) = entry.get_nonblank("title") {
            if !out.is_empty() {
                out.plain(" ");
            }
            out.bold(title);
            if !ends_sentence(title) {
                out.plain(".");
            }
        }
        out
    }

    fn incollection(&self, entry: &Entry) -> Fragment {
        let mut out = Fragment::default();
        if let Some(booktitle) = entry.get_nonblank("booktitle") {
            out.plain("In ").italic(booktitle);
        }
        if let Some(editors) = entry.get_nonblank("editor") {
            clause(&mut out, "edited by ");
            self.names(&mut out, editors);
        }
        if let Some(pages) = entry.get_nonblank("pages") {
            clause(&mut out, format!("pages {}", normalize::pages(pages)));
        }
        if let Some(p) = publisher(entry) {
            clause(&mut out, p);
        }
        finish(out)
    }
}

/// Appends `text`, separated by a comma unless it is the first part.
fn clause(out: &mut Fragment, text: impl Into<String>) {
    if !out.is_empty() {
        out.plain(", ");
    }
    out.plain(text);
}

fn finish(mut out: Fragment) -> Fragment {
    if !out.is_empty() {
        out.plain(".");
    }
    out
}

/// `address: publisher`, or whichever of the two exists.
fn publisher(entry: &Entry) -> Option<String> {
    match (entry.get_nonblank("address"), entry.get_nonblank("publisher")) {
        (Some(a), Some(p)) => Some(format!("{a}: {p}")),
        (Some(x), None) | (None, Some(x)) => Some(x.to_string()),
        (None, None) => None,
    }
}

fn article(entry: &Entry) -> Fragment {
    let mut out = Fragment::default();
    if let Some(journal) = entry.get_nonblank("journal").or_else(|| entry.get_nonblank("venue")) {
        out.italic(journal);
    }
    if let Some(volume) = entry.get_nonblank("volume") {
        if !out.is_empty() {
            out.plain(" ");
        }
        out.bold(volume);
        if let Some(number) = entry.get_nonblank("number") {
            out.plain(format!("({number})"));
        }
    }
    if let Some(pages) = entry.get_nonblank("pages") {
        let pages = normalize::pages(pages);
        out.plain(if out.is_empty() { format!("pages {pages}") } else { format!(": {pages}") });
    }
    finish(out)
}

fn book(entry: &Entry) -> Fragment {
    let mut out = Fragment::default();
    if let Some(p) = publisher(entry) {
        out.plain(format!("{p}."));
    }
    out
}

fn inproceedings(entry: &Entry) -> Fragment {
    let mut out = Fragment::default();
    if let Some(booktitle) = entry.get_nonblank("booktitle").or_else(|| entry.get_nonblank("venue")) {
        out.plain("In ").italic(booktitle);
    }
    if let Some(pages) = entry.get_nonblank("pages") {
        clause(&mut out, format!("pages {}", normalize::pages(pages)));
    }
    if let Some(address) = entry.get_nonblank("address") {
        clause(&mut out, address);
    }
    finish(out)
}

fn techreport(entry: &Entry) -> Fragment {
    let mut out = Fragment::default();
    out.plain(entry.get_nonblank("type").unwrap_or("Technical Report"));
    if let Some(number) = entry.get_nonblank("number") {
        out.plain(format!(" {number}"));
    }
    if let Some(institution) = entry.get_nonblank("institution") {
        out.plain(format!(", {institution}"));
    }
    out.plain(".");
    out
}

fn thesis(entry: &Entry, kind: &str) -> Fragment {
    let mut out = Fragment::default();
    out.plain(entry.get_nonblank("type").unwrap_or(kind));
    if let Some(school) = entry.get_nonblank("school") {
        out.plain(format!(", {school}"));
    }
    out.plain(".");
    out
}

fn misc(entry: &Entry) -> Fragment {
    let mut out = Fragment::default();
    if let Some(how) = entry.get_nonblank("howpublished") {
        out.italic(how).plain(".");
    }
    out
}

fn unpublished(entry: &Entry) -> Fragment {
    let mut out = Fragment::default();
    if let Some(note) = entry.get_nonblank("note") {
        out.plain(note);
        if !ends_sentence(note) {
            out.plain(".");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bibtex::parse_bibliography;

    fn render(src: &str, highlight: &[String]) -> Fragment {
        let entries = parse_bibliography(src).unwrap();
        Templates { highlight }.format(&entries[0])
    }

    #[test]
    fn test_article_layout() {
        let fr = render(
            "@article{a, author={Smith, J. and Lee, A.}, title={On Things}, journal={J. Stuff},
              volume={12}, number={3}, pages={1--10}, year={2020}}",
            &[],
        );
        assert_eq!(
            fr.plain_text(),
            "Smith, J.; Lee, A. (2020). On Things. J. Stuff 12(3): 1–10."
        );
        let styles: Vec<Style> = fr.segments().iter().map(|s| s.style).collect();
        assert_eq!(
            styles,
            vec![Style::Plain, Style::Bold, Style::Plain, Style::Italic, Style::Plain, Style::Bold, Style::Plain]
        );
    }

    #[test]
    fn test_highlight_author() {
        let fr = render(
            "@misc{m, author={Heinrich, Philipp and Doe, Jane}, title={Talk}, year=2019, howpublished={Workshop}}",
            &["Heinrich, Philipp".to_string()],
        );
        assert_eq!(
            fr.segments()[0],
            Segment {
                style: Style::Underline,
                text: "Heinrich, Philipp".to_string()
            }
        );
        assert_eq!(fr.plain_text(), "Heinrich, Philipp; Doe, Jane (2019). Talk. Workshop.");
    }

    #[test]
    fn test_book_by_editors() {
        let fr = render(
            "@book{b, editor={Ann Lee and Bo Kim}, title={Collected Works}, publisher={Press}, address={Berlin}, year=2018}",
            &[],
        );
        assert_eq!(
            fr.plain_text(),
            "Ann Lee; Bo Kim (eds.) (2018). Collected Works. Berlin: Press."
        );
    }

    #[test]
    fn test_question_title_and_sparse_fields() {
        let fr = render(
            "@inproceedings{i, author={A. Author}, title={Why Not?}, booktitle={Proc. X}, year=2021}",
            &[],
        );
        assert_eq!(fr.plain_text(), "A. Author (2021). Why Not? In Proc. X.");

        let fr = render("@proceedings{p, title={Volume}, year=2011}", &[]);
        assert_eq!(fr.plain_text(), "(2011). Volume.");
    }

    #[test]
    fn test_blank_fields_are_absent() {
        let fr = render(
            "@article{abc2020, author={Doe, Jane}, title={T}, year={2020}, journal={}, volume={ }, venue={Journal of Tests}}",
            &[],
        );
        assert_eq!(fr.plain_text(), "Doe, Jane (2020). T. Journal of Tests.");

        let fr = render("@misc{m1, author={A}, title={U}, year=2019, howpublished={ }}", &[]);
        assert_eq!(fr.plain_text(), "A (2019). U.");

        let fr = render("@misc{m2, author={A}, title={U}, year={}}", &[]);
        assert_eq!(fr.plain_text(), "A. U.");

        let fr = render(
            "@inproceedings{i, author={A}, title={V}, booktitle={}, pages={2-3}, address={ }, year=2020}",
            &[],
        );
        assert_eq!(fr.plain_text(), "A (2020). V. pages 2–3.");

        let fr = render("@book{b, editor={E}, title={W}, address={}, publisher={P}, year=2000}", &[]);
        assert_eq!(fr.plain_text(), "E (ed.) (2000). W. P.");
    }

    #[test]
    fn test_incollection_and_thesis() {
        let fr = render(
            "@incollection{c, author={A}, title={Ch}, booktitle={Book}, editor={E}, pages={3-4}, publisher={P}, year=2000}",
            &[],
        );
        assert_eq!(fr.plain_text(), "A (2000). Ch. In Book, edited by E, pages 3–4, P.");

        let fr = render("@phdthesis{t, author={A}, title={Th}, school={Uni}, year=1999}", &[]);
        assert_eq!(fr.plain_text(), "A (1999). Th. PhD thesis, Uni.");

        let fr = render(
            "@techreport{r, author={A}, title={R}, institution={Lab}, number={7}, year=2001}",
            &[],
        );
        assert_eq!(fr.plain_text(), "A (2001). R. Technical Report 7, Lab.");
    }
}
