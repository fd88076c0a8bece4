//! Whole-database exports: a cleaned-up BibTeX file grouped by section and a
//! tab-separated table with one row per entry.

use std::collections::BTreeSet;

use crate::bibtex::writer::write_entries;
use crate::bibtex::Entry;
use crate::listing::Sections;

fn banner(id: &str) -> String {
    let rule = "%".repeat(60);
    format!("{rule}\n% {id}\n{rule}\n")
}

/// Entries must already be in listing order; that order is kept inside
/// each section.
pub fn bibtex(ordered: &[&Entry], sections: &Sections) -> String {
    let mut out = Vec::new();
    for section in sections.iter() {
        let members: Vec<&Entry> = ordered
            .iter()
            .copied()
            .filter(|e| sections.classify(e).id == section.id)
            .collect();
        if members.is_empty() {
            continue;
        }
        out.push(format!("{}\n{}", banner(&section.id), write_entries(members)));
    }
    out.join("\n")
}

fn cell(value: &str) -> String {
    value
        .chars()
        .map(|c| if matches!(c, '\t' | '\n' | '\r') { ' ' } else { c })
        .collect()
}

pub fn tsv(ordered: &[&Entry]) -> String {
    let columns: BTreeSet<&str> = ordered
        .iter()
        .flat_map(|e| e.fields().keys().map(String::as_str))
        .collect();

    let mut out = String::from("key\ttype");
    for c in &columns {
        out.push('\t');
        out.push_str(c);
    }
    out.push('\n');

    for entry in ordered {
        out.push_str(&cell(entry.key()));
        out.push('\t');
        out.push_str(entry.bibtype().name());
        for c in &columns {
            out.push('\t');
            out.push_str(&cell(entry.get(c).unwrap_or_default()));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bibtex::parse_bibliography;
    use crate::config::Config;
    use crate::listing::order::{sort_entries, SortKey};

    const ORDER: [SortKey; 2] = [SortKey::YearDesc, SortKey::Key];

    #[test]
    fn test_tsv() {
        let entries = parse_bibliography(
            "@misc{m, title={Has\ttab}, year=2001}\n@article{a, journal={J}, year=2002}",
        )
        .unwrap();
        let ordered = sort_entries(&entries, &ORDER);
        assert_eq!(
            tsv(&ordered),
            "key\ttype\tjournal\ttitle\tyear\n\
             a\tarticle\tJ\t\t2002\n\
             m\tmisc\t\tHas tab\t2001\n"
        );
    }

    #[test]
    fn test_bibtex_grouped() {
        let entries = parse_bibliography(
            "@misc{m, year=2001}\n@article{a, year=2002}\n@misc{n, year=2003}",
        )
        .unwrap();
        let ordered = sort_entries(&entries, &ORDER);
        let sections = Sections::from_config(&Config::default()).unwrap();
        let out = bibtex(&ordered, &sections);
        let rule = "%".repeat(60);
        assert_eq!(
            out,
            format!(
                "{rule}\n% article\n{rule}\n\n@article{{a,\n year = {{2002}}\n}}\n\n\
                 {rule}\n% misc\n{rule}\n\n@misc{{n,\n year = {{2003}}\n}}\n\n@misc{{m,\n year = {{2001}}\n}}\n"
            )
        );
    }
}
