use std::cmp::{Ordering, Reverse};

use serde::Deserialize;

use crate::bibtex::Entry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    YearDesc,
    YearAsc,
    Surname,
    Title,
    Key,
}

/**
Split a BibTeX name list on ` and ` at brace depth zero, so
`{Barnes and Noble}` stays one name.
*/
pub fn split_names(list: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut idx = 0;
    let bytes = list.as_bytes();
    while idx < bytes.len() {
        match bytes[idx] {
            b'{' => depth += 1,
            b'}' => depth = depth.saturating_sub(1),
            b' ' if depth == 0 && list[idx..].starts_with(" and ") => {
                names.push(list[start..idx].trim());
                idx += " and ".len();
                start = idx;
                continue;
            }
            _ => {}
        }
        idx += 1;
    }
    names.push(list[start..].trim());
    names.retain(|n| !n.is_empty());
    names
}

pub fn strip_braces(s: &str) -> String {
    s.chars().filter(|c| *c != '{' && *c != '}').collect()
}

/// `Last, First` or `First von Last`; the family name is what sorts.
pub fn surname(name: &str) -> String {
    let name = name.trim();
    let family = match name.split_once(',') {
        Some((last, _)) => last.trim().to_string(),
        None if name.starts_with('{') && name.ends_with('}') => name.to_string(),
        None => name.rsplit(' ').next().unwrap_or(name).to_string(),
    };
    strip_braces(&family)
}

/// Lowercased surname of the first author, falling back to the first editor.
pub fn first_surname(entry: &Entry) -> Option<String> {
    let names = entry.get_nonblank("author").or_else(|| entry.get_nonblank("editor"))?;
    split_names(names)
        .first()
        .map(|n| surname(n).to_lowercase())
}

struct Keys {
    year: Option<u32>,
    surname: String,
    title: String,
}

impl Keys {
    fn of(entry: &Entry) -> Keys {
        Keys {
            year: entry.year(),
            surname: first_surname(entry).unwrap_or_default(),
            title: entry.get_nonblank("title").map(|t| strip_braces(t).to_lowercase()).unwrap_or_default(),
        }
    }
}

fn compare(order: &[SortKey], a: (&Keys, &Entry), b: (&Keys, &Entry)) -> Ordering {
    order
        .iter()
        .map(|k| match k {
            // entries without a year go last either way
            SortKey::YearDesc => Reverse(a.0.year).cmp(&Reverse(b.0.year)),
            SortKey::YearAsc => match (a.0.year, b.0.year) {
                (Some(x), Some(y)) => x.cmp(&y),
                (x, y) => y.is_none().cmp(&x.is_none()).reverse(),
            },
            SortKey::Surname => a.0.surname.cmp(&b.0.surname),
            SortKey::Title => a.0.title.cmp(&b.0.title),
            SortKey::Key => a.1.key().cmp(b.1.key()),
        })
        .find(|o| o.is_ne())
        .unwrap_or_else(|| a.1.key().cmp(b.1.key()))
}

/// Entries in listing order. The key always breaks remaining ties, so the
/// order is total and independent of input order.
pub fn sort_entries<'a>(entries: &'a [Entry], order: &[SortKey]) -> Vec<&'a Entry> {
    let mut keyed: Vec<(Keys, &Entry)> = entries.iter().map(|e| (Keys::of(e), e)).collect();
    keyed.sort_by(|a, b| compare(order, (&a.0, a.1), (&b.0, b.1)));
    keyed.into_iter().map(|(_, e)| e).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bibtex::parse_bibliography;

    const DEFAULT: [SortKey; 3] = [SortKey::YearDesc, SortKey::Surname, SortKey::Key];

    fn keys(entries: &[&Entry]) -> Vec<String> {
        entries.iter().map(|e| e.key().to_string()).collect()
    }

    #[test]
    fn test_split_names() {
        assert_eq!(
            split_names("Smith, John and Jane Doe and {Barnes and Noble}"),
            vec!["Smith, John", "Jane Doe", "{Barnes and Noble}"]
        );
        assert_eq!(split_names("Anderson, Sandra"), vec!["Anderson, Sandra"]);
        assert!(split_names("").is_empty());
    }

    #[test]
    fn test_surname() {
        assert_eq!(surname("Smith, John"), "Smith");
        assert_eq!(surname("Jane Doe"), "Doe");
        assert_eq!(surname("{van Beethoven}, Ludwig"), "van Beethoven");
        assert_eq!(surname("{World Health Organization}"), "World Health Organization");
        assert_eq!(surname("Plato"), "Plato");
    }

    #[test]
    fn test_year_desc_then_surname() {
        let entries = parse_bibliography(
            r#"
@misc{s19, author = {Smith, John}, title = {A}, year = 2019}
@misc{l21, author = {Ann Lee}, title = {B}, year = 2021}
@misc{a19, author = {Adams, Zoe and Smith, John}, title = {C}, year = 2019}
"#,
        )
        .unwrap();
        assert_eq!(keys(&sort_entries(&entries, &DEFAULT)), vec!["l21", "a19", "s19"]);
    }

    #[test]
    fn test_order_is_input_independent() {
        let src = [
            "@misc{b, author={Lee, A}, title={x}, year=2020}",
            "@misc{a, author={lee, B}, title={y}, year=2020}",
            "@misc{c, title={z}}",
            "@misc{d, author={Kim, C}, title={w}, year=2020}",
        ];
        let forward = parse_bibliography(&src.join("\n")).unwrap();
        let mut reversed_src = src;
        reversed_src.reverse();
        let backward = parse_bibliography(&reversed_src.join("\n")).unwrap();

        let expected = vec!["d", "a", "b", "c"];
        assert_eq!(keys(&sort_entries(&forward, &DEFAULT)), expected);
        assert_eq!(keys(&sort_entries(&backward, &DEFAULT)), expected);
    }

    #[test]
    fn test_year_asc_keeps_undated_last() {
        let entries = parse_bibliography(
            "@misc{x, title={x}}\n@misc{n, title={n}, year=2010}\n@misc{o, title={o}, year=2001}",
        )
        .unwrap();
        assert_eq!(
            keys(&sort_entries(&entries, &[SortKey::YearAsc])),
            vec!["o", "n", "x"]
        );
        assert_eq!(
            keys(&sort_entries(&entries, &[SortKey::Title])),
            vec!["n", "o", "x"]
        );
    }
}
