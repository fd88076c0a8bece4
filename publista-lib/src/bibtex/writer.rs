/*!
Writes entries back out as BibTeX, with the consistency rewrites applied:
fields in alphabetical order, capitalised title words protected, page
ranges with an en dash.
*/

use crate::bibtex::data::Entry;
use crate::bibtex::normalize;

fn consistent(field: &str, value: &str) -> String {
  match field {
    "title" | "booktitle" => normalize::protect_capitals(value),
    "pages" => normalize::pages(value),
    _ => value.to_string(),
  }
}

pub fn write_entry(entry: &Entry) -> String {
  let fields: Vec<String> = entry
    .fields()
    .iter()
    .map(|(k, v)| format!(" {k} = {{{}}}", consistent(k, v)))
    .collect();
  if fields.is_empty() {
    return format!("@{}{{{}\n}}\n", entry.bibtype(), entry.key());
  }
  format!(
    "@{}{{{},\n{}\n}}\n",
    entry.bibtype(),
    entry.key(),
    fields.join(",\n")
  )
}

pub fn write_entries<'a>(entries: impl IntoIterator<Item = &'a Entry>) -> String {
  entries
    .into_iter()
    .map(write_entry)
    .collect::<Vec<_>>()
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bibtex::parse_bibliography;

    #[test]
    fn test_write_entry() {
        let entries = parse_bibliography(
            "@InProceedings{k, Title = {Neural Nets for {G}erman}, pages = {1 - 9}, Author = {A}}",
        )
        .unwrap();
        assert_eq!(
            write_entry(&entries[0]),
            "@inproceedings{k,\n author = {A},\n pages = {1–9},\n title = {{Neural} {Nets} for {German}}\n}\n"
        );
    }

    #[test]
    fn test_written_output_parses_back() {
        let src = "@misc{a, title={One}, year=2001}\n@book{b}\n";
        let entries = parse_bibliography(src).unwrap();
        let written = write_entries(&entries);
        assert_eq!(written, "@misc{a,\n title = {{One}},\n year = {2001}\n}\n\n@book{b\n}\n");
        let again = parse_bibliography(&written).unwrap();
        assert_eq!(again.len(), 2);
        assert_eq!(again[0].get("year"), Some("2001"));
    }
}
