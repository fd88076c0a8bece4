/*!
Value and field-name cleanup applied to parsed records, plus the
consistency rewrites used when a database is written back out.
*/

use once_cell::sync::Lazy;

use regex::Regex;

static PAGE_DASH: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"\s*[-–]+\s*").expect("static regex"));

/**
Collapse whitespace runs that contain a line break into a single space and
trim the ends. Runs without a newline are left alone, so deliberate double
spaces and all punctuation (braces included) survive.
*/
pub fn collapse_wrapping(value: &str) -> String {
  let mut out = String::with_capacity(value.len());
  let mut run = String::new();
  for c in value.trim().chars() {
    if c.is_whitespace() {
      run.push(c);
      continue;
    }
    if !run.is_empty() {
      if run.contains(['\n', '\r']) {
        out.push(' ');
      } else {
        out.push_str(&run);
      }
      run.clear();
    }
    out.push(c);
  }
  out
}

/// Lowercase a field name and map the common plural/alias spellings.
pub fn field_name(name: &str) -> String {
  let lower = name.to_lowercase();
  match lower.as_str() {
    "editors" => "editor".to_string(),
    "urls" | "link" => "url".to_string(),
    "keyw" => "keywords".to_string(),
    "subjects" => "subject".to_string(),
    _ => lower,
  }
}

/// `12 -- 34`, `12-34` and `12 – 34` all become `12–34`.
pub fn pages(value: &str) -> String {
  PAGE_DASH.replace_all(value, "–").into_owned()
}

/**
Wrap every word that carries an uppercase letter in braces so BibTeX styles
do not lowercase it. Existing braces are dropped first so re-running is
stable.
*/
pub fn protect_capitals(value: &str) -> String {
  let bare: String = value.chars().filter(|c| *c != '{' && *c != '}').collect();
  bare
    .split(' ')
    .map(|word| {
      if word.chars().any(char::is_uppercase) {
        format!("{{{word}}}")
      } else {
        word.to_string()
      }
    })
    .collect::<Vec<_>>()
    .join(" ")
}
