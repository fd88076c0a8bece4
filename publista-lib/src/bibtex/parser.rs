/**

The goal of this parser is to read in something like this:

@book{Cox-CFT,
    author = {David A. Cox},
    title = {Primes of the form $x^2 + ny^2$: Fermat, Class Field Theory, and Complex Multiplication},
    edition = {2nd ed.},
    publisher = {John Wiley and Sons Inc},
    year = 2013,
    month = jan,
    ISBN = "978-1-118-39018-4",
    doi = {10.1002/9781118400722}
}

and turn every such block into an `Entry`. `@string` definitions are
remembered and expanded, `@comment` and `@preamble` blocks are skipped,
and anything outside of a block is ignored.

*/

use std::collections::{BTreeMap, HashMap};

use nom::{
  branch::alt,
  bytes::complete::{take_while, take_while1},
  character::complete::{char, digit1, one_of},
  combinator::{cut, map, not, opt},
  error::{context, ContextError, ErrorKind, ParseError, VerboseError, VerboseErrorKind},
  multi::{separated_list0, separated_list1},
  sequence::{delimited, pair, preceded, separated_pair, terminated},
  Err, IResult,
};
use nom_unicode::{is_alphabetic as is_alphabetic_unicode, is_alphanumeric as is_alphanumeric_unicode};
use tracing::{debug, info};

use crate::bibtex::data::*;
use crate::bibtex::normalize;
use crate::error::{Error, Position, Result};

const MONTHS: [(&str, &str); 12] = [
  ("jan", "January"),
  ("feb", "February"),
  ("mar", "March"),
  ("apr", "April"),
  ("may", "May"),
  ("jun", "June"),
  ("jul", "July"),
  ("aug", "August"),
  ("sep", "September"),
  ("oct", "October"),
  ("nov", "November"),
  ("dec", "December"),
];

/// One piece of a (possibly `#`-concatenated) field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Piece<'a> {
  Text(&'a str),
  Macro(&'a str),
}

type Field<'a> = (&'a str, Vec<Piece<'a>>);

/**
Space Parser
*/
fn sp<'a, E: ParseError<&'a str>>(i: &'a str) -> IResult<&'a str, &'a str, E> {
  let chars = " \t\r\n";

  // nom combinators like `take_while` return a function. That function is the
  // parser,to which we can pass the input
  take_while(move |c| chars.contains(c))(i)
}

fn entry_type<'a, E: ParseError<&'a str>>(i: &'a str) -> IResult<&'a str, &'a str, E> {
  take_while1(is_alphabetic_unicode)(i)
}

/**
Field names and macro names: letters, digits and a few joiners such as
`date-added` or `bdsk_url`.
*/
fn label<'a, E: ParseError<&'a str>>(i: &'a str) -> IResult<&'a str, &'a str, E> {
  let chars = "-_.:+";

  take_while1(move |c: char| is_alphanumeric_unicode(c) || chars.contains(c))(i)
}

fn citation_key<'a, E: ParseError<&'a str>>(i: &'a str) -> IResult<&'a str, &'a str, E> {
  let stops = ",{}()=\"#%";

  take_while1(move |c: char| !c.is_whitespace() && !stops.contains(c))(i)
}

/**
Content between `open` and the matching `close`, counting nesting, without
the outer pair. Escapes are not special: BibTeX counts every brace.
*/
fn balanced<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
  open: char,
  close: char,
  ctx: &'static str,
) -> impl Fn(&'a str) -> IResult<&'a str, &'a str, E> {
  move |i: &'a str| {
    let (rest, _) = char::<&'a str, E>(open)(i)?;
    let mut depth = 0usize;
    for (idx, c) in rest.char_indices() {
      if c == open {
        depth += 1;
      } else if c == close {
        if depth == 0 {
          return Ok((&rest[idx + c.len_utf8()..], &rest[..idx]));
        }
        depth -= 1;
      }
    }
    Err(Err::Failure(E::add_context(
      i,
      ctx,
      E::from_error_kind(i, ErrorKind::Eof),
    )))
  }
}

fn string_brc<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
  i: &'a str,
) -> IResult<&'a str, &'a str, E> {
  balanced('{', '}', "unterminated braced value")(i)
}

/**
Quoted strings end at the first `"` outside of braces, so `{"}` may appear
inside them. Braces inside must balance.
*/
fn string_spm<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
  i: &'a str,
) -> IResult<&'a str, &'a str, E> {
  let (rest, _) = char::<&'a str, E>('\"')(i)?;
  let mut depth = 0usize;
  for (idx, c) in rest.char_indices() {
    match c {
      '{' => depth += 1,
      '}' if depth == 0 => {
        let at = &rest[idx..];
        return Err(Err::Failure(E::add_context(
          at,
          "unbalanced braces in quoted value",
          E::from_error_kind(at, ErrorKind::Char),
        )));
      }
      '}' => depth -= 1,
      '\"' if depth == 0 => return Ok((&rest[idx + 1..], &rest[..idx])),
      _ => {}
    }
  }
  Err(Err::Failure(E::add_context(
    i,
    "unterminated quoted value",
    E::from_error_kind(i, ErrorKind::Eof),
  )))
}

fn piece<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
  i: &'a str,
) -> IResult<&'a str, Piece<'a>, E> {
  alt((
    map(string_brc, Piece::Text),
    map(string_spm, Piece::Text),
    map(digit1, Piece::Text),
    map(label, Piece::Macro),
  ))(i)
}

fn value<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
  i: &'a str,
) -> IResult<&'a str, Vec<Piece<'a>>, E> {
  context(
    "expected a value",
    separated_list1(delimited(sp, char('#'), sp), piece),
  )(i)
}

fn key_value<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
  i: &'a str,
) -> IResult<&'a str, Field<'a>, E> {
  separated_pair(
    preceded(sp, label),
    cut(context("expected '=' after field name", preceded(sp, char('=')))),
    cut(preceded(sp, value)),
  )(i)
}

fn kvlist<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
  i: &'a str,
) -> IResult<&'a str, Vec<Field<'a>>, E> {
  terminated(
    separated_list0(preceded(sp, char(',')), key_value),
    opt(preceded(sp, char(','))),
  )(i)
}

/**
`@` and the type name.
*/
fn record_kind<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
  i: &'a str,
) -> IResult<&'a str, &'a str, E> {
  preceded(
    char('@'),
    context("expected entry type after '@'", preceded(sp, entry_type)),
  )(i)
}

/**
The opening delimiter and, if present, the citation key. A label followed
by `=` is the first field of a block without a key.
*/
fn record_open<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
  i: &'a str,
) -> IResult<&'a str, (char, Option<&'a str>), E> {
  pair(
    context("expected '{' or '(' after entry type", preceded(sp, one_of("{("))),
    preceded(sp, opt(terminated(citation_key, not(preceded(sp, char('=')))))),
  )(i)
}

fn record_body<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
  close: char,
) -> impl FnMut(&'a str) -> IResult<&'a str, Vec<Field<'a>>, E> {
  terminated(
    preceded(opt(preceded(sp, char(','))), kvlist),
    cut(context(
      if close == '}' { "expected ',' or closing '}'" } else { "expected ',' or closing ')'" },
      preceded(sp, char(close)),
    )),
  )
}

fn group<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
  i: &'a str,
) -> IResult<&'a str, &'a str, E> {
  alt((
    balanced('{', '}', "unterminated block, expected '}'"),
    balanced('(', ')', "unterminated block, expected ')'"),
  ))(i)
}

fn closing(open: char) -> char {
  if open == '(' {
    ')'
  } else {
    '}'
  }
}

fn line_at(whole: &str, rest: &str) -> usize {
  let offset = whole.len().saturating_sub(rest.len());
  whole[..offset].matches('\n').count() + 1
}

/// Skip to the next `@`, ignoring `%` line comments on the way.
fn skip_junk(i: &str) -> Option<&str> {
  let mut rest = i;
  loop {
    let at = rest.find(['@', '%'])?;
    if rest[at..].starts_with('@') {
      return Some(&rest[at..]);
    }
    rest = match rest[at..].find('\n') {
      Some(nl) => &rest[at + nl..],
      None => return None,
    };
  }
}

/**
Reads one or more bibliography sources into entries. Citation keys and
`@string` macros are shared between sources, so a key repeated in a second
file is still a duplicate.
*/
#[derive(Debug)]
pub struct BibParser {
  strings: HashMap<String, String>,
  seen: HashMap<String, Position>,
  entries: Vec<Entry>,
}

impl Default for BibParser {
  fn default() -> Self {
    Self::new()
  }
}

impl BibParser {
  pub fn new() -> Self {
    BibParser {
      strings: MONTHS
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect(),
      seen: HashMap::new(),
      entries: Vec::new(),
    }
  }

  /// Parse one source. `origin` only labels error positions.
  pub fn feed(&mut self, origin: &str, text: &str) -> Result<()> {
    let before = self.entries.len();
    let mut rest = text;
    while let Some(at) = skip_junk(rest) {
      let start = Position::new(origin, line_at(text, at));
      let (after, kind) = record_kind::<VerboseError<&str>>(at)
        .map_err(|e| self.malformed(origin, text, at, None, e))?;

      rest = match kind.to_lowercase().as_str() {
        "comment" => self.skip_comment(after),
        "preamble" => self.skip_group(origin, text, after)?,
        "string" => self.string_definition(origin, text, after)?,
        _ => self.record(origin, text, kind, after, start)?,
      };
    }
    info!(origin, entries = self.entries.len() - before, "parsed bibliography source");
    Ok(())
  }

  pub fn finish(self) -> Vec<Entry> {
    self.entries
  }

  /// `@comment` takes a whole group when one follows, otherwise the rest of the line.
  fn skip_comment<'a>(&self, i: &'a str) -> &'a str {
    let (trimmed, _) = sp::<VerboseError<&str>>(i).unwrap_or((i, ""));
    match group::<VerboseError<&str>>(trimmed) {
      Ok((rest, _)) => rest,
      Err(_) => trimmed.find('\n').map_or("", |nl| &trimmed[nl..]),
    }
  }

  fn skip_group<'a>(&self, origin: &str, text: &'a str, i: &'a str) -> Result<&'a str> {
    preceded(sp, group::<VerboseError<&str>>)(i)
      .map(|(rest, _)| rest)
      .map_err(|e| self.malformed(origin, text, i, None, e))
  }

  fn string_definition<'a>(&mut self, origin: &str, text: &'a str, i: &'a str) -> Result<&'a str> {
    let (i, (open, _)) = record_open::<VerboseError<&str>>(i)
      .map_err(|e| self.malformed(origin, text, i, None, e))?;
    let (rest, fields) = record_body::<VerboseError<&str>>(closing(open))(i)
      .map_err(|e| self.malformed(origin, text, i, None, e))?;
    let line = line_at(text, i);
    for (name, pieces) in fields {
      let resolved = self.resolve(&pieces, origin, line, None)?;
      self.strings.insert(name.to_lowercase(), resolved);
    }
    Ok(rest)
  }

  fn record<'a>(
    &mut self,
    origin: &str,
    text: &'a str,
    kind: &str,
    i: &'a str,
    start: Position,
  ) -> Result<&'a str> {
    let (i, (open, key)) = record_open::<VerboseError<&str>>(i)
      .map_err(|e| self.malformed(origin, text, i, None, e))?;
    let key = key.ok_or_else(|| Error::MalformedEntry {
      at: start.clone(),
      key: None,
      reason: "missing citation key".to_string(),
    })?;
    let (rest, fields) = record_body::<VerboseError<&str>>(closing(open))(i)
      .map_err(|e| self.malformed(origin, text, i, Some(key), e))?;

    let bibtype: BibType = kind.parse().map_err(|e: UnknownBibType| Error::MalformedEntry {
      at: start.clone(),
      key: Some(key.to_string()),
      reason: e.to_string(),
    })?;

    let mut map = BTreeMap::new();
    for (name, pieces) in fields {
      let name = normalize::field_name(name);
      let value = self.resolve(&pieces, origin, start.line, Some(key))?;
      if map.insert(name.clone(), normalize::collapse_wrapping(&value)).is_some() {
        return Err(Error::MalformedEntry {
          at: start,
          key: Some(key.to_string()),
          reason: format!("field '{name}' given more than once"),
        });
      }
    }

    if let Some(first) = self.seen.get(key) {
      return Err(Error::DuplicateKey {
        key: key.to_string(),
        at: start,
        first: first.clone(),
      });
    }
    self.seen.insert(key.to_string(), start.clone());

    debug!(key, %bibtype, line = start.line, "parsed entry");
    self.entries.push(Entry::new(key, bibtype, map, start));
    Ok(rest)
  }

  fn resolve(&self, pieces: &[Piece], origin: &str, line: usize, key: Option<&str>) -> Result<String> {
    let mut out = String::new();
    for p in pieces {
      match p {
        Piece::Text(t) => out.push_str(t),
        Piece::Macro(name) => match self.strings.get(&name.to_lowercase()) {
          Some(v) => out.push_str(v),
          None => {
            return Err(Error::MalformedEntry {
              at: Position::new(origin, line),
              key: key.map(str::to_string),
              reason: format!("undefined string macro '{name}'"),
            })
          }
        },
      }
    }
    Ok(out)
  }

  fn malformed<'a>(
    &self,
    origin: &str,
    text: &'a str,
    at: &'a str,
    key: Option<&str>,
    err: Err<VerboseError<&'a str>>,
  ) -> Error {
    let (where_, reason) = match err {
      Err::Error(e) | Err::Failure(e) => describe(&e, at),
      Err::Incomplete(_) => (at, "unexpected end of input".to_string()),
    };
    Error::MalformedEntry {
      at: Position::new(origin, line_at(text, where_)),
      key: key.map(str::to_string),
      reason,
    }
  }
}

/**
Pick the innermost context message (or the expected character) and the
input position where parsing stopped.
*/
fn describe<'a>(e: &VerboseError<&'a str>, fallback: &'a str) -> (&'a str, String) {
  let position = e.errors.first().map_or(fallback, |(i, _)| *i);
  let message = e
    .errors
    .iter()
    .find_map(|(_, kind)| match kind {
      VerboseErrorKind::Context(ctx) => Some(ctx.to_string()),
      _ => None,
    })
    .or_else(|| {
      e.errors.first().map(|(_, kind)| match kind {
        VerboseErrorKind::Char(c) => format!("expected '{c}'"),
        VerboseErrorKind::Nom(k) => format!("unexpected input ({})", k.description()),
        VerboseErrorKind::Context(ctx) => ctx.to_string(),
      })
    })
    .unwrap_or_else(|| "unexpected input".to_string());

  let near: String = position.lines().next().unwrap_or("").chars().take(24).collect();
  if near.trim().is_empty() {
    (position, message)
  } else {
    (position, format!("{message} near `{}`", near.trim()))
  }
}

/// Parse a single bibliography source.
pub fn parse_bibliography(text: &str) -> Result<Vec<Entry>> {
  let mut parser = BibParser::new();
  parser.feed("<input>", text)?;
  Ok(parser.finish())
}
