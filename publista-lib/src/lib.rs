/*!
Publication list bookkeeping: read BibTeX sources, check every record
against per-type field rules, and render a deterministic listing (HTML or
plain text) or a cleaned-up export of the database.

```
use publistalib::{build, Config, Layout, NoAttachments, OutputFormat, Source};

let src = Source::new("pubs.bib", "@misc{talk1, author = {Doe, Jane}, title = {A Talk}, year = 2020}");
let out = build(&[src], &Config::default(), &NoAttachments, OutputFormat::Text, Layout::Flat)?;
assert_eq!(out, "Doe, Jane (2020). A Talk.");
# Ok::<(), publistalib::Error>(())
```
*/

pub mod bibtex;
pub mod config;
pub mod error;
pub mod export;
pub mod listing;
pub mod pipeline;

pub use bibtex::{parse_bibliography, BibParser, BibType, Entry};
pub use config::Config;
pub use error::{Error, Position, Result};
pub use listing::{AttachmentProbe, Markup, NoAttachments, RenderedListing, Renderer};
pub use pipeline::{build, build_all, parse_sources, Layout, OutputFormat, Source};
