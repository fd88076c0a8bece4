pub mod data;
pub mod normalize;
pub mod parser;
pub mod writer;

pub use data::{BibType, Entry, UnknownBibType};
pub use parser::{parse_bibliography, BibParser};
