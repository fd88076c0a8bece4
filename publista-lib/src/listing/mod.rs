/*!
Turns checked entries into an ordered, formatted listing.
*/

pub mod markup;
pub mod order;
pub mod page;
pub mod render;
pub mod rules;
pub mod sections;
pub mod template;

pub use markup::Markup;
pub use order::SortKey;
pub use render::{AttachmentProbe, NoAttachments, RenderedBlock, RenderedListing, Renderer};
pub use rules::{Requirement, RuleSet};
pub use sections::Sections;
