pub mod content;
mod fuzzy;
mod index;

pub use content::{ContentSearchDone, ContentSearchWorker, SearchMatch};
pub use index::TreeIndex;
