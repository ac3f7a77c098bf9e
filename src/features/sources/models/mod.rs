mod feed;
mod saved_search;
mod source;

pub use feed::{Feed, FeedStatus};
pub use saved_search::SavedSearch;
pub use source::{Source, SourceEntry, SourceId, SourceKind};
