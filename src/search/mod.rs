//! Document search
//!
//! Filtered, paginated queries over active documents joined to their type
//! and entity. Filters are all-optional and conjunctive; an absent field
//! means "unconstrained", never "match null".

pub mod errors;
pub mod filter;
pub mod index;

pub use errors::{SearchError, SearchResult};
pub use filter::DocumentFilter;
pub use index::{SearchIndex, TypeStats};
