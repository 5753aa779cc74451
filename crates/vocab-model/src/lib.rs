#![deny(unsafe_code)]

pub mod error;
pub mod lookup;
pub mod reference;
pub mod result;
pub mod table;

pub use error::{ModelError, Result};
pub use lookup::{ColumnLookup, column_key};
pub use reference::{IndexStats, ReferenceEntry, ReferenceIndex};
pub use result::{ConceptRef, MatchResult, MatchType, MatchedEntry, NOT_FOUND};
pub use table::Table;
