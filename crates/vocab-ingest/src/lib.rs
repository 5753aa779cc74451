#![deny(unsafe_code)]

pub mod error;
pub mod reader;
pub mod writer;

pub use error::IngestError;
pub use reader::{infer_delimiter, parse_delimiter, read_table, read_table_from};
pub use writer::{RESULT_COLUMNS, write_results, write_results_to};
