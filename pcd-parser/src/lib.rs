pub mod error;
pub mod parsers;
pub mod tree_id;

pub use error::ParseError;
