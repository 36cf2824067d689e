pub use crate::element_line::{
    check_element_line, check_element_pair, epoch, ElementLine, LineError, LineNumber,
};
pub use crate::parser::parse_element_set;

pub mod element_line;
pub mod parser;

/// Columns in a well-formed element line, checksum included
pub const LINE_LENGTH: usize = 69;
pub const LINE_DELIMITER: char = '\n';
