mod source_handler;

pub use source_handler::*;
