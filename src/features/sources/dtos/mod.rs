mod source_dto;

pub use source_dto::*;
