mod author_dto;

pub use author_dto::*;
