mod attribution;
mod source_formset;
mod source_listing;
mod source_service;

pub use attribution::union;
pub use source_service::SourceService;
