mod import_job;

pub use import_job::{ImportJob, ImportJobStatus};
