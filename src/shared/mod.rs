pub mod constants;
pub mod pagination;
pub mod query;
pub mod sorting;
#[cfg(test)]
pub mod test_helpers;
pub mod types;
pub mod validation;
