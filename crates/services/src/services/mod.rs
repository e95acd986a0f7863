pub mod bilingual;
pub mod config;
pub mod database_validator;
pub mod digital_files;
pub mod language_model;
pub mod pricing;
pub mod translation;

#[cfg(test)]
pub(crate) mod test_support;
