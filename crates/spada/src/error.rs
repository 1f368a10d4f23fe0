#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Input file {0} not found")]
    InputNotFound(String),

    #[error("Glossary file {0} not found")]
    GlossaryNotFound(String),

    #[error("Invalid range: {0}")]
    InvalidRange(String),
}
