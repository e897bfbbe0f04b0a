use thiserror::Error;

#[derive(Error, Debug)]
pub enum QcError {
    #[error("failed to parse summary: {0}")]
    Parse(String),

    #[error("run id not present in summary: {0}")]
    UnknownRunId(String),

    #[error("duplicate read_id in selected run: {0}")]
    DuplicateKey(String),

    #[error("aggregation requires column not present in summary: {0}")]
    MissingField(&'static str),

    #[error("invalid bin range: {0}")]
    InvalidRange(String),
}
