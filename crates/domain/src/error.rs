use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    /// Malformed caller input: blank names, out-of-range sampling
    /// fractions, verdicts from disabled judges.
    #[error("validation failed: {0}")]
    Validation(String),
    /// The referenced competitor, judge, vote or task does not exist.
    #[error("not found")]
    NotFound,
    /// A uniqueness rule was hit: duplicate competitor name, second
    /// human judge, reused identifier.
    #[error("conflict")]
    Conflict,
}
