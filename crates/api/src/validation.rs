use crate::error::ApiError;
use validator::Validate;

/// Folds every `validator` field failure into one `validation_error`
/// response body.
pub fn validate<T: Validate>(value: &T) -> Result<(), ApiError> {
    value
        .validate()
        .map_err(|err| ApiError::Validation(err.to_string()))?;
    Ok(())
}
