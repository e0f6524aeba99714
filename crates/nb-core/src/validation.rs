use crate::error::RequestError;

pub fn validate_request_fields(title: &str, description: &str) -> Result<(), RequestError> {
    if title.trim().is_empty() {
        return Err(RequestError::InvalidInput {
            message: "title is required".to_string(),
        });
    }
    if description.trim().is_empty() {
        return Err(RequestError::InvalidInput {
            message: "description is required".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_non_empty_fields() {
        assert!(validate_request_fields("Fix fence", "Broken fence panel").is_ok());
    }

    #[test]
    fn rejects_empty_title() {
        let err = validate_request_fields("", "Broken fence panel").unwrap_err();
        assert!(matches!(err, RequestError::InvalidInput { .. }));
    }

    #[test]
    fn rejects_whitespace_description() {
        let err = validate_request_fields("Fix fence", "   ").unwrap_err();
        assert!(matches!(err, RequestError::InvalidInput { .. }));
    }
}
