// src/handlers.rs
use serde::Serialize;
use crate::error::{ApiError, ApiResult};

// ==================== COMMON STRUCTURES ====================

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn success_with_message(data: T, message: String) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message),
        }
    }
}

impl ApiResponse<()> {
    /// Success without a payload, e.g. after a delete
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
        }
    }
}

/// Parses a numeric path segment; anything else is a 400
pub fn parse_id(raw: &str, field: &str) -> ApiResult<i64> {
    match raw.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::invalid_id(field)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42", "lab id").unwrap(), 42);
        assert!(matches!(parse_id("abc", "lab id"), Err(ApiError::BadRequest(_))));
        assert!(matches!(parse_id("0", "lab id"), Err(ApiError::BadRequest(_))));
        assert!(matches!(parse_id("-3", "lab id"), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_envelope_shape() {
        let json = serde_json::to_value(ApiResponse::message("Lab deleted")).unwrap();
        assert_eq!(json["success"], true);
        assert!(json["data"].is_null());
        assert_eq!(json["message"], "Lab deleted");
    }
}
