use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::llm::BackendError;

#[derive(Debug, thiserror::Error)]
pub enum DeskError {
    #[error("Connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("{entity} not found with ID: {id}")]
    TargetNotFound { entity: &'static str, id: String },
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl DeskError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::TargetNotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Renders the error and every `source()` below it, outermost first.
    pub fn stack(&self) -> String {
        let mut lines = vec![format!("{self}")];
        let mut current = std::error::Error::source(self);
        while let Some(cause) = current {
            lines.push(format!("caused by: {cause}"));
            current = cause.source();
        }
        lines.join("\n")
    }
}

/// A request-level failure turned into the 500 body the front end expects.
#[derive(Debug)]
pub struct FatalError {
    pub error: DeskError,
    pub details: &'static str,
    pub with_stack: bool,
}

impl FatalError {
    pub fn new(error: DeskError, details: &'static str) -> Self {
        Self {
            error,
            details,
            with_stack: false,
        }
    }

    pub fn with_stack(mut self) -> Self {
        self.with_stack = true;
        self
    }
}

impl IntoResponse for FatalError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "error": self.error.to_string(),
            "details": self.details,
        });
        if self.with_stack {
            body["stack"] = json!(self.error.stack());
        }
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_names_entity_and_id() {
        let err = DeskError::not_found("Article", "abc");
        assert_eq!(err.to_string(), "Article not found with ID: abc");
    }

    #[test]
    fn test_stack_includes_source_chain() {
        let err = DeskError::from(diesel::result::Error::NotFound);
        let stack = err.stack();
        assert!(stack.starts_with("Database error: Record not found"));
        assert!(stack.contains("caused by: Record not found"));
    }

    #[test]
    fn test_fatal_response_is_500() {
        let response = FatalError::new(DeskError::InvalidRequest("bad".into()), "Fatal error")
            .with_stack()
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
