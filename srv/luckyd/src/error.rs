use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DrawError {
    #[error("Requested {requested} numbers but only {available} remain in the drum")]
    Capacity { requested: usize, available: i64 },

    #[error("{0}")]
    Service(String),

    #[error("A draw is already in progress")]
    InProgress,

    #[error("No draw is in progress")]
    NotDrawing,

    #[error("Reset must be confirmed")]
    ResetNotConfirmed,
}

pub type DrawResult<T> = Result<T, DrawError>;

impl ResponseError for DrawError {
    fn status_code(&self) -> StatusCode {
        match self {
            DrawError::Capacity { .. } | DrawError::ResetNotConfirmed => StatusCode::BAD_REQUEST,
            DrawError::Service(_) => StatusCode::BAD_GATEWAY,
            DrawError::InProgress | DrawError::NotDrawing => StatusCode::CONFLICT,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let capacity = DrawError::Capacity { requested: 5, available: 4 };
        assert_eq!(capacity.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(capacity.to_string(), "Requested 5 numbers but only 4 remain in the drum");
        assert_eq!(DrawError::Service("down".into()).status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(DrawError::InProgress.status_code(), StatusCode::CONFLICT);
        assert_eq!(DrawError::ResetNotConfirmed.status_code(), StatusCode::BAD_REQUEST);
    }
}
