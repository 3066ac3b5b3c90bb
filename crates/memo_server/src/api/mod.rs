//! HTTP surface: response envelope, error mapping and route modules.

pub mod health;
pub mod memos;

use actix_web::error::{JsonPayloadError, QueryPayloadError};
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use memo_core::{MemoId, MemoServiceError};
use serde::Serialize;
use std::fmt::{Display, Formatter};

/// Uniform JSON envelope returned by every endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            error: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
            error: None,
        }
    }

    pub fn failure(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: None,
            error: Some(ErrorBody {
                code,
                message: message.into(),
            }),
        }
    }
}

/// Client-visible failure. Each variant owns one error code.
#[derive(Debug)]
pub enum ApiError {
    InvalidId(String),
    InvalidInput(String),
    NotFound(MemoId),
    /// Storage fault; carries the operation-level message shown to clients.
    Database(&'static str),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidId(_) => "INVALID_ID",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::NotFound(_) => "MEMO_NOT_FOUND",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Maps a service error, logging storage faults with their cause.
    pub fn from_service(err: MemoServiceError, operation: &'static str) -> Self {
        match err {
            MemoServiceError::InvalidInput(message) => Self::InvalidInput(message),
            MemoServiceError::NotFound(id) => Self::NotFound(id),
            MemoServiceError::Storage(cause) => {
                log::error!(
                    "event=api_storage_error module=api status=error operation=\"{}\" error={}",
                    operation,
                    cause
                );
                Self::Database(operation)
            }
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidId(raw) => write!(f, "invalid memo id: {raw}"),
            Self::InvalidInput(message) => write!(f, "{message}"),
            Self::NotFound(id) => write!(f, "memo {id} not found"),
            Self::Database(operation) => write!(f, "{operation}"),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidId(_) | Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .json(ApiResponse::failure(self.code(), self.to_string()))
    }
}

/// Malformed or non-JSON bodies answer with the same envelope as validation errors.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: JsonPayloadError, _req: &HttpRequest| {
        ApiError::InvalidInput(format!("invalid request body: {err}")).into()
    })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err: QueryPayloadError, _req: &HttpRequest| {
        ApiError::InvalidInput(format!("invalid query string: {err}")).into()
    })
}
