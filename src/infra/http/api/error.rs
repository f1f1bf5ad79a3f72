use std::error::Error as StdError;

use crate::application::error::ErrorReport;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: &'static str,
}

pub mod codes {
    pub const BAD_REQUEST: &str = "bad_request";
    pub const NOT_FOUND: &str = "not_found";
    pub const VIEWS: &str = "views_error";
    pub const CONTENT: &str = "content_error";
}

/// JSON error with a fixed public message. The diagnostic detail only goes
/// to the response log.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: &'static str,
    report: ErrorReport,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        code: &'static str,
        message: &'static str,
        detail: Option<String>,
    ) -> Self {
        let report = ErrorReport::from_message(
            "infra::http::api",
            status,
            format!("{code}: {}", detail.as_deref().unwrap_or(message)),
        );
        Self {
            status,
            message,
            report,
        }
    }

    pub fn bad_request(message: &'static str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::BAD_REQUEST, message, None)
    }

    pub fn not_found(message: &'static str) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, message, None)
    }

    /// 500 carrying the full source chain of `error` in its report.
    pub fn internal(code: &'static str, message: &'static str, error: &dyn StdError) -> Self {
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        let mut report = ErrorReport::from_error("infra::http::api", status, error);
        if let Some(first) = report.messages.first_mut() {
            *first = format!("{code}: {first}");
        }
        Self {
            status,
            message,
            report,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: self.message,
        };
        let mut response = (self.status, Json(body)).into_response();
        self.report.attach(&mut response);
        response
    }
}
