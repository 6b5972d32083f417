//! RFC 7807 problem detail error responses.

use axum::Json;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// An RFC 7807 problem details body.
///
/// Renders as `application/problem+json` with the standard `type`, `title`,
/// `status`, and `detail` members.
#[derive(Debug, Serialize)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub problem_type: &'static str,
    pub title: &'static str,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl IntoResponse for ProblemDetails {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (
            status,
            [(header::CONTENT_TYPE, "application/problem+json")],
            Json(self),
        )
            .into_response()
    }
}

fn problem(status: StatusCode, title: &'static str, detail: impl Into<String>) -> ProblemDetails {
    ProblemDetails {
        problem_type: "about:blank",
        title,
        status: status.as_u16(),
        detail: Some(detail.into()),
    }
}

pub fn bad_request(detail: impl Into<String>) -> ProblemDetails {
    problem(StatusCode::BAD_REQUEST, "Bad Request", detail)
}

pub fn not_found(detail: impl Into<String>) -> ProblemDetails {
    problem(StatusCode::NOT_FOUND, "Not Found", detail)
}

pub fn bad_gateway(detail: impl Into<String>) -> ProblemDetails {
    problem(StatusCode::BAD_GATEWAY, "Bad Gateway", detail)
}

pub fn internal_error(detail: impl Into<String>) -> ProblemDetails {
    problem(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error", detail)
}
