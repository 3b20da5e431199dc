use actix_web::http::StatusCode;
use actix_web::{HttpResponse, HttpResponseBuilder};
use serde::Serialize;

use crate::types::response::CommonResponse;

pub const TOKEN_ERROR: &str = "Generate token failed";

/// A wrapper struct for HTTP responses that provides convenient methods
/// for creating common response types
pub struct Response {
    http_response: HttpResponse,
}

impl Response {
    pub fn not_found(message: impl AsRef<str>) -> Self {
        Self::err_response(StatusCode::NOT_FOUND, message.as_ref().to_string())
    }

    pub fn bad_request(message: impl AsRef<str>) -> Self {
        let message = format!("Bad request: {}", message.as_ref());
        Self::err_response(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthenticated(message: impl AsRef<str>) -> Self {
        let message = format!("Unauthenticated: {}", message.as_ref());
        let mut resp = Self::err_response(StatusCode::UNAUTHORIZED, message);
        if let Ok(value) = "Basic realm=\"regauth\"".parse() {
            resp.http_response
                .headers_mut()
                .insert(actix_web::http::header::WWW_AUTHENTICATE, value);
        }
        resp
    }

    pub fn error(message: &str) -> Self {
        let message = format!("Server error: {message}");
        Self::err_response(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn json<T: Serialize>(data: T) -> Self {
        Self {
            http_response: HttpResponse::Ok().json(data),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.http_response.status()
    }

    fn err_response(status: StatusCode, message: String) -> Self {
        let resp = CommonResponse {
            code: status.into(),
            message: Some(message),
        };
        Self {
            http_response: HttpResponseBuilder::new(status).json(resp),
        }
    }
}

impl From<Response> for HttpResponse {
    fn from(val: Response) -> Self {
        val.http_response
    }
}
