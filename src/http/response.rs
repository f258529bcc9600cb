//! Response rendering.
//!
//! # Responsibilities
//! - Turn an engine [`Decision`] into bytes on the wire
//! - Redirects: status + Location, with a short HTML body for GET/HEAD
//! - Fixed responses: configured headers, status and body, verbatim
//! - Close: tell the server to drop the connection
//!
//! # Design Decisions
//! - Response bodies are fully buffered (`Full<Bytes>`); they are tiny
//! - HTTP/2 cannot drop a single stream silently, so Close becomes 500 there
//! - Configured headers that are not valid on the wire are skipped with a warning

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderName, HeaderValue, CONTENT_TYPE, LOCATION};
use hyper::{Method, Response, StatusCode, Version};

use crate::config::DefaultResponse;
use crate::routing::{Decision, Outcome};

pub type ResponseBody = Full<Bytes>;

/// What the connection should do with a decision.
#[derive(Debug)]
pub enum Rendered {
    Response(Response<ResponseBody>),
    /// Write nothing and close the connection.
    Close,
}

/// Returned from the service to make hyper abort an HTTP/1 connection.
#[derive(Debug, thiserror::Error)]
#[error("connection closed by configuration")]
pub struct CloseConnection;

/// Render `decision` for a request with the given method and protocol version.
pub fn render(decision: &Decision<'_>, method: &Method, version: Version) -> Rendered {
    match &decision.outcome {
        Outcome::Redirect { location } => {
            Rendered::Response(redirect(decision.code, location, method))
        }
        Outcome::Fixed(response) => Rendered::Response(fixed(response)),
        Outcome::Close if version == Version::HTTP_2 => {
            tracing::debug!("Cannot close a single HTTP/2 stream, answering 500");
            Rendered::Response(internal_error())
        }
        Outcome::Close => Rendered::Close,
    }
}

fn redirect(code: i64, location: &str, method: &Method) -> Response<ResponseBody> {
    let Some(status) = status_code(code) else {
        return internal_error();
    };
    let location_value = match HeaderValue::from_bytes(location.as_bytes()) {
        Ok(value) => value,
        Err(_) => {
            tracing::warn!(location, "Rewritten location is not a valid header value");
            return internal_error();
        }
    };

    let mut response = Response::new(ResponseBody::default());
    *response.status_mut() = status;
    response.headers_mut().insert(LOCATION, location_value);

    if method == Method::GET || method == Method::HEAD {
        let reason = status.canonical_reason().unwrap_or("");
        let body = format!("<a href=\"{}\">{}</a>.\n\n", html_escape(location), reason);
        response.headers_mut().insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/html; charset=utf-8"),
        );
        *response.body_mut() = Full::new(Bytes::from(body));
    }

    response
}

fn fixed(default: &DefaultResponse) -> Response<ResponseBody> {
    let Some(status) = status_code(default.code) else {
        return internal_error();
    };

    let mut response = Response::new(Full::new(Bytes::from(default.body.clone())));
    *response.status_mut() = status;

    let headers = response.headers_mut();
    for (name, value) in &default.headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.append(name, value);
            }
            _ => tracing::warn!(header = %name, "Skipping invalid configured header"),
        }
    }

    response
}

fn status_code(code: i64) -> Option<StatusCode> {
    let status = u16::try_from(code)
        .ok()
        .and_then(|code| StatusCode::from_u16(code).ok());
    if status.is_none() {
        tracing::warn!(code, "Configured status code cannot be sent");
    }
    status
}

fn internal_error() -> Response<ResponseBody> {
    let mut response = Response::new(ResponseBody::default());
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}

fn html_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
