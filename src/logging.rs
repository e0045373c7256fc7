//! Middleware for logging requests and responses.

use axum::{
    body::{Body, Bytes, to_bytes},
    extract::Request,
    http::{header::CONTENT_TYPE, request, response},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::Error;

/// Bodies longer than this many bytes are truncated in the `info` logs.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// JSON fields whose values are replaced before a body is logged.
const REDACTED_FIELDS: [&str; 3] = ["password", "confirmPassword", "token"];

const REDACTED_TEXT: &str = "********";

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is
/// truncated and the full body is logged at the `debug` level.
/// Passwords and auth tokens in JSON bodies are redacted.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let Some(body) = buffer_body(body).await else {
        return Error::InvalidPayloadFormat("could not read the request body".to_owned())
            .into_response();
    };

    log_request(&parts, &display_text(&parts.headers, &body));

    let response = next.run(Request::from_parts(parts, Body::from(body))).await;

    let (parts, body) = response.into_parts();
    let Some(body) = buffer_body(body).await else {
        tracing::error!("could not read the response body");
        return Response::from_parts(parts, Body::empty());
    };

    log_response(&parts, &display_text(&parts.headers, &body));

    Response::from_parts(parts, Body::from(body))
}

async fn buffer_body(body: Body) -> Option<Bytes> {
    to_bytes(body, usize::MAX)
        .await
        .map_err(|error| tracing::error!("could not buffer body: {error}"))
        .ok()
}

fn display_text(headers: &axum::http::HeaderMap, body: &Bytes) -> String {
    let is_json = headers
        .get(CONTENT_TYPE)
        .and_then(|content_type| content_type.to_str().ok())
        .is_some_and(|content_type| content_type.starts_with("application/json"));

    if is_json {
        if let Ok(mut json) = serde_json::from_slice::<Value>(body) {
            redact(&mut json);
            return json.to_string();
        }
    }

    String::from_utf8_lossy(body).to_string()
}

/// Replace the values of [REDACTED_FIELDS] at any depth of `json`.
fn redact(json: &mut Value) {
    match json {
        Value::Object(object) => {
            for (key, value) in object.iter_mut() {
                if REDACTED_FIELDS.contains(&key.as_str()) {
                    *value = Value::from(REDACTED_TEXT);
                } else {
                    redact(value);
                }
            }
        }
        Value::Array(values) => values.iter_mut().for_each(redact),
        _ => {}
    }
}

/// Cut `text` to at most [LOG_BODY_LENGTH_LIMIT] bytes without splitting a character.
fn truncate(text: &str) -> &str {
    let mut end = LOG_BODY_LENGTH_LIMIT.min(text.len());
    while !text.is_char_boundary(end) {
        end -= 1;
    }

    &text[..end]
}

fn log_request(parts: &request::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Received request: {} {}\nbody: {}...",
            parts.method,
            parts.uri,
            truncate(body)
        );
        tracing::debug!("Full request body: {body:?}");
    } else {
        tracing::info!(
            "Received request: {} {}\nbody: {body:?}",
            parts.method,
            parts.uri
        );
    }
}

fn log_response(parts: &response::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Sending response: {}\nbody: {}...",
            parts.status,
            truncate(body)
        );
        tracing::debug!("Full response body: {body:?}");
    } else {
        tracing::info!("Sending response: {}\nbody: {body:?}", parts.status);
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        Json, Router,
        http::{HeaderMap, HeaderValue, header::CONTENT_TYPE},
        middleware,
        routing::post,
    };
    use axum_test::TestServer;
    use serde_json::{Value, json};

    use super::{LOG_BODY_LENGTH_LIMIT, display_text, logging_middleware, truncate};

    fn json_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    #[test]
    fn redacts_passwords_and_tokens() {
        let body = json!({
            "email": "jane@example.com",
            "password": "hunter2",
            "confirmPassword": "hunter2",
            "nested": [{"token": "abc.def.ghi"}],
        })
        .to_string();

        let text = display_text(&json_headers(), &body.into());

        assert!(!text.contains("hunter2"), "password not redacted: {text}");
        assert!(!text.contains("abc.def.ghi"), "token not redacted: {text}");
        assert!(text.contains("jane@example.com"));
    }

    #[test]
    fn leaves_non_json_bodies_alone() {
        let text = display_text(&HeaderMap::new(), &"password=hunter2".into());

        assert_eq!(text, "password=hunter2");
    }

    #[test]
    fn truncates_on_char_boundary() {
        let text = "é".repeat(LOG_BODY_LENGTH_LIMIT);

        let truncated = truncate(&text);

        assert!(truncated.len() <= LOG_BODY_LENGTH_LIMIT);
        assert!(truncated.chars().all(|c| c == 'é'));
    }

    async fn echo(Json(body): Json<Value>) -> Json<Value> {
        Json(body)
    }

    #[tokio::test]
    async fn passes_bodies_through_unchanged() {
        let app = Router::new()
            .route("/echo", post(echo))
            .layer(middleware::from_fn(logging_middleware));
        let server = TestServer::new(app).expect("Could not create test server.");
        let body = json!({ "password": "hunter2", "items": [1, 2, 3] });

        let response = server.post("/echo").json(&body).await;

        response.assert_status_ok();
        response.assert_json(&body);
    }
}
