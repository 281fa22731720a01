use crate::error::{invalid_argument, Error, ServiceResult};
use axum::body::Bytes;
use axum::http::Method;
use serde::de::DeserializeOwned;
use std::collections::HashMap;

/// Reject methods not listed in `allowed` (comma separated, as sent in `Allow`)
pub fn require_method(method: &Method, allowed: &'static str) -> ServiceResult<()> {
    if allowed.split(',').any(|m| m.trim() == method.as_str()) {
        Ok(())
    } else {
        Err(Error::MethodNotAllowed {
            method: method.to_string(),
            allowed,
        })
    }
}

/// Parse a JSON body; an empty body reads as the default value
pub fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> ServiceResult<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }

    serde_json::from_slice(body).map_err(|e| invalid_argument(&format!("Invalid JSON body: {}", e)))
}

/// Decode the query string into a map; later duplicates win
pub fn query_params(raw: Option<&str>) -> HashMap<String, String> {
    raw.map(|query| {
        url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect()
    })
    .unwrap_or_default()
}
