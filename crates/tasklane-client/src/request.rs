//! Request and response values passed through the guard

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the API base URL
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body: Option<Value>,
    /// Set once the guard has replayed this request after a refresh
    pub(crate) retried: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn json(mut self, body: Value) -> Self {
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self.body = Some(body);
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Returns false and leaves the headers untouched when `value` is not a
    /// valid header value.
    pub fn set_header(&mut self, name: &HeaderName, value: &str) -> bool {
        match HeaderValue::from_str(value) {
            Ok(value) => {
                self.headers.insert(name.clone(), value);
                true
            }
            Err(_) => false,
        }
    }

    pub fn set_bearer(&mut self, token: &str) -> bool {
        self.set_header(&AUTHORIZATION, &format!("Bearer {}", token))
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn authorization(&self) -> Option<&str> {
        self.header_value(AUTHORIZATION.as_str())
    }

    pub fn is_retried(&self) -> bool {
        self.retried
    }
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    pub fn from_json(status: StatusCode, body: &Value) -> Self {
        let mut response = Self::new(status, body.to_string());
        response
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        response
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder() {
        let request = ApiRequest::post("/tasks")
            .query("project", "p-1")
            .json(json!({"title": "Write report"}));

        assert_eq!(request.method, Method::POST);
        assert_eq!(request.query, vec![("project".to_string(), "p-1".to_string())]);
        assert_eq!(request.header_value("content-type"), Some("application/json"));
        assert!(!request.is_retried());
    }

    #[test]
    fn test_set_bearer_replaces_previous_value() {
        let mut request = ApiRequest::get("/projects");
        assert!(request.set_bearer("T1"));
        assert!(request.set_bearer("T2"));
        assert_eq!(request.authorization(), Some("Bearer T2"));
        assert_eq!(request.headers.get_all(AUTHORIZATION).iter().count(), 1);
    }

    #[test]
    fn test_invalid_header_value_is_skipped() {
        let mut request = ApiRequest::get("/projects");
        assert!(!request.set_bearer("bad\ntoken"));
        assert_eq!(request.authorization(), None);
    }

    #[test]
    fn test_response_json() {
        let response = ApiResponse::from_json(StatusCode::OK, &json!({"id": 7}));
        assert!(response.is_success());
        let value: Value = response.json().unwrap();
        assert_eq!(value["id"], 7);
    }
}
