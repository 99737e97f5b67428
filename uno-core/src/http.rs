//! Request and response types handed to route handlers

use crate::{Error, Result};
use http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, LOCATION};
use http::{Method, StatusCode};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::ops::Deref;
use std::sync::Arc;

/// String key/value input (query string or form body).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields {
    values: HashMap<String, String>,
}

impl Fields {
    pub fn new(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    /// Parse `application/x-www-form-urlencoded` text. Later duplicates win.
    pub fn parse(encoded: &str) -> Result<Self> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(encoded)
            .map_err(|e| Error::Deserialization(e.to_string()))?;
        Ok(Self {
            values: pairs.into_iter().collect(),
        })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// The value for `key`, failing with [`Error::MissingInput`] when it is
    /// absent or empty.
    pub fn require(&self, key: &str) -> Result<&str> {
        match self.get(key) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(Error::MissingInput(key.to_string())),
        }
    }

    pub fn all(&self) -> &HashMap<String, String> {
        &self.values
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }
}

/// Query-string parameters (`query` capability).
#[derive(Debug, Clone, Default)]
pub struct Query(pub Fields);

impl Deref for Query {
    type Target = Fields;

    fn deref(&self) -> &Fields {
        &self.0
    }
}

/// Form-body parameters (`form` capability).
#[derive(Debug, Clone, Default)]
pub struct Form(pub Fields);

impl Deref for Form {
    type Target = Fields;

    fn deref(&self) -> &Fields {
        &self.0
    }
}

/// Unparsed request body (`rawpost` capability).
#[derive(Debug, Clone, Default)]
pub struct RawBody(pub String);

impl RawBody {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode the body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.0).map_err(|e| Error::Deserialization(e.to_string()))
    }
}

/// Incoming cookies plus the cookies queued for the response.
///
/// Clones share the outgoing queue.
#[derive(Debug, Clone, Default)]
pub struct Cookies {
    incoming: HashMap<String, String>,
    outgoing: Arc<Mutex<Vec<(String, String)>>>,
}

impl Cookies {
    pub fn new(incoming: HashMap<String, String>) -> Self {
        Self {
            incoming,
            outgoing: Arc::default(),
        }
    }

    /// Parse a `Cookie` header value (`a=1; b=2`).
    pub fn parse_header(header: &str) -> Self {
        let incoming = header
            .split(';')
            .filter_map(|pair| {
                let (name, value) = pair.split_once('=')?;
                let name = name.trim();
                (!name.is_empty()).then(|| (name.to_string(), value.trim().to_string()))
            })
            .collect();
        Self::new(incoming)
    }

    /// Cookie value, preferring one set during this request.
    pub fn get(&self, name: &str) -> Option<String> {
        let outgoing = self.outgoing.lock();
        outgoing
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
            .or_else(|| self.incoming.get(name).cloned())
    }

    pub fn all(&self) -> HashMap<String, String> {
        let mut all = self.incoming.clone();
        all.extend(self.outgoing.lock().iter().cloned());
        all
    }

    /// Queue a cookie to be sent with the response.
    pub fn set(&self, name: impl Into<String>, value: impl Into<String>) {
        self.outgoing.lock().push((name.into(), value.into()));
    }

    /// `Set-Cookie` values for every queued cookie, draining the queue.
    pub fn take_headers(&self) -> Vec<HeaderValue> {
        self.outgoing
            .lock()
            .drain(..)
            .filter_map(|(name, value)| {
                let encoded = serde_urlencoded::to_string([(name.as_str(), value.as_str())]).ok()?;
                HeaderValue::from_str(&format!("{encoded}; Path=/")).ok()
            })
            .collect()
    }
}

/// Session storage shared by every clone.
#[derive(Debug, Clone, Default)]
pub struct Session {
    values: Arc<RwLock<HashMap<String, Value>>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.values.read().get(key).cloned()
    }

    pub fn set<T: Serialize>(&self, key: impl Into<String>, value: T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.values.write().insert(key.into(), value);
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.values.write().remove(key)
    }

    pub fn all(&self) -> HashMap<String, Value> {
        self.values.read().clone()
    }

    pub fn clear(&self) {
        self.values.write().clear();
    }
}

/// An incoming request.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub query: Fields,
    pub form: Fields,
    pub cookies: Cookies,
    pub body: String,
    pub session: Session,
}

impl Request {
    /// Build a request from a method and a `path?query` uri.
    pub fn new(method: Method, uri: &str) -> Result<Self> {
        let (path, query) = match uri.split_once('?') {
            Some((path, query)) => (path, Fields::parse(query)?),
            None => (uri, Fields::default()),
        };
        Ok(Self {
            method,
            path: path.to_string(),
            query,
            form: Fields::default(),
            cookies: Cookies::default(),
            body: String::new(),
            session: Session::default(),
        })
    }

    pub fn get(uri: &str) -> Result<Self> {
        Self::new(Method::GET, uri)
    }

    /// A POST whose url-encoded `body` also fills the form fields.
    pub fn post(uri: &str, body: impl Into<String>) -> Result<Self> {
        let mut request = Self::new(Method::POST, uri)?;
        request.body = body.into();
        request.form = Fields::parse(&request.body)?;
        Ok(request)
    }

    pub fn with_cookies(mut self, cookies: Cookies) -> Self {
        self.cookies = cookies;
        self
    }

    pub fn with_session(mut self, session: Session) -> Self {
        self.session = session;
        self
    }

    /// Case-insensitive method comparison.
    pub fn is_method(&self, method: &str) -> bool {
        self.method.as_str().eq_ignore_ascii_case(method)
    }
}

impl Default for Request {
    fn default() -> Self {
        Self {
            method: Method::GET,
            path: "/".to_string(),
            query: Fields::default(),
            form: Fields::default(),
            cookies: Cookies::default(),
            body: String::new(),
            session: Session::default(),
        }
    }
}

/// A response produced by a handler or the error handler.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl Response {
    fn with_content_type(body: String, content_type: &'static str) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        Self {
            status: StatusCode::OK,
            headers,
            body,
        }
    }

    pub fn text(body: impl Into<String>) -> Self {
        Self::with_content_type(body.into(), "text/plain; charset=utf-8")
    }

    pub fn html(body: impl Into<String>) -> Self {
        Self::with_content_type(body.into(), "text/html; charset=utf-8")
    }

    /// JSON body. Slashes and non-ASCII characters are written as-is.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        let body = serde_json::to_string(value)?;
        Ok(Self::with_content_type(body, "application/json"))
    }

    /// `302 Found` pointing at `location`.
    pub fn redirect(location: &str) -> Result<Self> {
        let value = HeaderValue::from_str(location)
            .map_err(|_| Error::handler(format!("invalid redirect location: {location}")))?;
        let mut headers = HeaderMap::new();
        headers.insert(LOCATION, value);
        Ok(Self {
            status: StatusCode::FOUND,
            headers,
            body: String::new(),
        })
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_parses_query() {
        let request = Request::get("/search?q=rust+lang&page=2").unwrap();
        assert_eq!(request.path, "/search");
        assert_eq!(request.query.get("q"), Some("rust lang"));
        assert_eq!(request.query.get_or("limit", "10"), "10");
        assert!(request.is_method("get"));
    }

    #[test]
    fn test_post_fills_form() {
        let request = Request::post("/users", "name=ann&email=").unwrap();
        assert_eq!(request.form.require("name").unwrap(), "ann");
        assert!(matches!(
            request.form.require("email"),
            Err(Error::MissingInput(ref k)) if k == "email"
        ));
        assert!(request.form.require("missing").is_err());
        assert_eq!(request.body, "name=ann&email=");
    }

    #[test]
    fn test_cookies() {
        let cookies = Cookies::parse_header("theme=dark; sid=abc");
        assert_eq!(cookies.get("theme").as_deref(), Some("dark"));

        let shared = cookies.clone();
        shared.set("theme", "light");
        assert_eq!(cookies.get("theme").as_deref(), Some("light"));

        let headers = cookies.take_headers();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[0], "theme=light; Path=/");
        assert!(cookies.take_headers().is_empty());
    }

    #[test]
    fn test_session_is_shared() {
        let session = Session::new();
        let other = session.clone();
        session.set("user", json!({"id": 1})).unwrap();
        assert_eq!(other.get("user"), Some(json!({"id": 1})));
        assert!(other.remove("user").is_some());
        assert!(session.get("user").is_none());
    }

    #[test]
    fn test_json_response_keeps_slashes_and_unicode() {
        let response = Response::json(&json!({"url": "a/b", "name": "Zoë"})).unwrap();
        assert_eq!(response.body, r#"{"name":"Zoë","url":"a/b"}"#);
        assert_eq!(response.content_type(), Some("application/json"));
    }

    #[test]
    fn test_redirect() {
        let response = Response::redirect("/login").unwrap();
        assert_eq!(response.status_code(), 302);
        assert_eq!(response.headers[LOCATION], "/login");
        assert!(Response::redirect("bad\nlocation").is_err());
    }
}
