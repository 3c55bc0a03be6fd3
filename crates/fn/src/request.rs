//! The request as seen by plugins and extractors.
//!
//! [`FnRequest`] owns the request head and the buffered body. Form values are parsed lazily and
//! at most once per request, so several `Form` or `PostForm` parameters share one parse.

use crate::container::Limits;
use crate::extract::{Form, PostForm};
use bytes::Bytes;
use http::request::Parts;
use http::{Extensions, HeaderMap, Method, Uri, Version};
use mime::Mime;
use once_cell::sync::OnceCell;
use tracing::debug;

#[derive(Debug)]
pub struct FnRequest {
    parts: Parts,
    body: Bytes,
    limits: Limits,
    post_form: OnceCell<ParsedPostForm>,
    form: OnceCell<Form>,
}

#[derive(Debug)]
struct ParsedPostForm {
    form: PostForm,
    malformed: bool,
}

impl FnRequest {
    pub fn new(parts: Parts, body: Bytes) -> Self {
        Self { parts, body, limits: Limits::default(), post_form: OnceCell::new(), form: OnceCell::new() }
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Returns the limits of the container which wrapped the handling function
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Returns the HTTP method of the request
    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    /// Returns the URI of the request
    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    /// Returns the HTTP version of the request
    pub fn version(&self) -> Version {
        self.parts.version
    }

    /// Returns the HTTP headers of the request
    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    pub fn extensions(&self) -> &Extensions {
        &self.parts.extensions
    }

    /// Returns the buffered body, empty when the handler never reads bodies
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the parsed `Content-Type` header, if present and well formed
    pub fn content_type(&self) -> Option<Mime> {
        self.headers()
            .get(http::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<Mime>().ok())
    }

    /// Returns the request head
    pub fn parts(&self) -> &Parts {
        &self.parts
    }

    /// Form values from an urlencoded body
    ///
    /// Only POST, PUT and PATCH requests with an `application/x-www-form-urlencoded` body carry
    /// a post form, every other request gets an empty one. A malformed body gives an empty form.
    pub fn post_form(&self) -> &PostForm {
        &self.parsed_post_form().form
    }

    /// Post form values followed by the URL query values
    ///
    /// The form is empty when either the body or the query is malformed.
    pub fn form(&self) -> &Form {
        self.form.get_or_init(|| {
            let parsed = self.parsed_post_form();
            if parsed.malformed {
                return Form::default();
            }
            let mut pairs = parsed.form.pairs().to_vec();
            if let Some(query) = self.uri().query() {
                match parse_pairs(query.as_bytes()) {
                    Some(query_pairs) => pairs.extend(query_pairs),
                    None => return Form::default(),
                }
            }
            Form::from(pairs)
        })
    }

    fn parsed_post_form(&self) -> &ParsedPostForm {
        self.post_form.get_or_init(|| {
            let empty = |malformed| ParsedPostForm { form: PostForm::default(), malformed };
            if !matches!(*self.method(), Method::POST | Method::PUT | Method::PATCH) {
                return empty(false);
            }
            let urlencoded = self
                .content_type()
                .is_some_and(|mime| mime.essence_str() == mime::APPLICATION_WWW_FORM_URLENCODED.essence_str());
            if !urlencoded {
                return empty(false);
            }
            match parse_pairs(&self.body) {
                Some(pairs) => ParsedPostForm { form: PostForm::from(pairs), malformed: false },
                None => empty(true),
            }
        })
    }
}

/// Parses urlencoded pairs, `None` when the input is malformed
fn parse_pairs(input: &[u8]) -> Option<Vec<(String, String)>> {
    if !is_well_formed(input) {
        debug!("ignore malformed form");
        return None;
    }
    match serde_urlencoded::from_bytes::<Vec<(String, String)>>(input) {
        Ok(pairs) => Some(pairs),
        Err(e) => {
            debug!(cause = %e, "ignore malformed form");
            None
        }
    }
}

/// Every percent escape has two hex digits and every decoded segment is utf8
fn is_well_formed(input: &[u8]) -> bool {
    input.split(|b| *b == b'&').all(|segment| {
        let mut decoded = Vec::with_capacity(segment.len());
        let mut bytes = segment.iter().copied();
        while let Some(b) = bytes.next() {
            match b {
                b'%' => {
                    let (Some(high), Some(low)) = (bytes.next().and_then(hex), bytes.next().and_then(hex)) else {
                        return false;
                    };
                    decoded.push((high << 4) | low);
                }
                b'+' => decoded.push(b' '),
                other => decoded.push(other),
            }
        }
        std::str::from_utf8(&decoded).is_ok()
    })
}

fn hex(b: u8) -> Option<u8> {
    char::from(b).to_digit(16).and_then(|d| u8::try_from(d).ok())
}

#[cfg(test)]
mod tests {
    use super::FnRequest;
    use bytes::Bytes;
    use http::{Method, Request};

    fn request(method: Method, uri: &str, content_type: Option<&str>, body: &'static str) -> FnRequest {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(content_type) = content_type {
            builder = builder.header(http::header::CONTENT_TYPE, content_type);
        }
        let (parts, _) = builder.body(()).unwrap().into_parts();
        FnRequest::new(parts, Bytes::from_static(body.as_bytes()))
    }

    #[test]
    fn test_accessors() {
        let req = request(Method::POST, "/login?next=%2Fhome", Some("application/json"), "{}");

        assert_eq!(*req.method(), Method::POST);
        assert_eq!(req.uri().path(), "/login");
        assert_eq!(req.body().as_ref(), b"{}");
        assert_eq!(req.content_type().unwrap().essence_str(), "application/json");
    }

    #[test]
    fn test_post_form() {
        let req = request(Method::POST, "/?a=3", Some("application/x-www-form-urlencoded; charset=utf-8"), "a=1&b=2");

        assert_eq!(req.post_form().get("a"), Some("1"));
        assert_eq!(req.post_form().get("b"), Some("2"));
        assert_eq!(req.post_form().len(), 2);
    }

    #[test]
    fn test_form_merges_body_then_query() {
        let req = request(Method::PUT, "/?a=3&c=4", Some("application/x-www-form-urlencoded"), "a=1&b=2");

        let form = req.form();
        assert_eq!(form.get_all("a").collect::<Vec<_>>(), vec!["1", "3"]);
        assert_eq!(form.get("a"), Some("1"));
        assert_eq!(form.get("c"), Some("4"));
        assert_eq!(form.len(), 4);
    }

    #[test]
    fn test_get_request_has_no_post_form() {
        let req = request(Method::GET, "/?q=rust", Some("application/x-www-form-urlencoded"), "a=1");

        assert!(req.post_form().is_empty());
        assert_eq!(req.form().get("q"), Some("rust"));
        assert!(!req.form().contains_key("a"));
    }

    #[test]
    fn test_json_body_is_not_a_form() {
        let req = request(Method::POST, "/", Some("application/json"), "a=1");
        assert!(req.post_form().is_empty());
    }

    #[test]
    fn test_malformed_body_gives_empty_form() {
        let req = request(Method::POST, "/s?q=rust&x=1", Some("application/x-www-form-urlencoded"), "a=%ff%fe&b=%");

        assert!(req.post_form().is_empty());
        assert!(req.form().is_empty());
    }

    #[test]
    fn test_malformed_query_gives_empty_form() {
        let req = request(Method::POST, "/s?q=%zz&x=1", Some("application/x-www-form-urlencoded"), "a=1");

        assert_eq!(req.post_form().get("a"), Some("1"));
        assert!(req.form().is_empty());
    }

    #[test]
    fn test_escaped_values() {
        let req = request(Method::GET, "/s?q=micro+fn&path=%2Fhome%20dir&name=%E4%BD%A0", None, "");

        assert_eq!(req.form().get("q"), Some("micro fn"));
        assert_eq!(req.form().get("path"), Some("/home dir"));
        assert_eq!(req.form().get("name"), Some("\u{4f60}"));
    }

    #[test]
    fn test_parts() {
        let req = request(Method::DELETE, "/users/7", None, "");
        assert_eq!(req.parts().method, Method::DELETE);
        assert_eq!(req.parts().uri.path(), "/users/7");
    }

    #[test]
    fn test_empty_body_is_empty_form() {
        let req = request(Method::POST, "/", Some("application/x-www-form-urlencoded"), "");
        assert!(req.form().is_empty());
    }
}
