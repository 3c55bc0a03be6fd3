//! Parameter types a wrapped function may declare, and the extractors producing them.
//!
//! Every parameter type implements [`Param`], which tells the classifier what kind of
//! parameter it is:
//! - [`ParamKind::Context`]: the request scoped [`Context`](crate::Context)
//! - [`ParamKind::Json`]: the custom type, decoded from the JSON body, see [`Json`]
//! - [`ParamKind::Extracted`]: anything produced by an extractor registered in the container
//!
//! The built-in extracted types are [`Bytes`](bytes::Bytes), [`String`],
//! [`Parts`](http::request::Parts), [`HeaderMap`](http::HeaderMap), [`Uri`](http::Uri),
//! [`Method`](http::Method), [`Version`](http::Version), [`Form`], [`PostForm`] and
//! [`Multipart`].

mod extract_body;
mod extract_form;
mod extract_header;
mod extract_multipart;
mod extract_tuple;
mod extract_url;
mod from_request;

pub use extract_form::{Form, PostForm};
pub use extract_multipart::{Multipart, MultipartError, Part};
pub use extract_tuple::Params;
pub use from_request::{Extractor, ExtractorFn, Extractors, Param, ParamKind, ParamSpec, Slot};

/// Represented as json data
///
/// The single custom type of a function. The whole request body is decoded as JSON into `T`,
/// note: `T` must impl [`serde::de::DeserializeOwned`] and [`Send`]
///
/// # Example
/// ```
/// # use serde::{Deserialize, Serialize};
/// # use micro_fn::extract::Json;
/// # #[allow(dead_code)]
/// #[derive(Deserialize, Debug)]
/// struct LoginRequest {
///     name: String,
///     password: String,
/// }
///
/// #[derive(Serialize)]
/// struct LoginResponse {
///     token: String,
/// }
///
/// pub async fn login(Json(req): Json<LoginRequest>) -> Result<LoginResponse, std::io::Error> {
///     Ok(LoginResponse { token: format!("token-of-{}", req.name) })
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}
