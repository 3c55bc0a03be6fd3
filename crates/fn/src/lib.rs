//! Turns plain async functions into JSON HTTP handlers.
//!
//! A function is wrapped once by a [`Container`]. Its parameter list is checked at that time:
//! - an optional [`Context`] first
//! - at most one [`Json<T>`](extract::Json), decoded from the request body
//! - any number of types the container has an extractor for, such as `HeaderMap`, `Method`,
//!   [`Form`](extract::Form) or [`Multipart`](extract::Multipart)
//!
//! The function must return `Result<T, E>` with `T: Serialize`. The resulting [`FnHandler`]
//! serves `http::Request`s through [`RequestHandler::invoke`].
//!
//! ```
//! use micro_fn::extract::Json;
//! use micro_fn::{Container, RequestHandler, StatusError};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Deserialize)]
//! struct Login {
//!     name: String,
//! }
//!
//! #[derive(Serialize)]
//! struct Welcome {
//!     message: String,
//! }
//!
//! async fn login(Json(login): Json<Login>) -> Result<Welcome, StatusError> {
//!     Ok(Welcome { message: format!("welcome {}", login.name) })
//! }
//!
//! # async fn serve() {
//! let handler = Container::new().wrap(login).unwrap();
//! let request = http::Request::post("/login").body(http_body_util::Full::new(bytes::Bytes::from(r#"{"name":"zava"}"#))).unwrap();
//! let response = handler.invoke(request).await;
//! assert_eq!(response.status(), http::StatusCode::OK);
//! # }
//! ```

mod adapter;
mod body;
mod container;
mod context;
mod error;
mod fn_trait;
mod handler;
mod plugin;
mod request;

pub mod extract;

pub use adapter::Strategy;
pub use body::ResponseBody;
pub use container::{group, plugin, request_plugin, wrap};
pub use container::{set_error_encoder, set_max_body_size, set_max_multipart_fields, set_response_encoder};
pub use container::{Container, Limits, DEFAULT_MAX_BODY_SIZE, DEFAULT_MAX_MULTIPART_FIELDS};
pub use context::Context;
pub use error::{status_code_of, BoxError, FnError, SignatureError, StatusError};
pub use fn_trait::FnTrait;
pub use handler::{FnHandler, RequestHandler};
pub use plugin::{plugin_fn, Plugin, PluginFn};
pub use request::FnRequest;
