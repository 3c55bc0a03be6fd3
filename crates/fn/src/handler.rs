//! Wrapped functions as request handlers.
//!
//! Serving a request with a [`FnHandler`] goes through these steps:
//! 1. the seed [`Context`] is taken from the request extensions, or starts empty
//! 2. the body is buffered, up to the container's max body size, unless the function takes no
//!    request data at all and no plugin is registered
//! 3. the plugins run in order, the first error aborts the request
//! 4. the arguments are bound and the function is called
//! 5. the outcome is encoded as a JSON response
//!
//! A success payload serializing to `null` answers `204 No Content` with an empty body, any
//! other payload goes through the response encoder and answers `200 OK`. A failure answers the
//! status found in the error's source chain, `400 Bad Request` by default, with the output of
//! the error encoder as body. Every response is `application/json; charset=utf-8`.

use crate::adapter::{Adapter, Strategy};
use crate::body::{read_body, ResponseBody};
use crate::container::Container;
use crate::error::{status_code_of, BoxError, FnError};
use crate::extract::Params;
use crate::fn_trait::FnTrait;
use crate::plugin::Plugin;
use crate::{Context, FnRequest};
use async_trait::async_trait;
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderValue, Request, Response, StatusCode};
use http_body::Body as HttpBody;
use serde::Serialize;
use serde_json::Value;
use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, error, warn};

#[async_trait]
pub trait RequestHandler<ReqBody>: Send + Sync {
    async fn invoke(&self, req: Request<ReqBody>) -> Response<ResponseBody>;
}

/// a wrapped async function, bound to the container it was wrapped with
pub struct FnHandler<F, Args> {
    f: Arc<F>,
    container: Arc<Container>,
    adapter: Adapter,
    _phantom: PhantomData<fn(Args)>,
}

impl<F, Args> FnHandler<F, Args> {
    pub(crate) fn new(f: F, container: Arc<Container>, adapter: Adapter) -> Self {
        Self { f: Arc::new(f), container, adapter, _phantom: PhantomData }
    }

    pub fn strategy(&self) -> Strategy {
        self.adapter.strategy()
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Returns a copy of this handler running one more plugin, after the inherited ones.
    ///
    /// The original handler is left untouched.
    pub fn plugin<P: Plugin + 'static>(&self, plugin: P) -> Self {
        let mut container = Container::clone(&self.container);
        container.plugin(plugin);
        Self { f: Arc::clone(&self.f), container: Arc::new(container), adapter: self.adapter.clone(), _phantom: PhantomData }
    }
}

impl<F, Args> Clone for FnHandler<F, Args> {
    fn clone(&self) -> Self {
        Self {
            f: Arc::clone(&self.f),
            container: Arc::clone(&self.container),
            adapter: self.adapter.clone(),
            _phantom: PhantomData,
        }
    }
}

impl<F, Args> fmt::Debug for FnHandler<F, Args> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler")
            .field("function", &type_name::<F>())
            .field("strategy", &self.adapter.strategy())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<F, Args, T, E, ReqBody> RequestHandler<ReqBody> for FnHandler<F, Args>
where
    F: FnTrait<Args, Output = Result<T, E>>,
    Args: Params,
    T: Serialize + Send,
    E: Into<BoxError> + Send,
    ReqBody: HttpBody + Send + 'static,
    ReqBody::Data: Send,
    ReqBody::Error: Into<BoxError>,
{
    async fn invoke(&self, req: Request<ReqBody>) -> Response<ResponseBody> {
        let (mut parts, body) = req.into_parts();
        let mut ctx = parts.extensions.remove::<Context>().unwrap_or_default();

        let body = if self.adapter.reads_body() || !self.container.plugins().is_empty() {
            match read_body(body, self.container.limits().get_max_body_size()).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    debug!(cause = %e, "read request body error");
                    return failure(&self.container, &ctx, e.into());
                }
            }
        } else {
            Bytes::new()
        };
        let req = FnRequest::new(parts, body).with_limits(*self.container.limits());

        for plugin in self.container.plugins() {
            match plugin.before(ctx.clone(), &req).await {
                Ok(next) => ctx = next,
                Err(e) => {
                    debug!(cause = %e, "plugin rejected request");
                    return failure(&self.container, &ctx, e);
                }
            }
        }

        let args = match self.adapter.bind::<Args>(&ctx, &req) {
            Ok(args) => args,
            Err(e) => {
                warn!(cause = ?e, function = type_name::<F>(), "bind arguments error");
                return failure(&self.container, &ctx, e.into());
            }
        };

        match self.f.call(args).await {
            Ok(payload) => success(&self.container, &ctx, &payload),
            Err(e) => failure(&self.container, &ctx, e.into()),
        }
    }
}

fn success<T: Serialize>(container: &Container, ctx: &Context, payload: &T) -> Response<ResponseBody> {
    let value = match serde_json::to_value(payload) {
        Ok(value) => value,
        Err(e) => {
            error!(cause = %e, payload = type_name::<T>(), "serialize payload error");
            return failure(container, ctx, FnError::encode(e).into());
        }
    };

    if value.is_null() {
        return json_response(StatusCode::NO_CONTENT, ResponseBody::empty());
    }

    let value = container.encode_response(ctx, value);
    encode(StatusCode::OK, &value)
}

fn failure(container: &Container, ctx: &Context, err: BoxError) -> Response<ResponseBody> {
    let status = status_code_of(err.as_ref()).unwrap_or(StatusCode::BAD_REQUEST);
    let value = container.encode_error(ctx, err.as_ref());
    encode(status, &value)
}

fn encode(status: StatusCode, value: &Value) -> Response<ResponseBody> {
    match serde_json::to_vec(value) {
        Ok(bytes) => json_response(status, ResponseBody::from(bytes)),
        Err(e) => {
            error!(cause = %e, "encode response body error");
            json_response(StatusCode::INTERNAL_SERVER_ERROR, ResponseBody::empty())
        }
    }
}

fn json_response(status: StatusCode, body: ResponseBody) -> Response<ResponseBody> {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    response.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static("application/json; charset=utf-8"));
    response
}
