//! Pre-invocation hooks.
//!
//! Plugins run in registration order before the arguments are bound. Each one receives the
//! context produced by the previous one; the first error aborts the request and becomes the
//! failure response.

use crate::error::BoxError;
use crate::{Context, FnRequest};
use async_trait::async_trait;
use std::fmt;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Runs before the arguments are bound, returning the context handed to the next plugin.
    ///
    /// `req` carries the buffered body, so `body()` and `post_form()` are available even when
    /// the wrapped function itself takes no request data.
    async fn before(&self, ctx: Context, req: &FnRequest) -> Result<Context, BoxError>;
}

/// a closure holder which represents a [`Plugin`]
pub struct PluginFn<F> {
    f: F,
}

/// Adapts a closure into a [`Plugin`]
///
/// # Example
/// ```
/// use micro_fn::{plugin_fn, Container, Context, FnRequest, StatusError};
///
/// struct ApiKey(String);
///
/// let mut container = Container::new();
/// container.plugin(plugin_fn(|ctx: Context, req: &FnRequest| {
///     match req.headers().get("x-api-key").and_then(|v| v.to_str().ok()) {
///         Some(key) => Ok(ctx.with_value(ApiKey(key.to_string()))),
///         None => Err(StatusError::unauthorized("missing api key")),
///     }
/// }));
/// ```
pub fn plugin_fn<F, E>(f: F) -> PluginFn<F>
where
    F: Fn(Context, &FnRequest) -> Result<Context, E> + Send + Sync,
    E: Into<BoxError>,
{
    PluginFn { f }
}

impl<F> fmt::Debug for PluginFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginFn").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F, E> Plugin for PluginFn<F>
where
    F: Fn(Context, &FnRequest) -> Result<Context, E> + Send + Sync,
    E: Into<BoxError>,
{
    async fn before(&self, ctx: Context, req: &FnRequest) -> Result<Context, BoxError> {
        (self.f)(ctx, req).map_err(Into::into)
    }
}
