//! The configuration shared by a group of wrapped functions.
//!
//! A [`Container`] holds:
//! - the ordered plugin list
//! - the extractor registry, which decides the recognized parameter types
//! - the response and error encoders
//! - the request [`Limits`]
//!
//! Wrapping a function snapshots the container, so later changes only affect functions wrapped
//! after them. A process wide default container backs the free functions [`wrap`], [`group`],
//! [`plugin`], [`request_plugin`], [`set_error_encoder`], [`set_response_encoder`],
//! [`set_max_body_size`] and [`set_max_multipart_fields`].

use crate::adapter::classify;
use crate::error::{BoxError, SignatureError};
use crate::extract::{Extractors, Param, Params};
use crate::fn_trait::FnTrait;
use crate::handler::FnHandler;
use crate::plugin::Plugin;
use crate::{Context, FnRequest};
use arc_swap::ArcSwap;
use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::Value;
use std::any::type_name;
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// The default max size of a buffered request body, 2 MiB
pub const DEFAULT_MAX_BODY_SIZE: usize = 2 * 1024 * 1024;

/// The default max number of parts in a multipart body
pub const DEFAULT_MAX_MULTIPART_FIELDS: usize = 100;

type ErrorEncoderFn = dyn Fn(&Context, &(dyn Error + Send + Sync + 'static)) -> Value + Send + Sync;
type ResponseEncoderFn = dyn Fn(&Context, Value) -> Value + Send + Sync;

/// Size limits applied while reading a request
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Limits {
    max_body_size: usize,
    max_multipart_fields: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self { max_body_size: DEFAULT_MAX_BODY_SIZE, max_multipart_fields: DEFAULT_MAX_MULTIPART_FIELDS }
    }
}

impl Limits {
    pub fn max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    pub fn max_multipart_fields(mut self, count: usize) -> Self {
        self.max_multipart_fields = count;
        self
    }

    pub fn get_max_body_size(&self) -> usize {
        self.max_body_size
    }

    pub fn get_max_multipart_fields(&self) -> usize {
        self.max_multipart_fields
    }
}

#[derive(Clone)]
pub struct Container {
    plugins: Vec<Arc<dyn Plugin>>,
    extractors: Extractors,
    error_encoder: Arc<ErrorEncoderFn>,
    response_encoder: Arc<ResponseEncoderFn>,
    limits: Limits,
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl Container {
    /// A container recognizing the built-in request parts
    pub fn new() -> Self {
        Self::with_extractors(Extractors::builtin())
    }

    /// A container without any extractor, only `Context` and `Json` parameters are accepted
    pub fn bare() -> Self {
        Self::with_extractors(Extractors::new())
    }

    fn with_extractors(extractors: Extractors) -> Self {
        Self {
            plugins: Vec::new(),
            extractors,
            error_encoder: Arc::new(default_error_encoder),
            response_encoder: Arc::new(default_response_encoder),
            limits: Limits::default(),
        }
    }

    /// Appends a plugin, it will run after the plugins already added
    pub fn plugin<P: Plugin + 'static>(&mut self, plugin: P) -> &mut Self {
        self.plugins.push(Arc::new(plugin));
        self
    }

    /// Registers `f` as the extractor of `T`, so wrapped functions may declare `T` parameters
    pub fn request_plugin<T, F, E>(&mut self, f: F) -> &mut Self
    where
        T: Param,
        F: Fn(&Context, &FnRequest) -> Result<T, E> + Send + Sync + 'static,
        E: Into<BoxError> + 'static,
    {
        self.extractors.insert(f);
        self
    }

    /// Sets how an error is turned into the JSON body of a failure response
    pub fn set_error_encoder<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&Context, &(dyn Error + Send + Sync + 'static)) -> Value + Send + Sync + 'static,
    {
        self.error_encoder = Arc::new(f);
        self
    }

    /// Sets how a serialized payload is turned into the JSON body of a success response
    pub fn set_response_encoder<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&Context, Value) -> Value + Send + Sync + 'static,
    {
        self.response_encoder = Arc::new(f);
        self
    }

    pub fn max_body_size(&mut self, size: usize) -> &mut Self {
        self.limits = self.limits.max_body_size(size);
        self
    }

    pub fn max_multipart_fields(&mut self, count: usize) -> &mut Self {
        self.limits = self.limits.max_multipart_fields(count);
        self
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn extractors(&self) -> &Extractors {
        &self.extractors
    }

    pub(crate) fn plugins(&self) -> &[Arc<dyn Plugin>] {
        &self.plugins
    }

    pub(crate) fn encode_error(&self, ctx: &Context, err: &(dyn Error + Send + Sync + 'static)) -> Value {
        (self.error_encoder)(ctx, err)
    }

    pub(crate) fn encode_response(&self, ctx: &Context, payload: Value) -> Value {
        (self.response_encoder)(ctx, payload)
    }

    /// Wraps `f` into a handler bound by this container's current configuration
    ///
    /// # Errors
    /// Returns a [`SignatureError`] when `Context` isn't the first parameter, when more than
    /// one `Json` parameter is declared, or when a parameter type has no extractor.
    pub fn wrap<F, Args, T, E>(&self, f: F) -> Result<FnHandler<F, Args>, SignatureError>
    where
        F: FnTrait<Args, Output = Result<T, E>>,
        Args: Params,
        T: Serialize,
        E: Into<BoxError>,
    {
        let specs = Args::specs();
        let adapter = classify(&specs, &self.extractors)?;
        debug!(function = type_name::<F>(), arity = specs.len(), strategy = ?adapter.strategy(), "wrap function");
        Ok(FnHandler::new(f, Arc::new(self.clone()), adapter))
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("plugins", &self.plugins.len())
            .field("extractors", &self.extractors)
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

fn default_error_encoder(_ctx: &Context, err: &(dyn Error + Send + Sync + 'static)) -> Value {
    Value::String(err.to_string())
}

fn default_response_encoder(_ctx: &Context, payload: Value) -> Value {
    payload
}

static GLOBAL_CONTAINER: Lazy<ArcSwap<Container>> = Lazy::new(|| ArcSwap::from_pointee(Container::new()));

fn update_global<F: Fn(&mut Container)>(f: F) {
    GLOBAL_CONTAINER.rcu(|current| {
        let mut container = Container::clone(current);
        f(&mut container);
        container
    });
}

/// Wraps `f` with the global container
pub fn wrap<F, Args, T, E>(f: F) -> Result<FnHandler<F, Args>, SignatureError>
where
    F: FnTrait<Args, Output = Result<T, E>>,
    Args: Params,
    T: Serialize,
    E: Into<BoxError>,
{
    GLOBAL_CONTAINER.load().wrap(f)
}

/// Returns a new container inheriting the global container's configuration
pub fn group() -> Container {
    Container::clone(&GLOBAL_CONTAINER.load())
}

/// Appends a plugin to the global container
pub fn plugin<P: Plugin + 'static>(plugin: P) {
    let plugin: Arc<dyn Plugin> = Arc::new(plugin);
    update_global(|container| container.plugins.push(Arc::clone(&plugin)));
}

/// Registers an extractor of `T` in the global container
pub fn request_plugin<T, F, E>(f: F)
where
    T: Param,
    F: Fn(&Context, &FnRequest) -> Result<T, E> + Send + Sync + 'static,
    E: Into<BoxError> + 'static,
{
    let mut extractors = Extractors::new();
    extractors.insert(f);
    update_global(|container| {
        container.extractors.extend(&extractors);
    });
}

pub fn set_error_encoder<F>(f: F)
where
    F: Fn(&Context, &(dyn Error + Send + Sync + 'static)) -> Value + Send + Sync + 'static,
{
    let encoder: Arc<ErrorEncoderFn> = Arc::new(f);
    update_global(|container| container.error_encoder = Arc::clone(&encoder));
}

pub fn set_response_encoder<F>(f: F)
where
    F: Fn(&Context, Value) -> Value + Send + Sync + 'static,
{
    let encoder: Arc<ResponseEncoderFn> = Arc::new(f);
    update_global(|container| container.response_encoder = Arc::clone(&encoder));
}

pub fn set_max_body_size(size: usize) {
    update_global(|container| {
        container.max_body_size(size);
    });
}

pub fn set_max_multipart_fields(count: usize) {
    update_global(|container| {
        container.max_multipart_fields(count);
    });
}
