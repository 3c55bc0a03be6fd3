use crate::error::{BoxError, FnError};
use crate::extract::Json;
use crate::{Context, FnRequest};
use serde::de::DeserializeOwned;
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// How a parameter gets its value
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ParamKind {
    /// the request scoped context, only allowed as the first parameter
    Context,
    /// produced by an extractor registered in the container
    Extracted,
    /// decoded from the JSON body, at most one per function
    Json,
}

/// The description of one declared parameter, as seen by the classifier
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub kind: ParamKind,
    pub type_id: TypeId,
    pub type_name: &'static str,
}

impl ParamSpec {
    pub fn of<P: Param>() -> Self {
        P::spec()
    }
}

/// One position of a binding plan, resolved when the function is wrapped
#[derive(Clone)]
pub enum Slot {
    Context,
    Json,
    Extractor(Arc<dyn Extractor>),
}

impl Slot {
    /// Runs the slot's extractor and takes back a `T`
    pub fn extract<T: 'static>(&self, ctx: &Context, req: &FnRequest) -> Result<T, FnError> {
        let type_name = type_name::<T>();
        let Slot::Extractor(extractor) = self else {
            return Err(FnError::TypeMismatch { type_name });
        };

        let value = extractor.extract(ctx, req).map_err(|e| match e.downcast::<FnError>() {
            Ok(fn_error) => *fn_error,
            Err(e) => FnError::extract(type_name, e),
        })?;

        value.downcast::<T>().map(|value| *value).map_err(|_| FnError::TypeMismatch { type_name })
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Context => f.write_str("Context"),
            Slot::Json => f.write_str("Json"),
            Slot::Extractor(extractor) => f.debug_tuple("Extractor").field(&extractor.type_name()).finish(),
        }
    }
}

/// A type which can be declared as a parameter of a wrapped function.
///
/// The defaults describe an extracted parameter, so opting a type in only takes an empty impl
/// plus an extractor registered with [`Container::request_plugin`](crate::Container::request_plugin):
///
/// ```
/// use micro_fn::{Container, StatusError};
/// use micro_fn::extract::Param;
///
/// #[derive(Clone)]
/// struct Session {
///     user: String,
/// }
///
/// impl Param for Session {}
///
/// let mut container = Container::new();
/// container.request_plugin(|_ctx, req| {
///     let user = req.headers().get("x-user").and_then(|v| v.to_str().ok());
///     user.map(|user| Session { user: user.to_string() }).ok_or_else(|| StatusError::unauthorized("no session"))
/// });
/// ```
pub trait Param: Sized + Send + 'static {
    fn spec() -> ParamSpec {
        ParamSpec { kind: ParamKind::Extracted, type_id: TypeId::of::<Self>(), type_name: type_name::<Self>() }
    }

    fn bind(slot: &Slot, ctx: &Context, req: &FnRequest) -> Result<Self, FnError> {
        slot.extract::<Self>(ctx, req)
    }
}

impl Param for Context {
    fn spec() -> ParamSpec {
        ParamSpec { kind: ParamKind::Context, type_id: TypeId::of::<Self>(), type_name: type_name::<Self>() }
    }

    fn bind(_slot: &Slot, ctx: &Context, _req: &FnRequest) -> Result<Self, FnError> {
        Ok(ctx.clone())
    }
}

impl<T> Param for Json<T>
where
    T: DeserializeOwned + Send + 'static,
{
    fn spec() -> ParamSpec {
        ParamSpec { kind: ParamKind::Json, type_id: TypeId::of::<Self>(), type_name: type_name::<T>() }
    }

    fn bind(_slot: &Slot, _ctx: &Context, req: &FnRequest) -> Result<Self, FnError> {
        Ok(Json(serde_json::from_slice::<T>(req.body())?))
    }
}

/// An optional parameter: classified like `T`, binds to `None` when `T` fails to bind
impl<T: Param> Param for Option<T> {
    fn spec() -> ParamSpec {
        T::spec()
    }

    fn bind(slot: &Slot, ctx: &Context, req: &FnRequest) -> Result<Self, FnError> {
        Ok(T::bind(slot, ctx, req).ok())
    }
}

/// Produces one parameter value out of a request
pub trait Extractor: Send + Sync {
    fn extract(&self, ctx: &Context, req: &FnRequest) -> Result<Box<dyn Any + Send>, BoxError>;

    /// the name of the produced type, for diagnostics
    fn type_name(&self) -> &'static str;
}

/// a closure holder which represents an [`Extractor`] producing `T`
pub struct ExtractorFn<F, T> {
    f: F,
    _phantom: PhantomData<fn() -> T>,
}

impl<F, T> ExtractorFn<F, T> {
    pub fn new(f: F) -> Self {
        Self { f, _phantom: PhantomData }
    }
}

impl<F, T> fmt::Debug for ExtractorFn<F, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractorFn").field("type", &type_name::<T>()).finish()
    }
}

impl<F, T, E> Extractor for ExtractorFn<F, T>
where
    F: Fn(&Context, &FnRequest) -> Result<T, E> + Send + Sync,
    T: Send + 'static,
    E: Into<BoxError>,
{
    fn extract(&self, ctx: &Context, req: &FnRequest) -> Result<Box<dyn Any + Send>, BoxError> {
        match (self.f)(ctx, req) {
            Ok(value) => Ok(Box::new(value)),
            Err(e) => Err(e.into()),
        }
    }

    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }
}

/// The registry of extracted parameter types, keyed by type
#[derive(Clone, Default)]
pub struct Extractors {
    inner: HashMap<TypeId, Arc<dyn Extractor>>,
}

impl Extractors {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in request parts
    pub fn builtin() -> Self {
        let mut extractors = Self::new();
        super::extract_body::register(&mut extractors);
        super::extract_header::register(&mut extractors);
        super::extract_url::register(&mut extractors);
        super::extract_form::register(&mut extractors);
        super::extract_multipart::register(&mut extractors);
        extractors
    }

    /// Registers `f` as the extractor of `T`, replacing the previous one
    pub fn insert<T, F, E>(&mut self, f: F) -> &mut Self
    where
        T: Param,
        F: Fn(&Context, &FnRequest) -> Result<T, E> + Send + Sync + 'static,
        E: Into<BoxError> + 'static,
    {
        self.inner.insert(TypeId::of::<T>(), Arc::new(ExtractorFn::new(f)));
        self
    }

    /// Copies every extractor of `other` into this registry, replacing the same types
    pub fn extend(&mut self, other: &Extractors) -> &mut Self {
        self.inner.extend(other.inner.iter().map(|(type_id, extractor)| (*type_id, Arc::clone(extractor))));
        self
    }

    pub fn get(&self, type_id: TypeId) -> Option<&Arc<dyn Extractor>> {
        self.inner.get(&type_id)
    }

    pub fn contains(&self, type_id: TypeId) -> bool {
        self.inner.contains_key(&type_id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl fmt::Debug for Extractors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.inner.values().map(|extractor| extractor.type_name())).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StatusError;
    use bytes::Bytes;
    use http::{HeaderMap, Request, StatusCode};
    use serde::Deserialize;

    #[derive(Debug, PartialEq)]
    struct Tenant(String);

    impl Param for Tenant {}

    #[derive(Deserialize, Debug, PartialEq)]
    struct Login {
        name: String,
    }

    fn request(body: &'static str) -> FnRequest {
        let (parts, _) = Request::builder().header("x-tenant", "acme").body(()).unwrap().into_parts();
        FnRequest::new(parts, Bytes::from_static(body.as_bytes()))
    }

    fn tenant_extractors() -> Extractors {
        let mut extractors = Extractors::new();
        extractors.insert(|_ctx: &Context, req: &FnRequest| {
            req.headers()
                .get("x-tenant")
                .and_then(|v| v.to_str().ok())
                .map(|v| Tenant(v.to_string()))
                .ok_or_else(|| StatusError::forbidden("no tenant"))
        });
        extractors
    }

    #[test]
    fn test_specs() {
        assert_eq!(ParamSpec::of::<Context>().kind, ParamKind::Context);
        assert_eq!(ParamSpec::of::<Json<Login>>().kind, ParamKind::Json);
        assert_eq!(ParamSpec::of::<Tenant>().kind, ParamKind::Extracted);
        assert_eq!(ParamSpec::of::<HeaderMap>().type_id, TypeId::of::<HeaderMap>());
        assert_eq!(ParamSpec::of::<Option<Tenant>>(), ParamSpec::of::<Tenant>());
    }

    #[test]
    fn test_bind_extracted() {
        let extractors = tenant_extractors();
        let slot = Slot::Extractor(Arc::clone(extractors.get(TypeId::of::<Tenant>()).unwrap()));

        let tenant = Tenant::bind(&slot, &Context::new(), &request("")).unwrap();
        assert_eq!(tenant, Tenant("acme".into()));
    }

    #[test]
    fn test_bind_extracted_failure() {
        let extractors = tenant_extractors();
        let slot = Slot::Extractor(Arc::clone(extractors.get(TypeId::of::<Tenant>()).unwrap()));
        let (parts, _) = Request::builder().body(()).unwrap().into_parts();
        let req = FnRequest::new(parts, Bytes::new());

        let err = Tenant::bind(&slot, &Context::new(), &req).unwrap_err();
        assert!(matches!(err, FnError::Extract { .. }));
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);

        assert_eq!(Option::<Tenant>::bind(&slot, &Context::new(), &req).unwrap(), None);
    }

    #[test]
    fn test_bind_wrong_slot() {
        let err = Tenant::bind(&Slot::Json, &Context::new(), &request("")).unwrap_err();
        assert!(matches!(err, FnError::TypeMismatch { .. }));
    }

    #[test]
    fn test_bind_json() {
        let Json(login) = Json::<Login>::bind(&Slot::Json, &Context::new(), &request(r#"{"name":"zava"}"#)).unwrap();
        assert_eq!(login, Login { name: "zava".into() });

        let err = Json::<Login>::bind(&Slot::Json, &Context::new(), &request("")).unwrap_err();
        assert!(matches!(err, FnError::InvalidJson { .. }));
    }

    #[test]
    fn test_bind_context() {
        let ctx = Context::new().with_value(7u32);
        let bound = Context::bind(&Slot::Context, &ctx, &request("")).unwrap();
        assert_eq!(bound.get::<u32>(), Some(&7));
    }

    #[test]
    fn test_builtin_registry() {
        let extractors = Extractors::builtin();
        assert!(extractors.contains(TypeId::of::<HeaderMap>()));
        assert!(extractors.contains(TypeId::of::<Bytes>()));
        assert!(!extractors.contains(TypeId::of::<Tenant>()));
    }
}
