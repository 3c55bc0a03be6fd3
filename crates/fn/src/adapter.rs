//! Signature classification and argument binding.
//!
//! When a function is wrapped, [`classify`] checks its declared parameters against the
//! container's extractors and picks one of three binding strategies:
//!
//! | parameters                     | strategy               |
//! |--------------------------------|------------------------|
//! | none, or only `Context`        | [`Strategy::Plain`]    |
//! | a single `Json<T>`             | [`Strategy::Unary`]    |
//! | anything else                  | [`Strategy::Generic`]  |
//!
//! The chosen [`Adapter`] keeps the resolved slot of each position, so binding a request never
//! looks up the extractor registry again.

use crate::error::{FnError, SignatureError};
use crate::extract::{Extractors, ParamKind, ParamSpec, Params, Slot};
use crate::{Context, FnRequest};
use std::sync::Arc;

const CONTEXT_SLOTS: &[Slot] = &[Slot::Context];
const JSON_SLOTS: &[Slot] = &[Slot::Json];

/// The binding strategy of a wrapped function
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// no argument, or the context alone, the body is never read
    Plain,
    /// one custom type decoded from the JSON body
    Unary,
    /// several recognized parameters, bound position by position
    Generic,
}

#[derive(Debug, Clone)]
pub(crate) enum Adapter {
    Plain { in_context: bool },
    Unary,
    Generic { slots: Arc<[Slot]> },
}

impl Adapter {
    pub(crate) fn strategy(&self) -> Strategy {
        match self {
            Adapter::Plain { .. } => Strategy::Plain,
            Adapter::Unary => Strategy::Unary,
            Adapter::Generic { .. } => Strategy::Generic,
        }
    }

    /// Returns true if the request body must be buffered before binding
    #[inline]
    pub(crate) fn reads_body(&self) -> bool {
        !matches!(self, Adapter::Plain { .. })
    }

    #[inline]
    fn slots(&self) -> &[Slot] {
        match self {
            Adapter::Plain { in_context: false } => &[],
            Adapter::Plain { in_context: true } => CONTEXT_SLOTS,
            Adapter::Unary => JSON_SLOTS,
            Adapter::Generic { slots } => slots,
        }
    }

    #[inline]
    pub(crate) fn bind<Args: Params>(&self, ctx: &Context, req: &FnRequest) -> Result<Args, FnError> {
        Args::bind(self.slots(), ctx, req)
    }
}

/// Validates the declared parameters and derives the binding strategy
pub(crate) fn classify(specs: &[ParamSpec], extractors: &Extractors) -> Result<Adapter, SignatureError> {
    let mut custom_position = None;
    let mut slots = Vec::with_capacity(specs.len());

    for (position, spec) in specs.iter().enumerate() {
        let slot = match spec.kind {
            ParamKind::Context if position != 0 => return Err(SignatureError::ContextNotFirst { position }),
            ParamKind::Context => Slot::Context,
            ParamKind::Json => {
                if let Some(first) = custom_position {
                    return Err(SignatureError::MultipleCustom { first, second: position });
                }
                custom_position = Some(position);
                Slot::Json
            }
            ParamKind::Extracted => match extractors.get(spec.type_id) {
                Some(extractor) => Slot::Extractor(Arc::clone(extractor)),
                None => return Err(SignatureError::UnsupportedParam { position, type_name: spec.type_name }),
            },
        };
        slots.push(slot);
    }

    let adapter = match specs {
        [] => Adapter::Plain { in_context: false },
        [only] if only.kind == ParamKind::Context => Adapter::Plain { in_context: true },
        [only] if only.kind == ParamKind::Json => Adapter::Unary,
        _ => Adapter::Generic { slots: slots.into() },
    };
    Ok(adapter)
}

#[cfg(test)]
mod tests {
    use super::{classify, Adapter, Strategy};
    use crate::error::SignatureError;
    use crate::extract::{Extractors, Json, Param, Params, Slot};
    use crate::{Context, FnRequest};
    use bytes::Bytes;
    use http::{HeaderMap, Method, Request, Uri};
    use serde::Deserialize;

    #[derive(Deserialize, Debug, PartialEq)]
    struct LoginRequest {
        name: String,
    }

    #[derive(Deserialize, Debug)]
    struct Other {}

    struct Unregistered;

    impl Param for Unregistered {}

    fn classify_params<P: Params>() -> Result<Adapter, SignatureError> {
        classify(&P::specs(), &Extractors::builtin())
    }

    fn strategy<P: Params>() -> Strategy {
        classify_params::<P>().unwrap().strategy()
    }

    #[test]
    fn test_plain() {
        assert_eq!(strategy::<()>(), Strategy::Plain);
        assert_eq!(strategy::<(Context,)>(), Strategy::Plain);
        assert!(!classify_params::<(Context,)>().unwrap().reads_body());
    }

    #[test]
    fn test_unary() {
        assert_eq!(strategy::<(Json<LoginRequest>,)>(), Strategy::Unary);
    }

    #[test]
    fn test_generic() {
        assert_eq!(strategy::<(HeaderMap,)>(), Strategy::Generic);
        assert_eq!(strategy::<(Context, Json<LoginRequest>)>(), Strategy::Generic);
        assert_eq!(strategy::<(HeaderMap, Json<LoginRequest>, Uri)>(), Strategy::Generic);
        assert_eq!(strategy::<(Context, Method, HeaderMap)>(), Strategy::Generic);
    }

    #[test]
    fn test_generic_slots() {
        let adapter = classify_params::<(Context, HeaderMap, Json<LoginRequest>)>().unwrap();
        let Adapter::Generic { slots } = &adapter else { panic!("expect generic adapter") };

        assert!(matches!(slots[0], Slot::Context));
        assert!(matches!(slots[1], Slot::Extractor(_)));
        assert!(matches!(slots[2], Slot::Json));
    }

    #[test]
    fn test_context_must_be_first() {
        let err = classify_params::<(HeaderMap, Context)>().unwrap_err();
        assert_eq!(err, SignatureError::ContextNotFirst { position: 1 });
    }

    #[test]
    fn test_only_one_custom_type() {
        let err = classify_params::<(Json<LoginRequest>, HeaderMap, Json<Other>)>().unwrap_err();
        assert_eq!(err, SignatureError::MultipleCustom { first: 0, second: 2 });
    }

    #[test]
    fn test_unregistered_type() {
        let err = classify_params::<(Method, Unregistered)>().unwrap_err();
        assert!(matches!(err, SignatureError::UnsupportedParam { position: 1, .. }));

        let err = classify(&<(HeaderMap,)>::specs(), &Extractors::new()).unwrap_err();
        assert!(matches!(err, SignatureError::UnsupportedParam { position: 0, .. }));
    }

    #[test]
    fn test_bind_unary() {
        let adapter = classify_params::<(Json<LoginRequest>,)>().unwrap();
        let (parts, _) = Request::builder().body(()).unwrap().into_parts();
        let req = FnRequest::new(parts, Bytes::from_static(br#"{"name":"zava"}"#));

        let (Json(login),) = adapter.bind::<(Json<LoginRequest>,)>(&Context::new(), &req).unwrap();
        assert_eq!(login, LoginRequest { name: "zava".into() });
    }

    #[test]
    fn test_bind_plain_with_context() {
        let adapter = classify_params::<(Context,)>().unwrap();
        let (parts, _) = Request::builder().body(()).unwrap().into_parts();
        let req = FnRequest::new(parts, Bytes::new());

        let (ctx,) = adapter.bind::<(Context,)>(&Context::new().with_value(3i64), &req).unwrap();
        assert_eq!(ctx.get::<i64>(), Some(&3));
    }
}
