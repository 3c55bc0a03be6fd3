//! Raw body extraction: [`Bytes`] as-is, [`String`] when the body is valid utf8.

use crate::error::FnError;
use crate::extract::{Extractors, Param};
use crate::{Context, FnRequest};
use bytes::Bytes;

impl Param for Bytes {}

impl Param for String {}

pub(super) fn register(extractors: &mut Extractors) {
    extractors.insert(|_ctx: &Context, req: &FnRequest| Ok::<_, FnError>(req.body().clone()));
    extractors.insert(|_ctx: &Context, req: &FnRequest| {
        // todo: using the content-type charset to decode
        String::from_utf8(req.body().to_vec()).map_err(|_| FnError::read_body("request body is not utf8"))
    });
}

#[cfg(test)]
mod tests {
    use crate::error::FnError;
    use crate::extract::{Extractors, Param, Slot};
    use crate::{Context, FnRequest};
    use bytes::Bytes;
    use http::Request;
    use std::any::TypeId;
    use std::sync::Arc;

    fn bind<T: Param>(body: Bytes) -> Result<T, FnError> {
        let extractors = Extractors::builtin();
        let slot = Slot::Extractor(Arc::clone(extractors.get(TypeId::of::<T>()).unwrap()));
        let (parts, _) = Request::builder().body(()).unwrap().into_parts();
        T::bind(&slot, &Context::new(), &FnRequest::new(parts, body))
    }

    #[test]
    fn test_bytes() {
        let bytes = bind::<Bytes>(Bytes::from_static(&[0xff, 0x01])).unwrap();
        assert_eq!(bytes, Bytes::from_static(&[0xff, 0x01]));
    }

    #[test]
    fn test_string() {
        assert_eq!(bind::<String>(Bytes::from_static(b"hello")).unwrap(), "hello");
        assert!(matches!(bind::<String>(Bytes::from_static(&[0xff])), Err(FnError::ReadBody { .. })));
    }
}
