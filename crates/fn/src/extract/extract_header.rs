use crate::extract::{Extractors, Param};
use crate::{Context, FnRequest};
use http::request::Parts;
use http::{HeaderMap, Method, Version};
use std::convert::Infallible;

impl Param for Parts {}

impl Param for HeaderMap {}

impl Param for Method {}

impl Param for Version {}

pub(super) fn register(extractors: &mut Extractors) {
    extractors
        .insert(|_ctx: &Context, req: &FnRequest| Ok::<_, Infallible>(req.parts().clone()))
        .insert(|_ctx: &Context, req: &FnRequest| Ok::<_, Infallible>(req.headers().clone()))
        .insert(|_ctx: &Context, req: &FnRequest| Ok::<_, Infallible>(req.method().clone()))
        .insert(|_ctx: &Context, req: &FnRequest| Ok::<_, Infallible>(req.version()));
}

#[cfg(test)]
mod tests {
    use crate::extract::{Extractors, Param, Slot};
    use crate::{Context, FnRequest};
    use bytes::Bytes;
    use http::request::Parts;
    use http::{HeaderMap, Method, Request, Version};
    use std::any::TypeId;
    use std::sync::Arc;

    fn bind<T: Param>(req: &FnRequest) -> T {
        let extractors = Extractors::builtin();
        let slot = Slot::Extractor(Arc::clone(extractors.get(TypeId::of::<T>()).unwrap()));
        T::bind(&slot, &Context::new(), req).unwrap()
    }

    #[test]
    fn test_request_line_and_headers() {
        let (parts, _) = Request::builder()
            .method(Method::DELETE)
            .version(Version::HTTP_11)
            .header("x-request-id", "42")
            .body(())
            .unwrap()
            .into_parts();
        let req = FnRequest::new(parts, Bytes::new());

        assert_eq!(bind::<Method>(&req), Method::DELETE);
        assert_eq!(bind::<Version>(&req), Version::HTTP_11);
        assert_eq!(bind::<HeaderMap>(&req).get("x-request-id").unwrap(), "42");
    }

    #[test]
    fn test_request_head() {
        let (parts, _) = Request::builder()
            .method(Method::PATCH)
            .uri("/users/7?fields=name")
            .header("x-request-id", "42")
            .body(())
            .unwrap()
            .into_parts();
        let req = FnRequest::new(parts, Bytes::new());

        let head = bind::<Parts>(&req);
        assert_eq!(head.method, Method::PATCH);
        assert_eq!(head.uri.query(), Some("fields=name"));
        assert_eq!(head.headers.get("x-request-id").unwrap(), "42");
    }
}
