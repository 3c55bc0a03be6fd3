//! URL extraction
//!
//! A function declaring an [`Uri`] parameter receives the request target as sent by the client,
//! path and query included. Typed query values are available through [`Form`](super::Form).

use crate::extract::{Extractors, Param};
use crate::{Context, FnRequest};
use http::Uri;
use std::convert::Infallible;

impl Param for Uri {}

pub(super) fn register(extractors: &mut Extractors) {
    extractors.insert(|_ctx: &Context, req: &FnRequest| Ok::<_, Infallible>(req.uri().clone()));
}

#[cfg(test)]
mod tests {
    use crate::extract::{Extractors, Param, Slot};
    use crate::{Context, FnRequest};
    use bytes::Bytes;
    use http::{Request, Uri};
    use std::any::TypeId;
    use std::sync::Arc;

    #[test]
    fn test_uri() {
        let extractors = Extractors::builtin();
        let slot = Slot::Extractor(Arc::clone(extractors.get(TypeId::of::<Uri>()).unwrap()));
        let (parts, _) = Request::builder().uri("/users/7?expand=true").body(()).unwrap().into_parts();

        let uri = Uri::bind(&slot, &Context::new(), &FnRequest::new(parts, Bytes::new())).unwrap();
        assert_eq!(uri.path(), "/users/7");
        assert_eq!(uri.query(), Some("expand=true"));
    }
}
