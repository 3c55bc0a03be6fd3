//! Request scoped context.
//!
//! A [`Context`] travels through the plugins of a request and may be received by the wrapped
//! function as its first parameter. Values are keyed by their type.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// An immutable, type keyed bag of values.
///
/// Cloning is cheap. Adding a value returns a new context and leaves the old one untouched.
///
/// # Example
/// ```
/// use micro_fn::Context;
///
/// #[derive(Debug, PartialEq)]
/// struct UserId(u64);
///
/// let ctx = Context::new().with_value(UserId(7));
/// assert_eq!(ctx.get::<UserId>(), Some(&UserId(7)));
/// ```
#[derive(Clone, Default)]
pub struct Context {
    values: Arc<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a context which also carries `value`, replacing any previous value of type `T`
    pub fn with_value<T: Send + Sync + 'static>(self, value: T) -> Self {
        let mut values = Arc::unwrap_or_clone(self.values);
        values.insert(TypeId::of::<T>(), Arc::new(value));
        Self { values: Arc::new(values) }
    }

    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.values.get(&TypeId::of::<T>()).and_then(|value| value.downcast_ref::<T>())
    }

    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.values.contains_key(&TypeId::of::<T>())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context").field("len", &self.values.len()).finish()
    }
}
