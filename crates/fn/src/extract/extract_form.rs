//! Form values extraction
//!
//! [`Form`] holds the urlencoded body values followed by the URL query values, [`PostForm`] holds
//! the body values only. Both keep every value of a repeated key, in request order.
//!
//! # Example
//! ```no_run
//! # use serde::Deserialize;
//! # use micro_fn::extract::Form;
//!
//! #[derive(Deserialize)]
//! struct Search {
//!     q: String,
//!     page: Option<u32>,
//! }
//!
//! async fn search(form: Form) -> Result<String, micro_fn::BoxError> {
//!     let search: Search = form.deserialize()?;
//!     Ok(format!("{} page {}", search.q, search.page.unwrap_or(1)))
//! }
//! ```

use crate::extract::{Extractors, Param};
use crate::{Context, FnRequest};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::convert::Infallible;

/// Multi valued form fields, kept in request order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Values {
    pairs: Vec<(String, String)>,
}

impl Values {
    fn get(&self, key: &str) -> Option<&str> {
        self.pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs.iter().filter(move |(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// Decodes the first value of every key, the same value `get` returns
    fn deserialize<T: DeserializeOwned>(&self) -> Result<T, serde_urlencoded::de::Error> {
        let mut seen = HashSet::new();
        let firsts = self
            .pairs
            .iter()
            .filter(|(k, _)| seen.insert(k.as_str()))
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect::<Vec<_>>();
        let encoded = serde_urlencoded::to_string(&firsts)
            .map_err(|e| <serde_urlencoded::de::Error as serde::de::Error>::custom(e.to_string()))?;
        serde_urlencoded::from_str(&encoded)
    }
}

macro_rules! form_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct $name {
            values: Values,
        }

        impl $name {
            /// Returns the first value of `key`
            pub fn get(&self, key: &str) -> Option<&str> {
                self.values.get(key)
            }

            /// Returns every value of `key`
            pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
                self.values.get_all(key)
            }

            pub fn contains_key(&self, key: &str) -> bool {
                self.values.get(key).is_some()
            }

            pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
                self.values.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
            }

            pub fn pairs(&self) -> &[(String, String)] {
                &self.values.pairs
            }

            #[inline]
            pub fn len(&self) -> usize {
                self.values.pairs.len()
            }

            #[inline]
            pub fn is_empty(&self) -> bool {
                self.values.pairs.is_empty()
            }

            /// Decodes the values into `T`
            pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, serde_urlencoded::de::Error> {
                self.values.deserialize()
            }
        }

        impl From<Vec<(String, String)>> for $name {
            fn from(pairs: Vec<(String, String)>) -> Self {
                Self { values: Values { pairs } }
            }
        }

        impl Param for $name {}
    };
}

form_type! {
    /// Post form values followed by the URL query values
    Form
}

form_type! {
    /// Values of an `application/x-www-form-urlencoded` POST, PUT or PATCH body
    PostForm
}

pub(super) fn register(extractors: &mut Extractors) {
    extractors
        .insert(|_ctx: &Context, req: &FnRequest| Ok::<_, Infallible>(req.form().clone()))
        .insert(|_ctx: &Context, req: &FnRequest| Ok::<_, Infallible>(req.post_form().clone()));
}
