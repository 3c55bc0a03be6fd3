//! `multipart/form-data` extraction
//!
//! The body is already buffered when extractors run, so parts are parsed in one pass and every
//! part's data is a zero copy slice of the request body.

use crate::error::FnError;
use crate::extract::{Extractors, Param};
use crate::{Context, FnRequest};
use bytes::Bytes;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum MultipartError {
    #[error("content type is not multipart/form-data")]
    NotMultipart,

    #[error("missing boundary in multipart content type")]
    MissingBoundary,

    #[error("part number exceed the limit {max_num}")]
    TooManyParts { max_num: usize },

    #[error("missing content-disposition name of part")]
    MissingName,

    #[error("invalid part header: {reason}")]
    InvalidHeader { reason: String },

    #[error("unexpected end of multipart body")]
    UnexpectedEof,
}

impl MultipartError {
    fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidHeader { reason: str.to_string() }
    }
}

/// One part of a multipart body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub name: String,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl Part {
    /// Returns true if the part is an uploaded file
    pub fn is_file(&self) -> bool {
        self.filename.is_some()
    }

    /// Returns the data as text, `None` if it's not utf8
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.data).ok()
    }
}

/// A parsed `multipart/form-data` body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Multipart {
    parts: Vec<Part>,
}

impl Multipart {
    /// Parses the request body, using the boundary of its content type
    pub fn parse(req: &FnRequest) -> Result<Self, MultipartError> {
        let mime = req.content_type().ok_or(MultipartError::NotMultipart)?;
        if mime.type_() != mime::MULTIPART || mime.subtype() != mime::FORM_DATA {
            return Err(MultipartError::NotMultipart);
        }
        let boundary = mime.get_param(mime::BOUNDARY).ok_or(MultipartError::MissingBoundary)?;
        let boundary = boundary.as_str().trim_matches('"');
        if boundary.is_empty() {
            return Err(MultipartError::MissingBoundary);
        }
        let parts = parse_parts(req.body(), boundary, req.limits().get_max_multipart_fields())?;
        Ok(Self { parts })
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Returns the text value of the first non file part named `name`
    pub fn field(&self, name: &str) -> Option<&str> {
        self.parts.iter().find(|p| !p.is_file() && p.name == name).and_then(Part::text)
    }

    /// Returns the first file named `name`
    pub fn file(&self, name: &str) -> Option<&Part> {
        self.parts.iter().find(|p| p.is_file() && p.name == name)
    }

    /// Returns every non file part with an utf8 value, as (name, value)
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.parts.iter().filter(|p| !p.is_file()).filter_map(|p| Some((p.name.as_str(), p.text()?)))
    }

    pub fn files(&self) -> impl Iterator<Item = &Part> {
        self.parts.iter().filter(|p| p.is_file())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

impl Param for Multipart {}

pub(super) fn register(extractors: &mut Extractors) {
    extractors.insert(|_ctx: &Context, req: &FnRequest| Multipart::parse(req).map_err(FnError::from));
}

fn parse_parts(body: &Bytes, boundary: &str, max_parts: usize) -> Result<Vec<Part>, MultipartError> {
    let delimiter = format!("--{boundary}").into_bytes();
    let mut close_delimiter = b"\r\n".to_vec();
    close_delimiter.extend_from_slice(&delimiter);

    let mut parts = Vec::new();
    // the first delimiter opens the body or follows a line break in the preamble
    let first = if body.starts_with(&delimiter) {
        0
    } else {
        find(body, &close_delimiter, 0).ok_or(MultipartError::UnexpectedEof)? + 2
    };
    let mut pos = first + delimiter.len();

    loop {
        let rest = &body[pos..];
        if rest.starts_with(b"--") {
            return Ok(parts);
        }
        if !rest.starts_with(b"\r\n") {
            return Err(MultipartError::UnexpectedEof);
        }
        if parts.len() >= max_parts {
            return Err(MultipartError::TooManyParts { max_num: max_parts });
        }
        pos += 2;

        let (headers, data_start) = parse_part_headers(body, pos)?;
        let data_end = find(body, &close_delimiter, data_start).ok_or(MultipartError::UnexpectedEof)?;

        parts.push(Part {
            name: headers.name,
            filename: headers.filename,
            content_type: headers.content_type,
            data: body.slice(data_start..data_end),
        });

        pos = data_end + close_delimiter.len();
    }
}

struct PartHeaders {
    name: String,
    filename: Option<String>,
    content_type: Option<String>,
}

fn parse_part_headers(body: &[u8], mut pos: usize) -> Result<(PartHeaders, usize), MultipartError> {
    let mut name = None;
    let mut filename = None;
    let mut content_type = None;

    loop {
        let line_end = find(body, b"\r\n", pos).ok_or(MultipartError::UnexpectedEof)?;
        let line = &body[pos..line_end];
        pos = line_end + 2;

        if line.is_empty() {
            let name = name.ok_or(MultipartError::MissingName)?;
            return Ok((PartHeaders { name, filename, content_type }, pos));
        }

        let line = std::str::from_utf8(line).map_err(|_| MultipartError::invalid_header("header is not utf8"))?;
        let (key, value) = line.split_once(':').ok_or_else(|| MultipartError::invalid_header(line))?;
        let value = value.trim();

        if key.trim().eq_ignore_ascii_case("content-disposition") {
            for param in value.split(';').skip(1) {
                match param.trim().split_once('=') {
                    Some((k, v)) if k.trim().eq_ignore_ascii_case("name") => name = Some(unquote(v)),
                    Some((k, v)) if k.trim().eq_ignore_ascii_case("filename") => filename = Some(unquote(v)),
                    _ => {}
                }
            }
        } else if key.trim().eq_ignore_ascii_case("content-type") {
            content_type = Some(value.to_string());
        }
    }
}

fn unquote(value: &str) -> String {
    let value = value.trim();
    value.strip_prefix('"').and_then(|v| v.strip_suffix('"')).unwrap_or(value).to_string()
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() {
        return None;
    }
    haystack[from..].windows(needle.len()).position(|window| window == needle).map(|i| i + from)
}
