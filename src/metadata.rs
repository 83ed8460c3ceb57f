//! Request/response metadata carried by a header block.
//!
//! Maps between an HTTP message head and the ordered header list HPACK
//! carries, with pseudo-header fields first.

use crate::error::{H2Error, Result};
use crate::hpack::H2Header;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaData {
    Request {
        method: String,
        scheme: String,
        authority: String,
        path: String,
        fields: Vec<H2Header>,
    },
    Response {
        status: u16,
        fields: Vec<H2Header>,
    },
    /// Trailing header block; regular fields only.
    Trailers { fields: Vec<H2Header> },
}

impl MetaData {
    pub fn request(
        method: impl Into<String>,
        scheme: impl Into<String>,
        authority: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        MetaData::Request {
            method: method.into(),
            scheme: scheme.into(),
            authority: authority.into(),
            path: path.into(),
            fields: Vec::new(),
        }
    }

    pub fn response(status: u16) -> Self {
        MetaData::Response {
            status,
            fields: Vec::new(),
        }
    }

    /// Append a regular field.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields_mut().push(H2Header::new(name, value));
        self
    }

    pub fn fields(&self) -> &[H2Header] {
        match self {
            MetaData::Request { fields, .. }
            | MetaData::Response { fields, .. }
            | MetaData::Trailers { fields } => fields,
        }
    }

    fn fields_mut(&mut self) -> &mut Vec<H2Header> {
        match self {
            MetaData::Request { fields, .. }
            | MetaData::Response { fields, .. }
            | MetaData::Trailers { fields } => fields,
        }
    }

    /// Header list in wire order: pseudo-headers, then regular fields.
    pub fn to_headers(&self) -> Vec<H2Header> {
        let mut headers = Vec::with_capacity(self.fields().len() + 4);
        match self {
            MetaData::Request {
                method,
                scheme,
                authority,
                path,
                ..
            } => {
                headers.push(H2Header::new(":method", method.as_str()));
                headers.push(H2Header::new(":scheme", scheme.as_str()));
                headers.push(H2Header::new(":authority", authority.as_str()));
                headers.push(H2Header::new(":path", path.as_str()));
            }
            MetaData::Response { status, .. } => {
                headers.push(H2Header::new(":status", status.to_string()));
            }
            MetaData::Trailers { .. } => {}
        }
        headers.extend(self.fields().iter().cloned());
        headers
    }

    /// Rebuild metadata from a decoded header list.
    ///
    /// A list without pseudo-headers is taken as trailers.
    pub fn from_headers(headers: &[H2Header]) -> Result<Self> {
        let mut method = None;
        let mut scheme = None;
        let mut authority = None;
        let mut path = None;
        let mut status = None;
        let mut fields = Vec::new();

        for header in headers {
            if !header.is_pseudo() {
                fields.push(header.clone());
                continue;
            }
            if !fields.is_empty() {
                return Err(H2Error::protocol(format!(
                    "pseudo-header {} after regular fields",
                    header.name
                )));
            }
            let slot = match header.name.as_str() {
                ":method" => &mut method,
                ":scheme" => &mut scheme,
                ":authority" => &mut authority,
                ":path" => &mut path,
                ":status" => &mut status,
                other => return Err(H2Error::protocol(format!("unknown pseudo-header {}", other))),
            };
            if slot.replace(header.value.clone()).is_some() {
                return Err(H2Error::protocol(format!("duplicate pseudo-header {}", header.name)));
            }
        }

        if let Some(status) = status {
            if method.is_some() || scheme.is_some() || authority.is_some() || path.is_some() {
                return Err(H2Error::protocol("request pseudo-headers in a response"));
            }
            let status = status
                .parse::<u16>()
                .ok()
                .filter(|code| (100..=999).contains(code))
                .ok_or_else(|| H2Error::protocol(format!("invalid :status {:?}", status)))?;
            return Ok(MetaData::Response { status, fields });
        }

        if method.is_none() && scheme.is_none() && authority.is_none() && path.is_none() {
            return Ok(MetaData::Trailers { fields });
        }

        let missing = |name: &str| H2Error::protocol(format!("missing pseudo-header {}", name));
        Ok(MetaData::Request {
            method: method.ok_or_else(|| missing(":method"))?,
            scheme: scheme.ok_or_else(|| missing(":scheme"))?,
            authority: authority.unwrap_or_default(),
            path: path.ok_or_else(|| missing(":path"))?,
            fields,
        })
    }
}
