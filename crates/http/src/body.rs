//! Polymorphic message body storage.
//!
//! The original implementation modeled this as a `I_BodyStorage` base class with virtual
//! `write`/`read`/`size`/`as_string` methods and three concrete subclasses (`MemoryBody`,
//! `FileBody`, `JsonBody`). Per the redesign notes, this is re-architected as a single tagged
//! enum: the request owns the variant by value, there is no vtable, and adding a fourth
//! variant does not require touching every call site.

use crate::error::BodyError;
use serde_json::Value;
use std::path::PathBuf;

/// Which concrete storage a [`Body`] currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    None,
    Memory,
    File,
    Json,
}

/// A message body, keyed by its [`BodyKind`].
///
/// `None` rejects writes. `Memory` appends to a contiguous byte buffer. `Json` parses each
/// write as a complete JSON document, overwriting any prior content; a parse failure does not
/// abort the connection — it is reported through `Body::write`'s `Result` and the sink is left
/// at its previous (possibly empty) value. `File` streams to an underlying path; its detailed
/// design is out of scope for this crate, the variant exists for interface compatibility.
#[derive(Debug, Clone)]
pub enum Body {
    None,
    Memory(Vec<u8>),
    File { path: PathBuf, data: Vec<u8> },
    Json(Option<Value>),
}

impl Body {
    pub fn memory() -> Self {
        Body::Memory(Vec::new())
    }

    pub fn json() -> Self {
        Body::Json(None)
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Body::File { path: path.into(), data: Vec::new() }
    }

    pub fn kind(&self) -> BodyKind {
        match self {
            Body::None => BodyKind::None,
            Body::Memory(_) => BodyKind::Memory,
            Body::File { .. } => BodyKind::File,
            Body::Json(_) => BodyKind::Json,
        }
    }

    /// Appends raw bytes to the sink.
    ///
    /// For `Json`, the accumulated bytes so far (this call's bytes only, per spec "each write
    /// is parsed as a complete JSON document") are parsed as a whole document, replacing any
    /// previously stored value. A parse failure is reported as `Err` without poisoning the
    /// body: the sink is simply left unset.
    pub fn write(&mut self, bytes: &[u8]) -> Result<(), BodyError> {
        match self {
            Body::None => Err(BodyError::WriteRejected { kind: "none" }),
            Body::Memory(buf) => {
                buf.extend_from_slice(bytes);
                Ok(())
            }
            Body::File { data, .. } => {
                data.extend_from_slice(bytes);
                Ok(())
            }
            Body::Json(slot) => match serde_json::from_slice::<Value>(bytes) {
                Ok(value) => {
                    *slot = Some(value);
                    Ok(())
                }
                Err(e) => Err(BodyError::InvalidJson { reason: e.to_string() }),
            },
        }
    }

    pub fn write_str(&mut self, s: &str) -> Result<(), BodyError> {
        self.write(s.as_bytes())
    }

    /// Returns the body bytes. For `Json`, this re-serializes the parsed value.
    pub fn read(&self) -> Vec<u8> {
        match self {
            Body::None => Vec::new(),
            Body::Memory(buf) => buf.clone(),
            Body::File { data, .. } => data.clone(),
            Body::Json(Some(value)) => serde_json::to_vec(value).unwrap_or_default(),
            Body::Json(None) => Vec::new(),
        }
    }

    pub fn size(&self) -> usize {
        match self {
            Body::None => 0,
            Body::Memory(buf) => buf.len(),
            Body::File { data, .. } => data.len(),
            Body::Json(Some(value)) => serde_json::to_vec(value).map(|v| v.len()).unwrap_or(0),
            Body::Json(None) => 0,
        }
    }

    pub fn as_string(&self) -> String {
        String::from_utf8_lossy(&self.read()).into_owned()
    }

    /// Accesses the parsed JSON value, if this body is a `Json` sink that successfully parsed.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Body::Json(value) => value.as_ref(),
            _ => None,
        }
    }
}

impl Default for Body {
    fn default() -> Self {
        Body::None
    }
}
