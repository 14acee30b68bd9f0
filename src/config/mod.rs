//! Configuration module for varcore
//!
//! This module holds the table set produced by the offline generator and the
//! options that tune how a [`Registry`](crate::registry::Registry) evaluates
//! requests.
//!
//! # Table Set
//!
//! [`TableSet`] mirrors the generator's configuration blob field for field:
//! per-type template arrays and data array sizes, the constant string blob,
//! the flat enum member table and the variable descriptor array. Descriptor
//! words keep their packed encodings (see [`RawVarDesc`]) so tables emitted
//! for firmware can be consumed unchanged.
//!
//! # Files
//!
//! - `*.toml` - TOML table sets (hand-written fixtures, demos)
//! - anything else - JSON table sets (generator output)
//!
//! # Example
//!
//! ```ignore
//! use varcore::{config::TableSet, registry::Registry};
//!
//! let tables = TableSet::load("vardefs.toml")?;
//! let registry = Registry::init(tables)?;
//! ```

pub mod builder;

pub use builder::{TableBuilder, VarSpec};

use crate::error::{Result, ResultExt, VarCoreError};
use crate::types::NumericTemplate;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Handle/offset sentinel used by generated tables
pub const HNON: u16 = u16::MAX;

/// Enum member table: words before the first member triple
pub const ENUM_HEADER_WORDS: usize = 2;

/// Enum member table: words per member (`hnd`, `value`, `symbol`)
pub const ENUM_MEMBER_WORDS: usize = 3;

/// How masked capability bits of a request are compared to a variable's rights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessPolicy {
    /// Requested capability bits must equal the variable's capability bits
    #[default]
    Exact,
    /// Every requested capability bit must be granted by the variable
    Subset,
}

/// Options evaluated by the registry at runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RegistryOptions {
    #[serde(default)]
    pub access_policy: AccessPolicy,
}

/// Raw variable descriptor as emitted by the generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawVarDesc {
    pub hnd: u16,
    /// Offset of the SCPI name in the constant blob, [`HNON`] if hidden
    pub scpi_idx: u16,
    /// Type code in the low nibble, `VECTOR`/`CONST` flags above
    #[serde(rename = "type")]
    pub type_bits: u16,
    pub vec_items: u16,
    pub acc_rights: u16,
    pub descr_idx: u16,
    /// Cell index; byte offset (multiple of the cell size) for strings
    pub data_idx: u16,
    #[serde(default)]
    pub storage: u16,
    #[serde(default)]
    pub fmt: u16,
}

/// The constant string blob: NUL-terminated strings addressed by byte offset
///
/// Serialized as the list of its strings, so offsets are reproduced by
/// concatenating them in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct ConstBlob {
    bytes: Vec<u8>,
}

impl ConstBlob {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a string and return its offset
    pub fn push(&mut self, text: &str) -> usize {
        let offset = self.bytes.len();
        self.bytes.extend_from_slice(text.as_bytes());
        self.bytes.push(0);
        offset
    }

    /// Bytes of the string starting at `offset`, without terminator
    ///
    /// Returns `None` if the offset is outside the blob or the string is not
    /// terminated.
    pub fn bytes_at(&self, offset: usize) -> Option<&[u8]> {
        let tail = self.bytes.get(offset..)?;
        let end = tail.iter().position(|&b| b == 0)?;
        Some(&tail[..end])
    }

    /// String at `offset`, with invalid UTF-8 replaced
    pub fn str_at(&self, offset: usize) -> Option<String> {
        self.bytes_at(offset)
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl From<Vec<String>> for ConstBlob {
    fn from(strings: Vec<String>) -> Self {
        let mut blob = ConstBlob::new();
        for s in &strings {
            blob.push(s);
        }
        blob
    }
}

impl From<ConstBlob> for Vec<String> {
    fn from(blob: ConstBlob) -> Self {
        let mut out = Vec::new();
        let mut rest = blob.bytes.as_slice();
        while let Some(end) = rest.iter().position(|&b| b == 0) {
            out.push(String::from_utf8_lossy(&rest[..end]).into_owned());
            rest = &rest[end + 1..];
        }
        out
    }
}

/// Complete set of generated tables
///
/// Scalars and plain arrays come first so the struct serializes to valid TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSet {
    #[serde(default)]
    pub data_s16_cnt: u16,
    #[serde(default)]
    pub data_s32_cnt: u16,
    #[serde(default)]
    pub data_f32_cnt: u16,
    #[serde(default)]
    pub data_f64_cnt: u16,
    /// Number of string cells
    #[serde(default)]
    pub data_str_cnt: u16,
    #[serde(default)]
    pub data_enum_cnt: u16,

    #[serde(default)]
    pub const_str: ConstBlob,

    /// Flat enum tables: `[default_index, count, (hnd, value, symbol) * count]`
    #[serde(default)]
    pub enum_members: Vec<i16>,

    #[serde(default)]
    pub descr_s16: Vec<NumericTemplate<i16>>,
    #[serde(default)]
    pub descr_s32: Vec<NumericTemplate<i32>>,
    #[serde(default)]
    pub descr_f32: Vec<NumericTemplate<f32>>,
    #[serde(default)]
    pub descr_f64: Vec<NumericTemplate<f64>>,

    #[serde(default)]
    pub vars: Vec<RawVarDesc>,

    #[serde(default)]
    pub options: RegistryOptions,
}

impl TableSet {
    /// Number of declared variables
    pub fn var_count(&self) -> usize {
        self.vars.len()
    }

    /// Parse a table set from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| VarCoreError::Serialization(format!("Failed to parse TOML tables: {}", e)))
    }

    /// Parse a table set from JSON text
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| VarCoreError::Serialization(format!("Failed to parse JSON tables: {}", e)))
    }

    /// Load a table set from disk, choosing the format by file extension
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(VarCoreError::from)
            .with_context(|| format!("Failed to read table file {:?}", path))?;

        let tables = if is_toml(path) {
            Self::from_toml(&content)
        } else {
            Self::from_json(&content)
        }
        .context(format!("Failed to load {:?}", path))?;

        tracing::debug!(
            "Loaded {} variable descriptors from {:?}",
            tables.vars.len(),
            path
        );
        Ok(tables)
    }

    /// Save the table set, choosing the format by file extension
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = if is_toml(path) {
            toml::to_string_pretty(self).map_err(|e| {
                VarCoreError::Serialization(format!("Failed to serialize tables: {}", e))
            })?
        } else {
            serde_json::to_string_pretty(self).map_err(|e| {
                VarCoreError::Serialization(format!("Failed to serialize tables: {}", e))
            })?
        };

        std::fs::write(path, content)
            .map_err(VarCoreError::from)
            .with_context(|| format!("Failed to write table file {:?}", path))
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("toml"))
        .unwrap_or(false)
}
