//! # varcore: Typed Variable Registry
//!
//! A runtime engine for a fixed, statically described set of typed,
//! access-controlled and possibly vectorized variables. The variable set is
//! produced offline by a table generator; this crate validates those tables
//! once and then serves typed, string and min/max accesses against them.
//!
//! ## Architecture
//!
//! - **Config**: [`TableSet`], the generator's table layout with serde
//!   load/save, plus [`TableBuilder`] for building tables in code
//! - **Registry**: [`Registry`], holding the validated directory and the
//!   live data store, with the accessor engine on top
//! - **Codec**: text parsing and format-driven rendering for `as_string`
//! - **Dump**: bounded, always-terminated human-readable snapshots
//!
//! ## Access model
//!
//! Every accessor names a variable by [`Handle`], a [`Direction`], a channel
//! and the requester's [`AccessRights`]. Failures come back as
//! [`AccessError`] values; nothing panics and no access ever leaves the
//! variable's own cells.
//!
//! ## Example
//!
//! ```ignore
//! use varcore::{AccessRights, Direction, Registry, TableSet};
//!
//! let mut reg = Registry::init(TableSet::load("vardefs.toml")?)?;
//! let nas = reg.get_hnd("NAS").unwrap();
//!
//! let mut text = String::new();
//! reg.as_string(nas, Direction::Read, &mut text, 1, AccessRights::PRG)?;
//! println!("NAS:1 = {}", text);
//! ```

pub mod codec;
pub mod config;
pub mod dump;
pub mod error;
pub mod registry;
pub mod types;

// Re-export commonly used types
pub use config::{AccessPolicy, RegistryOptions, TableBuilder, TableSet, VarSpec};
pub use dump::BoundedWriter;
pub use error::{AccessError, AccessResult, Result, ResultExt, VarCoreError};
pub use registry::{Registry, SharedRegistry};
pub use types::{
    AccessRights, Direction, Format, Handle, NumValue, Storage, VarDescriptor, VarKind, VarType,
};
