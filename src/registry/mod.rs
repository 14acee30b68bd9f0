//! Variable registry
//!
//! A [`Registry`] owns one validated [`Directory`] (shared, immutable) and one
//! [`DataStore`] (owned, mutable). It is built once from a generated
//! [`TableSet`] and answers every typed, string and min/max access against
//! it.
//!
//! Every accessor takes the same arguments: a handle, a direction, the value
//! buffer, a channel and the requester's capability bits. Checks run in a
//! fixed order (handle, type, capability gate, channel, then the write
//! policy), so the first failing one decides the error.
//!
//! # Example
//!
//! ```ignore
//! let mut reg = Registry::init(tables)?;
//! let tp1 = reg.get_hnd("TP1").unwrap();
//! let mut v = 0i16;
//! reg.as_int16(tp1, Direction::Read, &mut v, 3, AccessRights::PRG)?;
//! ```

mod access;
mod directory;
mod minmax;
mod numeric;
pub mod shared;
mod store;
mod text;

pub use access::{check_access, check_vector};
pub use directory::{DataSizes, Directory};
pub use shared::SharedRegistry;
pub use store::DataStore;

use crate::config::{AccessPolicy, RegistryOptions, TableSet};
use crate::error::{AccessError, AccessResult, Result};
use crate::types::{
    AccessRights, Direction, EnumDescriptor, Format, Handle, NumValue, Storage, VarDescriptor,
    VarKind, VarType,
};
use minmax::{Bound, RawBuf};
use std::sync::Arc;

/// Typed variable registry
///
/// Cloning shares the directory and copies the live data.
#[derive(Debug, Clone)]
pub struct Registry {
    dir: Arc<Directory>,
    store: DataStore,
    options: RegistryOptions,
}

impl Registry {
    /// Validate generated tables, build the directory and reset all variables
    pub fn init(tables: TableSet) -> Result<Self> {
        let dir = Directory::from_tables(&tables).map_err(|e| {
            tracing::warn!("Rejected variable tables: {}", e);
            e
        })?;

        let sizes = dir.sizes();
        tracing::info!(
            "Registry initialised: {} variables, cells s16={} s32={} f32={} f64={} enum={} str={}",
            dir.len(),
            sizes.s16,
            sizes.s32,
            sizes.f32,
            sizes.f64,
            sizes.enums,
            sizes.strings
        );

        let mut registry = Self {
            store: DataStore::with_sizes(sizes),
            dir: Arc::new(dir),
            options: tables.options,
        };
        registry.reset()?;
        Ok(registry)
    }

    /// Restore every variable to its declared defaults
    pub fn reset(&mut self) -> Result<()> {
        self.store.reset(&self.dir)?;
        tracing::debug!("Reset {} variables to defaults", self.dir.len());
        Ok(())
    }

    pub fn options(&self) -> RegistryOptions {
        self.options
    }

    pub fn set_access_policy(&mut self, policy: AccessPolicy) {
        self.options.access_policy = policy;
    }

    pub fn directory(&self) -> &Directory {
        &self.dir
    }

    /// Number of declared variables
    pub fn var_count(&self) -> usize {
        self.dir.len()
    }

    /// All handles in declaration order
    pub fn handles(&self) -> impl Iterator<Item = Handle> {
        (0..self.dir.len() as u16).map(Handle)
    }

    pub fn descriptor(&self, hnd: Handle) -> AccessResult<&VarDescriptor> {
        self.dir.var(hnd)
    }

    /// Raw access-rights word; the channel is reserved
    pub fn get_access(&self, hnd: Handle, _chan: u16) -> AccessResult<AccessRights> {
        Ok(self.dir.var(hnd)?.access)
    }

    pub fn get_datatype(&self, hnd: Handle) -> AccessResult<VarType> {
        Ok(self.dir.var(hnd)?.var_type())
    }

    pub fn get_storage(&self, hnd: Handle) -> AccessResult<Storage> {
        Ok(self.dir.var(hnd)?.storage)
    }

    pub fn get_format(&self, hnd: Handle) -> AccessResult<Format> {
        Ok(self.dir.var(hnd)?.format)
    }

    pub fn get_vec_items(&self, hnd: Handle) -> AccessResult<u16> {
        Ok(self.dir.var(hnd)?.vec_items)
    }

    /// SCPI name of a variable, `None` if hidden or unknown
    pub fn name(&self, hnd: Handle) -> Option<&str> {
        self.dir.var(hnd).ok()?.name.as_deref()
    }

    /// Member list of an ENUM variable
    pub fn enum_descriptor(&self, hnd: Handle) -> AccessResult<&EnumDescriptor> {
        match self.dir.var(hnd)?.kind {
            VarKind::Enum { descr, .. } => self.dir.enum_descr(descr),
            _ => Err(AccessError::InvalidType),
        }
    }

    /// Look up a handle by exact SCPI name; first match wins
    pub fn get_hnd(&self, name: &str) -> Option<Handle> {
        let found = self
            .dir
            .vars
            .iter()
            .find(|v| v.name.as_deref() == Some(name))
            .map(|v| v.hnd);
        tracing::trace!("Lookup {:?} -> {:?}", name, found);
        found
    }

    /// INT16 access; ENUM variables are reachable through this path too
    pub fn as_int16(
        &mut self,
        hnd: Handle,
        direction: Direction,
        val: &mut i16,
        chan: u16,
        req: AccessRights,
    ) -> AccessResult<()> {
        let policy = self.options.access_policy;
        let res = match self.dir.var(hnd)?.kind {
            VarKind::Enum { .. } => {
                numeric::access_enum(&self.dir, &mut self.store, policy, hnd, direction, val, chan, req)
            }
            _ => numeric::access(&self.dir, &mut self.store, policy, hnd, direction, val, chan, req),
        };
        traced(res, hnd, direction, chan)
    }

    pub fn as_int32(
        &mut self,
        hnd: Handle,
        direction: Direction,
        val: &mut i32,
        chan: u16,
        req: AccessRights,
    ) -> AccessResult<()> {
        let res = numeric::access(
            &self.dir,
            &mut self.store,
            self.options.access_policy,
            hnd,
            direction,
            val,
            chan,
            req,
        );
        traced(res, hnd, direction, chan)
    }

    pub fn as_float(
        &mut self,
        hnd: Handle,
        direction: Direction,
        val: &mut f32,
        chan: u16,
        req: AccessRights,
    ) -> AccessResult<()> {
        let res = numeric::access(
            &self.dir,
            &mut self.store,
            self.options.access_policy,
            hnd,
            direction,
            val,
            chan,
            req,
        );
        traced(res, hnd, direction, chan)
    }

    pub fn as_double(
        &mut self,
        hnd: Handle,
        direction: Direction,
        val: &mut f64,
        chan: u16,
        req: AccessRights,
    ) -> AccessResult<()> {
        let res = numeric::access(
            &self.dir,
            &mut self.store,
            self.options.access_policy,
            hnd,
            direction,
            val,
            chan,
            req,
        );
        traced(res, hnd, direction, chan)
    }

    /// Copy the channel's minimum into `buf` (native-endian element bytes)
    pub fn get_min(&mut self, hnd: Handle, buf: &mut [u8], chan: u16) -> AccessResult<()> {
        minmax::raw_bound(&self.dir, &mut self.store, hnd, Bound::Min, RawBuf::Out(buf), chan)
    }

    /// Copy the channel's maximum into `buf` (native-endian element bytes)
    pub fn get_max(&mut self, hnd: Handle, buf: &mut [u8], chan: u16) -> AccessResult<()> {
        minmax::raw_bound(&self.dir, &mut self.store, hnd, Bound::Max, RawBuf::Out(buf), chan)
    }

    /// Replace the channel's minimum from `buf` (native-endian element bytes)
    pub fn set_min(&mut self, hnd: Handle, buf: &[u8], chan: u16) -> AccessResult<()> {
        minmax::raw_bound(&self.dir, &mut self.store, hnd, Bound::Min, RawBuf::In(buf), chan)
    }

    /// Replace the channel's maximum from `buf` (native-endian element bytes)
    pub fn set_max(&mut self, hnd: Handle, buf: &[u8], chan: u16) -> AccessResult<()> {
        minmax::raw_bound(&self.dir, &mut self.store, hnd, Bound::Max, RawBuf::In(buf), chan)
    }

    pub fn min_value(&self, hnd: Handle, chan: u16) -> AccessResult<NumValue> {
        minmax::get_value(&self.dir, &self.store, hnd, Bound::Min, chan)
    }

    pub fn max_value(&self, hnd: Handle, chan: u16) -> AccessResult<NumValue> {
        minmax::get_value(&self.dir, &self.store, hnd, Bound::Max, chan)
    }

    pub fn set_min_value(&mut self, hnd: Handle, value: NumValue, chan: u16) -> AccessResult<()> {
        minmax::set_value(&self.dir, &mut self.store, hnd, Bound::Min, value, chan)
    }

    pub fn set_max_value(&mut self, hnd: Handle, value: NumValue, chan: u16) -> AccessResult<()> {
        minmax::set_value(&self.dir, &mut self.store, hnd, Bound::Max, value, chan)
    }

    pub(crate) fn store(&self) -> &DataStore {
        &self.store
    }
}

/// Log rejected writes and pass the result through
fn traced<T>(res: AccessResult<T>, hnd: Handle, direction: Direction, chan: u16) -> AccessResult<T> {
    if let (Err(e), Direction::Write) = (&res, direction) {
        tracing::debug!("Rejected write to handle {} channel {}: {}", hnd, chan, e);
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{TableBuilder, VarSpec};

    fn registry() -> (Registry, Handle, Handle) {
        let mut b = TableBuilder::new();
        let a = b.add(VarSpec::int32("A", 5, -10, 10).limit());
        let e = b.add(VarSpec::enumeration("E", &[(1, "ON"), (0, "OFF")], 1));
        (Registry::init(b.build().unwrap()).unwrap(), a, e)
    }

    #[test]
    fn test_init_resets_defaults() {
        let (mut reg, a, e) = registry();
        let mut v = 0;
        reg.as_int32(a, Direction::Read, &mut v, 0, AccessRights::PRG).unwrap();
        assert_eq!(v, 5);
        let mut x = 9;
        reg.as_int16(e, Direction::Read, &mut x, 0, AccessRights::PRG).unwrap();
        assert_eq!(x, 0);
    }

    #[test]
    fn test_type_mismatch() {
        let (mut reg, a, e) = registry();
        let mut f = 0.0f32;
        assert_eq!(
            reg.as_float(a, Direction::Read, &mut f, 0, AccessRights::PRG),
            Err(AccessError::InvalidType)
        );
        let mut v = 0i32;
        assert_eq!(
            reg.as_int32(e, Direction::Read, &mut v, 0, AccessRights::PRG),
            Err(AccessError::InvalidType)
        );
    }

    #[test]
    fn test_unknown_handle() {
        let (mut reg, _, _) = registry();
        let mut v = 0i32;
        assert_eq!(
            reg.as_int32(Handle(2), Direction::Read, &mut v, 0, AccessRights::PRG),
            Err(AccessError::UnknownHandle)
        );
        assert_eq!(reg.get_datatype(Handle::NONE), Err(AccessError::UnknownHandle));
        assert_eq!(reg.name(Handle(7)), None);
    }

    #[test]
    fn test_clone_has_independent_data() {
        let (mut reg, a, _) = registry();
        let mut copy = reg.clone();
        let mut v = 7;
        copy.as_int32(a, Direction::Write, &mut v, 0, AccessRights::PRG).unwrap();
        let mut r = 0;
        reg.as_int32(a, Direction::Read, &mut r, 0, AccessRights::PRG).unwrap();
        assert_eq!(r, 5);
    }

    #[test]
    fn test_policy_switch() {
        let (mut reg, a, _) = registry();
        let mut v = 0;
        let both = AccessRights::PRG | AccessRights::CMD;
        assert_eq!(
            reg.as_int32(a, Direction::Read, &mut v, 0, both),
            Err(AccessError::AccessDenied)
        );
        reg.set_access_policy(AccessPolicy::Subset);
        assert_eq!(
            reg.as_int32(a, Direction::Read, &mut v, 0, both),
            Err(AccessError::AccessDenied)
        );
        assert!(reg
            .as_int32(a, Direction::Read, &mut v, 0, AccessRights::PRG_R)
            .is_ok());
    }
}
