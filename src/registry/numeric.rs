//! Numeric accessor paths (INT16, INT32, FLOAT, DOUBLE)
//!
//! All four types share one algorithm, parameterised over [`Numeric`]:
//! resolve the handle, match the declared type, run the capability gate and
//! the channel check, then read the cell or write it through the LIMIT/CLIP
//! policy. ENUM variables are reachable through the INT16 path and validate
//! membership instead of bounds.

use super::access::{check_access, check_channel};
use super::directory::Directory;
use super::store::DataStore;
use crate::config::AccessPolicy;
use crate::error::{AccessError, AccessResult};
use crate::types::{
    AccessRights, DataSlot, Direction, EnumData, Handle, NumValue, NumericCell, VarKind,
};

/// Element type of one of the numeric data arrays
pub(crate) trait Numeric: Copy + PartialOrd + Default + std::fmt::Debug + 'static {
    /// Size of the native representation in bytes
    const WIDTH: usize;

    /// Data slot of `kind` if it is declared with this type
    fn slot(kind: &VarKind) -> Option<DataSlot<Self>>;

    fn cells(store: &DataStore) -> &[NumericCell<Self>];

    fn cells_mut(store: &mut DataStore) -> &mut [NumericCell<Self>];

    fn is_nan(self) -> bool {
        false
    }

    /// Copy the native-endian bytes into `out`, which holds at least `WIDTH` bytes
    fn write_ne(self, out: &mut [u8]);

    /// Decode from the first `WIDTH` bytes of `bytes`
    fn read_ne(bytes: &[u8]) -> Self;

    fn into_value(self) -> NumValue;
}

macro_rules! impl_numeric {
    ($t:ty, $variant:ident, $field:ident $(, $float:ident)?) => {
        impl Numeric for $t {
            const WIDTH: usize = std::mem::size_of::<$t>();

            fn slot(kind: &VarKind) -> Option<DataSlot<Self>> {
                match kind {
                    VarKind::$variant { data, .. } => Some(*data),
                    _ => None,
                }
            }

            fn cells(store: &DataStore) -> &[NumericCell<Self>] {
                &store.$field
            }

            fn cells_mut(store: &mut DataStore) -> &mut [NumericCell<Self>] {
                &mut store.$field
            }

            $(
                fn is_nan(self) -> bool {
                    <$float>::is_nan(self)
                }
            )?

            fn write_ne(self, out: &mut [u8]) {
                out[..Self::WIDTH].copy_from_slice(&self.to_ne_bytes());
            }

            fn read_ne(bytes: &[u8]) -> Self {
                let mut raw = [0u8; std::mem::size_of::<$t>()];
                raw.copy_from_slice(&bytes[..Self::WIDTH]);
                <$t>::from_ne_bytes(raw)
            }

            fn into_value(self) -> NumValue {
                NumValue::$variant(self)
            }
        }
    };
}

impl_numeric!(i16, Int16, s16);
impl_numeric!(i32, Int32, s32);
impl_numeric!(f32, Float, f32, f32);
impl_numeric!(f64, Double, f64, f64);

/// Read or write one numeric channel
#[allow(clippy::too_many_arguments)]
pub(crate) fn access<T: Numeric>(
    dir: &Directory,
    store: &mut DataStore,
    policy: AccessPolicy,
    hnd: Handle,
    direction: Direction,
    val: &mut T,
    chan: u16,
    req: AccessRights,
) -> AccessResult<()> {
    let var = dir.var(hnd)?;
    let slot = T::slot(&var.kind).ok_or(AccessError::InvalidType)?;
    check_access(var.access, direction, req, policy)?;
    check_channel(var, chan)?;

    let cell = T::cells_mut(store)
        .get_mut(slot.channel(chan))
        .ok_or(AccessError::InvalidChannel)?;

    match direction {
        Direction::Read => *val = cell.value,
        Direction::Write => cell.value = bounded(var.access, cell, *val)?,
    }
    Ok(())
}

/// Read or write one enum channel through the INT16 path
#[allow(clippy::too_many_arguments)]
pub(crate) fn access_enum(
    dir: &Directory,
    store: &mut DataStore,
    policy: AccessPolicy,
    hnd: Handle,
    direction: Direction,
    val: &mut i16,
    chan: u16,
    req: AccessRights,
) -> AccessResult<()> {
    let var = dir.var(hnd)?;
    let (descr, data) = match var.kind {
        VarKind::Enum { descr, data } => (descr, data),
        _ => return Err(AccessError::InvalidType),
    };
    check_access(var.access, direction, req, policy)?;
    check_channel(var, chan)?;

    let cell = enum_cell(store, data, chan)?;
    match direction {
        Direction::Read => *val = *cell,
        Direction::Write => {
            if !dir.enum_descr(descr)?.contains(*val) {
                return Err(AccessError::InvalidEnum);
            }
            *cell = *val;
        }
    }
    Ok(())
}

fn enum_cell(store: &mut DataStore, data: DataSlot<EnumData>, chan: u16) -> AccessResult<&mut i16> {
    store
        .enums
        .get_mut(data.channel(chan))
        .ok_or(AccessError::InvalidChannel)
}

/// Apply the variable's write policy to a new value
fn bounded<T: Numeric>(rights: AccessRights, cell: &NumericCell<T>, value: T) -> AccessResult<T> {
    if rights.is_limit() {
        if value.is_nan() {
            Err(AccessError::InvalidValue)
        } else if value > cell.max {
            Err(AccessError::UpperLimit)
        } else if value < cell.min {
            Err(AccessError::LowerLimit)
        } else {
            Ok(value)
        }
    } else if rights.is_clip() {
        if value.is_nan() {
            Err(AccessError::InvalidValue)
        } else if value > cell.max {
            Ok(cell.max)
        } else if value < cell.min {
            Ok(cell.min)
        } else {
            Ok(value)
        }
    } else {
        Ok(value)
    }
}
