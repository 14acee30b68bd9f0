//! Min/max accessors of numeric cells
//!
//! The raw variants move native-endian element bytes through a caller
//! buffer; the typed variants use [`NumValue`]. Neither runs the capability
//! gate. Bounds are per channel: changing the max of channel 1 leaves
//! channel 0 alone.

use super::access::check_channel;
use super::directory::Directory;
use super::numeric::Numeric;
use super::store::DataStore;
use crate::error::{AccessError, AccessResult};
use crate::types::{Handle, NumValue, NumericCell, VarKind};

/// Which bound of a cell is addressed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Bound {
    Min,
    Max,
}

impl Bound {
    fn of<T>(self, cell: &mut NumericCell<T>) -> &mut T {
        match self {
            Bound::Min => &mut cell.min,
            Bound::Max => &mut cell.max,
        }
    }
}

/// Caller buffer of a raw min/max call
pub(crate) enum RawBuf<'a> {
    /// Receives the bound
    Out(&'a mut [u8]),
    /// Supplies the new bound
    In(&'a [u8]),
}

impl RawBuf<'_> {
    fn len(&self) -> usize {
        match self {
            RawBuf::Out(b) => b.len(),
            RawBuf::In(b) => b.len(),
        }
    }
}

/// Copy a bound between the addressed cell and the caller's buffer
pub(crate) fn raw_bound(
    dir: &Directory,
    store: &mut DataStore,
    hnd: Handle,
    bound: Bound,
    buf: RawBuf<'_>,
    chan: u16,
) -> AccessResult<()> {
    let var = dir.var(hnd)?;
    if buf.len() == 0 {
        return Err(AccessError::InvalidArgument);
    }
    match var.kind {
        VarKind::Int16 { .. } => raw_cell::<i16>(dir, store, hnd, bound, buf, chan),
        VarKind::Int32 { .. } => raw_cell::<i32>(dir, store, hnd, bound, buf, chan),
        VarKind::Float { .. } => raw_cell::<f32>(dir, store, hnd, bound, buf, chan),
        VarKind::Double { .. } => raw_cell::<f64>(dir, store, hnd, bound, buf, chan),
        VarKind::Enum { .. } | VarKind::String(_) | VarKind::Action => Err(AccessError::InvalidType),
    }
}

fn raw_cell<T: Numeric>(
    dir: &Directory,
    store: &mut DataStore,
    hnd: Handle,
    bound: Bound,
    buf: RawBuf<'_>,
    chan: u16,
) -> AccessResult<()> {
    if buf.len() < T::WIDTH {
        return Err(AccessError::InvalidArgument);
    }
    let field = cell_bound::<T>(dir, store, hnd, bound, chan)?;
    match buf {
        RawBuf::Out(out) => field.write_ne(out),
        RawBuf::In(bytes) => *field = T::read_ne(bytes),
    }
    Ok(())
}

/// Read a bound as a tagged value
pub(crate) fn get_value(
    dir: &Directory,
    store: &DataStore,
    hnd: Handle,
    bound: Bound,
    chan: u16,
) -> AccessResult<NumValue> {
    match dir.var(hnd)?.kind {
        VarKind::Int16 { .. } => read_bound::<i16>(dir, store, hnd, bound, chan),
        VarKind::Int32 { .. } => read_bound::<i32>(dir, store, hnd, bound, chan),
        VarKind::Float { .. } => read_bound::<f32>(dir, store, hnd, bound, chan),
        VarKind::Double { .. } => read_bound::<f64>(dir, store, hnd, bound, chan),
        _ => Err(AccessError::InvalidType),
    }
}

fn read_bound<T: Numeric>(
    dir: &Directory,
    store: &DataStore,
    hnd: Handle,
    bound: Bound,
    chan: u16,
) -> AccessResult<NumValue> {
    let var = dir.var(hnd)?;
    let slot = T::slot(&var.kind).ok_or(AccessError::InvalidType)?;
    check_channel(var, chan)?;
    let cell = T::cells(store)
        .get(slot.channel(chan))
        .ok_or(AccessError::InvalidChannel)?;
    let value = match bound {
        Bound::Min => cell.min,
        Bound::Max => cell.max,
    };
    Ok(value.into_value())
}

/// Replace a bound; the value must carry the variable's own type
pub(crate) fn set_value(
    dir: &Directory,
    store: &mut DataStore,
    hnd: Handle,
    bound: Bound,
    value: NumValue,
    chan: u16,
) -> AccessResult<()> {
    match value {
        NumValue::Int16(v) => set_typed(dir, store, hnd, bound, v, chan),
        NumValue::Int32(v) => set_typed(dir, store, hnd, bound, v, chan),
        NumValue::Float(v) => set_typed(dir, store, hnd, bound, v, chan),
        NumValue::Double(v) => set_typed(dir, store, hnd, bound, v, chan),
    }
}

fn set_typed<T: Numeric>(
    dir: &Directory,
    store: &mut DataStore,
    hnd: Handle,
    bound: Bound,
    value: T,
    chan: u16,
) -> AccessResult<()> {
    *cell_bound::<T>(dir, store, hnd, bound, chan)? = value;
    Ok(())
}

fn cell_bound<'s, T: Numeric>(
    dir: &Directory,
    store: &'s mut DataStore,
    hnd: Handle,
    bound: Bound,
    chan: u16,
) -> AccessResult<&'s mut T> {
    let var = dir.var(hnd)?;
    let slot = T::slot(&var.kind).ok_or(AccessError::InvalidType)?;
    check_channel(var, chan)?;
    T::cells_mut(store)
        .get_mut(slot.channel(chan))
        .map(|cell| bound.of(cell))
        .ok_or(AccessError::InvalidChannel)
}
