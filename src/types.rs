//! Core data types for varcore
//!
//! This module contains the data model shared by the registry, the string
//! codec and the dump renderer.
//!
//! # Main Types
//!
//! - [`Handle`] - Stable index of a declared variable
//! - [`VarType`] - Base type of a variable (INT16, INT32, FLOAT, ...)
//! - [`AccessRights`] - Capability bits, admin bit and LIMIT/CLIP behavior flags
//! - [`VarKind`] - Closed sum over the variable types, each variant owning
//!   typed slots into its own template and data arrays
//! - [`VarDescriptor`] - Immutable per-variable metadata
//! - [`NumericCell`] - Live `{ value, min, max }` record of a numeric channel
//!
//! # Slots
//!
//! Every variant of [`VarKind`] carries [`DataSlot`]/[`TemplateSlot`] values
//! tagged with the element type of the array they index. A slot for the
//! INT16 data array cannot be used against the enum or string arrays, and
//! channel offsets are always counted in cells, never in bytes.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// Size of a string cell in bytes, including the terminator
pub const STRBUF_SIZE: usize = 32;

/// Number of text bytes a string cell can hold
pub const STRBUF_CHARS: usize = STRBUF_SIZE - 1;

/// Mask selecting the type code from a packed type word
pub const TYPE_MASK: u16 = 0x000f;

/// Mask selecting the capability bits from an access-rights word
pub const CAPABILITY_MASK: u16 = 0x00ff;

/// Live storage of one string channel
pub type StrCell = heapless::String<STRBUF_CHARS>;

/// Stable index into the registry directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(pub u16);

impl Handle {
    /// "No handle" sentinel, also used for hidden names in generated tables
    pub const NONE: Handle = Handle(u16::MAX);

    /// Position of the variable in the directory
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Check if this is the sentinel
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

impl From<u16> for Handle {
    fn from(value: u16) -> Self {
        Handle(value)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "HNON")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Direction of an accessor call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Read,
    Write,
}

/// Base type of a variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VarType {
    Int16,
    Int32,
    Float,
    Double,
    Enum,
    String,
    Action,
}

impl VarType {
    /// Type code used in generated tables
    pub fn code(self) -> u16 {
        match self {
            VarType::Int16 => 1,
            VarType::Int32 => 2,
            VarType::Float => 4,
            VarType::Double => 5,
            VarType::Enum => 6,
            VarType::String => 7,
            VarType::Action => 8,
        }
    }

    /// Decode a type code; INT8 (0) and INT64 (3) have no storage and are rejected
    pub fn from_code(code: u16) -> Option<Self> {
        Some(match code {
            1 => VarType::Int16,
            2 => VarType::Int32,
            4 => VarType::Float,
            5 => VarType::Double,
            6 => VarType::Enum,
            7 => VarType::String,
            8 => VarType::Action,
            _ => return None,
        })
    }

    /// Returns true for types with `{ value, min, max }` cells
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            VarType::Int16 | VarType::Int32 | VarType::Float | VarType::Double
        )
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VarType::Int16 => "INT16",
            VarType::Int32 => "INT32",
            VarType::Float => "FLOAT",
            VarType::Double => "DOUBLE",
            VarType::Enum => "ENUM",
            VarType::String => "STRING",
            VarType::Action => "ACTION",
        };
        f.write_str(name)
    }
}

bitflags! {
    /// Flag bits packed above the type code
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TypeFlags: u16 {
        /// More than one channel
        const VECTOR = 0x1000;
        /// String backed by the constant blob
        const CONST = 0x2000;
    }
}

bitflags! {
    /// Access rights of a variable, or capabilities of a requester
    ///
    /// The low byte holds one read and one write bit per requester class.
    /// `ADMIN` is compared separately on writes; `LIMIT` and `CLIP` are
    /// write behavior flags and never part of the capability comparison.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AccessRights: u16 {
        const PRG_R = 0x0001;
        const CMD_R = 0x0002;
        const EX1_R = 0x0004;
        const EX2_R = 0x0008;

        const PRG_W = 0x0010;
        const CMD_W = 0x0020;
        const EX1_W = 0x0040;
        const EX2_W = 0x0080;

        const PRG = Self::PRG_R.bits() | Self::PRG_W.bits();
        const CMD = Self::CMD_R.bits() | Self::CMD_W.bits();
        const EX1 = Self::EX1_R.bits() | Self::EX1_W.bits();
        const EX2 = Self::EX2_R.bits() | Self::EX2_W.bits();

        const ADMIN = 0x8000;
        /// Reject out-of-range writes
        const LIMIT = 0x4000;
        /// Saturate out-of-range writes
        const CLIP = 0x2000;
    }
}

impl AccessRights {
    /// Capability bits only (requester classes x read/write)
    pub fn capabilities(self) -> AccessRights {
        AccessRights::from_bits_retain(self.bits() & CAPABILITY_MASK)
    }

    pub fn is_admin(self) -> bool {
        self.contains(AccessRights::ADMIN)
    }

    pub fn is_limit(self) -> bool {
        self.contains(AccessRights::LIMIT)
    }

    pub fn is_clip(self) -> bool {
        self.contains(AccessRights::CLIP)
    }
}

/// Storage class of a variable; informational only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Storage {
    #[default]
    Volatile,
    Eeprom,
    Flash,
}

impl Storage {
    /// Mask selecting the storage class from a packed word
    pub const MASK: u16 = 0x6000;

    pub fn bits(self) -> u16 {
        match self {
            Storage::Volatile => 0x0000,
            Storage::Eeprom => 0x2000,
            Storage::Flash => 0x4000,
        }
    }

    pub fn from_bits(bits: u16) -> Option<Self> {
        match bits & Self::MASK {
            0x0000 => Some(Storage::Volatile),
            0x2000 => Some(Storage::Eeprom),
            0x4000 => Some(Storage::Flash),
            _ => None,
        }
    }
}

impl fmt::Display for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Storage::Volatile => "RAM",
            Storage::Eeprom => "EEPROM",
            Storage::Flash => "FLASH",
        })
    }
}

/// Rendering hint used by the string codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Format {
    #[default]
    Default,
    Hex2,
    Hex4,
    Hex8,
    Dec,
    Prec1,
    Prec2,
    Prec3,
    Prec4,
    /// Scientific notation
    Sci,
    /// Seconds since the Unix epoch, rendered as a calendar date
    Date,
}

impl Format {
    pub fn code(self) -> u16 {
        match self {
            Format::Default => 0,
            Format::Hex2 => 1,
            Format::Hex4 => 2,
            Format::Hex8 => 3,
            Format::Dec => 4,
            Format::Prec1 => 5,
            Format::Prec2 => 6,
            Format::Prec3 => 7,
            Format::Prec4 => 8,
            Format::Sci => 9,
            Format::Date => 10,
        }
    }

    pub fn from_code(code: u16) -> Option<Self> {
        Some(match code {
            0 => Format::Default,
            1 => Format::Hex2,
            2 => Format::Hex4,
            3 => Format::Hex8,
            4 => Format::Dec,
            5 => Format::Prec1,
            6 => Format::Prec2,
            7 => Format::Prec3,
            8 => Format::Prec4,
            9 => Format::Sci,
            10 => Format::Date,
            _ => return None,
        })
    }

    /// Number of decimal places for the fixed-precision formats
    pub fn precision(self) -> Option<usize> {
        match self {
            Format::Prec1 => Some(1),
            Format::Prec2 => Some(2),
            Format::Prec3 => Some(3),
            Format::Prec4 => Some(4),
            _ => None,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Format::Default => "DEFAULT",
            Format::Hex2 => "HEX2",
            Format::Hex4 => "HEX4",
            Format::Hex8 => "HEX8",
            Format::Dec => "DEC",
            Format::Prec1 => "PREC1",
            Format::Prec2 => "PREC2",
            Format::Prec3 => "PREC3",
            Format::Prec4 => "PREC4",
            Format::Sci => "SCI",
            Format::Date => "DATE",
        })
    }
}

/// Default/min/max template of a numeric variable, as emitted by the generator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericTemplate<T> {
    pub def_value: T,
    pub min: T,
    pub max: T,
}

impl<T> NumericTemplate<T> {
    pub fn new(def_value: T, min: T, max: T) -> Self {
        Self { def_value, min, max }
    }
}

/// Live cell of one numeric channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericCell<T> {
    pub value: T,
    pub min: T,
    pub max: T,
}

impl<T: Copy> From<NumericTemplate<T>> for NumericCell<T> {
    fn from(t: NumericTemplate<T>) -> Self {
        Self {
            value: t.def_value,
            min: t.min,
            max: t.max,
        }
    }
}

/// A numeric value tagged with its native type
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumValue {
    Int16(i16),
    Int32(i32),
    Float(f32),
    Double(f64),
}

impl NumValue {
    pub fn var_type(&self) -> VarType {
        match self {
            NumValue::Int16(_) => VarType::Int16,
            NumValue::Int32(_) => VarType::Int32,
            NumValue::Float(_) => VarType::Float,
            NumValue::Double(_) => VarType::Double,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            NumValue::Int16(v) => v as f64,
            NumValue::Int32(v) => v as f64,
            NumValue::Float(v) => v as f64,
            NumValue::Double(v) => v,
        }
    }
}

impl fmt::Display for NumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumValue::Int16(v) => write!(f, "{}", v),
            NumValue::Int32(v) => write!(f, "{}", v),
            NumValue::Float(v) => write!(f, "{}", v),
            NumValue::Double(v) => write!(f, "{}", v),
        }
    }
}

/// Marker for the enum data array
#[derive(Debug)]
pub enum EnumData {}

/// Marker for the mutable string data array
#[derive(Debug)]
pub enum StrData {}

/// Index of channel 0 of a variable in the data array of element type `T`
pub struct DataSlot<T> {
    base: u16,
    _marker: PhantomData<fn() -> T>,
}

impl<T> DataSlot<T> {
    pub fn new(base: u16) -> Self {
        Self {
            base,
            _marker: PhantomData,
        }
    }

    pub fn base(&self) -> usize {
        self.base as usize
    }

    /// Array index of the given channel
    pub fn channel(&self, chan: u16) -> usize {
        self.base as usize + chan as usize
    }
}

/// Index into the template array of element type `T`
pub struct TemplateSlot<T> {
    index: u16,
    _marker: PhantomData<fn() -> T>,
}

impl<T> TemplateSlot<T> {
    pub fn new(index: u16) -> Self {
        Self {
            index,
            _marker: PhantomData,
        }
    }

    pub fn index(&self) -> usize {
        self.index as usize
    }
}

// Derives would put bounds on T; the slots are plain indices.
macro_rules! impl_slot_traits {
    ($slot:ident, $field:ident) => {
        impl<T> Clone for $slot<T> {
            fn clone(&self) -> Self {
                *self
            }
        }

        impl<T> Copy for $slot<T> {}

        impl<T> PartialEq for $slot<T> {
            fn eq(&self, other: &Self) -> bool {
                self.$field == other.$field
            }
        }

        impl<T> Eq for $slot<T> {}

        impl<T> fmt::Debug for $slot<T> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($slot), self.$field)
            }
        }
    };
}

impl_slot_traits!(DataSlot, base);
impl_slot_traits!(TemplateSlot, index);

/// Byte offset into the constant string blob
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlobOffset(pub u16);

/// Storage of a string variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrKind {
    /// Read-only text in the constant blob
    Const { text: BlobOffset },
    /// Mutable cells, reset from a default in the constant blob
    Mutable {
        default: BlobOffset,
        data: DataSlot<StrData>,
    },
}

/// Type-specific part of a variable descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Int16 {
        template: TemplateSlot<i16>,
        data: DataSlot<i16>,
    },
    Int32 {
        template: TemplateSlot<i32>,
        data: DataSlot<i32>,
    },
    Float {
        template: TemplateSlot<f32>,
        data: DataSlot<f32>,
    },
    Double {
        template: TemplateSlot<f64>,
        data: DataSlot<f64>,
    },
    Enum {
        /// Position of the enum descriptor in the directory
        descr: usize,
        data: DataSlot<EnumData>,
    },
    String(StrKind),
    Action,
}

impl VarKind {
    pub fn var_type(&self) -> VarType {
        match self {
            VarKind::Int16 { .. } => VarType::Int16,
            VarKind::Int32 { .. } => VarType::Int32,
            VarKind::Float { .. } => VarType::Float,
            VarKind::Double { .. } => VarType::Double,
            VarKind::Enum { .. } => VarType::Enum,
            VarKind::String(_) => VarType::String,
            VarKind::Action => VarType::Action,
        }
    }
}

/// One member of an enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumMember {
    /// Handle of the variable naming this member, or [`Handle::NONE`]
    pub hnd: Handle,
    /// Value stored in data cells
    pub value: i16,
    /// Symbol text from the constant blob
    pub symbol: Option<String>,
}

/// Member list and default of an enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDescriptor {
    pub default_index: u16,
    pub members: Vec<EnumMember>,
}

impl EnumDescriptor {
    /// Value of the default member
    pub fn default_value(&self) -> i16 {
        self.members
            .get(self.default_index as usize)
            .map(|m| m.value)
            .unwrap_or_default()
    }

    pub fn contains(&self, value: i16) -> bool {
        self.members.iter().any(|m| m.value == value)
    }

    /// Member whose symbol text equals `symbol`
    pub fn by_symbol(&self, symbol: &str) -> Option<&EnumMember> {
        self.members
            .iter()
            .find(|m| m.symbol.as_deref() == Some(symbol))
    }
}

/// Immutable metadata of one variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarDescriptor {
    pub hnd: Handle,
    /// SCPI mnemonic; `None` for hidden variables
    pub name: Option<String>,
    pub kind: VarKind,
    pub vec_items: u16,
    pub vector: bool,
    pub access: AccessRights,
    pub storage: Storage,
    pub format: Format,
}

impl VarDescriptor {
    pub fn var_type(&self) -> VarType {
        self.kind.var_type()
    }

    pub fn is_const(&self) -> bool {
        matches!(self.kind, VarKind::String(StrKind::Const { .. }))
    }

    /// Packed type word as found in generated tables
    pub fn type_bits(&self) -> u16 {
        let mut flags = TypeFlags::empty();
        if self.vector {
            flags |= TypeFlags::VECTOR;
        }
        if self.is_const() {
            flags |= TypeFlags::CONST;
        }
        self.var_type().code() | flags.bits()
    }

    /// Name for diagnostics
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<hidden>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_codes() {
        for t in [
            VarType::Int16,
            VarType::Int32,
            VarType::Float,
            VarType::Double,
            VarType::Enum,
            VarType::String,
            VarType::Action,
        ] {
            assert_eq!(VarType::from_code(t.code()), Some(t));
        }
        assert_eq!(VarType::from_code(0), None);
        assert_eq!(VarType::from_code(3), None);
    }

    #[test]
    fn test_capabilities_strip_flags() {
        let rights = AccessRights::PRG | AccessRights::ADMIN | AccessRights::CLIP;
        assert_eq!(rights.capabilities(), AccessRights::PRG);
        assert_eq!(AccessRights::PRG.bits(), 0x11);
        assert_eq!(AccessRights::EX2.bits(), 0x88);
    }

    #[test]
    fn test_storage_bits() {
        assert_eq!(Storage::from_bits(0x2000), Some(Storage::Eeprom));
        assert_eq!(Storage::from_bits(0x4000), Some(Storage::Flash));
        assert_eq!(Storage::from_bits(0x6000), None);
        assert_eq!(Storage::Flash.bits(), 0x4000);
    }

    #[test]
    fn test_format_precision() {
        assert_eq!(Format::Prec3.precision(), Some(3));
        assert_eq!(Format::Sci.precision(), None);
        assert_eq!(Format::from_code(10), Some(Format::Date));
        assert_eq!(Format::from_code(11), None);
    }

    #[test]
    fn test_slot_channel_offset() {
        let slot: DataSlot<i32> = DataSlot::new(4);
        assert_eq!(slot.channel(0), 4);
        assert_eq!(slot.channel(3), 7);
    }

    #[test]
    fn test_enum_default_value() {
        let descr = EnumDescriptor {
            default_index: 1,
            members: vec![
                EnumMember {
                    hnd: Handle::NONE,
                    value: -1,
                    symbol: Some("YES".into()),
                },
                EnumMember {
                    hnd: Handle::NONE,
                    value: -2,
                    symbol: Some("NO".into()),
                },
            ],
        };
        assert_eq!(descr.default_value(), -2);
        assert!(descr.contains(-1));
        assert!(!descr.contains(-3));
        assert_eq!(descr.by_symbol("YES").map(|m| m.value), Some(-1));
    }

    #[test]
    fn test_handle_display() {
        assert_eq!(Handle(7).to_string(), "7");
        assert_eq!(Handle::NONE.to_string(), "HNON");
    }
}
