//! Programmatic construction of table sets
//!
//! [`TableBuilder`] lays out descriptors, templates, data array sizes, blob
//! offsets and enum member tables the same way the offline generator does,
//! so a [`TableSet`] built here is indistinguishable from a generated one.
//!
//! ```ignore
//! let mut b = TableBuilder::new();
//! let ser = b.add(VarSpec::int32("SER", 10000, 0, 99999).access(AccessRights::PRG | AccessRights::ADMIN));
//! let tp1 = b.add(VarSpec::int16("TP1", 0, -500, 1500).vector(8));
//! let tables = b.build()?;
//! ```

use super::{RawVarDesc, RegistryOptions, TableSet, HNON};
use crate::error::{Result, VarCoreError};
use crate::types::{
    AccessRights, Format, Handle, NumericTemplate, Storage, TypeFlags, VarType, STRBUF_SIZE,
};

#[derive(Debug, Clone)]
enum SpecKind {
    Int16(NumericTemplate<i16>),
    Int32(NumericTemplate<i32>),
    Float(NumericTemplate<f32>),
    Double(NumericTemplate<f64>),
    Enum {
        default_index: u16,
        members: Vec<(i16, String)>,
    },
    Str {
        text: String,
        constant: bool,
    },
    Action,
}

/// Declaration of one variable
#[derive(Debug, Clone)]
pub struct VarSpec {
    name: Option<String>,
    kind: SpecKind,
    vec_items: u16,
    access: AccessRights,
    storage: Storage,
    format: Format,
}

impl VarSpec {
    fn new(name: &str, kind: SpecKind) -> Self {
        Self {
            name: Some(name.to_string()),
            kind,
            vec_items: 1,
            access: AccessRights::PRG,
            storage: Storage::Volatile,
            format: Format::Default,
        }
    }

    pub fn int16(name: &str, default: i16, min: i16, max: i16) -> Self {
        Self::new(name, SpecKind::Int16(NumericTemplate::new(default, min, max)))
    }

    pub fn int32(name: &str, default: i32, min: i32, max: i32) -> Self {
        Self::new(name, SpecKind::Int32(NumericTemplate::new(default, min, max)))
    }

    pub fn float(name: &str, default: f32, min: f32, max: f32) -> Self {
        Self::new(name, SpecKind::Float(NumericTemplate::new(default, min, max)))
    }

    pub fn double(name: &str, default: f64, min: f64, max: f64) -> Self {
        Self::new(name, SpecKind::Double(NumericTemplate::new(default, min, max)))
    }

    /// Enumeration with `(value, symbol)` members; `default_index` selects a member
    pub fn enumeration(name: &str, members: &[(i16, &str)], default_index: u16) -> Self {
        Self::new(
            name,
            SpecKind::Enum {
                default_index,
                members: members.iter().map(|(v, s)| (*v, s.to_string())).collect(),
            },
        )
    }

    /// Mutable string initialised to `default` on reset
    pub fn string(name: &str, default: &str) -> Self {
        Self::new(
            name,
            SpecKind::Str {
                text: default.to_string(),
                constant: false,
            },
        )
    }

    /// Read-only string backed by the constant blob
    pub fn const_string(name: &str, text: &str) -> Self {
        Self::new(
            name,
            SpecKind::Str {
                text: text.to_string(),
                constant: true,
            },
        )
    }

    pub fn action(name: &str) -> Self {
        Self::new(name, SpecKind::Action)
    }

    pub fn vector(mut self, items: u16) -> Self {
        self.vec_items = items;
        self
    }

    /// Replace capability and admin bits, keeping LIMIT/CLIP
    pub fn access(mut self, rights: AccessRights) -> Self {
        let behavior = self.access & (AccessRights::LIMIT | AccessRights::CLIP);
        self.access = (rights - AccessRights::LIMIT - AccessRights::CLIP) | behavior;
        self
    }

    pub fn limit(mut self) -> Self {
        self.access.remove(AccessRights::CLIP);
        self.access.insert(AccessRights::LIMIT);
        self
    }

    pub fn clip(mut self) -> Self {
        self.access.remove(AccessRights::LIMIT);
        self.access.insert(AccessRights::CLIP);
        self
    }

    pub fn storage(mut self, storage: Storage) -> Self {
        self.storage = storage;
        self
    }

    pub fn format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    /// Exclude the variable from name lookup
    pub fn hidden(mut self) -> Self {
        self.name = None;
        self
    }
}

/// Incremental builder of a [`TableSet`]
#[derive(Debug, Default)]
pub struct TableBuilder {
    tables: TableSet,
    overflow: Option<String>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn options(mut self, options: RegistryOptions) -> Self {
        self.tables.options = options;
        self
    }

    /// Declare a variable and return its handle
    pub fn add(&mut self, spec: VarSpec) -> Handle {
        let hnd = self.narrow(self.tables.vars.len(), "handle");
        let vec_items = spec.vec_items.max(1);

        let scpi_idx = match &spec.name {
            Some(name) => {
                let offset = self.tables.const_str.push(name);
                self.narrow(offset, "scpi_idx")
            }
            None => HNON,
        };

        let mut flags = TypeFlags::empty();
        if vec_items > 1 {
            flags |= TypeFlags::VECTOR;
        }

        let (var_type, descr_idx, data_idx) = match spec.kind {
            SpecKind::Int16(t) => {
                let descr = self.tables.descr_s16.len();
                self.tables.descr_s16.push(t);
                let data = self.grow(DataArray::S16, vec_items);
                (VarType::Int16, self.narrow(descr, "descr_s16"), data)
            }
            SpecKind::Int32(t) => {
                let descr = self.tables.descr_s32.len();
                self.tables.descr_s32.push(t);
                let data = self.grow(DataArray::S32, vec_items);
                (VarType::Int32, self.narrow(descr, "descr_s32"), data)
            }
            SpecKind::Float(t) => {
                let descr = self.tables.descr_f32.len();
                self.tables.descr_f32.push(t);
                let data = self.grow(DataArray::F32, vec_items);
                (VarType::Float, self.narrow(descr, "descr_f32"), data)
            }
            SpecKind::Double(t) => {
                let descr = self.tables.descr_f64.len();
                self.tables.descr_f64.push(t);
                let data = self.grow(DataArray::F64, vec_items);
                (VarType::Double, self.narrow(descr, "descr_f64"), data)
            }
            SpecKind::Enum {
                default_index,
                members,
            } => {
                let descr = self.tables.enum_members.len();
                self.tables.enum_members.push(default_index as i16);
                self.tables.enum_members.push(members.len() as i16);
                for (value, symbol) in &members {
                    let offset = self.tables.const_str.push(symbol);
                    let symbol_idx = self.narrow(offset, "enum symbol");
                    self.tables.enum_members.push(HNON as i16);
                    self.tables.enum_members.push(*value);
                    self.tables.enum_members.push(symbol_idx as i16);
                }
                let data = self.grow(DataArray::Enum, vec_items);
                (VarType::Enum, self.narrow(descr, "enum_members"), data)
            }
            SpecKind::Str { text, constant } => {
                let offset = self.tables.const_str.push(&text);
                let descr = self.narrow(offset, "string default");
                if constant {
                    flags |= TypeFlags::CONST;
                    (VarType::String, descr, 0)
                } else {
                    let cell = self.grow(DataArray::Str, vec_items) as usize;
                    let byte_offset = self.narrow(cell * STRBUF_SIZE, "data_str");
                    (VarType::String, descr, byte_offset)
                }
            }
            SpecKind::Action => (VarType::Action, 0, 0),
        };

        self.tables.vars.push(RawVarDesc {
            hnd,
            scpi_idx,
            type_bits: var_type.code() | flags.bits(),
            vec_items,
            acc_rights: spec.access.bits(),
            descr_idx,
            data_idx,
            storage: spec.storage.bits(),
            fmt: spec.format.code(),
        });

        Handle(hnd)
    }

    /// Finish the table set
    pub fn build(self) -> Result<TableSet> {
        match self.overflow {
            Some(what) => Err(VarCoreError::Table(format!(
                "{} does not fit into a 16-bit table index",
                what
            ))),
            None => Ok(self.tables),
        }
    }

    /// Reserve `items` cells in a data array, returning the first cell index
    fn grow(&mut self, array: DataArray, items: u16) -> u16 {
        let counter = match array {
            DataArray::S16 => &mut self.tables.data_s16_cnt,
            DataArray::S32 => &mut self.tables.data_s32_cnt,
            DataArray::F32 => &mut self.tables.data_f32_cnt,
            DataArray::F64 => &mut self.tables.data_f64_cnt,
            DataArray::Enum => &mut self.tables.data_enum_cnt,
            DataArray::Str => &mut self.tables.data_str_cnt,
        };
        let base = *counter;
        match counter.checked_add(items) {
            Some(next) => *counter = next,
            None => self.note_overflow(format!("{:?} data array", array)),
        }
        base
    }

    fn narrow(&mut self, value: usize, what: &str) -> u16 {
        match u16::try_from(value) {
            Ok(v) if v != HNON => v,
            _ => {
                self.note_overflow(what.to_string());
                HNON
            }
        }
    }

    fn note_overflow(&mut self, what: String) {
        if self.overflow.is_none() {
            self.overflow = Some(what);
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum DataArray {
    S16,
    S32,
    F32,
    F64,
    Enum,
    Str,
}
