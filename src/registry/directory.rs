//! Registry directory: typed, validated view of the generated tables
//!
//! [`Directory::from_tables`] checks every raw descriptor against the sizes of
//! the arrays it points into and converts it into a [`VarDescriptor`] whose
//! [`VarKind`] owns typed slots. After this pass no accessor has to trust a
//! raw index again.

use crate::config::{ConstBlob, RawVarDesc, TableSet, ENUM_HEADER_WORDS, ENUM_MEMBER_WORDS, HNON};
use crate::error::{AccessError, AccessResult, Result, VarCoreError};
use crate::types::{
    AccessRights, BlobOffset, DataSlot, EnumDescriptor, EnumMember, Format, Handle,
    NumericTemplate, Storage, StrKind, TemplateSlot, TypeFlags, VarDescriptor, VarKind, VarType,
    STRBUF_CHARS, STRBUF_SIZE, TYPE_MASK,
};
use std::collections::HashMap;

/// Number of cells in each data array
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DataSizes {
    pub s16: usize,
    pub s32: usize,
    pub f32: usize,
    pub f64: usize,
    pub enums: usize,
    pub strings: usize,
}

/// Immutable part of a registry
#[derive(Debug, Clone)]
pub struct Directory {
    pub(crate) vars: Vec<VarDescriptor>,
    pub(crate) descr_s16: Vec<NumericTemplate<i16>>,
    pub(crate) descr_s32: Vec<NumericTemplate<i32>>,
    pub(crate) descr_f32: Vec<NumericTemplate<f32>>,
    pub(crate) descr_f64: Vec<NumericTemplate<f64>>,
    pub(crate) enums: Vec<EnumDescriptor>,
    pub(crate) blob: ConstBlob,
    pub(crate) sizes: DataSizes,
}

impl Directory {
    /// Validate generated tables and build the typed directory
    pub fn from_tables(tables: &TableSet) -> Result<Self> {
        let mut dir = Directory {
            vars: Vec::with_capacity(tables.vars.len()),
            descr_s16: tables.descr_s16.clone(),
            descr_s32: tables.descr_s32.clone(),
            descr_f32: tables.descr_f32.clone(),
            descr_f64: tables.descr_f64.clone(),
            enums: Vec::new(),
            blob: tables.const_str.clone(),
            sizes: DataSizes {
                s16: tables.data_s16_cnt as usize,
                s32: tables.data_s32_cnt as usize,
                f32: tables.data_f32_cnt as usize,
                f64: tables.data_f64_cnt as usize,
                enums: tables.data_enum_cnt as usize,
                strings: tables.data_str_cnt as usize,
            },
        };

        if tables.vars.len() >= HNON as usize {
            return Err(VarCoreError::Table(format!(
                "{} variables exceed the handle range",
                tables.vars.len()
            )));
        }

        check_templates(&dir.descr_s16, "descr_s16")?;
        check_templates(&dir.descr_s32, "descr_s32")?;
        check_templates(&dir.descr_f32, "descr_f32")?;
        check_templates(&dir.descr_f64, "descr_f64")?;

        // Several variables may share one member list (e.g. yes/no enums).
        let mut enum_cache: HashMap<u16, usize> = HashMap::new();

        for (i, raw) in tables.vars.iter().enumerate() {
            let var = dir.convert(i, raw, tables, &mut enum_cache)?;
            dir.vars.push(var);
        }

        Ok(dir)
    }

    /// Descriptor for a handle
    pub fn var(&self, hnd: Handle) -> AccessResult<&VarDescriptor> {
        self.vars.get(hnd.index()).ok_or(AccessError::UnknownHandle)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn sizes(&self) -> DataSizes {
        self.sizes
    }

    pub fn blob(&self) -> &ConstBlob {
        &self.blob
    }

    pub(crate) fn enum_descr(&self, idx: usize) -> AccessResult<&EnumDescriptor> {
        self.enums.get(idx).ok_or(AccessError::Generic)
    }

    fn convert(
        &mut self,
        i: usize,
        raw: &RawVarDesc,
        tables: &TableSet,
        enum_cache: &mut HashMap<u16, usize>,
    ) -> Result<VarDescriptor> {
        if raw.hnd as usize != i {
            return Err(VarCoreError::table(i, format!("hnd field is {}", raw.hnd)));
        }

        let var_type = VarType::from_code(raw.type_bits & TYPE_MASK).ok_or_else(|| {
            VarCoreError::table(i, format!("unsupported type code {}", raw.type_bits & TYPE_MASK))
        })?;
        let flags = TypeFlags::from_bits(raw.type_bits & !TYPE_MASK).ok_or_else(|| {
            VarCoreError::table(i, format!("unknown type flags 0x{:04X}", raw.type_bits))
        })?;

        if raw.vec_items == 0 {
            return Err(VarCoreError::table(i, "vec_items is 0"));
        }
        let vector = flags.contains(TypeFlags::VECTOR);
        if vector != (raw.vec_items > 1) {
            return Err(VarCoreError::table(
                i,
                format!("VECTOR flag disagrees with vec_items {}", raw.vec_items),
            ));
        }
        let constant = flags.contains(TypeFlags::CONST);
        if constant && var_type != VarType::String {
            return Err(VarCoreError::table(i, "CONST flag on a non-string type"));
        }

        let access = AccessRights::from_bits(raw.acc_rights).ok_or_else(|| {
            VarCoreError::table(i, format!("unknown access bits 0x{:04X}", raw.acc_rights))
        })?;
        if access.is_limit() && access.is_clip() {
            return Err(VarCoreError::table(i, "LIMIT and CLIP are both set"));
        }

        let storage = match Storage::from_bits(raw.storage) {
            Some(s) if raw.storage & !Storage::MASK == 0 => s,
            _ => {
                return Err(VarCoreError::table(
                    i,
                    format!("unknown storage class 0x{:04X}", raw.storage),
                ))
            }
        };
        let format = Format::from_code(raw.fmt)
            .ok_or_else(|| VarCoreError::table(i, format!("unknown format {}", raw.fmt)))?;

        let name = if raw.scpi_idx == HNON {
            None
        } else {
            Some(
                self.blob
                    .str_at(raw.scpi_idx as usize)
                    .ok_or_else(|| VarCoreError::table(i, "scpi_idx outside constant blob"))?,
            )
        };

        let items = raw.vec_items as usize;
        let kind = match var_type {
            VarType::Int16 => {
                check_template(i, raw.descr_idx, self.descr_s16.len())?;
                check_cells(i, raw.data_idx as usize, items, self.sizes.s16, "data_s16")?;
                VarKind::Int16 {
                    template: TemplateSlot::new(raw.descr_idx),
                    data: DataSlot::new(raw.data_idx),
                }
            }
            VarType::Int32 => {
                check_template(i, raw.descr_idx, self.descr_s32.len())?;
                check_cells(i, raw.data_idx as usize, items, self.sizes.s32, "data_s32")?;
                VarKind::Int32 {
                    template: TemplateSlot::new(raw.descr_idx),
                    data: DataSlot::new(raw.data_idx),
                }
            }
            VarType::Float => {
                check_template(i, raw.descr_idx, self.descr_f32.len())?;
                check_cells(i, raw.data_idx as usize, items, self.sizes.f32, "data_f32")?;
                VarKind::Float {
                    template: TemplateSlot::new(raw.descr_idx),
                    data: DataSlot::new(raw.data_idx),
                }
            }
            VarType::Double => {
                check_template(i, raw.descr_idx, self.descr_f64.len())?;
                check_cells(i, raw.data_idx as usize, items, self.sizes.f64, "data_f64")?;
                VarKind::Double {
                    template: TemplateSlot::new(raw.descr_idx),
                    data: DataSlot::new(raw.data_idx),
                }
            }
            VarType::Enum => {
                check_cells(i, raw.data_idx as usize, items, self.sizes.enums, "data_enum")?;
                let descr = match enum_cache.get(&raw.descr_idx) {
                    Some(&idx) => idx,
                    None => {
                        let descr = self.parse_enum(i, raw.descr_idx as usize, tables)?;
                        self.enums.push(descr);
                        let idx = self.enums.len() - 1;
                        enum_cache.insert(raw.descr_idx, idx);
                        idx
                    }
                };
                VarKind::Enum {
                    descr,
                    data: DataSlot::new(raw.data_idx),
                }
            }
            VarType::String => {
                let text = self
                    .blob
                    .bytes_at(raw.descr_idx as usize)
                    .ok_or_else(|| VarCoreError::table(i, "string descr_idx outside constant blob"))?;
                if constant {
                    VarKind::String(StrKind::Const {
                        text: BlobOffset(raw.descr_idx),
                    })
                } else {
                    if text.len() > STRBUF_CHARS {
                        return Err(VarCoreError::table(
                            i,
                            format!("default string of {} bytes exceeds a cell", text.len()),
                        ));
                    }
                    if std::str::from_utf8(text).is_err() {
                        return Err(VarCoreError::table(i, "default string is not UTF-8"));
                    }
                    let byte_offset = raw.data_idx as usize;
                    if byte_offset % STRBUF_SIZE != 0 {
                        return Err(VarCoreError::table(
                            i,
                            format!("string data_idx {} is not cell aligned", byte_offset),
                        ));
                    }
                    let cell = byte_offset / STRBUF_SIZE;
                    check_cells(i, cell, items, self.sizes.strings, "data_str")?;
                    VarKind::String(StrKind::Mutable {
                        default: BlobOffset(raw.descr_idx),
                        data: DataSlot::new(cell as u16),
                    })
                }
            }
            VarType::Action => VarKind::Action,
        };

        Ok(VarDescriptor {
            hnd: Handle(raw.hnd),
            name,
            kind,
            vec_items: raw.vec_items,
            vector,
            access,
            storage,
            format,
        })
    }

    fn parse_enum(&self, i: usize, start: usize, tables: &TableSet) -> Result<EnumDescriptor> {
        let words = &tables.enum_members;
        let header = words
            .get(start..start + ENUM_HEADER_WORDS)
            .ok_or_else(|| VarCoreError::table(i, "enum descr_idx outside member table"))?;
        let (default_index, count) = (header[0], header[1]);
        if count <= 0 {
            return Err(VarCoreError::table(i, "enum has no members"));
        }
        if default_index < 0 || default_index >= count {
            return Err(VarCoreError::table(
                i,
                format!("default member {} of {}", default_index, count),
            ));
        }

        let body_start = start + ENUM_HEADER_WORDS;
        let body = words
            .get(body_start..body_start + count as usize * ENUM_MEMBER_WORDS)
            .ok_or_else(|| VarCoreError::table(i, "enum members run past member table"))?;

        let mut members = Vec::with_capacity(count as usize);
        for triple in body.chunks_exact(ENUM_MEMBER_WORDS) {
            let hnd = Handle(triple[0] as u16);
            if !hnd.is_none() && hnd.index() >= tables.vars.len() {
                return Err(VarCoreError::table(i, format!("enum member names handle {}", hnd)));
            }
            let symbol_idx = triple[2] as u16;
            let symbol = if symbol_idx == HNON {
                None
            } else {
                Some(
                    self.blob
                        .str_at(symbol_idx as usize)
                        .ok_or_else(|| VarCoreError::table(i, "enum symbol outside constant blob"))?,
                )
            };
            members.push(EnumMember {
                hnd,
                value: triple[1],
                symbol,
            });
        }

        Ok(EnumDescriptor {
            default_index: default_index as u16,
            members,
        })
    }
}

fn check_template(i: usize, descr_idx: u16, len: usize) -> Result<()> {
    if (descr_idx as usize) < len {
        Ok(())
    } else {
        Err(VarCoreError::table(
            i,
            format!("descr_idx {} outside template table of {}", descr_idx, len),
        ))
    }
}

fn check_cells(i: usize, base: usize, items: usize, len: usize, array: &str) -> Result<()> {
    if base + items <= len {
        Ok(())
    } else {
        Err(VarCoreError::table(
            i,
            format!("cells {}..{} outside {} of {}", base, base + items, array, len),
        ))
    }
}

fn check_templates<T: PartialOrd + std::fmt::Debug>(
    templates: &[NumericTemplate<T>],
    table: &str,
) -> Result<()> {
    for (idx, t) in templates.iter().enumerate() {
        if t.min > t.max {
            return Err(VarCoreError::Table(format!(
                "{}[{}]: min {:?} above max {:?}",
                table, idx, t.min, t.max
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{TableBuilder, VarSpec};

    fn sample() -> TableSet {
        let mut b = TableBuilder::new();
        b.add(VarSpec::int16("A", 1, 0, 10));
        b.add(VarSpec::enumeration("E", &[(1, "ON"), (0, "OFF")], 0).vector(2));
        b.add(VarSpec::string("S", "abc"));
        b.build().unwrap()
    }

    #[test]
    fn test_converts_builder_output() {
        let dir = Directory::from_tables(&sample()).unwrap();
        assert_eq!(dir.len(), 3);
        assert_eq!(dir.var(Handle(1)).unwrap().var_type(), VarType::Enum);
        assert!(dir.var(Handle(1)).unwrap().vector);
        assert_eq!(dir.enums.len(), 1);
        assert_eq!(dir.enums[0].members[1].symbol.as_deref(), Some("OFF"));
        assert_eq!(dir.var(Handle(3)).unwrap_err(), AccessError::UnknownHandle);
    }

    #[test]
    fn test_rejects_data_index_past_array() {
        let mut tables = sample();
        tables.data_s16_cnt = 0;
        let err = Directory::from_tables(&tables).unwrap_err();
        assert!(err.to_string().contains("data_s16"));
    }

    #[test]
    fn test_rejects_limit_with_clip() {
        let mut tables = sample();
        tables.vars[0].acc_rights |= 0x6000;
        assert!(Directory::from_tables(&tables).is_err());
    }

    #[test]
    fn test_rejects_vector_flag_mismatch() {
        let mut tables = sample();
        tables.vars[0].vec_items = 3;
        assert!(Directory::from_tables(&tables).is_err());
    }

    #[test]
    fn test_rejects_unaligned_string_cell() {
        let mut tables = sample();
        tables.vars[2].data_idx = 5;
        let err = Directory::from_tables(&tables).unwrap_err();
        assert!(err.to_string().contains("not cell aligned"));
    }

    #[test]
    fn test_rejects_int8_type() {
        let mut tables = sample();
        tables.vars[0].type_bits = 0;
        let err = Directory::from_tables(&tables).unwrap_err();
        assert!(err.to_string().contains("unsupported type code 0"));
    }

    #[test]
    fn test_rejects_bad_enum_default() {
        let mut tables = sample();
        let descr = tables.vars[1].descr_idx as usize;
        tables.enum_members[descr] = 2;
        assert!(Directory::from_tables(&tables).is_err());
    }

    #[test]
    fn test_shared_member_list_parsed_once() {
        let mut tables = sample();
        let mut second = tables.vars[1];
        second.hnd = 3;
        second.vec_items = 1;
        second.type_bits = VarType::Enum.code();
        second.data_idx = 0;
        tables.vars.push(second);
        let dir = Directory::from_tables(&tables).unwrap();
        assert_eq!(dir.enums.len(), 1);
    }
}
