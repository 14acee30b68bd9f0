//! Live data arrays of a registry

use super::directory::{DataSizes, Directory};
use crate::error::{Result, VarCoreError};
use crate::types::{NumericCell, NumericTemplate, StrCell, StrKind, VarKind};

/// Mutable state: one cell per channel of every variable
#[derive(Debug, Clone, Default)]
pub struct DataStore {
    pub(crate) s16: Vec<NumericCell<i16>>,
    pub(crate) s32: Vec<NumericCell<i32>>,
    pub(crate) f32: Vec<NumericCell<f32>>,
    pub(crate) f64: Vec<NumericCell<f64>>,
    pub(crate) enums: Vec<i16>,
    pub(crate) strings: Vec<StrCell>,
}

impl DataStore {
    /// Allocate zeroed arrays of the given sizes
    pub fn with_sizes(sizes: DataSizes) -> Self {
        Self {
            s16: vec![zero_cell(); sizes.s16],
            s32: vec![zero_cell(); sizes.s32],
            f32: vec![zero_cell(); sizes.f32],
            f64: vec![zero_cell(); sizes.f64],
            enums: vec![0; sizes.enums],
            strings: vec![StrCell::new(); sizes.strings],
        }
    }

    /// Restore every channel of every variable to its declared default
    pub fn reset(&mut self, dir: &Directory) -> Result<()> {
        for var in &dir.vars {
            let items = var.vec_items as usize;
            match var.kind {
                VarKind::Int16 { template, data } => {
                    let t = template_at(&dir.descr_s16, template.index())?;
                    fill(&mut self.s16, data.base(), items, t.into())?;
                }
                VarKind::Int32 { template, data } => {
                    let t = template_at(&dir.descr_s32, template.index())?;
                    fill(&mut self.s32, data.base(), items, t.into())?;
                }
                VarKind::Float { template, data } => {
                    let t = template_at(&dir.descr_f32, template.index())?;
                    fill(&mut self.f32, data.base(), items, t.into())?;
                }
                VarKind::Double { template, data } => {
                    let t = template_at(&dir.descr_f64, template.index())?;
                    fill(&mut self.f64, data.base(), items, t.into())?;
                }
                VarKind::Enum { descr, data } => {
                    let value = dir
                        .enums
                        .get(descr)
                        .map(|e| e.default_value())
                        .ok_or_else(|| VarCoreError::table(var.hnd.index(), "missing enum descriptor"))?;
                    fill(&mut self.enums, data.base(), items, value)?;
                }
                VarKind::String(StrKind::Mutable { default, data }) => {
                    let text = dir
                        .blob
                        .bytes_at(default.0 as usize)
                        .and_then(|b| std::str::from_utf8(b).ok())
                        .ok_or_else(|| VarCoreError::table(var.hnd.index(), "missing string default"))?;
                    let mut cell = StrCell::new();
                    cell.push_str(text).map_err(|_| {
                        VarCoreError::table(var.hnd.index(), "string default exceeds a cell")
                    })?;
                    fill(&mut self.strings, data.base(), items, cell)?;
                }
                VarKind::String(StrKind::Const { .. }) | VarKind::Action => {}
            }
        }
        Ok(())
    }
}

fn zero_cell<T: Default>() -> NumericCell<T> {
    NumericCell {
        value: T::default(),
        min: T::default(),
        max: T::default(),
    }
}

fn template_at<T: Copy>(templates: &[NumericTemplate<T>], idx: usize) -> Result<NumericTemplate<T>> {
    templates
        .get(idx)
        .copied()
        .ok_or_else(|| VarCoreError::Table(format!("template {} missing", idx)))
}

fn fill<T: Clone>(cells: &mut [T], base: usize, items: usize, value: T) -> Result<()> {
    let len = cells.len();
    cells
        .get_mut(base..base + items)
        .ok_or_else(|| VarCoreError::Table(format!("cells {}..{} outside array of {}", base, base + items, len)))?
        .fill(value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{TableBuilder, VarSpec};

    #[test]
    fn test_reset_fills_every_channel() {
        let mut b = TableBuilder::new();
        b.add(VarSpec::int32("A", 7, 0, 10).vector(3));
        b.add(VarSpec::string("S", "dflt").vector(2));
        b.add(VarSpec::enumeration("E", &[(5, "FIVE"), (-2, "NEG")], 1));
        let dir = Directory::from_tables(&b.build().unwrap()).unwrap();

        let mut store = DataStore::with_sizes(dir.sizes());
        assert_eq!(store.s32[2].value, 0);
        store.reset(&dir).unwrap();

        assert!(store.s32.iter().all(|c| c.value == 7 && c.max == 10));
        assert!(store.strings.iter().all(|s| s.as_str() == "dflt"));
        assert_eq!(store.enums, vec![-2]);
    }
}
