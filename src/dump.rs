//! Human-readable variable dumps
//!
//! [`Registry::dump_var`] renders into a caller buffer through a
//! [`BoundedWriter`]: output stops cleanly when the buffer is full and is
//! always NUL-terminated, so a short buffer yields a valid prefix instead of
//! an error.
//!
//! ```text
//! YNU hnd=11 type=ENUM[8] storage=RAM fmt=DEFAULT acc=0x0011 enum=2 data=0
//!       -2 NO: 0 1 2 3 4 6 7
//!       -1 YES: 5
//! ```

use crate::codec;
use crate::registry::Registry;
use crate::types::{Handle, NumericCell, StrKind, VarDescriptor, VarKind};
use std::fmt::{self, Display, Write};
use std::ops::Range;

/// `fmt::Write` sink over a fixed byte buffer
///
/// One byte is reserved for the terminating NUL. A write that does not fit
/// is cut at the last whole character and every later write fails.
#[derive(Debug)]
pub struct BoundedWriter<'a> {
    buf: &'a mut [u8],
    len: usize,
    truncated: bool,
}

impl<'a> BoundedWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self {
            buf,
            len: 0,
            truncated: false,
        }
    }

    fn capacity(&self) -> usize {
        self.buf.len().saturating_sub(1)
    }

    /// Bytes written so far, terminator excluded
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.buf[..self.len]).unwrap_or_default()
    }

    /// Terminate the output and return its length
    pub fn finish(self) -> usize {
        if let Some(end) = self.buf.get_mut(self.len) {
            *end = 0;
        }
        self.len
    }
}

impl fmt::Write for BoundedWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if self.truncated {
            return Err(fmt::Error);
        }
        let room = self.capacity() - self.len;
        let part = codec::truncate_utf8(s, room);
        self.buf[self.len..self.len + part.len()].copy_from_slice(part.as_bytes());
        self.len += part.len();
        if part.len() < s.len() {
            self.truncated = true;
            return Err(fmt::Error);
        }
        Ok(())
    }
}

impl Registry {
    /// Render variable `hnd` from channel `chan` on into `buf`
    ///
    /// Returns the number of bytes written, not counting the NUL terminator.
    pub fn dump_var(&self, buf: &mut [u8], hnd: Handle, chan: u16) -> usize {
        let mut writer = BoundedWriter::new(buf);
        // A full buffer is the expected way for a dump to end early.
        let _ = render(self, &mut writer, hnd, chan);
        writer.finish()
    }

    /// Render all channels of variable `hnd` into a new string
    pub fn dump_to_string(&self, hnd: Handle) -> String {
        let mut out = String::new();
        let _ = render(self, &mut out, hnd, 0);
        out
    }
}

fn render(reg: &Registry, out: &mut impl Write, hnd: Handle, chan: u16) -> fmt::Result {
    let var = match reg.descriptor(hnd) {
        Ok(var) => var,
        Err(e) => return writeln!(out, "hnd={}: {}", hnd, e),
    };

    write_header(out, var)?;

    let channels = chan..var.vec_items;
    if channels.is_empty() {
        return writeln!(out, "  channel {} outside {} channels", chan, var.vec_items);
    }

    let store = reg.store();
    match var.kind {
        VarKind::Int16 { data, .. } => numeric_rows(out, &store.s16, data.base(), channels),
        VarKind::Int32 { data, .. } => numeric_rows(out, &store.s32, data.base(), channels),
        VarKind::Float { data, .. } => numeric_rows(out, &store.f32, data.base(), channels),
        VarKind::Double { data, .. } => numeric_rows(out, &store.f64, data.base(), channels),
        VarKind::Enum { data, .. } => {
            let Ok(descr) = reg.enum_descriptor(hnd) else {
                return Ok(());
            };
            for member in &descr.members {
                write!(
                    out,
                    "  {:>6} {}:",
                    member.value,
                    member.symbol.as_deref().unwrap_or("-")
                )?;
                for c in channels.clone() {
                    if store.enums.get(data.channel(c)) == Some(&member.value) {
                        write!(out, " {}", c)?;
                    }
                }
                writeln!(out)?;
            }
            Ok(())
        }
        VarKind::String(StrKind::Mutable { data, .. }) => {
            for c in channels {
                if let Some(cell) = store.strings.get(data.channel(c)) {
                    writeln!(out, "  [{}] {:?}", c, cell.as_str())?;
                }
            }
            Ok(())
        }
        VarKind::String(StrKind::Const { text }) => {
            let stored = reg.directory().blob().str_at(text.0 as usize).unwrap_or_default();
            writeln!(out, "  {:?}", stored)
        }
        VarKind::Action => Ok(()),
    }
}

fn write_header(out: &mut impl Write, var: &VarDescriptor) -> fmt::Result {
    write!(out, "{} hnd={} type={}", var.display_name(), var.hnd, var.var_type())?;
    if var.vector {
        write!(out, "[{}]", var.vec_items)?;
    }
    write!(
        out,
        " storage={} fmt={} acc=0x{:04X}",
        var.storage,
        var.format,
        var.access.bits()
    )?;
    match var.kind {
        VarKind::Int16 { template, data } => writeln!(out, " descr={} data={}", template.index(), data.base()),
        VarKind::Int32 { template, data } => writeln!(out, " descr={} data={}", template.index(), data.base()),
        VarKind::Float { template, data } => writeln!(out, " descr={} data={}", template.index(), data.base()),
        VarKind::Double { template, data } => writeln!(out, " descr={} data={}", template.index(), data.base()),
        VarKind::Enum { descr, data } => writeln!(out, " enum={} data={}", descr, data.base()),
        VarKind::String(StrKind::Mutable { default, data }) => {
            writeln!(out, " blob={} data={}", default.0, data.base())
        }
        VarKind::String(StrKind::Const { text }) => writeln!(out, " blob={}", text.0),
        VarKind::Action => writeln!(out),
    }
}

fn numeric_rows<T: Display>(
    out: &mut impl Write,
    cells: &[NumericCell<T>],
    base: usize,
    channels: Range<u16>,
) -> fmt::Result {
    for c in channels {
        if let Some(cell) = cells.get(base + c as usize) {
            writeln!(out, "  [{}] value={} min={} max={}", c, cell.value, cell.min, cell.max)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{TableBuilder, VarSpec};

    fn registry() -> Registry {
        let mut b = TableBuilder::new();
        b.add(VarSpec::int16("TP1", 3, -5, 5).vector(3));
        b.add(VarSpec::enumeration("YN", &[(0, "NO"), (1, "YES")], 1).vector(2));
        Registry::init(b.build().unwrap()).unwrap()
    }

    #[test]
    fn test_bounded_writer_stops_at_capacity() {
        let mut buf = [0xAAu8; 6];
        let mut w = BoundedWriter::new(&mut buf);
        assert!(write!(w, "abc").is_ok());
        assert!(write!(w, "defg").is_err());
        assert!(w.is_truncated());
        assert_eq!(w.as_str(), "abcde");
        assert_eq!(w.finish(), 5);
        assert_eq!(buf[5], 0);
    }

    #[test]
    fn test_bounded_writer_keeps_whole_chars() {
        let mut buf = [0u8; 3];
        let mut w = BoundedWriter::new(&mut buf);
        assert!(write!(w, "aé").is_err());
        assert_eq!(w.as_str(), "a");
    }

    #[test]
    fn test_empty_buffer() {
        let reg = registry();
        assert_eq!(reg.dump_var(&mut [], Handle(0), 0), 0);
    }

    #[test]
    fn test_dump_numeric_channels() {
        let reg = registry();
        let text = reg.dump_to_string(Handle(0));
        assert!(text.starts_with("TP1 hnd=0 type=INT16[3] storage=RAM fmt=DEFAULT"));
        assert!(text.contains("  [2] value=3 min=-5 max=5"));
    }

    #[test]
    fn test_dump_enum_marks_channels() {
        let reg = registry();
        let text = reg.dump_to_string(Handle(1));
        assert!(text.contains("YES: 0 1\n"));
        assert!(text.contains("NO:\n"));
    }

    #[test]
    fn test_dump_partial_output_is_prefix() {
        let reg = registry();
        let full = reg.dump_to_string(Handle(0));
        let mut buf = [0u8; 20];
        let n = reg.dump_var(&mut buf, Handle(0), 0);
        assert_eq!(n, 19);
        assert_eq!(&buf[..n], &full.as_bytes()[..n]);
        assert_eq!(buf[n], 0);
    }

    #[test]
    fn test_dump_unknown_handle() {
        let reg = registry();
        assert_eq!(reg.dump_to_string(Handle(9)), "hnd=9: unknown handle\n");
    }
}
