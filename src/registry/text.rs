//! String access (`as_string`)

use super::access::{check_access, check_channel};
use super::{traced, Registry};
use crate::codec::{self, IntWidth};
use crate::error::{AccessError, AccessResult};
use crate::types::{
    AccessRights, Direction, Format, Handle, StrCell, StrKind, VarKind, STRBUF_CHARS,
};

impl Registry {
    /// Read or write any variable as text
    ///
    /// Numeric and enum variables are converted through the string codec and
    /// then take the same path as the typed accessors. String variables are
    /// copied in and out of their cells; a write that does not fit fails with
    /// [`AccessError::SizeTooBig`] and leaves the cell unchanged.
    pub fn as_string(
        &mut self,
        hnd: Handle,
        direction: Direction,
        text: &mut String,
        chan: u16,
        req: AccessRights,
    ) -> AccessResult<()> {
        let var = self.dir.var(hnd)?;
        let (kind, format) = (var.kind, var.format);

        match kind {
            VarKind::Int16 { .. } => match direction {
                Direction::Write => {
                    let mut v = codec::parse_i16(text)
                        .map_err(|e| rejected(hnd, chan, e))?;
                    self.as_int16(hnd, direction, &mut v, chan, req)
                }
                Direction::Read => {
                    let mut v = 0i16;
                    self.as_int16(hnd, direction, &mut v, chan, req)?;
                    *text = codec::render_int(v.into(), IntWidth::Bits16, format);
                    Ok(())
                }
            },
            VarKind::Enum { descr, .. } => match direction {
                Direction::Write => {
                    let parsed = codec::parse_i16(text).or_else(|_| {
                        self.dir
                            .enum_descr(descr)?
                            .by_symbol(text.trim())
                            .map(|m| m.value)
                            .ok_or(AccessError::InvalidValue)
                    });
                    let mut v = parsed.map_err(|e| rejected(hnd, chan, e))?;
                    self.as_int16(hnd, direction, &mut v, chan, req)
                }
                Direction::Read => {
                    let mut v = 0i16;
                    self.as_int16(hnd, direction, &mut v, chan, req)?;
                    *text = codec::render_int(v.into(), IntWidth::Bits16, format);
                    Ok(())
                }
            },
            VarKind::Int32 { .. } => match direction {
                Direction::Write => {
                    let parsed = if format == Format::Date {
                        codec::parse_date(text)
                    } else {
                        codec::parse_i32(text)
                    };
                    let mut v = parsed.map_err(|e| rejected(hnd, chan, e))?;
                    self.as_int32(hnd, direction, &mut v, chan, req)
                }
                Direction::Read => {
                    let mut v = 0i32;
                    self.as_int32(hnd, direction, &mut v, chan, req)?;
                    *text = codec::render_int(v.into(), IntWidth::Bits32, format);
                    Ok(())
                }
            },
            VarKind::Float { .. } => match direction {
                Direction::Write => {
                    let mut v = codec::parse_f32(text).map_err(|e| rejected(hnd, chan, e))?;
                    self.as_float(hnd, direction, &mut v, chan, req)
                }
                Direction::Read => {
                    let mut v = 0f32;
                    self.as_float(hnd, direction, &mut v, chan, req)?;
                    *text = codec::render_float(v, format);
                    Ok(())
                }
            },
            VarKind::Double { .. } => match direction {
                Direction::Write => {
                    let mut v = codec::parse_f64(text).map_err(|e| rejected(hnd, chan, e))?;
                    self.as_double(hnd, direction, &mut v, chan, req)
                }
                Direction::Read => {
                    let mut v = 0f64;
                    self.as_double(hnd, direction, &mut v, chan, req)?;
                    *text = codec::render_float(v, format);
                    Ok(())
                }
            },
            VarKind::String(strkind) => {
                let res = self.string_cell(hnd, strkind, direction, text, chan, req);
                traced(res, hnd, direction, chan)
            }
            VarKind::Action => Err(AccessError::InvalidType),
        }
    }

    fn string_cell(
        &mut self,
        hnd: Handle,
        strkind: StrKind,
        direction: Direction,
        text: &mut String,
        chan: u16,
        req: AccessRights,
    ) -> AccessResult<()> {
        let var = self.dir.var(hnd)?;
        check_channel(var, chan)?;

        match strkind {
            StrKind::Const { text: offset } => {
                if direction == Direction::Write {
                    return Err(AccessError::AccessDenied);
                }
                check_access(var.access, direction, req, self.options.access_policy)?;
                let stored = self
                    .dir
                    .blob
                    .str_at(offset.0 as usize)
                    .ok_or(AccessError::Generic)?;
                text.clear();
                text.push_str(codec::truncate_utf8(&stored, STRBUF_CHARS));
                Ok(())
            }
            StrKind::Mutable { data, .. } => {
                check_access(var.access, direction, req, self.options.access_policy)?;
                let cell = self
                    .store
                    .strings
                    .get_mut(data.channel(chan))
                    .ok_or(AccessError::InvalidChannel)?;
                match direction {
                    Direction::Read => {
                        text.clear();
                        text.push_str(cell.as_str());
                    }
                    Direction::Write => {
                        // Text after an embedded NUL is never stored
                        let input = text.split('\0').next().unwrap_or_default();
                        let mut next = StrCell::new();
                        next.push_str(input).map_err(|_| AccessError::SizeTooBig)?;
                        *cell = next;
                    }
                }
                Ok(())
            }
        }
    }
}

fn rejected(hnd: Handle, chan: u16, err: AccessError) -> AccessError {
    tracing::debug!("Rejected text for handle {} channel {}: {}", hnd, chan, err);
    err
}
