//! Test data builders for the reference variable set

use varcore::{AccessRights, Format, Storage, TableBuilder, TableSet, VarSpec};

/// Channels of the vector fixtures
pub const VEC_LEM: u16 = 4;

/// Builder for the reference table set
///
/// Holds the same variables the firmware test tables declare, in the same
/// order, so handles are stable across test files.
pub struct ReferenceTables {
    builder: TableBuilder,
}

impl ReferenceTables {
    pub fn new() -> Self {
        Self {
            builder: TableBuilder::new(),
        }
    }

    /// Declare every reference variable
    pub fn with_all(mut self) -> Self {
        let b = &mut self.builder;

        // INT32
        b.add(VarSpec::int32("SER", 10000, 0, 99999).access(AccessRights::PRG | AccessRights::ADMIN));
        b.add(VarSpec::int32("POW", 0, -1000, 1000).vector(VEC_LEM).limit());
        b.add(VarSpec::int32("PAB", 0, -500, 500).clip());
        b.add(VarSpec::int32("ERR", 0, i32::MIN, i32::MAX).format(Format::Hex4));
        b.add(VarSpec::int32("DAT", 0, 0, i32::MAX).format(Format::Date));

        // INT16
        b.add(VarSpec::int16("NODEID", 1, 1, 127));
        b.add(VarSpec::int16("TP1", 0, -500, 1500).vector(VEC_LEM).clip());
        b.add(VarSpec::int16("IAB", 0, -100, 100).vector(VEC_LEM).limit());

        // FLOAT / DOUBLE
        b.add(VarSpec::float("CUR", 0.0, -20.0, 20.0).vector(VEC_LEM).limit());
        b.add(
            VarSpec::float("CUR_NMAX", -500.0, -1000.0, 1000.0)
                .vector(VEC_LEM)
                .clip()
                .storage(Storage::Eeprom),
        );
        b.add(VarSpec::float("CUR_PMAX", 500.0, -1000.0, 1000.0).storage(Storage::Flash));
        b.add(VarSpec::double("GAIN", 1.0, 0.0, 10.0).format(Format::Prec3));

        // STRING
        b.add(VarSpec::string("NAS", "192.168.2.10").vector(2));
        b.add(VarSpec::const_string("IDN", "Test application V1.01 (R) foo"));
        b.add(VarSpec::const_string("OFF", "OFF"));

        // ENUM
        b.add(VarSpec::enumeration("XON", &[(0, "OFF"), (1, "ON")], 1));
        b.add(VarSpec::enumeration("YON", &[(0, "NO"), (1, "YES")], 0));
        b.add(VarSpec::enumeration("LOD", &[(0, "LOW"), (1, "HIGH")], 0));
        b.add(
            VarSpec::enumeration("YNU", &[(-2, "NO"), (-1, "YES"), (0, "UNKNOWN")], 0)
                .vector(2 * VEC_LEM),
        );

        // ACTION
        b.add(VarSpec::action("RST"));

        self
    }

    pub fn build(self) -> TableSet {
        self.builder.build().expect("reference tables fit")
    }
}

impl Default for ReferenceTables {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_tables_builder() {
        let tables = ReferenceTables::new().with_all().build();
        assert_eq!(tables.var_count(), 20);
        assert_eq!(tables.data_s16_cnt, 1 + 2 * VEC_LEM);
        assert_eq!(tables.data_str_cnt, 2);
    }
}
