//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;

pub use builders::{ReferenceTables, VEC_LEM};

use varcore::{AccessRights, Handle, Registry};

/// Requester capabilities used by most tests
pub const PRG: AccessRights = AccessRights::PRG;

/// Registry initialised from the reference tables
pub fn reference_registry() -> Registry {
    Registry::init(ReferenceTables::new().with_all().build()).expect("reference tables are valid")
}

/// Handle of a reference variable; panics if it is not declared
pub fn hnd(reg: &Registry, name: &str) -> Handle {
    reg.get_hnd(name)
        .unwrap_or_else(|| panic!("variable {} not declared", name))
}

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}
