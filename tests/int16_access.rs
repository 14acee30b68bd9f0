//! Integration tests for INT16 variables
//!
//! These tests exercise the INT16 accessor against the reference tables:
//! - Defaults after init
//! - LIMIT and CLIP write policies per channel
//! - Channel, type and capability errors and their precedence
//! - Text conversion through `as_string`

mod common;

use common::{hnd, reference_registry, PRG, VEC_LEM};
use varcore::{AccessError, AccessRights, Direction, Handle};

#[test]
fn test_default_and_plain_write() {
    let mut reg = reference_registry();
    let nodeid = hnd(&reg, "NODEID");

    let mut v = 0i16;
    reg.as_int16(nodeid, Direction::Read, &mut v, 0, PRG).unwrap();
    assert_eq!(v, 1);

    let mut v = 127i16;
    reg.as_int16(nodeid, Direction::Write, &mut v, 0, PRG).unwrap();
    let mut back = 0i16;
    reg.as_int16(nodeid, Direction::Read, &mut back, 0, PRG).unwrap();
    assert_eq!(back, 127);
}

#[test]
fn test_unbounded_variable_stores_out_of_range_values() {
    let mut reg = reference_registry();
    let nodeid = hnd(&reg, "NODEID");

    // No LIMIT/CLIP flag: the declared range is informational only
    let mut v = 500i16;
    reg.as_int16(nodeid, Direction::Write, &mut v, 0, PRG).unwrap();
    let mut back = 0i16;
    reg.as_int16(nodeid, Direction::Read, &mut back, 0, PRG).unwrap();
    assert_eq!(back, 500);
}

#[test]
fn test_limit_rejects_and_keeps_value() {
    let mut reg = reference_registry();
    let iab = hnd(&reg, "IAB");
    let last = VEC_LEM - 1;

    let mut v = 101i16;
    assert_eq!(
        reg.as_int16(iab, Direction::Write, &mut v, last, PRG),
        Err(AccessError::UpperLimit)
    );
    let mut v = -101i16;
    assert_eq!(
        reg.as_int16(iab, Direction::Write, &mut v, 0, PRG),
        Err(AccessError::LowerLimit)
    );
    let mut v = i16::MIN;
    assert_eq!(
        reg.as_int16(iab, Direction::Write, &mut v, 0, PRG),
        Err(AccessError::LowerLimit)
    );

    for chan in 0..VEC_LEM {
        let mut back = 99i16;
        reg.as_int16(iab, Direction::Read, &mut back, chan, PRG).unwrap();
        assert_eq!(back, 0, "channel {} changed", chan);
    }

    // Both bounds are inclusive
    let mut v = 100i16;
    reg.as_int16(iab, Direction::Write, &mut v, last, PRG).unwrap();
    let mut v = -100i16;
    reg.as_int16(iab, Direction::Write, &mut v, 0, PRG).unwrap();
}

#[test]
fn test_clip_saturates_per_channel() {
    let mut reg = reference_registry();
    let tp1 = hnd(&reg, "TP1");

    let mut v = 2000i16;
    reg.as_int16(tp1, Direction::Write, &mut v, 3, PRG).unwrap();
    let mut v = i16::MIN;
    reg.as_int16(tp1, Direction::Write, &mut v, 1, PRG).unwrap();

    let mut values = [0i16; VEC_LEM as usize];
    for (chan, slot) in values.iter_mut().enumerate() {
        reg.as_int16(tp1, Direction::Read, slot, chan as u16, PRG).unwrap();
    }
    assert_eq!(values, [0, -500, 0, 1500]);

    let mut v = 36i16;
    reg.as_int16(tp1, Direction::Write, &mut v, 3, PRG).unwrap();
    let mut back = 0i16;
    reg.as_int16(tp1, Direction::Read, &mut back, 3, PRG).unwrap();
    assert_eq!(back, 36);
}

#[test]
fn test_channel_errors() {
    let mut reg = reference_registry();
    let nodeid = hnd(&reg, "NODEID");
    let tp1 = hnd(&reg, "TP1");

    let mut v = 0i16;
    assert_eq!(
        reg.as_int16(nodeid, Direction::Read, &mut v, 1, PRG),
        Err(AccessError::NotVector)
    );
    assert_eq!(
        reg.as_int16(tp1, Direction::Read, &mut v, VEC_LEM, PRG),
        Err(AccessError::InvalidChannel)
    );
    assert_eq!(
        reg.as_int16(tp1, Direction::Write, &mut v, u16::MAX, PRG),
        Err(AccessError::InvalidChannel)
    );
}

#[test]
fn test_unknown_handle_and_type_mismatch() {
    let mut reg = reference_registry();
    let count = reg.var_count() as u16;

    let mut v = 0i16;
    assert_eq!(
        reg.as_int16(Handle(count), Direction::Read, &mut v, 0, PRG),
        Err(AccessError::UnknownHandle)
    );
    assert_eq!(
        reg.as_int16(Handle::NONE, Direction::Write, &mut v, 0, PRG),
        Err(AccessError::UnknownHandle)
    );

    let ser = hnd(&reg, "SER");
    assert_eq!(
        reg.as_int16(ser, Direction::Read, &mut v, 0, PRG),
        Err(AccessError::InvalidType)
    );
    let nas = hnd(&reg, "NAS");
    assert_eq!(
        reg.as_int16(nas, Direction::Read, &mut v, 0, PRG),
        Err(AccessError::InvalidType)
    );

    let nodeid = hnd(&reg, "NODEID");
    let mut wide = 0i32;
    assert_eq!(
        reg.as_int32(nodeid, Direction::Read, &mut wide, 0, PRG),
        Err(AccessError::InvalidType)
    );
}

#[test]
fn test_check_precedence() {
    let mut reg = reference_registry();
    let nodeid = hnd(&reg, "NODEID");
    let ser = hnd(&reg, "SER");

    // Type before access before channel
    let mut v = 0i16;
    assert_eq!(
        reg.as_int16(ser, Direction::Write, &mut v, 7, AccessRights::CMD),
        Err(AccessError::InvalidType)
    );
    assert_eq!(
        reg.as_int16(nodeid, Direction::Write, &mut v, 7, AccessRights::CMD),
        Err(AccessError::AccessDenied)
    );

    // Channel before write policy
    let iab = hnd(&reg, "IAB");
    let mut v = 1000i16;
    assert_eq!(
        reg.as_int16(iab, Direction::Write, &mut v, VEC_LEM, PRG),
        Err(AccessError::InvalidChannel)
    );
}

#[test]
fn test_capability_gate() {
    let mut reg = reference_registry();
    let nodeid = hnd(&reg, "NODEID");

    let mut v = 0i16;
    assert_eq!(
        reg.as_int16(nodeid, Direction::Read, &mut v, 0, AccessRights::CMD),
        Err(AccessError::AccessDenied)
    );
    assert_eq!(
        reg.as_int16(nodeid, Direction::Read, &mut v, 0, AccessRights::PRG_R),
        Err(AccessError::AccessDenied)
    );

    // Admin requesters may read but not write a non-admin variable
    let admin = PRG | AccessRights::ADMIN;
    reg.as_int16(nodeid, Direction::Read, &mut v, 0, admin).unwrap();
    assert_eq!(
        reg.as_int16(nodeid, Direction::Write, &mut v, 0, admin),
        Err(AccessError::AccessDenied)
    );

    // Behavior flags on the requester side are ignored
    reg.as_int16(nodeid, Direction::Write, &mut v, 0, PRG | AccessRights::CLIP)
        .unwrap();
}

#[test]
fn test_as_string() {
    let mut reg = reference_registry();
    let tp1 = hnd(&reg, "TP1");
    let nodeid = hnd(&reg, "NODEID");

    let mut text = "36".to_string();
    reg.as_string(tp1, Direction::Write, &mut text, 3, PRG).unwrap();
    text.clear();
    reg.as_string(tp1, Direction::Read, &mut text, 3, PRG).unwrap();
    assert_eq!(text, "36");

    let mut text = " 18 ".to_string();
    reg.as_string(tp1, Direction::Write, &mut text, 2, PRG).unwrap();

    let mut text = "18.23".to_string();
    assert_eq!(
        reg.as_string(tp1, Direction::Write, &mut text, 2, PRG),
        Err(AccessError::InvalidValue)
    );
    let mut text = "40000".to_string();
    assert_eq!(
        reg.as_string(tp1, Direction::Write, &mut text, 2, PRG),
        Err(AccessError::InvalidValue)
    );

    let mut text = "0x10".to_string();
    reg.as_string(nodeid, Direction::Write, &mut text, 0, PRG).unwrap();
    reg.as_string(nodeid, Direction::Read, &mut text, 0, PRG).unwrap();
    assert_eq!(text, "16");

    let mut text = "022".to_string();
    reg.as_string(nodeid, Direction::Write, &mut text, 0, PRG).unwrap();
    reg.as_string(nodeid, Direction::Read, &mut text, 0, PRG).unwrap();
    assert_eq!(text, "18");

    // Channel errors surface through the text path as well
    let mut text = String::new();
    assert_eq!(
        reg.as_string(nodeid, Direction::Read, &mut text, 1, PRG),
        Err(AccessError::NotVector)
    );
}
