use std::collections::BTreeSet;

use minidesc_core::lex::encode_varint;
use proptest::prelude::*;

use crate::{DecodeError, DecodeErrorKind, MiniTableEnum, MtDataEncoder, decode_enum};

fn encode(values: impl IntoIterator<Item = u32>) -> String {
    let mut e = MtDataEncoder::new();
    e.start_enum();
    for v in values {
        e.put_enum_value(v).unwrap();
    }
    e.end_enum().unwrap();
    e.finish()
}

fn decode(data: &str) -> MiniTableEnum {
    decode_enum(data.as_bytes()).unwrap()
}

#[test]
fn dense_values_then_sparse_tail() {
    let t = decode("!$!}}!");

    assert_eq!(t.mask_limit(), 32);
    assert_eq!(t.value_count(), 1);
    assert_eq!(t.mask_words(), &[0b100011]);
    assert_eq!(t.values(), &[1000]);
    for v in [0, 1, 5, 1000] {
        assert!(t.check_value(v), "{v}");
    }
    for v in [2, 4, 6, 31, 32, 999, 1001] {
        assert!(!t.check_value(v), "{v}");
    }
}

#[test]
fn empty_input() {
    assert_eq!(decode(""), MiniTableEnum::default());
    assert_eq!(decode("!"), MiniTableEnum::default());
}

#[test]
fn single_mask_char() {
    let t = decode("!(");
    assert!(!t.check_value(0));
    assert!(t.check_value(1));
    assert!(t.check_value(2));
    assert!(!t.check_value(3));
    assert_eq!(t.mask_limit(), 32);
}

#[test]
fn bitmap_grows_to_cover_value() {
    let t = decode(&encode([100]));
    assert_eq!(t.mask_limit(), 128);
    assert_eq!(t.mask_words().len(), 4);
    assert_eq!(t.value_count(), 0);
    assert!(t.check_value(100));
    assert!(!t.check_value(99));
}

#[test]
fn lone_large_value_is_listed() {
    let t = decode(&encode([600]));
    assert_eq!(t.mask_limit(), 0);
    assert_eq!(t.values(), &[600]);
    assert!(t.check_value(600));
}

#[test]
fn top_of_range() {
    let t = decode(&encode([0, u32::MAX]));
    assert!(t.check_value(0));
    assert!(t.check_value(u32::MAX));
    assert!(!t.check_value(u32::MAX - 1));
}

#[test]
fn negative_values_are_listed() {
    let values: BTreeSet<u32> = [-5i32, 0, 7, -1].iter().map(|&v| v as u32).collect();
    let t = decode(&encode(values.iter().copied()));

    assert_eq!(t.mask_limit(), 32);
    assert_eq!(t.values(), &[-5i32 as u32, -1i32 as u32]);
    for v in [-5i32, 0, 7, -1] {
        assert!(t.check_value(v as u32), "{v}");
    }
    for v in [-6i32, -4, -2, 1, 8] {
        assert!(!t.check_value(v as u32), "{v}");
    }
}

#[test]
fn errors() {
    let kind = |data: &str| decode_enum(data.as_bytes()).map(|_| ()).map_err(|e| e.kind().clone());

    assert_eq!(kind("$"), Err(DecodeErrorKind::InvalidEnumVersion('$')));
    assert_eq!(kind("!B"), Err(DecodeErrorKind::InvalidChar('B')));

    let mut past_end = String::from("!");
    encode_varint(&mut past_end, u32::MAX, b'_', b'~');
    past_end.push('#');
    assert_eq!(kind(&past_end), Err(DecodeErrorKind::EnumValueOverflow));
    assert_eq!(kind("!~~~~~~c"), Err(DecodeErrorKind::OverlongVarint));

    let err = decode_enum(b"!B").unwrap_err();
    assert!(matches!(err, DecodeError::Enum(_)));
    insta::assert_snapshot!(err, @"Error building enum MiniTable: Invalid char: B");
}

fn value_set() -> impl Strategy<Value = BTreeSet<u32>> {
    prop::collection::btree_set(
        prop_oneof![0u32..64, 0u32..4096, any::<u32>()],
        0..40,
    )
}

proptest! {
    #[test]
    fn encoded_values_are_members(values in value_set()) {
        let t = decode(&encode(values.iter().copied()));

        for &v in &values {
            prop_assert!(t.check_value(v), "missing {}", v);
        }
        for &v in &values {
            for neighbor in [v.wrapping_sub(1), v.wrapping_add(1)] {
                prop_assert_eq!(t.check_value(neighbor), values.contains(&neighbor));
            }
        }
        prop_assert_eq!(t.mask_limit() % 32, 0);
        prop_assert_eq!(t.values().len(), t.value_count() as usize);
    }
}
