use crate::test_utils::{decode, decode64};
use crate::{Equality, MiniTableId, MiniTables, Platform, compatible, equals, equals_across};

fn store(descriptors: &[&str]) -> (MiniTables, Vec<MiniTableId>) {
    let mut tables = MiniTables::new();
    let ids = descriptors
        .iter()
        .map(|d| tables.build_message(d.as_bytes(), Platform::Bits64).unwrap())
        .collect();
    (tables, ids)
}

#[test]
fn compatible_compares_field_layout() {
    assert!(compatible(&decode64("$("), &decode64("$(")));
    assert!(compatible(&decode64("$((c("), &decode64("$((c(")));
    assert!(!compatible(&decode64("$("), &decode64("$+")));
    assert!(!compatible(&decode64("$("), &decode64("$((")));
    assert!(!compatible(&decode64("$<"), &decode64("$N<")));
}

#[test]
fn platform_changes_layout() {
    let wide = decode("$/+1(", Platform::Bits64);
    let narrow = decode("$/+1(", Platform::Bits32);
    assert!(!compatible(&wide, &narrow));
}

#[test]
fn compatible_ignores_linked_subs() {
    let (mut tables, ids) = store(&["$(", "$+", "$3", "$3"]);
    tables.link(ids[2], &[Some(ids[0])], &[]).unwrap();
    tables.link(ids[3], &[Some(ids[1])], &[]).unwrap();

    assert!(compatible(tables.message(ids[2]), tables.message(ids[3])));
    assert_eq!(equals(&tables, ids[2], ids[3]), Equality::NotEqual);
}

#[test]
fn equals_follows_sub_messages() {
    let (mut tables, ids) = store(&["$(", "$(", "$3", "$3"]);
    tables.link(ids[2], &[Some(ids[0])], &[]).unwrap();
    tables.link(ids[3], &[Some(ids[1])], &[]).unwrap();

    assert_eq!(equals(&tables, ids[2], ids[3]), Equality::Equal);
    assert_eq!(equals(&tables, ids[2], ids[2]), Equality::Equal);
}

#[test]
fn unlinked_subs_are_equal() {
    let (tables, ids) = store(&["$3", "$3"]);
    assert_eq!(equals(&tables, ids[0], ids[1]), Equality::Equal);
}

#[test]
fn cycles_terminate() {
    let (mut tables, ids) = store(&["$3", "$3"]);
    tables.link(ids[0], &[Some(ids[0])], &[]).unwrap();
    tables.link(ids[1], &[Some(ids[1])], &[]).unwrap();

    assert_eq!(equals(&tables, ids[0], ids[1]), Equality::Equal);
}

#[test]
fn pairing_must_be_consistent() {
    // Both fields of the source share one sub; the destination splits them.
    let (mut tables, ids) = store(&["$(", "$(", "$(", "$33", "$33"]);
    tables
        .link(ids[3], &[Some(ids[0]), Some(ids[0])], &[])
        .unwrap();
    tables
        .link(ids[4], &[Some(ids[1]), Some(ids[2])], &[])
        .unwrap();

    assert_eq!(equals(&tables, ids[3], ids[4]), Equality::NotEqual);
}

#[test]
fn equals_across_stores() {
    let (mut a, a_ids) = store(&["$(", "$3"]);
    let (mut b, b_ids) = store(&["$3", "$("]);
    a.link(a_ids[1], &[Some(a_ids[0])], &[]).unwrap();
    b.link(b_ids[0], &[Some(b_ids[1])], &[]).unwrap();

    assert_eq!(equals_across(&a, a_ids[1], &b, b_ids[0]), Equality::Equal);
    assert_eq!(equals_across(&a, a_ids[0], &b, b_ids[0]), Equality::NotEqual);
}

#[test]
fn equality_from_bool() {
    assert_eq!(Equality::from(true), Equality::Equal);
    assert_eq!(Equality::from(false), Equality::NotEqual);
}
