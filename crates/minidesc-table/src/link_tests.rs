use crate::{
    ErrorCategory, ExtMode, FieldMode, LinkError, MiniTableId, MiniTables, Platform, Sub,
};

fn store(descriptors: &[&str]) -> (MiniTables, Vec<MiniTableId>) {
    let mut tables = MiniTables::new();
    let ids = descriptors
        .iter()
        .map(|d| tables.build_message(d.as_bytes(), Platform::Bits64).unwrap())
        .collect();
    (tables, ids)
}

#[test]
fn link_messages_and_enums_in_sub_list_order() {
    let (mut tables, ids) = store(&["$(", "$/", "$343"]);
    let color = tables.build_enum(b"!(").unwrap();
    let parent = ids[2];

    tables
        .link(parent, &[Some(ids[0]), Some(ids[1])], &[Some(color)])
        .unwrap();

    let t = tables.message(parent);
    let fields = t.fields();
    assert_eq!(t.sub_message(&fields[0]), Some(ids[0]));
    assert_eq!(t.sub_enum(&fields[1]), Some(color));
    assert_eq!(t.sub_message(&fields[2]), Some(ids[1]));
    assert_eq!(t.sub_message(&fields[1]), None);
}

#[test]
fn unlinked_slots_point_at_empty_table() {
    let (tables, ids) = store(&["$3"]);
    let t = tables.message(ids[0]);
    let sub = t.sub_message(&t.fields()[0]).unwrap();

    assert!(sub.is_empty_table());
    assert_eq!(tables.message(sub).field_count(), 0);
    assert_eq!(tables.message(sub).size(), 8);
}

#[test]
fn none_entries_are_skipped() {
    let (mut tables, ids) = store(&["$(", "$33"]);
    tables.link(ids[1], &[None, Some(ids[0])], &[]).unwrap();

    assert_eq!(
        tables.message(ids[1]).subs(),
        &[Sub::Message(MiniTableId::EMPTY), Sub::Message(ids[0])]
    );
}

#[test]
fn relinking_is_idempotent() {
    let (mut tables, ids) = store(&["$(", "$3"]);
    tables.link(ids[1], &[Some(ids[0])], &[]).unwrap();
    let once = tables.message(ids[1]).clone();
    tables.link(ids[1], &[Some(ids[0])], &[]).unwrap();

    assert_eq!(tables.message(ids[1]), &once);
}

#[test]
fn self_reference() {
    let (mut tables, ids) = store(&["$3"]);
    tables.link(ids[0], &[Some(ids[0])], &[]).unwrap();

    let t = tables.message(ids[0]);
    assert_eq!(t.sub_message(&t.fields()[0]), Some(ids[0]));
}

#[test]
fn map_entry_sub_upgrades_field_to_map() {
    let (mut tables, ids) = store(&["%1(", "$G"]);
    assert_eq!(tables.message(ids[1]).fields()[0].mode(), FieldMode::Array);

    tables.set_sub_message(ids[1], 0, ids[0]).unwrap();

    let field = tables.message(ids[1]).fields()[0];
    assert_eq!(field.mode(), FieldMode::Map);
    assert!(field.is_map());
}

#[test]
fn map_rejections() {
    let (mut tables, ids) = store(&["%1(", "%(3", "$2"]);

    assert_eq!(
        tables.set_sub_message(ids[1], 1, ids[0]),
        Err(LinkError::NestedMap(2))
    );
    assert_eq!(
        tables.set_sub_message(ids[2], 0, ids[0]),
        Err(LinkError::GroupOfMapEntry(1))
    );
}

#[test]
fn field_kind_mismatches() {
    let (mut tables, ids) = store(&["$(.4"]);
    let e = tables.build_enum(b"!(").unwrap();
    let t = ids[0];

    assert_eq!(
        tables.set_sub_message(t, 0, MiniTableId::EMPTY),
        Err(LinkError::NotSubMessage(1))
    );
    assert_eq!(tables.set_sub_enum(t, 1, e), Err(LinkError::NotClosedEnum(2)));
    assert_eq!(tables.set_sub_enum(t, 5, e), Err(LinkError::NoSuchField(5)));
    assert!(tables.set_sub_enum(t, 2, e).is_ok());
}

#[test]
fn table_level_link_with_explicit_flags() {
    let (tables, ids) = store(&["$3"]);
    let mut t = tables.message(ids[0]).clone();

    t.set_sub_message(0, ids[0], ExtMode::IS_MAP_ENTRY).unwrap();
    assert!(t.fields()[0].is_map());

    let mut entry = tables.message(ids[0]).clone();
    entry.ext |= ExtMode::IS_MAP_ENTRY;
    assert_eq!(
        entry.set_sub_message(0, ids[0], ExtMode::IS_MAP_ENTRY),
        Err(LinkError::NestedMap(1))
    );
}

#[test]
fn count_mismatch_changes_nothing() {
    let (mut tables, ids) = store(&["$(", "$343"]);
    let before = tables.message(ids[1]).clone();

    let err = tables.link(ids[1], &[Some(ids[0])], &[None]).unwrap_err();
    assert_eq!(
        err,
        LinkError::SubMessageCount {
            expected: 2,
            actual: 1
        }
    );
    assert_eq!(err.category(), ErrorCategory::Unresolved);

    let err = tables
        .link(ids[1], &[Some(ids[0]), Some(ids[0])], &[])
        .unwrap_err();
    assert_eq!(
        err,
        LinkError::SubEnumCount {
            expected: 1,
            actual: 0
        }
    );
    assert_eq!(tables.message(ids[1]), &before);
}
