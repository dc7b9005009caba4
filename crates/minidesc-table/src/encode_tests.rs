use crate::encode::MtDataEncoder;
use crate::error::EncodeError;
use crate::modifiers::{FieldModifiers, MessageModifiers};
use crate::types::FieldType;

fn message(modifiers: MessageModifiers, fields: &[(FieldType, u32, FieldModifiers)]) -> String {
    let mut e = MtDataEncoder::new();
    e.start_message(modifiers);
    for &(ty, number, mods) in fields {
        e.put_field(ty, number, mods).unwrap();
    }
    e.finish()
}

#[test]
fn empty_message() {
    insta::assert_snapshot!(message(MessageModifiers::empty(), &[]), @"$");
}

#[test]
fn single_int32() {
    let out = message(
        MessageModifiers::empty(),
        &[(FieldType::Int32, 1, FieldModifiers::empty())],
    );
    insta::assert_snapshot!(out, @"$(");
}

#[test]
fn gap_emits_skip() {
    let out = message(
        MessageModifiers::empty(),
        &[
            (FieldType::Int32, 1, FieldModifiers::empty()),
            (FieldType::Int32, 5, FieldModifiers::empty()),
        ],
    );
    insta::assert_snapshot!(out, @"$(c(");
}

#[test]
fn required_modifier() {
    let out = message(
        MessageModifiers::empty(),
        &[(FieldType::Int32, 1, FieldModifiers::IS_REQUIRED)],
    );
    insta::assert_snapshot!(out, @"$(N");
}

#[test]
fn proto3_singular_modifier() {
    let out = message(
        MessageModifiers::empty(),
        &[(FieldType::Int32, 1, FieldModifiers::IS_PROTO3_SINGULAR)],
    );
    insta::assert_snapshot!(out, @"$(P");
}

#[test]
fn packed_flip_is_relative_to_message_default() {
    let repeated_packed = FieldModifiers::IS_REPEATED | FieldModifiers::IS_PACKED;

    let proto2 = message(
        MessageModifiers::empty(),
        &[(FieldType::Int32, 1, repeated_packed)],
    );
    insta::assert_snapshot!(proto2, @"$<M");

    let proto3 = message(
        MessageModifiers::DEFAULT_IS_PACKED,
        &[(FieldType::Int32, 1, repeated_packed)],
    );
    insta::assert_snapshot!(proto3, @"$N<");
}

#[test]
fn unpackable_types_never_flip() {
    let out = message(
        MessageModifiers::DEFAULT_IS_PACKED,
        &[(FieldType::Message, 1, FieldModifiers::IS_REPEATED)],
    );
    // Repeated message is 17 + 20.
    insta::assert_snapshot!(out, @"$NG");
}

#[test]
fn utf8_validation_flip() {
    let validated = message(
        MessageModifiers::VALIDATE_UTF8,
        &[(FieldType::String, 1, FieldModifiers::VALIDATE_UTF8)],
    );
    insta::assert_snapshot!(validated, @"$M1");

    let tightened = message(
        MessageModifiers::empty(),
        &[(
            FieldType::String,
            1,
            FieldModifiers::VALIDATE_UTF8 | FieldModifiers::IS_PROTO3_SINGULAR,
        )],
    );
    insta::assert_snapshot!(tightened, @"$1X");
}

#[test]
fn utf8_downgrade_is_rejected() {
    let mut e = MtDataEncoder::new();
    e.start_message(MessageModifiers::VALIDATE_UTF8);
    let err = e
        .put_field(FieldType::String, 3, FieldModifiers::empty())
        .unwrap_err();
    assert_eq!(err, EncodeError::Utf8Downgrade(3));
}

#[test]
fn closed_enum_uses_its_own_code() {
    let out = message(
        MessageModifiers::empty(),
        &[
            (FieldType::Enum, 1, FieldModifiers::IS_CLOSED_ENUM),
            (
                FieldType::Enum,
                2,
                FieldModifiers::IS_CLOSED_ENUM | FieldModifiers::IS_REPEATED,
            ),
            (FieldType::Enum, 3, FieldModifiers::empty()),
        ],
    );
    insta::assert_snapshot!(out, @"$4H.");
}

#[test]
fn closed_enum_modifier_requires_enum_type() {
    let mut e = MtDataEncoder::new();
    e.start_message(MessageModifiers::empty());
    let err = e
        .put_field(FieldType::Int32, 1, FieldModifiers::IS_CLOSED_ENUM)
        .unwrap_err();
    assert_eq!(err, EncodeError::ClosedEnumType(FieldType::Int32));
}

#[test]
fn field_numbers_must_increase() {
    let mut e = MtDataEncoder::new();
    e.start_message(MessageModifiers::empty());
    e.put_field(FieldType::Bool, 4, FieldModifiers::empty()).unwrap();

    let err = e
        .put_field(FieldType::Bool, 4, FieldModifiers::empty())
        .unwrap_err();
    assert_eq!(err, EncodeError::FieldOutOfOrder { number: 4, last: 4 });

    let err = e
        .put_field(FieldType::Bool, 0, FieldModifiers::empty())
        .unwrap_err();
    assert_eq!(err, EncodeError::FieldNumberOutOfRange(0));
}

#[test]
fn oneofs_follow_fields() {
    let mut e = MtDataEncoder::new();
    e.start_message(MessageModifiers::empty());
    for number in 1..=3 {
        e.put_field(FieldType::Int32, number, FieldModifiers::empty())
            .unwrap();
    }
    e.start_oneof().unwrap();
    e.put_oneof_field(1).unwrap();
    e.put_oneof_field(2).unwrap();
    e.start_oneof().unwrap();
    e.put_oneof_field(3).unwrap();
    insta::assert_snapshot!(e.as_str(), @"$(((^!|#~$");

    let err = e
        .put_field(FieldType::Int32, 9, FieldModifiers::empty())
        .unwrap_err();
    assert_eq!(err, EncodeError::InvalidState("put_field"));
}

#[test]
fn oneof_member_requires_open_oneof() {
    let mut e = MtDataEncoder::new();
    e.start_message(MessageModifiers::empty());
    assert_eq!(
        e.put_oneof_field(1),
        Err(EncodeError::InvalidState("put_oneof_field"))
    );
}

#[test]
fn large_oneof_member_spans_characters() {
    let mut e = MtDataEncoder::new();
    e.start_message(MessageModifiers::empty());
    e.put_field(FieldType::Bool, 127, FieldModifiers::empty())
        .unwrap();
    e.start_oneof().unwrap();
    e.put_oneof_field(127).unwrap();
    // Skip of 127 is `~` (31) then `b` (3 << 5), then the Bool code.
    insta::assert_snapshot!(e.as_str(), @"$~b/^b!");
}

#[test]
fn enum_with_dense_and_sparse_values() {
    let mut e = MtDataEncoder::new();
    e.start_enum();
    for value in [0, 1, 5, 1000] {
        e.put_enum_value(value).unwrap();
    }
    e.end_enum().unwrap();
    insta::assert_snapshot!(e.as_str(), @"!$!}}!");
}

#[test]
fn enum_starting_far_from_zero() {
    let mut e = MtDataEncoder::new();
    e.start_enum();
    e.put_enum_value(10).unwrap();
    e.put_enum_value(12).unwrap();
    e.end_enum().unwrap();
    // Skip 10 then mask 0b101.
    insta::assert_snapshot!(e.as_str(), @"!i&");
}

#[test]
fn empty_enum() {
    let mut e = MtDataEncoder::new();
    e.start_enum();
    e.end_enum().unwrap();
    insta::assert_snapshot!(e.as_str(), @"!");
}

#[test]
fn enum_values_must_increase() {
    let mut e = MtDataEncoder::new();
    e.start_enum();
    e.put_enum_value(3).unwrap();
    assert_eq!(
        e.put_enum_value(3),
        Err(EncodeError::EnumValueOutOfOrder { value: 3, last: 3 })
    );
    assert_eq!(
        e.put_enum_value(1),
        Err(EncodeError::EnumValueOutOfOrder { value: 1, last: 3 })
    );
}

#[test]
fn enum_operations_need_enum_state() {
    let mut e = MtDataEncoder::new();
    assert_eq!(
        e.put_enum_value(0),
        Err(EncodeError::InvalidState("put_enum_value"))
    );
    e.start_message(MessageModifiers::empty());
    assert_eq!(e.end_enum(), Err(EncodeError::InvalidState("end_enum")));
}

#[test]
fn closed_enum_takes_no_more_values() {
    let mut e = MtDataEncoder::new();
    e.start_enum();
    e.put_enum_value(0).unwrap();
    e.end_enum().unwrap();

    assert_eq!(
        e.put_enum_value(3),
        Err(EncodeError::InvalidState("put_enum_value"))
    );
    assert_eq!(e.end_enum(), Err(EncodeError::InvalidState("end_enum")));
    insta::assert_snapshot!(e.as_str(), @"!!");
}

#[test]
fn map_entry() {
    let mut e = MtDataEncoder::new();
    e.encode_map(
        FieldType::String,
        FieldType::Int32,
        FieldModifiers::empty(),
        FieldModifiers::empty(),
    )
    .unwrap();
    insta::assert_snapshot!(e.as_str(), @"%1(");

    e.clear();
    e.encode_map(
        FieldType::String,
        FieldType::Message,
        FieldModifiers::VALIDATE_UTF8,
        FieldModifiers::empty(),
    )
    .unwrap();
    insta::assert_snapshot!(e.as_str(), @"%1T3");
}

#[test]
fn extension_with_skip() {
    let mut e = MtDataEncoder::new();
    e.encode_extension(FieldType::Message, 1000, FieldModifiers::empty())
        .unwrap();
    insta::assert_snapshot!(e.as_str(), @"#g~3");
}

#[test]
fn message_set_marker() {
    let mut e = MtDataEncoder::new();
    e.encode_message_set();
    insta::assert_snapshot!(e.finish(), @"&");
}
