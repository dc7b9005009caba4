use proptest::prelude::*;

use crate::test_utils::{decode, message_shape, platform};
use crate::{FieldModifiers, FieldType, MessageModifiers};

proptest! {
    #[test]
    fn decoded_fields_match_schema(shape in message_shape(), platform in platform()) {
        let table = decode(&shape.encode(), platform);

        prop_assert_eq!(table.field_count(), shape.fields.len());
        prop_assert_eq!(
            table.is_extendable(),
            shape.modifiers.contains(MessageModifiers::IS_EXTENDABLE)
        );

        for (f, field) in shape.fields.iter().zip(table.fields()) {
            let mods = f.modifiers;
            let repeated = mods.contains(FieldModifiers::IS_REPEATED);

            prop_assert_eq!(field.number(), f.number);
            prop_assert_eq!(field.field_type(), f.ty);
            prop_assert_eq!(field.is_array(), repeated);
            prop_assert_eq!(field.is_packed(), mods.contains(FieldModifiers::IS_PACKED));
            prop_assert_eq!(
                field.is_closed_enum(),
                mods.contains(FieldModifiers::IS_CLOSED_ENUM)
            );
            if f.ty == FieldType::String {
                let validated = field.descriptor_type() == FieldType::String;
                prop_assert_eq!(validated, mods.contains(FieldModifiers::VALIDATE_UTF8));
            }

            if shape.oneof_of(f.number).is_some() {
                prop_assert!(field.is_in_oneof());
            } else if mods.contains(FieldModifiers::IS_REQUIRED) {
                prop_assert!(field.hasbit_index().unwrap() < 64 + table.required_count() as u32);
            } else if repeated || mods.contains(FieldModifiers::IS_PROTO3_SINGULAR) {
                prop_assert!(!field.has_presence());
            } else {
                prop_assert!(field.hasbit_index().is_some());
            }

            prop_assert_eq!(field.sub_index().is_some(), f.ty.is_sub_message() || field.is_closed_enum());
        }
    }

    #[test]
    fn sub_list_covers_every_sub_field(shape in message_shape()) {
        let table = decode(&shape.encode(), crate::Platform::Bits64);
        let list = table.sub_list();

        prop_assert_eq!(list.fields.len(), table.subs().len());
        for (slot, &index) in list.fields.iter().enumerate() {
            let field = &table.fields()[index];
            prop_assert_eq!(field.sub_index(), Some(slot as u16));
        }
    }
}
