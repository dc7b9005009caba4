//! Schema generators and layout dumps shared by the tests.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use proptest::prelude::*;

use crate::{
    FieldModifiers, FieldRep, FieldType, MessageModifiers, MiniTable, MtDataEncoder, Platform,
    decode_message,
};

/// Decodes `data`, failing the test on error.
pub fn decode(data: &str, platform: Platform) -> MiniTable {
    decode_message(data.as_bytes(), platform).unwrap_or_else(|e| panic!("{data:?}: {e}"))
}

pub fn decode64(data: &str) -> MiniTable {
    decode(data, Platform::Bits64)
}

/// One line per field: number, logical type, mode, rep, offset, presence.
pub fn dump_layout(table: &MiniTable) -> String {
    let mut out = String::new();
    writeln!(
        out,
        "size={} dense_below={} required={}",
        table.size(),
        table.dense_below(),
        table.required_count()
    )
    .unwrap();
    for f in table.fields() {
        let rep = match f.rep() {
            FieldRep::OneByte => "1B",
            FieldRep::FourByte => "4B",
            FieldRep::StringView => "SV",
            FieldRep::EightByte => "8B",
        };
        let presence = match (f.hasbit_index(), f.oneof_case_offset()) {
            (Some(bit), _) => format!("hasbit={bit}"),
            (_, Some(case)) => format!("case@{case}"),
            _ => "none".to_string(),
        };
        writeln!(
            out,
            "#{} {:?} {:?} {rep} @{} {presence}",
            f.number(),
            f.field_type(),
            f.mode(),
            f.offset()
        )
        .unwrap();
    }
    out
}

#[derive(Clone, Debug)]
pub struct FieldShape {
    pub number: u32,
    pub ty: FieldType,
    pub modifiers: FieldModifiers,
}

#[derive(Clone, Debug)]
pub struct MessageShape {
    pub modifiers: MessageModifiers,
    pub fields: Vec<FieldShape>,
    /// Member field numbers of each oneof.
    pub oneofs: Vec<Vec<u32>>,
}

impl MessageShape {
    pub fn encode(&self) -> String {
        let mut e = MtDataEncoder::new();
        e.start_message(self.modifiers);
        for f in &self.fields {
            e.put_field(f.ty, f.number, f.modifiers).unwrap();
        }
        for oneof in &self.oneofs {
            e.start_oneof().unwrap();
            for &number in oneof {
                e.put_oneof_field(number).unwrap();
            }
        }
        e.finish()
    }

    pub fn oneof_of(&self, number: u32) -> Option<usize> {
        self.oneofs.iter().position(|o| o.contains(&number))
    }
}

type RawField = (u8, u8, bool, bool, bool, u32, Option<u8>);

fn raw_field() -> impl Strategy<Value = RawField> {
    (
        1u8..=18,
        0u8..4,
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
        1u32..40,
        proptest::option::of(0u8..3),
    )
}

/// Valid message schemas: increasing numbers with gaps, every label kind,
/// and oneofs drawn from the optional fields.
pub fn message_shape() -> impl Strategy<Value = MessageShape> {
    (0u32..8, prop::collection::vec(raw_field(), 0..24)).prop_map(|(bits, raw)| {
        let modifiers = MessageModifiers::from_bits_truncate(bits);
        let mut number = 0;
        let mut fields = Vec::new();
        let mut groups: BTreeMap<u8, Vec<u32>> = BTreeMap::new();

        for (ty, label, packed, closed, utf8, gap, oneof) in raw {
            number += gap;
            let ty = FieldType::from_u8(ty).unwrap();
            let mut mods = FieldModifiers::empty();
            match label {
                0 => {
                    if let Some(group) = oneof {
                        groups.entry(group).or_default().push(number);
                    }
                }
                1 if !ty.is_sub_message() => mods |= FieldModifiers::IS_PROTO3_SINGULAR,
                1 => {}
                2 => mods |= FieldModifiers::IS_REQUIRED,
                _ => {
                    mods |= FieldModifiers::IS_REPEATED;
                    if packed && ty.is_packable() {
                        mods |= FieldModifiers::IS_PACKED;
                    }
                }
            }
            if ty == FieldType::Enum && closed {
                mods |= FieldModifiers::IS_CLOSED_ENUM;
            }
            if ty == FieldType::String && (utf8 || modifiers.contains(MessageModifiers::VALIDATE_UTF8)) {
                mods |= FieldModifiers::VALIDATE_UTF8;
            }
            fields.push(FieldShape {
                number,
                ty,
                modifiers: mods,
            });
        }

        MessageShape {
            modifiers,
            fields,
            oneofs: groups.into_values().collect(),
        }
    })
}

pub fn platform() -> impl Strategy<Value = Platform> {
    prop_oneof![Just(Platform::Bits32), Just(Platform::Bits64)]
}
