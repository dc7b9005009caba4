//! Mini table construction for the messages, enums and extensions of a file.

use minidesc_core::Value;
use minidesc_table::{
    EncodeError, EnumTableId, FieldModifiers, FieldType, MessageModifiers, MiniTable,
    MiniTableEnum, MiniTableId, MtDataEncoder,
};
use tracing::debug;

use super::FileBuilder;
use crate::defs::{FieldData, SubDef};
use crate::error::BuildError;
use crate::features::{EnumType, FieldPresence, RepeatedFieldEncoding, Utf8Validation};
use crate::ids::{EnumId, FieldId, MessageId};
use crate::proto::Label;

/// Tables computed ahead of time for one file.
///
/// `messages` and `enums` follow the order in which the file's defs are
/// created: top-level enums first, then messages depth first with each
/// message's nested enums after its own fields. An empty `enums` list
/// means enum tables are built from the definitions.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct FileLayout {
    pub messages: Vec<MiniTable>,
    pub enums: Vec<MiniTableEnum>,
}

impl FileBuilder<'_> {
    pub(super) fn build_tables(&mut self) -> Result<(), BuildError> {
        let layout = self.layout.take();
        if let Some(layout) = &layout {
            let messages = self.new_messages().len();
            if layout.messages.len() != messages {
                return Err(BuildError::structural(format!(
                    "layout for '{}' has {} message tables, expected {messages}",
                    self.proto.name,
                    layout.messages.len()
                )));
            }
            let enums = self.new_enums().len();
            if !layout.enums.is_empty() && layout.enums.len() != enums {
                return Err(BuildError::structural(format!(
                    "layout for '{}' has {} enum tables, expected {enums}",
                    self.proto.name,
                    layout.enums.len()
                )));
            }
        }

        for (n, i) in self.new_enums().enumerate() {
            let id = EnumId(i as u32);
            let table = match layout.as_ref().and_then(|l| l.enums.get(n)) {
                Some(table) => self.pool.tables.push_enum(table.clone()),
                None => self.build_enum_table(id)?,
            };
            self.pool.defs.enums[i].table = Some(table);
        }

        for (n, i) in self.new_messages().enumerate() {
            let id = MessageId(i as u32);
            let table = match &layout {
                Some(layout) => {
                    let table = &layout.messages[n];
                    self.check_precomputed(id, table)?;
                    self.pool.tables.push_message(table.clone())
                }
                None => self.build_message_table(id)?,
            };
            self.pool.defs.messages[i].table = table;
            self.pool
                .by_table
                .insert(table.index() as u64, Value::from_u32(id.0));
            self.assign_layout_indices(id)?;
        }

        for i in self.new_fields() {
            if self.pool.defs.fields[i].is_extension() {
                self.build_extension_table(FieldId(i as u32))?;
            }
        }
        Ok(())
    }

    fn build_message_table(&mut self, id: MessageId) -> Result<MiniTableId, BuildError> {
        let m = self.pool.defs.message(id);
        let encoded = if m.is_message_set {
            let mut e = MtDataEncoder::new();
            e.encode_message_set();
            e.finish()
        } else if m.is_map_entry {
            self.encode_map_entry(id)
                .map_err(|err| encode_error(err, &m.full_name))?
        } else {
            self.encode_message(id)
                .map_err(|err| encode_error(err, &m.full_name))?
        };

        let platform = self.pool.platform;
        match self.pool.tables.build_message(encoded.as_bytes(), platform) {
            Ok(table) => Ok(table),
            Err(err) => {
                debug!(message = %m.full_name, data = %encoded, error = %err, "mini table rejected");
                Err(BuildError::decode(err))
            }
        }
    }

    fn encode_message(&self, id: MessageId) -> Result<String, EncodeError> {
        let defs = &self.pool.defs;
        let m = defs.message(id);

        let mut modifiers = MessageModifiers::empty();
        if m.features.repeated_field_encoding == RepeatedFieldEncoding::Packed {
            modifiers |= MessageModifiers::DEFAULT_IS_PACKED;
        }
        if !m.extension_ranges.is_empty() {
            modifiers |= MessageModifiers::IS_EXTENDABLE;
        }

        let mut fields = m.fields.clone();
        fields.sort_unstable_by_key(|&f| defs.field(f).number);

        let mut e = MtDataEncoder::new();
        e.start_message(modifiers);
        for &f in &fields {
            let data = defs.field(f);
            e.put_field(data.field_type(), data.number, self.field_modifiers(f))?;
        }
        for &oneof in &m.oneofs {
            let oneof = defs.oneof(oneof);
            if oneof.synthetic {
                continue;
            }
            e.start_oneof()?;
            for &f in &oneof.fields {
                e.put_oneof_field(defs.field(f).number)?;
            }
        }
        Ok(e.finish())
    }

    fn encode_map_entry(&self, id: MessageId) -> Result<String, EncodeError> {
        let defs = &self.pool.defs;
        let m = defs.message(id);
        let field = |number| {
            m.fields
                .iter()
                .copied()
                .find(|&f| defs.field(f).number == number)
        };
        // Map entries were checked to hold exactly fields 1 and 2.
        let (Some(key), Some(value)) = (field(1), field(2)) else {
            return Err(EncodeError::InvalidState("encode_map"));
        };
        let mut e = MtDataEncoder::new();
        e.encode_map(
            defs.field(key).field_type(),
            defs.field(value).field_type(),
            self.field_modifiers(key),
            self.field_modifiers(value),
        )?;
        Ok(e.finish())
    }

    fn build_enum_table(&mut self, id: EnumId) -> Result<EnumTableId, BuildError> {
        let defs = &self.pool.defs;
        let data = defs.enum_(id);
        let mut values: Vec<u32> = data
            .values
            .iter()
            .map(|&v| defs.enum_value(v).number as u32)
            .collect();
        values.sort_unstable();
        values.dedup();

        let mut e = MtDataEncoder::new();
        e.start_enum();
        for value in values {
            e.put_enum_value(value)
                .map_err(|err| encode_error(err, &data.full_name))?;
        }
        e.end_enum()
            .map_err(|err| encode_error(err, &data.full_name))?;
        let encoded = e.finish();

        match self.pool.tables.build_enum(encoded.as_bytes()) {
            Ok(table) => Ok(table),
            Err(err) => {
                debug!(name = %data.full_name, data = %encoded, error = %err, "enum table rejected");
                Err(BuildError::decode(err))
            }
        }
    }

    fn build_extension_table(&mut self, id: FieldId) -> Result<(), BuildError> {
        let f = self.pool.defs.field(id);
        let Some(extendee) = f.extendee else {
            return Err(BuildError::unresolved(format!(
                "extension '{}' has no extendee",
                f.full_name
            )));
        };
        let extendee = self.pool.defs.message(extendee).table;

        let mut e = MtDataEncoder::new();
        e.encode_extension(f.field_type(), f.number, self.field_modifiers(id))
            .map_err(|err| encode_error(err, &f.full_name))?;
        let encoded = e.finish();

        let platform = self.pool.platform;
        let ext = match self
            .pool
            .tables
            .build_extension(encoded.as_bytes(), extendee, None, platform)
        {
            Ok(ext) => ext,
            Err(err) => {
                debug!(extension = %f.full_name, data = %encoded, error = %err, "extension rejected");
                return Err(BuildError::decode(err));
            }
        };
        self.pool.defs.fields[id.index()].extension = Some(ext);
        Ok(())
    }

    fn field_modifiers(&self, id: FieldId) -> FieldModifiers {
        let f = self.pool.defs.field(id);
        let ty = f.field_type();
        let mut modifiers = FieldModifiers::empty();

        if f.label == Label::Repeated {
            modifiers |= FieldModifiers::IS_REPEATED;
            if ty.is_packable()
                && f.features.repeated_field_encoding == RepeatedFieldEncoding::Packed
            {
                modifiers |= FieldModifiers::IS_PACKED;
            }
        } else if is_required(f) {
            modifiers |= FieldModifiers::IS_REQUIRED;
        } else if !f.has_presence() {
            modifiers |= FieldModifiers::IS_PROTO3_SINGULAR;
        }

        if let Some(SubDef::Enum(e)) = f.sub
            && self.pool.defs.enum_(e).features.enum_type == EnumType::Closed
        {
            modifiers |= FieldModifiers::IS_CLOSED_ENUM;
        }
        if ty == FieldType::String && f.features.utf8_validation == Utf8Validation::Verify {
            modifiers |= FieldModifiers::VALIDATE_UTF8;
        }
        modifiers
    }

    /// Checks a supplied table against the message it is meant for.
    fn check_precomputed(&self, id: MessageId, table: &MiniTable) -> Result<(), BuildError> {
        let defs = &self.pool.defs;
        let m = defs.message(id);
        let mismatch = |what: String| {
            BuildError::structural(format!(
                "precomputed layout doesn't match '{}': {what}",
                m.full_name
            ))
        };

        if table.field_count() != m.fields.len() {
            return Err(mismatch(format!(
                "{} fields, expected {}",
                table.field_count(),
                m.fields.len()
            )));
        }
        if table.is_map_entry() != m.is_map_entry {
            return Err(mismatch("map entry flag differs".to_owned()));
        }
        let mut fields: Vec<&FieldData> = m.fields.iter().map(|&f| defs.field(f)).collect();
        fields.sort_unstable_by_key(|f| f.number);
        for (expected, actual) in fields.into_iter().zip(table.fields()) {
            if expected.number != actual.number() {
                return Err(mismatch(format!(
                    "field number {} where {} was expected",
                    actual.number(),
                    expected.number
                )));
            }
            if expected.field_type() != actual.field_type() {
                return Err(mismatch(format!(
                    "field {} is {:?}, expected {:?}",
                    expected.number,
                    actual.field_type(),
                    expected.field_type()
                )));
            }
        }
        Ok(())
    }

    /// Records where each field of `id` sits in its mini table.
    fn assign_layout_indices(&mut self, id: MessageId) -> Result<(), BuildError> {
        let m = self.pool.defs.message(id);
        let table = self.pool.tables.message(m.table);
        let mut layout = vec![FieldId(0); m.fields.len()];
        let mut indices = Vec::with_capacity(m.fields.len());
        for &f in &m.fields {
            let number = self.pool.defs.field(f).number;
            let index = table
                .field_index_by_number(number)
                .filter(|&i| i < layout.len())
                .ok_or_else(|| {
                    BuildError::structural(format!(
                        "field {number} of '{}' is missing from its mini table",
                        m.full_name
                    ))
                })?;
            layout[index] = f;
            indices.push((f, index as u16));
        }
        for (f, index) in indices {
            self.pool.defs.fields[f.index()].layout_index = index;
        }
        self.pool.defs.messages[id.index()].layout = layout;
        Ok(())
    }
}

fn is_required(f: &FieldData) -> bool {
    f.label == Label::Required || f.features.field_presence == FieldPresence::LegacyRequired
}

fn encode_error(err: EncodeError, full_name: &str) -> BuildError {
    BuildError::new(err.category(), format!("couldn't encode '{full_name}': {err}"))
}
