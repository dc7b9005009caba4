//! Connecting tables to the tables their fields reference.

use crate::enum_table::EnumTableId;
use crate::error::LinkError;
use crate::store::MiniTables;
use crate::table::{MiniTable, MiniTableId, Sub};
use crate::types::{ExtMode, FieldMode, FieldType};

impl MiniTable {
    /// Points a message or group field at `sub`, whose flags are `sub_ext`.
    ///
    /// A message field referencing a map entry becomes a map field.
    pub fn set_sub_message(
        &mut self,
        field_index: usize,
        sub: MiniTableId,
        sub_ext: ExtMode,
    ) -> Result<(), LinkError> {
        let table_is_map = self.is_map_entry();
        let field = self
            .fields
            .get_mut(field_index)
            .ok_or(LinkError::NoSuchField(field_index))?;
        let sub_is_map = sub_ext.contains(ExtMode::IS_MAP_ENTRY);

        match field.descriptor_type {
            FieldType::Message => {
                if sub_is_map {
                    if table_is_map {
                        return Err(LinkError::NestedMap(field.number));
                    }
                    field.set_mode(FieldMode::Map);
                }
            }
            FieldType::Group => {
                if sub_is_map {
                    return Err(LinkError::GroupOfMapEntry(field.number));
                }
            }
            _ => return Err(LinkError::NotSubMessage(field.number)),
        }

        let slot = field.sub_index as usize;
        self.subs[slot] = Sub::Message(sub);
        Ok(())
    }

    /// Points a closed enum field at `sub`.
    pub fn set_sub_enum(&mut self, field_index: usize, sub: EnumTableId) -> Result<(), LinkError> {
        let field = self
            .fields
            .get(field_index)
            .ok_or(LinkError::NoSuchField(field_index))?;
        if !field.is_closed_enum() {
            return Err(LinkError::NotClosedEnum(field.number));
        }
        let slot = field.sub_index as usize;
        self.subs[slot] = Sub::Enum(Some(sub));
        Ok(())
    }
}

impl MiniTables {
    pub fn set_sub_message(
        &mut self,
        table: MiniTableId,
        field_index: usize,
        sub: MiniTableId,
    ) -> Result<(), LinkError> {
        let sub_ext = self.message(sub).ext();
        self.message_mut(table)
            .ok_or(LinkError::NoSuchField(field_index))?
            .set_sub_message(field_index, sub, sub_ext)
    }

    pub fn set_sub_enum(
        &mut self,
        table: MiniTableId,
        field_index: usize,
        sub: EnumTableId,
    ) -> Result<(), LinkError> {
        self.message_mut(table)
            .ok_or(LinkError::NoSuchField(field_index))?
            .set_sub_enum(field_index, sub)
    }

    /// Links every sub field of `table` in [`MiniTable::sub_list`] order.
    ///
    /// `None` entries leave their slot untouched. Counts are checked before
    /// anything is modified, so a mismatched call changes nothing.
    pub fn link(
        &mut self,
        table: MiniTableId,
        sub_tables: &[Option<MiniTableId>],
        sub_enums: &[Option<EnumTableId>],
    ) -> Result<(), LinkError> {
        let list = self.message(table).sub_list();
        if list.message_count != sub_tables.len() {
            return Err(LinkError::SubMessageCount {
                expected: list.message_count,
                actual: sub_tables.len(),
            });
        }
        if list.enum_count != sub_enums.len() {
            return Err(LinkError::SubEnumCount {
                expected: list.enum_count,
                actual: sub_enums.len(),
            });
        }

        for (&field, sub) in list.messages().iter().zip(sub_tables) {
            if let Some(sub) = *sub {
                self.set_sub_message(table, field, sub)?;
            }
        }
        for (&field, sub) in list.enums().iter().zip(sub_enums) {
            if let Some(sub) = *sub {
                self.set_sub_enum(table, field, sub)?;
            }
        }
        Ok(())
    }
}
