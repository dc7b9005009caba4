//! Wiring sub tables into the tables built for a file.

use minidesc_table::{LinkError, Sub};
use tracing::debug;

use super::FileBuilder;
use crate::defs::SubDef;
use crate::error::BuildError;
use crate::features::EnumType;
use crate::ids::{FieldId, MessageId};

impl FileBuilder<'_> {
    pub(super) fn link(&mut self) -> Result<(), BuildError> {
        for i in self.new_messages() {
            self.link_message(MessageId(i as u32))?;
        }
        for i in self.new_fields() {
            if self.pool.defs.fields[i].is_extension() {
                self.link_extension(FieldId(i as u32))?;
            }
        }
        Ok(())
    }

    fn link_message(&mut self, id: MessageId) -> Result<(), BuildError> {
        let defs = &self.pool.defs;
        let m = defs.message(id);
        for &f in &m.fields {
            let field = defs.field(f);
            let index = field.layout_index as usize;
            let result = match field.sub {
                Some(SubDef::Message(sub)) => {
                    let sub = defs.message(sub).table;
                    self.pool.tables.set_sub_message(m.table, index, sub)
                }
                Some(SubDef::Enum(sub)) => {
                    let sub = defs.enum_(sub);
                    match sub.table {
                        Some(table) if sub.features.enum_type == EnumType::Closed => {
                            self.pool.tables.set_sub_enum(m.table, index, table)
                        }
                        _ => Ok(()),
                    }
                }
                None => Ok(()),
            };
            if let Err(err) = result {
                return Err(link_error(err, &field.full_name));
            }
        }
        Ok(())
    }

    fn link_extension(&mut self, id: FieldId) -> Result<(), BuildError> {
        let defs = &self.pool.defs;
        let f = defs.field(id);
        let (Some(ext), Some(extendee)) = (f.extension, f.extendee) else {
            return Err(BuildError::unresolved(format!(
                "extension '{}' was never built",
                f.full_name
            )));
        };
        let sub = match f.sub {
            Some(SubDef::Message(m)) => Some(Sub::Message(defs.message(m).table)),
            Some(SubDef::Enum(e)) => {
                let e = defs.enum_(e);
                (e.features.enum_type == EnumType::Closed).then_some(Sub::Enum(e.table))
            }
            None => None,
        };
        if let Some(sub) = sub {
            self.pool.tables.extension_mut(ext).set_sub(sub);
        }

        let extendee = defs.message(extendee).table;
        let number = f.number;
        self.pool.register_extension(extendee, number, id)
    }
}

fn link_error(err: LinkError, full_name: &str) -> BuildError {
    debug!(field = %full_name, error = %err, "link failed");
    BuildError::link(err, full_name)
}
