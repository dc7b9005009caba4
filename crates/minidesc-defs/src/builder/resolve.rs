//! Binding names to defs and checking what depends on them.

use minidesc_table::FieldType;

use super::FileBuilder;
use super::names::{parent_scope, resolve_name};
use crate::default_value::DefaultValue;
use crate::defs::SubDef;
use crate::error::BuildError;
use crate::features::{Edition, EnumType, FieldPresence, MessageEncoding};
use crate::ids::{FieldId, MessageId, MethodId};
use crate::proto::Label;
use crate::symbol::DefRef;

impl FileBuilder<'_> {
    pub(super) fn resolve(&mut self) -> Result<(), BuildError> {
        for i in self.new_fields() {
            self.resolve_field(FieldId(i as u32))?;
        }
        for i in self.new_fields() {
            self.check_field(FieldId(i as u32))?;
        }
        for i in self.new_methods() {
            self.resolve_method(MethodId(i as u32))?;
        }
        Ok(())
    }

    fn resolve_field(&mut self, id: FieldId) -> Result<(), BuildError> {
        let f = self.pool.defs.field(id);
        let scope = parent_scope(&f.full_name);

        let extendee = if f.extendee_name.is_empty() {
            None
        } else {
            let extendee = match resolve_name(self.pool, scope, &f.extendee_name) {
                Some(DefRef::Message(m)) => m,
                Some(other) => {
                    return Err(BuildError::structural(format!(
                        "extendee '{}' of '{}' is {}, not a message",
                        f.extendee_name,
                        f.full_name,
                        article(other.kind_name())
                    )));
                }
                None => {
                    return Err(BuildError::unresolved(format!(
                        "couldn't resolve extendee '{}' for '{}'",
                        f.extendee_name, f.full_name
                    )));
                }
            };
            let target = self.pool.defs.message(extendee);
            if !target.extension_ranges.iter().any(|r| r.contains(&f.number)) {
                return Err(BuildError::structural(format!(
                    "extension '{}' uses number {}, which is not in an extension range of '{}'",
                    f.full_name, f.number, target.full_name
                )));
            }
            Some(extendee)
        };

        let (ty, sub) = if f.type_name.is_empty() {
            (f.ty, None)
        } else {
            match (f.ty, resolve_name(self.pool, scope, &f.type_name)) {
                (None | Some(FieldType::Message | FieldType::Group), Some(DefRef::Message(m))) => {
                    (Some(f.ty.unwrap_or(FieldType::Message)), Some(SubDef::Message(m)))
                }
                (None | Some(FieldType::Enum), Some(DefRef::Enum(e))) => {
                    (Some(FieldType::Enum), Some(SubDef::Enum(e)))
                }
                (_, Some(other)) => {
                    return Err(BuildError::structural(format!(
                        "'{}' is {}, which can't be the type of field '{}'",
                        f.type_name,
                        article(other.kind_name()),
                        f.full_name
                    )));
                }
                (_, None) => {
                    return Err(BuildError::unresolved(format!(
                        "couldn't resolve type '{}' for field '{}'",
                        f.type_name, f.full_name
                    )));
                }
            }
        };

        // Delimited encoding turns message fields into groups, except for maps.
        let ty = match (ty, sub) {
            (Some(FieldType::Message), Some(SubDef::Message(m)))
                if f.features.message_encoding == MessageEncoding::Delimited
                    && !self.pool.defs.message(m).is_map_entry =>
            {
                Some(FieldType::Group)
            }
            _ => ty,
        };

        let f = &mut self.pool.defs.fields[id.index()];
        f.extendee = extendee;
        f.ty = ty;
        f.sub = sub;
        Ok(())
    }

    /// Checks that need every field's type to be known.
    fn check_field(&mut self, id: FieldId) -> Result<(), BuildError> {
        let defs = &self.pool.defs;
        let f = defs.field(id);
        let ty = f.field_type();
        let repeated = f.label == Label::Repeated;
        let presence = f.has_presence();

        let required = f.label == Label::Required
            || f.features.field_presence == FieldPresence::LegacyRequired;
        if required && f.is_extension() {
            return Err(BuildError::structural(format!(
                "extension '{}' can't be required",
                f.full_name
            )));
        }

        if let Some(SubDef::Enum(e)) = f.sub {
            let e = defs.enum_(e);
            if e.features.enum_type == EnumType::Closed && !repeated && !presence {
                return Err(BuildError::structural(format!(
                    "implicit presence field '{}' can't use closed enum '{}'",
                    f.full_name, e.full_name
                )));
            }
        }

        if let Some(SubDef::Message(m)) = f.sub {
            let entry = defs.message(m);
            if entry.is_map_entry {
                if !repeated {
                    return Err(BuildError::structural(format!(
                        "map entry '{}' must be used by a repeated field, not '{}'",
                        entry.full_name, f.full_name
                    )));
                }
                if f.is_extension() || entry.parent != f.scope {
                    return Err(BuildError::structural(format!(
                        "map entry '{}' must be nested in the message of '{}'",
                        entry.full_name, f.full_name
                    )));
                }
            }
        }

        let default = match &f.default_text {
            Some(text) => {
                if repeated || ty.is_sub_message() {
                    return Err(BuildError::structural(format!(
                        "field '{}' can't have a default value",
                        f.full_name
                    )));
                }
                if self.edition == Edition::Proto3 {
                    return Err(BuildError::structural(format!(
                        "explicit default values are not allowed in proto3 ('{}')",
                        f.full_name
                    )));
                }
                if !presence {
                    return Err(BuildError::structural(format!(
                        "implicit presence field '{}' can't have a default value",
                        f.full_name
                    )));
                }
                match f.sub {
                    Some(SubDef::Enum(e)) => {
                        let e = defs.enum_(e);
                        let value = e
                            .values
                            .iter()
                            .map(|&v| defs.enum_value(v))
                            .find(|v| v.name == *text)
                            .ok_or_else(|| {
                                BuildError::structural(format!(
                                    "default '{text}' of '{}' is not a value of '{}'",
                                    f.full_name, e.full_name
                                ))
                            })?;
                        DefaultValue::Enum(value.number)
                    }
                    _ => DefaultValue::parse(ty, text).ok_or_else(|| {
                        BuildError::malformed(format!(
                            "invalid default '{text}' for field '{}'",
                            f.full_name
                        ))
                    })?,
                }
            }
            None if repeated => DefaultValue::None,
            None => {
                let first = match f.sub {
                    Some(SubDef::Enum(e)) => defs
                        .enum_(e)
                        .values
                        .first()
                        .map_or(0, |&v| defs.enum_value(v).number),
                    _ => 0,
                };
                DefaultValue::zero(ty, first)
            }
        };
        self.pool.defs.fields[id.index()].default = default;
        Ok(())
    }

    fn resolve_method(&mut self, id: MethodId) -> Result<(), BuildError> {
        let m = self.pool.defs.method(id);
        let scope = &self.pool.defs.service(m.service).full_name;
        let input = self.resolve_message(scope, &m.input_name, &m.full_name)?;
        let output = self.resolve_message(scope, &m.output_name, &m.full_name)?;
        let m = &mut self.pool.defs.methods[id.index()];
        m.input = Some(input);
        m.output = Some(output);
        Ok(())
    }

    fn resolve_message(&self, scope: &str, name: &str, user: &str) -> Result<MessageId, BuildError> {
        match resolve_name(self.pool, scope, name) {
            Some(DefRef::Message(m)) => Ok(m),
            Some(other) => Err(BuildError::structural(format!(
                "'{name}' used by '{user}' is {}, not a message",
                article(other.kind_name())
            ))),
            None => Err(BuildError::unresolved(format!(
                "couldn't resolve message '{name}' for '{user}'"
            ))),
        }
    }
}

fn article(kind: &str) -> String {
    let an = kind.starts_with(['a', 'e', 'i', 'o', 'u']);
    format!("{} {kind}", if an { "an" } else { "a" })
}
