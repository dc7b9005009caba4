//! Recording defs and registering their full names.

use std::ops::Range;

use indexmap::IndexMap;
use minidesc_core::Value;
use minidesc_core::utils::to_json_name;
use minidesc_table::constants::MAX_FIELD_NUMBER;
use minidesc_table::{FieldType, MiniTableId};

use super::FileBuilder;
use super::names::{check_ident, check_package, join};
use crate::default_value::DefaultValue;
use crate::defs::{
    EnumData, EnumValueData, FieldData, FileData, MessageData, MethodData, OneofData, ServiceData,
};
use crate::error::BuildError;
use crate::features::{
    Edition, EnumType, FeatureSet, FieldPresence, MessageEncoding, RepeatedFieldEncoding,
    ResolvedFeatures,
};
use crate::ids::{EnumId, EnumValueId, FieldId, MessageId, MethodId, OneofId, ServiceId};
use crate::proto::{
    DescriptorProto, EnumDescriptorProto, FieldDescriptorProto, FileDescriptorProto, Label,
    ServiceDescriptorProto, Type,
};
use crate::symbol::DefRef;

/// Where a def is declared.
struct Scope {
    prefix: String,
    parent: Option<MessageId>,
    features: ResolvedFeatures,
}

impl FileBuilder<'_> {
    pub(super) fn allocate(&mut self) -> Result<(), BuildError> {
        let proto = self.proto;
        if proto.name.is_empty() {
            return Err(BuildError::malformed("file has no name"));
        }
        check_package(&proto.package)?;

        self.edition = file_edition(proto)?;
        let base = self.pool.defaults.resolve(self.edition).ok_or_else(|| {
            BuildError::malformed(format!(
                "edition {:?} is not supported by this pool",
                self.edition
            ))
        })?;
        let file_features = proto.options.as_ref().and_then(|o| o.features.as_ref());
        let features = self.merge_features(base, file_features)?;

        let mut dependencies = Vec::with_capacity(proto.dependency.len());
        for name in &proto.dependency {
            let dep = self.pool.find_file(name).ok_or_else(|| {
                BuildError::unresolved(format!(
                    "depends on file '{name}', but it has not been loaded"
                ))
            })?;
            dependencies.push(dep.id());
        }
        let public_dependencies = proto
            .public_dependency
            .iter()
            .map(|&i| {
                usize::try_from(i)
                    .ok()
                    .and_then(|i| dependencies.get(i).copied())
                    .ok_or_else(|| {
                        BuildError::malformed(format!("public dependency index {i} is out of range"))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.pool.file_names.insert(
            &mut self.pool.arena,
            proto.name.as_bytes(),
            Value::from_u32(self.file.0),
        )?;
        self.pool.defs.files.push(FileData {
            name: proto.name.clone(),
            package: proto.package.clone(),
            edition: self.edition,
            features,
            dependencies,
            public_dependencies,
            messages: Vec::new(),
            enums: Vec::new(),
            extensions: Vec::new(),
            services: Vec::new(),
            proto: proto.clone(),
        });

        let scope = Scope {
            prefix: proto.package.clone(),
            parent: None,
            features,
        };
        for e in &proto.enum_type {
            let id = self.add_enum(e, &scope)?;
            self.file_data().enums.push(id);
        }
        for ext in &proto.extension {
            let id = self.add_field(ext, &scope, None)?;
            self.file_data().extensions.push(id);
        }
        for m in &proto.message_type {
            let id = self.add_message(m, &scope)?;
            self.file_data().messages.push(id);
        }
        for s in &proto.service {
            let id = self.add_service(s, &scope)?;
            self.file_data().services.push(id);
        }
        Ok(())
    }

    fn file_data(&mut self) -> &mut FileData {
        &mut self.pool.defs.files[self.file.index()]
    }

    /// Applies explicit overrides, which only editions files may carry.
    fn merge_features(
        &self,
        parent: ResolvedFeatures,
        set: Option<&FeatureSet>,
    ) -> Result<ResolvedFeatures, BuildError> {
        match set {
            None => Ok(parent),
            Some(_) if !self.is_editions() => Err(BuildError::malformed(format!(
                "features can only be set in editions files, not {:?}",
                self.edition
            ))),
            Some(set) => Ok(parent.merge(set)),
        }
    }

    // ============================================================
    // Messages
    // ============================================================

    fn add_message(&mut self, m: &DescriptorProto, scope: &Scope) -> Result<MessageId, BuildError> {
        check_ident(&m.name, "message")?;
        let full_name = join(&scope.prefix, &m.name);
        let explicit = m.options.as_ref().and_then(|o| o.features.as_ref());
        let features = self.merge_features(scope.features, explicit)?;
        let extension_ranges = m
            .extension_range
            .iter()
            .map(|r| field_range(r.start, r.end, &full_name, "extension"))
            .collect::<Result<Vec<_>, _>>()?;
        let reserved_ranges = m
            .reserved_range
            .iter()
            .map(|r| field_range(r.start, r.end, &full_name, "reserved"))
            .collect::<Result<Vec<_>, _>>()?;
        let options = m.options.clone().unwrap_or_default();

        let id = MessageId(self.pool.defs.messages.len() as u32);
        self.pool.insert_symbol(&full_name, DefRef::Message(id))?;
        self.pool.defs.messages.push(MessageData {
            name: m.name.clone(),
            full_name: full_name.clone(),
            file: self.file,
            parent: scope.parent,
            features,
            fields: Vec::with_capacity(m.field.len()),
            fields_by_name: IndexMap::with_capacity(m.field.len()),
            fields_by_json_name: IndexMap::with_capacity(m.field.len()),
            layout: Vec::new(),
            oneofs: Vec::with_capacity(m.oneof_decl.len()),
            real_oneof_count: 0,
            nested_messages: Vec::new(),
            nested_enums: Vec::new(),
            nested_extensions: Vec::new(),
            extension_ranges,
            reserved_ranges,
            reserved_names: m.reserved_name.clone(),
            is_map_entry: options.map_entry,
            is_message_set: options.message_set_wire_format,
            table: MiniTableId::EMPTY,
        });

        let mut oneofs = Vec::with_capacity(m.oneof_decl.len());
        for o in &m.oneof_decl {
            check_ident(&o.name, "oneof")?;
            if o.options.as_ref().is_some_and(|o| o.features.is_some()) && !self.is_editions() {
                return Err(BuildError::malformed(format!(
                    "features can only be set in editions files, not {:?}",
                    self.edition
                )));
            }
            let oneof = OneofId(self.pool.defs.oneofs.len() as u32);
            self.pool.defs.oneofs.push(OneofData {
                name: o.name.clone(),
                full_name: join(&full_name, &o.name),
                parent: id,
                fields: Vec::new(),
                synthetic: false,
            });
            oneofs.push(oneof);
        }
        self.pool.defs.messages[id.index()].oneofs = oneofs.clone();

        let child = Scope {
            prefix: full_name.clone(),
            parent: Some(id),
            features,
        };
        for f in &m.field {
            let field = self.add_field(f, &child, Some(&oneofs))?;
            self.add_member(id, field)?;
        }
        self.check_oneofs(id)?;
        self.check_numbers(id)?;

        for e in &m.enum_type {
            let e = self.add_enum(e, &child)?;
            self.pool.defs.messages[id.index()].nested_enums.push(e);
        }
        for ext in &m.extension {
            let ext = self.add_field(ext, &child, None)?;
            self.pool.defs.messages[id.index()].nested_extensions.push(ext);
        }
        for nested in &m.nested_type {
            let nested = self.add_message(nested, &child)?;
            self.pool.defs.messages[id.index()].nested_messages.push(nested);
        }

        let msg = &self.pool.defs.messages[id.index()];
        if msg.is_map_entry {
            self.check_map_entry(id)?;
        }
        if msg.is_message_set && (!msg.fields.is_empty() || msg.extension_ranges.is_empty()) {
            return Err(BuildError::structural(format!(
                "message set '{full_name}' must be extendable and have no fields"
            )));
        }
        Ok(id)
    }

    /// Adds `field` to the name indexes of `message`.
    fn add_member(&mut self, message: MessageId, field: FieldId) -> Result<(), BuildError> {
        let defs = &mut self.pool.defs;
        let f = &defs.fields[field.index()];
        let msg = &defs.messages[message.index()];

        if msg.fields_by_name.contains_key(&f.name) {
            return Err(BuildError::structural(format!(
                "duplicate field name '{}' in '{}'",
                f.name, msg.full_name
            )));
        }
        if msg.reserved_names.contains(&f.name) {
            return Err(BuildError::structural(format!(
                "field name '{}' is reserved in '{}'",
                f.name, msg.full_name
            )));
        }
        if msg.reserved_ranges.iter().any(|r| r.contains(&f.number)) {
            return Err(BuildError::structural(format!(
                "field '{}' uses reserved number {}",
                f.full_name, f.number
            )));
        }
        if msg.extension_ranges.iter().any(|r| r.contains(&f.number)) {
            return Err(BuildError::structural(format!(
                "field '{}' uses number {}, which is in an extension range",
                f.full_name, f.number
            )));
        }

        let (name, json_name) = (f.name.clone(), f.json_name.clone());
        let msg = &mut defs.messages[message.index()];
        msg.fields.push(field);
        msg.fields_by_name.insert(name, field);
        msg.fields_by_json_name.entry(json_name).or_insert(field);
        Ok(())
    }

    fn check_numbers(&self, message: MessageId) -> Result<(), BuildError> {
        let defs = &self.pool.defs;
        let msg = &defs.messages[message.index()];
        let mut numbers: Vec<u32> = msg.fields.iter().map(|&f| defs.field(f).number).collect();
        numbers.sort_unstable();
        if let Some(w) = numbers.windows(2).find(|w| w[0] == w[1]) {
            return Err(BuildError::structural(format!(
                "duplicate field number {} in '{}'",
                w[0], msg.full_name
            )));
        }
        Ok(())
    }

    fn check_oneofs(&mut self, message: MessageId) -> Result<(), BuildError> {
        let defs = &self.pool.defs;
        let msg = &defs.messages[message.index()];
        let mut real = 0;
        let mut seen_synthetic = false;
        for &o in &msg.oneofs {
            let oneof = defs.oneof(o);
            if msg.fields_by_name.contains_key(&oneof.name) {
                return Err(BuildError::structural(format!(
                    "duplicate name '{}' in '{}'",
                    oneof.name, msg.full_name
                )));
            }
            if oneof.fields.is_empty() {
                return Err(BuildError::structural(format!(
                    "oneof '{}' has no fields",
                    oneof.full_name
                )));
            }
            if oneof.synthetic {
                if oneof.fields.len() != 1 {
                    return Err(BuildError::structural(format!(
                        "synthetic oneof '{}' must have exactly one field, not {}",
                        oneof.full_name,
                        oneof.fields.len()
                    )));
                }
                seen_synthetic = true;
            } else if seen_synthetic {
                return Err(BuildError::structural(format!(
                    "synthetic oneofs must come after all other oneofs in '{}'",
                    msg.full_name
                )));
            } else {
                real += 1;
            }
        }
        self.pool.defs.messages[message.index()].real_oneof_count = real;
        Ok(())
    }

    fn check_map_entry(&self, message: MessageId) -> Result<(), BuildError> {
        let defs = &self.pool.defs;
        let msg = defs.message(message);
        let shape_ok = msg.fields.len() == 2
            && msg.oneofs.is_empty()
            && msg.extension_ranges.is_empty()
            && msg.fields.iter().zip([(1, "key"), (2, "value")]).all(|(&f, (n, name))| {
                let f = defs.field(f);
                f.number == n && f.name == name && f.label == Label::Optional
            });
        if !shape_ok {
            return Err(BuildError::structural(format!(
                "map entry '{}' must have exactly an optional 'key' = 1 and 'value' = 2",
                msg.full_name
            )));
        }
        Ok(())
    }

    // ============================================================
    // Fields and extensions
    // ============================================================

    /// Records a field. `oneofs` is `None` for extensions.
    fn add_field(
        &mut self,
        f: &FieldDescriptorProto,
        scope: &Scope,
        oneofs: Option<&[OneofId]>,
    ) -> Result<FieldId, BuildError> {
        check_ident(&f.name, "field")?;
        let full_name = join(&scope.prefix, &f.name);
        let number = u32::try_from(f.number)
            .ok()
            .filter(|n| (1..=MAX_FIELD_NUMBER).contains(n))
            .ok_or_else(|| {
                BuildError::malformed(format!(
                    "invalid field number {} for '{full_name}'",
                    f.number
                ))
            })?;

        let is_extension = oneofs.is_none();
        if is_extension == f.extendee.is_empty() {
            let problem = if is_extension { "has no extendee" } else { "declares an extendee" };
            return Err(BuildError::malformed(format!("field '{full_name}' {problem}")));
        }

        let label = f.label.unwrap_or(Label::Optional);
        let ty = f.ty.map(FieldType::from);
        let named = matches!(
            ty,
            None | Some(FieldType::Message | FieldType::Group | FieldType::Enum)
        );
        if named == f.type_name.is_empty() {
            let problem = match ty {
                None => "has no type".to_owned(),
                Some(t) if named => format!("of type {t:?} needs a type name"),
                Some(t) => format!("of type {t:?} can't name a type"),
            };
            return Err(BuildError::malformed(format!("field '{full_name}' {problem}")));
        }

        let options = f.options.clone().unwrap_or_default();
        let explicit = options.features.as_ref();
        let mut features = self.merge_features(scope.features, explicit)?;
        if self.is_editions() {
            if label == Label::Required {
                return Err(BuildError::malformed(format!(
                    "required label is not allowed in editions ('{full_name}'); use field_presence LEGACY_REQUIRED"
                )));
            }
            if f.ty == Some(Type::Group) {
                return Err(BuildError::malformed(format!(
                    "group syntax is not allowed in editions ('{full_name}'); use message_encoding DELIMITED"
                )));
            }
            if options.packed.is_some() {
                return Err(BuildError::malformed(format!(
                    "packed option is not allowed in editions ('{full_name}'); use repeated_field_encoding"
                )));
            }
            if explicit.is_some_and(|set| set.field_presence.is_some()) {
                let kind = if label == Label::Repeated {
                    Some("repeated fields")
                } else if f.oneof_index.is_some() {
                    Some("oneof fields")
                } else if is_extension {
                    Some("extensions")
                } else {
                    None
                };
                if let Some(kind) = kind {
                    return Err(BuildError::structural(format!(
                        "{kind} can't specify field presence ('{full_name}')"
                    )));
                }
            }
        } else {
            if label == Label::Required {
                features.field_presence = FieldPresence::LegacyRequired;
            }
            if f.ty == Some(Type::Group) {
                features.message_encoding = MessageEncoding::Delimited;
            }
            if let Some(packed) = options.packed {
                features.repeated_field_encoding = if packed {
                    RepeatedFieldEncoding::Packed
                } else {
                    RepeatedFieldEncoding::Expanded
                };
            }
            if f.proto3_optional {
                features.field_presence = FieldPresence::Explicit;
            }
        }
        if self.edition == Edition::Proto3 && label == Label::Required {
            return Err(BuildError::structural(format!(
                "proto3 field '{full_name}' can't be required"
            )));
        }

        let oneof = match f.oneof_index {
            None => None,
            Some(i) => {
                let Some(oneofs) = oneofs else {
                    return Err(BuildError::malformed(format!(
                        "extension '{full_name}' can't be in a oneof"
                    )));
                };
                let oneof = usize::try_from(i)
                    .ok()
                    .and_then(|i| oneofs.get(i).copied())
                    .ok_or_else(|| {
                        BuildError::malformed(format!(
                            "oneof index {i} is out of range for field '{full_name}'"
                        ))
                    })?;
                if label != Label::Optional {
                    return Err(BuildError::structural(format!(
                        "oneof field '{full_name}' must be optional, not {label:?}"
                    )));
                }
                Some(oneof)
            }
        };
        if f.proto3_optional {
            if self.edition != Edition::Proto3 {
                return Err(BuildError::malformed(format!(
                    "proto3_optional is only valid in proto3 files ('{full_name}')"
                )));
            }
            if oneof.is_none() {
                return Err(BuildError::structural(format!(
                    "proto3 optional field '{full_name}' must be in a synthetic oneof"
                )));
            }
        }

        let id = FieldId(self.pool.defs.fields.len() as u32);
        if is_extension {
            self.pool.insert_symbol(&full_name, DefRef::Extension(id))?;
        }
        let (json_name, has_json_name) = match &f.json_name {
            Some(name) => (name.clone(), true),
            None => (to_json_name(&f.name), false),
        };
        self.pool.defs.fields.push(FieldData {
            name: f.name.clone(),
            full_name,
            json_name,
            has_json_name,
            number,
            label,
            ty,
            type_name: f.type_name.clone(),
            extendee_name: f.extendee.clone(),
            file: self.file,
            scope: scope.parent,
            extendee: None,
            oneof,
            proto3_optional: f.proto3_optional,
            features,
            default_text: f.default_value.clone(),
            default: DefaultValue::None,
            sub: None,
            layout_index: 0,
            extension: None,
        });
        if let Some(oneof) = oneof {
            let oneof = &mut self.pool.defs.oneofs[oneof.index()];
            oneof.fields.push(id);
            oneof.synthetic |= f.proto3_optional;
        }
        Ok(id)
    }

    // ============================================================
    // Enums
    // ============================================================

    fn add_enum(&mut self, e: &EnumDescriptorProto, scope: &Scope) -> Result<EnumId, BuildError> {
        check_ident(&e.name, "enum")?;
        let full_name = join(&scope.prefix, &e.name);
        let explicit = e.options.as_ref().and_then(|o| o.features.as_ref());
        let features = self.merge_features(scope.features, explicit)?;
        let Some(first) = e.value.first() else {
            return Err(BuildError::structural(format!(
                "enum '{full_name}' must have at least one value"
            )));
        };
        if features.enum_type == EnumType::Open && first.number != 0 {
            return Err(BuildError::structural(format!(
                "the first value of open enum '{full_name}' must be zero"
            )));
        }
        let reserved_ranges = e
            .reserved_range
            .iter()
            .map(|r| {
                if r.start > r.end {
                    return Err(BuildError::malformed(format!(
                        "invalid reserved range {}..={} in '{full_name}'",
                        r.start, r.end
                    )));
                }
                Ok(r.start as i64..r.end as i64 + 1)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let id = EnumId(self.pool.defs.enums.len() as u32);
        self.pool.insert_symbol(&full_name, DefRef::Enum(id))?;
        self.pool.defs.enums.push(EnumData {
            name: e.name.clone(),
            full_name: full_name.clone(),
            file: self.file,
            parent: scope.parent,
            features,
            values: Vec::with_capacity(e.value.len()),
            reserved_ranges,
            reserved_names: e.reserved_name.clone(),
            table: None,
        });

        for v in &e.value {
            check_ident(&v.name, "enum value")?;
            let data = &self.pool.defs.enums[id.index()];
            if data.reserved_names.contains(&v.name)
                || data.reserved_ranges.iter().any(|r| r.contains(&(v.number as i64)))
            {
                return Err(BuildError::structural(format!(
                    "enum value '{}' ({}) of '{full_name}' is reserved",
                    v.name, v.number
                )));
            }
            if v.options.as_ref().is_some_and(|o| o.features.is_some()) && !self.is_editions() {
                return Err(BuildError::malformed(format!(
                    "features can only be set in editions files, not {:?}",
                    self.edition
                )));
            }
            // Values are scoped as siblings of their enum.
            let value_name = join(&scope.prefix, &v.name);
            let value = EnumValueId(self.pool.defs.enum_values.len() as u32);
            self.pool.insert_symbol(&value_name, DefRef::EnumValue(value))?;
            self.pool.defs.enum_values.push(EnumValueData {
                name: v.name.clone(),
                full_name: value_name,
                number: v.number,
                parent: id,
            });
            self.pool.defs.enums[id.index()].values.push(value);
        }
        Ok(id)
    }

    // ============================================================
    // Services
    // ============================================================

    fn add_service(
        &mut self,
        s: &ServiceDescriptorProto,
        scope: &Scope,
    ) -> Result<ServiceId, BuildError> {
        check_ident(&s.name, "service")?;
        let full_name = join(&scope.prefix, &s.name);
        let id = ServiceId(self.pool.defs.services.len() as u32);
        self.pool.insert_symbol(&full_name, DefRef::Service(id))?;
        self.pool.defs.services.push(ServiceData {
            name: s.name.clone(),
            full_name: full_name.clone(),
            file: self.file,
            methods: Vec::with_capacity(s.method.len()),
        });

        for m in &s.method {
            check_ident(&m.name, "method")?;
            let service = &self.pool.defs.services[id.index()];
            if service
                .methods
                .iter()
                .any(|&other| self.pool.defs.method(other).name == m.name)
            {
                return Err(BuildError::structural(format!(
                    "duplicate method '{}' in '{full_name}'",
                    m.name
                )));
            }
            let method = MethodId(self.pool.defs.methods.len() as u32);
            self.pool.defs.methods.push(MethodData {
                name: m.name.clone(),
                full_name: join(&full_name, &m.name),
                service: id,
                input_name: m.input_type.clone(),
                output_name: m.output_type.clone(),
                input: None,
                output: None,
                client_streaming: m.client_streaming,
                server_streaming: m.server_streaming,
            });
            self.pool.defs.services[id.index()].methods.push(method);
        }
        Ok(id)
    }
}

fn file_edition(proto: &FileDescriptorProto) -> Result<Edition, BuildError> {
    match proto.syntax.as_str() {
        "" | "proto2" => Ok(Edition::Proto2),
        "proto3" => Ok(Edition::Proto3),
        "editions" => match proto.edition {
            Some(edition) if edition >= Edition::Edition2023 => Ok(edition),
            Some(edition) => Err(BuildError::malformed(format!(
                "editions file '{}' can't use {edition:?}",
                proto.name
            ))),
            None => Err(BuildError::malformed(format!(
                "editions file '{}' must set an edition",
                proto.name
            ))),
        },
        other => Err(BuildError::malformed(format!(
            "invalid syntax '{other}' in '{}'",
            proto.name
        ))),
    }
}

/// Field numbers `start..end` of an extension or reserved range.
fn field_range(start: i32, end: i32, message: &str, what: &str) -> Result<Range<u32>, BuildError> {
    let limit = MAX_FIELD_NUMBER as i64 + 1;
    if start < 1 || end <= start || end as i64 > limit {
        return Err(BuildError::malformed(format!(
            "invalid {what} range {start}..{end} in '{message}'"
        )));
    }
    Ok(start as u32..end as u32)
}
