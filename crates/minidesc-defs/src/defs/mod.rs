//! Def records and the borrowed views handed out by a [`crate::DefPool`].
//!
//! Records live in flat vectors indexed by the ids in [`crate::ids`]. Each
//! record stores the id of its file by value so a failed build can find and
//! discard everything it created.

mod enums;
mod field;
mod file;
mod message;
mod service;

use std::ops::Range;

use indexmap::IndexMap;
use minidesc_table::{EnumTableId, ExtensionId, FieldType, MiniTableId};

use crate::default_value::DefaultValue;
use crate::features::{Edition, FieldPresence, ResolvedFeatures};
use crate::ids::{EnumId, EnumValueId, FieldId, FileId, MessageId, MethodId, OneofId, ServiceId};
use crate::proto::{FileDescriptorProto, Label};
use crate::symbol::DefRef;

pub use enums::{EnumDef, EnumValueDef};
pub use field::FieldDef;
pub use file::FileDef;
pub use message::{MessageDef, OneofDef};
pub use service::{MethodDef, ServiceDef};

pub(crate) struct FileData {
    pub name: String,
    pub package: String,
    pub edition: Edition,
    pub features: ResolvedFeatures,
    pub dependencies: Vec<FileId>,
    pub public_dependencies: Vec<FileId>,
    pub messages: Vec<MessageId>,
    pub enums: Vec<EnumId>,
    pub extensions: Vec<FieldId>,
    pub services: Vec<ServiceId>,
    /// Kept so that re-adding an identical file can be recognized.
    pub proto: FileDescriptorProto,
}

pub(crate) struct MessageData {
    pub name: String,
    pub full_name: String,
    pub file: FileId,
    pub parent: Option<MessageId>,
    pub features: ResolvedFeatures,
    pub fields: Vec<FieldId>,
    pub fields_by_name: IndexMap<String, FieldId>,
    pub fields_by_json_name: IndexMap<String, FieldId>,
    /// Field ids in mini table order.
    pub layout: Vec<FieldId>,
    pub oneofs: Vec<OneofId>,
    pub real_oneof_count: usize,
    pub nested_messages: Vec<MessageId>,
    pub nested_enums: Vec<EnumId>,
    pub nested_extensions: Vec<FieldId>,
    pub extension_ranges: Vec<Range<u32>>,
    pub reserved_ranges: Vec<Range<u32>>,
    pub reserved_names: Vec<String>,
    pub is_map_entry: bool,
    pub is_message_set: bool,
    pub table: MiniTableId,
}

/// Type a field refers to, once resolved.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum SubDef {
    Message(MessageId),
    Enum(EnumId),
}

pub(crate) struct FieldData {
    pub name: String,
    pub full_name: String,
    pub json_name: String,
    pub has_json_name: bool,
    pub number: u32,
    pub label: Label,
    /// Declared type; `None` until a bare `type_name` is resolved.
    pub ty: Option<FieldType>,
    pub type_name: String,
    pub extendee_name: String,
    pub file: FileId,
    /// Message the field is declared in. For extensions this is the scope,
    /// not the extendee.
    pub scope: Option<MessageId>,
    pub extendee: Option<MessageId>,
    pub oneof: Option<OneofId>,
    pub proto3_optional: bool,
    pub features: ResolvedFeatures,
    pub default_text: Option<String>,
    pub default: DefaultValue,
    pub sub: Option<SubDef>,
    pub layout_index: u16,
    pub extension: Option<ExtensionId>,
}

impl FieldData {
    pub fn is_extension(&self) -> bool {
        !self.extendee_name.is_empty()
    }

    /// Declared type; a bare `type_name` that never resolved reads as a message.
    pub fn field_type(&self) -> FieldType {
        self.ty.unwrap_or(FieldType::Message)
    }

    /// Whether the field tracks presence of a singular value.
    pub fn has_presence(&self) -> bool {
        if self.label == Label::Repeated {
            return false;
        }
        self.field_type().is_sub_message()
            || self.oneof.is_some()
            || self.is_extension()
            || self.features.field_presence != FieldPresence::Implicit
    }
}

pub(crate) struct OneofData {
    pub name: String,
    pub full_name: String,
    pub parent: MessageId,
    pub fields: Vec<FieldId>,
    pub synthetic: bool,
}

pub(crate) struct EnumData {
    pub name: String,
    pub full_name: String,
    pub file: FileId,
    pub parent: Option<MessageId>,
    pub features: ResolvedFeatures,
    pub values: Vec<EnumValueId>,
    pub reserved_ranges: Vec<Range<i64>>,
    pub reserved_names: Vec<String>,
    pub table: Option<EnumTableId>,
}

pub(crate) struct EnumValueData {
    pub name: String,
    pub full_name: String,
    pub number: i32,
    pub parent: EnumId,
}

pub(crate) struct ServiceData {
    pub name: String,
    pub full_name: String,
    pub file: FileId,
    pub methods: Vec<MethodId>,
}

pub(crate) struct MethodData {
    pub name: String,
    pub full_name: String,
    pub service: ServiceId,
    pub input_name: String,
    pub output_name: String,
    pub input: Option<MessageId>,
    pub output: Option<MessageId>,
    pub client_streaming: bool,
    pub server_streaming: bool,
}

/// Every def record of a pool.
#[derive(Default)]
pub(crate) struct Defs {
    pub files: Vec<FileData>,
    pub messages: Vec<MessageData>,
    pub fields: Vec<FieldData>,
    pub oneofs: Vec<OneofData>,
    pub enums: Vec<EnumData>,
    pub enum_values: Vec<EnumValueData>,
    pub services: Vec<ServiceData>,
    pub methods: Vec<MethodData>,
}

/// Record counts captured before a build.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) struct DefsCheckpoint {
    pub files: usize,
    pub messages: usize,
    pub fields: usize,
    pub oneofs: usize,
    pub enums: usize,
    pub enum_values: usize,
    pub services: usize,
    pub methods: usize,
}

impl Defs {
    pub fn checkpoint(&self) -> DefsCheckpoint {
        DefsCheckpoint {
            files: self.files.len(),
            messages: self.messages.len(),
            fields: self.fields.len(),
            oneofs: self.oneofs.len(),
            enums: self.enums.len(),
            enum_values: self.enum_values.len(),
            services: self.services.len(),
            methods: self.methods.len(),
        }
    }

    pub fn truncate(&mut self, cp: DefsCheckpoint) {
        self.files.truncate(cp.files);
        self.messages.truncate(cp.messages);
        self.fields.truncate(cp.fields);
        self.oneofs.truncate(cp.oneofs);
        self.enums.truncate(cp.enums);
        self.enum_values.truncate(cp.enum_values);
        self.services.truncate(cp.services);
        self.methods.truncate(cp.methods);
    }

    pub fn file(&self, id: FileId) -> &FileData {
        &self.files[id.index()]
    }

    pub fn message(&self, id: MessageId) -> &MessageData {
        &self.messages[id.index()]
    }

    pub fn field(&self, id: FieldId) -> &FieldData {
        &self.fields[id.index()]
    }

    pub fn oneof(&self, id: OneofId) -> &OneofData {
        &self.oneofs[id.index()]
    }

    pub fn enum_(&self, id: EnumId) -> &EnumData {
        &self.enums[id.index()]
    }

    pub fn enum_value(&self, id: EnumValueId) -> &EnumValueData {
        &self.enum_values[id.index()]
    }

    pub fn service(&self, id: ServiceId) -> &ServiceData {
        &self.services[id.index()]
    }

    pub fn method(&self, id: MethodId) -> &MethodData {
        &self.methods[id.index()]
    }

    /// File that declared `def`, used when unwinding a failed build.
    pub fn file_of(&self, def: DefRef) -> Option<FileId> {
        Some(match def {
            DefRef::Message(id) => self.messages.get(id.index())?.file,
            DefRef::Enum(id) => self.enums.get(id.index())?.file,
            DefRef::EnumValue(id) => {
                let parent = self.enum_values.get(id.index())?.parent;
                self.enums.get(parent.index())?.file
            }
            DefRef::Extension(id) => self.fields.get(id.index())?.file,
            DefRef::Service(id) => self.services.get(id.index())?.file,
        })
    }
}
