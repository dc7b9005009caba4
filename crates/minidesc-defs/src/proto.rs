//! Descriptor protos accepted by the pool.
//!
//! These mirror `google/protobuf/descriptor.proto` closely enough to build
//! defs from. Field names follow the proto JSON mapping, so `protoc`
//! generated JSON loads directly. The binary form is `postcard`.

use minidesc_table::FieldType;
use serde::{Deserialize, Serialize};

use crate::features::{Edition, FeatureSet};

#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileDescriptorSet {
    pub file: Vec<FileDescriptorProto>,
}

impl FileDescriptorSet {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_binary(bytes: &[u8]) -> Result<Self, postcard::Error> {
        postcard::from_bytes(bytes)
    }

    pub fn to_binary(&self) -> Vec<u8> {
        postcard::to_allocvec(self).expect("serialization should not fail")
    }
}

#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileDescriptorProto {
    pub name: String,
    pub package: String,
    pub dependency: Vec<String>,
    pub public_dependency: Vec<i32>,
    pub message_type: Vec<DescriptorProto>,
    pub enum_type: Vec<EnumDescriptorProto>,
    pub service: Vec<ServiceDescriptorProto>,
    pub extension: Vec<FieldDescriptorProto>,
    pub options: Option<FileOptions>,
    /// `"proto2"` (also when empty), `"proto3"` or `"editions"`.
    pub syntax: String,
    pub edition: Option<Edition>,
}

impl FileDescriptorProto {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_binary(bytes: &[u8]) -> Result<Self, postcard::Error> {
        postcard::from_bytes(bytes)
    }

    pub fn to_binary(&self) -> Vec<u8> {
        postcard::to_allocvec(self).expect("serialization should not fail")
    }
}

#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DescriptorProto {
    pub name: String,
    pub field: Vec<FieldDescriptorProto>,
    pub extension: Vec<FieldDescriptorProto>,
    pub nested_type: Vec<DescriptorProto>,
    pub enum_type: Vec<EnumDescriptorProto>,
    pub extension_range: Vec<ExtensionRange>,
    pub oneof_decl: Vec<OneofDescriptorProto>,
    pub options: Option<MessageOptions>,
    pub reserved_range: Vec<ReservedRange>,
    pub reserved_name: Vec<String>,
}

/// Field numbers `start..end`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtensionRange {
    pub start: i32,
    pub end: i32,
}

/// Field numbers `start..end`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReservedRange {
    pub start: i32,
    pub end: i32,
}

#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FieldDescriptorProto {
    pub name: String,
    pub number: i32,
    pub label: Option<Label>,
    #[serde(rename = "type")]
    pub ty: Option<Type>,
    /// Message or enum name, resolved relative to the enclosing scope
    /// unless it starts with `.`.
    pub type_name: String,
    pub extendee: String,
    pub default_value: Option<String>,
    pub oneof_index: Option<i32>,
    pub json_name: Option<String>,
    pub options: Option<FieldOptions>,
    pub proto3_optional: bool,
}

#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OneofDescriptorProto {
    pub name: String,
    pub options: Option<OneofOptions>,
}

#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EnumDescriptorProto {
    pub name: String,
    pub value: Vec<EnumValueDescriptorProto>,
    pub options: Option<EnumOptions>,
    pub reserved_range: Vec<EnumReservedRange>,
    pub reserved_name: Vec<String>,
}

/// Enum values `start..=end`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EnumReservedRange {
    pub start: i32,
    pub end: i32,
}

#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EnumValueDescriptorProto {
    pub name: String,
    pub number: i32,
    pub options: Option<EnumValueOptions>,
}

#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServiceDescriptorProto {
    pub name: String,
    pub method: Vec<MethodDescriptorProto>,
}

#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MethodDescriptorProto {
    pub name: String,
    pub input_type: String,
    pub output_type: String,
    pub client_streaming: bool,
    pub server_streaming: bool,
}

// ============================================================
// Options
// ============================================================

#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileOptions {
    pub features: Option<FeatureSet>,
}

#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MessageOptions {
    pub message_set_wire_format: bool,
    pub map_entry: bool,
    pub features: Option<FeatureSet>,
}

#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FieldOptions {
    pub packed: Option<bool>,
    pub features: Option<FeatureSet>,
}

#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OneofOptions {
    pub features: Option<FeatureSet>,
}

#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EnumOptions {
    pub features: Option<FeatureSet>,
}

#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EnumValueOptions {
    pub features: Option<FeatureSet>,
}

// ============================================================
// Labels and types
// ============================================================

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Label {
    #[serde(rename = "LABEL_OPTIONAL")]
    Optional,
    #[serde(rename = "LABEL_REQUIRED")]
    Required,
    #[serde(rename = "LABEL_REPEATED")]
    Repeated,
}

/// Declared field type, numbered as in `descriptor.proto`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[repr(u8)]
pub enum Type {
    #[serde(rename = "TYPE_DOUBLE")]
    Double = 1,
    #[serde(rename = "TYPE_FLOAT")]
    Float = 2,
    #[serde(rename = "TYPE_INT64")]
    Int64 = 3,
    #[serde(rename = "TYPE_UINT64")]
    UInt64 = 4,
    #[serde(rename = "TYPE_INT32")]
    Int32 = 5,
    #[serde(rename = "TYPE_FIXED64")]
    Fixed64 = 6,
    #[serde(rename = "TYPE_FIXED32")]
    Fixed32 = 7,
    #[serde(rename = "TYPE_BOOL")]
    Bool = 8,
    #[serde(rename = "TYPE_STRING")]
    String = 9,
    #[serde(rename = "TYPE_GROUP")]
    Group = 10,
    #[serde(rename = "TYPE_MESSAGE")]
    Message = 11,
    #[serde(rename = "TYPE_BYTES")]
    Bytes = 12,
    #[serde(rename = "TYPE_UINT32")]
    UInt32 = 13,
    #[serde(rename = "TYPE_ENUM")]
    Enum = 14,
    #[serde(rename = "TYPE_SFIXED32")]
    SFixed32 = 15,
    #[serde(rename = "TYPE_SFIXED64")]
    SFixed64 = 16,
    #[serde(rename = "TYPE_SINT32")]
    SInt32 = 17,
    #[serde(rename = "TYPE_SINT64")]
    SInt64 = 18,
}

impl From<Type> for FieldType {
    fn from(ty: Type) -> Self {
        match ty {
            Type::Double => Self::Double,
            Type::Float => Self::Float,
            Type::Int64 => Self::Int64,
            Type::UInt64 => Self::UInt64,
            Type::Int32 => Self::Int32,
            Type::Fixed64 => Self::Fixed64,
            Type::Fixed32 => Self::Fixed32,
            Type::Bool => Self::Bool,
            Type::String => Self::String,
            Type::Group => Self::Group,
            Type::Message => Self::Message,
            Type::Bytes => Self::Bytes,
            Type::UInt32 => Self::UInt32,
            Type::Enum => Self::Enum,
            Type::SFixed32 => Self::SFixed32,
            Type::SFixed64 => Self::SFixed64,
            Type::SInt32 => Self::SInt32,
            Type::SInt64 => Self::SInt64,
        }
    }
}
