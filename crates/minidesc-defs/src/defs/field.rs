use minidesc_table::{FieldType, MiniTableExtension, MiniTableField};

use crate::DefPool;
use crate::default_value::DefaultValue;
use crate::features::{FieldPresence, RepeatedFieldEncoding, ResolvedFeatures, Utf8Validation};
use crate::ids::FieldId;
use crate::proto::Label;

use super::{EnumDef, FieldData, FileDef, MessageDef, OneofDef, SubDef};

/// A field of a message, or an extension.
#[derive(Clone, Copy)]
pub struct FieldDef<'p> {
    pool: &'p DefPool,
    id: FieldId,
}

impl<'p> FieldDef<'p> {
    pub(crate) fn new(pool: &'p DefPool, id: FieldId) -> Self {
        Self { pool, id }
    }

    fn data(&self) -> &'p FieldData {
        self.pool.defs.field(self.id)
    }

    pub fn id(&self) -> FieldId {
        self.id
    }

    pub fn name(&self) -> &'p str {
        &self.data().name
    }

    pub fn full_name(&self) -> &'p str {
        &self.data().full_name
    }

    pub fn json_name(&self) -> &'p str {
        &self.data().json_name
    }

    /// Whether the JSON name was given rather than derived.
    pub fn has_json_name(&self) -> bool {
        self.data().has_json_name
    }

    pub fn number(&self) -> u32 {
        self.data().number
    }

    pub fn label(&self) -> Label {
        self.data().label
    }

    pub fn field_type(&self) -> FieldType {
        self.data().field_type()
    }

    pub fn file(&self) -> FileDef<'p> {
        FileDef::new(self.pool, self.data().file)
    }

    pub fn features(&self) -> ResolvedFeatures {
        self.data().features
    }

    // ============================================================
    // Shape
    // ============================================================

    pub fn is_repeated(&self) -> bool {
        self.data().label == Label::Repeated
    }

    pub fn is_required(&self) -> bool {
        self.data().features.field_presence == FieldPresence::LegacyRequired
    }

    pub fn is_extension(&self) -> bool {
        self.data().is_extension()
    }

    pub fn is_sub_message(&self) -> bool {
        self.field_type().is_sub_message()
    }

    /// Whether this is the repeated field of a map.
    pub fn is_map(&self) -> bool {
        self.is_repeated() && self.message_type().is_some_and(|m| m.is_map_entry())
    }

    pub fn is_packed(&self) -> bool {
        let data = self.data();
        self.is_repeated()
            && data.field_type().is_packable()
            && data.features.repeated_field_encoding == RepeatedFieldEncoding::Packed
    }

    /// Whether a singular value can be told apart from its default.
    pub fn has_presence(&self) -> bool {
        self.data().has_presence()
    }

    pub fn is_closed_enum(&self) -> bool {
        self.enum_type().is_some_and(|e| e.is_closed())
    }

    pub fn validates_utf8(&self) -> bool {
        self.field_type() == FieldType::String
            && self.data().features.utf8_validation == Utf8Validation::Verify
    }

    pub fn is_proto3_optional(&self) -> bool {
        self.data().proto3_optional
    }

    // ============================================================
    // Relations
    // ============================================================

    /// Message whose instances hold this field. For an extension this is
    /// the extendee.
    pub fn containing_type(&self) -> Option<MessageDef<'p>> {
        let data = self.data();
        let owner = if data.is_extension() { data.extendee } else { data.scope };
        owner.map(|id| MessageDef::new(self.pool, id))
    }

    /// Message an extension was declared in, if not at file level.
    pub fn extension_scope(&self) -> Option<MessageDef<'p>> {
        let data = self.data();
        if !data.is_extension() {
            return None;
        }
        data.scope.map(|id| MessageDef::new(self.pool, id))
    }

    pub fn containing_oneof(&self) -> Option<OneofDef<'p>> {
        self.data().oneof.map(|id| OneofDef::new(self.pool, id))
    }

    /// The containing oneof, unless it is synthetic.
    pub fn real_containing_oneof(&self) -> Option<OneofDef<'p>> {
        self.containing_oneof().filter(|o| !o.is_synthetic())
    }

    pub fn message_type(&self) -> Option<MessageDef<'p>> {
        match self.data().sub? {
            SubDef::Message(id) => Some(MessageDef::new(self.pool, id)),
            SubDef::Enum(_) => None,
        }
    }

    pub fn enum_type(&self) -> Option<EnumDef<'p>> {
        match self.data().sub? {
            SubDef::Enum(id) => Some(EnumDef::new(self.pool, id)),
            SubDef::Message(_) => None,
        }
    }

    pub fn default_value(&self) -> &'p DefaultValue {
        &self.data().default
    }

    /// Whether a default was written out rather than implied by the type.
    pub fn has_default(&self) -> bool {
        self.data().default_text.is_some()
    }

    // ============================================================
    // Layout
    // ============================================================

    /// Position of the field in its message's mini table.
    pub fn layout_index(&self) -> usize {
        self.data().layout_index as usize
    }

    /// Layout record of a message field. Extensions have none; see
    /// [`FieldDef::mini_table_extension`].
    pub fn mini_table_field(&self) -> Option<&'p MiniTableField> {
        let data = self.data();
        if data.is_extension() {
            return None;
        }
        let message = self.pool.defs.message(data.scope?);
        self.pool
            .tables
            .message(message.table)
            .field(data.layout_index as usize)
    }

    pub fn mini_table_extension(&self) -> Option<&'p MiniTableExtension> {
        let ext = self.data().extension?;
        Some(self.pool.tables.extension(ext))
    }
}

impl PartialEq for FieldDef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.pool, other.pool) && self.id == other.id
    }
}

impl Eq for FieldDef<'_> {}

impl std::fmt::Debug for FieldDef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldDef")
            .field("full_name", &self.full_name())
            .field("number", &self.number())
            .finish()
    }
}
