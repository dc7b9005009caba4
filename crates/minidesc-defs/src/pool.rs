//! The symbol pool.

use minidesc_core::{Arena, Cursor, IntTable, StringTable, Value};
use minidesc_table::{MiniTableId, MiniTables, Platform};

use crate::builder::{FileBuilder, FileLayout, PoolCheckpoint};
use crate::defs::{Defs, EnumDef, EnumValueDef, FieldDef, FileDef, MessageDef, ServiceDef};
use crate::error::{BuildError, DefaultsError};
use crate::features::{Edition, FeatureSetDefaults};
use crate::ids::{FieldId, FileId, MessageId};
use crate::proto::{FileDescriptorProto, FileDescriptorSet};
use crate::symbol::DefRef;

/// Pool construction options.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PoolConfig {
    /// Target the mini table layouts are computed for.
    pub platform: Platform,
    /// Seed of the name tables. `None` draws a random one.
    pub hash_seed: Option<u64>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            platform: Platform::native(),
            hash_seed: None,
        }
    }
}

/// Registry of files and every def they declare.
///
/// Files are added one at a time. Each addition either commits completely
/// or leaves the pool exactly as it was.
pub struct DefPool {
    pub(crate) platform: Platform,
    pub(crate) arena: Arena,
    /// Full name → [`DefRef`].
    pub(crate) symbols: StringTable,
    /// File name → [`FileId`].
    pub(crate) file_names: StringTable,
    /// `(extendee table << 32) | number` → [`FieldId`].
    pub(crate) extensions: IntTable,
    /// Mini table index → [`MessageId`].
    pub(crate) by_table: IntTable,
    pub(crate) tables: MiniTables,
    pub(crate) defs: Defs,
    pub(crate) defaults: FeatureSetDefaults,
    pub(crate) defaults_frozen: bool,
}

impl Default for DefPool {
    fn default() -> Self {
        Self::new()
    }
}

impl DefPool {
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default())
    }

    pub fn with_config(config: PoolConfig) -> Self {
        let seed = config.hash_seed.unwrap_or_else(rand::random::<u64>);
        Self {
            platform: config.platform,
            arena: Arena::new(),
            symbols: StringTable::with_seed(32, seed),
            file_names: StringTable::with_seed(8, seed),
            extensions: IntTable::new(),
            by_table: IntTable::new(),
            tables: MiniTables::new(),
            defs: Defs::default(),
            defaults: FeatureSetDefaults::embedded().clone(),
            defaults_frozen: false,
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Mini tables built for the pool's defs.
    pub fn tables(&self) -> &MiniTables {
        &self.tables
    }

    pub fn feature_set_defaults(&self) -> &FeatureSetDefaults {
        &self.defaults
    }

    /// Replaces the feature defaults and narrows the accepted editions.
    ///
    /// Only allowed before the first file is added.
    pub fn set_feature_set_defaults(
        &mut self,
        mut defaults: FeatureSetDefaults,
        min_edition: Edition,
        max_edition: Edition,
    ) -> Result<(), DefaultsError> {
        if self.defaults_frozen {
            return Err(DefaultsError::FrozenDefaults);
        }
        if min_edition > max_edition {
            return Err(DefaultsError::InvalidRange {
                min: min_edition,
                max: max_edition,
            });
        }
        if min_edition < defaults.minimum_edition || max_edition > defaults.maximum_edition {
            return Err(DefaultsError::InvalidRange {
                min: min_edition,
                max: max_edition,
            });
        }
        defaults.minimum_edition = min_edition;
        defaults.maximum_edition = max_edition;
        defaults.validate()?;
        self.defaults = defaults;
        Ok(())
    }

    /// Same as [`set_feature_set_defaults`](Self::set_feature_set_defaults)
    /// for the `postcard` encoding of the defaults.
    pub fn set_serialized_feature_set_defaults(
        &mut self,
        bytes: &[u8],
        min_edition: Edition,
        max_edition: Edition,
    ) -> Result<(), DefaultsError> {
        if self.defaults_frozen {
            return Err(DefaultsError::FrozenDefaults);
        }
        let defaults = FeatureSetDefaults::from_bytes(bytes)?;
        self.set_feature_set_defaults(defaults, min_edition, max_edition)
    }

    // ============================================================
    // Adding files
    // ============================================================

    pub fn add_file(&mut self, proto: &FileDescriptorProto) -> Result<FileDef<'_>, BuildError> {
        let id = FileBuilder::new(self, proto, None).run()?;
        Ok(FileDef::new(self, id))
    }

    /// Adds a file whose message layouts were computed ahead of time.
    pub fn add_file_with_layout(
        &mut self,
        proto: &FileDescriptorProto,
        layout: FileLayout,
    ) -> Result<FileDef<'_>, BuildError> {
        let id = FileBuilder::new(self, proto, Some(layout)).run()?;
        Ok(FileDef::new(self, id))
    }

    /// Adds a `postcard` encoded [`FileDescriptorProto`].
    pub fn add_serialized_file(&mut self, bytes: &[u8]) -> Result<FileDef<'_>, BuildError> {
        let proto = FileDescriptorProto::from_binary(bytes)
            .map_err(|e| BuildError::malformed(format!("invalid serialized file: {e}")))?;
        self.add_file(&proto)
    }

    pub fn add_file_json(&mut self, json: &str) -> Result<FileDef<'_>, BuildError> {
        let proto = FileDescriptorProto::from_json(json)
            .map_err(|e| BuildError::malformed(format!("invalid file JSON: {e}")))?;
        self.add_file(&proto)
    }

    /// Adds every file of `set` in order, stopping at the first failure.
    ///
    /// Files added before the failing one stay in the pool.
    pub fn add_file_set(&mut self, set: &FileDescriptorSet) -> Result<Vec<FileId>, BuildError> {
        let mut ids = Vec::with_capacity(set.file.len());
        for proto in &set.file {
            ids.push(FileBuilder::new(self, proto, None).run()?);
        }
        Ok(ids)
    }

    // ============================================================
    // Lookups
    // ============================================================

    pub(crate) fn lookup_symbol(&self, full_name: &str) -> Option<DefRef> {
        let value = self.symbols.lookup(&self.arena, full_name.as_bytes())?;
        DefRef::from_value(value)
    }

    pub fn file_count(&self) -> usize {
        self.defs.files.len()
    }

    pub fn file(&self, id: FileId) -> FileDef<'_> {
        FileDef::new(self, id)
    }

    pub fn files(&self) -> impl ExactSizeIterator<Item = FileDef<'_>> + '_ {
        (0..self.defs.files.len()).map(|i| FileDef::new(self, FileId(i as u32)))
    }

    pub fn find_file(&self, name: &str) -> Option<FileDef<'_>> {
        let value = self.file_names.lookup(&self.arena, name.as_bytes())?;
        Some(FileDef::new(self, FileId(value.as_u32())))
    }

    /// Looks up any def by dotted full name, without a leading dot.
    pub fn find_symbol(&self, full_name: &str) -> Option<DefRef> {
        self.lookup_symbol(full_name)
    }

    pub fn find_message(&self, full_name: &str) -> Option<MessageDef<'_>> {
        match self.lookup_symbol(full_name)? {
            DefRef::Message(id) => Some(MessageDef::new(self, id)),
            _ => None,
        }
    }

    pub fn find_enum(&self, full_name: &str) -> Option<EnumDef<'_>> {
        match self.lookup_symbol(full_name)? {
            DefRef::Enum(id) => Some(EnumDef::new(self, id)),
            _ => None,
        }
    }

    pub fn find_enum_value(&self, full_name: &str) -> Option<EnumValueDef<'_>> {
        match self.lookup_symbol(full_name)? {
            DefRef::EnumValue(id) => Some(EnumValueDef::new(self, id)),
            _ => None,
        }
    }

    pub fn find_extension(&self, full_name: &str) -> Option<FieldDef<'_>> {
        match self.lookup_symbol(full_name)? {
            DefRef::Extension(id) => Some(FieldDef::new(self, id)),
            _ => None,
        }
    }

    pub fn find_service(&self, full_name: &str) -> Option<ServiceDef<'_>> {
        match self.lookup_symbol(full_name)? {
            DefRef::Service(id) => Some(ServiceDef::new(self, id)),
            _ => None,
        }
    }

    pub fn find_extension_by_number(
        &self,
        extendee: MessageDef<'_>,
        number: u32,
    ) -> Option<FieldDef<'_>> {
        let table = self.defs.message(extendee.id()).table;
        let value = self.extensions.lookup(extension_key(table, number))?;
        Some(FieldDef::new(self, FieldId(value.as_u32())))
    }

    /// Every extension of `extendee` known to the pool, by field number.
    pub fn get_all_extensions(&self, extendee: MessageDef<'_>) -> Vec<FieldDef<'_>> {
        let table = self.defs.message(extendee.id()).table;
        let mut found: Vec<(u32, FieldId)> = self
            .extensions
            .iter()
            .filter(|&(key, _)| (key >> 32) as u32 == table.index() as u32)
            .map(|(key, value)| (key as u32, FieldId(value.as_u32())))
            .collect();
        found.sort_unstable_by_key(|&(number, _)| number);
        found
            .into_iter()
            .map(|(_, id)| FieldDef::new(self, id))
            .collect()
    }

    /// The message whose layout is `table`.
    pub fn find_message_by_mini_table(&self, table: MiniTableId) -> Option<MessageDef<'_>> {
        if table.is_empty_table() {
            return None;
        }
        let value = self.by_table.lookup(table.index() as u64)?;
        Some(MessageDef::new(self, MessageId(value.as_u32())))
    }

    // ============================================================
    // Build support
    // ============================================================

    pub(crate) fn insert_symbol(&mut self, full_name: &str, def: DefRef) -> Result<(), BuildError> {
        if let Some(existing) = self.lookup_symbol(full_name) {
            return Err(BuildError::duplicate(format!(
                "duplicate symbol '{full_name}' (already defined as {})",
                existing.kind_name()
            )));
        }
        self.symbols
            .insert(&mut self.arena, full_name.as_bytes(), def.to_value())?;
        Ok(())
    }

    pub(crate) fn register_extension(
        &mut self,
        extendee: MiniTableId,
        number: u32,
        field: FieldId,
    ) -> Result<(), BuildError> {
        let key = extension_key(extendee, number);
        if let Some(existing) = self.extensions.lookup(key) {
            let existing = &self.defs.field(FieldId(existing.as_u32())).full_name;
            return Err(BuildError::duplicate(format!(
                "extension number {number} is already used by '{existing}'"
            )));
        }
        self.extensions.insert(key, Value::from_u32(field.0));
        Ok(())
    }

    /// Removes every trace of `file`, built after `checkpoint`.
    pub(crate) fn roll_back(&mut self, file: FileId, checkpoint: &PoolCheckpoint) {
        let mut removed = 0usize;
        let mut cursor = Cursor::BEGIN;
        while let Some((_, value)) = self.symbols.next(&mut cursor) {
            // A name whose def was never recorded belongs to this build too.
            let owner = DefRef::from_value(value).and_then(|def| self.defs.file_of(def));
            if owner.is_none_or(|owner| owner == file) {
                self.symbols.remove_at(&mut cursor);
                removed += 1;
            }
        }

        let first_field = checkpoint.defs.fields as u32;
        let mut cursor = Cursor::BEGIN;
        while let Some((_, value)) = self.extensions.next(&mut cursor) {
            if value.as_u32() >= first_field {
                self.extensions.remove_at(&mut cursor);
            }
        }
        let first_message = checkpoint.defs.messages as u32;
        let mut cursor = Cursor::BEGIN;
        while let Some((_, value)) = self.by_table.next(&mut cursor) {
            if value.as_u32() >= first_message {
                self.by_table.remove_at(&mut cursor);
            }
        }

        let name = &self.defs.file(file).name;
        self.file_names.remove(&self.arena, name.as_bytes());
        self.defs.truncate(checkpoint.defs);
        self.tables.truncate(checkpoint.tables);

        if removed > 0 {
            tracing::warn!(file = file.0, removed, "rolled back symbols of failed file");
        }
    }
}

pub(crate) fn extension_key(extendee: MiniTableId, number: u32) -> u64 {
    ((extendee.index() as u64) << 32) | number as u64
}
