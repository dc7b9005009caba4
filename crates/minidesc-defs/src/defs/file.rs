use crate::DefPool;
use crate::builder::FileLayout;
use crate::features::{Edition, ResolvedFeatures};
use crate::ids::FileId;

use super::{EnumDef, FieldDef, FileData, MessageDef, ServiceDef};

/// A file added to a pool.
#[derive(Clone, Copy)]
pub struct FileDef<'p> {
    pool: &'p DefPool,
    id: FileId,
}

impl<'p> FileDef<'p> {
    pub(crate) fn new(pool: &'p DefPool, id: FileId) -> Self {
        Self { pool, id }
    }

    fn data(&self) -> &'p FileData {
        self.pool.defs.file(self.id)
    }

    pub fn id(&self) -> FileId {
        self.id
    }

    pub fn pool(&self) -> &'p DefPool {
        self.pool
    }

    pub fn name(&self) -> &'p str {
        &self.data().name
    }

    pub fn package(&self) -> &'p str {
        &self.data().package
    }

    pub fn edition(&self) -> Edition {
        self.data().edition
    }

    /// File-level features, after merging the file's options over the
    /// edition defaults.
    pub fn features(&self) -> ResolvedFeatures {
        self.data().features
    }

    pub fn dependencies(&self) -> impl ExactSizeIterator<Item = FileDef<'p>> + 'p {
        let pool = self.pool;
        self.data()
            .dependencies
            .iter()
            .map(move |&id| FileDef::new(pool, id))
    }

    pub fn public_dependencies(&self) -> impl ExactSizeIterator<Item = FileDef<'p>> + 'p {
        let pool = self.pool;
        self.data()
            .public_dependencies
            .iter()
            .map(move |&id| FileDef::new(pool, id))
    }

    /// Top-level messages, in declaration order.
    pub fn messages(&self) -> impl ExactSizeIterator<Item = MessageDef<'p>> + 'p {
        let pool = self.pool;
        self.data()
            .messages
            .iter()
            .map(move |&id| MessageDef::new(pool, id))
    }

    pub fn enums(&self) -> impl ExactSizeIterator<Item = EnumDef<'p>> + 'p {
        let pool = self.pool;
        self.data()
            .enums
            .iter()
            .map(move |&id| EnumDef::new(pool, id))
    }

    /// Top-level extensions.
    pub fn extensions(&self) -> impl ExactSizeIterator<Item = FieldDef<'p>> + 'p {
        let pool = self.pool;
        self.data()
            .extensions
            .iter()
            .map(move |&id| FieldDef::new(pool, id))
    }

    pub fn services(&self) -> impl ExactSizeIterator<Item = ServiceDef<'p>> + 'p {
        let pool = self.pool;
        self.data()
            .services
            .iter()
            .map(move |&id| ServiceDef::new(pool, id))
    }

    /// Copies of this file's tables, in the order
    /// [`DefPool::add_file_with_layout`] expects them.
    pub fn layout(&self) -> FileLayout {
        let defs = &self.pool.defs;
        let tables = &self.pool.tables;
        let messages = defs
            .messages
            .iter()
            .filter(|m| m.file == self.id)
            .map(|m| tables.message(m.table).clone())
            .collect();
        let enums = defs
            .enums
            .iter()
            .filter(|e| e.file == self.id)
            .filter_map(|e| e.table)
            .map(|t| tables.enum_table(t).clone())
            .collect();
        FileLayout { messages, enums }
    }
}

impl std::fmt::Debug for FileDef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileDef")
            .field("name", &self.name())
            .field("package", &self.package())
            .finish()
    }
}
