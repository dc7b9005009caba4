//! Turning one [`FileDescriptorProto`] into defs and mini tables.
//!
//! A build runs in phases:
//! - **AllocatingDefs**: records every def and registers its full name
//! - **ResolvingNames**: binds type names, extendees and defaults
//! - **BuildingMiniTables**: encodes and decodes a layout per message, enum and extension
//! - **Linking**: wires sub tables and registers extensions
//!
//! Any error rolls the pool back to where it was before the build.

mod alloc;
mod layout;
mod link;
mod names;
mod resolve;


use minidesc_table::Checkpoint;
use tracing::debug;

use crate::DefPool;
use crate::defs::DefsCheckpoint;
use crate::error::BuildError;
use crate::features::Edition;
use crate::ids::FileId;
use crate::proto::FileDescriptorProto;

pub use layout::FileLayout;

/// Progress of a single file build.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Phase {
    Initial,
    AllocatingDefs,
    ResolvingNames,
    BuildingMiniTables,
    Linking,
    Committed,
    RolledBack,
}

/// Pool sizes captured before a build.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) struct PoolCheckpoint {
    pub defs: DefsCheckpoint,
    pub tables: Checkpoint,
}

pub(crate) struct FileBuilder<'a> {
    pool: &'a mut DefPool,
    proto: &'a FileDescriptorProto,
    layout: Option<FileLayout>,
    phase: Phase,
    start: PoolCheckpoint,
    file: FileId,
    edition: Edition,
}

impl<'a> FileBuilder<'a> {
    pub fn new(
        pool: &'a mut DefPool,
        proto: &'a FileDescriptorProto,
        layout: Option<FileLayout>,
    ) -> Self {
        let start = PoolCheckpoint {
            defs: pool.defs.checkpoint(),
            tables: pool.tables.checkpoint(),
        };
        let file = FileId(start.defs.files as u32);
        Self {
            pool,
            proto,
            layout,
            phase: Phase::Initial,
            start,
            file,
            edition: Edition::Proto2,
        }
    }

    /// Builds the file, committing it or restoring the pool.
    pub fn run(mut self) -> Result<FileId, BuildError> {
        self.pool.defaults_frozen = true;

        if let Some(existing) = self.pool.find_file(&self.proto.name) {
            let id = existing.id();
            if self.pool.defs.file(id).proto == *self.proto {
                debug!(file = %self.proto.name, "file already in pool");
                return Ok(id);
            }
            return Err(BuildError::duplicate(format!(
                "duplicate file name '{}'",
                self.proto.name
            )));
        }

        match self.build() {
            Ok(()) => {
                self.enter(Phase::Committed);
                Ok(self.file)
            }
            Err(err) => {
                self.enter(Phase::RolledBack);
                debug!(file = %self.proto.name, error = %err, "file build failed");
                if self.pool.defs.files.len() > self.start.defs.files {
                    self.pool.roll_back(self.file, &self.start);
                }
                Err(err)
            }
        }
    }

    fn build(&mut self) -> Result<(), BuildError> {
        self.enter(Phase::AllocatingDefs);
        self.allocate()?;
        self.enter(Phase::ResolvingNames);
        self.resolve()?;
        self.enter(Phase::BuildingMiniTables);
        self.build_tables()?;
        self.enter(Phase::Linking);
        self.link()
    }

    fn enter(&mut self, next: Phase) {
        debug!(file = %self.proto.name, from = ?self.phase, to = ?next, "file build phase");
        self.phase = next;
    }

    /// Index ranges of the records this build created.
    fn new_messages(&self) -> std::ops::Range<usize> {
        self.start.defs.messages..self.pool.defs.messages.len()
    }

    fn new_fields(&self) -> std::ops::Range<usize> {
        self.start.defs.fields..self.pool.defs.fields.len()
    }

    fn new_enums(&self) -> std::ops::Range<usize> {
        self.start.defs.enums..self.pool.defs.enums.len()
    }

    fn new_methods(&self) -> std::ops::Range<usize> {
        self.start.defs.methods..self.pool.defs.methods.len()
    }

    fn is_editions(&self) -> bool {
        self.edition >= Edition::Edition2023
    }
}
