use crate::DefPool;
use crate::ids::{MethodId, ServiceId};

use super::{FileDef, MessageDef, MethodData, ServiceData};

/// An RPC service.
#[derive(Clone, Copy)]
pub struct ServiceDef<'p> {
    pool: &'p DefPool,
    id: ServiceId,
}

impl<'p> ServiceDef<'p> {
    pub(crate) fn new(pool: &'p DefPool, id: ServiceId) -> Self {
        Self { pool, id }
    }

    fn data(&self) -> &'p ServiceData {
        self.pool.defs.service(self.id)
    }

    pub fn id(&self) -> ServiceId {
        self.id
    }

    pub fn name(&self) -> &'p str {
        &self.data().name
    }

    pub fn full_name(&self) -> &'p str {
        &self.data().full_name
    }

    pub fn file(&self) -> FileDef<'p> {
        FileDef::new(self.pool, self.data().file)
    }

    pub fn methods(&self) -> impl ExactSizeIterator<Item = MethodDef<'p>> + 'p {
        let pool = self.pool;
        self.data()
            .methods
            .iter()
            .map(move |&id| MethodDef::new(pool, id))
    }

    pub fn find_method_by_name(&self, name: &str) -> Option<MethodDef<'p>> {
        self.methods().find(|m| m.name() == name)
    }
}

impl std::fmt::Debug for ServiceDef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ServiceDef").field(&self.full_name()).finish()
    }
}

#[derive(Clone, Copy)]
pub struct MethodDef<'p> {
    pool: &'p DefPool,
    id: MethodId,
}

impl<'p> MethodDef<'p> {
    pub(crate) fn new(pool: &'p DefPool, id: MethodId) -> Self {
        Self { pool, id }
    }

    fn data(&self) -> &'p MethodData {
        self.pool.defs.method(self.id)
    }

    pub fn id(&self) -> MethodId {
        self.id
    }

    pub fn name(&self) -> &'p str {
        &self.data().name
    }

    pub fn full_name(&self) -> &'p str {
        &self.data().full_name
    }

    pub fn service(&self) -> ServiceDef<'p> {
        ServiceDef::new(self.pool, self.data().service)
    }

    /// Request type. Always set once the file is in the pool.
    pub fn input_type(&self) -> Option<MessageDef<'p>> {
        self.data().input.map(|id| MessageDef::new(self.pool, id))
    }

    pub fn output_type(&self) -> Option<MessageDef<'p>> {
        self.data().output.map(|id| MessageDef::new(self.pool, id))
    }

    pub fn client_streaming(&self) -> bool {
        self.data().client_streaming
    }

    pub fn server_streaming(&self) -> bool {
        self.data().server_streaming
    }
}

impl std::fmt::Debug for MethodDef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("MethodDef").field(&self.full_name()).finish()
    }
}
