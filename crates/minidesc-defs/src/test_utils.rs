//! Pools and files shared by the tests.

use minidesc_table::Platform;

use crate::{BuildError, DefPool, FileDescriptorProto, PoolConfig};

pub fn proto(json: &str) -> FileDescriptorProto {
    FileDescriptorProto::from_json(json).unwrap_or_else(|e| panic!("bad fixture: {e}\n{json}"))
}

/// A 64-bit pool with a fixed hash seed.
pub fn empty_pool() -> DefPool {
    DefPool::with_config(PoolConfig {
        platform: Platform::Bits64,
        hash_seed: Some(0x5eed),
    })
}

/// A pool holding `files`, each of which must build.
pub fn pool_of(files: &[&str]) -> DefPool {
    let mut pool = empty_pool();
    for json in files {
        let proto = proto(json);
        if let Err(e) = pool.add_file(&proto) {
            panic!("{} failed to build: {e}", proto.name);
        }
    }
    pool
}

/// Adds `json` to `pool`, expecting it to fail.
pub fn add_err(pool: &mut DefPool, json: &str) -> BuildError {
    let proto = proto(json);
    match pool.add_file(&proto) {
        Ok(file) => panic!("{} built unexpectedly", file.name()),
        Err(e) => e,
    }
}

/// Builds `json` in a fresh pool, expecting it to fail.
pub fn build_err(json: &str) -> BuildError {
    add_err(&mut empty_pool(), json)
}
