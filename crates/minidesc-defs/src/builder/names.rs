//! Identifiers and scoped name lookup.

use crate::DefPool;
use crate::error::BuildError;
use crate::symbol::DefRef;

pub(super) fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_owned()
    } else {
        format!("{prefix}.{name}")
    }
}

/// Scope a full name was declared in.
pub(super) fn parent_scope(full_name: &str) -> &str {
    full_name.rsplit_once('.').map_or("", |(scope, _)| scope)
}

fn is_ident(name: &str) -> bool {
    let mut bytes = name.bytes();
    match bytes.next() {
        Some(b) if b.is_ascii_alphabetic() || b == b'_' => {}
        _ => return false,
    }
    bytes.all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Checks a single, unqualified name.
pub(super) fn check_ident(name: &str, what: &str) -> Result<(), BuildError> {
    if is_ident(name) {
        return Ok(());
    }
    Err(BuildError::malformed(format!("invalid {what} name '{name}'")))
}

/// Checks a dotted package name. The empty package is allowed.
pub(super) fn check_package(package: &str) -> Result<(), BuildError> {
    if package.is_empty() || package.split('.').all(is_ident) {
        return Ok(());
    }
    Err(BuildError::malformed(format!("invalid package name '{package}'")))
}

/// Resolves `name` as seen from `scope`.
///
/// A leading `.` makes the name absolute. Otherwise the innermost scope is
/// tried first: from `a.b.c`, `X.Y` is looked up as `a.b.c.X.Y`, `a.b.X.Y`,
/// `a.X.Y` and finally `X.Y`.
pub(super) fn resolve_name(pool: &DefPool, scope: &str, name: &str) -> Option<DefRef> {
    if let Some(absolute) = name.strip_prefix('.') {
        return pool.lookup_symbol(absolute);
    }
    let mut scope = scope;
    loop {
        let candidate = join(scope, name);
        if let Some(found) = pool.lookup_symbol(&candidate) {
            return Some(found);
        }
        if scope.is_empty() {
            return None;
        }
        scope = parent_scope(scope);
    }
}
