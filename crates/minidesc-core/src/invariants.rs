//! Invariant checks excluded from coverage reports.

#![cfg_attr(coverage_nightly, coverage(off))]

/// Inserts resize before the load limit, so a free slot always exists.
pub(crate) fn table_full() -> ! {
    panic!("hash table: no empty slot (insert must resize before the table is full)")
}
