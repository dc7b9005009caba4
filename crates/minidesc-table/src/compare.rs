//! Structural comparison of mini tables.

use minidesc_core::{IntTable, Value};

use crate::store::MiniTables;
use crate::table::{MiniTable, MiniTableId};
use crate::types::CType;

/// Outcome of [`equals`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Equality {
    Equal,
    NotEqual,
}

impl From<bool> for Equality {
    fn from(equal: bool) -> Self {
        if equal { Self::Equal } else { Self::NotEqual }
    }
}

/// Whether `dst` lays out every field of `src` identically.
///
/// Sub-message tables are not inspected.
pub fn compatible(src: &MiniTable, dst: &MiniTable) -> bool {
    same_fields(src, dst)
}

/// Whether `src` and `dst` describe the same graph of layouts, following
/// sub-message links in both stores.
pub fn equals(tables: &MiniTables, src: MiniTableId, dst: MiniTableId) -> Equality {
    equals_across(tables, src, tables, dst)
}

/// [`equals`] for tables held by two different stores.
pub fn equals_across(
    src_tables: &MiniTables,
    src: MiniTableId,
    dst_tables: &MiniTables,
    dst: MiniTableId,
) -> Equality {
    let mut walk = DeepCheck {
        src_tables,
        dst_tables,
        visited: IntTable::new(),
    };
    walk.check(src, dst).into()
}

fn same_fields(src: &MiniTable, dst: &MiniTable) -> bool {
    if src.field_count() != dst.field_count() {
        return false;
    }
    src.fields().iter().all(|s| {
        dst.find_field_by_number(s.number()).is_some_and(|d| {
            s.ctype() == d.ctype()
                && s.raw_mode() == d.raw_mode()
                && s.offset() == d.offset()
                && s.presence() == d.presence()
                && s.sub_index() == d.sub_index()
        })
    })
}

struct DeepCheck<'a> {
    src_tables: &'a MiniTables,
    dst_tables: &'a MiniTables,
    /// Source table id to the destination it was paired with.
    visited: IntTable,
}

impl DeepCheck<'_> {
    fn check(&mut self, src_id: MiniTableId, dst_id: MiniTableId) -> bool {
        let src = self.src_tables.message(src_id);
        let dst = self.dst_tables.message(dst_id);
        if !same_fields(src, dst) {
            return false;
        }
        self.visited
            .insert(src_id.0 as u64, Value::from_u32(dst_id.0));

        for s in src.fields() {
            if s.ctype() != CType::Message {
                continue;
            }
            let Some(d) = dst.find_field_by_number(s.number()) else {
                return false;
            };
            let (Some(sub_src), Some(sub_dst)) = (src.sub_message(s), dst.sub_message(d)) else {
                continue;
            };
            match self.visited.lookup(sub_src.0 as u64) {
                Some(paired) => {
                    if paired.as_u32() != sub_dst.0 {
                        return false;
                    }
                }
                None => {
                    if !self.check(sub_src, sub_dst) {
                        return false;
                    }
                }
            }
        }
        true
    }
}
