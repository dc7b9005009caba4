//! Hasbit numbering and slot placement.

use super::{Oneof, Presence, Result};
use crate::constants::{MAX_MESSAGE_SIZE, RESERVED_HASBITS};
use crate::error::DecodeErrorKind;
use crate::field::MiniTableField;
use crate::types::{FieldRep, Platform};

pub(super) struct Hasbits {
    /// Bytes used by the hasbit bitmap, reserved bits included.
    pub size: usize,
    pub required_count: u8,
}

/// Numbers hasbits after the reserved range. Required fields take the
/// lowest indices.
pub(super) fn assign_hasbits(fields: &mut [MiniTableField], presence: &[Presence]) -> Result<Hasbits> {
    let mut last = RESERVED_HASBITS - 1;

    for (field, class) in fields.iter_mut().zip(presence) {
        match class {
            Presence::Required => {
                last += 1;
                field.presence = last as i32;
            }
            Presence::None => field.presence = 0,
            Presence::Hasbit | Presence::Oneof(_) => {}
        }
    }
    if last > RESERVED_HASBITS + 63 {
        return Err(DecodeErrorKind::TooManyRequired);
    }
    let required_count = (last - (RESERVED_HASBITS - 1)) as u8;

    for (field, class) in fields.iter_mut().zip(presence) {
        if *class == Presence::Hasbit {
            last += 1;
            field.presence = last as i32;
        }
    }

    Ok(Hasbits {
        size: (last as usize + 1).div_ceil(8),
        required_count,
    })
}

/// Placement order within one representation: case slots before the
/// oneof data they describe, both before regular fields.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub(super) enum ItemKind {
    OneofCase,
    OneofField,
    Field,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(super) struct LayoutItem {
    pub rep: FieldRep,
    pub kind: ItemKind,
    /// Field index; for oneof items, the last declared member.
    pub field_index: usize,
    pub oneof: Option<usize>,
}

impl LayoutItem {
    fn sort_key(&self) -> (FieldRep, ItemKind, usize) {
        (self.rep, self.kind, self.field_index)
    }
}

/// Collects one item per regular field and two per oneof, smallest first.
pub(super) fn sort_items(fields: &[MiniTableField], presence: &[Presence], oneofs: &[Oneof]) -> Vec<LayoutItem> {
    let mut items = Vec::with_capacity(fields.len() + oneofs.len() * 2);

    for (index, oneof) in oneofs.iter().enumerate() {
        let Some(&last) = oneof.members.last() else {
            continue;
        };
        items.push(LayoutItem {
            rep: oneof.rep,
            kind: ItemKind::OneofField,
            field_index: last,
            oneof: Some(index),
        });
        items.push(LayoutItem {
            rep: FieldRep::FourByte,
            kind: ItemKind::OneofCase,
            field_index: last,
            oneof: Some(index),
        });
    }

    for (index, (field, class)) in fields.iter().zip(presence).enumerate() {
        if matches!(class, Presence::Oneof(_)) {
            continue;
        }
        items.push(LayoutItem {
            rep: field.rep(),
            kind: ItemKind::Field,
            field_index: index,
            oneof: None,
        });
    }

    items.sort_by_key(LayoutItem::sort_key);
    items
}

fn place(size: &mut usize, rep: FieldRep, platform: Platform) -> Result<u16> {
    let offset = size.next_multiple_of(rep.align(platform));
    let end = offset + rep.size(platform);
    if end > MAX_MESSAGE_SIZE {
        return Err(DecodeErrorKind::SizeExceeded(MAX_MESSAGE_SIZE));
    }
    *size = end;
    Ok(offset as u16)
}

/// Places every item after the hasbit bytes and returns the final size.
pub(super) fn assign_offsets(
    fields: &mut [MiniTableField],
    oneofs: &[Oneof],
    items: &[LayoutItem],
    hasbit_bytes: usize,
    platform: Platform,
) -> Result<u16> {
    let mut size = hasbit_bytes;

    for item in items {
        let offset = place(&mut size, item.rep, platform)?;
        match (item.kind, item.oneof) {
            (ItemKind::OneofCase, Some(oneof)) => {
                for &member in &oneofs[oneof].members {
                    fields[member].presence = !(offset as i32);
                }
            }
            (ItemKind::OneofField, Some(oneof)) => {
                for &member in &oneofs[oneof].members {
                    fields[member].offset = offset;
                }
            }
            _ => fields[item.field_index].offset = offset,
        }
    }

    let size = size.next_multiple_of(8);
    if size > MAX_MESSAGE_SIZE {
        return Err(DecodeErrorKind::SizeExceeded(MAX_MESSAGE_SIZE));
    }
    Ok(size as u16)
}

/// Fixed layout of map entry messages.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(super) struct MapEntryLayout {
    pub key_offset: u16,
    pub value_offset: u16,
    pub size: u16,
}

impl MapEntryLayout {
    pub fn for_platform(platform: Platform) -> Self {
        match platform {
            Platform::Bits64 => Self {
                key_offset: 16,
                value_offset: 32,
                size: 48,
            },
            Platform::Bits32 => Self {
                key_offset: 8,
                value_offset: 16,
                size: 24,
            },
        }
    }
}
