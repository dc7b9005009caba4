//! Append-only bump arena with fuseable lifetimes.
//!
//! Allocations are addressed by [`Span`] handles (block, offset, length)
//! instead of raw pointers. Offsets are 8-byte aligned within their block, and
//! the bytes behind a span never move while the arena is alive.
//!
//! Fusing joins two arenas into one lifetime group. When a fused arena is
//! dropped its blocks are handed to the group root, so memory is released only
//! once the last member of the group is gone.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::ArenaError;

/// Alignment of every allocation offset.
pub const ALIGN: usize = 8;

const FIRST_BLOCK_SIZE: usize = 256;
const MAX_BLOCK_SIZE: usize = 32 * 1024;

#[inline]
fn align_up(n: usize) -> Option<usize> {
    n.checked_add(ALIGN - 1).map(|v| v & !(ALIGN - 1))
}

/// Handle to a byte range allocated from an [`Arena`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Span {
    block: u32,
    offset: u32,
    len: u32,
}

impl Span {
    /// The zero-size allocation. Valid for every arena, never backed by memory.
    pub const EMPTY: Span = Span {
        block: u32::MAX,
        offset: 0,
        len: 0,
    };

    #[inline]
    pub fn len(self) -> usize {
        self.len as usize
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn block(self) -> u32 {
        self.block
    }

    #[inline]
    pub fn offset(self) -> u32 {
        self.offset
    }

    /// Sub-range `start..start + len`, relative to this span.
    ///
    /// # Panics
    /// Panics if the range does not fit inside the span.
    pub fn slice(self, start: usize, len: usize) -> Span {
        assert!(start + len <= self.len(), "Span::slice out of bounds");
        if len == 0 {
            return Span::EMPTY;
        }
        Span {
            block: self.block,
            offset: self.offset + start as u32,
            len: len as u32,
        }
    }

    pub(crate) fn from_parts(block: u32, offset: u32, len: u32) -> Self {
        Self { block, offset, len }
    }
}

struct Block {
    data: Box<[u8]>,
    used: usize,
}

impl Block {
    fn new(size: usize) -> Self {
        Self {
            data: vec![0u8; size].into_boxed_slice(),
            used: 0,
        }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.used
    }
}

/// One node of the fuse forest. Only the root carries live accounting.
#[derive(Default)]
struct FuseNode {
    parent: Option<Rc<RefCell<FuseNode>>>,
    retained: Vec<Block>,
    space: usize,
}

fn root_of(node: &Rc<RefCell<FuseNode>>) -> Rc<RefCell<FuseNode>> {
    let mut cur = Rc::clone(node);
    loop {
        let parent = cur.borrow().parent.clone();
        match parent {
            Some(p) => cur = p,
            None => return cur,
        }
    }
}

/// Append-only allocator.
///
/// Not `Send`: an arena has exactly one logical writer.
pub struct Arena {
    blocks: Vec<Block>,
    fixed: bool,
    last: Option<Span>,
    group: Rc<RefCell<FuseNode>>,
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("blocks", &self.blocks.len())
            .field("fixed", &self.fixed)
            .field("space_allocated", &self.space_allocated())
            .finish()
    }
}

impl Arena {
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            fixed: false,
            last: None,
            group: Rc::new(RefCell::new(FuseNode::default())),
        }
    }

    /// Arena limited to a caller-supplied buffer. It never grows and cannot be fused.
    pub fn with_fixed_buffer(buf: Vec<u8>) -> Self {
        let space = buf.len();
        let block = Block {
            data: buf.into_boxed_slice(),
            used: 0,
        };
        Self {
            blocks: vec![block],
            fixed: true,
            last: None,
            group: Rc::new(RefCell::new(FuseNode {
                space,
                ..FuseNode::default()
            })),
        }
    }

    pub fn has_fixed_buffer(&self) -> bool {
        self.fixed
    }

    /// Allocate `len` zeroed bytes.
    pub fn alloc(&mut self, len: usize) -> Result<Span, ArenaError> {
        if len == 0 {
            return Ok(Span::EMPTY);
        }
        let len32 = u32::try_from(len).map_err(|_| ArenaError::TooLarge(len))?;
        let size = align_up(len).ok_or(ArenaError::TooLarge(len))?;

        if let Some(span) = self.bump(size, len32) {
            return Ok(span);
        }
        if self.fixed {
            return Err(ArenaError::OutOfMemory {
                requested: len,
                remaining: self.remaining(),
            });
        }
        self.push_block(size);
        self.bump(size, len32).ok_or(ArenaError::OutOfMemory {
            requested: len,
            remaining: self.remaining(),
        })
    }

    /// Allocate a copy of `bytes`.
    pub fn alloc_copy(&mut self, bytes: &[u8]) -> Result<Span, ArenaError> {
        let span = self.alloc(bytes.len())?;
        self.bytes_mut(span).copy_from_slice(bytes);
        Ok(span)
    }

    /// Resize an allocation.
    ///
    /// Grows in place when `span` is the most recent allocation and the block
    /// has room; otherwise allocates fresh memory and copies the old contents.
    pub fn realloc(&mut self, span: Span, new_len: usize) -> Result<Span, ArenaError> {
        if span.is_empty() {
            return self.alloc(new_len);
        }
        let old_len = span.len();
        if new_len <= old_len {
            return Ok(self.shrink_last(span, new_len));
        }

        if self.last == Some(span) {
            let new_size = align_up(new_len).ok_or(ArenaError::TooLarge(new_len))?;
            let new_len32 = u32::try_from(new_len).map_err(|_| ArenaError::TooLarge(new_len))?;
            let block = &mut self.blocks[span.block as usize];
            let start = span.offset as usize;
            if start + new_size <= block.data.len() {
                block.used = start + new_size;
                let grown = Span {
                    len: new_len32,
                    ..span
                };
                self.last = Some(grown);
                return Ok(grown);
            }
        }

        let fresh = self.alloc(new_len)?;
        self.copy_span(span, fresh);
        Ok(fresh)
    }

    /// Shrink the most recent allocation. Never copies.
    ///
    /// For any other span only the handle shrinks; the tail stays dead.
    pub fn shrink_last(&mut self, span: Span, new_len: usize) -> Span {
        debug_assert!(new_len <= span.len());
        let is_last = self.last == Some(span);
        if new_len == 0 {
            if is_last {
                self.blocks[span.block as usize].used = span.offset as usize;
                self.last = None;
            }
            return Span::EMPTY;
        }

        let shrunk = Span {
            len: new_len as u32,
            ..span
        };
        if is_last {
            let end = span.offset as usize + new_len.next_multiple_of(ALIGN);
            self.blocks[span.block as usize].used = end;
            self.last = Some(shrunk);
        }
        shrunk
    }

    /// Bytes behind `span`.
    ///
    /// # Panics
    /// Panics if the span was not allocated by this arena.
    pub fn bytes(&self, span: Span) -> &[u8] {
        if span.is_empty() {
            return &[];
        }
        let start = span.offset as usize;
        &self.blocks[span.block as usize].data[start..start + span.len()]
    }

    /// Mutable bytes behind `span`.
    pub fn bytes_mut(&mut self, span: Span) -> &mut [u8] {
        if span.is_empty() {
            return &mut [];
        }
        let start = span.offset as usize;
        &mut self.blocks[span.block as usize].data[start..start + span.len()]
    }

    /// Join the lifetimes of `self` and `other`.
    ///
    /// Returns `false` when either side owns a fixed buffer.
    pub fn fuse(&self, other: &Arena) -> bool {
        if self.fixed || other.fixed {
            return false;
        }
        let a = root_of(&self.group);
        let b = root_of(&other.group);
        if Rc::ptr_eq(&a, &b) {
            return true;
        }

        let (mut blocks, space) = {
            let mut node = b.borrow_mut();
            node.parent = Some(Rc::clone(&a));
            (
                std::mem::take(&mut node.retained),
                std::mem::take(&mut node.space),
            )
        };
        let mut root = a.borrow_mut();
        root.retained.append(&mut blocks);
        root.space += space;
        true
    }

    pub fn is_fused_with(&self, other: &Arena) -> bool {
        Rc::ptr_eq(&root_of(&self.group), &root_of(&other.group))
    }

    /// Bytes reserved by every arena in this fuse group.
    pub fn space_allocated(&self) -> usize {
        root_of(&self.group).borrow().space
    }

    fn remaining(&self) -> usize {
        self.blocks.last().map_or(0, Block::remaining)
    }

    fn bump(&mut self, size: usize, len: u32) -> Option<Span> {
        let index = self.blocks.len().checked_sub(1)?;
        let block = &mut self.blocks[index];
        if block.remaining() < size {
            return None;
        }
        let span = Span {
            block: index as u32,
            offset: block.used as u32,
            len,
        };
        block.used += size;
        self.last = Some(span);
        Some(span)
    }

    fn push_block(&mut self, min_size: usize) {
        let next = self
            .blocks
            .last()
            .map_or(FIRST_BLOCK_SIZE, |b| (b.data.len() * 2).min(MAX_BLOCK_SIZE));
        let size = next.max(min_size);
        root_of(&self.group).borrow_mut().space += size;
        self.blocks.push(Block::new(size));
    }

    fn copy_span(&mut self, from: Span, to: Span) {
        let (fb, tb) = (from.block as usize, to.block as usize);
        let src = from.offset as usize..from.offset as usize + from.len();
        let dst = to.offset as usize;
        let n = from.len();
        if fb == tb {
            self.blocks[fb].data.copy_within(src, dst);
        } else if fb < tb {
            let (head, tail) = self.blocks.split_at_mut(tb);
            tail[0].data[dst..dst + n].copy_from_slice(&head[fb].data[src]);
        } else {
            let (head, tail) = self.blocks.split_at_mut(fb);
            head[tb].data[dst..dst + n].copy_from_slice(&tail[0].data[src]);
        }
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        let blocks = std::mem::take(&mut self.blocks);
        if blocks.is_empty() {
            return;
        }
        root_of(&self.group).borrow_mut().retained.extend(blocks);
    }
}
