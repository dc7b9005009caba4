#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core data structures for mini descriptors.
//!
//! - **Arena**: append-only bump allocator with fuseable lifetimes
//! - **Tables**: homogeneous `bytes → Value` and `uint → Value` hash maps
//! - **Lexer**: base-92 varints, escape sequences, bounded integer parsing

pub mod arena;
mod error;
pub mod hash;
mod invariants;
pub mod lex;
pub mod table;
pub mod utils;
mod value;


pub use arena::{Arena, Span};
pub use error::{ArenaError, EscapeError};
pub use table::{Cursor, IntTable, StrKey, StringTable};
pub use value::Value;
