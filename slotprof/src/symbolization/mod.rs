//! # Frame Name Resolution
//!
//! Samples carry only opaque [`FrameId`](crate::domain::FrameId)s. Names are
//! needed twice: by the filter while a sample is taken (carried on each
//! [`Frame`](crate::backtrace::Frame)) and by reports and export after the
//! fact. The [`SymbolTable`] serves the second case.
//!
//! ```text
//! host code ──► SymbolTable::frame("app::serve") ──► Frame { id: #3, name }
//!                                                        │
//!                                 CallStack::enter() ◄───┘
//!
//! LogSnapshot { [#3, #1] } ──► SymbolTable::resolve() ──► "app::serve"
//! ```
//!
//! Ids are dense and start at 1, so a table built by one run resolves the
//! snapshots of that run only.

pub mod symbol_table;

pub use symbol_table::{SymbolTable, UNKNOWN_FRAME};
