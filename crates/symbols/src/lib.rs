//! Definition lookups over a prebuilt symbol index.
//!
//! The index is a JSON file produced by an external parser:
//!
//! ```json
//! {
//!   "procs": [{ "name": "Initialize", "parent": "/atom", "path": "code/game/atoms.dm", "line": 120 }],
//!   "vars":  [{ "name": "health", "parent": "/mob", "path": "code/modules/mob/mob.dm", "line": 7 }]
//! }
//! ```

pub mod error;
pub mod index;

pub use {
    error::{Error, Result},
    index::{FileSymbolIndex, SymbolEntry, SymbolKind},
};
