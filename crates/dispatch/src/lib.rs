//! Message interpretation and dispatch.
//!
//! One chat line becomes either exactly one explicit command (when it starts
//! with the configured prefix) or a bounded, left-to-right scan for embedded
//! references (issue numbers, bracketed file paths, commit hashes).

pub mod command;
pub mod error;
pub mod handlers;
pub mod reference;
pub mod router;

pub use {
    command::{Command, CommandContext, CommandTable, CommandTableBuilder, Services},
    error::{Error, Result},
    handlers::builtin_commands,
    reference::{ReferenceMatch, classify},
    router::{IncomingLine, MessageRouter, Outcome, RouterConfig},
};
