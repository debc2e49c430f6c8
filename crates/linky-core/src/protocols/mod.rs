//! Protocol decoding modules.
//!
//! Each protocol follows a layered structure:
//! - `layout`: byte values and limits (source of truth)
//! - `reader`: text conventions and field splitting
//! - `parser`: domain-level decoding
//! - `error`: explicit, actionable errors
//!
//! Parsers are pure and contain no I/O; sources and the pipeline handle
//! byte acquisition, logging and fan-out.

pub mod tic;
