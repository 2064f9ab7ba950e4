//! Domain model for daily satisfaction journaling.
//!
//! # Responsibility
//! - Define the satisfaction scale and the memo codec every caller shares.
//! - Define record/user shapes and their write-side validation.
//!
//! # Invariants
//! - `memo` and `satisfaction` are pure: no I/O, no shared state.
//! - Stored memos are only ever interpreted through `memo::decode`.

pub mod listing;
pub mod memo;
pub mod record;
pub mod satisfaction;
pub mod session;
pub mod user;
