//! Core types for lushsync.
//!
//! This crate holds everything that doesn't need a browser or a network:
//! - `WorkShift` and shift-text parsing
//! - month-view markup parsing into a keyed `Schedule`
//! - the calendar-event slice and reconciliation against it
//! - the shared error types

pub mod error;
pub mod event;
pub mod reconcile;
pub mod schedule;
pub mod shift;

pub use error::{ShiftParseError, SyncError, SyncResult};
pub use event::CalendarEvent;
pub use reconcile::{reconcile, ReconcilePlan};
pub use schedule::{parse_month, Schedule};
pub use shift::{parse_time_range, WorkShift};
