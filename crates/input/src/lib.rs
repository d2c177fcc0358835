//! Input: tick-resolution key event history and raw mouse movement.
//!
//! # Invariants
//! - Within one scancode's history at most the last event is still open.
//! - A completed event stays complete.
//! - Only `record_press`, `record_release`, `release_all` and `prune` mutate
//!   the ledger; everything else reads it.

pub mod bindings;
pub mod event;
pub mod ledger;
pub mod mouse;
pub mod tick;

pub use bindings::{KeyBindings, keys};
pub use event::KeyEvent;
pub use ledger::{KeyLedger, LedgerError};
pub use mouse::{MouseAxes, MouseDelta};
pub use tick::TickInput;
