//! slot_arbiter_core
//!
//! Pure bookkeeping for relocating components among capacity-limited devices:
//! - request validation
//! - per-device slot ledger (free / shifting / occupied) and wait queues
//! - wait-graph resolution (rotations and vacate-then-fill chains)
//! - the lock-held transitions of a transfer (admit, prepared, performed)
//!
//! No threads, no blocking. Every transition returns the gates it opens; the
//! supervisor crate owns the lock, the gates and the caller callbacks.

pub mod cfg;
pub mod decide;
pub mod error;
pub mod key;
pub mod ledger;
pub mod request;
mod resolve;
pub mod state;
pub mod validate;

pub use cfg::ArbiterCfg;
pub use decide::{Admission, Decision, Signals};
pub use error::{ConfigError, TransferError};
pub use key::Key;
pub use ledger::{Claim, DeviceSlots};
pub use request::{TransferKind, TransferRequest};
pub use state::{ArbiterSnapshot, ArbiterState, DeviceSnapshot};
pub use validate::validate;
