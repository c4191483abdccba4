//! slot_arbiter_supervisor
//!
//! Outside-world facing coordination layer for `slot_arbiter_core`.
//!
//! Responsibilities:
//! - own the arbiter state behind a single lock
//! - park each submitting thread on its own prepare/perform gates
//! - invoke the caller's data-movement callbacks with no lock held
//!
//! Non-goals:
//! - no async
//! - no scheduling policy (lives in core)
//! - no cancellation or timeouts

mod gate;
pub mod supervisor;
pub mod transfer;

pub use supervisor::{SlotSupervisor, SupervisorStats};
pub use transfer::{ComponentTransfer, FnTransfer};

pub use slot_arbiter_core::{ArbiterCfg, ArbiterSnapshot, ConfigError, DeviceSnapshot, TransferError, TransferRequest};
