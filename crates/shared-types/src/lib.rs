//! # Shared Types Crate
//!
//! Contains the domain entities and error taxonomy shared across the bridge
//! subsystems.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-subsystem types are defined here.
//! - **Normalized Events**: A raw [`LogRecord`] from the store is turned into
//!   exactly one [`ChatEvent`] by the change detector; downstream consumers
//!   never see raw rows.
//! - **Tagged Actions**: Outbound effects are a closed [`Action`] enum
//!   with a logging identity, not opaque closures.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
