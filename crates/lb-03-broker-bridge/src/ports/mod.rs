//! Port traits for the broker bridge.

pub mod outbound;
