//! Port traits for the delivery queue.

pub mod outbound;
