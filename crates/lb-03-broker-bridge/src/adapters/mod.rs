//! Transport adapters implementing [`crate::ports::outbound::BrokerTransport`].

pub mod memory;
pub mod tcp;
