//! Domain layer: inbound command normalization and outbound text handling.

pub mod command;
pub mod text;
