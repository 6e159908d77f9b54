//! Publisher and subscriber roles over a broker transport.

pub mod publisher;
pub mod subscriber;
