//! Domain layer: connection options and the routing table.

pub mod options;
pub mod routes;
