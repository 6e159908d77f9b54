//! # Log-Bridge Test Suite
//!
//! Unified test crate for cross-subsystem flows.
//!
//! ## Structure
//!
//! ```text
//! tests/src/integration/
//! ├── pipeline_flow.rs   # store -> detector -> bus/broker -> queue -> dispatcher
//! ├── delivery_flow.rs   # config-driven pacing and worker restarts
//! └── broker_flow.rs     # connection loss, reconnect, inbound hygiene
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p lb-tests
//! cargo test -p lb-tests integration::pipeline_flow
//! ```

#![allow(dead_code)]

pub mod integration;
