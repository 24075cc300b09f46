//! EdgeMind Core
//!
//! Orchestration layer for on-device inference: decodes untrusted image
//! payloads, caches model artifacts fetched over HTTP, manages the lifecycle
//! of a reusable text-generation session, and exposes the whole surface as
//! uniform async operations. The inference engines themselves are external
//! capabilities; see `edgemind-kernel` for the traits they implement.

// artifacts module - model artifact cache
pub mod artifacts;
pub use artifacts::*;

// classifier module - label detector adapter
pub mod classifier;
pub use classifier::*;

// config module
pub mod config;
pub use config::*;

// orchestrator module - host-facing operations
pub mod orchestrator;
pub use orchestrator::*;

// session module - generation session lifecycle
pub mod session;
pub use session::*;

// vision module - base64 image decoding
pub mod vision;

// Contract layer re-export so hosts depend on one crate
pub use edgemind_kernel as kernel;
