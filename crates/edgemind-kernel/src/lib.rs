//! EdgeMind Kernel
//!
//! Contract layer for the on-device inference core: capability traits the
//! engines implement, wire types for the host boundary, and the error
//! taxonomy with stable codes. Implementations live in `edgemind-core`.

// capability module
pub mod capability;
pub use capability::*;

// error module
pub mod error;

// types module
pub mod types;
pub use types::*;
