//! Agora Node Implementation
//!
//! Hosts the ballot program over the configured state store:
//! - Memory or sled storage
//! - Serialized transaction execution
//! - HTTP API

mod api;
mod node;
mod runtime;

pub use api::*;
pub use node::*;
pub use runtime::*;
