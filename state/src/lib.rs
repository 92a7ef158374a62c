//! Agora State Management
//!
//! Provides transactional key-value storage, versioning, and state root computation.
//! Uses a key-value model where state = { key → value }; a batch of changes is
//! applied all-or-nothing, and `StateChange::Create` only succeeds on a vacant key.

pub mod store;
pub mod memory;
pub mod persistent;

pub use store::*;
pub use memory::*;
pub use persistent::*;
