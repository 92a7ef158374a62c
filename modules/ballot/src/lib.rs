//! Ballot program for Agora
//!
//! Implements on-ledger voting with:
//! - Voting sessions owned by a chairperson
//! - Sequentially indexed proposals at derived addresses
//! - One vote per voter and proposal, enforced by guard records
//! - Tally with lowest-index tie-break

pub mod address;
pub mod records;
pub mod instruction;
pub mod transaction;
pub mod validator;
pub mod context;
pub mod session;
pub mod vote;
pub mod tally;
pub mod processor;
pub mod ledger;

pub use address::*;
pub use records::*;
pub use instruction::*;
pub use transaction::*;
pub use validator::*;
pub use context::*;
pub use processor::*;
pub use ledger::*;
