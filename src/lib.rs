//! Asynchronous Common Subset (ACS).
//!
//! Given `n = 3f + 1` members, up to `f` of which may be byzantine, every
//! member proposes a contribution and ACS brings all correct members to agree
//! on the same subset of at least `n - f` contributions, without timing
//! assumptions.
//!
//! A round fans out into one reliable broadcast (RBC) and one binary
//! agreement (BBA) per member:
//!
//! - when RBC `j` completes, BBA `j` gets input one;
//! - once `n - f` broadcasts completed, every BBA without input gets zero;
//! - once every BBA decided, the output is the set of contributions whose
//!   BBA decided one.
//!
//! The sub-protocols are supplied through [`InstanceFactory`]; this crate
//! only wires them together.

mod acs;
mod batch;
mod bundle;
mod error;
mod fault;
mod instance;
mod lifecycle;
mod member;
mod round;
mod router;
mod state;

pub use crate::acs::Acs;
pub use crate::batch::{Batch, Binary, Contribution, Transaction};
pub use crate::bundle::{Bundle, BBA_MODULE, RBC_MODULE};
pub use crate::error::{Error, Result};
pub use crate::fault::Fault;
pub use crate::instance::{
    Agreement, AgreementEvent, AgreementOutput, Broadcast, BroadcastEvent, BroadcastOutput,
    InstanceFactory,
};
pub use crate::member::{Address, Member, Members};
pub use crate::round::{Config, Round};
