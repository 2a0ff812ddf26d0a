use serde::{Deserialize, Serialize};

use crate::{Member, Result, Round};

/// Module name of reliable broadcast messages.
pub const RBC_MODULE: &str = "rbc";
/// Module name of binary agreement messages.
pub const BBA_MODULE: &str = "bba";

/// Bundle is a wrapper around a sub-protocol message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bundle {
    /// The round this message belongs to.
    pub round: Round,
    /// The destination module, `rbc` or `bba`. Anything else is rejected.
    pub module: String,
    /// The member whose instance the message is for. When `None` the
    /// instance of the sending member is addressed.
    pub proposer: Option<Member>,
    /// The encoded sub-protocol message, opaque to ACS.
    pub payload: Vec<u8>,
}

impl Bundle {
    pub fn rbc(round: Round, proposer: Option<Member>, payload: Vec<u8>) -> Self {
        Self {
            round,
            module: RBC_MODULE.to_string(),
            proposer,
            payload,
        }
    }

    pub fn bba(round: Round, proposer: Option<Member>, payload: Vec<u8>) -> Self {
        Self {
            round,
            module: BBA_MODULE.to_string(),
            proposer,
            payload,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}
