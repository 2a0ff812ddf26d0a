use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::Address;

/// Names one ACS instance. A fresh `Acs` is built for every round.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub id: String, // the consensus instance, shared by every round it runs
    pub seq: u64,
}

impl Round {
    pub fn new(id: impl Into<String>, seq: u64) -> Self {
        Self { id: id.into(), seq }
    }

    /// The tag of the round that follows this one.
    pub fn next(&self) -> Self {
        Self::new(self.id.clone(), self.seq + 1)
    }
}

impl Display for Round {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]", self.id, self.seq)
    }
}

/// Everything needed to run one round on this node.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub round: Round,
    /// This node. Must appear in `members`.
    pub owner: Address,
    /// The ordered membership of the round. The position of an address is
    /// the index of its member.
    pub members: Vec<Address>,
}

impl Config {
    pub fn new(round: Round, owner: Address, members: Vec<Address>) -> Self {
        Self {
            round,
            owner,
            members,
        }
    }

    /// The configuration of the next round with the same membership.
    pub fn next_round(&self) -> Self {
        Self {
            round: self.round.next(),
            ..self.clone()
        }
    }
}
