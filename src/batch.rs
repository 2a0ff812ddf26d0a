use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::Member;

/// An opaque transaction. Its encoding belongs to the layer above ACS.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Transaction(pub Vec<u8>);

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tx({})", hex::encode(&self.0))
    }
}

impl From<&[u8]> for Transaction {
    fn from(bytes: &[u8]) -> Self {
        Transaction(bytes.to_vec())
    }
}

/// The set of transactions one member proposes for a round.
pub type Contribution = BTreeSet<Transaction>;

/// The agreed output of a round: the contributions of every member whose
/// agreement decided one.
pub type Batch = BTreeMap<Member, Contribution>;

/// The decided (or input) value of a binary agreement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Binary {
    Zero,
    One,
}

impl From<bool> for Binary {
    fn from(b: bool) -> Self {
        if b {
            Binary::One
        } else {
            Binary::Zero
        }
    }
}

impl fmt::Display for Binary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binary::Zero => write!(f, "0"),
            Binary::One => write!(f, "1"),
        }
    }
}
