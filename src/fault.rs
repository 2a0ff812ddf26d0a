use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Binary, Member};

/// A local invariant broken by one of the sub-instances.
///
/// Faults are fatal for the round they are detected in. They are recorded as
/// the round outcome and never replaced by later events.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Fault {
    ConflictingDecision {
        member: Member,
        recorded: Binary,
        reported: Binary,
    },
}

impl Fault {
    pub fn member_at_fault(&self) -> &Member {
        match self {
            Fault::ConflictingDecision { member, .. } => member,
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::ConflictingDecision {
                member,
                recorded,
                reported,
            } => write!(
                f,
                "agreement for {member} decided {reported} after deciding {recorded}"
            ),
        }
    }
}
