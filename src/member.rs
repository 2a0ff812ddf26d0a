use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::{Error, Result};

/// Network address of a participating node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(pub String);

impl From<&str> for Address {
    fn from(addr: &str) -> Self {
        Address(addr.to_string())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A participating node: its address and the ordinal the roster assigned it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Member {
    pub index: usize,
    pub address: Address,
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.address, self.index)
    }
}

/// The fixed membership of one round.
///
/// Indices are assigned in the order the addresses were given and every
/// per-member arena in the crate is addressed through `index_of`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Members {
    members: Vec<Member>,
}

impl Members {
    pub fn new(addresses: impl IntoIterator<Item = Address>) -> Result<Self> {
        let mut seen = BTreeSet::new();
        let mut members = Vec::new();
        for address in addresses {
            if !seen.insert(address.clone()) {
                return Err(Error::DuplicateMember(address));
            }
            members.push(Member {
                index: members.len(),
                address,
            });
        }

        if members.is_empty() {
            return Err(Error::EmptyMembership);
        }

        Ok(Self { members })
    }

    // n
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// The number of byzantine members tolerated: the largest `f` with `n >= 3f + 1`.
    pub fn faults(&self) -> usize {
        self.len().saturating_sub(1) / 3
    }

    /// `n - f`
    pub fn quorum(&self) -> usize {
        self.len() - self.faults()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Member> {
        self.members.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Member> {
        self.members.get(index)
    }

    pub fn by_address(&self, address: &Address) -> Option<&Member> {
        self.members.iter().find(|m| &m.address == address)
    }

    /// Validates `member` against the roster and returns its arena slot.
    pub fn index_of(&self, member: &Member) -> Result<usize> {
        match self.members.get(member.index) {
            Some(known) if known == member => Ok(member.index),
            _ => Err(self.unknown(member)),
        }
    }

    fn unknown(&self, member: &Member) -> Error {
        Error::UnknownMember {
            member: member.clone(),
            members: self.members.iter().map(|m| m.address.clone()).collect(),
        }
    }
}

impl std::ops::Index<usize> for Members {
    type Output = Member;

    fn index(&self, index: usize) -> &Member {
        &self.members[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster(n: usize) -> Members {
        Members::new((0..n).map(|i| Address(format!("10.0.0.{i}:7000")))).unwrap()
    }

    #[test]
    fn test_quorum_sizes() {
        let cases = [(1, 0, 1), (3, 0, 3), (4, 1, 3), (6, 1, 5), (7, 2, 5), (10, 3, 7)];
        for (n, f, q) in cases {
            let members = roster(n);
            assert_eq!(members.faults(), f, "n = {n}");
            assert_eq!(members.quorum(), q, "n = {n}");
        }
    }

    #[test]
    fn test_reject_empty_and_duplicated_roster() {
        assert!(matches!(
            Members::new(Vec::<Address>::new()),
            Err(Error::EmptyMembership)
        ));
        assert!(matches!(
            Members::new(vec![Address::from("a"), Address::from("b"), Address::from("a")]),
            Err(Error::DuplicateMember(addr)) if addr == Address::from("a")
        ));
    }

    #[test]
    fn test_index_of_rejects_mismatched_slot() {
        let members = roster(4);
        let b = members.get(1).unwrap().clone();
        assert_eq!(members.index_of(&b).unwrap(), 1);

        let mut forged = b.clone();
        forged.index = 2;
        assert!(matches!(
            members.index_of(&forged),
            Err(Error::UnknownMember { .. })
        ));

        let outsider = Member {
            index: 7,
            address: Address::from("10.0.0.7:7000"),
        };
        assert!(matches!(
            members.index_of(&outsider),
            Err(Error::UnknownMember { .. })
        ));
    }
}
