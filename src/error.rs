use thiserror::Error;

use crate::{Address, Fault, Member};

#[derive(Error, Debug)]
pub enum Error {
    #[error("We experienced an IO error")]
    IO(#[from] std::io::Error),
    #[error("Undefined request type: module `{0}` is neither rbc nor bba")]
    UndefinedRequestType(String),
    #[error("invalid message {0}")]
    InvalidMessage(String),
    #[error("{member:?} is not a member of this round (members: {members:?})")]
    UnknownMember {
        member: Member,
        members: Vec<Address>,
    },
    #[error("{0:?} is not a member of this round")]
    NotMember(Address),
    #[error("The operation requested assumes we have at least one member")]
    EmptyMembership,
    #[error("Address {0:?} appears more than once in the membership")]
    DuplicateMember(Address),
    #[error("This node already provided its contribution for the round")]
    DuplicateInput,
    #[error("Protocol violation: {0}")]
    Fault(Fault),
    #[error("The round was shut down before every agreement decided")]
    RoundIncomplete,
    #[error("The ACS actor loop has been closed")]
    Closed,
    #[error("Failed to encode with bincode")]
    Encoding(#[from] bincode::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
