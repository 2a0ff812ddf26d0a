//! The seams between ACS and its sub-protocols.
//!
//! ACS runs one reliable broadcast and one binary agreement per member. It
//! never looks inside them: it feeds them messages, gives the agreements
//! their single input, and listens for their single output.

use crossbeam_channel::Sender;

use crate::{Binary, Contribution, Member, Result};

/// A reliable broadcast instance for one proposer.
pub trait Broadcast: Send + 'static {
    /// Starts broadcasting our own contribution. Only called on the
    /// instance whose proposer is this node.
    fn propose(&mut self, contribution: &Contribution) -> Result<()>;

    fn handle_message(&mut self, sender: &Member, payload: &[u8]) -> Result<()>;
}

/// A binary byzantine agreement instance for one proposer.
pub trait Agreement: Send + 'static {
    /// Called at most once per instance.
    fn provide_input(&mut self, input: Binary) -> Result<()>;

    fn handle_message(&mut self, sender: &Member, payload: &[u8]) -> Result<()>;
}

/// Builds the sub-protocol instances of one round.
pub trait InstanceFactory {
    type Broadcast: Broadcast;
    type Agreement: Agreement;

    fn broadcast(&mut self, proposer: &Member, output: BroadcastOutput) -> Self::Broadcast;

    fn agreement(&mut self, proposer: &Member, output: AgreementOutput) -> Self::Agreement;
}

/// The decoded value of a completed broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastEvent {
    pub member: Member,
    pub contribution: Contribution,
}

/// The decision of an agreement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgreementEvent {
    pub member: Member,
    pub binary: Binary,
}

/// Single-use handle through which a broadcast instance reports completion.
#[derive(Debug)]
pub struct BroadcastOutput {
    member: Member,
    sender: Sender<BroadcastEvent>,
}

impl BroadcastOutput {
    pub(crate) fn new(member: Member, sender: Sender<BroadcastEvent>) -> Self {
        Self { member, sender }
    }

    pub fn member(&self) -> &Member {
        &self.member
    }

    pub fn deliver(self, contribution: Contribution) {
        let event = BroadcastEvent {
            member: self.member,
            contribution,
        };
        if self.sender.send(event).is_err() {
            log::debug!("broadcast output dropped, the round is closed");
        }
    }
}

/// Single-use handle through which an agreement instance reports its decision.
#[derive(Debug)]
pub struct AgreementOutput {
    member: Member,
    sender: Sender<AgreementEvent>,
}

impl AgreementOutput {
    pub(crate) fn new(member: Member, sender: Sender<AgreementEvent>) -> Self {
        Self { member, sender }
    }

    pub fn member(&self) -> &Member {
        &self.member
    }

    pub fn deliver(self, binary: Binary) {
        let event = AgreementEvent {
            member: self.member,
            binary,
        };
        if self.sender.send(event).is_err() {
            log::debug!("agreement output dropped, the round is closed");
        }
    }
}
