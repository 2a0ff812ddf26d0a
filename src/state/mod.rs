use crate::{Batch, Binary, Contribution, Fault, Member, Members};

// Round transition
//
// +------------+       +------------+       +------------+
// | Collecting | ----> | Finalizing | ----> |    Done    |
// +------------+       +------------+       +------------+
//       \                    \
//        \--------------------\------------> Failed
//
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    // fewer than n - f broadcasts completed
    Collecting,
    // quorum reached (or every agreement decided), waiting for the remaining
    // decisions and for the values of agreed members
    Finalizing,
    Done,
    Failed,
}

/// The per-round bookkeeping of ACS. Owned by the actor loop only.
///
/// Every vector holds exactly one slot per member and is never resized.
#[derive(Debug)]
pub(crate) struct RoundState {
    quorum: usize,
    broadcast_result: Vec<Option<Contribution>>,
    agreement_result: Vec<Option<Binary>>,
    agreement_started: Vec<bool>,
    completed_broadcasts: usize,
    phase: Phase,
}

impl RoundState {
    pub fn new(members: &Members) -> Self {
        let n = members.len();
        Self {
            quorum: members.quorum(),
            broadcast_result: vec![None; n],
            agreement_result: vec![None; n],
            agreement_started: vec![false; n],
            completed_broadcasts: 0,
            phase: Phase::Collecting,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.phase, Phase::Done | Phase::Failed)
    }

    /// Records the decoded value of broadcast `index`.
    /// Returns false when a value was already recorded; the first one is kept.
    pub fn record_broadcast(&mut self, index: usize, contribution: Contribution) -> bool {
        let slot = &mut self.broadcast_result[index];
        if slot.is_some() {
            return false;
        }
        *slot = Some(contribution);
        self.completed_broadcasts += 1;
        true
    }

    pub fn broadcast_value(&self, index: usize) -> Option<&Contribution> {
        self.broadcast_result[index].as_ref()
    }

    pub fn completed_broadcasts(&self) -> usize {
        self.completed_broadcasts
    }

    pub fn quorum_reached(&self) -> bool {
        self.completed_broadcasts >= self.quorum
    }

    /// Marks agreement `index` as started.
    /// Returns false when it was already started, in which case no input may be sent.
    pub fn start_agreement(&mut self, index: usize) -> bool {
        !std::mem::replace(&mut self.agreement_started[index], true)
    }

    pub fn is_started(&self, index: usize) -> bool {
        self.agreement_started[index]
    }

    /// Agreements that have not been given an input yet.
    pub fn idle_agreements(&self) -> Vec<usize> {
        self.agreement_started
            .iter()
            .enumerate()
            .filter(|(_, started)| !**started)
            .map(|(i, _)| i)
            .collect()
    }

    /// Records the decision of agreement `member`.
    ///
    /// Returns `Ok(false)` for a repeat of the recorded decision and a fault
    /// for a conflicting one. The recorded decision is never replaced.
    pub fn record_agreement(
        &mut self,
        member: &Member,
        binary: Binary,
    ) -> Result<bool, Fault> {
        match self.agreement_result[member.index] {
            None => {
                self.agreement_result[member.index] = Some(binary);
                Ok(true)
            }
            Some(recorded) if recorded == binary => Ok(false),
            Some(recorded) => Err(Fault::ConflictingDecision {
                member: member.clone(),
                recorded,
                reported: binary,
            }),
        }
    }

    pub fn agreement_value(&self, index: usize) -> Option<Binary> {
        self.agreement_result[index]
    }

    pub fn all_decided(&self) -> bool {
        self.agreement_result.iter().all(Option::is_some)
    }

    /// Members whose agreement decided one.
    pub fn agreed(&self) -> Vec<usize> {
        self.agreement_result
            .iter()
            .enumerate()
            .filter(|(_, v)| **v == Some(Binary::One))
            .map(|(i, _)| i)
            .collect()
    }

    /// Agreed members whose broadcast has not completed locally yet.
    pub fn missing_values(&self) -> Vec<usize> {
        self.agreed()
            .into_iter()
            .filter(|i| self.broadcast_result[*i].is_none())
            .collect()
    }

    /// Moves the round forward as far as the recorded events allow.
    /// Returns the agreed batch on the transition to `Done`.
    pub fn advance(&mut self, members: &Members) -> Option<Batch> {
        if self.is_terminal() {
            return None;
        }

        if self.quorum_reached() || self.all_decided() {
            self.phase = Phase::Finalizing;
        }

        if !self.all_decided() || !self.missing_values().is_empty() {
            return None;
        }

        let mut batch = Batch::new();
        for index in self.agreed() {
            let contribution = self.broadcast_result[index].clone()?;
            let member = members.get(index)?.clone();
            batch.insert(member, contribution);
        }

        self.phase = Phase::Done;
        Some(batch)
    }

    pub fn fail(&mut self) {
        self.phase = Phase::Failed;
    }
}
