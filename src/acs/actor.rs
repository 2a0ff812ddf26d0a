use crossbeam_channel::{never, select, Receiver, Sender};
use log::{debug, error, info, warn};
use std::sync::{Arc, OnceLock};

use crate::instance::{AgreementEvent, BroadcastEvent};
use crate::router::{self, Route};
use crate::state::RoundState;
use crate::{
    Agreement, Batch, Binary, Broadcast, Bundle, Contribution, Error, Fault, Member, Members,
    Result, Round,
};

pub(crate) type Outcome = std::result::Result<Batch, Fault>;

/// A call from the `Acs` handle. Every request gets exactly one reply.
pub(crate) enum Request {
    Message {
        sender: Member,
        bundle: Bundle,
        reply: Sender<Result<()>>,
    },
    Input {
        contribution: Contribution,
        reply: Sender<Result<()>>,
    },
}

impl Request {
    fn reply(self, res: Result<()>) {
        let reply = match self {
            Request::Message { reply, .. } | Request::Input { reply, .. } => reply,
        };
        // the caller may have given up waiting, nothing to do then
        let _ = reply.send(res);
    }
}

enum Event {
    Close(Option<Sender<()>>),
    Request(Option<Request>),
    Broadcast(Option<BroadcastEvent>),
    Agreement(Option<AgreementEvent>),
}

/// The channels the actor loop services.
pub(crate) struct Inbox {
    pub requests: Receiver<Request>,
    pub broadcast_events: Receiver<BroadcastEvent>,
    pub agreement_events: Receiver<AgreementEvent>,
    pub close: Receiver<Sender<()>>,
}

/// Owns the round: the sub-instances, the round state and the outcome slot.
/// Nothing else reads or writes them.
pub(crate) struct Actor<B: Broadcast, A: Agreement> {
    owner: Member,
    round: Round,
    members: Members,
    broadcasts: Vec<B>,
    agreements: Vec<A>,
    state: RoundState,
    proposed: bool,
    inbox: Inbox,
    outcome: Arc<OnceLock<Outcome>>,
    // dropped once the outcome is set, which wakes every waiter
    done: Option<Sender<()>>,
}

impl<B: Broadcast, A: Agreement> Actor<B, A> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        owner: Member,
        round: Round,
        members: Members,
        broadcasts: Vec<B>,
        agreements: Vec<A>,
        inbox: Inbox,
        outcome: Arc<OnceLock<Outcome>>,
        done: Sender<()>,
    ) -> Self {
        debug_assert_eq!(broadcasts.len(), members.len());
        debug_assert_eq!(agreements.len(), members.len());

        let state = RoundState::new(&members);
        Self {
            owner,
            round,
            members,
            broadcasts,
            agreements,
            state,
            proposed: false,
            inbox,
            outcome,
            done: Some(done),
        }
    }

    pub fn run(mut self) {
        info!("[ACS-{}] round {} started", self.id(), self.round);

        loop {
            let event = select! {
                recv(self.inbox.close) -> ack => Event::Close(ack.ok()),
                recv(self.inbox.requests) -> req => Event::Request(req.ok()),
                recv(self.inbox.broadcast_events) -> out => Event::Broadcast(out.ok()),
                recv(self.inbox.agreement_events) -> out => Event::Agreement(out.ok()),
            };

            match event {
                Event::Close(ack) => {
                    self.drain_requests();
                    if let Some(ack) = ack {
                        let _ = ack.send(());
                    }
                    break;
                }
                Event::Request(Some(req)) => self.handle_request(req),
                // the handle is gone
                Event::Request(None) => break,
                Event::Broadcast(Some(out)) => self.handle_broadcast_output(out),
                // every broadcast instance delivered or was dropped
                Event::Broadcast(None) => self.inbox.broadcast_events = never(),
                Event::Agreement(Some(out)) => self.try_complete_agreement(out),
                Event::Agreement(None) => self.inbox.agreement_events = never(),
            }
        }

        info!(
            "[ACS-{}] round {} stopped in phase {:?}",
            self.id(),
            self.round,
            self.state.phase()
        );
    }

    fn id(&self) -> usize {
        self.owner.index
    }

    fn handle_request(&mut self, req: Request) {
        let res = match &req {
            Request::Message { sender, bundle, .. } => self.mux_message(sender, bundle),
            Request::Input { contribution, .. } => self.handle_input(contribution),
        };
        if let Err(err) = &res {
            debug!("[ACS-{}] request rejected: {err}", self.id());
        }
        req.reply(res);
    }

    // Requests still queued when we are asked to stop are answered, not dropped.
    fn drain_requests(&mut self) {
        while let Ok(req) = self.inbox.requests.try_recv() {
            req.reply(Err(Error::Closed));
        }
    }

    fn mux_message(&mut self, sender: &Member, bundle: &Bundle) -> Result<()> {
        let route = router::route(&self.members, &self.round, sender, bundle)?;
        debug!(
            "[ACS-{}] routing {} message from {sender} to {route:?}",
            self.id(),
            bundle.module
        );

        match route {
            Route::Broadcast(index) => {
                self.broadcasts[index].handle_message(sender, &bundle.payload)
            }
            Route::Agreement(index) => {
                self.agreements[index].handle_message(sender, &bundle.payload)
            }
        }
    }

    fn handle_input(&mut self, contribution: &Contribution) -> Result<()> {
        if self.proposed {
            return Err(Error::DuplicateInput);
        }

        info!(
            "[ACS-{}] proposing {} transactions",
            self.id(),
            contribution.len()
        );
        self.broadcasts[self.owner.index].propose(contribution)?;
        self.proposed = true;
        Ok(())
    }

    // A completed broadcast is the only way an agreement gets a one.
    fn handle_broadcast_output(&mut self, event: BroadcastEvent) {
        let index = match self.members.index_of(&event.member) {
            Ok(index) => index,
            Err(err) => {
                warn!("[ACS-{}] dropping broadcast output: {err}", self.id());
                return;
            }
        };

        if !self.state.record_broadcast(index, event.contribution) {
            warn!(
                "[ACS-{}] broadcast of {} completed twice, keeping the first value",
                self.id(),
                event.member
            );
            return;
        }
        debug!(
            "[ACS-{}] broadcast of {} completed ({}/{})",
            self.id(),
            event.member,
            self.state.completed_broadcasts(),
            self.members.len()
        );

        if self.state.start_agreement(index) {
            self.provide_input(index, Binary::One);
        }

        if self.state.quorum_reached() {
            self.send_zero_to_idle_agreements();
        }

        self.try_finish_round();
    }

    // Once n - f broadcasts completed, every agreement that has no input yet
    // gets a zero so that it terminates even if its broadcast never does.
    fn send_zero_to_idle_agreements(&mut self) {
        for index in self.state.idle_agreements() {
            if self.state.start_agreement(index) {
                info!(
                    "[ACS-{}] quorum reached, injecting zero into agreement of {}",
                    self.id(),
                    self.member(index)
                );
                self.provide_input(index, Binary::Zero);
            }
        }
    }

    fn provide_input(&mut self, index: usize, input: Binary) {
        debug!(
            "[ACS-{}] agreement of {} started with {input}",
            self.id(),
            self.member(index)
        );
        if let Err(err) = self.agreements[index].provide_input(input) {
            warn!(
                "[ACS-{}] agreement of {} rejected input {input}: {err}",
                self.id(),
                self.member(index)
            );
        }
    }

    fn try_complete_agreement(&mut self, event: AgreementEvent) {
        if let Err(err) = self.members.index_of(&event.member) {
            warn!("[ACS-{}] dropping agreement output: {err}", self.id());
            return;
        }

        match self.state.record_agreement(&event.member, event.binary) {
            Ok(true) => debug!(
                "[ACS-{}] agreement of {} decided {}",
                self.id(),
                event.member,
                event.binary
            ),
            Ok(false) => {
                debug!(
                    "[ACS-{}] agreement of {} repeated its decision",
                    self.id(),
                    event.member
                );
                return;
            }
            Err(fault) => {
                error!("[ACS-{}] {fault}", self.id());
                if !self.state.is_terminal() {
                    self.state.fail();
                    self.finish(Err(fault));
                }
                return;
            }
        }

        self.try_finish_round();
    }

    fn try_finish_round(&mut self) {
        if let Some(batch) = self.state.advance(&self.members) {
            info!(
                "[ACS-{}] round {} done, agreed on {} of {} contributions",
                self.id(),
                self.round,
                batch.len(),
                self.members.len()
            );
            self.finish(Ok(batch));
        } else if self.state.all_decided() && !self.state.is_terminal() {
            debug!(
                "[ACS-{}] every agreement decided, waiting for broadcasts {:?}",
                self.id(),
                self.state.missing_values()
            );
        }
    }

    fn finish(&mut self, outcome: Outcome) {
        if self.outcome.set(outcome).is_err() {
            warn!("[ACS-{}] round outcome was already set", self.id());
        }
        self.done.take();
    }

    fn member(&self, index: usize) -> &Member {
        &self.members[index]
    }
}
