mod actor;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use log::{info, warn};
use std::sync::{Arc, Mutex, OnceLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use self::actor::{Actor, Inbox, Outcome, Request};
use crate::instance::{AgreementOutput, BroadcastOutput};
use crate::lifecycle::Lifecycle;
use crate::{
    Batch, Bundle, Config, Contribution, Error, InstanceFactory, Member, Members, Result, Round,
};

/// Asynchronous Common Subset for one round.
///
/// Every member reliably broadcasts its contribution and one binary agreement
/// per member decides whether that contribution is part of the output. All
/// round state lives on a dedicated actor thread; this handle only submits
/// requests to it and waits for the outcome, so it can be shared between
/// threads.
///
/// A round is run by exactly one `Acs`. Build a new one (for instance from
/// `Config::next_round`) for the next round.
pub struct Acs {
    owner: Member,
    round: Round,
    members: Members,
    requests: Sender<Request>,
    close: Sender<Sender<()>>,
    done: Receiver<()>,
    outcome: Arc<OnceLock<Outcome>>,
    lifecycle: Lifecycle,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl Acs {
    /// Builds the sub-instances of every member and starts the actor loop.
    pub fn new<F: InstanceFactory>(config: Config, mut factory: F) -> Result<Self> {
        let members = Members::new(config.members)?;
        let owner = members
            .by_address(&config.owner)
            .cloned()
            .ok_or(Error::NotMember(config.owner))?;

        // Each instance delivers at most once, so `n` slots never fill up
        // and delivering from inside the actor loop cannot block it.
        let (broadcast_tx, broadcast_events) = bounded(members.len());
        let (agreement_tx, agreement_events) = bounded(members.len());

        let broadcasts: Vec<F::Broadcast> = members
            .iter()
            .map(|m| factory.broadcast(m, BroadcastOutput::new(m.clone(), broadcast_tx.clone())))
            .collect();
        let agreements: Vec<F::Agreement> = members
            .iter()
            .map(|m| factory.agreement(m, AgreementOutput::new(m.clone(), agreement_tx.clone())))
            .collect();
        drop((broadcast_tx, agreement_tx));

        let (requests, requests_rx) = bounded(0);
        let (close, close_rx) = bounded(1);
        let (done_tx, done) = bounded(0);
        let outcome = Arc::new(OnceLock::new());

        let actor = Actor::new(
            owner.clone(),
            config.round.clone(),
            members.clone(),
            broadcasts,
            agreements,
            Inbox {
                requests: requests_rx,
                broadcast_events,
                agreement_events,
                close: close_rx,
            },
            outcome.clone(),
            done_tx,
        );

        let thread = thread::Builder::new()
            .name(format!("acs-{}", config.round))
            .spawn(move || actor.run())?;

        Ok(Self {
            owner,
            round: config.round,
            members,
            requests,
            close,
            done,
            outcome,
            lifecycle: Lifecycle::new(),
            thread: Mutex::new(Some(thread)),
        })
    }

    pub fn owner(&self) -> &Member {
        &self.owner
    }

    pub fn round(&self) -> &Round {
        &self.round
    }

    pub fn members(&self) -> &Members {
        &self.members
    }

    /// Feeds one network message into the round.
    ///
    /// Blocks until the actor loop applied it. Returns
    /// `Error::UndefinedRequestType` for a bundle that is neither rbc nor bba,
    /// and the sub-instance's own error if it rejected the message.
    pub fn handle_message(&self, sender: &Member, bundle: Bundle) -> Result<()> {
        let (reply, response) = bounded(1);
        self.submit(
            Request::Message {
                sender: sender.clone(),
                bundle,
                reply,
            },
            response,
        )
    }

    /// Proposes our own contribution by starting our reliable broadcast.
    pub fn handle_input(&self, contribution: Contribution) -> Result<()> {
        let (reply, response) = bounded(1);
        self.submit(
            Request::Input {
                contribution,
                reply,
            },
            response,
        )
    }

    fn submit(&self, req: Request, response: Receiver<Result<()>>) -> Result<()> {
        if !self.lifecycle.is_running() {
            return Err(Error::Closed);
        }
        self.requests.send(req).map_err(|_| Error::Closed)?;
        // a dropped reply means the loop went away with our request
        response.recv().unwrap_or(Err(Error::Closed))
    }

    /// Waits for the round to finish and returns the agreed batch.
    ///
    /// Returns `Error::Fault` if a sub-instance broke the protocol and
    /// `Error::RoundIncomplete` if the round was closed before it finished.
    pub fn result(&self) -> Result<Batch> {
        // only ever disconnects, either on completion or on shutdown
        let _ = self.done.recv();
        self.outcome()
    }

    /// Like `result` but gives up after `timeout`, returning `None`.
    pub fn result_timeout(&self, timeout: Duration) -> Option<Result<Batch>> {
        match self.done.recv_timeout(timeout) {
            Err(RecvTimeoutError::Timeout) => None,
            _ => Some(self.outcome()),
        }
    }

    /// The outcome if the round already finished.
    pub fn try_result(&self) -> Option<Result<Batch>> {
        match self.done.try_recv() {
            Err(TryRecvError::Empty) => None,
            _ => Some(self.outcome()),
        }
    }

    fn outcome(&self) -> Result<Batch> {
        match self.outcome.get() {
            Some(Ok(batch)) => Ok(batch.clone()),
            Some(Err(fault)) => Err(Error::Fault(fault.clone())),
            None => Err(Error::RoundIncomplete),
        }
    }

    /// Stops the actor loop and waits for it to exit.
    ///
    /// Only the first call does anything; every other call, concurrent or
    /// later, returns immediately.
    pub fn close(&self) {
        if !self.lifecycle.begin_stop() {
            return;
        }

        let (ack, acked) = bounded(1);
        if self.close.send(ack).is_ok() {
            // an error here means the loop already exited
            let _ = acked.recv();
        }

        match self.thread.lock() {
            Ok(mut thread) => {
                if let Some(handle) = thread.take() {
                    if handle.join().is_err() {
                        warn!("[ACS-{}] actor thread panicked", self.owner.index);
                    }
                }
            }
            Err(_) => warn!("[ACS-{}] actor thread handle poisoned", self.owner.index),
        }

        self.lifecycle.finish_stop();
        info!("[ACS-{}] closed round {}", self.owner.index, self.round);
    }

    pub fn is_closed(&self) -> bool {
        self.lifecycle.is_stopped()
    }
}

impl Drop for Acs {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
#[path = "./tests.rs"]
mod tests;
