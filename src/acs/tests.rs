use crossbeam_channel::{bounded, Sender};
use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle};

use super::actor::{Actor, Inbox, Outcome, Request};
use crate::instance::{AgreementEvent, BroadcastEvent};
use crate::{
    Address, Agreement, Binary, Broadcast, Bundle, Contribution, Error, Fault, Member, Members,
    Result, Round, Transaction,
};

struct Idle;

impl Broadcast for Idle {
    fn propose(&mut self, _: &Contribution) -> Result<()> {
        Ok(())
    }

    fn handle_message(&mut self, _: &Member, _: &[u8]) -> Result<()> {
        Ok(())
    }
}

impl Agreement for Idle {
    fn provide_input(&mut self, _: Binary) -> Result<()> {
        Ok(())
    }

    fn handle_message(&mut self, _: &Member, _: &[u8]) -> Result<()> {
        Ok(())
    }
}

// An actor whose fan-in channels are fed directly by the test, which lets us
// play sub-instances that report more than one output.
struct TestActor {
    members: Members,
    requests: Sender<Request>,
    broadcasts: Sender<BroadcastEvent>,
    agreements: Sender<AgreementEvent>,
    close: Sender<Sender<()>>,
    outcome: Arc<OnceLock<Outcome>>,
    done: crossbeam_channel::Receiver<()>,
    thread: JoinHandle<()>,
}

impl TestActor {
    const PARTY_A: usize = 0;
    const PARTY_B: usize = 1;
    const PARTY_C: usize = 2;
    const PARTY_D: usize = 3;

    fn start() -> Self {
        let members = Members::new(["a", "b", "c", "d"].into_iter().map(Address::from)).unwrap();
        let (requests, requests_rx) = bounded(0);
        let (broadcasts, broadcast_events) = bounded(8);
        let (agreements, agreement_events) = bounded(8);
        let (close, close_rx) = bounded(1);
        let (done_tx, done) = bounded(0);
        let outcome = Arc::new(OnceLock::new());

        let actor = Actor::new(
            members.get(0).unwrap().clone(),
            Round::new("test-id", 0),
            members.clone(),
            (0..4).map(|_| Idle).collect::<Vec<_>>(),
            (0..4).map(|_| Idle).collect::<Vec<_>>(),
            Inbox {
                requests: requests_rx,
                broadcast_events,
                agreement_events,
                close: close_rx,
            },
            outcome.clone(),
            done_tx,
        );
        let thread = thread::spawn(move || actor.run());

        Self {
            members,
            requests,
            broadcasts,
            agreements,
            close,
            outcome,
            done,
            thread,
        }
    }

    fn member(&self, index: usize) -> Member {
        self.members.get(index).unwrap().clone()
    }

    fn complete(&self, index: usize) {
        let contribution = Contribution::from_iter([Transaction(vec![index as u8])]);
        self.broadcasts
            .send(BroadcastEvent {
                member: self.member(index),
                contribution,
            })
            .unwrap();
    }

    fn decide(&self, index: usize, binary: Binary) {
        self.agreements
            .send(AgreementEvent {
                member: self.member(index),
                binary,
            })
            .unwrap();
    }

    fn wait_outcome(&self) -> Option<&Outcome> {
        let _ = self.done.recv();
        self.outcome.get()
    }

    fn stop(self) {
        let (ack, acked) = bounded(1);
        self.close.send(ack).unwrap();
        acked.recv().unwrap();
        self.thread.join().unwrap();
    }
}

#[test]
fn test_conflicting_decision_fails_the_round() {
    let t = TestActor::start();
    t.decide(TestActor::PARTY_B, Binary::Zero);
    t.decide(TestActor::PARTY_B, Binary::Zero);
    t.decide(TestActor::PARTY_B, Binary::One);

    let expected = Fault::ConflictingDecision {
        member: t.member(TestActor::PARTY_B),
        recorded: Binary::Zero,
        reported: Binary::One,
    };
    assert_eq!(t.wait_outcome(), Some(&Err(expected.clone())));

    // the fault stays the outcome whatever happens next
    for p in [TestActor::PARTY_A, TestActor::PARTY_C, TestActor::PARTY_D] {
        t.complete(p);
        t.decide(p, Binary::One);
    }
    t.stop();
}

#[test]
fn test_repeated_decision_does_not_change_the_batch() {
    let t = TestActor::start();
    for p in [TestActor::PARTY_A, TestActor::PARTY_B, TestActor::PARTY_C] {
        t.complete(p);
        t.decide(p, Binary::One);
    }
    t.decide(TestActor::PARTY_C, Binary::One);
    t.decide(TestActor::PARTY_D, Binary::Zero);

    let batch = match t.wait_outcome() {
        Some(Ok(batch)) => batch.clone(),
        other => panic!("unexpected outcome {other:?}"),
    };
    assert_eq!(batch.len(), 3);
    assert!(!batch.contains_key(&t.member(TestActor::PARTY_D)));
    t.stop();
}

#[test]
fn test_requests_get_a_reply_across_shutdown() {
    let t = TestActor::start();

    let (reply, response) = bounded(1);
    t.requests
        .send(Request::Message {
            sender: t.member(TestActor::PARTY_B),
            bundle: Bundle::rbc(Round::new("test-id", 0), None, vec![]),
            reply,
        })
        .unwrap();
    assert!(response.recv().unwrap().is_ok());

    let requests = t.requests.clone();
    let racer = thread::spawn(move || {
        let (reply, response) = bounded(1);
        let req = Request::Input {
            contribution: Contribution::new(),
            reply,
        };
        match requests.send(req) {
            Ok(()) => response.recv().unwrap_or(Err(Error::Closed)),
            Err(_) => Err(Error::Closed),
        }
    });

    t.stop();
    // either served before the close or answered with Closed, never left hanging
    match racer.join().unwrap() {
        Ok(()) | Err(Error::Closed) => {}
        Err(err) => panic!("unexpected error {err}"),
    }
}
