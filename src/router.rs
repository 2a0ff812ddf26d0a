use crate::bundle::{BBA_MODULE, RBC_MODULE};
use crate::{Bundle, Error, Member, Members, Result, Round};

/// The sub-instance a bundle is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Route {
    Broadcast(usize),
    Agreement(usize),
}

/// Classifies `bundle` received from `sender`.
///
/// Nothing is mutated here; a bundle rejected by this function never reaches
/// a sub-instance.
pub(crate) fn route(
    members: &Members,
    round: &Round,
    sender: &Member,
    bundle: &Bundle,
) -> Result<Route> {
    let to_route: fn(usize) -> Route = match bundle.module.as_ref() {
        RBC_MODULE => Route::Broadcast,
        BBA_MODULE => Route::Agreement,
        other => return Err(Error::UndefinedRequestType(other.to_string())),
    };

    if &bundle.round != round {
        return Err(Error::InvalidMessage(format!(
            "invalid round. expected: {round}, got {}",
            bundle.round
        )));
    }

    members.index_of(sender)?;
    let target = bundle.proposer.as_ref().unwrap_or(sender);
    Ok(to_route(members.index_of(target)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Address;

    fn setup() -> (Members, Round) {
        let members = Members::new(["a", "b", "c", "d"].into_iter().map(Address::from)).unwrap();
        (members, Round::new("test-id", 0))
    }

    #[test]
    fn test_route_to_sender_instance() {
        let (members, round) = setup();
        let b = members.get(1).unwrap().clone();

        let bundle = Bundle::rbc(round.clone(), None, vec![]);
        assert_eq!(route(&members, &round, &b, &bundle).unwrap(), Route::Broadcast(1));

        let bundle = Bundle::bba(round.clone(), None, vec![]);
        assert_eq!(route(&members, &round, &b, &bundle).unwrap(), Route::Agreement(1));
    }

    #[test]
    fn test_route_to_proposer_instance() {
        let (members, round) = setup();
        let b = members.get(1).unwrap().clone();
        let d = members.get(3).cloned();

        let bundle = Bundle::rbc(round.clone(), d, vec![]);
        assert_eq!(route(&members, &round, &b, &bundle).unwrap(), Route::Broadcast(3));
    }

    #[test]
    fn test_unknown_module() {
        let (members, round) = setup();
        let a = members.get(0).unwrap().clone();
        let mut bundle = Bundle::rbc(round.clone(), None, vec![]);
        bundle.module = "mvba".to_string();

        assert!(matches!(
            route(&members, &round, &a, &bundle),
            Err(Error::UndefinedRequestType(module)) if module == "mvba"
        ));
    }

    #[test]
    fn test_wrong_round() {
        let (members, round) = setup();
        let a = members.get(0).unwrap().clone();
        let bundle = Bundle::bba(round.next(), None, vec![]);

        assert!(matches!(route(&members, &round, &a, &bundle),
            Err(Error::InvalidMessage(msg))
            if msg == "invalid round. expected: test-id[0], got test-id[1]"));
    }

    #[test]
    fn test_unknown_sender_and_proposer() {
        let (members, round) = setup();
        let a = members.get(0).unwrap().clone();
        let stranger = Member {
            index: 9,
            address: Address::from("z"),
        };

        let bundle = Bundle::bba(round.clone(), None, vec![]);
        assert!(matches!(
            route(&members, &round, &stranger, &bundle),
            Err(Error::UnknownMember { .. })
        ));

        let bundle = Bundle::bba(round.clone(), Some(stranger), vec![]);
        assert!(matches!(
            route(&members, &round, &a, &bundle),
            Err(Error::UnknownMember { .. })
        ));
    }
}
