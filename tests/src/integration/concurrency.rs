//! # Concurrency
//!
//! Endorsements run against a snapshot; the ledger serializes them at
//! commit. Two transactions that read-modify-write the same key cannot both
//! commit, so counters stay exact without any in-contract locking.

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use fl_round_coordinator::events::names;
    use fl_round_coordinator::{
        CoordinatorError, ErrorKind, Invocation, LedgerError, ModelStatus, Principal,
        RoundCoordinationApi, SubmissionReceipt,
    };
    use std::thread;

    fn started_network(clients: u64, pool: &[Principal]) -> Network {
        let net = Network::new();
        net.create_model(params(clients, 1, 2));
        net.check_in_all(pool);
        net.run(&admin(), |c, inv| c.start_training(inv, MODEL_ID))
            .unwrap();
        net
    }

    /// Retry on ledger conflicts, as a client would resubmit.
    fn submit_with_retry(net: &Network, who: &Principal) -> SubmissionReceipt {
        loop {
            match net.run(who, |c, inv| {
                c.add_model_secret(inv, MODEL_ID, "w".to_string(), 10)
            }) {
                Ok(receipt) => return receipt,
                Err(e) if e.kind() == ErrorKind::Ledger => continue,
                Err(e) => panic!("unexpected error: {}", e),
            }
        }
    }

    #[test]
    fn test_concurrent_secrets_conflict_on_the_counter() {
        let pool = trainers(2);
        let net = started_network(2, &pool);

        let mut first = net.ledger.begin(ORGS[0]);
        let mut second = net.ledger.begin(ORGS[0]);
        let a = {
            let mut inv = Invocation::new(&mut first, &pool[0]).unwrap();
            net.coordinator
                .add_model_secret(&mut inv, MODEL_ID, "a".to_string(), 1)
                .unwrap()
        };
        let b = {
            let mut inv = Invocation::new(&mut second, &pool[1]).unwrap();
            net.coordinator
                .add_model_secret(&mut inv, MODEL_ID, "b".to_string(), 1)
                .unwrap()
        };
        // both endorsed against the same snapshot
        assert_eq!((a.count, b.count), (1, 1));

        first.commit().unwrap();
        let err = second.commit().unwrap_err();
        assert!(matches!(err, LedgerError::MvccConflict { .. }));
        assert_eq!(net.events.count(names::MODEL_SECRET_ADDED), 1);

        let retried = submit_with_retry(&net, &pool[1]);
        assert_eq!(retried.count, 2);
        assert_eq!(net.events.count(names::ALL_SECRETS_RECEIVED), 1);
    }

    #[test]
    fn test_concurrent_start_training_commits_once() {
        let net = Network::new();
        net.create_model(params(1, 1, 1));
        net.check_in_all(&trainers(2));

        let mut first = net.ledger.begin(ORGS[0]);
        let mut second = net.ledger.begin(ORGS[0]);
        for stub in [&mut first, &mut second] {
            let mut inv = Invocation::new(stub, &admin()).unwrap();
            net.coordinator.start_training(&mut inv, MODEL_ID).unwrap();
        }

        first.commit().unwrap();
        assert!(second.commit().is_err());
        assert_eq!(net.events.count(names::TRAINING_STARTED), 1);
        assert_eq!(net.model().status, ModelStatus::Started);
    }

    #[test]
    fn test_check_in_during_selection_is_a_phantom() {
        let net = Network::new();
        net.create_model(params(1, 1, 1));
        net.check_in_all(&trainers(1));

        let mut selection = net.ledger.begin(ORGS[0]);
        {
            let mut inv = Invocation::new(&mut selection, &admin()).unwrap();
            net.coordinator.start_training(&mut inv, MODEL_ID).unwrap();
        }
        net.check_in_all(&[trainer(1)]);

        let err = selection.commit().unwrap_err();
        assert!(matches!(
            err,
            LedgerError::PhantomRead { .. } | LedgerError::MvccConflict { .. }
        ));
        assert_eq!(net.model().status, ModelStatus::Initiated);
    }

    #[test]
    fn test_repeated_check_ins_are_blind_writes() {
        let net = Network::new();
        let who = trainer(0);

        let mut early = net.ledger.begin(ORGS[0]);
        {
            let mut inv = Invocation::new(&mut early, &who).unwrap();
            net.coordinator.check_in(&mut inv).unwrap();
        }
        net.ledger.advance_time(1_000);
        net.check_in_all(&[who.clone()]);

        // no reads, so the older endorsement still commits and wins last
        early.commit().unwrap();
        let info = net
            .run(&admin(), |c, inv| c.get_check_in_info(inv))
            .unwrap();
        assert_eq!(info.len(), 1);
    }

    #[test]
    fn test_threaded_submissions_count_exactly() {
        const TRAINERS: usize = 8;
        let pool = trainers(TRAINERS);
        let net = started_network(TRAINERS as u64, &pool);

        let counts: Vec<u64> = thread::scope(|scope| {
            let handles: Vec<_> = pool
                .iter()
                .map(|who| {
                    let net = &net;
                    scope.spawn(move || submit_with_retry(net, who).count)
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().expect("submitter thread"))
                .collect()
        });

        let mut sorted = counts.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (1..=TRAINERS as u64).collect::<Vec<_>>());
        assert_eq!(net.events.count(names::ALL_SECRETS_RECEIVED), 1);
        assert!(net
            .run(&aggregator(ORGS[0]), |c, inv| c
                .check_all_secrets_received(inv, MODEL_ID))
            .unwrap());
    }

    #[test]
    fn test_failed_endorsement_leaves_no_trace() {
        let pool = trainers(1);
        let net = started_network(1, &pool);
        let height = net.ledger.height();

        let err: CoordinatorError = net
            .run(&trainer(5), |c, inv| {
                c.add_model_secret(inv, MODEL_ID, "w".to_string(), 1)
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotSelected);
        assert_eq!(net.ledger.height(), height);
        assert_eq!(net.events.count(names::MODEL_SECRET_ADDED), 0);
    }
}
