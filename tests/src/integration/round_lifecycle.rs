//! # Round Lifecycle
//!
//! A complete training run through the public contract surface:
//!
//! 1. **Registration**: admin creates the model (`Initiated`)
//! 2. **Check-in**: trainers declare liveness
//! 3. **Start**: first selection is drawn (`Started`, round 0)
//! 4. **Intake**: selected trainers submit secrets, aggregators submit aggregates
//! 5. **Finalize**: lead aggregator publishes the end-round model per round
//! 6. **Finish**: final publication moves the model to `Finished`

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use fl_round_coordinator::events::{
        names, RoundFinishedPayload, SubmissionAddedPayload, ThresholdReachedPayload,
        TrainingFinishedPayload, TrainingStartedPayload,
    };
    use fl_round_coordinator::config::DEFAULT_AGGREGATOR_PARTITION;
    use fl_round_coordinator::{
        ErrorKind, ModelStatus, Partition, Principal, RoundCoordinationApi, RoundOutcome,
        SelectedTrainer,
    };

    // =============================================================================
    // HELPERS
    // =============================================================================

    /// Every selected trainer submits a secret; returns the last receipt count.
    fn submit_all_secrets(net: &Network, selected: &[SelectedTrainer], pool: &[Principal]) -> u64 {
        let mut count = 0;
        for s in selected {
            let who = pool
                .iter()
                .find(|p| p.username == s.username)
                .expect("selected trainer is in the pool");
            let receipt = net
                .run(who, |c, inv| {
                    c.add_model_secret(inv, MODEL_ID, format!("w-{}", s.username), 600)
                })
                .expect("secret accepted");
            count = receipt.count;
        }
        count
    }

    // =============================================================================
    // FULL RUN
    // =============================================================================

    #[test]
    fn test_two_round_training_run() {
        let net = Network::new();
        let pool = trainers(3);

        let created = net.create_model(params(3, 1, 2));
        assert_eq!(created.status, ModelStatus::Initiated);

        net.check_in_all(&pool);
        let selected = net
            .run(&admin(), |c, inv| c.start_training(inv, MODEL_ID))
            .unwrap();
        assert_eq!(selected.len(), 3);

        let started: TrainingStartedPayload = net.events.named(names::TRAINING_STARTED)[0]
            .decode()
            .unwrap();
        assert_eq!(started.round, 0);
        assert_eq!(started.selected, 3);

        // Round 0
        assert_eq!(submit_all_secrets(&net, &selected, &pool), 3);
        let received: ThresholdReachedPayload = net.events.named(names::ALL_SECRETS_RECEIVED)
            [0]
        .decode()
        .unwrap();
        assert_eq!(received.count, 3);
        assert!(net
            .run(&aggregator(ORGS[0]), |c, inv| c
                .check_all_secrets_received(inv, MODEL_ID))
            .unwrap());

        let secrets = net
            .run(&aggregator(ORGS[0]), |c, inv| {
                c.read_model_secrets(inv, MODEL_ID, ORGS[0])
            })
            .unwrap();
        assert_eq!(secrets.len(), 3);
        assert!(secrets.iter().all(|s| s.round == 0 && s.dataset_size == 600));

        net.run(&aggregator(ORGS[0]), |c, inv| {
            c.add_aggregated_secret(inv, MODEL_ID, "agg-0".to_string())
        })
        .unwrap();
        assert_eq!(net.events.count(names::AGGREGATION_FINISHED), 1);

        let outcome = net
            .run(&lead(), |c, inv| {
                c.add_end_round_model(inv, MODEL_ID, "global-0".to_string())
            })
            .unwrap();
        let next = match outcome {
            RoundOutcome::Advanced {
                published_round: 0,
                next_round: 1,
                selected,
            } => selected,
            other => panic!("expected round 0 to advance, got {:?}", other),
        };
        let model = net.model();
        assert_eq!(model.status, ModelStatus::Started);
        assert_eq!(model.current_round, 1);
        let finished: RoundFinishedPayload = net.events.named(names::ROUND_FINISHED)[0]
            .decode()
            .unwrap();
        assert_eq!((finished.round, finished.next_round), (0, 1));

        // Round 1: counters start over
        assert!(!net
            .run(&aggregator(ORGS[0]), |c, inv| c
                .check_all_secrets_received(inv, MODEL_ID))
            .unwrap());
        assert_eq!(submit_all_secrets(&net, &next, &pool), 3);
        net.run(&lead(), |c, inv| {
            c.add_aggregated_secret(inv, MODEL_ID, "agg-1".to_string())
        })
        .unwrap();

        let outcome = net
            .run(&lead(), |c, inv| {
                c.add_end_round_model(inv, MODEL_ID, "global-1".to_string())
            })
            .unwrap();
        assert_eq!(outcome, RoundOutcome::Finished { published_round: 1 });

        let model = net.model();
        assert_eq!(model.status, ModelStatus::Finished);
        assert_eq!(model.current_round, model.training_rounds);
        let done: TrainingFinishedPayload = net.events.named(names::TRAINING_FINISHED)[0]
            .decode()
            .unwrap();
        assert_eq!(done.final_round, 1);

        let trained = net
            .run(&trainer(0), |c, inv| c.get_trained_model(inv, MODEL_ID))
            .unwrap();
        assert_eq!(trained.weights, "global-1");
        assert_eq!(net.events.count(names::ALL_SECRETS_RECEIVED), 2);
        assert_eq!(net.events.count(names::AGGREGATION_FINISHED), 2);
    }

    #[test]
    fn test_single_round_training_finishes_immediately() {
        let net = Network::new();
        net.create_model(params(1, 1, 1));
        net.check_in_all(&trainers(1));
        net.run(&admin(), |c, inv| c.start_training(inv, MODEL_ID))
            .unwrap();

        let outcome = net
            .run(&lead(), |c, inv| {
                c.add_end_round_model(inv, MODEL_ID, "only".to_string())
            })
            .unwrap();
        assert_eq!(outcome, RoundOutcome::Finished { published_round: 0 });
        assert_eq!(net.events.count(names::ROUND_FINISHED), 0);
        assert_eq!(net.events.count(names::TRAINING_FINISHED), 1);
    }

    #[test]
    fn test_finished_model_rejects_every_submission() {
        let net = Network::new();
        net.create_model(params(1, 1, 1));
        net.check_in_all(&trainers(1));
        net.run(&admin(), |c, inv| c.start_training(inv, MODEL_ID))
            .unwrap();
        net.run(&lead(), |c, inv| {
            c.add_end_round_model(inv, MODEL_ID, "only".to_string())
        })
        .unwrap();

        let secret = net
            .run(&trainer(0), |c, inv| {
                c.add_model_secret(inv, MODEL_ID, "late".to_string(), 1)
            })
            .unwrap_err();
        let aggregate = net
            .run(&aggregator(ORGS[0]), |c, inv| {
                c.add_aggregated_secret(inv, MODEL_ID, "late".to_string())
            })
            .unwrap_err();
        let restart = net
            .run(&admin(), |c, inv| c.start_training(inv, MODEL_ID))
            .unwrap_err();
        for err in [secret, aggregate, restart] {
            assert_eq!(err.kind(), ErrorKind::InvalidState);
        }
        assert_eq!(net.model().status, ModelStatus::Finished);
    }

    #[test]
    fn test_mixed_organization_selection_reaches_the_threshold_once() {
        let net = Network::new();
        let org1 = trainer_in(ORGS[0], 0);
        let org2 = trainer_in(ORGS[1], 0);
        net.create_model(params(2, 1, 1));
        net.check_in_all(&[org1.clone(), org2.clone()]);
        net.run(&admin(), |c, inv| c.start_training(inv, MODEL_ID))
            .unwrap();

        let counts: Vec<u64> = [&org1, &org2]
            .into_iter()
            .map(|who| {
                net.run(who, |c, inv| c.add_model_secret(inv, MODEL_ID, "w".to_string(), 1))
                    .unwrap()
                    .count
            })
            .collect();
        assert_eq!(counts, vec![1, 2]);

        let reached: Vec<ThresholdReachedPayload> = net
            .events
            .named(names::ALL_SECRETS_RECEIVED)
            .iter()
            .map(|e| e.decode().unwrap())
            .collect();
        assert_eq!(reached.len(), 1);
        assert_eq!((reached[0].round, reached[0].count), (0, 2));

        for who in [org1.clone(), org2.clone(), aggregator(ORGS[0]), aggregator(ORGS[1])] {
            assert!(net
                .run(&who, |c, inv| c.check_all_secrets_received(inv, MODEL_ID))
                .unwrap());
        }

        // a resubmission from the other organization changes nothing
        let again = net
            .run(&org2, |c, inv| c.add_model_secret(inv, MODEL_ID, "w2".to_string(), 1))
            .unwrap();
        assert!(again.resubmission);
        assert_eq!(again.count, 2);
        assert_eq!(net.events.count(names::ALL_SECRETS_RECEIVED), 1);

        let added: Vec<SubmissionAddedPayload> = net
            .events
            .named(names::MODEL_SECRET_ADDED)
            .iter()
            .map(|e| e.decode().unwrap())
            .collect();
        assert_eq!(added.len(), 3);
        assert!(added.iter().all(|p| p.threshold == 2));

        // payloads stay in the submitter's organization partition
        let err = net
            .run(&aggregator(ORGS[0]), |c, inv| {
                c.read_model_secrets(inv, MODEL_ID, ORGS[1])
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Ledger);
        let own = net
            .run(&aggregator(ORGS[1]), |c, inv| {
                c.read_model_secrets(inv, MODEL_ID, ORGS[1])
            })
            .unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].weights, "w2");
    }

    #[test]
    fn test_aggregators_outside_a_restricted_partition_can_submit() {
        let net = Network::new();
        net.ledger
            .restrict_collection(DEFAULT_AGGREGATOR_PARTITION, [ORGS[0]]);
        net.create_model(params(1, 2, 1));
        net.check_in_all(&trainers(1));
        net.run(&admin(), |c, inv| c.start_training(inv, MODEL_ID))
            .unwrap();

        let first = net
            .run(&aggregator(ORGS[1]), |c, inv| {
                c.add_aggregated_secret(inv, MODEL_ID, "org2".to_string())
            })
            .unwrap();
        assert_eq!(first.count, 1);
        assert!(!net
            .run(&aggregator(ORGS[1]), |c, inv| {
                c.check_all_aggregated_secrets_received(inv, MODEL_ID)
            })
            .unwrap());

        let second = net
            .run(&lead(), |c, inv| {
                c.add_aggregated_secret(inv, MODEL_ID, "lead".to_string())
            })
            .unwrap();
        assert_eq!(second.count, 2);
        assert_eq!(net.events.count(names::AGGREGATION_FINISHED), 1);

        let mut weights: Vec<String> = net
            .run(&lead(), |c, inv| c.read_aggregated_secrets(inv, MODEL_ID))
            .unwrap()
            .into_iter()
            .map(|a| a.weights)
            .collect();
        weights.sort();
        assert_eq!(weights, vec!["lead", "org2"]);

        // the partition itself stays closed to the outsider
        assert!(!net
            .ledger
            .can_read(&Partition::private(DEFAULT_AGGREGATOR_PARTITION), ORGS[1]));
    }

    #[test]
    fn test_personal_info_follows_the_rounds() {
        let net = Network::new();
        let pool = trainers(2);
        net.create_model(params(2, 1, 2));

        let before = net
            .run(&pool[0], |c, inv| c.get_personal_info(inv, MODEL_ID))
            .unwrap();
        assert!(!before.checked_in);
        assert!(!before.selected_for_round);

        net.check_in_all(&pool);
        net.run(&admin(), |c, inv| c.start_training(inv, MODEL_ID))
            .unwrap();
        let during = net
            .run(&pool[0], |c, inv| c.get_personal_info(inv, MODEL_ID))
            .unwrap();
        assert!(during.checked_in);
        assert!(during.selected_for_round);

        net.run(&lead(), |c, inv| c.add_end_round_model(inv, MODEL_ID, "g0".to_string()))
            .unwrap();
        net.run(&lead(), |c, inv| c.add_end_round_model(inv, MODEL_ID, "g1".to_string()))
            .unwrap();
        let after = net
            .run(&pool[0], |c, inv| c.get_personal_info(inv, MODEL_ID))
            .unwrap();
        assert!(!after.selected_for_round);
        assert_eq!(
            net.run(&lead(), |c, inv| c.get_role(inv)).unwrap(),
            Some(fl_round_coordinator::Role::Aggregator)
        );
    }
}
