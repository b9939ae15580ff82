//! Shared fixtures: a simulated network of organizations on one ledger.

use fl_round_coordinator::{
    CoordinatorError, InMemoryLedger, Invocation, ModelMetadata, ModelParams, Principal,
    RecordingEventEmitter, Role, RoundCoordinationApi, RoundCoordinator,
};
use std::sync::Arc;

/// Default model id used across the suite.
pub const MODEL_ID: &str = "mnist-cnn";

/// Organizations taking part in the simulated network.
pub const ORGS: [&str; 2] = ["Org1MSP", "Org2MSP"];

fn principal(org: &str, username: &str, roles: &[Role]) -> Principal {
    roles.iter().fold(
        Principal::new(format!("x509::CN={},OU=client", username), org, username),
        |p, role| p.with_role(*role),
    )
}

/// Training administrator of Org1.
pub fn admin() -> Principal {
    principal(ORGS[0], "admin", &[Role::FlAdmin])
}

/// Trainer `i` of Org1.
pub fn trainer(i: usize) -> Principal {
    trainer_in(ORGS[0], i)
}

/// Trainer `i` of organization `org`.
pub fn trainer_in(org: &str, i: usize) -> Principal {
    principal(org, &format!("{}-trainer{:02}", org, i), &[Role::Trainer])
}

/// Trainers `0..n`.
pub fn trainers(n: usize) -> Vec<Principal> {
    (0..n).map(trainer).collect()
}

/// Aggregator of organization `org`.
pub fn aggregator(org: &str) -> Principal {
    principal(org, &format!("agg-{}", org), &[Role::Aggregator])
}

/// Lead aggregator, also an aggregator of Org1.
pub fn lead() -> Principal {
    principal(ORGS[0], "lead", &[Role::LeadAggregator, Role::Aggregator])
}

/// Model parameters for [`MODEL_ID`].
pub fn params(clients_per_round: u64, secrets_per_client: u64, rounds: u64) -> ModelParams {
    ModelParams {
        model_id: MODEL_ID.to_string(),
        name: "MNIST CNN".to_string(),
        clients_per_round,
        secrets_per_client,
        training_rounds: rounds,
    }
}

/// Ledger, recorder and contract wired together.
pub struct Network {
    /// Shared ledger
    pub ledger: InMemoryLedger,
    /// Every committed event
    pub events: Arc<RecordingEventEmitter>,
    /// Contract under test
    pub coordinator: RoundCoordinator,
}

impl Network {
    /// Empty network with default configuration.
    pub fn new() -> Self {
        fl_telemetry::init_test_logging();
        let events = Arc::new(RecordingEventEmitter::new());
        Self {
            ledger: InMemoryLedger::with_emitter(events.clone()),
            events,
            coordinator: RoundCoordinator::default(),
        }
    }

    /// Independent copy of the committed state, sharing the recorder.
    pub fn fork(&self) -> Self {
        Self {
            ledger: self.ledger.fork(),
            events: Arc::clone(&self.events),
            coordinator: self.coordinator.clone(),
        }
    }

    /// Run one transaction as `who`.
    pub fn run<T>(
        &self,
        who: &Principal,
        f: impl FnOnce(&RoundCoordinator, &mut Invocation<'_>) -> Result<T, CoordinatorError>,
    ) -> Result<T, CoordinatorError> {
        self.ledger.execute(who, |inv| f(&self.coordinator, inv))
    }

    /// Run one transaction as `who` under a fixed transaction id.
    pub fn run_with_tx_id<T>(
        &self,
        tx_id: &str,
        who: &Principal,
        f: impl FnOnce(&RoundCoordinator, &mut Invocation<'_>) -> Result<T, CoordinatorError>,
    ) -> Result<T, CoordinatorError> {
        let mut stub = self
            .ledger
            .begin_with_tx_id(&who.organization_id, tx_id);
        let outcome = {
            let mut inv = Invocation::new(&mut stub, who)?;
            f(&self.coordinator, &mut inv)
        };
        match outcome {
            Ok(value) => {
                stub.commit()?;
                Ok(value)
            }
            Err(e) => {
                stub.discard();
                Err(e)
            }
        }
    }

    /// Create [`MODEL_ID`] as the administrator.
    pub fn create_model(&self, params: ModelParams) -> ModelMetadata {
        self.run(&admin(), |c, inv| c.create_model(inv, params))
            .expect("create model")
    }

    /// Check every principal in, in order.
    pub fn check_in_all(&self, who: &[Principal]) {
        for p in who {
            self.run(p, |c, inv| c.check_in(inv)).expect("check in");
        }
    }

    /// Current model metadata.
    pub fn model(&self) -> ModelMetadata {
        self.run(&admin(), |c, inv| c.get_model(inv, MODEL_ID))
            .expect("model")
    }
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}
