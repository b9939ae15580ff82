//! # Authorization
//!
//! Role gates are checked before any state is read, and a denied call
//! commits nothing.

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use fl_round_coordinator::{
        CertificateIdentity, CoordinatorError, ErrorKind, Principal, Role, RoundCoordinationApi,
    };

    fn nobody() -> Principal {
        Principal::new("x509::CN=guest", ORGS[0], "guest")
    }

    fn started_network() -> Network {
        let net = Network::new();
        net.create_model(params(1, 1, 2));
        net.check_in_all(&trainers(1));
        net.run(&admin(), |c, inv| c.start_training(inv, MODEL_ID))
            .unwrap();
        net
    }

    fn assert_denied<T: std::fmt::Debug>(result: Result<T, CoordinatorError>, role: Role) {
        match result {
            Err(CoordinatorError::Unauthorized { role: required, .. }) => {
                assert_eq!(required, role)
            }
            other => panic!("expected Unauthorized({}), got {:?}", role, other),
        }
    }

    #[test]
    fn test_every_gated_operation_rejects_a_roleless_caller() {
        let net = started_network();
        let height = net.ledger.height();
        let guest = nobody();

        assert_denied(
            net.run(&guest, |c, inv| c.create_model(inv, params(1, 1, 1))),
            Role::FlAdmin,
        );
        assert_denied(
            net.run(&guest, |c, inv| c.start_training(inv, MODEL_ID)),
            Role::FlAdmin,
        );
        assert_denied(
            net.run(&guest, |c, inv| c.get_check_in_info(inv)),
            Role::FlAdmin,
        );
        assert_denied(
            net.run(&guest, |c, inv| {
                c.add_model_secret(inv, MODEL_ID, "w".to_string(), 1)
            }),
            Role::Trainer,
        );
        assert_denied(
            net.run(&guest, |c, inv| {
                c.add_aggregated_secret(inv, MODEL_ID, "w".to_string())
            }),
            Role::Aggregator,
        );
        assert_denied(
            net.run(&guest, |c, inv| {
                c.add_end_round_model(inv, MODEL_ID, "w".to_string())
            }),
            Role::LeadAggregator,
        );
        assert_denied(
            net.run(&guest, |c, inv| c.read_model_secrets(inv, MODEL_ID, ORGS[0])),
            Role::Aggregator,
        );
        assert_denied(
            net.run(&guest, |c, inv| c.read_aggregated_secrets(inv, MODEL_ID)),
            Role::LeadAggregator,
        );

        assert_eq!(net.ledger.height(), height);
    }

    #[test]
    fn test_open_queries_need_no_role() {
        let net = started_network();
        let guest = nobody();

        assert!(net
            .run(&guest, |c, inv| c.model_exists(inv, MODEL_ID))
            .unwrap());
        assert_eq!(net.run(&guest, |c, inv| c.list_models(inv)).unwrap().len(), 1);
        assert_eq!(
            net.run(&guest, |c, inv| c.get_selected_trainers_for_round(inv, MODEL_ID))
                .unwrap()
                .len(),
            1
        );
        assert_eq!(net.run(&guest, |c, inv| c.get_role(inv)).unwrap(), None);
        let info = net
            .run(&guest, |c, inv| c.get_personal_info(inv, MODEL_ID))
            .unwrap();
        assert_eq!(info.role, None);
        assert!(!info.checked_in);
    }

    #[test]
    fn test_role_attribute_must_be_exactly_true() {
        let net = Network::new();
        let pretender = Principal::new("x509::CN=mallory", ORGS[0], "mallory")
            .with_attribute(Role::FlAdmin.attribute(), "TRUE");
        assert_denied(
            net.run(&pretender, |c, inv| c.create_model(inv, params(1, 1, 1))),
            Role::FlAdmin,
        );
        let yes = Principal::new("x509::CN=mallory", ORGS[0], "mallory")
            .with_attribute(Role::FlAdmin.attribute(), "yes");
        assert_denied(
            net.run(&yes, |c, inv| c.create_model(inv, params(1, 1, 1))),
            Role::FlAdmin,
        );
    }

    #[test]
    fn test_roles_from_certificate_attributes() {
        let net = Network::new();
        let identity = CertificateIdentity::new(
            ORGS[0],
            "x509::CN=ops,OU=admin::CN=ca.org1.example.com",
        )
        .with_attributes_json(r#"{"attrs":{"flAdmin":"true","hf.Type":"admin"}}"#);

        let created = net
            .ledger
            .execute(&identity, |inv| {
                net.coordinator.create_model(inv, params(2, 1, 1))
            })
            .unwrap();
        assert_eq!(created.model_id, MODEL_ID);
    }

    #[test]
    fn test_unresolvable_identity_is_rejected_before_any_work() {
        let net = Network::new();
        let anonymous = CertificateIdentity::new(ORGS[0], "not-a-certificate");
        let err = net
            .ledger
            .execute(&anonymous, |inv| net.coordinator.check_in(inv))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(net.ledger.height(), 0);
    }

    #[test]
    fn test_lead_aggregator_alone_cannot_submit_aggregates() {
        let net = started_network();
        let lead_only = Principal::new("x509::CN=lead2", ORGS[0], "lead2")
            .with_role(Role::LeadAggregator);
        assert_denied(
            net.run(&lead_only, |c, inv| {
                c.add_aggregated_secret(inv, MODEL_ID, "w".to_string())
            }),
            Role::Aggregator,
        );
        assert!(net
            .run(&lead_only, |c, inv| c.read_aggregated_secrets(inv, MODEL_ID))
            .unwrap()
            .is_empty());
    }
}
