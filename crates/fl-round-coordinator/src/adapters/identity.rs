//! Certificate identity adapter.
//!
//! Builds a [`Principal`] from what a Fabric-style client identity exposes:
//! the MSP id, the client id string
//! (`x509::CN=<user>,OU=...::CN=<issuer>,...`) and the enrollment
//! attribute block (`{"attrs":{"trainer":"true",...}}`).

use crate::domain::{CoordinatorError, Principal};
use crate::ports::PrincipalResolver;
use serde::Deserialize;
use std::collections::BTreeMap;

const X509_PREFIX: &str = "x509::";

#[derive(Deserialize)]
struct AttributeBlock {
    #[serde(default)]
    attrs: BTreeMap<String, String>,
}

/// Extract the subject common name from a client id.
pub fn subject_common_name(client_id: &str) -> Option<&str> {
    let subject = client_id
        .strip_prefix(X509_PREFIX)?
        .split("::")
        .next()?;
    subject
        .split(',')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("CN="))
        .filter(|cn| !cn.is_empty())
}

/// Parse an enrollment attribute block.
pub fn parse_attributes(json: &str) -> Result<BTreeMap<String, String>, CoordinatorError> {
    let block: AttributeBlock = serde_json::from_str(json)
        .map_err(|e| CoordinatorError::InvalidArgument(format!("attribute block: {}", e)))?;
    Ok(block.attrs)
}

/// Identity of a transaction creator as presented by its certificate.
#[derive(Clone, Debug)]
pub struct CertificateIdentity {
    msp_id: String,
    client_id: String,
    attributes_json: Option<String>,
}

impl CertificateIdentity {
    /// Identity without enrollment attributes.
    pub fn new(msp_id: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            msp_id: msp_id.into(),
            client_id: client_id.into(),
            attributes_json: None,
        }
    }

    /// Attach the enrollment attribute block.
    pub fn with_attributes_json(mut self, json: impl Into<String>) -> Self {
        self.attributes_json = Some(json.into());
        self
    }
}

impl PrincipalResolver for CertificateIdentity {
    fn current_principal(&self) -> Result<Principal, CoordinatorError> {
        if self.msp_id.is_empty() {
            return Err(CoordinatorError::InvalidArgument(
                "creator has no MSP id".to_string(),
            ));
        }
        let username = subject_common_name(&self.client_id).ok_or_else(|| {
            CoordinatorError::InvalidArgument(format!(
                "client id {:?} has no subject common name",
                self.client_id
            ))
        })?;
        let attributes = match &self.attributes_json {
            Some(json) => parse_attributes(json)?,
            None => BTreeMap::new(),
        };

        Ok(Principal {
            client_id: self.client_id.clone(),
            organization_id: self.msp_id.clone(),
            username: username.to_string(),
            attributes,
        })
    }
}
