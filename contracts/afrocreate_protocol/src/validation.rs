//! Client side of the optional cultural-validation contract.
//!
//! The protocol never scores authenticity itself. It asks the configured
//! validator two yes/no questions. With no validator configured every project
//! is publishable and no milestone is externally approved, so milestone
//! releases fall back to the creator's attestation.

use soroban_sdk::{contractclient, Env};

use crate::types::ProtocolConfig;

#[allow(dead_code)]
#[contractclient(name = "ValidationClient")]
pub trait CulturalValidation {
    fn is_milestone_approved(env: Env, project_id: u64, milestone_index: u32) -> bool;
    fn is_project_publishable(env: Env, project_id: u64) -> bool;
}

pub fn is_project_publishable(env: &Env, config: &ProtocolConfig, project_id: u64) -> bool {
    match &config.validator {
        Some(validator) => ValidationClient::new(env, validator).is_project_publishable(&project_id),
        None => true,
    }
}

pub fn is_milestone_approved(
    env: &Env,
    config: &ProtocolConfig,
    project_id: u64,
    milestone_index: u32,
) -> bool {
    match &config.validator {
        Some(validator) => ValidationClient::new(env, validator)
            .is_milestone_approved(&project_id, &milestone_index),
        None => false,
    }
}
