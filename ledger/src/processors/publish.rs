//! Publish transactions: store a contract.

use strata_types::{Contract, PublishPayload};

use crate::StagedWrites;

#[derive(Clone, Copy, Debug, Default)]
pub struct PublishProcessor;

impl PublishProcessor {
    pub fn process(&self, staged: &mut StagedWrites<'_>, payload: &PublishPayload) {
        let contract = Contract {
            script: payload.script.clone(),
            parameter_list: payload.parameter_list.clone(),
            return_type: payload.return_type,
            need_storage: payload.need_storage,
            metadata: payload.metadata.clone(),
        };
        staged.put_contract(contract);
    }
}
