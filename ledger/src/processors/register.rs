//! Register transactions: declare a new asset.

use strata_types::{Asset, Fixed8, RegisterPayload, TxHash};

use crate::StagedWrites;

#[derive(Clone, Copy, Debug, Default)]
pub struct RegisterProcessor;

impl RegisterProcessor {
    /// Create the asset keyed by the registering transaction's hash. Nothing
    /// is available until an Issue transaction issues it.
    pub fn process(
        &self,
        staged: &mut StagedWrites<'_>,
        tx_hash: &TxHash,
        payload: &RegisterPayload,
    ) {
        let asset = Asset {
            id: *tx_hash,
            asset_type: payload.asset_type,
            name: payload.name.clone(),
            amount: payload.amount,
            available: Fixed8::ZERO,
            precision: payload.precision,
            owner: payload.owner,
            admin: payload.admin,
        };
        staged.put_asset(asset);
    }
}
