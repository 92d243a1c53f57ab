//! Issue transactions: move the `available` counter of each issued asset.

use std::collections::BTreeMap;

use strata_types::{AssetId, Fixed8, Transaction};

use crate::{LedgerError, StagedWrites};

#[derive(Clone, Copy, Debug, Default)]
pub struct IssueProcessor;

impl IssueProcessor {
    /// Net the inputs against the outputs per asset and add each non-zero
    /// result to the asset's `available` amount.
    pub fn process(
        &self,
        staged: &mut StagedWrites<'_>,
        tx: &Transaction,
    ) -> Result<(), LedgerError> {
        let mut deltas: BTreeMap<AssetId, Fixed8> = BTreeMap::new();

        for input in &tx.inputs {
            let spent = staged.resolve_output(&input.prev_hash, input.prev_index)?;
            accumulate(&mut deltas, spent.asset_id, -spent.value)?;
        }
        for output in &tx.outputs {
            accumulate(&mut deltas, output.asset_id, output.value)?;
        }

        for (asset_id, delta) in deltas {
            if delta.is_zero() {
                continue;
            }
            let mut asset = staged
                .asset(&asset_id)?
                .ok_or(LedgerError::UnknownAsset(asset_id))?;
            asset.available = asset
                .available
                .checked_add(delta)
                .ok_or(LedgerError::Overflow("Issue"))?;
            staged.put_asset(asset);
        }
        Ok(())
    }
}

fn accumulate(
    deltas: &mut BTreeMap<AssetId, Fixed8>,
    asset_id: AssetId,
    value: Fixed8,
) -> Result<(), LedgerError> {
    let entry = deltas.entry(asset_id).or_default();
    *entry = entry.checked_add(value).ok_or(LedgerError::Overflow("Issue"))?;
    Ok(())
}
