//! Asset storage trait.

use crate::StoreError;
use strata_types::{Asset, AssetId};

pub trait AssetStore {
    fn put_asset(&self, asset: &Asset) -> Result<(), StoreError>;

    fn get_asset(&self, id: &AssetId) -> Result<Option<Asset>, StoreError>;
}
