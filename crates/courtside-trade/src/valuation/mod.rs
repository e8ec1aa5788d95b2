// Valuation engine: asset construction, draft-pick curves, skill scarcity
// and the signed desirability score.

pub mod asset;
pub mod pick_values;
pub mod score;
pub mod skills;

pub use asset::{Asset, PickAsset, PlayerAsset};
pub use pick_values::{get_pick_values, PickValueCache, PickValueTable};
pub use score::{value_change, AssetChange};
