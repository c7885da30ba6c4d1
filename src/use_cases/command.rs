// Launch command intake, applied under the same lock the tick loop uses.

use super::types::SharedWorld;
use crate::domain::{LaunchError, LaunchReceipt, MissileTuning, RegionRef};
use tracing::{info, warn};

/// A validated request to fire one missile.
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchCommand {
    pub faction: String,
    pub site_index: usize,
    pub target: RegionRef,
}

// Launch use case with injected world handle and tuning.
#[derive(Clone)]
pub struct LaunchUseCase {
    pub world: SharedWorld,
    pub tuning: MissileTuning,
}

impl LaunchUseCase {
    pub async fn execute(&self, command: LaunchCommand) -> Result<LaunchReceipt, LaunchError> {
        let result = {
            let mut world = self.world.lock().await;
            world.launch(
                &command.faction,
                command.site_index,
                &command.target,
                &self.tuning,
            )
        };

        match &result {
            Ok(receipt) => info!(
                faction = %command.faction,
                site_index = command.site_index,
                target_faction = %command.target.faction,
                target_region = %command.target.region,
                missile_id = receipt.missile_id,
                missiles_remaining = receipt.missiles_remaining,
                eta_secs = receipt.eta_secs,
                "missile launched"
            ),
            // Unknown references warn; exhaustion and range limits are ordinary refusals.
            Err(e) if e.is_validation() => warn!(
                faction = %command.faction,
                site_index = command.site_index,
                error = %e,
                "launch rejected"
            ),
            Err(e) => info!(
                faction = %command.faction,
                site_index = command.site_index,
                error = %e,
                "launch refused"
            ),
        }
        result
    }
}
