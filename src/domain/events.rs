// Discrete events produced while advancing the world by one tick.

use super::state::RegionRef;

#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    // A missile reached its target region this tick.
    Impact {
        missile_id: u64,
        origin_faction: String,
        target: RegionRef,
    },
    // Population change caused by an impact.
    Casualties {
        region: RegionRef,
        before: u64,
        after: u64,
    },
}
