/// Gameplay tuning for missiles and impacts.
///
/// Keep this separate from runtime/server configuration (tick rates, buffer sizes, etc.).

#[derive(Debug, Clone, Copy)]
pub struct MissileTuning {
    /// Speed assigned to newly launched missiles, in Mach.
    pub speed_mach: f64,

    /// Altitude reported right after launch, in meters.
    pub launch_altitude_meters: f64,

    /// Degrees travelled per tick for each unit of Mach.
    ///
    /// A flat multiplier, not a real Mach-to-ground-speed conversion.
    pub degrees_per_mach: f64,

    /// Apogee as a fraction of the great-circle path length.
    pub apogee_ratio: f64,

    /// Upper bound for the apogee, in meters.
    pub max_apogee_meters: f64,

    /// Arrival tolerance on latitude, in degrees.
    pub arrival_epsilon_lat: f64,

    /// Arrival tolerance on longitude, in degrees.
    pub arrival_epsilon_lon: f64,

    /// Largest population loss a single impact can cause.
    pub max_casualties_per_impact: u64,
}

impl Default for MissileTuning {
    fn default() -> Self {
        Self {
            speed_mach: 2.5,
            launch_altitude_meters: 1000.0,
            degrees_per_mach: 0.1,
            apogee_ratio: 0.2,
            max_apogee_meters: 1_200_000.0,
            arrival_epsilon_lat: 0.05,
            arrival_epsilon_lon: 0.2,
            max_casualties_per_impact: 4_500_000,
        }
    }
}
