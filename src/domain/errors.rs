use std::fmt;

// Domain-level errors for launch commands.
#[derive(Debug, Clone, PartialEq)]
pub enum LaunchError {
    UnknownFaction { faction: String },
    UnknownLaunchSite { faction: String, site_index: usize },
    UnknownTarget { faction: String, region: String },
    // The site has no ordnance left.
    Exhausted { site_index: usize },
    OutOfRange { distance_meters: f64, range_meters: f64 },
    InvalidSpeed,
}

impl LaunchError {
    /// True for rejections caused by references to entities that do not exist.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            LaunchError::UnknownFaction { .. }
                | LaunchError::UnknownLaunchSite { .. }
                | LaunchError::UnknownTarget { .. }
        )
    }
}

impl fmt::Display for LaunchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaunchError::UnknownFaction { faction } => write!(f, "unknown faction '{faction}'"),
            LaunchError::UnknownLaunchSite {
                faction,
                site_index,
            } => write!(f, "faction '{faction}' has no launch site {site_index}"),
            LaunchError::UnknownTarget { faction, region } => {
                write!(f, "unknown target '{region}' in '{faction}'")
            }
            LaunchError::Exhausted { site_index } => {
                write!(f, "launch site {site_index} has no missiles left")
            }
            LaunchError::OutOfRange {
                distance_meters,
                range_meters,
            } => write!(
                f,
                "target is {distance_meters:.0} m away, site range is {range_meters:.0} m"
            ),
            LaunchError::InvalidSpeed => write!(f, "missile speed must be positive"),
        }
    }
}
