//! Pre-launch deposit queue records

use odra::prelude::*;
use odra::casper_types::U256;

/// A depositor's queued base asset, waiting for launch
#[odra::odra_type]
pub struct PreLaunchEntry {
    pub depositor: Address,
    pub amount: U256,
    /// Set once the entry has been converted into receipt tokens
    pub processed: bool,
}

/// Launch state as reported to depositors and keepers
#[odra::odra_type]
pub struct LaunchStatus {
    pub launched: bool,
    pub launch_time: u64,
    /// Milliseconds left until `activate_launch` is allowed, 0 once due
    pub time_until_launch: u64,
}

impl LaunchStatus {
    pub fn at(launched: bool, launch_time: u64, now: u64) -> Self {
        Self {
            launched,
            launch_time,
            time_until_launch: if launched { 0 } else { launch_time.saturating_sub(now) },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_until_launch() {
        assert_eq!(LaunchStatus::at(false, 1_000, 400).time_until_launch, 600);
        assert_eq!(LaunchStatus::at(false, 1_000, 1_500).time_until_launch, 0);
        assert_eq!(LaunchStatus::at(true, 1_000, 400).time_until_launch, 0);
    }
}
