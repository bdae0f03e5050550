use std::{path::PathBuf, time::Duration};

use crate::error::DashboardError;

pub const DEFAULT_STATE_DIR: &str = ".repairdesk";

/// Runtime behaviour of the dashboard pipeline.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Holds the payload cache and the persisted session.
    pub state_dir: PathBuf,
    pub refresh_interval: Duration,
    pub counter_tick: Duration,
    pub customer_counter_duration: Duration,
    pub challan_counter_duration: Duration,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
            refresh_interval: Duration::from_secs(60),
            counter_tick: Duration::from_millis(20),
            customer_counter_duration: Duration::from_millis(1_300),
            challan_counter_duration: Duration::from_millis(1_100),
        }
    }
}

impl DashboardConfig {
    pub fn validate(&self) -> Result<(), DashboardError> {
        if self.refresh_interval.is_zero() {
            return Err(DashboardError::InvalidConfig(
                "refresh interval must be greater than zero".to_string(),
            ));
        }
        if self.counter_tick.is_zero() {
            return Err(DashboardError::InvalidConfig(
                "counter tick must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn session_file(&self) -> PathBuf {
        self.state_dir.join("session.json")
    }
}
