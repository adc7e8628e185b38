//! Facility and arrival configuration

use crate::core::{DelayRange, FacilityError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a facility
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacilityConfig {
    /// Seats in the waiting room
    pub capacity: usize,
    /// One worker is spawned per name
    pub worker_names: Vec<String>,
    /// How long serving one client takes
    pub service_time: DelayRange,
    /// How long the facility stays open before closing for the day, used by
    /// [`Facility::close_after_time_open`](crate::facility::Facility::close_after_time_open)
    pub time_open: Duration,
}

impl Default for FacilityConfig {
    fn default() -> Self {
        Self {
            capacity: 10,
            worker_names: numbered_names("worker", 3),
            service_time: DelayRange::fixed(Duration::from_millis(1000)),
            time_open: Duration::from_secs(10),
        }
    }
}

fn numbered_names(prefix: &str, count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("{}-{}", prefix, i)).collect()
}

impl FacilityConfig {
    /// Create a configuration with `num_workers` workers named `worker-1`, `worker-2`, ...
    #[must_use]
    pub fn new(num_workers: usize) -> Self {
        Self {
            worker_names: numbered_names("worker", num_workers),
            ..Default::default()
        }
    }

    /// Load a configuration from JSON, filling missing fields with defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| FacilityError::invalid_config("json", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Set the number of seats
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Replace the workers with the given names
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_worker_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.worker_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the workers with `count` workers named `{prefix}-1`, `{prefix}-2`, ...
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_numbered_workers(mut self, prefix: &str, count: usize) -> Self {
        self.worker_names = numbered_names(prefix, count);
        self
    }

    /// Set the service time range
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_service_time(mut self, service_time: DelayRange) -> Self {
        self.service_time = service_time;
        self
    }

    /// Set how long the facility stays open
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_time_open(mut self, time_open: Duration) -> Self {
        self.time_open = time_open;
        self
    }

    /// Number of workers that will be spawned
    pub fn num_workers(&self) -> usize {
        self.worker_names.len()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(FacilityError::invalid_config(
                "capacity",
                "Waiting room must have at least one seat",
            ));
        }
        if self.worker_names.is_empty() {
            return Err(FacilityError::invalid_config(
                "worker_names",
                "At least one worker is required",
            ));
        }
        if let Some(i) = self.worker_names.iter().position(|n| n.trim().is_empty()) {
            return Err(FacilityError::invalid_config(
                "worker_names",
                format!("Worker #{} has an empty name", i + 1),
            ));
        }
        Ok(())
    }
}

/// Configuration for the arrival generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArrivalConfig {
    /// Delay before each arrival
    pub interval: DelayRange,
    /// Stop on its own after this many arrivals
    pub max_arrivals: Option<u64>,
    /// Sequence number of the first client
    pub first_id: u64,
}

impl Default for ArrivalConfig {
    fn default() -> Self {
        Self {
            interval: DelayRange::from_millis(0, 200),
            max_arrivals: None,
            first_id: 1,
        }
    }
}

impl ArrivalConfig {
    /// Arrivals spaced by a delay drawn from `interval`
    #[must_use]
    pub fn new(interval: DelayRange) -> Self {
        Self {
            interval,
            ..Default::default()
        }
    }

    /// Stop after `max` arrivals
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_arrivals(mut self, max: u64) -> Self {
        self.max_arrivals = Some(max);
        self
    }

    /// Number clients starting at `first_id`
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_first_id(mut self, first_id: u64) -> Self {
        self.first_id = first_id;
        self
    }
}
