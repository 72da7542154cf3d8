//! Quota policy table and its YAML configuration format.
//!
//! Every category always has a policy: the table starts from built-in
//! defaults and a configuration file can only retune existing entries.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use super::category::Category;
use crate::error::{QuotaguardError, Result};

/// Longest window a policy may use.
pub const MAX_WINDOW: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// The quota applied to one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaPolicy {
    /// Length of the fixed window
    pub window: Duration,
    /// Requests admitted per window
    pub max_requests: u64,
    /// Text returned to the client when the quota is exhausted
    pub message: String,
}

impl QuotaPolicy {
    pub fn new(window: Duration, max_requests: u64, message: impl Into<String>) -> Self {
        Self {
            window,
            max_requests,
            message: message.into(),
        }
    }

    /// Window length in milliseconds. Saturates for windows that a validated
    /// policy cannot hold.
    pub fn window_ms(&self) -> u64 {
        u64::try_from(self.window.as_millis()).unwrap_or(u64::MAX)
    }

    fn validate(&self, category: Category) -> Result<()> {
        if self.max_requests == 0 {
            return Err(QuotaguardError::Config(format!(
                "policy for '{}' must admit at least one request",
                category
            )));
        }
        if self.window.is_zero() {
            return Err(QuotaguardError::Config(format!(
                "policy for '{}' must have a non-zero window",
                category
            )));
        }
        if self.window > MAX_WINDOW {
            return Err(QuotaguardError::Config(format!(
                "policy for '{}' has a window longer than {} seconds",
                category,
                MAX_WINDOW.as_secs()
            )));
        }
        Ok(())
    }
}

/// One policy per category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyTable {
    policies: [QuotaPolicy; Category::ALL.len()],
}

impl Default for PolicyTable {
    fn default() -> Self {
        let minute = Duration::from_secs(60);
        let hour = Duration::from_secs(3600);
        Self {
            policies: [
                QuotaPolicy::new(
                    minute,
                    5,
                    "Too many authentication attempts. Please try again later.",
                ),
                QuotaPolicy::new(hour, 10, "Upload limit reached. Please try again later."),
                QuotaPolicy::new(minute, 100, "Too many requests. Please slow down."),
                QuotaPolicy::new(
                    minute,
                    20,
                    "Too many business updates. Please try again shortly.",
                ),
                QuotaPolicy::new(minute, 30, "You're sending messages too quickly."),
                QuotaPolicy::new(hour, 20, "Image upload limit reached. Please try again later."),
            ],
        }
    }
}

/// A single entry in the policy file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyOverride {
    /// Window length in seconds
    pub window_secs: u64,
    /// Requests admitted per window
    pub max_requests: u64,
    /// Optional replacement rejection message
    #[serde(default)]
    pub message: Option<String>,
}

/// The policy file: category name to override.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyFile {
    #[serde(default)]
    pub policies: HashMap<String, PolicyOverride>,
}

impl PolicyTable {
    /// Look up the policy for a category.
    pub fn get(&self, category: Category) -> &QuotaPolicy {
        &self.policies[category.index()]
    }

    /// Replace the policy for a category.
    pub fn set(&mut self, category: Category, policy: QuotaPolicy) -> Result<()> {
        policy.validate(category)?;
        self.policies[category.index()] = policy;
        Ok(())
    }

    /// Load policies from a YAML file, merged over the defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading quota policies");

        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load policies from a YAML string, merged over the defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let file: PolicyFile = serde_yaml::from_str(yaml)
            .map_err(|e| QuotaguardError::Config(format!("Failed to parse policy file: {}", e)))?;

        let mut table = PolicyTable::default();
        for (name, entry) in file.policies {
            let category: Category = name.parse().map_err(QuotaguardError::Config)?;
            let message = entry
                .message
                .unwrap_or_else(|| table.get(category).message.clone());
            table.set(
                category,
                QuotaPolicy::new(
                    Duration::from_secs(entry.window_secs),
                    entry.max_requests,
                    message,
                ),
            )?;
        }
        Ok(table)
    }
}
