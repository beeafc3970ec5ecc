//! Thread configuration.

use serde::{Deserialize, Serialize};

use threadgate_access::AccessConfig;

use crate::error::{Result, ThreadError};

/// Configuration of a [`Thread`](crate::Thread).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadConfig {
    /// Thread name. Both logs of the thread are named after it.
    pub name: String,

    /// Who governs the thread.
    pub access: AccessConfig,

    /// Whether entry signatures are checked before the access controllers
    /// run.
    #[serde(default = "default_verify_entry_signatures")]
    pub verify_entry_signatures: bool,
}

fn default_verify_entry_signatures() -> bool {
    true
}

impl ThreadConfig {
    pub fn new(name: impl Into<String>, access: AccessConfig) -> Self {
        Self {
            name: name.into(),
            access,
            verify_entry_signatures: default_verify_entry_signatures(),
        }
    }

    pub fn with_verify_entry_signatures(mut self, verify: bool) -> Self {
        self.verify_entry_signatures = verify;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(ThreadError::InvalidOperation("thread name is empty".into()));
        }
        self.access.validate()?;
        Ok(())
    }
}
