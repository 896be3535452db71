//! Static minion list.

use async_trait::async_trait;

use crate::{MinionLister, Result};

/// A minion lister over a fixed set of hosts, in configured order.
#[derive(Debug, Clone, Default)]
pub struct StaticMinionLister {
    minions: Vec<String>,
}

impl StaticMinionLister {
    /// Create a lister over `minions`.
    pub fn new<I, S>(minions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            minions: minions.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a comma-separated host list, skipping blank entries.
    #[must_use]
    pub fn from_csv(list: &str) -> Self {
        Self::new(
            list.split(',')
                .map(str::trim)
                .filter(|host| !host.is_empty()),
        )
    }
}

#[async_trait]
impl MinionLister for StaticMinionLister {
    async fn list(&self) -> Result<Vec<String>> {
        Ok(self.minions.clone())
    }
}
