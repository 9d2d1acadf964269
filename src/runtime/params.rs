use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Parameters controlling the dispatchers' behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    /// How long to wait for the root's completion value before giving up.
    pub output_timeout: Duration,
    /// The capacity of each inbound message channel. `None` means unbounded; with a capacity,
    /// delivering to a full inbox blocks the sender.
    pub inbox_capacity: Option<usize>,
    /// Prefix of the dispatcher threads' names. The node ID is appended.
    pub thread_name: String,
}

impl Default for Params {
    fn default() -> Params {
        Params {
            output_timeout: Duration::from_secs(10),
            inbox_capacity: None,
            thread_name: "treecast".to_string(),
        }
    }
}

impl Params {
    /// Returns the same parameters, with the given completion timeout.
    pub fn with_output_timeout(mut self, output_timeout: Duration) -> Self {
        self.output_timeout = output_timeout;
        self
    }

    /// Returns the same parameters, with bounded inboxes of the given capacity.
    pub fn with_inbox_capacity(mut self, capacity: usize) -> Self {
        self.inbox_capacity = Some(capacity);
        self
    }
}
