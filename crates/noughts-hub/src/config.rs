//! Hub configuration.

/// Configuration for the connection hub.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Capacity of each group actor's command mailbox. When it is full,
    /// senders wait.
    pub mailbox_size: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self { mailbox_size: 64 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hub_config_default() {
        assert_eq!(HubConfig::default().mailbox_size, 64);
    }
}
