use hostres_application::scheduler::InvalidationReason;
use tokio::sync::broadcast;
use tracing::debug;

const CHANNEL_CAPACITY: usize = 16;

/// Fan-out of network and DNS configuration change notifications.
///
/// Every manager built with the same notifier subscribes to it and
/// invalidates its caches on each event.
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
    sender: broadcast::Sender<InvalidationReason>,
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeNotifier {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn notify_network_change(&self) {
        self.notify(InvalidationReason::NetworkChange);
    }

    pub fn notify_dns_config_change(&self) {
        self.notify(InvalidationReason::DnsConfigChange);
    }

    /// Returns the number of subscribers reached.
    pub fn notify(&self, reason: InvalidationReason) -> usize {
        let reached = self.sender.send(reason).unwrap_or(0);
        debug!(reason = reason.as_str(), subscribers = reached, "Change notification sent");
        reached
    }

    pub fn subscribe(&self) -> broadcast::Receiver<InvalidationReason> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
