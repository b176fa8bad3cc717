//! Resolution notifications.

use crate::models::Config;

/// Callback run after a dependency resolved: `(consumer, dependency)`
pub type ResolvedListener = Box<dyn Fn(&Config, &Config) + Send + Sync>;

/// Ordered list of resolution listeners
#[derive(Default)]
pub struct ResolvedListeners {
    listeners: Vec<ResolvedListener>,
}

impl ResolvedListeners {
    /// Append a listener; listeners run in registration order
    pub fn subscribe(&mut self, listener: ResolvedListener) {
        self.listeners.push(listener);
    }

    /// Run every listener
    pub fn notify(&self, consumer: &Config, dependency: &Config) {
        for listener in &self.listeners {
            listener(consumer, dependency);
        }
    }

    /// Number of registered listeners
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Whether no listener is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl std::fmt::Debug for ResolvedListeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedListeners").field("len", &self.listeners.len()).finish()
    }
}
