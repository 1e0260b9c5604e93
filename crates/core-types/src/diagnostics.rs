use std::fmt;
use std::sync::Arc;

/// A host-provided callback receiving human-readable diagnostic messages.
pub type LogCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// The diagnostics sink shared by every component.
///
/// Each message is emitted as a `tracing` event at the matching level and, when
/// the host registered one, forwarded verbatim to its [`LogCallback`]. How the
/// host displays it (console, UI thread, file) is not our concern.
#[derive(Clone, Default)]
pub struct Diagnostics {
    callback: Option<LogCallback>,
}

impl Diagnostics {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        Self {
            callback: Some(Arc::new(callback)),
        }
    }

    /// A sink that only writes to the tracing subscriber.
    pub fn tracing_only() -> Self {
        Self::default()
    }

    pub fn info(&self, message: &str) {
        tracing::info!("{}", message);
        self.forward(message);
    }

    pub fn warn(&self, message: &str) {
        tracing::warn!("{}", message);
        self.forward(message);
    }

    pub fn error(&self, message: &str) {
        tracing::error!("{}", message);
        self.forward(message);
    }

    fn forward(&self, message: &str) {
        if let Some(callback) = &self.callback {
            callback(message);
        }
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("callback", &self.callback.is_some())
            .finish()
    }
}
