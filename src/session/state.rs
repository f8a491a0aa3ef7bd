//! Session state owned by the engine

use aio_modem_shared::Mode;

/// WiFi network credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WifiCredentials {
    pub ssid: String,
    pub password: String,
}

/// Broker service identity (user name and access key)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceIdentity {
    pub user: String,
    pub key: String,
}

/// The single command session
///
/// Created with defaults at boot, changed by WIFI/AIO/FEEDS/MODE and LOAD.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    wifi: Option<WifiCredentials>,
    identity: Option<ServiceIdentity>,
    feeds: Vec<String>,
    mode: Mode,
}

impl SessionState {
    /// Create a session with no credentials, no feeds and CSV mode
    pub fn new() -> Self {
        Self::default()
    }

    pub fn wifi(&self) -> Option<&WifiCredentials> {
        self.wifi.as_ref()
    }

    pub fn set_wifi(&mut self, ssid: impl Into<String>, password: impl Into<String>) {
        self.wifi = Some(WifiCredentials {
            ssid: ssid.into(),
            password: password.into(),
        });
    }

    pub fn clear_wifi(&mut self) {
        self.wifi = None;
    }

    pub fn identity(&self) -> Option<&ServiceIdentity> {
        self.identity.as_ref()
    }

    pub fn set_identity(&mut self, user: impl Into<String>, key: impl Into<String>) {
        self.identity = Some(ServiceIdentity {
            user: user.into(),
            key: key.into(),
        });
    }

    pub fn clear_identity(&mut self) {
        self.identity = None;
    }

    pub fn feeds(&self) -> &[String] {
        &self.feeds
    }

    /// Replace the feed list wholesale
    pub fn set_feeds(&mut self, feeds: Vec<String>) {
        self.feeds = feeds;
    }

    /// Feed at a positional index, if it exists
    pub fn feed(&self, index: usize) -> Option<&str> {
        self.feeds.get(index).map(String::as_str)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    /// Broker topic for a named feed: `<user>/feeds/<feed>`
    pub fn feed_topic(&self, feed: &str) -> String {
        let user = self.identity.as_ref().map_or("", |id| id.user.as_str());
        format!("{user}/feeds/{feed}")
    }
}
