use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HostConfig {
    /// Network address published to peers, `host:port`
    #[serde(default = "default_address")]
    pub address: String,

    /// Stable session identifier; generated when not pinned.
    ///
    /// The sid names this process's status and config nodes, so pinning it
    /// keeps those paths stable across restarts.
    #[serde(default)]
    pub sid: Option<String>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            sid: None,
        }
    }
}

impl HostConfig {
    /// The pinned sid, or a freshly generated one.
    pub fn sid_or_generated(&self) -> String {
        self.sid.clone().unwrap_or_else(|| nanoid::nanoid!())
    }
}

fn default_address() -> String {
    "127.0.0.1:9090".to_string()
}
