//! Streaming endpoint handed out by the discovery call.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the streaming transport should connect.
///
/// One is produced per connection attempt and dropped when that attempt ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Host, optionally with `:port`.
    pub host: String,
    /// Request path, always starting with `/`.
    pub path: String,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            path: path.into(),
        }
    }

    /// Build the full URL for the given scheme (`wss`, `ws`).
    pub fn url(&self, scheme: &str) -> String {
        format!("{scheme}://{}{}", self.host, self.path)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.host, self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_host_and_path() {
        let ep = Endpoint::new("example.com", "/ws/abc");
        assert_eq!(ep.url("wss"), "wss://example.com/ws/abc");
        assert_eq!(ep.to_string(), "example.com/ws/abc");
    }
}
