//! Minimal HTTP-ish client used by the scanner tests.

use std::collections::HashMap;
use std::io;

/// Connection settings for one host.
#[derive(Debug, Clone)]
pub struct Client {
    host: String,
    headers: HashMap<String, String>,
}

impl Client {
    /// Create a client for `host`.
    pub fn new(host: &str) -> Self {
        Self {
            host: host.to_string(),
            headers: HashMap::new(),
        }
    }

    /// Issue a GET request for `p` and return the response body.
    pub fn get(&self, p: &str) -> Result<String, io::Error> {
        if p.is_empty() {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "empty path"));
        }
        let mut body = format!("GET {}/{}", self.host, p);
        for (name, value) in &self.headers {
            body.push_str(&format!("\n{}: {}", name, value));
        }
        Ok(body)
    }

    pub(crate) fn header<K, V>(mut self, name: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Build the default client.
pub fn default_client() -> Client {
    let build = |host: &str| Client::new(host);
    build("localhost")
}
