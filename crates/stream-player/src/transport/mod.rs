//! Transports: turn a server address into a readable byte stream.

mod http;
mod tcp;

pub use http::HttpTransport;
pub use tcp::TcpTransport;

use std::collections::HashMap;
use std::io;

use pcm_player::stream::ByteStream;

/// A connector for one protocol. Connect failures are not retried here;
/// the supervisor owns retries.
pub trait Transport: Send + Sync {
    fn name(&self) -> &'static str;
    fn connect(&self, addr: &str) -> io::Result<Box<dyn ByteStream>>;
}

/// Maps URL schemes to transports.
///
/// Selection is purely prefix-based and never fails: an address with no
/// recognized scheme (or a scheme nobody registered) falls back to TCP,
/// which then fails at connect time if the address is not actually a TCP
/// endpoint.
pub struct TransportRegistry {
    entries: HashMap<String, Box<dyn Transport>>,
    fallback: TcpTransport,
}

impl TransportRegistry {
    /// An empty registry. Selection still works: everything resolves to
    /// the TCP fallback.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            fallback: TcpTransport,
        }
    }

    /// Register a transport for a scheme. The last registration for a
    /// given scheme wins.
    pub fn register(&mut self, scheme: &str, transport: Box<dyn Transport>) {
        self.entries.insert(scheme.to_string(), transport);
    }

    /// Pick the transport for an address by scheme prefix.
    pub fn select(&self, addr: &str) -> &dyn Transport {
        self.entries
            .get(scheme_of(addr))
            .map(|t| t.as_ref())
            .unwrap_or(&self.fallback)
    }
}

impl Default for TransportRegistry {
    /// Registry with the built-in transports: `tcp`, `http`, `https`.
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register("tcp", Box::new(TcpTransport));
        registry.register("http", Box::new(HttpTransport::new("http")));
        registry.register("https", Box::new(HttpTransport::new("https")));
        registry
    }
}

fn scheme_of(addr: &str) -> &'static str {
    if addr.starts_with("http://") {
        "http"
    } else if addr.starts_with("https://") {
        "https"
    } else {
        "tcp"
    }
}
