//! Byte-stream contract shared by transports, decorators, and the sink.

use std::io::{self, Read};

/// A readable, closable byte stream.
///
/// `close` releases the underlying resource (socket, HTTP response body).
/// It is called at most once; reading after close is not supported.
pub trait ByteStream: Read + Send {
    fn close(&mut self) -> io::Result<()>;
}

impl std::fmt::Debug for dyn ByteStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ByteStream")
    }
}

impl ByteStream for Box<dyn ByteStream> {
    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}
