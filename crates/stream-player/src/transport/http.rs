//! HTTP/HTTPS transport.
//!
//! Issues a plain GET and streams the response body. The stream is
//! expected to be long-lived and continuous, so no per-call timeout is
//! set; liveness problems show up as read errors and are handled by the
//! supervisor.

use std::io::{self, Read};

use pcm_player::stream::ByteStream;

use super::Transport;

/// One implementation serves both `http` and `https`, parameterized only
/// by the scheme name it reports.
pub struct HttpTransport {
    scheme: &'static str,
}

impl HttpTransport {
    pub fn new(scheme: &'static str) -> Self {
        Self { scheme }
    }
}

impl Transport for HttpTransport {
    fn name(&self) -> &'static str {
        self.scheme
    }

    fn connect(&self, addr: &str) -> io::Result<Box<dyn ByteStream>> {
        let resp = ureq::get(addr)
            .config()
            .http_status_as_error(false)
            .timeout_per_call(None)
            .build()
            .header("Accept", "audio/*")
            .call()
            .map_err(|e| io::Error::other(format!("http request failed: {e}")))?;

        let status = resp.status();
        if status != ureq::http::StatusCode::OK {
            // Dropping the response closes the body immediately.
            return Err(io::Error::other(format!("HTTP {}", status.as_u16())));
        }

        let (_, body) = resp.into_parts();
        Ok(Box::new(HttpBodyStream {
            reader: Some(body.into_reader()),
        }))
    }
}

struct HttpBodyStream {
    reader: Option<ureq::BodyReader<'static>>,
}

impl Read for HttpBodyStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.reader.as_mut() {
            Some(reader) => reader.read(buf),
            None => Ok(0),
        }
    }
}

impl ByteStream for HttpBodyStream {
    fn close(&mut self) -> io::Result<()> {
        // Dropping the reader cancels the underlying request.
        self.reader = None;
        Ok(())
    }
}
