//! TCP transport.

use std::io::{self, Read};
use std::net::{Shutdown, TcpStream};

use pcm_player::stream::ByteStream;

use super::Transport;

/// Connects a plain TCP socket and hands it over as the stream.
///
/// Nagle buffering is disabled and keep-alive enabled before the socket
/// is returned; DNS failures, refusals, and timeouts surface as connect
/// errors.
pub struct TcpTransport;

impl Transport for TcpTransport {
    fn name(&self) -> &'static str {
        "tcp"
    }

    fn connect(&self, addr: &str) -> io::Result<Box<dyn ByteStream>> {
        let target = addr.strip_prefix("tcp://").unwrap_or(addr);
        let stream = TcpStream::connect(target)?;
        stream.set_nodelay(true)?;
        socket2::SockRef::from(&stream).set_keepalive(true)?;
        Ok(Box::new(TcpByteStream { inner: stream }))
    }
}

struct TcpByteStream {
    inner: TcpStream,
}

impl Read for TcpByteStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl ByteStream for TcpByteStream {
    fn close(&mut self) -> io::Result<()> {
        match self.inner.shutdown(Shutdown::Both) {
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::net::TcpListener;

    #[test]
    fn connects_and_reads_with_or_without_prefix() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("local addr");
        std::thread::spawn(move || {
            for conn in listener.incoming().take(2) {
                let mut conn = conn.expect("accept");
                conn.write_all(b"pcm").expect("write");
            }
        });

        for target in [format!("{addr}"), format!("tcp://{addr}")] {
            let mut stream = TcpTransport.connect(&target).expect("connect");
            let mut buf = [0u8; 8];
            let n = stream.read(&mut buf).expect("read");
            assert_eq!(&buf[..n], b"pcm");
            stream.close().expect("close");
        }
    }

    #[test]
    fn refused_connection_is_an_error() {
        // Bind-then-drop guarantees nothing listens on the port.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
            listener.local_addr().expect("local addr").port()
        };
        let result = TcpTransport.connect(&format!("127.0.0.1:{port}"));
        assert!(result.is_err());
    }
}
