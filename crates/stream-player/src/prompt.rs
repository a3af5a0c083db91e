//! Interactive server address acquisition.

use std::io::{self, BufRead, Write};

use crate::address;

/// Address substituted when the user submits an empty line.
pub const DEFAULT_ADDRESS: &str = "192.168.1.8:12345";

/// Prompt on `out` and read lines from `input` until a valid address is
/// entered. An empty line selects [`DEFAULT_ADDRESS`]. Returns `None`
/// when the input reaches end-of-file.
pub fn read_address<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
) -> io::Result<Option<String>> {
    loop {
        write!(out, "Enter server address: ")?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let addr = line.trim();

        if addr.is_empty() {
            writeln!(out, "Using default address: {DEFAULT_ADDRESS}")?;
            return Ok(Some(DEFAULT_ADDRESS.to_string()));
        }

        match address::validate(addr) {
            Ok(()) => return Ok(Some(addr.to_string())),
            Err(reason) => {
                writeln!(out, "   {reason}")?;
                writeln!(out, "Invalid address format. Please try again.")?;
                writeln!(out, "   Examples:")?;
                writeln!(out, "   - TCP: 192.168.1.8:12345 or tcp://192.168.1.8:12345")?;
                writeln!(out, "   - HTTP: http://192.168.1.8:8888/stream.wav")?;
                writeln!(out, "   - HTTPS: https://example.com/audio/stream")?;
                writeln!(out)?;
            }
        }
    }
}
