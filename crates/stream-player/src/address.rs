//! Server address validation.
//!
//! Three accepted shapes: bare `HOST:PORT`, `tcp://HOST:PORT`, and
//! `http(s)://HOST[:PORT]/PATH`. Rules are checked in a fixed order and
//! every rejection carries a user-facing reason.

use thiserror::Error;

/// Why an address was rejected. The `Display` text is shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("address is empty")]
    Empty,
    #[error("invalid URL: {0}")]
    MalformedUrl(String),
    #[error("HTTP address should include a path (e.g. /stream.wav)")]
    MissingPath,
    #[error("TCP address should be in IP:PORT form")]
    NotHostPort,
    #[error("port should contain only digits")]
    PortNotNumeric,
    #[error("port should be between 1 and 65535")]
    PortOutOfRange,
    #[error("IP address should be in X.X.X.X form")]
    BadOctetCount,
    #[error("each IP segment should be 1-3 digits")]
    BadOctetLength,
    #[error("IP should contain only digits and dots")]
    OctetNotNumeric,
    #[error("IP segments should be between 0 and 255")]
    OctetOutOfRange,
}

/// Validate a user-supplied server address.
pub fn validate(addr: &str) -> Result<(), AddressError> {
    if addr.is_empty() {
        return Err(AddressError::Empty);
    }

    if addr.starts_with("http://") || addr.starts_with("https://") {
        let parsed =
            url::Url::parse(addr).map_err(|e| AddressError::MalformedUrl(e.to_string()))?;
        // `Url` normalizes a missing path to "/"; a stream URL needs a
        // real path component.
        if parsed.path().is_empty() || parsed.path() == "/" {
            return Err(AddressError::MissingPath);
        }
        return Ok(());
    }

    let rest = addr.strip_prefix("tcp://").unwrap_or(addr);
    let parts: Vec<&str> = rest.split(':').collect();
    if parts.len() != 2 {
        return Err(AddressError::NotHostPort);
    }

    validate_port(parts[1])?;
    validate_host(parts[0])
}

fn validate_port(port: &str) -> Result<(), AddressError> {
    if port.is_empty() || port.len() > 5 {
        return Err(AddressError::PortOutOfRange);
    }
    if !port.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AddressError::PortNotNumeric);
    }
    // At most 5 digits, so this cannot overflow u32.
    let value: u32 = port.parse().map_err(|_| AddressError::PortNotNumeric)?;
    if !(1..=65_535).contains(&value) {
        return Err(AddressError::PortOutOfRange);
    }
    Ok(())
}

fn validate_host(host: &str) -> Result<(), AddressError> {
    if host == "localhost" {
        return Ok(());
    }
    let octets: Vec<&str> = host.split('.').collect();
    if octets.len() != 4 {
        return Err(AddressError::BadOctetCount);
    }
    for octet in octets {
        if octet.is_empty() || octet.len() > 3 {
            return Err(AddressError::BadOctetLength);
        }
        if !octet.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AddressError::OctetNotNumeric);
        }
        let value: u16 = octet.parse().map_err(|_| AddressError::OctetNotNumeric)?;
        if value > 255 {
            return Err(AddressError::OctetOutOfRange);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_tcp_addresses() {
        for addr in [
            "192.168.1.8:12345",
            "tcp://192.168.1.8:12345",
            "localhost:1",
            "tcp://localhost:65535",
            "0.0.0.0:80",
            "255.255.255.255:9",
        ] {
            assert_eq!(validate(addr), Ok(()), "{addr}");
        }
    }

    #[test]
    fn rejects_empty_address() {
        assert_eq!(validate(""), Err(AddressError::Empty));
    }

    #[test]
    fn rejects_wrong_colon_count() {
        assert_eq!(validate("192.168.1.8"), Err(AddressError::NotHostPort));
        assert_eq!(validate("host:1:2"), Err(AddressError::NotHostPort));
    }

    #[test]
    fn rejects_bad_ports() {
        assert_eq!(validate("localhost:"), Err(AddressError::PortOutOfRange));
        assert_eq!(
            validate("localhost:123456"),
            Err(AddressError::PortOutOfRange)
        );
        assert_eq!(validate("localhost:0"), Err(AddressError::PortOutOfRange));
        assert_eq!(
            validate("localhost:65536"),
            Err(AddressError::PortOutOfRange)
        );
        assert_eq!(validate("localhost:80a"), Err(AddressError::PortNotNumeric));
    }

    #[test]
    fn rejects_bad_hosts() {
        assert_eq!(validate("1.2.3:80"), Err(AddressError::BadOctetCount));
        assert_eq!(validate("1.2.3.4.5:80"), Err(AddressError::BadOctetCount));
        assert_eq!(validate("1.2.3.1024:80"), Err(AddressError::BadOctetLength));
        assert_eq!(validate("1.2.3.25x:80"), Err(AddressError::OctetNotNumeric));
        assert_eq!(validate("1.2.3.256:80"), Err(AddressError::OctetOutOfRange));
        assert_eq!(validate("1.2..4:80"), Err(AddressError::BadOctetLength));
    }

    #[test]
    fn http_requires_a_path() {
        assert_eq!(validate("http://host"), Err(AddressError::MissingPath));
        assert_eq!(validate("http://host/"), Err(AddressError::MissingPath));
        assert_eq!(validate("http://host/stream.wav"), Ok(()));
        assert_eq!(validate("https://example.com/audio/stream"), Ok(()));
        assert_eq!(validate("http://192.168.1.8:8888/stream.wav"), Ok(()));
    }

    #[test]
    fn http_rejects_malformed_urls() {
        assert!(matches!(
            validate("http://"),
            Err(AddressError::MalformedUrl(_))
        ));
    }

    #[test]
    fn diagnostics_are_specific() {
        let err = validate("http://host").unwrap_err();
        assert!(err.to_string().contains("path"));
        let err = validate("1.2.3.256:80").unwrap_err();
        assert!(err.to_string().contains("255"));
    }
}
