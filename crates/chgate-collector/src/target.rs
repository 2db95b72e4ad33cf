//! Scrape target validation.
//!
//! A target is a bare network location, `host:port`, with an explicit
//! non-zero port. IPv6 hosts are bracketed (`[::1]:8123`). Schemes, paths,
//! userinfo and whitespace are rejected; the scheme comes from the
//! gateway's `--scrape_uri`, never from the request.

use std::fmt;

use crate::error::TargetError;

/// A validated `host:port` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScrapeTarget {
    host: String,
    port: u16,
}

impl ScrapeTarget {
    pub fn parse(raw: &str) -> Result<Self, TargetError> {
        if raw.is_empty() {
            return Err(TargetError::new(raw, "empty target"));
        }
        if raw.contains("://") {
            return Err(TargetError::new(raw, "expected host:port, not a URL"));
        }
        if raw
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '/' | '?' | '#' | '@' | '\\'))
        {
            return Err(TargetError::new(raw, "unexpected character"));
        }

        let (host, port) = if raw.starts_with('[') {
            let (host, port) = raw
                .split_once("]:")
                .ok_or_else(|| TargetError::new(raw, "missing port"))?;
            let inner = &host[1..];
            if inner.is_empty() || inner.contains('[') || inner.contains(']') {
                return Err(TargetError::new(raw, "malformed IPv6 host"));
            }
            (format!("{host}]"), port)
        } else {
            let (host, port) = raw
                .rsplit_once(':')
                .ok_or_else(|| TargetError::new(raw, "missing port"))?;
            if host.contains(':') {
                return Err(TargetError::new(raw, "IPv6 hosts must be bracketed"));
            }
            if host.contains('[') || host.contains(']') {
                return Err(TargetError::new(raw, "malformed host"));
            }
            (host.to_string(), port)
        };

        if host.is_empty() {
            return Err(TargetError::new(raw, "missing host"));
        }
        let port: u16 = port
            .parse()
            .map_err(|_| TargetError::new(raw, "port is not a number in 1-65535"))?;
        if port == 0 {
            return Err(TargetError::new(raw, "port is not a number in 1-65535"));
        }

        Ok(Self { host, port })
    }

    /// Host part; IPv6 addresses keep their brackets.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for ScrapeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hostname_and_port() {
        let t = ScrapeTarget::parse("db.internal:8123").unwrap();
        assert_eq!(t.host(), "db.internal");
        assert_eq!(t.port(), 8123);
        assert_eq!(t.to_string(), "db.internal:8123");
    }

    #[test]
    fn parses_ipv4_and_ipv6() {
        assert_eq!(ScrapeTarget::parse("10.0.0.7:9000").unwrap().host(), "10.0.0.7");
        let v6 = ScrapeTarget::parse("[::1]:8123").unwrap();
        assert_eq!(v6.host(), "[::1]");
        assert_eq!(v6.port(), 8123);
        assert_eq!(v6.to_string(), "[::1]:8123");
    }

    #[test]
    fn rejects_missing_parts() {
        assert!(ScrapeTarget::parse("").is_err());
        assert!(ScrapeTarget::parse("db.internal").is_err());
        assert!(ScrapeTarget::parse(":8123").is_err());
        assert!(ScrapeTarget::parse("db.internal:").is_err());
        assert!(ScrapeTarget::parse("[::1]").is_err());
        assert!(ScrapeTarget::parse("[]:8123").is_err());
    }

    #[test]
    fn rejects_bad_ports() {
        assert!(ScrapeTarget::parse("db:0").is_err());
        assert!(ScrapeTarget::parse("db:65536").is_err());
        assert!(ScrapeTarget::parse("db:http").is_err());
        assert!(ScrapeTarget::parse("db:-1").is_err());
    }

    #[test]
    fn rejects_urls_and_junk() {
        assert!(ScrapeTarget::parse("http://db:8123").is_err());
        assert!(ScrapeTarget::parse("db:8123/path").is_err());
        assert!(ScrapeTarget::parse("user@db:8123").is_err());
        assert!(ScrapeTarget::parse("db :8123").is_err());
        assert!(ScrapeTarget::parse("::1:8123").is_err());
    }

    #[test]
    fn error_names_the_target() {
        let err = ScrapeTarget::parse("nope").unwrap_err();
        assert_eq!(err.target, "nope");
        assert!(err.to_string().contains("\"nope\""));
    }
}
