use crate::DomainError;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::atomic::{AtomicU16, Ordering};

pub const DEFAULT_DNS_PORT: u16 = 53;
pub const LEGACY_UDP_PAYLOAD_SIZE: u16 = 512;

/// A configured upstream endpoint.
///
/// The supported UDP payload size starts at the classic 512 octets and is
/// raised from the OPT records the server sends back. Concurrent updates are
/// last-write-wins.
#[derive(Debug)]
pub struct NameServer {
    addr: SocketAddr,
    udp_payload_size: AtomicU16,
}

impl NameServer {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            udp_payload_size: AtomicU16::new(LEGACY_UDP_PAYLOAD_SIZE),
        }
    }

    pub fn from_ip(ip: IpAddr) -> Self {
        Self::new(SocketAddr::new(ip, DEFAULT_DNS_PORT))
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn supported_udp_payload_size(&self) -> u16 {
        self.udp_payload_size.load(Ordering::Relaxed)
    }

    /// Records the payload size advertised by the server. Values below 512
    /// are ignored.
    pub fn update_udp_payload_size(&self, size: u16) {
        if size >= LEGACY_UDP_PAYLOAD_SIZE {
            self.udp_payload_size.store(size, Ordering::Relaxed);
        }
    }
}

impl Clone for NameServer {
    fn clone(&self) -> Self {
        Self {
            addr: self.addr,
            udp_payload_size: AtomicU16::new(self.supported_udp_payload_size()),
        }
    }
}

impl PartialEq for NameServer {
    fn eq(&self, other: &Self) -> bool {
        self.addr == other.addr
    }
}

impl Eq for NameServer {}

impl fmt::Display for NameServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.addr)
    }
}

impl From<SocketAddr> for NameServer {
    fn from(addr: SocketAddr) -> Self {
        Self::new(addr)
    }
}

impl From<IpAddr> for NameServer {
    fn from(ip: IpAddr) -> Self {
        Self::from_ip(ip)
    }
}

fn parse_host_port(s: &str) -> Option<(&str, u16)> {
    if s.starts_with('[') {
        let end = s.find(']')?;
        let host = &s[1..end];
        let rest = &s[end + 1..];
        if rest.is_empty() {
            return Some((host, DEFAULT_DNS_PORT));
        }
        let port = rest.strip_prefix(':')?.parse::<u16>().ok()?;
        Some((host, port))
    } else {
        let (host, port_str) = s.rsplit_once(':')?;
        let port = port_str.parse::<u16>().ok()?;
        Some((host, port))
    }
}

impl FromStr for NameServer {
    type Err = DomainError;

    /// Accepts `IP`, `IP:PORT`, `[IPv6]` and `[IPv6]:PORT`. Host names are
    /// rejected: resolving them would need a resolver.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(ip) = s.parse::<IpAddr>() {
            return Ok(Self::from_ip(ip));
        }
        if let Ok(addr) = s.parse::<SocketAddr>() {
            return Ok(Self::new(addr));
        }
        match parse_host_port(s) {
            Some((host, port)) => host
                .parse::<IpAddr>()
                .map(|ip| Self::new(SocketAddr::new(ip, port)))
                .map_err(|_| {
                    DomainError::InvalidNameServer(format!(
                        "'{}' is not an IP address (host names are not supported)",
                        s
                    ))
                }),
            None => Err(DomainError::InvalidNameServer(format!(
                "Invalid address '{}'. Expected 'IP', 'IP:PORT' or '[IPv6]:PORT'",
                s
            ))),
        }
    }
}
