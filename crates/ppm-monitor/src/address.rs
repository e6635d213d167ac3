//! Primary outbound address lookup.

use std::fmt::Write;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};

use log::debug;
use ppm_core::{AddressSource, HostAddress};

/// Any routable address works: connecting a UDP socket only selects a route
/// and sends nothing.
const ROUTE_PROBE: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)), 80);

/// Asks the kernel which local address it would use for outbound traffic.
#[derive(Debug, Clone, Copy)]
pub struct UdpAddressSource {
    probe: SocketAddr,
}

impl UdpAddressSource {
    pub const fn new() -> Self {
        Self { probe: ROUTE_PROBE }
    }

    fn lookup(&self) -> std::io::Result<IpAddr> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
        socket.connect(self.probe)?;
        Ok(socket.local_addr()?.ip())
    }
}

impl Default for UdpAddressSource {
    fn default() -> Self {
        Self::new()
    }
}

impl AddressSource for UdpAddressSource {
    fn primary_address(&mut self) -> Option<HostAddress> {
        let ip = match self.lookup() {
            Ok(ip) => ip,
            Err(e) => {
                debug!("No route for address lookup: {}", e);
                return None;
            }
        };
        if ip.is_unspecified() || ip.is_loopback() {
            return None;
        }

        let mut text = HostAddress::new();
        write!(text, "{ip}").ok()?;
        Some(text)
    }
}
