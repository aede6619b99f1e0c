//! LAN address discovery for the startup banner

use std::net::{IpAddr, Ipv4Addr, UdpSocket};

/// Best-effort discovery of the outbound IPv4 address.
///
/// Connects a UDP socket towards a public resolver and reads back the local
/// address the OS picked for that route. No packet is sent. Falls back to
/// `127.0.0.1` on any failure.
pub fn local_ip() -> IpAddr {
    fn probe() -> std::io::Result<IpAddr> {
        let socket = UdpSocket::bind(("0.0.0.0", 0))?;
        socket.connect(("8.8.8.8", 53))?;
        Ok(socket.local_addr()?.ip())
    }

    probe().unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}
