//! UDP transport for command packets.

use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use anyhow::{Context, Result, bail};

use openrover_link_protocol::CommandPacket;

/// One-way UDP link to the vehicle.
///
/// The destination is resolved once at startup; each packet is a single
/// datagram and delivery is fire-and-forget. A failed send is the caller's
/// problem to log and skip, never to retry: the next cycle carries fresher
/// data than any resend would.
#[derive(Debug)]
pub struct CommandLink {
    socket: UdpSocket,
    dest: SocketAddr,
}

impl CommandLink {
    /// Binds an ephemeral local socket and resolves the destination.
    pub fn connect(host: &str, port: u16) -> Result<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", 0)).context("failed to bind local UDP socket")?;
        let dest = match (host, port)
            .to_socket_addrs()
            .with_context(|| format!("failed to resolve '{host}:{port}'"))?
            .next()
        {
            Some(addr) => addr,
            None => bail!("'{host}:{port}' resolved to no addresses"),
        };
        Ok(Self { socket, dest })
    }

    /// Where packets are sent.
    pub fn destination(&self) -> SocketAddr {
        self.dest
    }

    /// Sends one encoded packet.
    ///
    /// # Errors
    ///
    /// The underlying socket error; callers log and drop.
    pub fn send(&self, packet: &CommandPacket) -> io::Result<()> {
        self.socket.send_to(&packet.encode(), self.dest)?;
        Ok(())
    }
}
