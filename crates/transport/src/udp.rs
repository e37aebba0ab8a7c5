//! UdpTransport - address-reusing, non-blocking datagram socket

use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};

use bytes::{Bytes, BytesMut};
use socket2::{Domain, Protocol, Socket, Type};
use tracing::{debug, info, instrument, trace};

use crate::error::TransportError;

/// UDP endpoint with last-peer tracking
///
/// Owned by the control loop; every method is called from that one thread.
pub struct UdpTransport {
    socket: UdpSocket,
    peer: Option<SocketAddr>,
    buf: BytesMut,
    max_datagram_size: usize,
}

impl UdpTransport {
    /// Bind a datagram socket with address reuse enabled, in non-blocking mode
    #[instrument(name = "udp_transport_bind")]
    pub fn bind(addr: SocketAddr, max_datagram_size: usize) -> Result<Self, TransportError> {
        let socket = Self::open(addr).map_err(|source| TransportError::Bind { addr, source })?;
        let local = socket.local_addr()?;

        info!(local = %local, max_datagram_size, "UDP transport bound");

        Ok(Self {
            socket,
            peer: None,
            buf: BytesMut::with_capacity(max_datagram_size),
            max_datagram_size,
        })
    }

    fn open(addr: SocketAddr) -> std::io::Result<UdpSocket> {
        let socket = Socket::new(Domain::for_address(addr), Type::DGRAM, Some(Protocol::UDP))?;
        socket.set_reuse_address(true)?;
        socket.bind(&addr.into())?;
        socket.set_nonblocking(true)?;
        Ok(socket.into())
    }

    /// Poll for one datagram without blocking
    ///
    /// Records the sender as the reply peer. Returns `None` when nothing is
    /// pending or the receive failed.
    pub fn try_receive(&mut self) -> Option<Bytes> {
        self.buf.clear();
        self.buf.resize(self.max_datagram_size, 0);

        match self.socket.recv_from(&mut self.buf) {
            Ok((len, from)) => {
                if self.peer != Some(from) {
                    debug!(peer = %from, "New control peer");
                }
                self.peer = Some(from);
                self.buf.truncate(len);
                trace!(peer = %from, bytes = len, "Datagram received");
                Some(self.buf.split().freeze())
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => None,
            Err(e) => {
                debug!(error = %e, "UDP receive failed");
                None
            }
        }
    }

    /// Send to the last peer
    pub fn send(&self, payload: &[u8]) -> Result<usize, TransportError> {
        let peer = self.peer.ok_or(TransportError::NoPeer)?;
        self.send_to(payload, peer)
    }

    /// Send to an explicit destination
    pub fn send_to(&self, payload: &[u8], peer: SocketAddr) -> Result<usize, TransportError> {
        let sent = self
            .socket
            .send_to(payload, peer)
            .map_err(|source| TransportError::Send { peer, source })?;
        trace!(peer = %peer, bytes = sent, "Datagram sent");
        Ok(sent)
    }

    /// Locally bound address
    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        Ok(self.socket.local_addr()?)
    }

    /// Last peer a datagram was received from
    pub fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }
}

impl std::fmt::Debug for UdpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UdpTransport")
            .field("local", &self.socket.local_addr().ok())
            .field("peer", &self.peer)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn loopback() -> SocketAddr {
        "127.0.0.1:0".parse().unwrap()
    }

    fn receive_within(transport: &mut UdpTransport, timeout: Duration) -> Option<Bytes> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Some(bytes) = transport.try_receive() {
                return Some(bytes);
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        None
    }

    #[test]
    fn test_try_receive_empty_is_none() {
        let mut transport = UdpTransport::bind(loopback(), 1024).unwrap();
        assert!(transport.try_receive().is_none());
        assert!(transport.peer().is_none());
    }

    #[test]
    fn test_receive_records_peer_and_replies() {
        let mut transport = UdpTransport::bind(loopback(), 1024).unwrap();
        let server = transport.local_addr().unwrap();

        let client = UdpSocket::bind(loopback()).unwrap();
        client
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        client.send_to(b"hello", server).unwrap();

        let bytes = receive_within(&mut transport, Duration::from_secs(2)).unwrap();
        assert_eq!(&bytes[..], b"hello");
        assert_eq!(transport.peer(), Some(client.local_addr().unwrap()));

        transport.send(b"world").unwrap();
        let mut buf = [0u8; 16];
        let (len, from) = client.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..len], b"world");
        assert_eq!(from, server);
    }

    #[test]
    fn test_send_without_peer_fails() {
        let transport = UdpTransport::bind(loopback(), 1024).unwrap();
        assert!(matches!(transport.send(b"x"), Err(TransportError::NoPeer)));
    }

    #[test]
    fn test_peer_follows_latest_sender() {
        let mut transport = UdpTransport::bind(loopback(), 1024).unwrap();
        let server = transport.local_addr().unwrap();

        let first = UdpSocket::bind(loopback()).unwrap();
        let second = UdpSocket::bind(loopback()).unwrap();

        first.send_to(b"a", server).unwrap();
        receive_within(&mut transport, Duration::from_secs(2)).unwrap();
        second.send_to(b"b", server).unwrap();
        receive_within(&mut transport, Duration::from_secs(2)).unwrap();

        assert_eq!(transport.peer(), Some(second.local_addr().unwrap()));
    }

    #[test]
    fn test_oversized_datagram_truncated() {
        let mut transport = UdpTransport::bind(loopback(), 16).unwrap();
        let server = transport.local_addr().unwrap();

        let client = UdpSocket::bind(loopback()).unwrap();
        client.send_to(&[7u8; 64], server).unwrap();

        // Linux truncates silently; other platforms may surface an error.
        if let Some(bytes) = receive_within(&mut transport, Duration::from_secs(2)) {
            assert_eq!(bytes.len(), 16);
        }
    }

    #[test]
    fn test_bind_conflict_reports_address() {
        let taken = UdpSocket::bind(loopback()).unwrap();
        let addr = taken.local_addr().unwrap();

        // The occupying socket did not opt into reuse, so this must fail on
        // Linux; on platforms where it succeeds there is nothing to check.
        if let Err(err) = UdpTransport::bind(addr, 1024) {
            assert!(matches!(err, TransportError::Bind { .. }));
            assert!(err.to_string().contains(&addr.to_string()));
        }
    }
}
