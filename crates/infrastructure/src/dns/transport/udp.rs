use super::DnsTransport;
use crate::dns::message::response_id;
use async_trait::async_trait;
use hostres_domain::{StageError, StageErrorKind};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Maximum UDP DNS response size with EDNS(0)
const MAX_UDP_RESPONSE_SIZE: usize = 4096;

/// DNS over UDP. Each query uses a fresh ephemeral socket.
///
/// Datagrams whose id does not match the query are dropped and the wait
/// continues until the deadline.
pub struct UdpTransport {
    server_addr: SocketAddr,
}

impl UdpTransport {
    pub fn new(server_addr: SocketAddr) -> Self {
        Self { server_addr }
    }

    pub fn server_addr(&self) -> SocketAddr {
        self.server_addr
    }

    fn bind_addr(&self) -> SocketAddr {
        if self.server_addr.is_ipv4() {
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
        } else {
            SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
        }
    }
}

#[async_trait]
impl DnsTransport for UdpTransport {
    async fn exchange(&self, query: &[u8], timeout: Duration) -> Result<Vec<u8>, StageError> {
        let deadline = Instant::now() + timeout;
        let expected_id = response_id(query);

        let socket = UdpSocket::bind(self.bind_addr()).await.map_err(|e| {
            StageError::new(StageErrorKind::Network, format!("failed to bind UDP socket: {e}"))
        })?;

        let bytes_sent = socket
            .send_to(query, self.server_addr)
            .await
            .map_err(|e| {
                StageError::new(
                    StageErrorKind::Network,
                    format!("failed to send UDP query to {}: {e}", self.server_addr),
                )
            })?;

        debug!(server = %self.server_addr, bytes_sent, "UDP query sent");

        let mut recv_buf = vec![0u8; MAX_UDP_RESPONSE_SIZE];
        loop {
            let (bytes_received, from_addr) =
                tokio::time::timeout_at(deadline, socket.recv_from(&mut recv_buf))
                    .await
                    .map_err(|_| {
                        StageError::timeout(format!(
                            "no UDP response from {} within {:?}",
                            self.server_addr, timeout
                        ))
                    })?
                    .map_err(|e| {
                        StageError::new(
                            StageErrorKind::Network,
                            format!("failed to receive UDP response from {}: {e}", self.server_addr),
                        )
                    })?;

            if !self.server_addr.ip().is_multicast() && from_addr.ip() != self.server_addr.ip() {
                warn!(
                    expected = %self.server_addr,
                    received_from = %from_addr,
                    "UDP response from unexpected source"
                );
                continue;
            }

            let received = &recv_buf[..bytes_received];
            if expected_id.is_some() && response_id(received) != expected_id {
                debug!(server = %self.server_addr, "Dropping UDP response with mismatched id");
                continue;
            }

            debug!(server = %self.server_addr, bytes_received, "UDP response received");
            return Ok(received.to_vec());
        }
    }

    fn protocol(&self) -> &'static str {
        "udp"
    }
}
