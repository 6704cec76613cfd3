#![allow(dead_code)]
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::oneshot;

const TYPE_A: u16 = 1;

/// How the mock server answers every query.
#[derive(Debug, Clone, Copy)]
pub enum MockAnswer {
    /// A queries get one record, other types an empty NOERROR answer.
    Address(Ipv4Addr),
    NxDomain,
    ServFail,
    /// Never replies.
    Silent,
    /// Single-label names resolve like `Address`, longer names get SERVFAIL.
    SingleLabelOnly(Ipv4Addr),
}

/// Minimal UDP DNS server for tests.
pub struct MockDnsServer {
    addr: SocketAddr,
    queries: Arc<AtomicUsize>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockDnsServer {
    /// Starts a server on an ephemeral loopback port.
    pub async fn start(answer: MockAnswer) -> Result<Self, std::io::Error> {
        let socket = UdpSocket::bind("127.0.0.1:0").await?;
        let addr = socket.local_addr()?;
        let queries = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&queries);

        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            let mut buf = vec![0u8; 512];

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => {
                        break;
                    }
                    result = socket.recv_from(&mut buf) => {
                        if let Ok((len, peer)) = result {
                            counter.fetch_add(1, Ordering::SeqCst);
                            if let Some(response) = Self::build_response(&buf[..len], answer) {
                                let _ = socket.send_to(&response, peer).await;
                            }
                        }
                    }
                }
            }
        });

        Ok(Self {
            addr,
            queries,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn query_type(query: &[u8]) -> Option<u16> {
        let mut pos = 12;
        while pos < query.len() && query[pos] != 0 {
            pos += query[pos] as usize + 1;
        }
        let qtype = query.get(pos + 1..pos + 3)?;
        Some(u16::from_be_bytes([qtype[0], qtype[1]]))
    }

    fn label_count(query: &[u8]) -> usize {
        let mut pos = 12;
        let mut labels = 0;
        while pos < query.len() && query[pos] != 0 {
            pos += query[pos] as usize + 1;
            labels += 1;
        }
        labels
    }

    fn build_response(query: &[u8], answer: MockAnswer) -> Option<Vec<u8>> {
        if query.len() < 12 {
            return None;
        }

        let answer = match answer {
            MockAnswer::SingleLabelOnly(ip) if Self::label_count(query) == 1 => {
                MockAnswer::Address(ip)
            }
            MockAnswer::SingleLabelOnly(_) => MockAnswer::ServFail,
            other => other,
        };

        let (rcode, record) = match answer {
            MockAnswer::Silent => return None,
            MockAnswer::NxDomain => (3u8, None),
            MockAnswer::ServFail => (2u8, None),
            MockAnswer::Address(ip) if Self::query_type(query) == Some(TYPE_A) => (0u8, Some(ip)),
            MockAnswer::Address(_) => (0u8, None),
            MockAnswer::SingleLabelOnly(_) => (2u8, None),
        };

        let mut response = Vec::with_capacity(512);

        // Transaction ID
        response.extend_from_slice(&query[0..2]);

        // QR=1, RD=1, RA=1
        response.push(0x81);
        response.push(0x80 | rcode);

        // Questions count (from query)
        response.extend_from_slice(&query[4..6]);

        let answers: u16 = if record.is_some() { 1 } else { 0 };
        response.extend_from_slice(&answers.to_be_bytes());

        // Authority and additional: 0
        response.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);

        response.extend_from_slice(&query[12..]);

        if let Some(ip) = record {
            response.extend_from_slice(&[
                0xc0, 0x0c, // Name pointer to question
                0x00, 0x01, // Type A
                0x00, 0x01, // Class IN
                0x00, 0x00, 0x00, 0x3c, // TTL: 60 seconds
                0x00, 0x04, // Data length: 4 bytes
            ]);
            response.extend_from_slice(&ip.octets());
        }

        Some(response)
    }

    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockDnsServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// A loopback address nothing listens on.
pub async fn dead_server_addr() -> SocketAddr {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    socket.local_addr().unwrap()
}
