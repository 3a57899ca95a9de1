use std::{net::SocketAddr, sync::Arc};

use tokio::net::UdpSocket;

use crate::{packet::Packet, seq::SeqNum};

/// Sends acknowledgments and the final EOT to the fixed remote endpoint.
///
/// Sends are fire-and-forget: a lost ACK is recovered by the sender's own
/// retransmission, so failures are logged and dropped.
#[derive(Debug, Clone)]
pub struct AckSender {
    socket: Arc<UdpSocket>,
    remote: SocketAddr,
}

impl AckSender {
    pub fn new(socket: Arc<UdpSocket>, remote: SocketAddr) -> Self {
        Self { socket, remote }
    }

    pub fn remote(&self) -> SocketAddr {
        self.remote
    }

    pub async fn send_ack(&self, seq: SeqNum) {
        self.send(Packet::sack(seq)).await
    }

    pub async fn send_eot(&self) {
        self.send(Packet::eot()).await
    }

    async fn send(&self, packet: Packet) {
        let bytes = packet.to_bytes();
        match self.socket.send_to(&bytes, self.remote).await {
            Ok(_) => tracing::trace!(kind = ?packet.kind, seq = %packet.seq, "sent control packet"),
            Err(e) => tracing::warn!(
                kind = ?packet.kind,
                seq = %packet.seq,
                remote = %self.remote,
                error = %e,
                "control packet dropped"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::PacketKind;
    use bytes::Bytes;

    #[tokio::test]
    async fn ack_and_eot_reach_remote() {
        let remote = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let local = Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap());
        let acker = AckSender::new(local, remote.local_addr().unwrap());

        acker.send_ack(SeqNum::new(17)).await;
        acker.send_eot().await;

        let mut buf = [0u8; 64];
        let (n, _) = remote.recv_from(&mut buf).await.unwrap();
        let ack = Packet::from_bytes(Bytes::copy_from_slice(&buf[..n])).unwrap();
        assert_eq!(ack, Packet::sack(SeqNum::new(17)));

        let (n, _) = remote.recv_from(&mut buf).await.unwrap();
        let eot = Packet::from_bytes(Bytes::copy_from_slice(&buf[..n])).unwrap();
        assert_eq!(eot.kind, PacketKind::Eot);
        assert!(eot.is_empty());
    }
}
