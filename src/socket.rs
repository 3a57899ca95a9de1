//! The receive loop.
//!
//! One poller owns the UDP socket and spawns a worker per datagram. Workers
//! run in parallel but every decision about a packet (classification,
//! buffering, delivery, arrival log) happens under the single session lock
//! taken in [`Shared::handle`]. An EOT fires the termination signal; the
//! poller then stops reading, waits for every admitted worker and releases
//! the socket and sinks.

use std::{net::SocketAddr, sync::Arc};

use bytes::Bytes;
use tokio::{
    net::UdpSocket,
    sync::{watch, Mutex},
    task::JoinSet,
};

use crate::{
    ack::AckSender,
    arrival::ArrivalLog,
    config::ReceiverConfig,
    constants::MAX_PACKET,
    error::{RdtError, Result},
    packet::{Packet, PacketKind},
    reassembly::{FileSink, ReceiveStats, ReceiverState, Sink},
    seq::SeqNum,
};

/// Lifecycle of a [`RdtReceiver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Listening,
    /// Termination fired; waiting on admitted workers.
    Draining,
    Stopped,
}

/// Final state reported once the receiver has stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiveSummary {
    pub receive_base: SeqNum,
    pub eot_received: bool,
    pub stats: ReceiveStats,
}

/// Single-fire termination signal shared by the poller, workers and any
/// [`ShutdownHandle`].
#[derive(Debug, Clone)]
struct Termination {
    tx: Arc<watch::Sender<bool>>,
}

impl Termination {
    fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Returns true only for the call that actually fired it.
    fn fire(&self) -> bool {
        self.tx.send_if_modified(|done| !std::mem::replace(done, true))
    }

    fn is_fired(&self) -> bool {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

/// Stops a running receiver from outside, as if an EOT had arrived but
/// without answering one.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    termination: Termination,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        if self.termination.fire() {
            tracing::info!("shutdown requested");
        }
    }

    pub fn is_shutdown(&self) -> bool {
        self.termination.is_fired()
    }
}

struct Session {
    state: ReceiverState,
    sink: Box<dyn Sink>,
    arrivals: ArrivalLog,
    eot_received: bool,
}

struct Shared {
    session: Mutex<Session>,
    acker: AckSender,
    termination: Termination,
}

impl Shared {
    /// Processes one datagram. This is the only place the session lock is
    /// taken, so a packet is classified, buffered and delivered atomically
    /// with respect to every other worker.
    async fn handle(&self, datagram: Bytes) -> Result<()> {
        let decoded = Packet::from_bytes(datagram);

        let mut session = self.session.lock().await;
        let Session {
            state,
            sink,
            arrivals,
            eot_received,
        } = &mut *session;
        state.stats_mut().datagrams_rx += 1;

        let packet = match decoded {
            Ok(packet) => packet,
            Err(e) => {
                state.stats_mut().malformed += 1;
                tracing::debug!(error = %e, "dropping malformed datagram");
                return Ok(());
            }
        };

        if packet.ends_transmission() {
            if std::mem::replace(eot_received, true) {
                tracing::debug!("repeated end of transmission ignored");
                return Ok(());
            }
            if let Err(e) = arrivals.record_eot() {
                tracing::warn!(error = %e, "arrival log write failed");
            }
            self.termination.fire();
            self.acker.send_eot().await;
            tracing::info!(base = %state.receive_base(), "end of transmission");
            return Ok(());
        }

        if packet.kind != PacketKind::Data {
            tracing::trace!(kind = ?packet.kind, seq = %packet.seq, "ignoring non-data packet");
            return Ok(());
        }

        if let Err(e) = arrivals.record(packet.seq) {
            tracing::warn!(error = %e, "arrival log write failed");
        }

        let seq = packet.seq;
        let accepted = state.accept(seq, packet.payload, &mut **sink)?;
        if let Some(ack) = accepted.ack {
            self.acker.send_ack(ack).await;
        }
        tracing::debug!(
            %seq,
            class = ?accepted.class,
            delivered = accepted.delivered,
            base = %state.receive_base(),
            "data packet"
        );

        Ok(())
    }
}

/// Receiving end of the transfer.
pub struct RdtReceiver {
    socket: Arc<UdpSocket>,
    local_addr: SocketAddr,
    shared: Arc<Shared>,
    phase: watch::Sender<Phase>,
}

impl std::fmt::Debug for RdtReceiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RdtReceiver")
            .field("local_addr", &self.local_addr)
            .field("remote_addr", &self.shared.acker.remote())
            .finish_non_exhaustive()
    }
}

impl RdtReceiver {
    /// Opens the output and arrival log files and binds the data port.
    /// Any failure here is fatal for the caller.
    pub async fn bind(config: &ReceiverConfig) -> Result<Self> {
        let remote = config.remote_addr()?;
        let sink = FileSink::create(&config.output_path)?;
        let arrivals = ArrivalLog::create(&config.arrival_log_path)?;
        let socket = UdpSocket::bind(config.local_addr()).await?;

        Self::with_parts(socket, remote, sink, arrivals)
    }

    /// Builds a receiver around an already bound socket.
    pub fn with_parts(
        socket: UdpSocket,
        remote: SocketAddr,
        sink: impl Sink + 'static,
        arrivals: ArrivalLog,
    ) -> Result<Self> {
        let local_addr = socket.local_addr()?;
        let socket = Arc::new(socket);
        let shared = Arc::new(Shared {
            session: Mutex::new(Session {
                state: ReceiverState::new(),
                sink: Box::new(sink),
                arrivals,
                eot_received: false,
            }),
            acker: AckSender::new(socket.clone(), remote),
            termination: Termination::new(),
        });
        let (phase, _) = watch::channel(Phase::Listening);

        Ok(Self {
            socket,
            local_addr,
            shared,
            phase,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            termination: self.shared.termination.clone(),
        }
    }

    pub fn phase(&self) -> watch::Receiver<Phase> {
        self.phase.subscribe()
    }

    /// Receives until termination, then drains and stops.
    ///
    /// Returns the first sink failure if one occurred; malformed or stray
    /// packets never surface here.
    pub async fn run(self) -> Result<ReceiveSummary> {
        let Self {
            socket,
            local_addr,
            shared,
            phase,
        } = self;
        let mut stopped = shared.termination.subscribe();
        let mut workers = JoinSet::new();
        let mut failure = None;
        let mut buf = vec![0u8; MAX_PACKET];

        tracing::info!(local = %local_addr, remote = %shared.acker.remote(), "listening");

        loop {
            if shared.termination.is_fired() {
                break;
            }
            tokio::select! {
                biased;
                _ = stopped.changed() => continue,
                Some(joined) = workers.join_next(), if !workers.is_empty() => {
                    record_failure(&mut failure, joined, &shared.termination);
                }
                received = socket.recv_from(&mut buf) => match received {
                    Ok((0, _)) => continue,
                    Ok((n, from)) => {
                        tracing::trace!(bytes = n, %from, "datagram");
                        let datagram = Bytes::copy_from_slice(&buf[..n]);
                        let shared = shared.clone();
                        workers.spawn(async move { shared.handle(datagram).await });
                    }
                    // ICMP errors from earlier sends surface here on some platforms
                    Err(e) => tracing::debug!(error = %e, "recv failed"),
                },
            }
        }

        phase.send_replace(Phase::Draining);
        tracing::info!(in_flight = workers.len(), "draining");
        while let Some(joined) = workers.join_next().await {
            record_failure(&mut failure, joined, &shared.termination);
        }

        let summary = {
            let session = shared.session.lock().await;
            ReceiveSummary {
                receive_base: session.state.receive_base(),
                eot_received: session.eot_received,
                stats: session.state.stats().clone(),
            }
        };
        drop(shared);
        drop(socket);
        phase.send_replace(Phase::Stopped);
        tracing::info!(
            base = %summary.receive_base,
            bytes = summary.stats.bytes_delivered,
            "stopped"
        );

        match failure {
            Some(e) => Err(e),
            None => Ok(summary),
        }
    }
}

fn record_failure(
    failure: &mut Option<RdtError>,
    joined: std::result::Result<Result<()>, tokio::task::JoinError>,
    termination: &Termination,
) {
    let outcome = joined.map_err(RdtError::from).and_then(|r| r);
    if let Err(e) = outcome {
        tracing::error!(error = %e, "worker failed, stopping");
        termination.fire();
        failure.get_or_insert(e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn receiver_with_sink() -> (RdtReceiver, UdpSocket) {
        let emulator = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let receiver = RdtReceiver::with_parts(
            socket,
            emulator.local_addr().unwrap(),
            Vec::<u8>::new(),
            ArrivalLog::disabled(),
        )
        .unwrap();
        (receiver, emulator)
    }

    #[test]
    fn termination_fires_once() {
        let termination = Termination::new();
        let rx = termination.subscribe();
        assert!(termination.fire());
        assert!(!termination.fire());
        assert!(*rx.borrow());
    }

    #[tokio::test]
    async fn malformed_and_stray_packets_are_absorbed() {
        let (receiver, _emulator) = receiver_with_sink().await;
        let shared = receiver.shared.clone();

        shared.handle(Bytes::from_static(&[0, 1, 2])).await.unwrap();
        shared
            .handle(Bytes::from_static(&[0, 0, 0, 5, 0, 0, 0, 1, 0, 0, 0, 1, b'x']))
            .await
            .unwrap();
        shared
            .handle(Packet::data(SeqNum::new(15), &b"far"[..]).to_bytes())
            .await
            .unwrap();

        let session = shared.session.lock().await;
        assert_eq!(session.state.stats().malformed, 2);
        assert_eq!(session.state.stats().out_of_range, 1);
        assert_eq!(session.state.receive_base(), SeqNum::new(0));
        assert!(!shared.termination.is_fired());
    }

    #[tokio::test]
    async fn seq_past_ring_is_neither_acked_nor_buffered() {
        let (receiver, emulator) = receiver_with_sink().await;
        let shared = receiver.shared.clone();

        shared
            .handle(Bytes::from_static(&[0, 0, 0, 1, 0, 0, 0, 33, 0, 0, 0, 1, b'X']))
            .await
            .unwrap();
        for (seq, payload) in [(0, &b"a"[..]), (1, &b"b"[..])] {
            shared
                .handle(Packet::data(SeqNum::new(seq), payload).to_bytes())
                .await
                .unwrap();
        }

        let mut acks = Vec::new();
        let mut buf = [0u8; 64];
        while let Ok(Ok((n, _))) = tokio::time::timeout(
            std::time::Duration::from_millis(200),
            emulator.recv_from(&mut buf),
        )
        .await
        {
            acks.push(Packet::from_bytes(Bytes::copy_from_slice(&buf[..n])).unwrap().seq);
        }
        assert_eq!(acks, vec![SeqNum::new(0), SeqNum::new(1)]);

        let session = shared.session.lock().await;
        let stats = session.state.stats();
        assert_eq!(stats.malformed, 1);
        assert_eq!(stats.duplicates, 0);
        assert_eq!(stats.rebuffered, 0);
        assert_eq!(stats.bytes_delivered, 2);
        assert_eq!(session.state.receive_base(), SeqNum::new(2));
    }

    #[tokio::test]
    async fn shutdown_handle_stops_idle_receiver() {
        let (receiver, _emulator) = receiver_with_sink().await;
        let handle = receiver.shutdown_handle();
        let mut phase = receiver.phase();
        let task = tokio::spawn(receiver.run());

        handle.shutdown();
        let summary = task.await.unwrap().unwrap();

        assert!(!summary.eot_received);
        assert!(handle.is_shutdown());
        phase.wait_for(|p| *p == Phase::Stopped).await.unwrap();
    }
}
