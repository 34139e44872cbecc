//! # Sync transports.
//!
//! A [`Transport`] sends [`Frame`]s to every other process on the device;
//! incoming frames arrive on the [`Inbox`] returned when the transport is
//! created.
//!
//! ## Rules
//! - `send` never blocks and never waits for an acknowledgement.
//! - Delivery is best-effort: a full or closed receiver drops the frame.
//! - No ordering is promised across processes.

use std::{
    net::SocketAddr,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use tokio::{
    net::UdpSocket,
    sync::mpsc::{self, error::TrySendError},
    time::sleep,
};
use tracing::{debug, info, warn};

use super::Frame;
use crate::error::{Error, Result};

/// Frames received from peers.
pub type Inbox = mpsc::Receiver<Frame>;

/// Per-endpoint inbox capacity.
pub const INBOX_CAPACITY: usize = 64;

/// Largest frame accepted from the network.
const MAX_FRAME: usize = 1024;

pub trait Transport: Send + Sync + 'static {
    /// Broadcasts one frame, fire-and-forget.
    fn send(&self, frame: &Frame) -> Result<()>;

    fn name(&self) -> &'static str;
}

/// In-process broadcast bus shared by several endpoints.
///
/// Every attached endpoint (the sender included) receives each frame, the
/// same way a device-wide broadcast reaches every registered receiver.
#[derive(Default)]
pub struct LoopbackBus {
    members: Mutex<Vec<mpsc::Sender<Frame>>>,
}

impl LoopbackBus {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Adds an endpoint and returns its transport and inbox.
    pub fn attach(self: &Arc<Self>) -> (Arc<LoopbackTransport>, Inbox) {
        let (tx, rx) = mpsc::channel(INBOX_CAPACITY);
        self.members
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        let transport = Arc::new(LoopbackTransport { bus: Arc::clone(self) });
        (transport, rx)
    }

    fn deliver(&self, frame: &Frame) {
        let mut members = self.members.lock().unwrap_or_else(PoisonError::into_inner);
        members.retain(|member| match member.try_send(frame.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!("Loopback endpoint dropped {}: inbox full", frame.signal);
                true
            }
            Err(TrySendError::Closed(_)) => {
                debug!("Loopback endpoint closed, detaching");
                false
            }
        });
    }
}

pub struct LoopbackTransport {
    bus: Arc<LoopbackBus>,
}

impl Transport for LoopbackTransport {
    fn send(&self, frame: &Frame) -> Result<()> {
        self.bus.deliver(frame);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "loopback"
    }
}

/// JSON datagrams between processes, usually over the loopback interface.
pub struct UdpTransport {
    socket: Arc<UdpSocket>,
    peers: Vec<SocketAddr>,
}

impl UdpTransport {
    /// Binds `addr` and starts forwarding received frames to the inbox.
    pub async fn bind(addr: SocketAddr, peers: Vec<SocketAddr>) -> Result<(Arc<Self>, Inbox)> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|e| Error::Transport(format!("failed to bind {}: {}", addr, e)))?;
        let socket = Arc::new(socket);
        let (tx, rx) = mpsc::channel(INBOX_CAPACITY);

        info!("Sync transport listening on {} with {} peer(s)", addr, peers.len());
        tokio::spawn(receive_loop(Arc::clone(&socket), tx));

        Ok((Arc::new(Self { socket, peers }), rx))
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.socket
            .local_addr()
            .map_err(|e| Error::Transport(format!("no local address: {}", e)))
    }
}

impl Transport for UdpTransport {
    fn send(&self, frame: &Frame) -> Result<()> {
        let bytes = frame.encode()?;
        for peer in &self.peers {
            if let Err(e) = self.socket.try_send_to(&bytes, *peer) {
                warn!("Failed to send {} to {}: {}", frame.signal, peer, e);
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "udp"
    }
}

async fn receive_loop(socket: Arc<UdpSocket>, tx: mpsc::Sender<Frame>) {
    let mut buf = [0u8; MAX_FRAME];
    loop {
        match socket.recv_from(&mut buf).await {
            Ok((len, from)) => match Frame::decode(&buf[..len]) {
                Ok(frame) => {
                    if tx.send(frame).await.is_err() {
                        debug!("Sync inbox closed, stopping receiver");
                        break;
                    }
                }
                Err(e) => warn!("Ignoring datagram from {}: {}", from, e),
            },
            Err(e) => {
                warn!("Sync receive error: {}", e);
                sleep(Duration::from_secs(1)).await;
            }
        }
    }
}
