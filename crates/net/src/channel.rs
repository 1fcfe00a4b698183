//! Bidirectional best-effort UDP channel.
//!
//! One socket sends equipment ids to `(target_ip, send_port)`; a second
//! socket, bound to the receive port, is read by a background task that
//! hands every datagram to a caller-supplied handler. There is no
//! acknowledgement, retry or ordering.
//!
//! Lifecycle: `Idle` → [`start_receiver`](DatagramChannel::start_receiver)
//! → `Listening` → [`close`](DatagramChannel::close) → `Closed`. A receive
//! loop that stops on a socket fault drops the channel back to `Idle`, and
//! the receiver can be started again.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;

use photon_core::config::UdpConfig;
use photon_core::types::EquipmentId;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::NetError;
use crate::wire::{self, RECV_BUFFER_SIZE};

/// A datagram received on the inbound socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Lossily decoded, whitespace-trimmed payload.
    pub payload: String,
    pub sender: SocketAddr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Idle,
    Listening,
    Closed,
}

pub struct DatagramChannel {
    send_socket: Option<UdpSocket>,
    /// Shared with the receive task; the channel keeps the port bound
    /// until [`close`](DatagramChannel::close).
    receive_socket: Option<Arc<UdpSocket>>,
    receive_addr: SocketAddr,
    target: SocketAddr,
    cancel: CancellationToken,
    receiver: Option<JoinHandle<()>>,
    closed: bool,
}

impl DatagramChannel {
    /// Bind both sockets. The send socket uses an ephemeral port with
    /// broadcast enabled; the receive socket binds `(bind_ip, receive_port)`.
    pub async fn bind(config: &UdpConfig) -> Result<Self, NetError> {
        let send_bind = SocketAddr::new(unspecified_like(config.target_ip), 0);
        let send_socket = UdpSocket::bind(send_bind)
            .await
            .map_err(|source| NetError::Bind {
                addr: send_bind,
                source,
            })?;
        send_socket.set_broadcast(true)?;

        let receive_bind = SocketAddr::new(config.bind_ip, config.receive_port);
        let receive_socket =
            UdpSocket::bind(receive_bind)
                .await
                .map_err(|source| NetError::Bind {
                    addr: receive_bind,
                    source,
                })?;
        let receive_addr = receive_socket.local_addr()?;

        let target = SocketAddr::new(config.target_ip, config.send_port);

        tracing::info!(
            target = %target,
            receive_addr = %receive_addr,
            "Datagram channel bound",
        );

        Ok(Self {
            send_socket: Some(send_socket),
            receive_socket: Some(Arc::new(receive_socket)),
            receive_addr,
            target,
            cancel: CancellationToken::new(),
            receiver: None,
            closed: false,
        })
    }

    pub fn state(&self) -> ChannelState {
        if self.closed {
            ChannelState::Closed
        } else if self.is_receiving() {
            ChannelState::Listening
        } else {
            ChannelState::Idle
        }
    }

    /// Address the receive socket is actually bound to.
    pub fn receive_addr(&self) -> SocketAddr {
        self.receive_addr
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    pub fn target_ip(&self) -> IpAddr {
        self.target.ip()
    }

    /// Change the outbound destination; applies from the next send on.
    ///
    /// Accepts an IP literal or a host name. Host names are resolved once,
    /// here, and the first address of the send socket's family is used,
    /// because the send socket is already bound.
    pub async fn set_target_ip(&mut self, host: &str) -> Result<(), NetError> {
        let trimmed = host.trim();
        if trimmed.is_empty() {
            return Err(NetError::InvalidTarget(
                "Target IP cannot be empty".to_string(),
            ));
        }

        let wants_v4 = self.target.is_ipv4();
        let addr = match trimmed.parse::<IpAddr>() {
            Ok(addr) => addr,
            Err(_) => tokio::net::lookup_host((trimmed, self.target.port()))
                .await
                .map_err(|e| NetError::InvalidTarget(format!("Cannot resolve '{trimmed}': {e}")))?
                .map(|resolved| resolved.ip())
                .find(|ip| ip.is_ipv4() == wants_v4)
                .ok_or_else(|| {
                    NetError::InvalidTarget(format!(
                        "'{trimmed}' has no address usable by the send socket"
                    ))
                })?,
        };
        if addr.is_ipv4() != wants_v4 {
            return Err(NetError::InvalidTarget(format!(
                "'{trimmed}' does not match the address family of the send socket"
            )));
        }

        self.target.set_ip(addr);
        tracing::info!(host = trimmed, target = %self.target, "UDP target updated");
        Ok(())
    }

    /// Send one equipment id as decimal text. Fire-and-forget: there is no
    /// retry, and the caller decides whether a failure matters.
    pub async fn send_equipment_id(&self, equipment_id: EquipmentId) -> Result<(), NetError> {
        let socket = self.send_socket.as_ref().ok_or(NetError::Closed)?;
        let payload = wire::encode_equipment_id(equipment_id);

        socket
            .send_to(&payload, self.target)
            .await
            .map_err(|source| NetError::Send {
                target: self.target,
                source,
            })?;

        tracing::info!(equipment_id, target = %self.target, "Equipment id sent");
        Ok(())
    }

    /// Spawn the receive loop, calling `on_message` on the receive task for
    /// every datagram.
    ///
    /// Returns `false` without doing anything if a receive loop is still
    /// running or the channel is closed. A loop that ended on a fault can
    /// be replaced by calling this again.
    pub fn start_receiver<F>(&mut self, on_message: F) -> bool
    where
        F: FnMut(InboundMessage) + Send + 'static,
    {
        if self.closed {
            tracing::warn!("Cannot start receiver on a closed channel");
            return false;
        }
        if self.is_receiving() {
            tracing::debug!("Receiver already running");
            return false;
        }
        let Some(socket) = self.receive_socket.as_ref().map(Arc::clone) else {
            return false;
        };

        if self.receiver.take().is_some() {
            tracing::info!("Restarting UDP receiver after it stopped");
        }
        let cancel = self.cancel.clone();
        self.receiver = Some(tokio::spawn(receive_loop(socket, cancel, on_message)));
        true
    }

    /// Start the receiver with a handler that forwards onto a bounded
    /// queue, so inbound messages are consumed on the caller's own task.
    ///
    /// When the queue is full, new datagrams are dropped with a warning.
    /// A capacity of zero is treated as one.
    pub fn start_queue(&mut self, capacity: usize) -> Option<mpsc::Receiver<InboundMessage>> {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let started = self.start_receiver(move |message| match tx.try_send(message) {
            Ok(()) => {}
            Err(TrySendError::Full(dropped)) => {
                tracing::warn!(sender = %dropped.sender, "Inbound queue full, dropping datagram");
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!("Inbound queue consumer gone, dropping datagram");
            }
        });
        started.then_some(rx)
    }

    /// `true` while the receive task is alive.
    pub fn is_receiving(&self) -> bool {
        self.receiver
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stop the receive loop, release the receive socket, then release the
    /// send socket. Idempotent.
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }

        self.cancel.cancel();

        // The task holds its own handle to the receive socket; the port is
        // released once both are gone.
        if let Some(handle) = self.receiver.take() {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Receive task ended abnormally");
            }
        }
        drop(self.receive_socket.take());

        drop(self.send_socket.take());
        self.closed = true;
        tracing::info!("Datagram channel closed");
    }
}

impl Drop for DatagramChannel {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for DatagramChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatagramChannel")
            .field("target", &self.target)
            .field("receive_addr", &self.receive_addr)
            .field("state", &self.state())
            .finish()
    }
}

fn unspecified_like(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
    }
}

/// Read datagrams until cancelled or the socket faults.
async fn receive_loop<F>(socket: Arc<UdpSocket>, cancel: CancellationToken, mut on_message: F)
where
    F: FnMut(InboundMessage) + Send + 'static,
{
    tracing::info!(addr = ?socket.local_addr().ok(), "UDP receiver started");
    let mut buf = vec![0u8; RECV_BUFFER_SIZE];

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!("UDP receiver stopping");
                break;
            }
            result = socket.recv_from(&mut buf) => {
                match result {
                    Ok((len, sender)) => {
                        let payload = wire::decode_inbound(&buf[..len]);
                        tracing::debug!(%sender, payload = %payload, "Datagram received");
                        on_message(InboundMessage { payload, sender });
                    }
                    Err(e) if cancel.is_cancelled() => {
                        tracing::debug!(error = %e, "Receive interrupted by shutdown");
                        break;
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "UDP receive failed, receiver stopped");
                        break;
                    }
                }
            }
        }
    }
}
