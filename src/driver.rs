//! Driver spawns and manages the per-connection read loop

use std::time::SystemTime;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::config::LinkConfig;
use crate::engine::StreamEngine;
use crate::events::{EventSink, LinkEvent};
use crate::protocol::{Frame, PLOTTER_HANDSHAKE};
use crate::stream::PacketSegmenter;
use crate::transport::Transport;
use crate::types::LinkMode;
use crate::{LinkError, Result};

/// Bound of the write command queue.
const COMMAND_CAPACITY: usize = 16;

/// Requests handled by the read loop on behalf of the link.
#[derive(Debug)]
pub enum Command {
    /// Frame `payload` and send it; the reply carries the wire bytes
    Write { payload: Vec<u8>, reply: oneshot::Sender<Result<Vec<u8>>> },
}

/// Result of spawning the read loop
pub struct DriverChannels<T> {
    /// Current protocol mode of the connection
    pub mode: watch::Receiver<LinkMode>,
    /// Queue for outbound writes
    pub commands: mpsc::Sender<Command>,
    /// Cancellation token for graceful shutdown
    pub cancel: CancellationToken,
    /// Read loop task; yields the transport back when it stops
    pub task: JoinHandle<T>,
}

/// Driver spawns the read loop for one connection
///
/// The loop owns the transport for as long as it runs. Everything else talks
/// to it through [`DriverChannels`].
pub struct Driver;

impl Driver {
    /// Spawn the read loop for an open transport
    pub fn spawn<T>(transport: T, config: LinkConfig, events: mpsc::Sender<LinkEvent>) -> DriverChannels<T>
    where
        T: Transport,
    {
        let (mode_tx, mode_rx) = watch::channel(LinkMode::Unclassified);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let cancel = CancellationToken::new();

        let read_loop = ReadLoop {
            engine: StreamEngine::new(&config),
            segmenter: PacketSegmenter::with_capacity(config.read_chunk_size),
            buf: vec![0u8; config.read_chunk_size],
            continuous: false,
            last_data: Instant::now(),
            packets: 0,
            transport,
            config,
            events,
            mode_tx,
            commands: command_rx,
            cancel: cancel.clone(),
        };

        let task = tokio::spawn(read_loop.run());

        DriverChannels { mode: mode_rx, commands: command_tx, cancel, task }
    }
}

/// Why the loop stopped
enum Exit {
    Cancelled,
    TransportClosed,
    Failed(LinkError),
}

/// What one poll of the transport found
enum Polled {
    Data,
    Idle,
}

/// What woke the idle wait
enum Wake {
    Cancelled,
    Command(Option<Command>),
    Tick,
}

struct ReadLoop<T> {
    transport: T,
    config: LinkConfig,
    engine: StreamEngine,
    segmenter: PacketSegmenter,
    buf: Vec<u8>,
    /// Device was told to stream continuously, so silence is a fault
    continuous: bool,
    last_data: Instant,
    packets: u64,
    events: mpsc::Sender<LinkEvent>,
    mode_tx: watch::Sender<LinkMode>,
    commands: mpsc::Receiver<Command>,
    cancel: CancellationToken,
}

impl<T: Transport> ReadLoop<T> {
    async fn run(mut self) -> T {
        info!("Read loop started on {}", self.transport.name());

        match self.run_inner().await {
            Exit::Cancelled => info!("Read loop cancelled"),
            Exit::TransportClosed => {
                info!("{} closed", self.transport.name());
                self.emit_disconnected();
            }
            Exit::Failed(err) => {
                error!("Read loop stopping: {}", err);
                self.events.emit(LinkEvent::Error(err));

                tokio::select! {
                    _ = self.cancel.cancelled() => {}
                    _ = tokio::time::sleep(self.config.error_backoff()) => {}
                }

                if self.transport.is_open() {
                    if let Err(e) = self.transport.close().await {
                        warn!("Failed to close {}: {}", self.transport.name(), e);
                    }
                }
                self.emit_disconnected();
            }
        }

        info!("Read loop ended (processed {} packets)", self.packets);
        self.transport
    }

    fn emit_disconnected(&mut self) {
        if !self.cancel.is_cancelled() {
            self.events.emit(LinkEvent::Disconnected);
        }
    }

    async fn run_inner(&mut self) -> Exit {
        if let Err(err) = self.start().await {
            return Exit::Failed(err);
        }

        let cancel = self.cancel.clone();
        loop {
            if cancel.is_cancelled() {
                return Exit::Cancelled;
            }
            if !self.transport.is_open() {
                return Exit::TransportClosed;
            }

            match self.poll_once().await {
                Ok(Polled::Data) => {
                    // Writes queued during a long burst are served between reads
                    while let Ok(command) = self.commands.try_recv() {
                        self.handle_command(command).await;
                    }
                    continue;
                }
                Ok(Polled::Idle) => {}
                Err(err) if err.requires_input_flush() => {
                    warn!("{}, discarding buffered input", err);
                    self.events.emit(LinkEvent::Error(err));
                    self.segmenter.clear();
                    if let Err(err) = self.transport.discard_input().await {
                        return Exit::Failed(err);
                    }
                    continue;
                }
                Err(err @ LinkError::Timeout { .. }) => {
                    warn!("{}", err);
                    self.events.emit(LinkEvent::Error(err));
                }
                Err(err) => return Exit::Failed(err),
            }

            let wake = tokio::select! {
                biased;
                _ = cancel.cancelled() => Wake::Cancelled,
                command = self.commands.recv() => Wake::Command(command),
                _ = tokio::time::sleep(self.config.poll_interval()) => Wake::Tick,
            };

            match wake {
                Wake::Cancelled => return Exit::Cancelled,
                Wake::Command(Some(command)) => self.handle_command(command).await,
                Wake::Command(None) => {
                    debug!("Link dropped its command queue, stopping");
                    return Exit::Cancelled;
                }
                Wake::Tick => {}
            }
        }
    }

    /// Drop stale input and announce ourselves to the device.
    async fn start(&mut self) -> Result<()> {
        self.transport.discard_input().await?;
        if self.config.send_handshake {
            self.transport.write(&PLOTTER_HANDSHAKE).await?;
            debug!("Plotter handshake sent");
        }
        self.last_data = Instant::now();
        Ok(())
    }

    async fn poll_once(&mut self) -> Result<Polled> {
        let available = self.transport.bytes_available().await?;
        if available > 0 {
            let want = available.min(self.buf.len());
            let n = self.transport.read(&mut self.buf[..want]).await?;
            if n > 0 {
                self.segmenter.extend(&self.buf[..n], SystemTime::now());
                self.last_data = Instant::now();
                return Ok(Polled::Data);
            }
        }

        if let Some(packet) = self.segmenter.take_packet() {
            self.packets += 1;
            trace!("Packet {}: {} bytes", self.packets, packet.len());
            let result = self.engine.process_packet(&packet, &mut self.events);
            self.publish_mode();
            result?;
        }

        let idle_timeout = self.config.idle_timeout();
        if self.continuous && self.last_data.elapsed() > idle_timeout {
            // Restart the clock so a silent device raises one timeout per period
            self.last_data = Instant::now();
            if let Err(e) = self.transport.discard_output().await {
                warn!("Failed to discard output on {}: {}", self.transport.name(), e);
            }
            return Err(LinkError::Timeout { duration: idle_timeout });
        }

        Ok(Polled::Idle)
    }

    fn publish_mode(&self) {
        let mode = self.engine.mode();
        self.mode_tx.send_if_modified(|current| {
            if *current == mode {
                return false;
            }
            *current = mode;
            true
        });
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Write { payload, reply } => {
                if payload == self.config.continuous_start.as_bytes() {
                    debug!("Entering continuous mode");
                    self.continuous = true;
                    self.last_data = Instant::now();
                } else if payload == self.config.continuous_stop.as_bytes() {
                    debug!("Leaving continuous mode");
                    self.continuous = false;
                }

                let wire = Frame::encode(&payload);
                let result = self.transport.write(&wire).await.map(|()| wire);
                if let Err(e) = &result {
                    warn!("Write to {} failed: {}", self.transport.name(), e);
                }
                // The caller may have given up waiting
                let _ = reply.send(result);
            }
        }
    }
}
