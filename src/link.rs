//! Public connection handle.
//!
//! A [`Link`] owns at most one running read loop. Events from every
//! connection it has driven arrive on a single channel, so a consumer can keep
//! one event stream across reconnects.
//!
//! ```rust
//! use ctglink::{Link, LinkConfig, LinkEvent};
//! use ctglink::transports::MemoryTransport;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> ctglink::Result<()> {
//! let mut link = Link::new(LinkConfig::default())?;
//! let (transport, handle) = MemoryTransport::new();
//! link.set_transport(transport).await?;
//!
//! handle.push_packet(b"HR1:140\r\n");
//! let event = link.next_event().await;
//! assert!(matches!(event, Some(LinkEvent::RawData(_))));
//!
//! link.close().await?;
//! # Ok(())
//! # }
//! ```

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::LinkConfig;
use crate::driver::{Command, Driver};
use crate::events::LinkEvent;
use crate::transport::Transport;
use crate::types::LinkMode;
use crate::{LinkError, Result};

/// A running read loop and the channels that reach it.
struct Session {
    commands: mpsc::Sender<Command>,
    mode: watch::Receiver<LinkMode>,
    cancel: CancellationToken,
    task: JoinHandle<Box<dyn Transport>>,
}

/// Connection to one CTG monitor.
pub struct Link {
    config: LinkConfig,
    events_tx: mpsc::Sender<LinkEvent>,
    events_rx: Option<mpsc::Receiver<LinkEvent>>,
    session: Option<Session>,
}

impl Link {
    /// Create an idle link; fails if the configuration is invalid.
    pub fn new(config: LinkConfig) -> Result<Self> {
        config.validate()?;
        let (events_tx, events_rx) = mpsc::channel(config.event_capacity);
        Ok(Self { config, events_tx, events_rx: Some(events_rx), session: None })
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Attach a transport and start reading from it.
    ///
    /// Any previous connection is closed first. The transport is opened if
    /// it is not open already.
    pub async fn set_transport<T: Transport>(&mut self, transport: T) -> Result<()> {
        self.close().await?;

        let mut transport: Box<dyn Transport> = Box::new(transport);
        if !transport.is_open() {
            transport.open().await?;
        }
        info!("Link attached to {}", transport.name());

        let channels = Driver::spawn(transport, self.config.clone(), self.events_tx.clone());
        self.session = Some(Session {
            commands: channels.commands,
            mode: channels.mode,
            cancel: channels.cancel,
            task: channels.task,
        });
        Ok(())
    }

    /// Frame `payload` and send it, returning the bytes put on the wire.
    ///
    /// Writing the configured continuous-start payload (`"G"` by default)
    /// makes the link treat silence as a timeout until the stop payload is
    /// written.
    pub async fn write(&self, payload: impl AsRef<[u8]>) -> Result<Vec<u8>> {
        let session = self.session.as_ref().ok_or(LinkError::Closed)?;
        let (reply, response) = oneshot::channel();
        let command = Command::Write { payload: payload.as_ref().to_vec(), reply };
        session.commands.send(command).await.map_err(|_| LinkError::Closed)?;
        response.await.map_err(|_| LinkError::Closed)?
    }

    /// Stop the read loop and close the transport.
    ///
    /// The loop gets `close_grace` to stop on its own before it is aborted;
    /// closing the transport is bounded by `close_timeout`. Closing an idle
    /// link is a no-op.
    pub async fn close(&mut self) -> Result<()> {
        let Some(session) = self.session.take() else {
            return Ok(());
        };
        session.cancel.cancel();

        let mut task = session.task;
        let transport = match tokio::time::timeout(self.config.close_grace(), &mut task).await {
            Ok(Ok(transport)) => Some(transport),
            Ok(Err(e)) => {
                warn!("Read loop ended abnormally: {}", e);
                None
            }
            Err(_) => {
                warn!("Read loop did not stop within {:?}, aborting", self.config.close_grace());
                task.abort();
                None
            }
        };

        let Some(mut transport) = transport else {
            return Ok(());
        };
        if !transport.is_open() {
            debug!("{} already closed", transport.name());
            return Ok(());
        }

        let closed = tokio::time::timeout(self.config.close_timeout(), transport.close()).await;
        match closed {
            Ok(result) => {
                result?;
                info!("{} closed", transport.name());
            }
            Err(_) => warn!("Closing {} timed out after {:?}", transport.name(), self.config.close_timeout()),
        }
        Ok(())
    }

    /// Whether a read loop is running.
    pub fn is_open(&self) -> bool {
        self.session.as_ref().is_some_and(|session| !session.task.is_finished())
    }

    /// Current protocol mode; `Unclassified` when no transport is attached.
    pub fn mode(&self) -> LinkMode {
        self.session.as_ref().map(|session| *session.mode.borrow()).unwrap_or_default()
    }

    /// Watch mode changes of the current connection.
    pub fn watch_mode(&self) -> Option<watch::Receiver<LinkMode>> {
        self.session.as_ref().map(|session| session.mode.clone())
    }

    /// Receive the next event.
    ///
    /// Returns `None` once the receiver has been taken by [`Link::take_events`].
    pub async fn next_event(&mut self) -> Option<LinkEvent> {
        self.events_rx.as_mut()?.recv().await
    }

    /// Take the event receiver as a stream. Only the first call returns `Some`.
    pub fn take_events(&mut self) -> Option<ReceiverStream<LinkEvent>> {
        self.events_rx.take().map(ReceiverStream::new)
    }
}

impl Drop for Link {
    fn drop(&mut self) {
        if let Some(session) = &self.session {
            session.cancel.cancel();
        }
    }
}
