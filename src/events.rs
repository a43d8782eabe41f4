//! Events delivered to the consumer of a link

use futures::{Stream, StreamExt, future};
use tokio::sync::mpsc;
use tracing::{trace, warn};

use crate::LinkError;
use crate::types::{LinkMode, Packet, Record, TextLine};

/// Everything a link reports back.
#[derive(Debug)]
pub enum LinkEvent {
    /// A decoded frame
    Record(Record),
    /// A complete text line
    TextLine(TextLine),
    /// A packet received before the protocol was classified
    RawData(Packet),
    /// The classifier settled on a protocol
    ModeChanged(LinkMode),
    /// A recoverable or fatal error; see [`LinkError::user_message`]
    Error(LinkError),
    /// The read loop stopped because the transport failed
    Disconnected,
}

impl LinkEvent {
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            LinkEvent::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<&LinkError> {
        match self {
            LinkEvent::Error(error) => Some(error),
            _ => None,
        }
    }
}

/// Narrow an event stream to decoded records.
///
/// ```rust
/// use ctglink::events::records;
/// use ctglink::{Link, LinkConfig};
///
/// let mut link = Link::new(LinkConfig::default()).unwrap();
/// let records = records(link.take_events().unwrap());
/// # drop(records);
/// ```
pub fn records<S>(events: S) -> impl Stream<Item = Record>
where
    S: Stream<Item = LinkEvent>,
{
    events.filter_map(|event| {
        future::ready(match event {
            LinkEvent::Record(record) => Some(record),
            _ => None,
        })
    })
}

/// Destination for link events.
pub trait EventSink {
    fn emit(&mut self, event: LinkEvent);
}

impl EventSink for Vec<LinkEvent> {
    fn emit(&mut self, event: LinkEvent) {
        self.push(event);
    }
}

/// Channel delivery never blocks the read loop; a full channel drops the event.
impl EventSink for mpsc::Sender<LinkEvent> {
    fn emit(&mut self, event: LinkEvent) {
        match self.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(event)) => {
                warn!("Event channel full, dropping {:?}", event);
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                trace!("Event receiver dropped");
            }
        }
    }
}
