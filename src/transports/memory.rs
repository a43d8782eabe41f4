//! In-memory scripted transport
//!
//! [`MemoryTransport`] plays back a script of arrivals. Each [`MemoryHandle::push`]
//! queues bytes that become available on the next poll; consecutive pushes
//! arrive back to back, and [`MemoryHandle::gap`] inserts one idle poll so the
//! read loop closes a packet there.
//!
//! ```rust
//! use ctglink::transports::MemoryTransport;
//!
//! let (transport, handle) = MemoryTransport::new();
//! handle.push(b"HR1:140\r\n");
//! handle.gap();
//! handle.fail("cable pulled");
//! assert_eq!(handle.pending_steps(), 3);
//! # drop(transport);
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::trace;

use crate::transport::Transport;
use crate::{LinkError, Result};

#[derive(Debug, Clone)]
enum Step {
    Data(Vec<u8>),
    Gap,
    Fail(String),
}

#[derive(Debug, Default)]
struct MemoryState {
    script: VecDeque<Step>,
    /// Bytes received and waiting to be read
    inbound: VecDeque<u8>,
    open: bool,
    fail_open: bool,
    writes: Vec<Vec<u8>>,
    input_discards: usize,
    output_discards: usize,
    opens: usize,
    closes: usize,
}

fn lock(state: &Mutex<MemoryState>) -> MutexGuard<'_, MemoryState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Scripted transport for tests and replay.
#[derive(Debug)]
pub struct MemoryTransport {
    state: Arc<Mutex<MemoryState>>,
    name: String,
}

/// Test-side handle for scripting and inspecting a [`MemoryTransport`].
#[derive(Debug, Clone)]
pub struct MemoryHandle {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryTransport {
    /// A closed transport and its handle.
    pub fn new() -> (Self, MemoryHandle) {
        Self::named("memory")
    }

    pub fn named(name: impl Into<String>) -> (Self, MemoryHandle) {
        let state = Arc::new(Mutex::new(MemoryState::default()));
        let handle = MemoryHandle { state: Arc::clone(&state) };
        (Self { state, name: name.into() }, handle)
    }
}

impl MemoryHandle {
    /// Queue bytes that arrive on the next poll after earlier steps.
    pub fn push(&self, bytes: impl AsRef<[u8]>) {
        lock(&self.state).script.push_back(Step::Data(bytes.as_ref().to_vec()));
    }

    /// Queue one idle poll.
    pub fn gap(&self) {
        lock(&self.state).script.push_back(Step::Gap);
    }

    /// Queue bytes followed by an idle poll.
    pub fn push_packet(&self, bytes: impl AsRef<[u8]>) {
        self.push(bytes);
        self.gap();
    }

    /// Queue a read failure.
    pub fn fail(&self, reason: impl Into<String>) {
        lock(&self.state).script.push_back(Step::Fail(reason.into()));
    }

    /// Make bytes available immediately, as if received before anyone polled.
    pub fn preload(&self, bytes: impl AsRef<[u8]>) {
        lock(&self.state).inbound.extend(bytes.as_ref());
    }

    /// Make the next `open` call fail.
    pub fn fail_next_open(&self) {
        lock(&self.state).fail_open = true;
    }

    /// Simulate the device going away.
    pub fn disconnect(&self) {
        lock(&self.state).open = false;
    }

    pub fn is_open(&self) -> bool {
        lock(&self.state).open
    }

    /// Every buffer written, in order.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        lock(&self.state).writes.clone()
    }

    pub fn pending_steps(&self) -> usize {
        lock(&self.state).script.len()
    }

    pub fn input_discards(&self) -> usize {
        lock(&self.state).input_discards
    }

    pub fn output_discards(&self) -> usize {
        lock(&self.state).output_discards
    }

    pub fn opens(&self) -> usize {
        lock(&self.state).opens
    }

    pub fn closes(&self) -> usize {
        lock(&self.state).closes
    }
}

#[async_trait::async_trait]
impl Transport for MemoryTransport {
    async fn bytes_available(&mut self) -> Result<usize> {
        let mut state = lock(&self.state);
        if !state.open {
            return Err(LinkError::transport_failed(format!("{} is not open", self.name)));
        }
        if !state.inbound.is_empty() {
            return Ok(state.inbound.len());
        }
        match state.script.pop_front() {
            Some(Step::Data(bytes)) => {
                state.inbound.extend(bytes);
                Ok(state.inbound.len())
            }
            Some(Step::Gap) | None => Ok(0),
            Some(Step::Fail(reason)) => Err(LinkError::transport_failed(reason)),
        }
    }

    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut state = lock(&self.state);
        if !state.open {
            return Err(LinkError::transport_failed(format!("{} is not open", self.name)));
        }
        let n = buf.len().min(state.inbound.len());
        for (slot, byte) in buf.iter_mut().zip(state.inbound.drain(..n)) {
            *slot = byte;
        }
        trace!("{} read {} bytes", self.name, n);
        Ok(n)
    }

    async fn write(&mut self, bytes: &[u8]) -> Result<()> {
        let mut state = lock(&self.state);
        if !state.open {
            return Err(LinkError::transport_failed(format!("{} is not open", self.name)));
        }
        state.writes.push(bytes.to_vec());
        Ok(())
    }

    fn is_open(&self) -> bool {
        lock(&self.state).open
    }

    async fn open(&mut self) -> Result<()> {
        let mut state = lock(&self.state);
        if std::mem::take(&mut state.fail_open) {
            return Err(LinkError::transport_failed(format!("{} refused to open", self.name)));
        }
        state.open = true;
        state.opens += 1;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        let mut state = lock(&self.state);
        state.open = false;
        state.closes += 1;
        Ok(())
    }

    async fn discard_input(&mut self) -> Result<()> {
        let mut state = lock(&self.state);
        state.inbound.clear();
        state.input_discards += 1;
        Ok(())
    }

    async fn discard_output(&mut self) -> Result<()> {
        lock(&self.state).output_discards += 1;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
