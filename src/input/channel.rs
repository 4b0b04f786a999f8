//! In-memory event sources fed through a crossbeam channel.
//!
//! Used to drive discovery and the binder without hardware, and by applications
//! that synthesise input (network remotes, replayed recordings).

use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TryRecvError};

use super::{DeviceInfo, EventSource, RawEvent, SourceProvider};

#[derive(Debug)]
enum SourceMessage {
    Events(Vec<RawEvent>),
    Error(io::ErrorKind, String),
}

/// Device node whose events arrive over a channel.
///
/// Dropping every [`ChannelSourceHandle`] for the node behaves like unplugging it:
/// once the queued events are drained, reads fail.
#[derive(Debug)]
pub struct ChannelSource {
    info: DeviceInfo,
    receiver: Receiver<SourceMessage>,
    grabbed: Arc<AtomicBool>,
    holds_grab: bool,
}

/// Sending side of a [`ChannelSource`].
#[derive(Debug, Clone)]
pub struct ChannelSourceHandle {
    sender: Sender<SourceMessage>,
    grabbed: Arc<AtomicBool>,
}

impl ChannelSource {
    pub fn new(info: DeviceInfo) -> (Self, ChannelSourceHandle) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let grabbed = Arc::new(AtomicBool::new(false));
        let source = Self {
            info,
            receiver,
            grabbed: Arc::clone(&grabbed),
            holds_grab: false,
        };
        (source, ChannelSourceHandle { sender, grabbed })
    }
}

impl EventSource for ChannelSource {
    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    fn grab(&mut self) -> io::Result<()> {
        if self.grabbed.swap(true, Ordering::SeqCst) {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                "device or resource busy",
            ));
        }
        self.holds_grab = true;
        Ok(())
    }

    fn ungrab(&mut self) -> io::Result<()> {
        if !self.holds_grab {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "device not grabbed"));
        }
        self.holds_grab = false;
        self.grabbed.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn fetch_events(&mut self) -> io::Result<Vec<RawEvent>> {
        let mut events = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(SourceMessage::Events(batch)) => events.extend(batch),
                Ok(SourceMessage::Error(kind, message)) => return Err(io::Error::new(kind, message)),
                Err(TryRecvError::Empty) => return Ok(events),
                Err(TryRecvError::Disconnected) if events.is_empty() => {
                    return Err(io::Error::new(io::ErrorKind::NotConnected, "device removed"));
                }
                Err(TryRecvError::Disconnected) => return Ok(events),
            }
        }
    }
}

impl Drop for ChannelSource {
    fn drop(&mut self) {
        if self.holds_grab {
            self.grabbed.store(false, Ordering::SeqCst);
        }
    }
}

impl ChannelSourceHandle {
    /// Queue a batch of events. Returns false once the source has gone.
    pub fn send(&self, events: impl IntoIterator<Item = RawEvent>) -> bool {
        self.sender
            .send(SourceMessage::Events(events.into_iter().collect()))
            .is_ok()
    }

    pub fn send_event(&self, event: RawEvent) -> bool {
        self.send([event])
    }

    /// Make the next read fail with this error.
    pub fn fail(&self, kind: io::ErrorKind, message: &str) -> bool {
        self.sender
            .send(SourceMessage::Error(kind, message.to_string()))
            .is_ok()
    }

    pub fn is_grabbed(&self) -> bool {
        self.grabbed.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
struct ChannelDevice {
    info: DeviceInfo,
    receiver: Receiver<SourceMessage>,
    grabbed: Arc<AtomicBool>,
}

/// Set of in-memory devices. Every call to `enumerate` hands out fresh sources
/// sharing the queue and grab state of the registered device.
#[derive(Debug, Default)]
pub struct ChannelProvider {
    devices: Vec<ChannelDevice>,
}

impl ChannelProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a device, returning the handle used to feed it.
    pub fn add(&mut self, info: DeviceInfo) -> ChannelSourceHandle {
        let (source, handle) = ChannelSource::new(info);
        self.devices.push(ChannelDevice {
            info: source.info.clone(),
            receiver: source.receiver.clone(),
            grabbed: source.grabbed.clone(),
        });
        handle
    }

    /// Stop listing the device at this path.
    pub fn remove(&mut self, path: &Path) {
        self.devices.retain(|device| device.info.path != path);
    }
}

impl SourceProvider for ChannelProvider {
    fn enumerate(&self) -> io::Result<Vec<Box<dyn EventSource>>> {
        Ok(self
            .devices
            .iter()
            .map(|device| {
                Box::new(ChannelSource {
                    info: device.info.clone(),
                    receiver: device.receiver.clone(),
                    grabbed: Arc::clone(&device.grabbed),
                    holds_grab: false,
                }) as Box<dyn EventSource>
            })
            .collect())
    }
}
