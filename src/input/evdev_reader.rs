#![cfg(target_os = "linux")]
use std::io;
use std::os::fd::{AsRawFd, RawFd};
use std::path::{Path, PathBuf};

use evdev::{Device, EventType, InputEvent};

use super::{DeviceInfo, EventKind, EventSource, RawEvent, SourceProvider};

/// A `/dev/input/event*` node read through evdev.
pub struct EvdevSource {
    device: Device,
    info: DeviceInfo,
}

impl EvdevSource {
    pub fn open(path: &Path) -> io::Result<Self> {
        let device = Device::open(path)?;
        Self::from_device(path.to_path_buf(), device)
    }

    fn from_device(path: PathBuf, device: Device) -> io::Result<Self> {
        set_nonblocking(device.as_raw_fd())?;
        let id = device.input_id();
        let info = DeviceInfo {
            path,
            name: device.name().unwrap_or("Unknown").to_string(),
            phys: device.physical_path().map(str::to_string),
            uniq: device.unique_name().map(str::to_string),
            vendor: id.vendor(),
            product: id.product(),
            version: id.version(),
        };
        Ok(Self { device, info })
    }
}

// Reads never block, the binder waits on poll instead
fn set_nonblocking(fd: RawFd) -> io::Result<()> {
    unsafe {
        let flags = libc::fcntl(fd, libc::F_GETFL);
        if flags < 0 {
            return Err(io::Error::last_os_error());
        }
        if libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) < 0 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

fn raw_event(event: &InputEvent) -> RawEvent {
    let kind = match event.event_type() {
        EventType::ABSOLUTE => EventKind::AbsoluteAxis,
        EventType::RELATIVE => EventKind::RelativeAxis,
        EventType::KEY => EventKind::Key,
        other => EventKind::Other(other.0),
    };
    RawEvent::new(kind, event.code(), event.value())
}

impl EventSource for EvdevSource {
    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    fn grab(&mut self) -> io::Result<()> {
        self.device.grab()
    }

    fn ungrab(&mut self) -> io::Result<()> {
        self.device.ungrab()
    }

    fn fetch_events(&mut self) -> io::Result<Vec<RawEvent>> {
        match self.device.fetch_events() {
            Ok(events) => Ok(events.map(|event| raw_event(&event)).collect()),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    fn poll_fd(&self) -> Option<RawFd> {
        Some(self.device.as_raw_fd())
    }
}

/// Lists every event node the process can open.
#[derive(Debug, Default, Clone, Copy)]
pub struct EvdevProvider;

impl SourceProvider for EvdevProvider {
    fn enumerate(&self) -> io::Result<Vec<Box<dyn EventSource>>> {
        let mut sources: Vec<Box<dyn EventSource>> = Vec::new();
        for (path, device) in evdev::enumerate() {
            match EvdevSource::from_device(path.clone(), device) {
                Ok(source) => {
                    log::debug!(
                        "Found {} at {} ({:04x}:{:04x})",
                        source.info.name,
                        path.display(),
                        source.info.vendor,
                        source.info.product
                    );
                    sources.push(Box::new(source));
                }
                Err(e) => log::warn!("Skipping {}: {}", path.display(), e),
            }
        }
        Ok(sources)
    }
}
