mod channel;
#[cfg(target_os = "linux")]
pub mod evdev_reader;
mod poll;

pub use channel::{ChannelProvider, ChannelSource, ChannelSourceHandle};
pub use poll::wait_for_readiness;

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::InputError;

/// Event type as reported by the event source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    AbsoluteAxis,
    RelativeAxis,
    Key,
    Other(u16),
}

/// A single typed record read from a device node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEvent {
    pub kind: EventKind,
    pub code: u16,
    pub value: i32,
}

impl RawEvent {
    pub fn new(kind: EventKind, code: u16, value: i32) -> Self {
        Self { kind, code, value }
    }

    pub fn absolute(code: u16, value: i32) -> Self {
        Self::new(EventKind::AbsoluteAxis, code, value)
    }

    pub fn relative(code: u16, value: i32) -> Self {
        Self::new(EventKind::RelativeAxis, code, value)
    }

    pub fn key(code: u16, value: i32) -> Self {
        Self::new(EventKind::Key, code, value)
    }
}

/// Identity of a device node, as reported by the OS.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Device node, typically `/dev/input/eventN`
    pub path: PathBuf,
    pub name: String,
    /// Physical bus path, shared between nodes of a composite device
    pub phys: Option<String>,
    /// Hardware unique ID (e.g. bluetooth MAC), when the driver exposes one
    pub uniq: Option<String>,
    pub vendor: u16,
    pub product: u16,
    pub version: u16,
}

/// Routing key for an axis or button: the event code plus, for controllers that
/// span several device nodes, the prefix of the node it arrives on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventCode {
    pub prefix: Option<String>,
    pub code: u16,
}

impl EventCode {
    pub fn new(code: u16) -> Self {
        Self { prefix: None, code }
    }

    pub fn prefixed(prefix: impl Into<String>, code: u16) -> Self {
        Self {
            prefix: Some(prefix.into()),
            code,
        }
    }

    pub fn routed(prefix: Option<&str>, code: u16) -> Self {
        Self {
            prefix: prefix.map(str::to_string),
            code,
        }
    }
}

impl From<u16> for EventCode {
    fn from(code: u16) -> Self {
        Self::new(code)
    }
}

impl fmt::Display for EventCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(prefix) => write!(f, "{}/{}", prefix, self.code),
            None => write!(f, "{}", self.code),
        }
    }
}

impl FromStr for EventCode {
    type Err = InputError;

    /// Parses `123` or `prefix/123`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_code = |code: &str| {
            code.trim()
                .parse::<u16>()
                .map_err(|e| InputError::Profile(format!("bad event code '{}': {}", s, e)))
        };
        match s.split_once('/') {
            Some((prefix, code)) if !prefix.is_empty() => {
                Ok(Self::prefixed(prefix.trim(), parse_code(code)?))
            }
            Some(_) => Err(InputError::Profile(format!("empty prefix in '{}'", s))),
            None => Ok(Self::new(parse_code(s)?)),
        }
    }
}

/// One OS-level device node producing typed events.
///
/// Implementations must make `grab` exclusive: grabbing a node that's already held
/// by another owner fails rather than sharing input.
pub trait EventSource: Send {
    fn info(&self) -> &DeviceInfo;

    fn grab(&mut self) -> io::Result<()>;

    fn ungrab(&mut self) -> io::Result<()>;

    /// Read every pending event. Returns an empty batch when nothing is waiting.
    fn fetch_events(&mut self) -> io::Result<Vec<RawEvent>>;

    /// Descriptor for the readiness wait, if the source is backed by one. Sources
    /// without a descriptor are polled on every wake of the binder.
    #[cfg(target_os = "linux")]
    fn poll_fd(&self) -> Option<std::os::fd::RawFd> {
        None
    }
}

impl fmt::Debug for dyn EventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSource")
            .field("path", &self.info().path)
            .field("name", &self.info().name)
            .finish()
    }
}

/// Enumerates the device nodes currently attached to the host.
pub trait SourceProvider {
    fn enumerate(&self) -> io::Result<Vec<Box<dyn EventSource>>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_code_parse() {
        assert_eq!("17".parse::<EventCode>().unwrap(), EventCode::new(17));
        assert_eq!(
            "motion/3".parse::<EventCode>().unwrap(),
            EventCode::prefixed("motion", 3)
        );
        assert!("/3".parse::<EventCode>().is_err());
        assert!("x".parse::<EventCode>().is_err());
        assert!("70000".parse::<EventCode>().is_err());
    }

    #[test]
    fn test_event_code_display() {
        assert_eq!(EventCode::new(4).to_string(), "4");
        assert_eq!(EventCode::prefixed("motion", 4).to_string(), "motion/4");
        assert_eq!(EventCode::routed(Some("m"), 1), EventCode::prefixed("m", 1));
        assert_eq!(EventCode::routed(None, 1), EventCode::new(1));
    }
}
