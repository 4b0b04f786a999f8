//! The controller aggregate: named axes and buttons fed by one physical device.

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::axis::{Axes, Axis, AxisControl, BinaryAxis, ButtonTransitions, CentredAxis, CircularCentredAxis, TriggerAxis};
use crate::buttons::{Button, ButtonKey, ButtonPresses, Buttons, HandlerRegistration};
use crate::error::{InputError, Result};
use crate::input::{EventCode, EventKind, RawEvent};
use crate::lock;

/// One entry of the control list a controller is built from.
#[derive(Debug)]
pub enum Control {
    Button(Button),
    Centred(CentredAxis),
    Trigger(TriggerAxis),
    Binary(BinaryAxis),
}

/// Dead and hot zone overrides applied to every axis of a controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Zones {
    pub dead_zone: Option<f64>,
    pub hot_zone: Option<f64>,
}

impl Zones {
    pub fn new(dead_zone: f64, hot_zone: f64) -> Self {
        Self {
            dead_zone: Some(dead_zone),
            hot_zone: Some(hot_zone),
        }
    }

    /// Fill any unset zone from `defaults`
    pub fn or(self, defaults: Zones) -> Self {
        Self {
            dead_zone: self.dead_zone.or(defaults.dead_zone),
            hot_zone: self.hot_zone.or(defaults.hot_zone),
        }
    }
}

/// Result of looking a control up by standard name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlValue {
    /// Calibrated axis position
    Axis(f64),
    /// How long the button has been held, `None` when it's up
    Button(Option<Duration>),
}

impl ControlValue {
    pub fn as_axis(&self) -> Option<f64> {
        match self {
            Self::Axis(value) => Some(*value),
            Self::Button(_) => None,
        }
    }

    pub fn held(&self) -> Option<Duration> {
        match self {
            Self::Button(held) => *held,
            Self::Axis(_) => None,
        }
    }

    pub fn is_pressed(&self) -> bool {
        self.held().is_some()
    }
}

#[derive(Debug, Default)]
struct Binding {
    unique_name: Option<String>,
    last_error: Option<Arc<io::Error>>,
}

/// A controller's axes and buttons plus its connection state.
///
/// State is updated by the binder thread; everything here takes `&self` so a
/// controller can be shared behind an `Arc` with any number of readers.
pub struct Controller {
    kind: String,
    axes: Axes,
    buttons: Buttons,
    node_mappings: Option<HashMap<String, String>>,
    connected: AtomicBool,
    binding: Mutex<Binding>,
}

impl Controller {
    /// Build a controller from a mixed list of controls. Zone overrides which are
    /// set replace whatever the individual axes were created with.
    pub fn new(kind: impl Into<String>, controls: Vec<Control>, zones: Zones) -> Self {
        let mut axes = Vec::new();
        let mut buttons = Vec::new();

        for control in controls {
            match control {
                Control::Button(button) => buttons.push(button),
                Control::Centred(axis) => axes.push(Axis::Centred(axis)),
                Control::Trigger(axis) => {
                    if let Some(button) = axis.button() {
                        buttons.push(button.clone());
                    }
                    axes.push(Axis::Trigger(axis));
                }
                Control::Binary(axis) => {
                    buttons.push(axis.low_button().clone());
                    buttons.push(axis.high_button().clone());
                    axes.push(Axis::Binary(axis));
                }
            }
        }

        let axes = Axes::new(axes);
        if let Some(dead_zone) = zones.dead_zone {
            axes.set_dead_zone(dead_zone);
        }
        if let Some(hot_zone) = zones.hot_zone {
            axes.set_hot_zone(hot_zone);
        }

        Self {
            kind: kind.into(),
            axes,
            buttons: Buttons::new(buttons),
            node_mappings: None,
            connected: AtomicBool::new(false),
            binding: Mutex::new(Binding::default()),
        }
    }

    /// Routing prefixes keyed by device node name, used when the controller is
    /// made up of more than one node.
    pub fn with_node_mappings(mut self, node_mappings: HashMap<String, String>) -> Self {
        self.node_mappings = if node_mappings.is_empty() {
            None
        } else {
            Some(node_mappings)
        };
        self
    }

    /// Controller type, e.g. the profile name
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn axes(&self) -> &Axes {
        &self.axes
    }

    pub fn buttons(&self) -> &Buttons {
        &self.buttons
    }

    pub fn node_mappings(&self) -> Option<&HashMap<String, String>> {
        self.node_mappings.as_ref()
    }

    pub fn node_prefix(&self, device_name: &str) -> Option<&str> {
        self.node_mappings
            .as_ref()
            .and_then(|mappings| mappings.get(device_name))
            .map(String::as_str)
    }

    pub fn axis_count(&self) -> usize {
        self.axes.len()
    }

    pub fn button_count(&self) -> usize {
        self.buttons.len()
    }

    /// Standard names of every button and axis
    pub fn snames(&self) -> Vec<&str> {
        let mut names = self.buttons.names();
        names.extend(self.axes.names());
        names
    }

    pub fn has_control(&self, sname: &str) -> bool {
        self.axes.contains(sname) || self.buttons.contains(sname)
    }

    /// Apply one event from the hardware. `prefix` is the routing prefix of the
    /// node it came from, if any.
    pub fn handle_event(&self, event: &RawEvent, prefix: Option<&str>) {
        let code = EventCode::routed(prefix, event.code);
        match event.kind {
            EventKind::AbsoluteAxis | EventKind::RelativeAxis => {
                if let Some(transitions) = self.axes.axis_updated(&code, event.value) {
                    self.apply_transitions(transitions);
                }
            }
            EventKind::Key => match event.value {
                1 => {
                    self.buttons.button_pressed(&ButtonKey::Code(code));
                }
                0 => {
                    self.buttons.button_released(&ButtonKey::Code(code));
                }
                // Key repeat
                _ => {}
            },
            EventKind::Other(_) => {}
        }
    }

    fn apply_transitions(&self, transitions: ButtonTransitions) {
        if let Some(key) = transitions.released {
            self.buttons.button_released(&key);
        }
        if let Some(key) = transitions.pressed {
            self.buttons.button_pressed(&key);
        }
    }

    /// Look up an axis value or button hold time by standard name.
    pub fn get(&self, sname: &str) -> Result<ControlValue> {
        if let Some(axis) = self.axes.get(sname) {
            return Ok(ControlValue::Axis(axis.value()));
        }
        if let Some(state) = self.buttons.state(sname) {
            return Ok(ControlValue::Button(state.held()));
        }
        Err(InputError::UnknownControl(sname.to_string()))
    }

    pub fn get_many(&self, snames: &[&str]) -> Result<Vec<ControlValue>> {
        snames.iter().map(|sname| self.get(sname)).collect()
    }

    /// Calibrated value of a named axis.
    pub fn axis_value(&self, sname: &str) -> Result<f64> {
        self.axes
            .value(sname)
            .ok_or_else(|| InputError::UnknownControl(sname.to_string()))
    }

    /// Hold time of a named button; `None` for buttons that are up or don't exist.
    pub fn held(&self, sname: &str) -> Option<Duration> {
        self.buttons.held(sname)
    }

    pub fn check_presses(&self) -> ButtonPresses {
        self.buttons.check_presses()
    }

    pub fn check_releases(&self) -> ButtonPresses {
        self.buttons.check_releases()
    }

    pub fn register_button_handler<F>(&self, snames: &[&str], handler: F) -> HandlerRegistration
    where
        F: Fn(&Button) + Send + Sync + 'static,
    {
        self.buttons.register_handler(snames, handler)
    }

    /// Read two centred axes as one stick with a radial dead and hot zone.
    pub fn circular(
        &self,
        x: &str,
        y: &str,
        dead_zone: f64,
        hot_zone: f64,
    ) -> Result<CircularCentredAxis<'_>> {
        let centred = |sname: &str| {
            self.axes
                .centred(sname)
                .ok_or_else(|| InputError::UnknownControl(sname.to_string()))
        };
        Ok(CircularCentredAxis::new(centred(x)?, centred(y)?, dead_zone, hot_zone))
    }

    pub fn set_axis_centres(&self) {
        self.axes.set_axis_centres();
    }

    pub fn reset_axis_calibration(&self) {
        self.axes.reset_axis_calibration();
    }

    /// True while a binder is feeding this controller from live hardware.
    pub fn connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Physical identifier of the bound hardware, `None` when not connected.
    pub fn device_unique_name(&self) -> Option<String> {
        lock(&self.binding).unique_name.clone()
    }

    /// Error which caused the last unexpected disconnect, if any.
    pub fn last_error(&self) -> Option<Arc<io::Error>> {
        lock(&self.binding).last_error.clone()
    }

    pub(crate) fn mark_bound(&self, unique_name: &str) {
        let mut binding = lock(&self.binding);
        binding.unique_name = Some(unique_name.to_string());
        binding.last_error = None;
        self.connected.store(true, Ordering::Release);
    }

    pub(crate) fn mark_unbound(&self, error: Option<Arc<io::Error>>) {
        let mut binding = lock(&self.binding);
        binding.unique_name = None;
        if error.is_some() {
            binding.last_error = error;
        }
        self.connected.store(false, Ordering::Release);
    }

    /// Lazily yield the current values of the named controls for as long as the
    /// controller stays connected. Each call starts a fresh stream.
    pub fn stream(self: &Arc<Self>, snames: &[&str]) -> Result<ControlStream> {
        if let Some(missing) = snames.iter().find(|sname| !self.has_control(sname)) {
            return Err(InputError::UnknownControl(missing.to_string()));
        }
        Ok(ControlStream {
            controller: Arc::clone(self),
            snames: snames.iter().map(|s| s.to_string()).collect(),
        })
    }
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("kind", &self.kind)
            .field("axes", &self.axes.names())
            .field("buttons", &self.buttons.names())
            .field("connected", &self.connected())
            .finish()
    }
}

impl fmt::Display for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, axes=[", self.kind)?;
        for (i, axis) in self.axes.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={:.3}", axis.sname().unwrap_or(axis.name()), axis.value())?;
        }
        write!(f, "], buttons={:?}", self.buttons.names())
    }
}

/// Iterator returned by [`Controller::stream`]. Ends once the controller disconnects.
#[derive(Debug)]
pub struct ControlStream {
    controller: Arc<Controller>,
    snames: Vec<String>,
}

impl Iterator for ControlStream {
    type Item = Vec<ControlValue>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.controller.connected() {
            return None;
        }
        let snames: Vec<&str> = self.snames.iter().map(String::as_str).collect();
        self.controller.get_many(&snames).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pad() -> Controller {
        Controller::new(
            "TestPad",
            vec![
                Control::Button(Button::new("Circle", 305, Some("circle"))),
                Control::Button(Button::new("Gyro Reset", EventCode::prefixed("motion", 305), Some("greset"))),
                Control::Centred(CentredAxis::new("Left Horizontal", 0, 255, 0, Some("lx"))),
                Control::Centred(CentredAxis::new("Left Vertical", 255, 0, 1, Some("ly"))),
                Control::Trigger(TriggerAxis::new("Left Trigger", 0, 255, 2, Some("lt")).with_button("l2", 0.5)),
                Control::Binary(BinaryAxis::new("D-pad Horizontal", 16, Some("dleft"), Some("dright"))),
            ],
            Zones::new(0.1, 0.1),
        )
    }

    #[test]
    fn test_partitions_controls() {
        let controller = pad();
        assert_eq!(controller.axis_count(), 4);
        // circle, greset, l2, dleft, dright
        assert_eq!(controller.button_count(), 5);
        assert!(controller.has_control("dright"));
        assert!(controller.has_control("lt"));
        assert!(!controller.has_control("rt"));
    }

    #[test]
    fn test_zone_overrides_applied() {
        let controller = pad();
        let lx = controller.axes().centred("lx").unwrap();
        assert_eq!(lx.dead_zone(), 0.1);
        assert_eq!(lx.hot_zone(), 0.1);
    }

    #[test]
    fn test_routes_absolute_events() {
        let controller = pad();
        for (raw, expected) in [(0, -1.0), (128, 0.0), (255, 1.0)] {
            controller.handle_event(&RawEvent::absolute(0, raw), None);
            let value = controller.get("lx").unwrap().as_axis().unwrap();
            assert!((value - expected).abs() < 1e-6, "raw {} gave {}", raw, value);
        }
    }

    #[test]
    fn test_routes_relative_events() {
        let controller = Controller::new(
            "TestWheel",
            vec![Control::Centred(CentredAxis::new("Wheel", -127, 127, 8, Some("wheel")))],
            Zones::new(0.1, 0.1),
        );
        for (raw, expected) in [(127, 1.0), (0, 0.0), (-127, -1.0)] {
            controller.handle_event(&RawEvent::relative(8, raw), None);
            let value = controller.axis_value("wheel").unwrap();
            assert!((value - expected).abs() < 1e-6, "raw {} gave {}", raw, value);
        }
    }

    #[test]
    fn test_routes_keys_and_binary_axes() {
        let controller = pad();
        controller.handle_event(&RawEvent::key(305, 1), None);
        assert!(controller.get("circle").unwrap().is_pressed());
        controller.handle_event(&RawEvent::key(305, 2), None);
        assert!(controller.get("circle").unwrap().is_pressed());
        controller.handle_event(&RawEvent::key(305, 0), None);
        assert!(!controller.get("circle").unwrap().is_pressed());

        controller.handle_event(&RawEvent::absolute(16, -1), None);
        assert!(controller.held("dleft").is_some());
        controller.handle_event(&RawEvent::absolute(16, 1), None);
        assert!(controller.held("dleft").is_none());
        assert!(controller.held("dright").is_some());

        let presses = controller.check_presses();
        assert!(presses.contains("circle"));
        assert!(presses.contains("dleft"));
        assert!(presses.contains("dright"));
        assert!(controller.check_releases().contains("dleft"));
    }

    #[test]
    fn test_trigger_button_routed() {
        let controller = pad();
        controller.handle_event(&RawEvent::absolute(2, 255), None);
        assert!(controller.held("l2").is_some());
        controller.handle_event(&RawEvent::absolute(2, 0), None);
        assert!(controller.held("l2").is_none());
    }

    #[test]
    fn test_prefixed_routing() {
        let controller = pad();
        controller.handle_event(&RawEvent::key(305, 1), Some("motion"));
        assert!(controller.held("greset").is_some());
        assert!(controller.held("circle").is_none());
    }

    #[test]
    fn test_unknown_codes_ignored() {
        let controller = pad();
        controller.handle_event(&RawEvent::absolute(42, 7), None);
        controller.handle_event(&RawEvent::key(999, 1), None);
        controller.handle_event(&RawEvent::new(EventKind::Other(0), 0, 0), None);
        assert!(controller.check_presses().is_empty());
    }

    #[test]
    fn test_unknown_control_lookup_fails() {
        let controller = pad();
        match controller.get("nope") {
            Err(InputError::UnknownControl(name)) => assert_eq!(name, "nope"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(controller.axis_value("circle").is_err());
        assert!(controller.get_many(&["lx", "nope"]).is_err());
        assert!(controller.held("nope").is_none());
    }

    #[test]
    fn test_circular_lookup() {
        let controller = pad();
        controller.handle_event(&RawEvent::absolute(0, 255), None);
        controller.handle_event(&RawEvent::absolute(1, 128), None);
        let (x, y) = controller.circular("lx", "ly", 0.1, 0.1).unwrap().value();
        assert!((x - 1.0).abs() < 1e-3);
        assert!(y.abs() < 1e-2);
        assert!(controller.circular("lx", "lt", 0.1, 0.1).is_err());
    }

    #[test]
    fn test_connection_state() {
        let controller = pad();
        assert!(!controller.connected());
        controller.mark_bound("aa:bb");
        assert!(controller.connected());
        assert_eq!(controller.device_unique_name().as_deref(), Some("aa:bb"));

        let error = Arc::new(io::Error::new(io::ErrorKind::Other, "unplugged"));
        controller.mark_unbound(Some(error));
        assert!(!controller.connected());
        assert!(controller.device_unique_name().is_none());
        controller.mark_unbound(None);
        assert_eq!(controller.last_error().unwrap().to_string(), "unplugged");
    }

    #[test]
    fn test_stream_ends_on_disconnect() {
        let controller = Arc::new(pad());
        assert!(controller.stream(&["lx", "bogus"]).is_err());

        let mut stream = controller.stream(&["lx", "circle"]).unwrap();
        assert!(stream.next().is_none());

        controller.mark_bound("pad");
        let mut stream = controller.stream(&["lx", "circle"]).unwrap();
        let values = stream.next().unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0], ControlValue::Axis(0.0));
        assert_eq!(values[1], ControlValue::Button(None));

        controller.mark_unbound(None);
        assert!(stream.next().is_none());
    }

    #[test]
    fn test_node_mappings() {
        let mut mappings = HashMap::new();
        mappings.insert("Pad Motion Sensors".to_string(), "motion".to_string());
        let controller = pad().with_node_mappings(mappings);
        assert_eq!(controller.node_prefix("Pad Motion Sensors"), Some("motion"));
        assert_eq!(controller.node_prefix("Pad"), None);
        assert!(pad().with_node_mappings(HashMap::new()).node_mappings().is_none());
    }
}
