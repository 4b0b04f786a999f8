//! Analogue axes and their auto-calibration.
//!
//! Raw samples are first scaled into the axis' native range using the raw limits
//! supplied by the controller profile. The scaled value then widens the observed
//! minimum and maximum, which act as the effective range when computing the output.
//! The observed range starts out narrower than the physical one so that a stick
//! pushed to its limit reads as full scale immediately, before it's been calibrated.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI8, AtomicU64, Ordering};

use crate::buttons::{Button, ButtonKey};
use crate::calibration::{map_circular, map_dual_axis, map_single_axis};
use crate::input::EventCode;

const CENTRED_INITIAL_MIN: f64 = -0.9;
const CENTRED_INITIAL_MAX: f64 = 0.9;
const TRIGGER_INITIAL_MIN: f64 = 0.1;
const TRIGGER_INITIAL_MAX: f64 = 0.9;

/// f64 stored as bits so it can be written by the binder and read anywhere
#[derive(Debug)]
struct AtomicF64(AtomicU64);

impl AtomicF64 {
    fn new(value: f64) -> Self {
        Self(AtomicU64::new(value.to_bits()))
    }

    fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Acquire))
    }

    fn store(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Release);
    }
}

/// Button events synthesised by an axis update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ButtonTransitions {
    pub released: Option<ButtonKey>,
    pub pressed: Option<ButtonKey>,
}

impl ButtonTransitions {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.released.is_none() && self.pressed.is_none()
    }
}

/// Behaviour shared by every kind of axis.
pub trait AxisControl {
    fn name(&self) -> &str;

    fn sname(&self) -> Option<&str>;

    fn code(&self) -> &EventCode;

    /// Calibrated output with dead and hot zones applied.
    fn value(&self) -> f64;

    /// Feed a raw hardware sample, returning any button events it implies.
    fn receive_raw(&self, raw: i32) -> ButtonTransitions;

    fn set_dead_zone(&self, _dead_zone: f64) {}

    fn set_hot_zone(&self, _hot_zone: f64) {}

    /// Forget calibration and return to the cold-start state.
    fn reset(&self) {}
}

/// Stick axis resting at a centre point, output `-1.0..=1.0`.
#[derive(Debug)]
pub struct CentredAxis {
    name: String,
    sname: Option<String>,
    code: EventCode,
    min_raw: f64,
    max_raw: f64,
    invert: bool,
    dead_zone: AtomicF64,
    hot_zone: AtomicF64,
    centre: AtomicF64,
    min: AtomicF64,
    max: AtomicF64,
    value: AtomicF64,
}

impl CentredAxis {
    /// `min_raw` is the hardware value for -1.0 and `max_raw` the value for 1.0.
    /// Passing them reversed inverts the axis.
    pub fn new(
        name: impl Into<String>,
        min_raw: i32,
        max_raw: i32,
        code: impl Into<EventCode>,
        sname: Option<&str>,
    ) -> Self {
        Self {
            name: name.into(),
            sname: sname.map(str::to_string),
            code: code.into(),
            min_raw: f64::from(min_raw),
            max_raw: f64::from(max_raw),
            invert: false,
            dead_zone: AtomicF64::new(0.0),
            hot_zone: AtomicF64::new(0.0),
            centre: AtomicF64::new(0.0),
            min: AtomicF64::new(CENTRED_INITIAL_MIN),
            max: AtomicF64::new(CENTRED_INITIAL_MAX),
            value: AtomicF64::new(0.0),
        }
    }

    pub fn inverted(mut self, invert: bool) -> Self {
        self.invert = invert;
        self
    }

    pub fn with_zones(self, dead_zone: f64, hot_zone: f64) -> Self {
        self.dead_zone.store(dead_zone);
        self.hot_zone.store(hot_zone);
        self
    }

    pub fn is_inverted(&self) -> bool {
        self.invert
    }

    pub fn dead_zone(&self) -> f64 {
        self.dead_zone.load()
    }

    pub fn hot_zone(&self) -> f64 {
        self.hot_zone.load()
    }

    /// Latest sample scaled to `-1.0..=1.0` without calibration or zones.
    pub fn raw_value(&self) -> f64 {
        self.value.load()
    }

    /// Most extreme scaled samples seen so far, as `(min, max)`.
    pub fn observed_range(&self) -> (f64, f64) {
        (self.min.load(), self.max.load())
    }

    pub fn centre(&self) -> f64 {
        self.centre.load()
    }

    pub fn set_centre(&self, centre: f64) {
        self.centre.store(centre);
    }

    /// Treat the current stick position as the resting point.
    pub fn centre_here(&self) {
        self.centre.store(self.raw_value());
    }

    pub fn set_raw(&self, raw: i32) {
        let span = self.max_raw - self.min_raw;
        if span == 0.0 {
            return;
        }
        let value = (f64::from(raw) - self.min_raw) * (2.0 / span) - 1.0;
        self.value.store(value);
        if value > self.max.load() {
            self.max.store(value);
        }
        if value < self.min.load() {
            self.min.store(value);
        }
    }
}

impl AxisControl for CentredAxis {
    fn name(&self) -> &str {
        &self.name
    }

    fn sname(&self) -> Option<&str> {
        self.sname.as_deref()
    }

    fn code(&self) -> &EventCode {
        &self.code
    }

    fn value(&self) -> f64 {
        let mapped = map_dual_axis(
            self.min.load(),
            self.max.load(),
            self.centre.load(),
            self.dead_zone.load(),
            self.hot_zone.load(),
            self.value.load(),
        )
        .clamp(-1.0, 1.0);
        if self.invert {
            -mapped
        } else {
            mapped
        }
    }

    fn receive_raw(&self, raw: i32) -> ButtonTransitions {
        self.set_raw(raw);
        ButtonTransitions::none()
    }

    fn set_dead_zone(&self, dead_zone: f64) {
        self.dead_zone.store(dead_zone);
    }

    fn set_hot_zone(&self, hot_zone: f64) {
        self.hot_zone.store(hot_zone);
    }

    fn reset(&self) {
        self.centre.store(0.0);
        self.min.store(CENTRED_INITIAL_MIN);
        self.max.store(CENTRED_INITIAL_MAX);
    }
}

/// Trigger axis resting at zero, output `0.0..=1.0`.
///
/// Some pads report analogue triggers without a matching button event; for those a
/// button can be attached which goes down once the output reaches a threshold.
#[derive(Debug)]
pub struct TriggerAxis {
    name: String,
    sname: Option<String>,
    code: EventCode,
    min_raw: f64,
    max_raw: f64,
    dead_zone: AtomicF64,
    hot_zone: AtomicF64,
    min: AtomicF64,
    max: AtomicF64,
    value: AtomicF64,
    button: Option<(Button, f64)>,
    button_down: AtomicBool,
}

impl TriggerAxis {
    /// `min_raw` is the released value and `max_raw` the fully pressed one.
    pub fn new(
        name: impl Into<String>,
        min_raw: i32,
        max_raw: i32,
        code: impl Into<EventCode>,
        sname: Option<&str>,
    ) -> Self {
        Self {
            name: name.into(),
            sname: sname.map(str::to_string),
            code: code.into(),
            min_raw: f64::from(min_raw),
            max_raw: f64::from(max_raw),
            dead_zone: AtomicF64::new(0.0),
            hot_zone: AtomicF64::new(0.0),
            min: AtomicF64::new(TRIGGER_INITIAL_MIN),
            max: AtomicF64::new(TRIGGER_INITIAL_MAX),
            value: AtomicF64::new(0.0),
            button: None,
            button_down: AtomicBool::new(false),
        }
    }

    pub fn with_zones(self, dead_zone: f64, hot_zone: f64) -> Self {
        self.dead_zone.store(dead_zone);
        self.hot_zone.store(hot_zone);
        self
    }

    /// Attach a synthetic button pressed while the output is at or above `threshold`.
    pub fn with_button(mut self, sname: &str, threshold: f64) -> Self {
        let key = ButtonKey::Trigger(self.code.clone());
        let button = Button::with_key(format!("{} button", self.name), key, Some(sname));
        self.button = Some((button, threshold));
        self
    }

    pub fn button(&self) -> Option<&Button> {
        self.button.as_ref().map(|(button, _)| button)
    }

    pub fn dead_zone(&self) -> f64 {
        self.dead_zone.load()
    }

    pub fn hot_zone(&self) -> f64 {
        self.hot_zone.load()
    }

    pub fn raw_value(&self) -> f64 {
        self.value.load()
    }

    pub fn observed_range(&self) -> (f64, f64) {
        (self.min.load(), self.max.load())
    }

    pub fn set_raw(&self, raw: i32) {
        let span = self.max_raw - self.min_raw;
        if span == 0.0 {
            return;
        }
        let value = (f64::from(raw) - self.min_raw) / span;
        self.value.store(value);
        if value > self.max.load() {
            self.max.store(value);
        }
        if value < self.min.load() {
            self.min.store(value);
        }
    }
}

impl AxisControl for TriggerAxis {
    fn name(&self) -> &str {
        &self.name
    }

    fn sname(&self) -> Option<&str> {
        self.sname.as_deref()
    }

    fn code(&self) -> &EventCode {
        &self.code
    }

    fn value(&self) -> f64 {
        map_single_axis(
            self.min.load(),
            self.max.load(),
            self.dead_zone.load(),
            self.hot_zone.load(),
            self.value.load(),
        )
        .clamp(0.0, 1.0)
    }

    fn receive_raw(&self, raw: i32) -> ButtonTransitions {
        self.set_raw(raw);
        let Some((button, threshold)) = &self.button else {
            return ButtonTransitions::none();
        };
        let down = self.value() >= *threshold;
        if self.button_down.swap(down, Ordering::AcqRel) == down {
            return ButtonTransitions::none();
        }
        if down {
            ButtonTransitions {
                released: None,
                pressed: Some(button.key().clone()),
            }
        } else {
            ButtonTransitions {
                released: Some(button.key().clone()),
                pressed: None,
            }
        }
    }

    fn set_dead_zone(&self, dead_zone: f64) {
        self.dead_zone.store(dead_zone);
    }

    fn set_hot_zone(&self, hot_zone: f64) {
        self.hot_zone.store(hot_zone);
    }

    fn reset(&self) {
        self.min.store(TRIGGER_INITIAL_MIN);
        self.max.store(TRIGGER_INITIAL_MAX);
        self.button_down.store(false, Ordering::Release);
    }
}

/// Pseudo-axis reporting only -1, 0 or 1 (typically a d-pad), exposed both as an
/// axis and as a pair of buttons.
#[derive(Debug)]
pub struct BinaryAxis {
    name: String,
    sname: Option<String>,
    code: EventCode,
    low: Button,
    high: Button,
    value: AtomicI8,
}

impl BinaryAxis {
    pub fn new(
        name: impl Into<String>,
        code: impl Into<EventCode>,
        low_sname: Option<&str>,
        high_sname: Option<&str>,
    ) -> Self {
        let name = name.into();
        let code = code.into();
        let low = Button::with_key(
            format!("{} low", name),
            ButtonKey::AxisLow(code.clone()),
            low_sname,
        );
        let high = Button::with_key(
            format!("{} high", name),
            ButtonKey::AxisHigh(code.clone()),
            high_sname,
        );
        Self {
            name,
            sname: None,
            code,
            low,
            high,
            value: AtomicI8::new(0),
        }
    }

    pub fn with_sname(mut self, sname: &str) -> Self {
        self.sname = Some(sname.to_string());
        self
    }

    /// Button pressed while the axis reads -1
    pub fn low_button(&self) -> &Button {
        &self.low
    }

    /// Button pressed while the axis reads 1
    pub fn high_button(&self) -> &Button {
        &self.high
    }

    fn button_for(&self, sign: i8) -> Option<ButtonKey> {
        match sign {
            s if s < 0 => Some(self.low.key().clone()),
            s if s > 0 => Some(self.high.key().clone()),
            _ => None,
        }
    }
}

impl AxisControl for BinaryAxis {
    fn name(&self) -> &str {
        &self.name
    }

    fn sname(&self) -> Option<&str> {
        self.sname.as_deref()
    }

    fn code(&self) -> &EventCode {
        &self.code
    }

    fn value(&self) -> f64 {
        f64::from(self.value.load(Ordering::Acquire))
    }

    fn receive_raw(&self, raw: i32) -> ButtonTransitions {
        let sign = raw.signum() as i8;
        let previous = self.value.swap(sign, Ordering::AcqRel);
        if previous == sign {
            return ButtonTransitions::none();
        }
        ButtonTransitions {
            released: self.button_for(previous),
            pressed: self.button_for(sign),
        }
    }
}

/// A pair of centred axes read together, with a radial rather than per-axis dead
/// and hot zone. Borrows the axes from their controller.
#[derive(Debug, Clone, Copy)]
pub struct CircularCentredAxis<'a> {
    x: &'a CentredAxis,
    y: &'a CentredAxis,
    dead_zone: f64,
    hot_zone: f64,
}

impl<'a> CircularCentredAxis<'a> {
    pub fn new(x: &'a CentredAxis, y: &'a CentredAxis, dead_zone: f64, hot_zone: f64) -> Self {
        Self {
            x,
            y,
            dead_zone,
            hot_zone,
        }
    }

    fn component(axis: &CentredAxis) -> f64 {
        let value = axis.raw_value() - axis.centre();
        if axis.is_inverted() {
            -value
        } else {
            value
        }
    }

    /// `(x, y)` inside the unit disc.
    pub fn value(&self) -> (f64, f64) {
        map_circular(
            Self::component(self.x),
            Self::component(self.y),
            self.dead_zone,
            self.hot_zone,
        )
    }
}

/// Closed set of axis kinds a controller can carry.
#[derive(Debug)]
pub enum Axis {
    Centred(CentredAxis),
    Trigger(TriggerAxis),
    Binary(BinaryAxis),
}

impl Axis {
    fn control(&self) -> &dyn AxisControl {
        match self {
            Self::Centred(axis) => axis,
            Self::Trigger(axis) => axis,
            Self::Binary(axis) => axis,
        }
    }

    pub fn as_centred(&self) -> Option<&CentredAxis> {
        match self {
            Self::Centred(axis) => Some(axis),
            _ => None,
        }
    }
}

impl AxisControl for Axis {
    fn name(&self) -> &str {
        self.control().name()
    }

    fn sname(&self) -> Option<&str> {
        self.control().sname()
    }

    fn code(&self) -> &EventCode {
        self.control().code()
    }

    fn value(&self) -> f64 {
        self.control().value()
    }

    fn receive_raw(&self, raw: i32) -> ButtonTransitions {
        self.control().receive_raw(raw)
    }

    fn set_dead_zone(&self, dead_zone: f64) {
        self.control().set_dead_zone(dead_zone)
    }

    fn set_hot_zone(&self, hot_zone: f64) {
        self.control().set_hot_zone(hot_zone)
    }

    fn reset(&self) {
        self.control().reset()
    }
}

/// All axes of one controller, routed by event code and looked up by standard name.
#[derive(Debug)]
pub struct Axes {
    axes: Vec<Axis>,
    by_code: HashMap<EventCode, usize>,
    by_sname: HashMap<String, usize>,
}

impl Axes {
    pub fn new(axes: Vec<Axis>) -> Self {
        let mut by_code = HashMap::new();
        let mut by_sname = HashMap::new();
        for (index, axis) in axes.iter().enumerate() {
            if by_code.insert(axis.code().clone(), index).is_some() {
                log::warn!("Duplicate axis code {}, '{}' takes precedence", axis.code(), axis.name());
            }
            if let Some(sname) = axis.sname() {
                by_sname.insert(sname.to_string(), index);
            }
        }
        Self {
            axes,
            by_code,
            by_sname,
        }
    }

    pub fn len(&self) -> usize {
        self.axes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.axes.iter().filter_map(AxisControl::sname).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Axis> {
        self.axes.iter()
    }

    pub fn get(&self, sname: &str) -> Option<&Axis> {
        self.by_sname.get(sname).map(|&i| &self.axes[i])
    }

    pub fn contains(&self, sname: &str) -> bool {
        self.by_sname.contains_key(sname)
    }

    pub fn centred(&self, sname: &str) -> Option<&CentredAxis> {
        self.get(sname).and_then(Axis::as_centred)
    }

    pub fn value(&self, sname: &str) -> Option<f64> {
        self.get(sname).map(AxisControl::value)
    }

    /// Route a raw sample to the axis with this code. Unknown codes are logged and
    /// give `None`.
    pub fn axis_updated(&self, code: &EventCode, raw: i32) -> Option<ButtonTransitions> {
        match self.by_code.get(code) {
            Some(&index) => Some(self.axes[index].receive_raw(raw)),
            None => {
                log::debug!("Unknown axis code {}", code);
                None
            }
        }
    }

    /// Re-zero every centred axis at its current position.
    pub fn set_axis_centres(&self) {
        for axis in self.axes.iter().filter_map(Axis::as_centred) {
            axis.centre_here();
        }
    }

    pub fn reset_axis_calibration(&self) {
        for axis in &self.axes {
            axis.reset();
        }
    }

    pub fn set_dead_zone(&self, dead_zone: f64) {
        for axis in &self.axes {
            axis.set_dead_zone(dead_zone);
        }
    }

    pub fn set_hot_zone(&self, hot_zone: f64) {
        for axis in &self.axes {
            axis.set_hot_zone(hot_zone);
        }
    }

    /// Axes not currently at rest
    pub fn active_axes(&self) -> Vec<&Axis> {
        self.axes.iter().filter(|axis| axis.value() != 0.0).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64, tolerance: f64) -> bool {
        (a - b).abs() < tolerance
    }

    #[test]
    fn test_centred_end_to_end_samples() {
        let axis = CentredAxis::new("Left Horizontal", 0, 255, 0, Some("lx")).with_zones(0.1, 0.1);
        axis.set_raw(0);
        assert!(approx(axis.value(), -1.0, 1e-6));
        axis.set_raw(128);
        assert!(approx(axis.value(), 0.0, 1e-6));
        axis.set_raw(255);
        assert!(approx(axis.value(), 1.0, 1e-6));
    }

    #[test]
    fn test_centred_cold_start_full_scale() {
        let axis = CentredAxis::new("x", -32768, 32767, 0, None);
        // Just short of 90% of the physical range already reads as nearly full deflection
        axis.set_raw(29000);
        assert!(axis.value() > 0.95);
        assert_eq!(axis.observed_range(), (-0.9, 0.9));

        axis.set_raw(32767);
        assert!(approx(axis.value(), 1.0, 1e-6));
        assert!(approx(axis.observed_range().1, 1.0, 1e-6));
    }

    #[test]
    fn test_centred_calibration_expands_only() {
        let axis = CentredAxis::new("x", 0, 1000, 0, None);
        axis.set_raw(1000);
        assert!(approx(axis.observed_range().1, 1.0, 1e-9));
        axis.set_raw(500);
        assert!(approx(axis.observed_range().1, 1.0, 1e-9));
        axis.set_raw(0);
        assert!(approx(axis.observed_range().0, -1.0, 1e-9));

        axis.reset();
        assert_eq!(axis.observed_range(), (-0.9, 0.9));
    }

    #[test]
    fn test_centred_reversed_raw_range() {
        let axis = CentredAxis::new("y", 255, 0, 1, Some("ly"));
        axis.set_raw(0);
        assert!(approx(axis.value(), 1.0, 1e-6));
        axis.set_raw(255);
        assert!(approx(axis.value(), -1.0, 1e-6));
    }

    #[test]
    fn test_centred_invert_flag() {
        let axis = CentredAxis::new("y", 0, 255, 1, Some("ly")).inverted(true);
        axis.set_raw(255);
        assert!(approx(axis.value(), -1.0, 1e-6));
    }

    #[test]
    fn test_centred_recentre() {
        let axis = CentredAxis::new("x", -100, 100, 0, None).with_zones(0.05, 0.0);
        axis.set_raw(10);
        assert!(axis.value() > 0.0);
        axis.centre_here();
        assert_eq!(axis.value(), 0.0);
        assert!(approx(axis.centre(), 0.1, 1e-9));
    }

    #[test]
    fn test_centred_zero_span_ignored() {
        let axis = CentredAxis::new("x", 5, 5, 0, None);
        axis.set_raw(7);
        assert_eq!(axis.raw_value(), 0.0);
        assert_eq!(axis.value(), 0.0);
    }

    #[test]
    fn test_trigger_mapping() {
        let axis = TriggerAxis::new("Left Trigger", 0, 1023, 2, Some("lt")).with_zones(0.1, 0.1);
        axis.set_raw(0);
        assert_eq!(axis.value(), 0.0);
        axis.set_raw(1023);
        assert!(approx(axis.value(), 1.0, 1e-6));
        axis.set_raw(512);
        let mid = axis.value();
        assert!(mid > 0.4 && mid < 0.6, "mid was {}", mid);
    }

    #[test]
    fn test_trigger_reversed_raw_range() {
        let axis = TriggerAxis::new("t", 255, 0, 2, None);
        axis.set_raw(255);
        assert_eq!(axis.value(), 0.0);
        axis.set_raw(0);
        assert!(approx(axis.value(), 1.0, 1e-6));
    }

    #[test]
    fn test_trigger_synthetic_button() {
        let axis = TriggerAxis::new("Left Trigger", 0, 255, 2, Some("lt")).with_button("l2", 0.5);
        let key = axis.button().unwrap().key().clone();

        assert!(axis.receive_raw(0).is_empty());
        let down = axis.receive_raw(255);
        assert_eq!(down.pressed, Some(key.clone()));
        assert!(axis.receive_raw(250).is_empty());
        let up = axis.receive_raw(10);
        assert_eq!(up.released, Some(key));
        assert!(up.pressed.is_none());
    }

    #[test]
    fn test_trigger_reset_clears_button() {
        let axis = TriggerAxis::new("Left Trigger", 0, 255, 2, Some("lt")).with_button("l2", 0.5);
        let key = axis.button().unwrap().key().clone();

        assert_eq!(axis.receive_raw(255).pressed, Some(key.clone()));
        axis.reset();
        assert!(axis.receive_raw(0).is_empty());
        assert_eq!(axis.receive_raw(255).pressed, Some(key));
    }

    #[test]
    fn test_binary_axis_transitions() {
        let axis = BinaryAxis::new("D-pad Horizontal", 16, Some("dleft"), Some("dright"));
        let low = axis.low_button().key().clone();
        let high = axis.high_button().key().clone();

        let t = axis.receive_raw(-1);
        assert_eq!(t.pressed, Some(low.clone()));
        assert!(t.released.is_none());
        assert_eq!(axis.value(), -1.0);

        let t = axis.receive_raw(1);
        assert_eq!(t.released, Some(low));
        assert_eq!(t.pressed, Some(high.clone()));

        assert!(axis.receive_raw(1).is_empty());

        let t = axis.receive_raw(0);
        assert_eq!(t.released, Some(high));
        assert!(t.pressed.is_none());
    }

    #[test]
    fn test_binary_axis_uses_sign_of_large_values() {
        let axis = BinaryAxis::new("hat", 17, Some("dup"), Some("ddown"));
        let t = axis.receive_raw(-127);
        assert_eq!(t.pressed, Some(axis.low_button().key().clone()));
        assert_eq!(axis.value(), -1.0);
    }

    #[test]
    fn test_circular_clamps_to_unit_circle() {
        let x = CentredAxis::new("x", -100, 100, 0, None);
        let y = CentredAxis::new("y", -100, 100, 1, None);
        x.set_raw(100);
        y.set_raw(100);
        let (cx, cy) = CircularCentredAxis::new(&x, &y, 0.1, 0.1).value();
        assert!(approx(cx.hypot(cy), 1.0, 1e-9));
        assert!(approx(cx, cy, 1e-9));
    }

    #[test]
    fn test_circular_dead_zone() {
        let x = CentredAxis::new("x", -100, 100, 0, None);
        let y = CentredAxis::new("y", -100, 100, 1, None);
        x.set_raw(5);
        y.set_raw(-5);
        assert_eq!(CircularCentredAxis::new(&x, &y, 0.1, 0.1).value(), (0.0, 0.0));
    }

    #[test]
    fn test_axes_routing() {
        let axes = Axes::new(vec![
            Axis::Centred(CentredAxis::new("Left Horizontal", 0, 255, 0, Some("lx"))),
            Axis::Trigger(TriggerAxis::new("Left Trigger", 0, 255, 2, Some("lt"))),
            Axis::Centred(CentredAxis::new("Gyro", -100, 100, EventCode::prefixed("motion", 0), Some("gx"))),
        ]);
        assert_eq!(axes.len(), 3);
        assert!(axes.axis_updated(&EventCode::new(0), 255).is_some());
        assert!(axes.axis_updated(&EventCode::new(9), 255).is_none());
        assert!(approx(axes.value("lx").unwrap(), 1.0, 1e-6));

        axes.axis_updated(&EventCode::prefixed("motion", 0), -100);
        assert!(approx(axes.value("gx").unwrap(), -1.0, 1e-6));
        assert!(approx(axes.value("lx").unwrap(), 1.0, 1e-6));
        assert_eq!(axes.active_axes().len(), 2);
    }

    #[test]
    fn test_axes_zone_overrides_and_reset() {
        let axes = Axes::new(vec![
            Axis::Centred(CentredAxis::new("x", 0, 255, 0, Some("lx"))),
            Axis::Binary(BinaryAxis::new("hat", 16, Some("dleft"), Some("dright"))),
        ]);
        axes.set_dead_zone(0.2);
        axes.set_hot_zone(0.05);
        let lx = axes.centred("lx").unwrap();
        assert_eq!(lx.dead_zone(), 0.2);
        assert_eq!(lx.hot_zone(), 0.05);
        assert!(axes.centred("dleft").is_none());

        axes.axis_updated(&EventCode::new(0), 200);
        axes.set_axis_centres();
        assert_eq!(axes.value("lx"), Some(0.0));
        axes.reset_axis_calibration();
        assert_eq!(lx.centre(), 0.0);
    }
}
