//! Buttons and their press/release state.
//!
//! Every [`Button`] gets a [`ButtonState`] tracking whether it's held, when it was
//! last pressed, and whether it went down or up since the last time somebody asked.
//! State is written by the binder thread and read from anywhere.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::{Duration, Instant};

use crate::input::EventCode;
use crate::lock;

/// How events reach a button. Real keys are addressed by event code, the others are
/// synthesised from axis movement.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ButtonKey {
    Code(EventCode),
    /// Negative half of a binary axis (e.g. d-pad left)
    AxisLow(EventCode),
    /// Positive half of a binary axis (e.g. d-pad right)
    AxisHigh(EventCode),
    /// Threshold crossing on an analogue trigger
    Trigger(EventCode),
}

impl fmt::Display for ButtonKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code(code) => write!(f, "{}", code),
            Self::AxisLow(code) => write!(f, "{}_low", code),
            Self::AxisHigh(code) => write!(f, "{}_high", code),
            Self::Trigger(code) => write!(f, "{}_trigger", code),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    name: String,
    sname: Option<String>,
    key: ButtonKey,
}

impl Button {
    pub fn new(name: impl Into<String>, code: impl Into<EventCode>, sname: Option<&str>) -> Self {
        Self::with_key(name, ButtonKey::Code(code.into()), sname)
    }

    pub fn with_key(name: impl Into<String>, key: ButtonKey, sname: Option<&str>) -> Self {
        Self {
            name: name.into(),
            sname: sname.map(str::to_string),
            key,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Standard name, e.g. `circle` or `dleft`
    pub fn sname(&self) -> Option<&str> {
        self.sname.as_deref()
    }

    pub fn key(&self) -> &ButtonKey {
        &self.key
    }
}

type Handler = Arc<dyn Fn(&Button) + Send + Sync>;

pub struct ButtonState {
    button: Button,
    is_pressed: AtomicBool,
    pressed_since_check: AtomicBool,
    released_since_check: AtomicBool,
    last_pressed: Mutex<Option<Instant>>,
    handlers: Mutex<Vec<(u64, Handler)>>,
}

impl ButtonState {
    fn new(button: Button) -> Self {
        Self {
            button,
            is_pressed: AtomicBool::new(false),
            pressed_since_check: AtomicBool::new(false),
            released_since_check: AtomicBool::new(false),
            last_pressed: Mutex::new(None),
            handlers: Mutex::new(Vec::new()),
        }
    }

    pub fn button(&self) -> &Button {
        &self.button
    }

    pub fn is_pressed(&self) -> bool {
        self.is_pressed.load(Ordering::Acquire)
    }

    pub fn last_pressed(&self) -> Option<Instant> {
        *lock(&self.last_pressed)
    }

    /// Time since the press, if the button is down right now.
    pub fn held(&self) -> Option<Duration> {
        if !self.is_pressed() {
            return None;
        }
        self.last_pressed().map(|pressed| pressed.elapsed())
    }

    fn press(&self) {
        // Handlers may deregister themselves, so call them outside the lock
        let handlers: Vec<Handler> = lock(&self.handlers)
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();
        for handler in handlers {
            handler(&self.button);
        }
        *lock(&self.last_pressed) = Some(Instant::now());
        self.is_pressed.store(true, Ordering::Release);
        self.pressed_since_check.store(true, Ordering::Release);
    }

    fn release(&self) {
        self.is_pressed.store(false, Ordering::Release);
        *lock(&self.last_pressed) = None;
        self.released_since_check.store(true, Ordering::Release);
    }
}

impl fmt::Debug for ButtonState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ButtonState")
            .field("button", &self.button)
            .field("is_pressed", &self.is_pressed())
            .field("handlers", &lock(&self.handlers).len())
            .finish()
    }
}

/// Buttons which went down (or up) between two history checks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ButtonPresses {
    buttons: Vec<Button>,
}

impl ButtonPresses {
    /// True if the button with this standard name is in the set
    pub fn contains(&self, sname: &str) -> bool {
        self.buttons.iter().any(|b| b.sname() == Some(sname))
    }

    pub fn is_empty(&self) -> bool {
        self.buttons.is_empty()
    }

    pub fn len(&self) -> usize {
        self.buttons.len()
    }

    pub fn names(&self) -> Vec<&str> {
        self.buttons.iter().filter_map(Button::sname).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Button> {
        self.buttons.iter()
    }
}

/// Removes a handler registered with [`Buttons::register_handler`]. Removing more
/// than once, or after the controller has gone, does nothing.
#[derive(Debug, Clone)]
pub struct HandlerRegistration {
    id: u64,
    states: Vec<Weak<ButtonState>>,
}

impl HandlerRegistration {
    pub fn remove(&self) {
        for state in self.states.iter().filter_map(Weak::upgrade) {
            lock(&state.handlers).retain(|(id, _)| *id != self.id);
        }
    }
}

/// All buttons of one controller, addressable by routing key or standard name.
#[derive(Debug)]
pub struct Buttons {
    states: Vec<Arc<ButtonState>>,
    by_key: HashMap<ButtonKey, usize>,
    by_sname: HashMap<String, usize>,
    next_handler_id: AtomicU64,
}

impl Buttons {
    pub fn new(buttons: Vec<Button>) -> Self {
        let mut by_key = HashMap::new();
        let mut by_sname = HashMap::new();
        let mut states = Vec::with_capacity(buttons.len());

        for button in buttons {
            let index = states.len();
            if by_key.insert(button.key().clone(), index).is_some() {
                log::warn!("Duplicate button key {}, '{}' takes precedence", button.key(), button.name());
            }
            if let Some(sname) = button.sname() {
                by_sname.insert(sname.to_string(), index);
            }
            states.push(Arc::new(ButtonState::new(button)));
        }

        Self {
            states,
            by_key,
            by_sname,
            next_handler_id: AtomicU64::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Standard names of every button that has one
    pub fn names(&self) -> Vec<&str> {
        self.states.iter().filter_map(|s| s.button.sname()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Button> {
        self.states.iter().map(|s| &s.button)
    }

    pub fn state(&self, sname: &str) -> Option<&ButtonState> {
        self.by_sname.get(sname).map(|&i| self.states[i].as_ref())
    }

    pub fn for_name(&self, sname: &str) -> Option<&Button> {
        self.state(sname).map(ButtonState::button)
    }

    pub fn contains(&self, sname: &str) -> bool {
        self.by_sname.contains_key(sname)
    }

    /// Record a press. Returns false (and logs) for keys with no button.
    pub fn button_pressed(&self, key: &ButtonKey) -> bool {
        match self.by_key.get(key) {
            Some(&index) => {
                self.states[index].press();
                true
            }
            None => {
                log::debug!("Unknown button code {}", key);
                false
            }
        }
    }

    /// Record a release. Returns false (and logs) for keys with no button.
    pub fn button_released(&self, key: &ButtonKey) -> bool {
        match self.by_key.get(key) {
            Some(&index) => {
                self.states[index].release();
                true
            }
            None => {
                log::debug!("Unknown button code {}", key);
                false
            }
        }
    }

    /// Buttons pressed since the previous call, clearing the history as it goes.
    pub fn check_presses(&self) -> ButtonPresses {
        ButtonPresses {
            buttons: self
                .states
                .iter()
                .filter(|s| s.pressed_since_check.swap(false, Ordering::AcqRel))
                .map(|s| s.button.clone())
                .collect(),
        }
    }

    /// Buttons released since the previous call, clearing the history as it goes.
    pub fn check_releases(&self) -> ButtonPresses {
        ButtonPresses {
            buttons: self
                .states
                .iter()
                .filter(|s| s.released_since_check.swap(false, Ordering::AcqRel))
                .map(|s| s.button.clone())
                .collect(),
        }
    }

    /// How long the named button has been held, or `None` if it's up or doesn't exist.
    pub fn held(&self, sname: &str) -> Option<Duration> {
        self.state(sname).and_then(ButtonState::held)
    }

    pub fn is_pressed(&self, sname: &str) -> bool {
        self.state(sname).map(ButtonState::is_pressed).unwrap_or(false)
    }

    /// Call `handler` on the binder thread whenever one of the named buttons goes
    /// down. Names the controller doesn't have are skipped.
    pub fn register_handler<F>(&self, snames: &[&str], handler: F) -> HandlerRegistration
    where
        F: Fn(&Button) + Send + Sync + 'static,
    {
        let id = self.next_handler_id.fetch_add(1, Ordering::Relaxed);
        let handler: Handler = Arc::new(handler);
        let mut states = Vec::new();

        for sname in snames {
            match self.by_sname.get(*sname) {
                Some(&index) => {
                    let state = &self.states[index];
                    lock(&state.handlers).push((id, Arc::clone(&handler)));
                    states.push(Arc::downgrade(state));
                }
                None => log::debug!("No button '{}' to attach handler to", sname),
            }
        }

        HandlerRegistration { id, states }
    }
}
