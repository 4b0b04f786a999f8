//! Background thread keeping bound controllers in sync with their hardware.

use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::Sender;

use crate::config::InputConfig;
use crate::controller::Controller;
use crate::discovery::{find_matching_controllers, ControllerDiscovery, ControllerRequirement};
use crate::error::{InputError, Result};
use crate::input::{wait_for_readiness, EventSource, RawEvent, SourceProvider};
use crate::profile::ControllerRegistry;
use crate::sysfs::SysfsCache;

const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(500);

/// An event as received by the binder, with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundEvent {
    /// Kind of the controller the event was routed to
    pub controller: String,
    /// Unique name of the physical device
    pub device: String,
    pub node: PathBuf,
    pub prefix: Option<String>,
    pub event: RawEvent,
}

/// Settings for [`bind_controllers`].
#[derive(Debug)]
pub struct BindOptions<'a> {
    pub poll_timeout: Duration,
    pub log_events: bool,
    pub event_tap: Option<Sender<BoundEvent>>,
    /// Refreshed before the devices are grabbed
    pub sysfs: Option<&'a mut SysfsCache>,
}

impl Default for BindOptions<'_> {
    fn default() -> Self {
        Self {
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            log_events: false,
            event_tap: None,
            sysfs: None,
        }
    }
}

impl<'a> BindOptions<'a> {
    pub fn with_event_tap(mut self, tap: Sender<BoundEvent>) -> Self {
        self.event_tap = Some(tap);
        self
    }

    pub fn with_sysfs(mut self, cache: &'a mut SysfsCache) -> Self {
        self.sysfs = Some(cache);
        self
    }
}

impl From<&InputConfig> for BindOptions<'_> {
    fn from(config: &InputConfig) -> Self {
        Self {
            poll_timeout: config.poll_timeout(),
            log_events: config.log_events,
            ..Default::default()
        }
    }
}

/// Where events from one device node go.
struct Route {
    controller: Arc<Controller>,
    device: String,
    prefix: Option<String>,
}

/// Handle to a running binder thread.
///
/// Unbinding, explicitly or by dropping, stops the thread and releases every
/// grabbed node.
#[derive(Debug)]
pub struct Binder {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<Vec<Box<dyn EventSource>>>>,
    controllers: Vec<Arc<Controller>>,
}

fn ungrab_all(sources: &mut [Box<dyn EventSource>]) {
    for source in sources {
        if let Err(e) = source.ungrab() {
            log::debug!("Ungrab of {} failed: {}", source.info().path.display(), e);
        }
    }
}

/// Grab every device node of the discoveries and start a thread routing their
/// events into the controllers.
///
/// Grabbing is all or nothing: if any node is already held elsewhere, the ones
/// grabbed so far are released and the call fails.
pub fn bind_controllers(discoveries: Vec<ControllerDiscovery>, options: BindOptions<'_>) -> Result<Binder> {
    if discoveries.is_empty() {
        return Err(InputError::not_found("nothing to bind"));
    }

    let mut sources: Vec<Box<dyn EventSource>> = Vec::new();
    let mut routes = Vec::new();
    let mut controllers = Vec::new();
    for discovery in discoveries {
        let composite = discovery.devices.len() > 1;
        for device in discovery.devices {
            let prefix = if composite {
                discovery.controller.node_prefix(&device.info().name).map(str::to_string)
            } else {
                None
            };
            routes.push(Route {
                controller: Arc::clone(&discovery.controller),
                device: discovery.name.clone(),
                prefix,
            });
            sources.push(device);
        }
        controllers.push((discovery.controller, discovery.name));
    }

    if let Some(cache) = options.sysfs {
        if let Err(e) = cache.refresh() {
            log::warn!("Failed to refresh sysfs cache: {}", e);
        }
    }

    for index in 0..sources.len() {
        if let Err(source) = sources[index].grab() {
            let device = sources[index].info().path.clone();
            log::error!("Failed to grab {}: {}", device.display(), source);
            ungrab_all(&mut sources[..index]);
            return Err(InputError::Grab { device, source });
        }
    }

    for (controller, name) in &controllers {
        controller.mark_bound(name);
    }
    let controllers: Vec<Arc<Controller>> = controllers.into_iter().map(|(c, _)| c).collect();

    let running = Arc::new(AtomicBool::new(true));
    let thread_running = Arc::clone(&running);
    let thread_controllers = controllers.clone();
    let poll_timeout = options.poll_timeout;
    let log_events = options.log_events;
    let event_tap = options.event_tap;

    let handle = thread::Builder::new()
        .name("padbind-binder".to_string())
        .spawn(move || {
            run(
                sources,
                routes,
                &thread_controllers,
                &thread_running,
                poll_timeout,
                log_events,
                event_tap,
            )
        });

    let handle = match handle {
        Ok(handle) => handle,
        Err(e) => {
            for controller in &controllers {
                controller.mark_unbound(None);
            }
            return Err(e.into());
        }
    };

    Ok(Binder {
        running,
        handle: Some(handle),
        controllers,
    })
}

fn run(
    mut sources: Vec<Box<dyn EventSource>>,
    routes: Vec<Route>,
    controllers: &[Arc<Controller>],
    running: &AtomicBool,
    poll_timeout: Duration,
    log_events: bool,
    mut event_tap: Option<Sender<BoundEvent>>,
) -> Vec<Box<dyn EventSource>> {
    log::info!("Binder started with {} device node(s)", sources.len());

    while running.load(Ordering::SeqCst) {
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            read_ready(&mut sources, &routes, poll_timeout, log_events, &mut event_tap)
        }))
        .unwrap_or_else(|payload| Err(panic_error(payload.as_ref())));
        match result {
            Ok(()) => {}
            Err(e) => {
                log::error!("Binder stopping after read error: {}", e);
                let error = Arc::new(e);
                for controller in controllers {
                    controller.mark_unbound(Some(Arc::clone(&error)));
                }
                running.store(false, Ordering::SeqCst);
            }
        }
    }

    log::info!("Binder stopped");
    sources
}

/// Turn a panic raised while routing events (usually from a button handler)
/// into the error reported by the controllers.
fn panic_error(payload: &(dyn Any + Send)) -> io::Error {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    io::Error::new(io::ErrorKind::Other, format!("panic while handling events: {}", message))
}

fn read_ready(
    sources: &mut [Box<dyn EventSource>],
    routes: &[Route],
    poll_timeout: Duration,
    log_events: bool,
    event_tap: &mut Option<Sender<BoundEvent>>,
) -> io::Result<()> {
    for index in wait_for_readiness(sources, poll_timeout)? {
        let source = &mut sources[index];
        let route = &routes[index];
        for event in source.fetch_events()? {
            if log_events {
                log::info!("{} {:?}: {:?}", source.info().path.display(), route.prefix, event);
            }
            if let Some(tap) = event_tap.as_ref() {
                let bound = BoundEvent {
                    controller: route.controller.kind().to_string(),
                    device: route.device.clone(),
                    node: source.info().path.clone(),
                    prefix: route.prefix.clone(),
                    event,
                };
                if tap.send(bound).is_err() {
                    log::debug!("Event tap receiver gone, no longer forwarding");
                    *event_tap = None;
                }
            }
            route.controller.handle_event(&event, route.prefix.as_deref());
        }
    }
    Ok(())
}

impl Binder {
    pub fn controllers(&self) -> &[Arc<Controller>] {
        &self.controllers
    }

    /// True until the thread stops, either from `unbind` or a read error.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
            && self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Stop the thread and release the devices. Safe to call more than once, and
    /// after the hardware has gone.
    pub fn unbind(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        self.running.store(false, Ordering::SeqCst);
        match handle.join() {
            Ok(mut sources) => ungrab_all(&mut sources),
            Err(e) => log::error!("Binder thread panicked: {:?}", e),
        }
        for controller in &self.controllers {
            controller.mark_unbound(None);
        }
    }
}

impl Drop for Binder {
    fn drop(&mut self) {
        self.unbind();
    }
}

/// Finds and binds controllers on creation, unbinds them when dropped.
#[derive(Debug)]
pub struct ControllerResource {
    binder: Binder,
    controller: Arc<Controller>,
}

impl ControllerResource {
    pub fn new(
        provider: &dyn SourceProvider,
        registry: &ControllerRegistry,
        config: &InputConfig,
        requirements: &[ControllerRequirement],
    ) -> Result<Self> {
        let discoveries = find_matching_controllers(provider, registry, config.zones(), requirements)?;
        let binder = bind_controllers(discoveries, BindOptions::from(config))?;
        let controller = binder
            .controllers()
            .first()
            .cloned()
            .ok_or_else(|| InputError::not_found("nothing bound"))?;
        Ok(Self { binder, controller })
    }

    /// The controller matching the first requirement
    pub fn controller(&self) -> &Arc<Controller> {
        &self.controller
    }

    /// Controllers in requirement order
    pub fn controllers(&self) -> &[Arc<Controller>] {
        self.binder.controllers()
    }

    pub fn unbind(&mut self) {
        self.binder.unbind();
    }
}
