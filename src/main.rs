use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use padbind::{
    bind_controllers, find_matching_controllers, BindOptions, ControllerRegistry, InputConfig, InputError,
    SourceProvider, SysfsCache,
};

const RETRY_DELAY: Duration = Duration::from_secs(1);
const REPORT_INTERVAL: Duration = Duration::from_millis(100);

fn load_config() -> InputConfig {
    match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => match InputConfig::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("Failed to load config {:?}: {}, using defaults", path, e);
                InputConfig::default()
            }
        },
        None => InputConfig::load().unwrap_or_default(),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = load_config();
    let mut registry = ControllerRegistry::builtin();
    for path in &config.profiles {
        if let Err(e) = registry.load_profile(path) {
            log::error!("Failed to load profile {:?}: {}", path, e);
        }
    }
    let mut sysfs = SysfsCache::scan(&config.sysfs_root)?;

    #[cfg(target_os = "linux")]
    return run(&padbind::input::evdev_reader::EvdevProvider, &config, &registry, &mut sysfs);
    #[cfg(not(target_os = "linux"))]
    anyhow::bail!("evdev input is only available on Linux");
}

/// Discover, bind and report until the controller goes away, then start over.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn run(
    provider: &dyn SourceProvider,
    config: &InputConfig,
    registry: &ControllerRegistry,
    sysfs: &mut SysfsCache,
) -> anyhow::Result<()> {
    loop {
        let discoveries = match find_matching_controllers(provider, registry, config.zones(), &[]) {
            Ok(discoveries) => discoveries,
            Err(e) if e.is_not_found() => {
                log::debug!("{}", e);
                thread::sleep(RETRY_DELAY);
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let options = BindOptions::from(config).with_sysfs(sysfs);
        let mut binder = match bind_controllers(discoveries, options) {
            Ok(binder) => binder,
            Err(e @ InputError::Grab { .. }) => {
                log::warn!("{}", e);
                thread::sleep(RETRY_DELAY);
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        let Some(controller) = binder.controllers().first().map(Arc::clone) else {
            continue;
        };

        log::info!("Bound {}", controller.kind());
        if let Some(id) = controller.device_unique_name() {
            match sysfs.read_battery(&id) {
                Ok(Some(level)) => log::info!("Battery at {}%", level),
                Ok(None) => {}
                Err(e) => log::warn!("Failed to read battery level: {}", e),
            }
        }

        while controller.connected() {
            let presses = controller.check_presses();
            if !presses.is_empty() {
                log::info!("Pressed {:?}", presses.names());
            }
            let releases = controller.check_releases();
            if !releases.is_empty() {
                log::info!("Released {:?}", releases.names());
            }
            if !controller.axes().active_axes().is_empty() {
                log::info!("{}", controller);
            }
            thread::sleep(REPORT_INTERVAL);
        }

        binder.unbind();
        match controller.last_error() {
            Some(e) => log::warn!("Controller disconnected: {}", e),
            None => log::info!("Controller disconnected"),
        }
        thread::sleep(RETRY_DELAY);
    }
}
