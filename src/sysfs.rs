//! LED and battery nodes under `/sys/class`, keyed on the same hardware id that
//! [`unique_name`](crate::discovery::unique_name) gives the controller's input nodes.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Snapshot of the LED and battery nodes found under a sysfs root.
///
/// Built once and refreshed explicitly, typically when a controller is bound.
#[derive(Debug, Clone, Default)]
pub struct SysfsCache {
    root: PathBuf,
    /// hardware id -> LED name -> brightness file
    leds: HashMap<String, HashMap<String, PathBuf>>,
    /// hardware id -> capacity file
    batteries: HashMap<String, PathBuf>,
}

/// `HID_UNIQ` if set, otherwise the first segment of `PHYS`.
fn hardware_id(uevent: &str) -> Option<String> {
    let mut hid_uniq = None;
    let mut phys = None;
    for line in uevent.lines() {
        let Some((name, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.replace('"', "");
        if value.is_empty() {
            continue;
        }
        match name {
            "HID_UNIQ" => hid_uniq = Some(value),
            "PHYS" => phys = value.split('/').next().map(str::to_string),
            _ => {}
        }
    }
    hid_uniq.or(phys)
}

fn class_entries(root: &Path, class: &str) -> io::Result<Vec<PathBuf>> {
    let dir = root.join("class").join(class);
    match fs::read_dir(&dir) {
        Ok(entries) => entries.map(|entry| entry.map(|e| e.path())).collect(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::debug!("No {:?} on this system", dir);
            Ok(Vec::new())
        }
        Err(e) => Err(e),
    }
}

fn entry_hardware_id(entry: &Path) -> Option<String> {
    let uevent = entry.join("device").join("uevent");
    match fs::read_to_string(&uevent) {
        Ok(contents) => hardware_id(&contents),
        Err(_) => None,
    }
}

impl SysfsCache {
    pub fn scan(root: impl Into<PathBuf>) -> Result<Self> {
        let mut cache = Self {
            root: root.into(),
            ..Default::default()
        };
        cache.refresh()?;
        Ok(cache)
    }

    /// Re-read the sysfs tree.
    pub fn refresh(&mut self) -> Result<()> {
        let mut leds: HashMap<String, HashMap<String, PathBuf>> = HashMap::new();
        for entry in class_entries(&self.root, "leds")? {
            let Some(id) = entry_hardware_id(&entry) else {
                continue;
            };
            let Some(dir_name) = entry.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            // e.g. input5:rgb:red -> red
            let led_name = dir_name.rsplit(':').next().unwrap_or(dir_name).to_string();
            leds.entry(id)
                .or_default()
                .insert(led_name, entry.join("brightness"));
        }

        let mut batteries = HashMap::new();
        for entry in class_entries(&self.root, "power_supply")? {
            if let Some(id) = entry_hardware_id(&entry) {
                batteries.insert(id, entry.join("capacity"));
            }
        }

        log::debug!(
            "Sysfs scan of {:?}: {} device(s) with LEDs, {} batter(ies)",
            self.root,
            leds.len(),
            batteries.len()
        );
        self.leds = leds;
        self.batteries = batteries;
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn led_names(&self, hw_id: &str) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .leds
            .get(hw_id)
            .map(|leds| leds.keys().map(String::as_str).collect())
            .unwrap_or_default();
        names.sort_unstable();
        names
    }

    pub fn has_battery(&self, hw_id: &str) -> bool {
        self.batteries.contains_key(hw_id)
    }

    /// Set an LED's brightness. Returns false if the device has no such LED.
    pub fn write_led(&self, hw_id: &str, led: &str, value: u32) -> Result<bool> {
        let Some(path) = self.leds.get(hw_id).and_then(|leds| leds.get(led)) else {
            log::debug!("No led called {} for {}", led, hw_id);
            return Ok(false);
        };
        fs::write(path, value.to_string())?;
        Ok(true)
    }

    /// Battery level in percent, `None` if the device doesn't report one.
    pub fn read_battery(&self, hw_id: &str) -> Result<Option<u8>> {
        let Some(path) = self.batteries.get(hw_id) else {
            return Ok(None);
        };
        let contents = fs::read_to_string(path)?;
        let level = contents.trim().parse::<u8>().map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("bad capacity '{}' in {:?}: {}", contents.trim(), path, e),
            )
        })?;
        Ok(Some(level))
    }
}
