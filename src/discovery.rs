//! Finding attached controllers and matching them against what the caller needs.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::controller::{Controller, Zones};
use crate::error::{InputError, Result};
use crate::input::{DeviceInfo, EventSource, SourceProvider};
use crate::profile::ControllerRegistry;

/// Best-effort identifier for the physical device behind a node.
///
/// Prefers the hardware unique ID, then the first segment of the physical bus
/// path (shared by every node of a composite device), and finally a composite of
/// the ids and node path.
pub fn unique_name(info: &DeviceInfo) -> String {
    if let Some(uniq) = info.uniq.as_deref().filter(|u| !u.is_empty()) {
        return uniq.to_string();
    }
    if let Some(phys) = info.phys.as_deref().filter(|p| !p.is_empty()) {
        return phys.split('/').next().unwrap_or(phys).to_string();
    }
    format!(
        "{}-{}-{}-{}",
        info.vendor,
        info.product,
        info.version,
        info.path.display()
    )
}

/// A controller found on the host together with the device nodes feeding it.
///
/// Ordered so the richest controller comes first: more axes, then more buttons,
/// then by name.
#[derive(Debug)]
pub struct ControllerDiscovery {
    pub controller: Arc<Controller>,
    pub devices: Vec<Box<dyn EventSource>>,
    /// Unique name shared by the devices
    pub name: String,
}

impl ControllerDiscovery {
    pub fn new(controller: Controller, devices: Vec<Box<dyn EventSource>>, name: impl Into<String>) -> Self {
        Self {
            controller: Arc::new(controller),
            devices,
            name: name.into(),
        }
    }
}

impl fmt::Display for ControllerDiscovery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let paths: Vec<String> = self
            .devices
            .iter()
            .map(|d| d.info().path.display().to_string())
            .collect();
        write!(f, "{}({})", self.controller.kind(), paths.join(","))
    }
}

impl Ord for ControllerDiscovery {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .controller
            .axis_count()
            .cmp(&self.controller.axis_count())
            .then_with(|| other.controller.button_count().cmp(&self.controller.button_count()))
            .then_with(|| self.name.cmp(&other.name))
            .then_with(|| self.controller.kind().cmp(other.controller.kind()))
    }
}

impl PartialOrd for ControllerDiscovery {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ControllerDiscovery {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ControllerDiscovery {}

type Predicate = Arc<dyn Fn(&Controller) -> bool + Send + Sync>;

/// Filter used to pick one discovery. Every condition that is set must hold.
#[derive(Clone, Default)]
pub struct ControllerRequirement {
    kind: Option<String>,
    snames: Vec<String>,
    predicate: Option<Predicate>,
}

impl ControllerRequirement {
    /// Accept any controller
    pub fn any() -> Self {
        Self::default()
    }

    /// Only accept controllers of this kind (profile name)
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Require every one of these standard names to be present
    pub fn with_snames(mut self, snames: &[&str]) -> Self {
        self.snames.extend(snames.iter().map(|s| s.to_string()));
        self
    }

    pub fn with_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Controller) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    pub fn accept(&self, discovery: &ControllerDiscovery) -> bool {
        let controller = &discovery.controller;
        if let Some(kind) = &self.kind {
            if controller.kind() != kind {
                return false;
            }
        }
        if !self.snames.iter().all(|sname| controller.has_control(sname)) {
            return false;
        }
        self.predicate
            .as_ref()
            .map_or(true, |predicate| predicate(controller))
    }
}

impl fmt::Debug for ControllerRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerRequirement")
            .field("kind", &self.kind)
            .field("snames", &self.snames)
            .field("predicate", &self.predicate.is_some())
            .finish()
    }
}

/// Every controller attached to the host that the registry knows how to build,
/// richest first.
pub fn find_all_controllers(
    provider: &dyn SourceProvider,
    registry: &ControllerRegistry,
    zones: Zones,
) -> Result<Vec<ControllerDiscovery>> {
    let mut groups: BTreeMap<String, Vec<Box<dyn EventSource>>> = BTreeMap::new();
    for source in provider.enumerate()? {
        groups.entry(unique_name(source.info())).or_default().push(source);
    }

    let mut discoveries = Vec::new();
    for (name, mut devices) in groups {
        let Some(info) = devices
            .iter()
            .map(|d| d.info())
            .find(|info| registry.lookup(info.vendor, info.product).is_some())
            .cloned()
        else {
            continue;
        };
        let Some(controller) = registry.create(info.vendor, info.product, zones)? else {
            continue;
        };
        devices.sort_by(|a, b| a.info().path.cmp(&b.info().path));
        log::info!(
            "Found {} '{}' on {} node(s)",
            controller.kind(),
            name,
            devices.len()
        );
        for device in &devices {
            log::debug!("  {} {}", device.info().path.display(), device.info().name);
        }
        discoveries.push(ControllerDiscovery::new(controller, devices, name));
    }

    discoveries.sort();
    Ok(discoveries)
}

/// Greedily assign each requirement, in order, the first unclaimed discovery it
/// accepts. Fails if any requirement goes unmet; there is no backtracking, so
/// put the most specific requirements first. No requirements means one that
/// accepts anything.
pub fn match_requirements(
    mut pool: Vec<ControllerDiscovery>,
    requirements: &[ControllerRequirement],
) -> Result<Vec<ControllerDiscovery>> {
    let any = [ControllerRequirement::any()];
    let requirements = if requirements.is_empty() {
        &any[..]
    } else {
        requirements
    };

    let available = pool.len();
    let mut matched = Vec::with_capacity(requirements.len());
    for requirement in requirements {
        match pool.iter().position(|d| requirement.accept(d)) {
            Some(index) => matched.push(pool.remove(index)),
            None => {
                log::info!(
                    "Unable to satisfy controller requirements, required {:?}, found {} controller(s)",
                    requirements,
                    available
                );
                return Err(InputError::not_found(format!(
                    "{} controller(s) attached, none left matching {:?}",
                    available, requirement
                )));
            }
        }
    }
    Ok(matched)
}

/// Discover attached controllers and match them against `requirements`.
pub fn find_matching_controllers(
    provider: &dyn SourceProvider,
    registry: &ControllerRegistry,
    zones: Zones,
    requirements: &[ControllerRequirement],
) -> Result<Vec<ControllerDiscovery>> {
    match_requirements(find_all_controllers(provider, registry, zones)?, requirements)
}
