//! Declarative controller definitions and the vendor/product registry.
//!
//! A profile lists its controls as colon separated strings:
//!
//! ```text
//! buttons       NAME:CODE:SNAME
//! centred_axes  NAME:LOW:HIGH:CODE:SNAME           (LOW maps to -1.0, swap to invert)
//! trigger_axes  NAME:MIN:MAX:CODE:SNAME[:BUTTON_SNAME:THRESHOLD]
//! binary_axes   NAME:CODE:LOW_SNAME:HIGH_SNAME
//! ```
//!
//! A code may be written `prefix/123` to route it from a secondary device node, see
//! `node_mappings`.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::axis::{BinaryAxis, CentredAxis, TriggerAxis};
use crate::buttons::Button;
use crate::controller::{Control, Controller, Zones};
use crate::error::{InputError, Result};
use crate::input::EventCode;

const SEPARATOR: char = ':';

/// USB (or bluetooth) vendor and product pair a profile applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceId {
    pub vendor: u16,
    pub product: u16,
}

impl DeviceId {
    pub fn new(vendor: u16, product: u16) -> Self {
        Self { vendor, product }
    }
}

/// One parsed control definition.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlSpec {
    Button {
        name: String,
        code: EventCode,
        sname: Option<String>,
    },
    Centred {
        name: String,
        low: i32,
        high: i32,
        code: EventCode,
        sname: Option<String>,
    },
    Trigger {
        name: String,
        min: i32,
        max: i32,
        code: EventCode,
        sname: Option<String>,
        button: Option<(String, f64)>,
    },
    Binary {
        name: String,
        code: EventCode,
        low_sname: Option<String>,
        high_sname: Option<String>,
    },
}

fn fields<'a>(spec: &'a str, kind: &str, counts: &[usize]) -> Result<Vec<&'a str>> {
    let parts: Vec<&str> = spec.split(SEPARATOR).map(str::trim).collect();
    if counts.contains(&parts.len()) {
        Ok(parts)
    } else {
        Err(InputError::Profile(format!(
            "{} '{}' has {} fields, expected {:?}",
            kind,
            spec,
            parts.len(),
            counts
        )))
    }
}

fn optional(field: &str) -> Option<String> {
    if field.is_empty() {
        None
    } else {
        Some(field.to_string())
    }
}

fn number<T: std::str::FromStr>(spec: &str, field: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    field
        .parse()
        .map_err(|e| InputError::Profile(format!("bad number '{}' in '{}': {}", field, spec, e)))
}

impl ControlSpec {
    pub fn parse_button(spec: &str) -> Result<Self> {
        let f = fields(spec, "button", &[3])?;
        Ok(Self::Button {
            name: f[0].to_string(),
            code: f[1].parse()?,
            sname: optional(f[2]),
        })
    }

    pub fn parse_centred(spec: &str) -> Result<Self> {
        let f = fields(spec, "centred axis", &[5])?;
        Ok(Self::Centred {
            name: f[0].to_string(),
            low: number(spec, f[1])?,
            high: number(spec, f[2])?,
            code: f[3].parse()?,
            sname: optional(f[4]),
        })
    }

    pub fn parse_trigger(spec: &str) -> Result<Self> {
        let f = fields(spec, "trigger axis", &[5, 7])?;
        let button = if f.len() == 7 {
            Some((f[5].to_string(), number(spec, f[6])?))
        } else {
            None
        };
        Ok(Self::Trigger {
            name: f[0].to_string(),
            min: number(spec, f[1])?,
            max: number(spec, f[2])?,
            code: f[3].parse()?,
            sname: optional(f[4]),
            button,
        })
    }

    pub fn parse_binary(spec: &str) -> Result<Self> {
        let f = fields(spec, "binary axis", &[4])?;
        Ok(Self::Binary {
            name: f[0].to_string(),
            code: f[1].parse()?,
            low_sname: optional(f[2]),
            high_sname: optional(f[3]),
        })
    }

    pub fn build(&self) -> Control {
        match self {
            Self::Button { name, code, sname } => {
                Control::Button(Button::new(name.as_str(), code.clone(), sname.as_deref()))
            }
            Self::Centred {
                name,
                low,
                high,
                code,
                sname,
            } => Control::Centred(CentredAxis::new(
                name.as_str(),
                *low,
                *high,
                code.clone(),
                sname.as_deref(),
            )),
            Self::Trigger {
                name,
                min,
                max,
                code,
                sname,
                button,
            } => {
                let axis = TriggerAxis::new(name.as_str(), *min, *max, code.clone(), sname.as_deref());
                Control::Trigger(match button {
                    Some((button_sname, threshold)) => axis.with_button(button_sname, *threshold),
                    None => axis,
                })
            }
            Self::Binary {
                name,
                code,
                low_sname,
                high_sname,
            } => Control::Binary(BinaryAxis::new(
                name.as_str(),
                code.clone(),
                low_sname.as_deref(),
                high_sname.as_deref(),
            )),
        }
    }
}

/// Everything needed to build a [`Controller`] for one model of hardware.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerProfile {
    pub name: String,
    pub ids: Vec<DeviceId>,
    pub buttons: Vec<String>,
    pub centred_axes: Vec<String>,
    pub trigger_axes: Vec<String>,
    pub binary_axes: Vec<String>,
    /// Zones used unless the caller overrides them
    pub dead_zone: Option<f64>,
    pub hot_zone: Option<f64>,
    /// Device node name to routing prefix
    pub node_mappings: HashMap<String, String>,
}

impl ControllerProfile {
    pub fn from_json(json: &str) -> Result<Self> {
        let profile: Self = serde_json::from_str(json)?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let profile = Self::from_json(&contents)?;
        log::info!("Loaded controller profile '{}' from {:?}", profile.name, path);
        Ok(profile)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(InputError::Profile("profile has no name".to_string()));
        }
        self.control_specs().map(|_| ())
    }

    pub fn control_specs(&self) -> Result<Vec<ControlSpec>> {
        let buttons = self.buttons.iter().map(|s| ControlSpec::parse_button(s));
        let centred = self.centred_axes.iter().map(|s| ControlSpec::parse_centred(s));
        let triggers = self.trigger_axes.iter().map(|s| ControlSpec::parse_trigger(s));
        let binary = self.binary_axes.iter().map(|s| ControlSpec::parse_binary(s));
        buttons.chain(centred).chain(triggers).chain(binary).collect()
    }

    pub fn default_zones(&self) -> Zones {
        Zones {
            dead_zone: self.dead_zone,
            hot_zone: self.hot_zone,
        }
    }

    pub fn matches(&self, vendor: u16, product: u16) -> bool {
        self.ids.contains(&DeviceId::new(vendor, product))
    }

    /// Build a fresh controller. Zones set in `overrides` win over the profile's own.
    pub fn build(&self, overrides: Zones) -> Result<Controller> {
        let controls = self.control_specs()?.iter().map(ControlSpec::build).collect();
        let zones = overrides.or(self.default_zones());
        Ok(Controller::new(self.name.as_str(), controls, zones).with_node_mappings(self.node_mappings.clone()))
    }
}

/// Vendor/product to profile lookup used by discovery.
#[derive(Debug, Clone, Default)]
pub struct ControllerRegistry {
    profiles: Vec<ControllerProfile>,
    by_id: HashMap<DeviceId, usize>,
}

impl ControllerRegistry {
    /// A registry with nothing in it
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the bundled profiles.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for profile in crate::builtin::profiles() {
            if let Err(e) = registry.register(profile) {
                log::error!("Bundled profile rejected: {}", e);
            }
        }
        registry
    }

    /// Add a profile. A later profile claiming the same ids replaces the earlier one
    /// for those ids.
    pub fn register(&mut self, profile: ControllerProfile) -> Result<()> {
        profile.validate()?;
        let index = self.profiles.len();
        for id in &profile.ids {
            if let Some(previous) = self.by_id.insert(*id, index) {
                log::info!(
                    "Profile '{}' replaces '{}' for {:04x}:{:04x}",
                    profile.name,
                    self.profiles[previous].name,
                    id.vendor,
                    id.product
                );
            }
        }
        log::debug!("Registered controller profile '{}'", profile.name);
        self.profiles.push(profile);
        Ok(())
    }

    pub fn load_profile(&mut self, path: &Path) -> Result<()> {
        self.register(ControllerProfile::load(path)?)
    }

    pub fn lookup(&self, vendor: u16, product: u16) -> Option<&ControllerProfile> {
        self.by_id
            .get(&DeviceId::new(vendor, product))
            .map(|&index| &self.profiles[index])
    }

    /// Build a controller for this vendor/product, `None` if nothing is registered.
    pub fn create(&self, vendor: u16, product: u16, zones: Zones) -> Result<Option<Controller>> {
        self.lookup(vendor, product)
            .map(|profile| profile.build(zones))
            .transpose()
    }

    pub fn profiles(&self) -> impl Iterator<Item = &ControllerProfile> {
        self.profiles.iter()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILE: &str = r#"{
        "name": "Test Pad",
        "ids": [{"vendor": 4660, "product": 22136}],
        "buttons": ["B:305:circle", "Gyro Reset:motion/305:greset"],
        "centred_axes": ["Left Horizontal:0:255:0:lx", "Left Vertical:255:0:1:ly"],
        "trigger_axes": ["Left Trigger:0:1023:2:lt:l2:0.2", "Right Trigger:0:1023:5:rt"],
        "binary_axes": ["D-pad Horizontal:16:dleft:dright"],
        "dead_zone": 0.05,
        "node_mappings": {"Test Pad Motion Sensors": "motion"}
    }"#;

    #[test]
    fn test_parse_specs() {
        assert_eq!(
            ControlSpec::parse_button("X:307:square").unwrap(),
            ControlSpec::Button {
                name: "X".to_string(),
                code: EventCode::new(307),
                sname: Some("square".to_string()),
            }
        );
        assert_eq!(
            ControlSpec::parse_centred("Left Vertical:32768:-32768:1:ly").unwrap(),
            ControlSpec::Centred {
                name: "Left Vertical".to_string(),
                low: 32768,
                high: -32768,
                code: EventCode::new(1),
                sname: Some("ly".to_string()),
            }
        );
        match ControlSpec::parse_trigger("LT:0:1023:2:lt:l2:0.2").unwrap() {
            ControlSpec::Trigger { button, .. } => assert_eq!(button, Some(("l2".to_string(), 0.2))),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(
            ControlSpec::parse_binary("Hat:motion/16::dright").unwrap(),
            ControlSpec::Binary {
                name: "Hat".to_string(),
                code: EventCode::prefixed("motion", 16),
                low_sname: None,
                high_sname: Some("dright".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(ControlSpec::parse_button("X:307"), Err(InputError::Profile(_))));
        assert!(matches!(ControlSpec::parse_centred("L:a:255:0:lx"), Err(InputError::Profile(_))));
        assert!(matches!(ControlSpec::parse_trigger("LT:0:1023:2:lt:l2"), Err(InputError::Profile(_))));
        assert!(matches!(ControlSpec::parse_binary("Hat:x:a:b"), Err(InputError::Profile(_))));
    }

    #[test]
    fn test_profile_builds_controller() {
        let profile = ControllerProfile::from_json(PROFILE).unwrap();
        assert!(profile.matches(0x1234, 0x5678));
        let controller = profile.build(Zones::default()).unwrap();
        assert_eq!(controller.kind(), "Test Pad");
        assert_eq!(controller.axis_count(), 5);
        // circle, greset, l2, dleft, dright
        assert_eq!(controller.button_count(), 5);
        assert_eq!(controller.node_prefix("Test Pad Motion Sensors"), Some("motion"));
        assert_eq!(controller.axes().centred("lx").unwrap().dead_zone(), 0.05);
        assert_eq!(controller.axes().centred("lx").unwrap().hot_zone(), 0.0);

        let controller = profile.build(Zones::new(0.2, 0.1)).unwrap();
        assert_eq!(controller.axes().centred("lx").unwrap().dead_zone(), 0.2);
        assert_eq!(controller.axes().centred("lx").unwrap().hot_zone(), 0.1);
    }

    #[test]
    fn test_invalid_profile_rejected() {
        assert!(ControllerProfile::from_json(r#"{"name": ""}"#).is_err());
        assert!(matches!(
            ControllerProfile::from_json(r#"{"name": "x", "buttons": ["bad"]}"#),
            Err(InputError::Profile(_))
        ));
        assert!(matches!(ControllerProfile::from_json("{"), Err(InputError::Json(_))));

        let mut registry = ControllerRegistry::new();
        let bad = ControllerProfile {
            buttons: vec!["X".to_string()],
            name: "bad".to_string(),
            ..Default::default()
        };
        assert!(registry.register(bad).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_registry_lookup_and_override() {
        let mut registry = ControllerRegistry::new();
        registry.register(ControllerProfile::from_json(PROFILE).unwrap()).unwrap();
        assert_eq!(registry.lookup(0x1234, 0x5678).unwrap().name, "Test Pad");
        assert!(registry.lookup(1, 2).is_none());
        assert!(registry.create(1, 2, Zones::default()).unwrap().is_none());

        let replacement = ControllerProfile {
            name: "Replacement".to_string(),
            ids: vec![DeviceId::new(0x1234, 0x5678)],
            buttons: vec!["A:304:cross".to_string()],
            ..Default::default()
        };
        registry.register(replacement).unwrap();
        let controller = registry.create(0x1234, 0x5678, Zones::default()).unwrap().unwrap();
        assert_eq!(controller.kind(), "Replacement");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_load_profile_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pad.json");
        fs::write(&path, PROFILE).unwrap();

        let mut registry = ControllerRegistry::new();
        registry.load_profile(&path).unwrap();
        assert!(registry.lookup(0x1234, 0x5678).is_some());
        assert!(matches!(
            registry.load_profile(&dir.path().join("missing.json")),
            Err(InputError::Io(_))
        ));
    }

    #[test]
    fn test_builtin_registry() {
        let registry = ControllerRegistry::builtin();
        assert!(!registry.is_empty());
        assert_eq!(registry.profiles().count(), registry.len());
    }
}
