//! Discovery and binding driven end to end through in-memory device nodes.

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use padbind::builtin::{DS4_PRODUCT_ID, SONY_VENDOR_ID};
use padbind::input::{ChannelProvider, ChannelSourceHandle};
use padbind::{
    bind_controllers, find_all_controllers, find_matching_controllers, BindOptions, ControlValue,
    ControllerRegistry, ControllerRequirement, ControllerResource, DeviceInfo, InputConfig, InputError,
    RawEvent, Zones,
};

const MAC: &str = "a4:ae:12:34:56:78";

fn fast() -> BindOptions<'static> {
    BindOptions {
        poll_timeout: Duration::from_millis(20),
        ..Default::default()
    }
}

fn wait_until(condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

fn ds4_node(path: &str, name: &str) -> DeviceInfo {
    DeviceInfo {
        path: path.into(),
        name: name.to_string(),
        phys: Some("usb-0000:00:14.0-1/input3".to_string()),
        uniq: Some(MAC.to_string()),
        vendor: SONY_VENDOR_ID,
        product: DS4_PRODUCT_ID,
        version: 0x8111,
    }
}

/// A DualShock 4 exposing its pad and motion sensor nodes
fn attach_ds4(provider: &mut ChannelProvider) -> (ChannelSourceHandle, ChannelSourceHandle) {
    let pad = provider.add(ds4_node(
        "/dev/input/event20",
        "Sony Interactive Entertainment Wireless Controller",
    ));
    let motion = provider.add(ds4_node(
        "/dev/input/event21",
        "Sony Interactive Entertainment Wireless Controller Motion Sensors",
    ));
    (pad, motion)
}

#[test]
fn composite_controller_routes_by_node() {
    let mut provider = ChannelProvider::new();
    let (pad, motion) = attach_ds4(&mut provider);
    let registry = ControllerRegistry::builtin();

    let found = find_all_controllers(&provider, &registry, Zones::new(0.0, 0.0)).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, MAC);
    assert_eq!(found[0].devices.len(), 2);
    let controller = Arc::clone(&found[0].controller);

    let mut binder = bind_controllers(found, fast()).unwrap();
    assert!(controller.connected());
    assert_eq!(controller.device_unique_name().as_deref(), Some(MAC));

    // Code 0 is the left stick on the pad node and accel X on the motion node
    pad.send([RawEvent::absolute(0, 255), RawEvent::key(304, 1)]);
    motion.send_event(RawEvent::absolute(0, -32768));
    assert!(wait_until(|| controller.axis_value("ax").unwrap() < -0.99));
    assert!(wait_until(|| controller.axis_value("lx").unwrap() > 0.99));
    assert!(wait_until(|| controller.held("cross").is_some()));
    assert!(controller.check_presses().contains("cross"));

    binder.unbind();
    assert!(!controller.connected());
    assert!(!pad.is_grabbed());
    assert!(!motion.is_grabbed());
    binder.unbind();
}

#[test]
fn end_to_end_stick_samples() {
    let mut provider = ChannelProvider::new();
    let (pad, _motion) = attach_ds4(&mut provider);
    let registry = ControllerRegistry::builtin();
    let found = find_matching_controllers(&provider, &registry, Zones::new(0.1, 0.1), &[]).unwrap();
    let controller = Arc::clone(&found[0].controller);
    let _binder = bind_controllers(found, fast()).unwrap();

    for (raw, expected) in [(0, -1.0), (128, 0.0), (255, 1.0)] {
        pad.send_event(RawEvent::absolute(0, raw));
        assert!(
            wait_until(|| (controller.axis_value("lx").unwrap() - expected).abs() < 1e-6),
            "raw {} never reached {}",
            raw,
            expected
        );
    }
}

#[test]
fn unplug_disconnects_and_stream_ends() {
    let mut provider = ChannelProvider::new();
    let (pad, motion) = attach_ds4(&mut provider);
    let registry = ControllerRegistry::builtin();
    let found = find_matching_controllers(&provider, &registry, Zones::default(), &[]).unwrap();
    let controller = Arc::clone(&found[0].controller);
    let mut binder = bind_controllers(found, fast()).unwrap();

    let mut stream = controller.stream(&["lx", "cross"]).unwrap();
    let first = stream.next().unwrap();
    assert_eq!(first, vec![ControlValue::Axis(0.0), ControlValue::Button(None)]);

    drop(pad);
    drop(motion);
    provider.remove(std::path::Path::new("/dev/input/event20"));
    provider.remove(std::path::Path::new("/dev/input/event21"));

    assert!(wait_until(|| !controller.connected()));
    let error = controller.last_error().unwrap();
    assert_eq!(error.kind(), io::ErrorKind::NotConnected);
    assert!(controller.device_unique_name().is_none());

    let remaining: Vec<_> = stream.by_ref().take(10).collect();
    assert!(remaining.is_empty());

    binder.unbind();
    binder.unbind();
    assert!(find_matching_controllers(&provider, &registry, Zones::default(), &[])
        .unwrap_err()
        .is_not_found());
}

#[test]
fn second_binding_of_same_device_fails() {
    let mut provider = ChannelProvider::new();
    let (_pad, _motion) = attach_ds4(&mut provider);
    let registry = ControllerRegistry::builtin();

    let first = find_matching_controllers(&provider, &registry, Zones::default(), &[]).unwrap();
    let mut binder = bind_controllers(first, fast()).unwrap();

    let second = find_matching_controllers(&provider, &registry, Zones::default(), &[]).unwrap();
    let second_controller = Arc::clone(&second[0].controller);
    match bind_controllers(second, fast()) {
        Err(InputError::Grab { .. }) => {}
        other => panic!("expected grab failure, got {:?}", other.map(|_| ())),
    }
    assert!(!second_controller.connected());

    binder.unbind();
    let third = find_matching_controllers(&provider, &registry, Zones::default(), &[]).unwrap();
    assert!(bind_controllers(third, fast()).is_ok());
}

#[test]
fn matching_is_all_or_nothing() {
    let mut provider = ChannelProvider::new();
    let (_pad, _motion) = attach_ds4(&mut provider);
    let registry = ControllerRegistry::builtin();

    let requirements = [ControllerRequirement::any(), ControllerRequirement::any()];
    let err = find_matching_controllers(&provider, &registry, Zones::default(), &requirements).unwrap_err();
    assert!(err.is_not_found());

    let found = find_matching_controllers(
        &provider,
        &registry,
        Zones::default(),
        &[ControllerRequirement::any().with_snames(&["gx", "lt"])],
    )
    .unwrap();
    assert_eq!(found[0].controller.kind(), "DualShock4");
}

#[test]
fn resource_unbinds_on_drop() {
    let mut provider = ChannelProvider::new();
    let (pad, _motion) = attach_ds4(&mut provider);
    let registry = ControllerRegistry::builtin();
    let config = InputConfig {
        poll_timeout_ms: 20,
        ..Default::default()
    };

    let presses = Arc::new(AtomicUsize::new(0));
    let controller = {
        let resource = ControllerResource::new(&provider, &registry, &config, &[]).unwrap();
        let controller = Arc::clone(resource.controller());
        assert_eq!(resource.controllers().len(), 1);
        assert!(pad.is_grabbed());

        let counter = Arc::clone(&presses);
        let registration = controller.register_button_handler(&["cross", "circle"], move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        pad.send([RawEvent::key(304, 1), RawEvent::key(304, 0), RawEvent::key(305, 1)]);
        assert!(wait_until(|| presses.load(Ordering::SeqCst) == 2));
        registration.remove();
        registration.remove();
        controller
    };

    assert!(!controller.connected());
    assert!(!pad.is_grabbed());
}
