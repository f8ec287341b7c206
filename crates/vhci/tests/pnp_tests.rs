//! Integration tests for the request router and lifecycle state machine
//!
//! Exercises full dispatch sequences against a built bus stack:
//! stop/remove query-cancel rollback, terminal removal, the interface
//! reference gate, descriptive queries, and concurrent delivery.

use proptest::prelude::*;
use vhci::{
    DeviceStateFlags, IdKind, InterfaceKind, Payload, PnpParams, PnpRequest, PnpState, RelationKind,
    Status, TextKind, VirtualBus, minor,
};

use common::{DeviceDescriptor, DeviceSpeed};

fn descriptor(product: Option<&str>) -> DeviceDescriptor {
    DeviceDescriptor {
        vendor_id: 0x04F9,
        product_id: 0x0042,
        revision: 0x0100,
        class: 0x07,
        subclass: 0x01,
        protocol: 0x02,
        speed: DeviceSpeed::High,
        manufacturer: Some("Brother".to_string()),
        product: product.map(str::to_string),
        serial_number: Some("X123".to_string()),
    }
}

fn start(bus: &VirtualBus, id: vhci::VdevId) {
    let done = bus.dispatch(id, PnpRequest::new(minor::START_DEVICE));
    assert_eq!(done.status, Status::Success);
}

#[test]
fn unknown_minor_function_is_pass_through_for_every_kind() {
    let bus = VirtualBus::new();
    let port = bus.plug_port(descriptor(None)).unwrap();

    for id in [bus.root(), bus.controller(), bus.hub(), port] {
        let node = bus.get(id).unwrap();
        let before = node.state();

        let done = bus.dispatch(id, PnpRequest::new(0x42));
        assert_eq!(done.status, Status::Success);
        assert_eq!(node.state(), before);
    }
}

#[test]
fn removed_state_is_terminal() {
    let bus = VirtualBus::new();
    let port = bus.plug_port(descriptor(None)).unwrap();
    let node = bus.get(port).unwrap();

    let done = bus.dispatch(port, PnpRequest::new(minor::REMOVE_DEVICE));
    assert_eq!(done.status, Status::Success);

    // every subsequent request fails without mutating anything
    for minor_fn in [
        minor::START_DEVICE,
        minor::QUERY_STOP_DEVICE,
        minor::SURPRISE_REMOVAL,
        minor::QUERY_PNP_DEVICE_STATE,
        0x42,
    ] {
        let done = bus.dispatch(port, PnpRequest::new(minor_fn));
        assert_eq!(done.status, Status::NoSuchDevice);
        assert!(done.payload.is_none());
    }
    assert_eq!(node.state(), PnpState::Removed);
}

#[test]
fn remove_with_live_reference_leaves_a_tombstone() {
    let bus = VirtualBus::new();
    let port = bus.plug_port(descriptor(None)).unwrap();

    let done = bus.dispatch(
        port,
        PnpRequest::with_params(
            minor::QUERY_INTERFACE,
            PnpParams::QueryInterface {
                kind: InterfaceKind::UsbBus,
            },
        ),
    );
    let Some(Payload::Interface(granted)) = done.payload else {
        panic!("expected an interface grant");
    };

    let done = bus.dispatch(port, PnpRequest::new(minor::REMOVE_DEVICE));
    assert_eq!(done.status, Status::Success);

    // teardown deferred: the node stays in the arena but answers nothing
    assert_eq!(bus.len(), 6);
    let done = bus.dispatch(port, PnpRequest::new(minor::QUERY_PNP_DEVICE_STATE));
    assert_eq!(done.status, Status::NoSuchDevice);

    assert_eq!(granted.vdev().state(), PnpState::Removed);
    drop(granted);
}

#[test]
fn remove_destroys_an_idle_node() {
    let bus = VirtualBus::new();
    let port = bus.plug_port(descriptor(None)).unwrap();
    assert_eq!(bus.len(), 6);

    bus.dispatch(port, PnpRequest::new(minor::REMOVE_DEVICE));
    assert_eq!(bus.len(), 5);
    assert!(bus.get(port).is_none());
}

#[test]
fn cancel_stop_outside_stop_pending_is_a_noop() {
    let bus = VirtualBus::new();
    let hub = bus.hub();
    start(&bus, hub);
    let node = bus.get(hub).unwrap();
    let before = node.pnp_cell();

    let done = bus.dispatch(hub, PnpRequest::new(minor::CANCEL_STOP_DEVICE));
    assert_eq!(done.status, Status::Success);
    assert_eq!(node.pnp_cell(), before);

    // also a no-op while remove is pending
    bus.dispatch(hub, PnpRequest::new(minor::QUERY_REMOVE_DEVICE));
    let before = node.pnp_cell();
    assert_eq!(node.state(), PnpState::RemovePending);
    bus.dispatch(hub, PnpRequest::new(minor::CANCEL_STOP_DEVICE));
    assert_eq!(node.pnp_cell(), before);
}

#[test]
fn stop_query_cancel_restores_started() {
    let bus = VirtualBus::new();
    let controller = bus.controller();
    start(&bus, controller);
    let node = bus.get(controller).unwrap();

    let done = bus.dispatch(controller, PnpRequest::new(minor::QUERY_STOP_DEVICE));
    assert_eq!(done.status, Status::Success);
    assert_eq!(node.state(), PnpState::StopPending);

    let done = bus.dispatch(controller, PnpRequest::new(minor::CANCEL_STOP_DEVICE));
    assert_eq!(done.status, Status::Success);
    assert_eq!(node.state(), PnpState::Started);
}

#[test]
fn remove_query_cancel_restores_started() {
    let bus = VirtualBus::new();
    let port = bus.plug_port(descriptor(None)).unwrap();
    start(&bus, port);
    let node = bus.get(port).unwrap();

    bus.dispatch(port, PnpRequest::new(minor::QUERY_REMOVE_DEVICE));
    assert_eq!(node.state(), PnpState::RemovePending);

    bus.dispatch(port, PnpRequest::new(minor::CANCEL_REMOVE_DEVICE));
    assert_eq!(node.state(), PnpState::Started);
}

#[test]
fn query_remove_fails_fast_while_interface_is_referenced() {
    let bus = VirtualBus::new();
    let port = bus.plug_port(descriptor(None)).unwrap();
    start(&bus, port);
    let node = bus.get(port).unwrap();

    let done = bus.dispatch(
        port,
        PnpRequest::with_params(
            minor::QUERY_INTERFACE,
            PnpParams::QueryInterface {
                kind: InterfaceKind::UsbBus,
            },
        ),
    );
    let Some(Payload::Interface(granted)) = done.payload else {
        panic!("expected an interface grant, got {:?}", done.payload);
    };

    let done = bus.dispatch(port, PnpRequest::new(minor::QUERY_REMOVE_DEVICE));
    assert_eq!(done.status, Status::Unsuccessful);
    assert_eq!(node.state(), PnpState::Started);

    // releasing the grant unblocks the retry
    drop(granted);
    let done = bus.dispatch(port, PnpRequest::new(minor::QUERY_REMOVE_DEVICE));
    assert_eq!(done.status, Status::Success);
    assert_eq!(node.state(), PnpState::RemovePending);
}

#[test]
fn surprise_removal_ignores_interface_references() {
    let bus = VirtualBus::new();
    let port = bus.plug_port(descriptor(None)).unwrap();
    let node = bus.get(port).unwrap();
    node.gate().acquire();

    let done = bus.dispatch(port, PnpRequest::new(minor::SURPRISE_REMOVAL));
    assert_eq!(done.status, Status::Success);
    assert_eq!(node.state(), PnpState::SurpriseRemovePending);

    node.gate().release();
}

#[test]
fn device_text_prefers_remote_product_string_on_ports() {
    let bus = VirtualBus::new();
    let named = bus.plug_port(descriptor(Some("HL-L2350DW series"))).unwrap();
    let anonymous = bus.plug_port(descriptor(None)).unwrap();

    let query = PnpRequest::with_params(
        minor::QUERY_DEVICE_TEXT,
        PnpParams::QueryDeviceText {
            kind: TextKind::Description,
        },
    );

    let done = bus.dispatch(named, query.clone());
    assert!(matches!(done.payload, Some(Payload::Text(ref s)) if s == "HL-L2350DW series"));

    let done = bus.dispatch(anonymous, query.clone());
    assert!(matches!(done.payload, Some(Payload::Text(ref s)) if s == "vusb virtual port"));

    let done = bus.dispatch(bus.hub(), query);
    assert!(matches!(done.payload, Some(Payload::Text(ref s)) if s == "vusb virtual hub"));
}

#[test]
fn device_text_location_and_unknown_kinds() {
    let bus = VirtualBus::new();
    let port = bus.plug_port(descriptor(None)).unwrap();

    let done = bus.dispatch(
        port,
        PnpRequest::with_params(
            minor::QUERY_DEVICE_TEXT,
            PnpParams::QueryDeviceText {
                kind: TextKind::LocationInformation,
            },
        ),
    );
    assert!(matches!(done.payload, Some(Payload::Text(ref s)) if s == "Port_#0001"));

    let done = bus.dispatch(
        port,
        PnpRequest::with_params(
            minor::QUERY_DEVICE_TEXT,
            PnpParams::QueryDeviceText {
                kind: TextKind::Other(7),
            },
        ),
    );
    assert_eq!(done.status, Status::InvalidParameter);
}

#[test]
fn bus_information_is_stable() {
    let bus = VirtualBus::new();

    let first = bus.dispatch(bus.hub(), PnpRequest::new(minor::QUERY_BUS_INFORMATION));
    let second = bus.dispatch(bus.hub(), PnpRequest::new(minor::QUERY_BUS_INFORMATION));

    let (Some(Payload::BusInfo(a)), Some(Payload::BusInfo(b))) = (first.payload, second.payload)
    else {
        panic!("expected bus information");
    };
    assert_eq!(a, b);
    assert_eq!(a.bus_number, 1);
}

#[test]
fn pnp_device_state_reports_accumulated_flags() {
    let bus = VirtualBus::new();
    let hub = bus.get(bus.hub()).unwrap();
    hub.or_flags(DeviceStateFlags::NOT_DISABLEABLE);

    let done = bus.dispatch(bus.hub(), PnpRequest::new(minor::QUERY_PNP_DEVICE_STATE));
    let Some(Payload::DeviceState(flags)) = done.payload else {
        panic!("expected device state");
    };
    assert!(flags.contains(DeviceStateFlags::NOT_DISABLEABLE));
    assert!(!flags.contains(DeviceStateFlags::REMOVED));
}

#[test]
fn eject_detaches_only_ports() {
    let bus = VirtualBus::new();
    let port = bus.plug_port(descriptor(None)).unwrap();
    assert_eq!(bus.children_of(bus.hub()), vec![port]);

    let done = bus.dispatch(port, PnpRequest::new(minor::EJECT));
    assert_eq!(done.status, Status::Success);
    assert!(bus.children_of(bus.hub()).is_empty());

    // the ejected node still answers until removal completes
    let done = bus.dispatch(port, PnpRequest::new(minor::QUERY_PNP_DEVICE_STATE));
    assert_eq!(done.status, Status::Success);

    // eject elsewhere is just the default rule
    let done = bus.dispatch(bus.hub(), PnpRequest::new(minor::EJECT));
    assert_eq!(done.status, Status::Success);
}

#[test]
fn bus_relations_walk_the_stack() {
    let bus = VirtualBus::new();
    let a = bus.plug_port(descriptor(None)).unwrap();
    let b = bus.plug_port(descriptor(None)).unwrap();

    let relations = |id| {
        let done = bus.dispatch(
            id,
            PnpRequest::with_params(
                minor::QUERY_DEVICE_RELATIONS,
                PnpParams::QueryDeviceRelations {
                    kind: RelationKind::Bus,
                },
            ),
        );
        match done.payload {
            Some(Payload::Relations(children)) => children,
            other => panic!("expected relations, got {:?}", other),
        }
    };

    assert_eq!(relations(bus.hub()), vec![a, b]);
    assert_eq!(relations(bus.root()).len(), 1);
    assert_eq!(relations(bus.controller()).len(), 1);
}

#[test]
fn query_id_resolves_at_the_stack_bottom() {
    let bus = VirtualBus::new();
    let port = bus.plug_port(descriptor(None)).unwrap();

    let ids = |id, kind| {
        let done = bus.dispatch(
            id,
            PnpRequest::with_params(minor::QUERY_ID, PnpParams::QueryId { kind }),
        );
        match done.payload {
            Some(Payload::Ids(ids)) => ids,
            other => panic!("expected ids, got {:?}", other),
        }
    };

    assert_eq!(ids(port, IdKind::DeviceId), vec!["VUSB\\VID_04F9&PID_0042"]);
    // the controller forwards to its parent node
    assert_eq!(ids(bus.controller(), IdKind::DeviceId), vec!["VUSB\\VHCI"]);
    assert_eq!(ids(bus.root(), IdKind::InstanceId), vec!["0000"]);
}

#[test]
fn concurrent_delivery_keeps_state_consistent() {
    use std::sync::Arc;
    use std::thread;

    let bus = Arc::new(VirtualBus::new());
    let port = bus.plug_port(descriptor(None)).unwrap();
    start(&bus, port);

    let mut handles = Vec::new();
    for i in 0..8 {
        let bus = Arc::clone(&bus);
        handles.push(thread::spawn(move || {
            for _ in 0..200 {
                if i % 2 == 0 {
                    bus.dispatch(port, PnpRequest::new(minor::QUERY_STOP_DEVICE));
                    bus.dispatch(port, PnpRequest::new(minor::CANCEL_STOP_DEVICE));
                } else {
                    let done = bus.dispatch(
                        port,
                        PnpRequest::with_params(
                            minor::QUERY_INTERFACE,
                            PnpParams::QueryInterface {
                                kind: InterfaceKind::UsbBus,
                            },
                        ),
                    );
                    drop(done);
                    bus.dispatch(port, PnpRequest::new(minor::QUERY_REMOVE_DEVICE));
                    bus.dispatch(port, PnpRequest::new(minor::CANCEL_REMOVE_DEVICE));
                }
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let node = bus.get(port).unwrap();
    assert!(node.gate().poll_idle());
    assert!(matches!(
        node.state(),
        PnpState::Started | PnpState::StopPending | PnpState::RemovePending
    ));
}

proptest! {
    /// Arbitrary request sequences never panic, and removal stays terminal.
    #[test]
    fn arbitrary_sequences_are_safe(minors in prop::collection::vec(0u8..40, 1..64)) {
        let bus = VirtualBus::new();
        let port = bus.plug_port(descriptor(None)).unwrap();
        let node = bus.get(port).unwrap();

        let mut removed = false;
        for minor_fn in minors {
            let done = bus.dispatch(port, PnpRequest::new(minor_fn));
            if removed {
                prop_assert_eq!(done.status, Status::NoSuchDevice);
            }
            if node.state() == PnpState::Removed {
                removed = true;
            }
        }
    }
}
