//! End-to-end scenarios exercising `fedrt_runtime` across multiple federates, without
//! a transport in the loop — each scenario wires managers/coordinators together the
//! way a network layer would, driven directly in-process.

use fedrt_core::{FederateId, Time};
use fedrt_runtime::{
    AggregationMethod, EndpointKind, Federate, FederateConfig, IterationRequest,
    MessageFederateManager, TimeCoordinator, Value, ValueFederateManager, ValueKind,
};

fn fid(n: usize) -> FederateId {
    FederateId::from(n)
}

/// S1 — simple pub/sub between two federates.
#[test]
fn s1_simple_pub_sub() {
    let mut gen = Federate::new(fid(0), FederateConfig::default());
    let mut load = Federate::new(fid(1), FederateConfig::default());

    let gen_pub = gen.values_mut().register_publication("gen.p", ValueKind::Double, None).unwrap();
    let load_in = load.values_mut().register_input("load.p", ValueKind::Double, None).unwrap();
    load.values_mut().add_target(load_in, "gen.p", None).unwrap();

    for fed in [&mut gen, &mut load] {
        fed.enter_initializing_mode().unwrap();
        fed.enter_executing_mode(false).unwrap();
    }

    assert!(gen.values_mut().publish(gen_pub, Value::Double(3.5), Time::ZERO).unwrap());
    load.values_mut().deliver("gen.p", Value::Double(3.5), Time::from_ticks(1)).unwrap();

    assert!(load.values().is_updated(load_in));
    assert_eq!(load.values_mut().get_value(load_in).unwrap(), Value::Double(3.5));
    assert!(!load.values().is_updated(load_in));
}

/// S2 — change detection with two independently-thresholded subscribers sharing one
/// raw input sequence. A "default" delta models exact-repeat dedup; an explicit
/// `setMinimumChange(0.1)` models the spec's "minimum-change of 0.1" subscriber.
#[test]
fn s2_change_detection_thresholds() {
    let mut mgr = ValueFederateManager::new();
    let default_pub = mgr.register_publication("temp.default", ValueKind::Double, None).unwrap();
    let filtered_pub = mgr.register_publication("temp.filtered", ValueKind::Double, None).unwrap();
    mgr.set_minimum_change(default_pub, Some(1e-9)).unwrap();
    mgr.set_minimum_change(filtered_pub, Some(0.1)).unwrap();

    let sequence = [23.7, 23.61, 23.8, 23.8];
    let mut default_sends = Vec::new();
    let mut filtered_sends = Vec::new();
    for (t, &raw) in sequence.iter().enumerate() {
        if mgr.publish(default_pub, Value::Double(raw), Time::from_ticks(t as i64)).unwrap() {
            default_sends.push(t);
        }
        if mgr.publish(filtered_pub, Value::Double(raw), Time::from_ticks(t as i64)).unwrap() {
            filtered_sends.push(t);
        }
    }

    assert_eq!(default_sends, vec![0, 1, 2]);
    assert_eq!(filtered_sends, vec![0, 2]);
}

/// S3 — multi-input SUM mixing scalar and vector sources.
#[test]
fn s3_multi_input_sum_with_vector_source() {
    let mut mgr = ValueFederateManager::new();
    mgr.register_publication("p1", ValueKind::Double, None).unwrap();
    mgr.register_publication("p2", ValueKind::Vector, None).unwrap();
    mgr.register_publication("p3", ValueKind::Double, None).unwrap();
    let sum_in = mgr.register_input("sum_in", ValueKind::Double, None).unwrap();
    mgr.add_target(sum_in, "p1", None).unwrap();
    mgr.add_target(sum_in, "p2", None).unwrap();
    mgr.add_target(sum_in, "p3", None).unwrap();
    mgr.set_aggregation(sum_in, AggregationMethod::Sum).unwrap();

    mgr.deliver("p1", Value::Double(2.0), Time::ZERO).unwrap();
    assert_eq!(mgr.get_value(sum_in).unwrap(), Value::Double(2.0));

    mgr.deliver("p2", Value::Vector(vec![3.0, 4.0, 5.0, 2.0]), Time::from_ticks(1)).unwrap();
    mgr.deliver("p3", Value::Double(1.0), Time::from_ticks(1)).unwrap();
    assert_eq!(mgr.get_value(sum_in).unwrap(), Value::Double(17.0));

    mgr.deliver("p1", Value::Double(5.0), Time::from_ticks(2)).unwrap();
    mgr.deliver("p2", Value::Vector(vec![3.0, 4.0]), Time::from_ticks(2)).unwrap();
    mgr.deliver("p3", Value::Double(6.0), Time::from_ticks(2)).unwrap();
    assert_eq!(mgr.get_value(sum_in).unwrap(), Value::Double(18.0));
}

/// S4 — ring of 100 federates, event-triggered. Each federate depends only on its
/// predecessor; F0 has no dependency and advances freely. Verifies the grant-count
/// invariant and the value formula the spec derives from per-tick propagation.
#[test]
fn s4_ring_of_federates_event_triggered() {
    const N: usize = 100;
    const STOP: i64 = 120;

    let mut coordinators: Vec<TimeCoordinator> = (0..N)
        .map(|k| {
            let mut tc = TimeCoordinator::new(fid(k));
            tc.period = Some(Time::from_ticks(1));
            tc.stop_time = Time::from_ticks(STOP);
            tc.event_triggered = true;
            if k > 0 {
                tc.add_dependency(fid(k - 1));
            }
            tc
        })
        .collect();

    let mut grant_counts = vec![0usize; N];
    let mut values = vec![0.0f64; N];

    for tick in 1..=STOP {
        let t = Time::from_ticks(tick);
        for tc in coordinators.iter_mut() {
            tc.begin_request(t, IterationRequest::NoIterations);
        }
        for k in 0..N {
            let result = coordinators[k].try_grant().expect("ring dependency already resolved this tick");
            assert_eq!(result.grant_time, t);
            grant_counts[k] += 1;
            values[k] = if k == 0 { tick as f64 } else { values[k - 1] + 1.0 };
            if k + 1 < N {
                coordinators[k + 1].report_dependency(fid(k), result.grant_time, result.grant_time, false);
            }
        }
    }

    for k in 0..N {
        assert_eq!(grant_counts[k], 120, "federate {k} must be granted exactly 120 times");
        assert_eq!(values[k], 120.0 + k as f64, "federate {k} final value");
    }
}

/// S5 — endpoint with delay. Tick scale here is 10 ticks per spec time unit, so a
/// 1.2-unit delay is `Time::from_ticks(12)`.
#[test]
fn s5_endpoint_with_delay() {
    let mut mgr = MessageFederateManager::new();
    let sender = mgr.register_endpoint("sender", EndpointKind::Untargeted).unwrap();
    let echo = mgr.register_endpoint("echo", EndpointKind::Untargeted).unwrap();
    mgr.close_name_resolution();

    let delay = Time::from_ticks(12);
    mgr.send(sender, "echo", b"ping".to_vec(), Time::ZERO, delay).unwrap();

    assert!(!mgr.has_message(echo, Time::from_ticks(10)), "grant at 1.0 must see no pending message");
    assert!(mgr.has_message(echo, Time::from_ticks(20)), "grant at 2.0 must see the delayed message");

    let received = mgr.get_message(echo, Time::from_ticks(20)).unwrap();
    assert_eq!(received.payload, b"ping");

    mgr.send(echo, "sender", received.payload.clone(), Time::from_ticks(20), Time::ZERO).unwrap();
    let reply = mgr.get_message(sender, Time::from_ticks(20)).unwrap();
    assert_eq!(reply.payload, b"ping");
    assert_eq!(reply.source, "echo");
}

/// S6 — connector with regex. The broker aliases `publicationA..F`/`inputA..F` to the
/// canonical `pubA..F`/`inpA..F` names the connector's pattern rule actually matches
/// against.
#[test]
fn s6_connector_with_regex_and_aliases() {
    use fedrt::connector::{ConnectionRule, Connector, Direction};
    use fedrt_core::InterfaceKind;
    use fedrt_net::HandleRegistry;

    let mut registry = HandleRegistry::new();
    let fed = fid(0);
    for (i, letter) in ('A'..='F').enumerate() {
        registry
            .register_interface(format!("pub{letter}"), fed, (2 * i).into(), InterfaceKind::Publication)
            .unwrap();
        registry
            .register_interface(format!("inp{letter}"), fed, (2 * i + 1).into(), InterfaceKind::Input)
            .unwrap();
        registry.add_alias(format!("publication{letter}"), format!("pub{letter}")).unwrap();
        registry.add_alias(format!("input{letter}"), format!("inp{letter}")).unwrap();
    }

    for letter in 'A'..='F' {
        let direct = registry.resolve(&format!("pub{letter}")).unwrap();
        let aliased = registry.resolve(&format!("publication{letter}")).unwrap();
        assert_eq!(direct.handle, aliased.handle);
    }

    let names: Vec<String> =
        ('A'..='F').flat_map(|letter| vec![format!("pub{letter}"), format!("inp{letter}")]).collect();

    let mut connector = Connector::new();
    connector
        .add_rule(ConnectionRule::pattern(r"^pub(?P<v>[A-F])$", r"^inp(?P<v>[A-F])$", Direction::FromTo).unwrap());

    let connections = connector.apply(&names, &std::collections::HashMap::new());
    assert_eq!(connections.len(), 6);
    for letter in 'A'..='F' {
        assert!(connections
            .iter()
            .any(|c| c.interface_a == format!("pub{letter}") && c.interface_b == format!("inp{letter}")));
    }
    assert!(connector.apply(&names, &std::collections::HashMap::new()).is_empty());
}
