use prometheus::Registry;
use std::time::Duration;
use tollgate::telemetry::{AdmissionEvent, PolicyEvent, SweepEvent};
use tollgate_prometheus::PrometheusSink;
use tower_service::Service;

fn counter_value(registry: &Registry, policy: &str, event: &str) -> f64 {
    let families = registry.gather();
    let Some(family) = families.iter().find(|mf| mf.get_name() == "tollgate_events_total") else {
        return 0.0;
    };
    family
        .get_metric()
        .iter()
        .find(|m| {
            let labels = m.get_label();
            labels.iter().any(|l| l.get_name() == "policy" && l.get_value() == policy)
                && labels.iter().any(|l| l.get_name() == "event" && l.get_value() == event)
        })
        .and_then(|m| m.get_counter().as_ref().map(|c| c.value()))
        .unwrap_or(0.0)
}

fn gauge_value(registry: &Registry, policy: &str) -> Option<f64> {
    let families = registry.gather();
    let family = families.iter().find(|mf| mf.get_name() == "tollgate_tracked_keys")?;
    family
        .get_metric()
        .iter()
        .find(|m| m.get_label().iter().any(|l| l.get_name() == "policy" && l.get_value() == policy))
        .and_then(|m| m.get_gauge().as_ref().map(|g| g.value()))
}

fn admitted(policy: &str) -> PolicyEvent {
    PolicyEvent::Admission(AdmissionEvent::Admitted { policy: policy.into(), limit: 10, remaining: 9 })
}

fn rejected(policy: &str) -> PolicyEvent {
    PolicyEvent::Admission(AdmissionEvent::Rejected {
        policy: policy.into(),
        limit: 10,
        retry_after: Duration::from_secs(60),
    })
}

#[tokio::test]
async fn admission_events_are_counted_per_policy() {
    let registry = Registry::new();
    let mut sink = PrometheusSink::new(registry.clone()).expect("Failed to create PrometheusSink");

    sink.call(admitted("auth")).await.unwrap();
    sink.call(admitted("auth")).await.unwrap();
    sink.call(rejected("auth")).await.unwrap();
    sink.call(admitted("api")).await.unwrap();

    assert_eq!(counter_value(&registry, "auth", "admitted"), 2.0);
    assert_eq!(counter_value(&registry, "auth", "rejected"), 1.0);
    assert_eq!(counter_value(&registry, "api", "admitted"), 1.0);
    assert_eq!(counter_value(&registry, "api", "rejected"), 0.0);
}

#[tokio::test]
async fn sweep_updates_tracked_keys_gauge() {
    let registry = Registry::new();
    let mut sink = PrometheusSink::new(registry.clone()).expect("Failed to create PrometheusSink");

    let sweep = |tracked_keys| {
        PolicyEvent::Sweep(SweepEvent {
            policy: "strict".into(),
            pruned_entries: 4,
            removed_keys: 1,
            tracked_keys,
        })
    };

    assert_eq!(gauge_value(&registry, "strict"), None);
    sink.call(sweep(12)).await.unwrap();
    assert_eq!(gauge_value(&registry, "strict"), Some(12.0));
    sink.call(sweep(3)).await.unwrap();
    assert_eq!(gauge_value(&registry, "strict"), Some(3.0));
    assert_eq!(counter_value(&registry, "strict", "swept"), 2.0);
}

#[test]
fn duplicate_registration_fails() {
    let registry = Registry::new();
    let _first = PrometheusSink::new(registry.clone()).expect("first registration");
    assert!(PrometheusSink::new(registry).is_err());
}
