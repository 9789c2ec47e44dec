use std::time::Duration;

use chrono::Utc;
use loadkit_core::{
    CHECKS_METRIC, Env, HttpEngine, Method, MetricValue, Request, Response, ScenarioKind, workload,
};
use parking_lot::Mutex;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Answers every request with a fixed status and latency, recording what it saw.
struct MockEngine {
    status_for: fn(&Request) -> u16,
    latency: Duration,
    sent: Mutex<Vec<Request>>,
    slept: Mutex<Vec<Duration>>,
}

impl MockEngine {
    fn new(status_for: fn(&Request) -> u16, latency: Duration) -> Self {
        Self {
            status_for,
            latency,
            sent: Mutex::new(Vec::new()),
            slept: Mutex::new(Vec::new()),
        }
    }
}

impl HttpEngine for MockEngine {
    fn send(&self, request: &Request) -> Response {
        self.sent.lock().push(request.clone());
        let mut resp = Response::new((self.status_for)(request), self.latency);
        resp.body = b"{}".to_vec();
        resp
    }

    fn sleep(&self, duration: Duration) {
        self.slept.lock().push(duration);
    }
}

fn counter(values: &[(String, MetricValue)], name: &str) -> Option<f64> {
    values.iter().find(|(n, _)| n == name).and_then(|(_, v)| match v {
        MetricValue::Counter(c) => Some(*c),
        _ => None,
    })
}

fn summary(w: &dyn loadkit_core::Workload) -> Vec<(String, MetricValue)> {
    w.reporter()
        .metrics()
        .summarize()
        .into_iter()
        .map(|s| (s.name, s.values))
        .collect()
}

#[test]
fn basic_iteration_batches_three_endpoints() {
    let w = workload(ScenarioKind::Basic, &Env::default(), Utc::now())
        .unwrap_or_else(|e| panic!("{e}"));
    let engine = MockEngine::new(|_| 200, Duration::from_millis(50));
    let mut rng = StdRng::seed_from_u64(7);

    w.iteration(&engine, &mut rng);

    let sent = engine.sent.lock();
    let urls: Vec<&str> = sent.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            "https://httpbin.org/get",
            "https://httpbin.org/delay/1",
            "https://httpbin.org/post"
        ]
    );
    assert_eq!(sent[2].method, Method::Post);
    assert_eq!(sent[2].body.as_deref(), Some(r#"{"test":"data"}"#));
    assert_eq!(*engine.slept.lock(), vec![Duration::from_secs(1)]);

    let checks = w
        .reporter()
        .metrics()
        .summarize()
        .into_iter()
        .filter(|s| s.name == CHECKS_METRIC)
        .count();
    assert_eq!(checks, 6);
}

#[test]
fn api_iteration_counts_failed_user_creation() {
    let env = Env::from_pairs([("K6_API_BASE_URL", "http://127.0.0.1:9/api")]);
    let w = workload(ScenarioKind::Api, &env, Utc::now()).unwrap_or_else(|e| panic!("{e}"));
    // Creation answers 200 instead of 201, so it counts as an API error.
    let engine = MockEngine::new(|_| 200, Duration::from_millis(20));
    let mut rng = StdRng::seed_from_u64(1);

    w.iteration(&engine, &mut rng);
    w.iteration(&engine, &mut rng);

    let sent = engine.sent.lock();
    assert_eq!(sent.len(), 8);
    assert_eq!(sent[0].url, "http://127.0.0.1:9/api/users");
    assert_eq!(sent[0].tag("endpoint"), Some("create_user"));
    assert_eq!(sent[2].url, "http://127.0.0.1:9/api/users?page=2");

    let values = summary(w.as_ref());
    assert_eq!(counter(&values, "api_errors"), Some(2.0));
    assert!(values.iter().all(|(n, _)| n != "user_creation_time"));

    for d in engine.slept.lock().iter() {
        assert!(*d >= Duration::from_secs(1) && *d < Duration::from_secs(3));
    }
}

#[test]
fn load_iteration_records_throughput_and_errors() {
    let w = workload(ScenarioKind::Load, &Env::default(), Utc::now())
        .unwrap_or_else(|e| panic!("{e}"));
    let engine = MockEngine::new(
        |r| if r.method == Method::Delete { 500 } else { 200 },
        Duration::from_millis(5),
    );
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..20 {
        w.iteration(&engine, &mut rng);
    }

    let values = summary(w.as_ref());
    assert_eq!(counter(&values, "throughput"), Some(20.0));

    let deletes = engine
        .sent
        .lock()
        .iter()
        .filter(|r| r.method == Method::Delete)
        .count() as u64;
    let error_rate = values.iter().find(|(n, _)| n == "error_rate").map(|(_, v)| v.clone());
    match error_rate {
        Some(MetricValue::Rate { total, hits, .. }) => {
            assert_eq!(total, 20);
            assert_eq!(hits, deletes);
        }
        other => panic!("unexpected error_rate: {other:?}"),
    }
}

#[test]
fn stress_iteration_posts_large_payload() {
    let w = workload(ScenarioKind::Stress, &Env::default(), Utc::now())
        .unwrap_or_else(|e| panic!("{e}"));
    let engine = MockEngine::new(|_| 200, Duration::from_millis(100));
    let mut rng = StdRng::seed_from_u64(3);

    w.iteration(&engine, &mut rng);

    let sent = engine.sent.lock();
    assert_eq!(sent.len(), 4);
    let body: serde_json::Value = serde_json::from_str(sent[0].body.as_deref().unwrap_or(""))
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1000));
    assert_eq!(sent[0].tag("payload_size"), Some("large"));

    let values = summary(w.as_ref());
    assert!(counter(&values, "stress_failures").is_none());
    assert!(values.iter().any(|(n, _)| n == "response_size"));
    assert!(values.iter().any(|(n, _)| n == "memory_usage"));
}

#[test]
fn stress_options_keep_engine_shape() {
    let w = workload(ScenarioKind::Stress, &Env::default(), Utc::now())
        .unwrap_or_else(|e| panic!("{e}"));
    let targets: Vec<u64> = w.options().stages.iter().map(|s| s.target).collect();
    assert_eq!(targets, vec![10, 50, 100, 0]);
    assert_eq!(
        w.options().thresholds.get("http_req_failed"),
        Some(&["rate<0.3".to_string()][..])
    );
    assert_eq!(w.name(), "Stress Test");
}
