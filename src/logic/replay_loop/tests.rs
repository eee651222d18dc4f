use super::*;
use crate::logic::dataset::ReplayEntry;
use crate::logic::features::{FeatureVector, FeatureVectorBuilder, TcpFlag, FEATURE_COUNT};
use crate::logic::model::classifier::LogisticClassifier;
use crate::logic::model::transformer::{FittedScaler, ScalerParams};
use crate::logic::model::Decision;
use crate::logic::monitor::{ResourceSample, StaticSampler};
use crate::logic::verification::Outcome;
use parking_lot::Mutex;
use std::sync::Arc;

/// Keeps every emitted flow for inspection
#[derive(Clone, Default)]
struct CaptureSink {
    flows: Arc<Mutex<Vec<ScoredFlow>>>,
    flushes: Arc<Mutex<u32>>,
}

impl DecisionSink for CaptureSink {
    fn emit(&mut self, flow: &ScoredFlow) -> std::io::Result<()> {
        self.flows.lock().push(flow.clone());
        Ok(())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        *self.flushes.lock() += 1;
        Ok(())
    }
}

/// Probability = sigmoid(4 * SYN - 2): SYN=1 -> 0.88, SYN=0 -> 0.12
fn syn_pipeline() -> ScoringPipeline {
    let scaler = FittedScaler::from_params(ScalerParams::Standard {
        feature_names: None,
        mean: vec![0.0; FEATURE_COUNT],
        scale: vec![1.0; FEATURE_COUNT],
    })
    .unwrap();
    let mut weights = vec![0.0; FEATURE_COUNT];
    weights[44] = 4.0;
    ScoringPipeline::new(Box::new(scaler), Box::new(LogisticClassifier::new(weights, -2.0))).unwrap()
}

fn entry(row: usize, syn: f32, label: Option<&str>) -> ReplayEntry {
    ReplayEntry {
        row,
        vector: FeatureVectorBuilder::new()
            .flow_duration(120.0)
            .flag_count(TcpFlag::Syn, syn)
            .flag_count(TcpFlag::Ack, 1.0)
            .build(),
        label: label.map(str::to_string),
    }
}

fn buffer() -> ReplayBuffer {
    ReplayBuffer::from_entries(vec![
        entry(1, 1.0, Some("DoS Hulk")),
        entry(2, 0.0, Some("BENIGN")),
        entry(3, 1.0, Some("BENIGN")),
        entry(4, 0.0, None),
        ReplayEntry { row: 5, vector: FeatureVector::new(vec![0.0; 10]), label: Some("DDoS".into()) },
    ])
}

fn test_config() -> SimConfig {
    SimConfig {
        min_delay_secs: 0.01,
        max_delay_secs: 0.01,
        seed: Some(7),
        ..Default::default()
    }
}

fn driver(config: SimConfig, sink: CaptureSink) -> ReplayDriver {
    let sample = ResourceSample { memory_mb: 32.0, cpu_percent: Some(1.0) };
    let mut driver = ReplayDriver::with_parts(config, Box::new(StaticSampler(sample)), vec![Box::new(sink)])
        .unwrap()
        .with_pipeline(syn_pipeline())
        .with_buffer(buffer());
    driver.boot().unwrap();
    driver
}

#[test]
fn test_boot_reaches_running() {
    let driver = driver(test_config(), CaptureSink::default());
    assert_eq!(driver.state(), DriverState::Running);
}

#[test]
fn test_process_scenarios() {
    let mut driver = driver(test_config(), CaptureSink::default());

    let attack = driver.process(0).unwrap();
    assert_eq!(attack.decision, Decision::Block);
    assert_eq!(attack.outcome, Outcome::Correct);
    assert_eq!(attack.active_flags(), vec![TcpFlag::Syn, TcpFlag::Ack]);
    assert_eq!(attack.flow_duration(), 120.0);
    assert!(attack.flow_id.starts_with("FL-"));
    assert!(attack.flow_id.ends_with("-0"));
    assert_eq!(attack.resources.memory_mb, 32.0);

    let benign = driver.process(1).unwrap();
    assert_eq!(benign.decision, Decision::Allow);
    assert_eq!(benign.outcome, Outcome::Correct);

    let false_positive = driver.process(2).unwrap();
    assert_eq!(false_positive.decision, Decision::Block);
    assert_eq!(false_positive.outcome, Outcome::Miss);

    let unlabelled = driver.process(3).unwrap();
    assert_eq!(unlabelled.label, None);
    assert_eq!(unlabelled.outcome, Outcome::Unverified);
}

#[test]
fn test_handle_emits_and_counts() {
    let sink = CaptureSink::default();
    let mut driver = driver(test_config(), sink.clone());

    for index in 0..4 {
        assert!(driver.handle(index).unwrap().is_some());
    }

    assert_eq!(sink.flows.lock().len(), 4);
    let stats = driver.stats();
    assert_eq!(stats.processed, 4);
    assert_eq!(stats.blocked, 2);
    assert_eq!(stats.allowed, 2);
    assert_eq!(stats.outcomes.correct, 2);
    assert_eq!(stats.outcomes.miss, 1);
    assert_eq!(stats.outcomes.unverified, 1);
}

#[test]
fn test_malformed_flow_skipped_by_default() {
    let sink = CaptureSink::default();
    let mut driver = driver(test_config(), sink.clone());

    assert!(driver.handle(4).unwrap().is_none());
    assert_eq!(driver.state(), DriverState::Running);
    assert_eq!(driver.stats().skipped, 1);
    assert_eq!(driver.stats().schema_errors, 1);
    assert!(sink.flows.lock().is_empty());
}

#[test]
fn test_malformed_flow_fatal_in_strict_mode() {
    let sink = CaptureSink::default();
    let config = SimConfig { strict: true, ..test_config() };
    let mut driver = driver(config, sink.clone());

    let err = driver.handle(4).unwrap_err();
    assert!(matches!(err, RouterError::SchemaMismatch(_)));
    assert_eq!(driver.state(), DriverState::Fatal);
    assert_eq!(*sink.flushes.lock(), 1);
}

#[test]
fn test_boot_fails_on_missing_artifacts() {
    let config = SimConfig {
        transformer_path: "/nonexistent/router_scaler.json".into(),
        ..test_config()
    };
    let mut driver =
        ReplayDriver::with_parts(config, Box::new(StaticSampler::default()), vec![]).unwrap();

    let err = driver.boot().unwrap_err();
    assert!(matches!(err, RouterError::ArtifactLoad { .. }));
    assert_eq!(driver.state(), DriverState::Fatal);
}

#[test]
fn test_boot_fails_on_missing_label_column() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = dir.path().join("cleaned_data.csv");
    std::fs::write(&dataset, "Destination Port,Flow Duration\n80,10\n").unwrap();

    let config = SimConfig { dataset_path: dataset, ..test_config() };
    let sink = CaptureSink::default();
    let mut driver = ReplayDriver::with_parts(
        config,
        Box::new(StaticSampler::default()),
        vec![Box::new(sink.clone())],
    )
    .unwrap()
    .with_pipeline(syn_pipeline());

    let err = driver.boot().unwrap_err();
    assert!(matches!(err, RouterError::DatasetLoad { .. }));
    assert_eq!(driver.state(), DriverState::Fatal);
    assert!(sink.flows.lock().is_empty());
}

#[test]
fn test_invalid_config_rejected() {
    let config = SimConfig { threshold: 2.0, ..test_config() };
    let result = ReplayDriver::with_parts(config, Box::new(StaticSampler::default()), vec![]);
    assert!(matches!(result, Err(RouterError::Config(_))));
}

#[tokio::test]
async fn test_run_stops_when_already_cancelled() {
    let sink = CaptureSink::default();
    let mut driver = driver(test_config(), sink.clone());
    let (_tx, rx) = watch::channel(true);

    let stats = driver.run(rx).await.unwrap();
    assert_eq!(stats.processed + stats.skipped, 0);
    assert_eq!(driver.state(), DriverState::Stopped);
    assert_eq!(*sink.flushes.lock(), 1);
}

#[tokio::test]
async fn test_run_until_shutdown() {
    let sink = CaptureSink::default();
    let mut driver = driver(test_config(), sink.clone());
    let (tx, rx) = watch::channel(false);

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        let _ = tx.send(true);
    });

    let stats = driver.run(rx).await.unwrap();
    assert!(stats.processed + stats.skipped >= 1);
    assert_eq!(stats.processed as usize, sink.flows.lock().len());
    assert_eq!(driver.state(), DriverState::Stopped);
}

#[tokio::test]
async fn test_run_stops_when_sender_dropped() {
    let mut driver = driver(test_config(), CaptureSink::default());
    let (tx, rx) = watch::channel(false);
    drop(tx);

    driver.run(rx).await.unwrap();
    assert_eq!(driver.state(), DriverState::Stopped);
}

#[test]
fn test_seeded_replays_draw_same_flows() {
    let first = CaptureSink::default();
    let second = CaptureSink::default();
    let mut a = driver(test_config(), first.clone());
    let mut b = driver(test_config(), second.clone());

    let draws_a: Vec<_> = (0..20).filter_map(|_| a.draw_index()).collect();
    let draws_b: Vec<_> = (0..20).filter_map(|_| b.draw_index()).collect();
    assert_eq!(draws_a, draws_b);
    assert!(draws_a.iter().all(|&i| i < 5));
}
