//! Flow Replay Driver
//!
//! `INIT -> LOADING -> RUNNING -> (STOPPED | FATAL)`
//!
//! One flow is fully handled (sample, score, decide, verify, emit) before the
//! next is drawn. The only await point is the inter-arrival sleep, which is
//! raced against the shutdown channel.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::watch;

use crate::logic::config::SimConfig;
use crate::logic::dataset::{flow_id, ReplayBuffer, ScoredFlow};
use crate::logic::error::RouterError;
use crate::logic::features::FEATURE_LAYOUT;
use crate::logic::model::{DecisionPolicy, ScoringPipeline};
use crate::logic::monitor::{ProcessMonitor, ResourceSampler};
use crate::logic::status::RunStats;
use crate::logic::telemetry::{ConsoleSink, DecisionSink, Recorder};
use crate::logic::verification::Verifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Init,
    Loading,
    Running,
    Stopped,
    Fatal,
}

pub struct ReplayDriver {
    config: SimConfig,
    state: DriverState,
    pipeline: Option<ScoringPipeline>,
    buffer: Option<ReplayBuffer>,
    policy: DecisionPolicy,
    verifier: Verifier,
    sampler: Box<dyn ResourceSampler>,
    sinks: Vec<Box<dyn DecisionSink>>,
    rng: StdRng,
    stats: RunStats,
}

impl ReplayDriver {
    /// Driver with the process monitor and the sinks the config asks for
    pub fn new(config: SimConfig) -> Result<Self, RouterError> {
        let mut sinks: Vec<Box<dyn DecisionSink>> = vec![Box::new(ConsoleSink::new())];

        if config.record_decisions {
            match Recorder::new(config.decision_log_dir.clone()) {
                Ok(recorder) => sinks.push(Box::new(recorder)),
                Err(e) => log::warn!(
                    "Decision recorder init failed: {} - decisions will not be recorded",
                    e
                ),
            }
        }

        Self::with_parts(config, Box::new(ProcessMonitor::new()), sinks)
    }

    /// Driver with explicit sampler and sinks
    pub fn with_parts(
        config: SimConfig,
        sampler: Box<dyn ResourceSampler>,
        sinks: Vec<Box<dyn DecisionSink>>,
    ) -> Result<Self, RouterError> {
        config.validate()?;

        let policy = DecisionPolicy::new(config.threshold)?;
        let verifier = Verifier::new(&config.benign_label);
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            config,
            state: DriverState::Init,
            pipeline: None,
            buffer: None,
            policy,
            verifier,
            sampler,
            sinks,
            rng,
            stats: RunStats::new(),
        })
    }

    /// Use an already-built pipeline instead of loading artifacts at INIT
    pub fn with_pipeline(mut self, pipeline: ScoringPipeline) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    /// Use an already-built buffer instead of reading the dataset at LOADING
    pub fn with_buffer(mut self, buffer: ReplayBuffer) -> Self {
        self.buffer = Some(buffer);
        self
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    fn transition(&mut self, next: DriverState) {
        log::debug!("Router state: {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    fn fail(&mut self, error: RouterError) -> RouterError {
        log::error!("FATAL: {}", error);
        self.transition(DriverState::Fatal);
        self.flush_sinks();
        error
    }

    // ========================================================================
    // STARTUP
    // ========================================================================

    /// INIT: build the scoring pipeline
    fn init(&mut self) -> Result<(), RouterError> {
        log::info!("🟢 Booting router...");
        if self.pipeline.is_none() {
            log::info!("🧠 Loading model & scaler...");
            let pipeline = ScoringPipeline::load(
                &self.config.transformer_path,
                &self.config.classifier_path,
                self.config.classifier_output.as_deref(),
            )?;
            self.pipeline = Some(pipeline);
        }
        log::info!("✅ System ready. Listening on virtual interface.");
        Ok(())
    }

    /// LOADING: fill the replay buffer
    fn load(&mut self) -> Result<(), RouterError> {
        self.transition(DriverState::Loading);
        if self.buffer.is_none() {
            log::info!(
                "📡 Connecting to traffic stream: {}",
                self.config.dataset_path.display()
            );
            let buffer = ReplayBuffer::load(
                &self.config.dataset_path,
                &self.config.label_column,
                FEATURE_LAYOUT,
                self.config.max_rows,
            )?;
            self.buffer = Some(buffer);
        }

        if let Some(buffer) = &self.buffer {
            if buffer.is_empty() {
                return Err(RouterError::dataset(&self.config.dataset_path, "no flows found"));
            }
            log::info!(
                "🌊 Traffic stream established: {} flows ({} labels). Processing packets...",
                buffer.len(),
                buffer.label_counts().len()
            );
        }
        Ok(())
    }

    /// Run INIT and LOADING; any failure is FATAL
    pub fn boot(&mut self) -> Result<(), RouterError> {
        if let Err(e) = self.init().and_then(|_| self.load()) {
            return Err(self.fail(e));
        }
        self.transition(DriverState::Running);
        Ok(())
    }

    // ========================================================================
    // PER-FLOW PIPELINE
    // ========================================================================

    /// Score, decide and verify the flow at `index`
    pub fn process(&mut self, index: usize) -> Result<ScoredFlow, RouterError> {
        let (pipeline, buffer) = match (&self.pipeline, &self.buffer) {
            (Some(pipeline), Some(buffer)) => (pipeline, buffer),
            _ => return Err(RouterError::Config("driver has not been booted".into())),
        };
        let entry = buffer.get(index).ok_or_else(|| {
            RouterError::Config(format!("flow index {} outside replay buffer", index))
        })?;

        let resources = self.sampler.sample();
        let evaluation = pipeline.evaluate(&entry.vector)?;
        let decision = self.policy.decide(evaluation.probability);
        let outcome = self.verifier.verify(decision, entry.label.as_deref());

        Ok(ScoredFlow {
            flow_id: flow_id(chrono::Utc::now().timestamp(), index),
            raw: entry.vector.clone(),
            transformed: evaluation.transformed,
            probability: evaluation.probability,
            decision,
            label: entry.label.clone(),
            outcome,
            latency: evaluation.latency,
            resources,
        })
    }

    /// Process one flow and emit it. Per-flow errors are skipped unless
    /// strict mode makes a schema mismatch fatal.
    pub fn handle(&mut self, index: usize) -> Result<Option<ScoredFlow>, RouterError> {
        match self.process(index) {
            Ok(flow) => {
                for sink in self.sinks.iter_mut() {
                    if let Err(e) = sink.emit(&flow) {
                        log::error!("Failed to emit decision {}: {}", flow.flow_id, e);
                    }
                }
                self.stats.record(&flow);
                Ok(Some(flow))
            }
            Err(e) if self.is_skippable(&e) => {
                log::warn!("Skipping flow #{}: {}", index, e);
                self.stats.record_skip(&e);
                Ok(None)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    fn is_skippable(&self, error: &RouterError) -> bool {
        match error {
            RouterError::SchemaMismatch(_) => !self.config.strict,
            other => other.is_per_flow(),
        }
    }

    fn draw_index(&mut self) -> Option<usize> {
        let buffer = self.buffer.as_ref()?;
        buffer.draw(&mut self.rng).map(|(index, _)| index)
    }

    fn draw_delay(&mut self) -> Duration {
        let secs = self
            .rng
            .gen_range(self.config.min_delay_secs..=self.config.max_delay_secs);
        Duration::from_secs_f64(secs)
    }

    // ========================================================================
    // MAIN LOOP
    // ========================================================================

    /// Replay until `shutdown` turns true (or its sender is dropped)
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> Result<RunStats, RouterError> {
        if self.state == DriverState::Init {
            self.boot()?;
        }
        if self.state != DriverState::Running {
            return Err(RouterError::Config(format!("driver cannot run from {:?}", self.state)));
        }

        loop {
            if *shutdown.borrow() {
                break;
            }

            let Some(index) = self.draw_index() else {
                let e = RouterError::dataset(&self.config.dataset_path, "no flows found");
                return Err(self.fail(e));
            };
            self.handle(index)?;

            let delay = self.draw_delay();
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        Ok(self.stop())
    }

    /// STOPPED: flush sinks and report
    pub fn stop(&mut self) -> RunStats {
        log::info!("🛑 Shutting down router.");
        self.flush_sinks();
        self.transition(DriverState::Stopped);
        self.stats.log_summary();
        if let Some(pipeline) = &self.pipeline {
            let status = pipeline.status();
            log::info!(
                "   Model: {} backend, {} inferences ({:.4} ms avg)",
                status.classifier_backend,
                status.inference_count,
                status.avg_latency_ms
            );
        }
        self.stats.clone()
    }

    fn flush_sinks(&mut self) {
        for sink in self.sinks.iter_mut() {
            if let Err(e) = sink.flush() {
                log::error!("Failed to flush decision sink: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests;
