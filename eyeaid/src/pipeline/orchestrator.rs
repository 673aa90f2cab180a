//! The screening pipeline orchestrator.

use super::{PipelineOrchestratorBuilder, PipelineState};
use crate::config::PipelineConfig;
use crate::core::{PatientContext, PipelineOutcome, StageName};
use crate::events::{EventKind, EventSink, PipelineEvent};
use crate::intake::IntakeGate;
use crate::oracle::{ImageRef, InferenceOracle};
use crate::stages::{
    CommunicationStage, DocumentationStage, ScreeningStage, StageOutcome, TriageStage,
};
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// Runs one patient and image through intake, screening, triage and the
/// two reporting stages.
///
/// A run never fails: oracle failures become per-stage fallbacks and bad
/// input halts the run at the intake gate without any oracle call. The
/// orchestrator holds no per-run state, so one instance may serve many
/// concurrent runs.
pub struct PipelineOrchestrator {
    oracle: Arc<dyn InferenceOracle>,
    config: PipelineConfig,
    sink: Arc<dyn EventSink>,
    gate: IntakeGate,
    screening: ScreeningStage,
    triage: TriageStage,
    documentation: DocumentationStage,
    communication: CommunicationStage,
}

impl PipelineOrchestrator {
    /// Returns a builder.
    #[must_use]
    pub fn builder() -> PipelineOrchestratorBuilder {
        PipelineOrchestratorBuilder::new()
    }

    pub(super) fn new(
        oracle: Arc<dyn InferenceOracle>,
        config: PipelineConfig,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        let generation = config.generation;
        Self {
            oracle,
            gate: IntakeGate::new(config.intake.clone()),
            screening: ScreeningStage::new(generation.screening),
            triage: TriageStage::new(generation.triage),
            documentation: DocumentationStage::new(generation.documentation),
            communication: CommunicationStage::new(generation.communication),
            config,
            sink,
        }
    }

    /// Returns the configuration in use.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs the pipeline once.
    pub async fn run(&self, patient: &PatientContext, image: &ImageRef) -> PipelineOutcome {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("pipeline.run", %run_id);
        self.execute(run_id, patient, image).instrument(span).await
    }

    async fn execute(
        &self,
        run_id: Uuid,
        patient: &PatientContext,
        image: &ImageRef,
    ) -> PipelineOutcome {
        let mut run = RunTracker::new(run_id, self.sink.as_ref());
        let oracle = self.oracle.as_ref();
        tracing::info!("Pipeline run started");
        run.sink
            .try_emit(&PipelineEvent::new(EventKind::PipelineStarted, run_id));

        let intake = run
            .stage(StageName::Intake, async {
                StageOutcome::answered(self.gate.run_blocking(patient, image).await, None)
            })
            .await;

        run.advance(PipelineState::after_intake(intake.input_valid));
        if run.state.is_terminal() {
            tracing::info!(
                recommendation = %intake.recommendation,
                limitations = ?intake.limitations,
                "Pipeline halted at intake"
            );
            run.emit(
                PipelineEvent::new(EventKind::PipelineHalted, run_id)
                    .with("stage", StageName::Intake.as_str())
                    .with("recommendation", intake.recommendation.to_string())
                    .with("limitations", intake.limitations.clone()),
            )
            .await;
            return PipelineOutcome::stopped_at_intake(intake);
        }

        let screening = run
            .stage(
                StageName::Screening,
                self.screening.run(oracle, patient, image),
            )
            .await;

        run.advance(PipelineState::Triage);
        let triage = run
            .stage(
                StageName::Triage,
                self.triage.run(oracle, patient, &screening),
            )
            .await;

        run.advance(PipelineState::Reporting);
        let (clinical_documentation, patient_communication) = tokio::join!(
            run.stage(
                StageName::Documentation,
                self.documentation
                    .run(oracle, patient, &intake, &screening, &triage),
            ),
            run.stage(
                StageName::Communication,
                self.communication.run(oracle, patient, &screening, &triage),
            )
        );

        run.advance(PipelineState::Completed);
        tracing::info!(
            triage_level = %triage.level,
            fallbacks = run.fallback_count(),
            "Pipeline run completed"
        );
        run.emit(
            PipelineEvent::new(EventKind::PipelineCompleted, run_id)
                .with("triage_level", triage.level.to_string())
                .with("fallbacks", run.fallback_count()),
        )
        .await;

        PipelineOutcome::Completed {
            intake,
            screening,
            triage,
            clinical_documentation,
            patient_communication,
        }
    }
}

impl fmt::Debug for PipelineOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineOrchestrator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Per-run bookkeeping: current state, fallback count and event delivery.
struct RunTracker<'a> {
    run_id: Uuid,
    sink: &'a dyn EventSink,
    state: PipelineState,
    fallbacks: AtomicUsize,
}

impl<'a> RunTracker<'a> {
    fn new(run_id: Uuid, sink: &'a dyn EventSink) -> Self {
        Self {
            run_id,
            sink,
            state: PipelineState::Intake,
            fallbacks: AtomicUsize::new(0),
        }
    }

    fn fallback_count(&self) -> usize {
        self.fallbacks.load(Ordering::Relaxed)
    }

    async fn emit(&self, event: PipelineEvent) {
        self.sink.emit(&event).await;
    }

    fn advance(&mut self, to: PipelineState) {
        debug_assert!(
            self.state.can_transition_to(to),
            "illegal transition {} -> {to}",
            self.state
        );
        tracing::debug!(from = %self.state, to = %to, "Pipeline state transition");
        self.state = to;
    }

    async fn stage<T>(&self, name: StageName, work: impl Future<Output = StageOutcome<T>>) -> T {
        debug_assert!(
            self.state.stages().contains(&name),
            "stage {name} does not run in state {}",
            self.state
        );
        tracing::info!(stage = %name, state = %self.state, "Stage started");
        self.sink.try_emit(
            &PipelineEvent::for_stage(EventKind::StageStarted, self.run_id, name)
                .with("state", self.state.to_string())
                .with("uses_oracle", name.uses_oracle()),
        );

        let started = Instant::now();
        let outcome = work.await;
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        if let Some(error) = &outcome.fallback {
            self.fallbacks.fetch_add(1, Ordering::Relaxed);
            self.emit(
                PipelineEvent::for_stage(EventKind::StageFallback, self.run_id, name)
                    .with("error", error.to_dict())
                    .with("error_kind", error.kind()),
            )
            .await;
        }

        let mut completed = PipelineEvent::for_stage(EventKind::StageCompleted, self.run_id, name)
            .with("duration_ms", duration_ms)
            .with("degraded", outcome.is_degraded());
        if let Some(path) = outcome.extraction {
            completed = completed.with("extraction", path.to_string());
        }
        self.emit(completed).await;

        tracing::info!(
            stage = %name,
            duration_ms,
            degraded = outcome.is_degraded(),
            "Stage completed"
        );
        outcome.record
    }
}
