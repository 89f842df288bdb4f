use buildcast_core::{Credential, GenerationRequest, PhaseCatalog, SequenceStatus};
use events::{Event, EventBus};
use imagen::{AspectRatio, ImageGenerator, ImageRequest, OutputMimeType};
use tracing::{debug, error, info, Instrument};
use uuid::Uuid;

use crate::error::{OrchestratorError, Result};
use crate::progress::{stage_message, ProgressSink, COMPLETED_MESSAGE};
use crate::state_machine::SequenceStateMachine;

/// Generates one image per construction stage, strictly in order.
///
/// Holds only configuration. Every call starts from stage 0 with its own
/// state, so one orchestrator can serve concurrent calls.
pub struct SequenceOrchestrator<G> {
    generator: G,
    catalog: PhaseCatalog,
    aspect_ratio: AspectRatio,
    mime_type: OutputMimeType,
    events: Option<EventBus>,
}

impl<G: ImageGenerator> SequenceOrchestrator<G> {
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            catalog: PhaseCatalog::default(),
            aspect_ratio: AspectRatio::Square,
            mime_type: OutputMimeType::Jpeg,
            events: None,
        }
    }

    pub fn with_catalog(mut self, catalog: PhaseCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_image_options(mut self, aspect_ratio: AspectRatio, mime_type: OutputMimeType) -> Self {
        self.aspect_ratio = aspect_ratio;
        self.mime_type = mime_type;
        self
    }

    /// Publish sequence and stage events to `bus`.
    pub fn with_events(mut self, bus: EventBus) -> Self {
        self.events = Some(bus);
        self
    }

    pub fn catalog(&self) -> &PhaseCatalog {
        &self.catalog
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Generate `num_stages` images for `base_prompt` and return them as data
    /// URIs in stage order.
    ///
    /// Progress goes to `on_progress` once before each stage's request and once
    /// after the last stage succeeds. The first failing stage aborts the run and
    /// no images are returned.
    pub async fn generate_sequence<P>(
        &self,
        credential: &Credential,
        base_prompt: &str,
        num_stages: usize,
        on_progress: &mut P,
    ) -> Result<Vec<String>>
    where
        P: ProgressSink + ?Sized,
    {
        let sequence_id = Uuid::new_v4();
        let span = tracing::info_span!("sequence", %sequence_id, num_stages);

        self.run(sequence_id, credential, base_prompt, num_stages, on_progress)
            .instrument(span)
            .await
    }

    async fn run<P>(
        &self,
        sequence_id: Uuid,
        credential: &Credential,
        base_prompt: &str,
        num_stages: usize,
        on_progress: &mut P,
    ) -> Result<Vec<String>>
    where
        P: ProgressSink + ?Sized,
    {
        let mut run = SequenceRun::new(sequence_id);
        run.advance(SequenceStatus::Validating)?;

        if credential.is_blank() {
            error!("No credential supplied, refusing to start");
            let err = OrchestratorError::missing_credential();
            return Err(self.fail(&mut run, None, err));
        }

        info!(stages = num_stages, "Starting construction sequence");
        self.emit(Event::SequenceStarted {
            sequence_id,
            total_stages: num_stages,
        });

        let mut images = Vec::with_capacity(num_stages);

        for stage in 0..num_stages {
            run.advance(SequenceStatus::Generating { stage })?;

            let request = GenerationRequest::new(base_prompt, stage, num_stages);
            let stage_number = request.stage_number();
            let prompt = request.prompt(&self.catalog);

            on_progress.report(&stage_message(stage_number, num_stages));
            self.emit(Event::StageStarted {
                sequence_id,
                stage: stage_number,
                total_stages: num_stages,
                prompt: prompt.clone(),
            });

            debug!(stage = stage_number, prompt = %prompt, "Requesting stage image");

            let image_request = ImageRequest::single(prompt)
                .with_aspect_ratio(self.aspect_ratio)
                .with_mime_type(self.mime_type);

            let image = match self.generator.generate_images(credential, &image_request).await {
                Ok(returned) => match returned.into_iter().next() {
                    Some(image) => image,
                    None => {
                        let reason = format!(
                            "Image generation failed for stage {}. The model did not return an image.",
                            stage_number
                        );
                        let err = OrchestratorError::generation(stage_number, reason);
                        return Err(self.fail(&mut run, Some(stage_number), err));
                    }
                },
                Err(e) => {
                    let err = OrchestratorError::generation(stage_number, e.to_string());
                    return Err(self.fail(&mut run, Some(stage_number), err));
                }
            };

            info!(stage = stage_number, mime_type = %image.mime_type, "Stage image generated");
            self.emit(Event::StageCompleted {
                sequence_id,
                stage: stage_number,
                mime_type: image.mime_type.clone(),
            });

            images.push(image.to_data_uri());
        }

        run.advance(SequenceStatus::Completed)?;
        on_progress.report(COMPLETED_MESSAGE);
        self.emit(Event::SequenceCompleted {
            sequence_id,
            image_count: images.len(),
        });

        info!(images = images.len(), "Construction sequence completed");
        Ok(images)
    }

    fn fail(
        &self,
        run: &mut SequenceRun,
        stage: Option<usize>,
        err: OrchestratorError,
    ) -> OrchestratorError {
        if let Err(transition_err) = run.advance(SequenceStatus::Failed) {
            return transition_err;
        }

        match stage {
            Some(stage) => error!(stage, error = %err, "Construction sequence failed"),
            None => error!(error = %err, "Construction sequence failed"),
        }

        self.emit(Event::SequenceFailed {
            sequence_id: run.sequence_id,
            stage,
            message: err.to_string(),
        });
        err
    }

    fn emit(&self, event: Event) {
        if let Some(bus) = &self.events {
            let envelope = bus.publish(event);
            debug!(sequence = envelope.sequence, event = envelope.event.name(), "Event published");
        }
    }
}

/// Per-call state, never shared between calls.
struct SequenceRun {
    sequence_id: Uuid,
    status: SequenceStatus,
}

impl SequenceRun {
    fn new(sequence_id: Uuid) -> Self {
        Self {
            sequence_id,
            status: SequenceStatus::Idle,
        }
    }

    fn advance(&mut self, to: SequenceStatus) -> Result<()> {
        SequenceStateMachine::validate_transition(&self.status, &to)?;
        debug!(from = %self.status, to = %to, "Sequence status changed");
        self.status = to;
        Ok(())
    }
}

/// One-shot helper: run a sequence with the default catalog and square JPEG
/// output.
pub async fn generate_sequence<G, P>(
    generator: G,
    credential: &Credential,
    base_prompt: &str,
    num_stages: usize,
    on_progress: &mut P,
) -> Result<Vec<String>>
where
    G: ImageGenerator,
    P: ProgressSink + ?Sized,
{
    SequenceOrchestrator::new(generator)
        .generate_sequence(credential, base_prompt, num_stages, on_progress)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_walks_state_machine() {
        let mut run = SequenceRun::new(Uuid::new_v4());
        run.advance(SequenceStatus::Validating).unwrap();
        run.advance(SequenceStatus::Generating { stage: 0 }).unwrap();
        run.advance(SequenceStatus::Generating { stage: 1 }).unwrap();
        run.advance(SequenceStatus::Completed).unwrap();
        assert!(run.status.is_terminal());
        assert!(run.advance(SequenceStatus::Failed).is_err());
    }

    #[test]
    fn test_run_rejects_skipped_stage() {
        let mut run = SequenceRun::new(Uuid::new_v4());
        run.advance(SequenceStatus::Validating).unwrap();
        assert!(run.advance(SequenceStatus::Generating { stage: 1 }).is_err());
    }
}
