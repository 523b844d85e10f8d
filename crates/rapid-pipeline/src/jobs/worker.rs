//! Background worker driving folder jobs through the pipeline

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use serde_json::Value;
use uuid::Uuid;

use crate::ai::{BatchDispatcher, TextGenerator};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::extraction::{OcrAdapter, TextExtractor};
use crate::folder::FolderAggregator;
use crate::output::save_results;
use crate::prompt::PromptCompositor;
use crate::template::TemplateStore;

use super::queue::{FolderJobPayload, JobQueue, QueuedJob};

/// Worker consuming queued folder jobs.
///
/// Transient failures retry with exponential backoff up to the configured
/// attempt count; structural failures (validation, template) settle the job
/// immediately. Nothing thrown here ever escapes the queue machinery -
/// failures surface only through status lookups and events.
pub struct JobWorker {
    queue: Arc<JobQueue>,
    generator: Arc<dyn TextGenerator>,
    templates: Arc<TemplateStore>,
    extractor: TextExtractor,
    ocr: OcrAdapter,
    dispatcher: BatchDispatcher,
    compositor: PromptCompositor,
    config: PipelineConfig,
}

impl JobWorker {
    pub fn new(
        config: PipelineConfig,
        queue: Arc<JobQueue>,
        generator: Arc<dyn TextGenerator>,
        templates: Arc<TemplateStore>,
    ) -> Self {
        Self {
            queue,
            generator,
            templates,
            extractor: TextExtractor::new(config.extraction.clone()),
            ocr: OcrAdapter::new(config.extraction.ocr_language.clone()),
            dispatcher: BatchDispatcher::new(config.batch.clone()),
            compositor: PromptCompositor::new(config.prompt.clone()),
            config,
        }
    }

    /// Consume jobs until the queue side closes
    pub async fn run(self, mut receiver: mpsc::Receiver<QueuedJob>) {
        tracing::info!("Job worker started");
        while let Some(job) = receiver.recv().await {
            tracing::info!(
                "Processing job {} ({} folders)",
                job.id,
                job.payload.folder_structure.len()
            );
            self.process_with_retries(job.id, &job.payload).await;
        }
        tracing::info!("Job worker stopped");
    }

    async fn process_with_retries(&self, id: Uuid, payload: &FolderJobPayload) {
        let max_attempts = self.config.queue.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            self.queue.mark_active(id, attempt);

            match self.run_folder_job(id, payload).await {
                Ok(result) => {
                    self.queue.set_progress(id, 100);
                    self.queue.complete(id, result);
                    return;
                }
                Err(e) if e.is_structural() => {
                    tracing::error!("Job {} failed structurally: {}", id, e);
                    self.queue.fail(id, e.to_string());
                    return;
                }
                Err(e) if attempt == max_attempts => {
                    tracing::error!("Job {} failed after {} attempts: {}", id, attempt, e);
                    self.queue.fail(id, e.to_string());
                    return;
                }
                Err(e) => {
                    let delay = Duration::from_millis(
                        self.config.queue.backoff_base_ms << (attempt - 1),
                    );
                    tracing::warn!(
                        "Job {} attempt {}/{} failed ({}), retrying in {:?}",
                        id,
                        attempt,
                        max_attempts,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// One pass over the folder pipeline, reporting checkpoint progress
    async fn run_folder_job(&self, id: Uuid, payload: &FolderJobPayload) -> Result<Value> {
        // Job accepted
        self.queue.set_progress(id, 10);

        let template = match &payload.template {
            Some(name) => Some(self.templates.get(name)?),
            None => None,
        };

        let aggregator = FolderAggregator::new(&self.extractor, &self.ocr);
        let processed = aggregator.process_structure(&payload.folder_structure);

        // All files extracted
        self.queue.set_progress(id, 40);

        // AI client ready
        self.queue.set_progress(id, 50);

        let ai_options = payload
            .options
            .to_ai_options(self.config.combine.clone());
        let outcome = self
            .dispatcher
            .process_folder(
                self.generator.as_ref(),
                &self.compositor,
                &payload.prompt,
                template.as_deref(),
                &processed,
                &ai_options,
            )
            .await?;

        // AI call returned
        self.queue.set_progress(id, 80);

        if payload.options.save_output {
            if let Some(destination) = &payload.options.output_destination {
                let results = outcome.flatten();
                save_results(&results, destination, payload.options.output_format).await?;
            }
        }

        serde_json::to_value(&outcome).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TemplateConfig;
    use crate::error::Error;
    use crate::jobs::queue::{FolderJobOptions, JobStatusReport};
    use crate::jobs::store::{JobStatus, MemoryJobStore};
    use crate::jobs::JobEventKind;
    use crate::types::{FileRecord, FolderStructure};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Generator that fails a fixed number of calls before succeeding
    struct FlakyGenerator {
        failures_left: AtomicUsize,
    }

    impl FlakyGenerator {
        fn failing(times: usize) -> Self {
            Self {
                failures_left: AtomicUsize::new(times),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for FlakyGenerator {
        async fn generate(&self, _prompt: &str) -> crate::error::Result<String> {
            let left = self.failures_left.load(Ordering::SeqCst);
            if left > 0 {
                self.failures_left.store(left - 1, Ordering::SeqCst);
                return Err(Error::ai_service("transient outage"));
            }
            Ok("generated".to_string())
        }

        async fn generate_with_image(
            &self,
            prompt: &str,
            _data: &[u8],
            _mime: &str,
        ) -> crate::error::Result<String> {
            self.generate(prompt).await
        }

        fn name(&self) -> &str {
            "flaky"
        }
    }

    fn test_config(templates_dir: &std::path::Path) -> PipelineConfig {
        let mut config = PipelineConfig::default();
        config.template = TemplateConfig {
            templates_dir: templates_dir.to_path_buf(),
            cache_ttl_secs: 3600,
        };
        config.queue.backoff_base_ms = 1; // keep the tests fast
        config
    }

    fn folder_payload(template: Option<&str>) -> FolderJobPayload {
        let mut structure = FolderStructure::new();
        structure.insert(
            "/".to_string(),
            vec![FileRecord::new("a.txt", b"Hello world".to_vec())],
        );
        FolderJobPayload {
            prompt: "Summarize".to_string(),
            template: template.map(String::from),
            folder_structure: structure,
            options: FolderJobOptions::default(),
        }
    }

    async fn run_job(
        generator: FlakyGenerator,
        payload: FolderJobPayload,
        templates_dir: &std::path::Path,
    ) -> (Arc<JobQueue>, Uuid, Vec<JobEventKind>) {
        let config = test_config(templates_dir);
        let (queue, receiver) = JobQueue::new(Arc::new(MemoryJobStore::new()), &config.queue);
        let queue = Arc::new(queue);
        let mut events = queue.subscribe();

        let worker = JobWorker::new(
            config,
            queue.clone(),
            Arc::new(generator),
            Arc::new(TemplateStore::new(&TemplateConfig {
                templates_dir: templates_dir.to_path_buf(),
                cache_ttl_secs: 3600,
            })),
        );
        let handle = tokio::spawn(worker.run(receiver));

        let record = queue.enqueue(payload).await.unwrap();

        let mut seen = Vec::new();
        loop {
            let event = events.recv().await.unwrap();
            let terminal = matches!(
                event.kind,
                JobEventKind::Completed | JobEventKind::Failed { .. }
            );
            seen.push(event.kind);
            if terminal {
                break;
            }
        }

        handle.abort();
        (queue, record.id, seen)
    }

    #[tokio::test]
    async fn successful_job_reports_monotonic_progress_to_100() {
        let dir = tempfile::tempdir().unwrap();
        let (queue, id, events) =
            run_job(FlakyGenerator::failing(0), folder_payload(None), dir.path()).await;

        let progresses: Vec<u8> = events
            .iter()
            .filter_map(|e| match e {
                JobEventKind::Progress { progress } => Some(*progress),
                _ => None,
            })
            .collect();
        assert!(progresses.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(progresses.last().copied(), Some(100));

        match queue.status(id) {
            JobStatusReport::Found {
                status,
                progress,
                result,
                ..
            } => {
                assert_eq!(status, JobStatus::Completed);
                assert_eq!(progress, 100);
                assert!(result.is_some());
            }
            JobStatusReport::NotFound { .. } => panic!("job should exist"),
        }
    }

    #[tokio::test]
    async fn transient_failures_retry_until_success() {
        let dir = tempfile::tempdir().unwrap();
        let (queue, id, _events) =
            run_job(FlakyGenerator::failing(2), folder_payload(None), dir.path()).await;

        match queue.status(id) {
            JobStatusReport::Found {
                status,
                attempts_made,
                ..
            } => {
                assert_eq!(status, JobStatus::Completed);
                assert_eq!(attempts_made, 3);
            }
            JobStatusReport::NotFound { .. } => panic!("job should exist"),
        }
    }

    #[tokio::test]
    async fn exhausted_retries_settle_as_failed() {
        let dir = tempfile::tempdir().unwrap();
        let (queue, id, events) =
            run_job(FlakyGenerator::failing(10), folder_payload(None), dir.path()).await;

        assert!(matches!(events.last(), Some(JobEventKind::Failed { .. })));
        match queue.status(id) {
            JobStatusReport::Found { status, error, .. } => {
                assert_eq!(status, JobStatus::Failed);
                assert!(error.unwrap().contains("transient outage"));
            }
            JobStatusReport::NotFound { .. } => panic!("job should exist"),
        }
    }

    #[tokio::test]
    async fn missing_template_fails_without_retry() {
        let dir = tempfile::tempdir().unwrap();
        let (queue, id, _events) = run_job(
            FlakyGenerator::failing(0),
            folder_payload(Some("missing.md")),
            dir.path(),
        )
        .await;

        match queue.status(id) {
            JobStatusReport::Found {
                status,
                attempts_made,
                error,
                ..
            } => {
                assert_eq!(status, JobStatus::Failed);
                // Structural failure: no retries spent
                assert_eq!(attempts_made, 1);
                assert!(error.unwrap().contains("Template"));
            }
            JobStatusReport::NotFound { .. } => panic!("job should exist"),
        }
    }
}
