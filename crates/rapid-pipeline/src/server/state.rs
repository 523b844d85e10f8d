//! Application state for the pipeline server

use std::sync::Arc;

use crate::ai::{BatchDispatcher, GeminiClient, TextGenerator};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::extraction::{OcrAdapter, TextExtractor};
use crate::jobs::{JobQueue, JobWorker, MemoryJobStore};
use crate::prompt::PromptCompositor;
use crate::template::TemplateStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: PipelineConfig,
    generator: Arc<dyn TextGenerator>,
    templates: Arc<TemplateStore>,
    job_queue: Arc<JobQueue>,
    extractor: TextExtractor,
    ocr: OcrAdapter,
    dispatcher: BatchDispatcher,
    compositor: PromptCompositor,
}

impl AppState {
    /// Create application state and start the background job worker
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let generator: Arc<dyn TextGenerator> =
            Arc::new(GeminiClient::new(config.gemini.clone())?);
        tracing::info!("AI client initialized (model: {})", config.gemini.model);

        Self::with_generator(config, generator)
    }

    /// Create application state with a caller-supplied generator. Used by
    /// tests to run the full stack against a mock AI boundary.
    pub fn with_generator(
        config: PipelineConfig,
        generator: Arc<dyn TextGenerator>,
    ) -> Result<Self> {
        let templates = Arc::new(TemplateStore::new(&config.template));

        let store = Arc::new(MemoryJobStore::new());
        let (job_queue, receiver) = JobQueue::new(store, &config.queue);
        let job_queue = Arc::new(job_queue);
        tracing::info!("Job queue initialized");

        let state = Self {
            inner: Arc::new(AppStateInner {
                extractor: TextExtractor::new(config.extraction.clone()),
                ocr: OcrAdapter::new(config.extraction.ocr_language.clone()),
                dispatcher: BatchDispatcher::new(config.batch.clone()),
                compositor: PromptCompositor::new(config.prompt.clone()),
                generator: generator.clone(),
                templates: templates.clone(),
                job_queue: job_queue.clone(),
                config: config.clone(),
            }),
        };

        let worker = JobWorker::new(config, job_queue, generator, templates);
        tokio::spawn(async move {
            worker.run(receiver).await;
        });

        Ok(state)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.inner.config
    }

    pub fn generator(&self) -> &dyn TextGenerator {
        self.inner.generator.as_ref()
    }

    pub fn templates(&self) -> &TemplateStore {
        &self.inner.templates
    }

    pub fn job_queue(&self) -> &Arc<JobQueue> {
        &self.inner.job_queue
    }

    pub fn extractor(&self) -> &TextExtractor {
        &self.inner.extractor
    }

    pub fn ocr(&self) -> &OcrAdapter {
        &self.inner.ocr
    }

    pub fn dispatcher(&self) -> &BatchDispatcher {
        &self.inner.dispatcher
    }

    pub fn compositor(&self) -> &PromptCompositor {
        &self.inner.compositor
    }
}
