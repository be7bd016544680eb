//! End-to-end orchestration: PDF to recap video, and the assembly-only rerun.

use std::path::Path;

use tracing::{error, info, warn};

use crate::assemble::{AssembleReport, Assembler, recap_output_path};
use crate::audio::media::AudioSource;
use crate::config::RecapConfig;
use crate::foundation::error::{RecapError, RecapResult};
use crate::narration::{Narrator, RateLimiter, RetryPolicy, Sleeper};
use crate::plan::batch::Batch;
use crate::plan::project::{ProjectState, pdf_base_name};
use crate::providers::{ContextSearch, NarrationSynthesizer, PageRasterizer, SegmentPlanner};

/// The external capabilities a pipeline run depends on.
#[derive(Clone, Copy)]
pub struct Providers<'a> {
    /// PDF page rasterizer.
    pub rasterizer: &'a dyn PageRasterizer,
    /// Chapter segmenter.
    pub planner: &'a dyn SegmentPlanner,
    /// Speech synthesizer.
    pub synthesizer: &'a dyn NarrationSynthesizer,
    /// Optional background search.
    pub search: &'a dyn ContextSearch,
    /// Audio decoder used during assembly.
    pub audio: &'a dyn AudioSource,
    /// Clock for retry backoff and throttling.
    pub sleeper: &'a dyn Sleeper,
    /// Spacing between synthesis calls.
    pub limiter: &'a dyn RateLimiter,
}

/// Outcome of the analysis phase.
#[derive(Clone, Debug, PartialEq)]
pub struct AnalysisReport {
    /// Batches ready for assembly.
    pub project: ProjectState,
    /// Segments returned by the planner.
    pub segments_planned: usize,
    /// Segments dropped for an empty page range or failed synthesis.
    pub segments_skipped: usize,
}

/// Outcome of a full run.
#[derive(Clone, Debug, PartialEq)]
pub struct RecapReport {
    /// Analysis counters and the saved project.
    pub analysis: AnalysisReport,
    /// Rendered output.
    pub output: AssembleReport,
}

/// Drives a chapter from PDF to MP4.
pub struct RecapPipeline<'a> {
    cfg: RecapConfig,
    providers: Providers<'a>,
}

impl<'a> RecapPipeline<'a> {
    /// Create a pipeline after validating `cfg`.
    pub fn new(cfg: RecapConfig, providers: Providers<'a>) -> RecapResult<Self> {
        cfg.validate()?;
        Ok(Self { cfg, providers })
    }

    /// Configuration in use.
    pub fn config(&self) -> &RecapConfig {
        &self.cfg
    }

    /// Analyze `pdf`, narrate it, save the project, and render the recap.
    pub fn run(&self, pdf: &Path) -> RecapResult<RecapReport> {
        let analysis = self.analyze(pdf)?;
        let output = self.assemble(&analysis.project)?;
        info!(path = %output.output_path.display(), "recap ready");
        Ok(RecapReport { analysis, output })
    }

    /// Everything before rendering: rasterize, plan, narrate, and save the project state.
    #[tracing::instrument(skip(self))]
    pub fn analyze(&self, pdf: &Path) -> RecapResult<AnalysisReport> {
        if !pdf.is_file() {
            return Err(RecapError::missing_input(pdf));
        }
        let paths = &self.cfg.paths;
        let pdf_name = pdf_base_name(pdf);

        std::fs::create_dir_all(&paths.images_dir).map_err(|e| {
            RecapError::media(format!(
                "create images dir '{}': {e}",
                paths.images_dir.display()
            ))
        })?;
        let pages = self.providers.rasterizer.rasterize(pdf, &paths.images_dir)?;
        info!(pages = pages.len(), "pages extracted");

        let context = if self.cfg.providers.use_web_context {
            self.providers.search.search(&format!("{pdf_name} summary"))
        } else {
            String::new()
        };

        info!("starting chapter analysis");
        let segments = self.providers.planner.plan(pdf, &context)?;
        info!(segments = segments.len(), "analysis complete");

        let narrator = Narrator::new(
            self.providers.synthesizer,
            RetryPolicy::from(&self.cfg.narration),
            self.providers.sleeper,
        );
        let mut batches = Vec::with_capacity(segments.len());
        let mut skipped = 0;
        let mut synthesized = 0;
        for (i, segment) in segments.iter().enumerate() {
            let number = i + 1;
            info!(
                segment = number,
                start_page = segment.start_page,
                end_page = segment.end_page,
                "processing segment"
            );
            let audio_path = paths.audio_dir.join(format!("segment_{number:03}.wav"));
            let Some(batch) = Batch::from_segment(segment, &pages, &audio_path) else {
                warn!(
                    start_page = segment.start_page,
                    end_page = segment.end_page,
                    "no images for page range"
                );
                skipped += 1;
                continue;
            };

            if synthesized > 0 {
                self.providers.limiter.pause(self.providers.sleeper);
            }
            synthesized += 1;
            match narrator.narrate(&segment.script, &segment.style_instructions, &audio_path) {
                Ok(_) => batches.push(batch),
                Err(e) => {
                    error!(segment = number, error = %e, "narration failed, skipping segment");
                    skipped += 1;
                }
            }
        }

        if batches.is_empty() {
            warn!("no narration generated, skipping video assembly");
            return Err(RecapError::EmptyTimeline);
        }

        let project = ProjectState { pdf_name, batches };
        project.save(&paths.project_path)?;
        Ok(AnalysisReport {
            project,
            segments_planned: segments.len(),
            segments_skipped: skipped,
        })
    }

    /// Render a project to `<output_dir>/<pdf_name>_recap.mp4`.
    pub fn assemble(&self, project: &ProjectState) -> RecapResult<AssembleReport> {
        self.project_assembler().assemble(project)
    }

    /// See [`ProjectAssembler::assemble_project`].
    pub fn assemble_project(
        &self,
        project_path: &Path,
        audio_dir: &Path,
    ) -> RecapResult<AssembleReport> {
        self.project_assembler().assemble_project(project_path, audio_dir)
    }

    fn project_assembler(&self) -> ProjectAssembler<'_> {
        ProjectAssembler {
            cfg: &self.cfg,
            audio: self.providers.audio,
        }
    }
}

/// Renders saved projects. Needs no hosted provider, only an audio decoder.
pub struct ProjectAssembler<'a> {
    cfg: &'a RecapConfig,
    audio: &'a dyn AudioSource,
}

impl<'a> ProjectAssembler<'a> {
    /// Create an assembler after validating `cfg`.
    pub fn new(cfg: &'a RecapConfig, audio: &'a dyn AudioSource) -> RecapResult<Self> {
        cfg.validate()?;
        Ok(Self { cfg, audio })
    }

    /// Render a project to `<output_dir>/<pdf_name>_recap.mp4`.
    pub fn assemble(&self, project: &ProjectState) -> RecapResult<AssembleReport> {
        let assembler = Assembler::new(self.cfg, self.audio)?;
        let out = recap_output_path(&self.cfg.paths.output_dir, &project.pdf_name);
        assembler.assemble(&project.batches, &out)
    }

    /// Assembly-only entry point: reload a saved project and pair it with recorded audio.
    ///
    /// Audio files in `audio_dir` are matched to batches in file-name order.
    #[tracing::instrument(skip(self))]
    pub fn assemble_project(
        &self,
        project_path: &Path,
        audio_dir: &Path,
    ) -> RecapResult<AssembleReport> {
        let mut project = ProjectState::load(project_path)?;
        let matched = project.attach_audio_dir(audio_dir)?;
        info!(
            matched = matched.matched,
            missing = matched.missing,
            unused = matched.unused,
            "audio matched to batches"
        );
        if project.batches.is_empty() {
            return Err(RecapError::EmptyTimeline);
        }
        self.assemble(&project)
    }
}

#[cfg(test)]
#[path = "../tests/unit/pipeline.rs"]
mod tests;
