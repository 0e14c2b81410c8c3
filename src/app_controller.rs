use anyhow::{anyhow, Context, Result};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::api::{ApiClient, ApplyRequest, ExportFormat};
use crate::app_config::{Config, TranslationMode};
use crate::blocks::{BlockStore, OutputMode, ReplaceOptions};
use crate::file_utils::{FileManager, FileType};
use crate::language_utils::{LanguageSelection, LanguageSummary};
use crate::translation::{
    JobStatus, SharedBlockStore, StreamCoordinator, TranslateRequest, TranslationJob,
};

// @module: Application controller for presentation translation

/// Per-run switches collected from the command line
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Export the translated blocks to a document instead of rebuilding slides
    pub export: Option<ExportFormat>,
    /// Find/replace pass applied to translated text before output
    pub replace: Option<(String, String)>,
    /// Overwrite output files that already exist
    pub force_overwrite: bool,
}

/// Main application controller for presentation translation
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Backend client, shared with the stream coordinator
    client: Arc<ApiClient>,
    // @field: Blocks of the currently loaded presentation
    store: SharedBlockStore,
    // @field: Streaming translation job runner
    coordinator: StreamCoordinator<Arc<ApiClient>>,
}

impl Controller {
    /// Create a new controller for test purposes with default configuration
    pub fn new_for_test() -> Result<Self> {
        Self::with_config(Config::default())
    }

    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        let client = Arc::new(ApiClient::from_config(&config)?);
        let store: SharedBlockStore = Arc::new(RwLock::new(BlockStore::new()));
        let coordinator = StreamCoordinator::new(Arc::clone(&client), Arc::clone(&store))
            .with_retry(config.translation.stream.clone());

        Ok(Self {
            config,
            client,
            store,
            coordinator,
        })
    }

    /// Check if the controller is properly initialized with configuration
    pub fn is_initialized(&self) -> bool {
        !self.config.base_url.is_empty() && !self.config.target_language.is_empty()
    }

    /// The configuration this controller was built with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the main workflow with an input presentation and output directory
    pub async fn run(
        &self,
        input_file: PathBuf,
        output_dir: PathBuf,
        options: RunOptions,
    ) -> Result<()> {
        self.client
            .health()
            .await
            .context("Translation backend is not reachable")?;

        let multi_progress = MultiProgress::new();
        self.run_with_progress(input_file, output_dir, &multi_progress, options)
            .await
    }

    /// Run the controller with progress reporting
    async fn run_with_progress(
        &self,
        input_file: PathBuf,
        output_dir: PathBuf,
        multi_progress: &MultiProgress,
        options: RunOptions,
    ) -> Result<()> {
        // Start timing the process
        let start_time = Instant::now();

        // Check if the input file exists and is a presentation
        if !FileManager::file_exists(&input_file) {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }
        if FileManager::detect_file_type(&input_file)? != FileType::Presentation {
            return Err(anyhow!("Not a PowerPoint presentation: {:?}", input_file));
        }

        // Ensure the output directory exists
        FileManager::ensure_dir(&output_dir)?;

        // Check if the output already exists
        let output_file = self.output_path(&input_file, &output_dir, &options);
        if output_file.exists() && !options.force_overwrite {
            warn!("Skipping file, output already exists (use -f to force overwrite)");
            return Ok(());
        }

        let file_name = input_file
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .ok_or_else(|| anyhow!("Input path has no file name: {:?}", input_file))?;

        // Upload the presentation and extract its text blocks
        info!("Extracting text from: {:?}", input_file);
        let file_data = FileManager::read_bytes(&input_file)?;
        let extracted = self.client.extract(&file_name, file_data.clone()).await?;
        if extracted.blocks.is_empty() {
            warn!("No translatable text found in {:?}", input_file);
            return Ok(());
        }

        // Fold detected languages into the configured selection
        let selection = self.resolve_languages(extracted.language_summary.as_ref());
        self.store.write().replace_all(extracted.blocks);

        // Translate the blocks over the event stream
        let job = self
            .translate_blocks_with_progress(&selection, multi_progress)
            .await?;
        let translation_elapsed = job
            .finished_at()
            .map(|end| (end - job.started_at()).to_std().unwrap_or_default())
            .unwrap_or_default();

        // Optional find/replace pass over the translated text
        if let Some((find, replace)) = &options.replace {
            let changed = self
                .store
                .write()
                .batch_replace(find, replace, &ReplaceOptions::default())?;
            info!("Replace pass changed {} block(s)", changed);
        }

        if let Some(format) = options.export {
            // Export to a tabular or plain-text document instead of slides
            let blocks = self.store.read().selected_blocks();
            let data = self.client.export(format, &blocks).await?;
            FileManager::write_bytes(&output_file, &data)?;
        } else {
            // Rebuild the presentation with the translated blocks
            let outcome = self
                .client
                .apply(self.build_apply_request(&file_name, file_data, &selection))
                .await?;
            if let Some(server_name) = &outcome.filename {
                debug!("Server produced '{}'", server_name);
            }
            FileManager::write_bytes(&output_file, &outcome.data)?;
        }

        info!("Success: {:?}", output_file);

        // Log completion time metrics
        let elapsed = start_time.elapsed();
        let overhead = elapsed.checked_sub(translation_elapsed).unwrap_or_default();
        info!(
            "Translation complete. Backend round trips: {} - Translation: {}",
            Self::format_duration(overhead),
            Self::format_duration(translation_elapsed)
        );

        self.log_token_usage().await;

        Ok(())
    }

    /// Upload a presentation and write its extracted blocks as JSON,
    /// without translating anything
    pub async fn extract_only(
        &self,
        input_file: PathBuf,
        output_dir: PathBuf,
        force_overwrite: bool,
    ) -> Result<()> {
        if !FileManager::file_exists(&input_file) {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }
        if FileManager::detect_file_type(&input_file)? != FileType::Presentation {
            return Err(anyhow!("Not a PowerPoint presentation: {:?}", input_file));
        }
        FileManager::ensure_dir(&output_dir)?;

        let stem = input_file
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| "presentation".to_string());
        let output_file = output_dir.join(format!("{}.blocks.json", stem));
        if output_file.exists() && !force_overwrite {
            warn!("Skipping file, output already exists (use -f to force overwrite)");
            return Ok(());
        }

        let file_name = input_file
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .ok_or_else(|| anyhow!("Input path has no file name: {:?}", input_file))?;

        info!("Extracting text from: {:?}", input_file);
        let file_data = FileManager::read_bytes(&input_file)?;
        let extracted = self.client.extract(&file_name, file_data).await?;

        self.store.write().replace_all(extracted.blocks);
        let json = {
            let store = self.store.read();
            serde_json::to_string_pretty(store.blocks())
                .context("Failed to serialize extracted blocks")?
        };
        FileManager::write_to_file(&output_file, &json)?;

        info!("Success: {:?}", output_file);
        Ok(())
    }

    /// Run the workflow in folder mode, processing all presentations in a
    /// directory. Files that already have translated output will be skipped.
    pub async fn run_folder(&self, input_dir: PathBuf, options: RunOptions) -> Result<()> {
        // Start timing the process
        let start_time = Instant::now();

        // Check if the input directory exists
        if !FileManager::dir_exists(&input_dir) {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        // Find all presentations in the directory (recursive)
        let presentation_files = FileManager::find_files(&input_dir, "pptx")?;
        if presentation_files.is_empty() {
            return Err(anyhow!(
                "No PowerPoint files found in directory: {:?}",
                input_dir
            ));
        }

        self.client
            .health()
            .await
            .context("Translation backend is not reachable")?;

        // Create multi-progress instance for multiple file processing
        let multi_progress = MultiProgress::new();

        // Create a progress bar for folder processing
        let folder_pb = multi_progress.add(ProgressBar::new(presentation_files.len() as u64));
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        folder_pb.set_style(template_result.progress_chars("█▓▒░"));
        folder_pb.set_message("Processing files");

        // Track success and failure counts
        let mut success_count = 0;
        let mut error_count = 0;
        let mut skip_count = 0;

        // Process each presentation
        for presentation_file in presentation_files.iter() {
            let file_name = presentation_file
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_else(|| "unknown".to_string());

            // Update the folder progress bar to show current file
            folder_pb.set_message(format!("Processing: {}", file_name));

            // Output lands next to the input file
            let output_dir = match presentation_file.parent() {
                Some(parent) => parent.to_path_buf(),
                None => input_dir.clone(),
            };

            // Check if the output already exists
            let output_file = self.output_path(presentation_file, &output_dir, &options);
            if output_file.exists() && !options.force_overwrite {
                warn!("Skipping file, output already exists (use -f to force overwrite)");
                skip_count += 1;
                folder_pb.inc(1);
                continue;
            }

            // Run the translation for this file
            match self
                .run_with_progress(
                    presentation_file.clone(),
                    output_dir,
                    &multi_progress,
                    options.clone(),
                )
                .await
            {
                Ok(()) => {
                    success_count += 1;
                }
                Err(e) => {
                    error!("Error processing file {}: {}", file_name, e);
                    error_count += 1;
                }
            }

            // Update the folder progress bar
            folder_pb.inc(1);
        }

        // Finish the folder progress bar
        folder_pb.finish_with_message("Folder processing complete");

        // Give summary results - important for batch operations
        let duration = start_time.elapsed();
        info!(
            "Folder processing completed: {} processed, {} skipped, {} errors - Duration: {}",
            success_count,
            skip_count,
            error_count,
            Self::format_duration(duration)
        );

        Ok(())
    }

    /// Translate the loaded blocks with a progress bar from the provided
    /// MultiProgress, waiting until the job reaches a terminal state
    async fn translate_blocks_with_progress(
        &self,
        selection: &LanguageSelection,
        multi_progress: &MultiProgress,
    ) -> Result<TranslationJob> {
        let total = self.store.read().selected_count();

        // Create a progress bar sized to the selected blocks
        let progress_bar = multi_progress.add(ProgressBar::new(total as u64));
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} blocks ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));

        info!(
            "Translating {} block(s) to {} with {}",
            total,
            selection.target,
            self.config.translation.provider.display_name()
        );

        let mut params = TranslateRequest::from_config(&self.config);
        params.source_language = selection.source.clone();
        params.secondary_language = selection.secondary.clone();
        params.target_language = selection.target.clone();

        let pb = progress_bar.clone();
        let result = self
            .coordinator
            .translate_all(params, move |completed, _total| {
                pb.set_position(completed as u64);
            })
            .await;

        // Finish and clear the progress bar instead of just finishing it
        // This ensures only the folder progress bar remains visible when
        // processing multiple files
        progress_bar.finish_and_clear();

        let job = result?;
        match job.status() {
            JobStatus::Completed => {
                if let Some(warning) = job.warning() {
                    warn!("Server warning: {}", warning);
                }
                info!(
                    "Translated {}/{} block(s)",
                    job.confirmed_count(),
                    job.total()
                );
                Ok(job)
            }
            JobStatus::Failed | JobStatus::Interrupted => {
                let detail = job
                    .failure()
                    .map(|failure| failure.to_string())
                    .unwrap_or_else(|| "stream ended before completion".to_string());
                Err(anyhow!(
                    "Translation stopped after {} attempt(s) with {}/{} block(s) confirmed: {}",
                    job.attempts(),
                    job.confirmed_count(),
                    job.total(),
                    detail
                ))
            }
            JobStatus::Running => Err(anyhow!("Translation was superseded by a newer job")),
        }
    }

    /// Fold detected document languages into the configured selection.
    /// Explicit configuration always wins over detection.
    fn resolve_languages(&self, summary: Option<&LanguageSummary>) -> LanguageSelection {
        let mut selection = LanguageSelection {
            source: self.config.source_language.clone(),
            secondary: self.config.secondary_language.clone(),
            target: self.config.target_language.clone(),
            source_locked: self.config.source_language != "auto",
            secondary_locked: self.config.secondary_language != "auto",
            target_locked: true,
        };
        if let Some(summary) = summary {
            selection.apply_detected(summary);
            debug!(
                "Resolved languages: source={}, secondary={}, target={}",
                selection.source, selection.secondary, selection.target
            );
        }
        selection
    }

    /// Assemble the apply request for the current store contents
    fn build_apply_request(
        &self,
        file_name: &str,
        file_data: Vec<u8>,
        selection: &LanguageSelection,
    ) -> ApplyRequest {
        let mut blocks = self.store.read().selected_blocks();
        if self.config.mode == TranslationMode::Correction {
            // Shapes the reviewer resolved to source output are carried
            // through untouched instead of styled as corrections
            for block in blocks.iter_mut() {
                block.apply = Some(block.effective_output_mode() == OutputMode::Translated);
            }
        }

        ApplyRequest {
            file_name: file_name.to_string(),
            file_data,
            blocks,
            mode: self.config.mode,
            bilingual_layout: self.config.bilingual_layout,
            correction: self.config.correction.clone(),
            font_mapping: self.config.font_mapping.clone(),
            target_language: selection.target.clone(),
        }
    }

    /// Output path for one input file, honoring the export format
    fn output_path(&self, input_file: &Path, output_dir: &Path, options: &RunOptions) -> PathBuf {
        let extension = match options.export {
            Some(format) => format.extension(),
            None => "pptx",
        };
        FileManager::generate_output_path(
            input_file,
            output_dir,
            &self.config.target_language,
            extension,
        )
    }

    /// Log the session token usage, staying quiet when the backend has
    /// nothing to report
    async fn log_token_usage(&self) {
        match self.client.token_stats().await {
            Ok(stats) if stats.session.total_tokens > 0 => {
                info!("Token usage: {}", stats.session.summary());
            }
            Ok(_) => {}
            Err(e) => debug!("Token stats unavailable: {}", e),
        }
    }

    /// Format duration in a human-readable format (HH:MM:SS)
    fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
