// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::too_many_arguments)]

use anyhow::{anyhow, Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{error, info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::fs::File;
use std::io::BufReader;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::api::{ApiClient, ExportFormat, PreserveTerm, TmEntry, TmKind};
use crate::app_config::{Config, LlmProvider, TranslationMode};
use crate::app_controller::{Controller, RunOptions};
use crate::file_utils::FileManager;

mod api;
mod app_config;
mod app_controller;
mod blocks;
mod errors;
mod file_utils;
mod language_utils;
mod translation;

/// CLI Wrapper for LlmProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
#[value(rename_all = "lower")]
enum CliLlmProvider {
    Ollama,
    ChatGpt,
    Gemini,
}

impl From<CliLlmProvider> for LlmProvider {
    fn from(cli_provider: CliLlmProvider) -> Self {
        match cli_provider {
            CliLlmProvider::Ollama => LlmProvider::Ollama,
            CliLlmProvider::ChatGpt => LlmProvider::ChatGpt,
            CliLlmProvider::Gemini => LlmProvider::Gemini,
        }
    }
}

/// CLI Wrapper for TranslationMode to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationMode {
    Translated,
    Bilingual,
    Correction,
}

impl From<CliTranslationMode> for TranslationMode {
    fn from(cli_mode: CliTranslationMode) -> Self {
        match cli_mode {
            CliTranslationMode::Translated => TranslationMode::Translated,
            CliTranslationMode::Bilingual => TranslationMode::Bilingual,
            CliTranslationMode::Correction => TranslationMode::Correction,
        }
    }
}

/// CLI Wrapper for ExportFormat to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliExportFormat {
    Docx,
    Xlsx,
    Txt,
}

impl From<CliExportFormat> for ExportFormat {
    fn from(cli_format: CliExportFormat) -> Self {
        match cli_format {
            CliExportFormat::Docx => ExportFormat::Docx,
            CliExportFormat::Xlsx => ExportFormat::Xlsx,
            CliExportFormat::Txt => ExportFormat::Txt,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate a presentation or a folder of presentations (default command)
    #[command(alias = "translate")]
    Translate(TranslateArgs),

    /// List the models the configured provider offers
    Models(ModelsArgs),

    /// Manage the translation-memory collections
    #[command(subcommand)]
    Tm(TmCommands),

    /// Manage terms the backend keeps verbatim during translation
    #[command(subcommand)]
    Terms(TermsCommands),

    /// Inspect and edit the backend prompt templates
    #[command(subcommand)]
    Prompts(PromptCommands),

    /// Show backend token usage statistics
    Stats(StatsArgs),

    /// Generate shell completions for pptxlate
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct TranslateArgs {
    /// Input presentation file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// LLM provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliLlmProvider>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// Source language code (e.g., 'en', 'ja'), 'auto' to detect
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'vi', 'en')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Output document mode
    #[arg(long, value_enum)]
    mode: Option<CliTranslationMode>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Extract text blocks as JSON without translating
    #[arg(short, long)]
    extract_only: bool,

    /// Export the translation to a document format instead of slides
    #[arg(long, value_enum)]
    export: Option<CliExportFormat>,

    /// Find/replace pass applied to the translated text
    #[arg(long, num_args = 2, value_names = ["FIND", "REPLACE"])]
    replace: Option<Vec<String>>,
}

/// Options shared by the management subcommands
#[derive(Args, Debug)]
struct GlobalArgs {
    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

#[derive(Parser, Debug)]
struct ModelsArgs {
    #[command(flatten)]
    global: GlobalArgs,

    /// Provider to query instead of the configured one
    #[arg(short, long, value_enum)]
    provider: Option<CliLlmProvider>,
}

#[derive(Subcommand, Debug)]
enum TmCommands {
    /// Curated term pairs enforced during translation
    #[command(subcommand)]
    Glossary(TmEntryCommands),

    /// Sentence pairs accumulated from past jobs
    #[command(subcommand)]
    Memory(TmEntryCommands),
}

#[derive(Subcommand, Debug)]
enum TmEntryCommands {
    /// List all entries
    List(TmListArgs),
    /// Add or update an entry
    Add(TmAddArgs),
    /// Remove an entry by its id
    Remove(TmRemoveArgs),
    /// Import entries from a CSV file
    Import(TmImportArgs),
    /// Export all entries as CSV
    Export(TmExportArgs),
}

#[derive(Parser, Debug)]
struct TmListArgs {
    #[command(flatten)]
    global: GlobalArgs,
}

#[derive(Parser, Debug)]
struct TmAddArgs {
    #[command(flatten)]
    global: GlobalArgs,

    /// Source-language text
    source_text: String,

    /// Target-language text
    target_text: String,

    /// Source language code, defaults to 'en'
    #[arg(long)]
    source_lang: Option<String>,

    /// Target language code, defaults to the configured target
    #[arg(long)]
    target_lang: Option<String>,

    /// Match priority, higher entries win on conflict
    #[arg(long)]
    priority: Option<i64>,
}

#[derive(Parser, Debug)]
struct TmRemoveArgs {
    #[command(flatten)]
    global: GlobalArgs,

    /// Entry id as shown by list
    id: i64,
}

#[derive(Parser, Debug)]
struct TmImportArgs {
    #[command(flatten)]
    global: GlobalArgs,

    /// CSV file to import
    file: PathBuf,
}

#[derive(Parser, Debug)]
struct TmExportArgs {
    #[command(flatten)]
    global: GlobalArgs,

    /// Write the CSV to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum TermsCommands {
    /// List all preserve terms
    List(TermsListArgs),
    /// Add a term to keep verbatim
    Add(TermsAddArgs),
    /// Remove a term by its id
    Remove(TermsRemoveArgs),
    /// Import terms from a previous CSV export
    Import(TermsImportArgs),
    /// Export all terms as CSV
    Export(TermsExportArgs),
}

#[derive(Parser, Debug)]
struct TermsListArgs {
    #[command(flatten)]
    global: GlobalArgs,
}

#[derive(Parser, Debug)]
struct TermsAddArgs {
    #[command(flatten)]
    global: GlobalArgs,

    /// The term to keep verbatim
    term: String,

    /// Free-form category label
    #[arg(long, default_value = "")]
    category: String,

    /// Match the term regardless of letter case
    #[arg(long)]
    ignore_case: bool,
}

#[derive(Parser, Debug)]
struct TermsRemoveArgs {
    #[command(flatten)]
    global: GlobalArgs,

    /// Term id as shown by list
    id: i64,
}

#[derive(Parser, Debug)]
struct TermsImportArgs {
    #[command(flatten)]
    global: GlobalArgs,

    /// CSV file to import
    file: PathBuf,
}

#[derive(Parser, Debug)]
struct TermsExportArgs {
    #[command(flatten)]
    global: GlobalArgs,

    /// Write the CSV to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum PromptCommands {
    /// List available prompt templates
    List(PromptListArgs),
    /// Print one prompt template
    Show(PromptShowArgs),
    /// Replace one prompt template with the contents of a file
    Save(PromptSaveArgs),
}

#[derive(Parser, Debug)]
struct PromptListArgs {
    #[command(flatten)]
    global: GlobalArgs,
}

#[derive(Parser, Debug)]
struct PromptShowArgs {
    #[command(flatten)]
    global: GlobalArgs,

    /// Prompt name as shown by list
    name: String,
}

#[derive(Parser, Debug)]
struct PromptSaveArgs {
    #[command(flatten)]
    global: GlobalArgs,

    /// Prompt name as shown by list
    name: String,

    /// File holding the new prompt content
    file: PathBuf,
}

#[derive(Parser, Debug)]
struct StatsArgs {
    #[command(flatten)]
    global: GlobalArgs,
}

/// pptxlate - PowerPoint translation over a streaming backend
///
/// Uploads PowerPoint presentations to a translation backend, follows the
/// streaming translation job and writes the translated deck next to the input.
#[derive(Parser, Debug)]
#[command(name = "pptxlate")]
#[command(author = "pptxlate contributors")]
#[command(version = "1.0.0")]
#[command(about = "AI-powered PowerPoint translation tool")]
#[command(long_about = "pptxlate uploads PowerPoint presentations to a translation backend, follows
the streaming translation job and writes the translated deck next to the input.

EXAMPLES:
    pptxlate deck.pptx                          # Translate using default config
    pptxlate -f deck.pptx                       # Force overwrite existing files
    pptxlate -p chatgpt -m gpt-4o deck.pptx     # Use specific provider and model
    pptxlate -s en -t vi deck.pptx              # Translate from English to Vietnamese
    pptxlate -e deck.pptx                       # Extract text blocks without translating
    pptxlate --export docx deck.pptx            # Save the translation as a Word document
    pptxlate --log-level debug /decks/          # Process entire directory with debug logging
    pptxlate tm glossary list                   # Show the glossary entries
    pptxlate completions bash > pptxlate.bash   # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default
    one will be created automatically.

SUPPORTED PROVIDERS:
    ollama    - Local Ollama server (no API key needed)
    chatgpt   - OpenAI API (requires API key)
    gemini    - Google Gemini API (requires API key)")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input presentation file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// LLM provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliLlmProvider>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// Source language code (e.g., 'en', 'ja'), 'auto' to detect
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'vi', 'en')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Output document mode
    #[arg(long, value_enum)]
    mode: Option<CliTranslationMode>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Extract text blocks as JSON without translating
    #[arg(short, long)]
    extract_only: bool,

    /// Export the translation to a document format instead of slides
    #[arg(long, value_enum)]
    export: Option<CliExportFormat>,

    /// Find/replace pass applied to the translated text
    #[arg(long, num_args = 2, value_names = ["FIND", "REPLACE"])]
    replace: Option<Vec<String>>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");

            let mut stderr = std::io::stderr();
            let emoji = Self::get_emoji_for_level(record.level());
            let _ = match record.level() {
                Level::Error => writeln!(
                    stderr,
                    "\x1B[1;31m{} {} {}\x1B[0m",
                    now,
                    emoji,
                    record.args()
                ),
                Level::Warn => writeln!(
                    stderr,
                    "\x1B[1;33m{} {} {}\x1B[0m",
                    now,
                    emoji,
                    record.args()
                ),
                Level::Info => writeln!(
                    stderr,
                    "\x1B[1;32m{} {} {}\x1B[0m",
                    now,
                    emoji,
                    record.args()
                ),
                Level::Debug => writeln!(
                    stderr,
                    "\x1B[1;36m{} {} {}\x1B[0m",
                    now,
                    emoji,
                    record.args()
                ),
                Level::Trace => writeln!(
                    stderr,
                    "\x1B[1;35m{} {} {}\x1B[0m",
                    now,
                    emoji,
                    record.args()
                ),
            };
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default
    // We'll update the level after loading the config if needed
    CustomLogger::init(LevelFilter::Info)?;

    // Parse command line arguments using clap
    let cli = CommandLineOptions::parse();

    // Handle subcommands
    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "pptxlate", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Translate(args)) => run_translate(args).await,
        Some(Commands::Models(args)) => run_models(args).await,
        Some(Commands::Tm(command)) => run_tm(command).await,
        Some(Commands::Terms(command)) => run_terms(command).await,
        Some(Commands::Prompts(command)) => run_prompts(command).await,
        Some(Commands::Stats(args)) => run_stats(args).await,
        None => {
            // Default behavior - use top-level args for backwards compatibility
            let input_path = cli
                .input_path
                .ok_or_else(|| anyhow!("INPUT_PATH is required when no subcommand is specified"))?;

            let translate_args = TranslateArgs {
                input_path,
                force_overwrite: cli.force_overwrite,
                provider: cli.provider,
                model: cli.model,
                source_language: cli.source_language,
                target_language: cli.target_language,
                mode: cli.mode,
                config_path: cli.config_path,
                log_level: cli.log_level,
                extract_only: cli.extract_only,
                export: cli.export,
                replace: cli.replace,
            };
            run_translate(translate_args).await
        }
    }
}

// Map the config log level onto the log facade's filter
fn to_level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

/// Load the configuration file, creating a default one when missing, and
/// settle the effective log level
fn load_or_create_config(config_path: &str, log_level: Option<&CliLogLevel>) -> Result<Config> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = log_level {
        let config_log_level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(to_level_filter(&config_log_level));
    }

    let config = if Path::new(config_path).exists() {
        // Load existing configuration
        let file = File::open(config_path)
            .context(format!("Failed to open config file: {}", config_path))?;

        let reader = BufReader::new(file);
        let mut config: Config = serde_json::from_reader(reader)
            .context(format!("Failed to parse config file: {}", config_path))?;

        // Update log level in config if specified via command line
        if let Some(level) = log_level {
            config.log_level = level.clone().into();
        }

        config
    } else {
        // Create default configuration if not exists
        warn!(
            "Config file not found at '{}', creating default config.",
            config_path
        );

        let mut config = Config::default();

        // Apply command line log level to default config if specified
        if let Some(level) = log_level {
            config.log_level = level.clone().into();
        }

        // Save default config
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;

        std::fs::write(config_path, config_json)
            .context(format!("Failed to write default config to file: {}", config_path))?;

        config
    };

    // If log level was not set via command line, update it from config now
    if log_level.is_none() {
        log::set_max_level(to_level_filter(&config.log_level));
    }

    Ok(config)
}

// Build a backend client from the shared management arguments
fn client_for(global: &GlobalArgs) -> Result<ApiClient> {
    let config = load_or_create_config(&global.config_path, global.log_level.as_ref())?;
    Ok(ApiClient::from_config(&config)?)
}

async fn run_translate(options: TranslateArgs) -> Result<()> {
    let mut config = load_or_create_config(&options.config_path, options.log_level.as_ref())?;

    // Override config with CLI options if provided
    if let Some(provider) = &options.provider {
        config.translation.provider = provider.clone().into();
    }

    if let Some(model) = &options.model {
        // Find the provider config and update the model
        let provider_str = config.translation.provider.to_lowercase_string();
        if let Some(provider_config) = config
            .translation
            .available_providers
            .iter_mut()
            .find(|p| p.provider_type == provider_str)
        {
            provider_config.model = model.clone();
        }
    }

    if let Some(source_lang) = &options.source_language {
        config.source_language = source_lang.clone();
    }

    if let Some(target_lang) = &options.target_language {
        config.target_language = target_lang.clone();
    }

    if let Some(mode) = &options.mode {
        config.mode = mode.clone().into();
    }

    // Validate the configuration after loading and overriding
    config
        .validate()
        .context("Configuration validation failed")?;

    // Create controller
    let controller = Controller::with_config(config)?;

    let run_options = RunOptions {
        export: options.export.map(Into::into),
        replace: options.replace.as_deref().and_then(|pair| match pair {
            [find, replace] => Some((find.clone(), replace.clone())),
            _ => None,
        }),
        force_overwrite: options.force_overwrite,
    };

    // Handle extraction-only mode if enabled
    if options.extract_only {
        if options.input_path.is_file() {
            let output_dir = options
                .input_path
                .parent()
                .unwrap_or(Path::new("."))
                .to_path_buf();
            controller
                .extract_only(options.input_path.clone(), output_dir, options.force_overwrite)
                .await?;
        } else if options.input_path.is_dir() {
            extraction_only_mode_for_folder(
                &controller,
                &options.input_path,
                options.force_overwrite,
            )
            .await?;
        } else {
            return Err(anyhow!("Input path does not exist: {:?}", options.input_path));
        }

        return Ok(());
    }

    // Run the controller with the input file(s) and output directory
    if options.input_path.is_file() {
        let output_dir = options
            .input_path
            .parent()
            .unwrap_or(Path::new("."))
            .to_path_buf();
        controller
            .run(options.input_path.clone(), output_dir, run_options)
            .await?;
    } else if options.input_path.is_dir() {
        controller
            .run_folder(options.input_path.clone(), run_options)
            .await?;
    } else {
        return Err(anyhow!("Input path does not exist: {:?}", options.input_path));
    }

    Ok(())
}

// Helper function to process an entire folder in extraction-only mode
async fn extraction_only_mode_for_folder(
    controller: &Controller,
    input_dir: &Path,
    force_overwrite: bool,
) -> Result<()> {
    info!("Starting extraction mode for directory: {:?}", input_dir);

    let files = FileManager::find_files(input_dir, "pptx")?;
    if files.is_empty() {
        warn!("No PowerPoint files found in directory: {:?}", input_dir);
        return Ok(());
    }

    let mut processed_count = 0;
    for file in files {
        let output_dir = file.parent().unwrap_or(Path::new(".")).to_path_buf();
        if let Err(e) = controller
            .extract_only(file.clone(), output_dir, force_overwrite)
            .await
        {
            error!("Error processing file: {}", e);
        } else {
            processed_count += 1;
        }
    }

    info!("Finished processing {} files", processed_count);
    Ok(())
}

async fn run_models(args: ModelsArgs) -> Result<()> {
    let mut config = load_or_create_config(&args.global.config_path, args.global.log_level.as_ref())?;
    if let Some(provider) = &args.provider {
        config.translation.provider = provider.clone().into();
    }

    let provider = config.translation.provider;
    let api_key = config.translation.get_api_key();
    if provider.requires_api_key() && api_key.is_empty() {
        return Err(anyhow!(
            "An API key is required for the {} provider",
            provider.display_name()
        ));
    }

    let client = ApiClient::from_config(&config)?;
    let models = client
        .llm_models(
            provider,
            (!api_key.is_empty()).then_some(api_key.as_str()),
            &config.translation.get_base_url(),
        )
        .await?;

    if models.is_empty() {
        warn!("Provider {} reports no models", provider.display_name());
        return Ok(());
    }
    for model in models {
        println!("{}", model);
    }
    Ok(())
}

async fn run_tm(command: TmCommands) -> Result<()> {
    let (kind, entry_command) = match command {
        TmCommands::Glossary(entry_command) => (TmKind::Glossary, entry_command),
        TmCommands::Memory(entry_command) => (TmKind::Memory, entry_command),
    };

    match entry_command {
        TmEntryCommands::List(args) => {
            let client = client_for(&args.global)?;
            let entries = client.tm_list(kind).await?;
            if entries.is_empty() {
                info!("No {} entries", kind.label());
                return Ok(());
            }
            for entry in entries {
                let id = entry
                    .id
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{:>6}  [{} -> {}]  {}  =>  {}",
                    id, entry.source_lang, entry.target_lang, entry.source_text, entry.target_text
                );
            }
        }
        TmEntryCommands::Add(args) => {
            let config =
                load_or_create_config(&args.global.config_path, args.global.log_level.as_ref())?;
            let client = ApiClient::from_config(&config)?;
            let entry = TmEntry {
                id: None,
                source_lang: args.source_lang.unwrap_or_else(|| "en".to_string()),
                target_lang: args
                    .target_lang
                    .unwrap_or_else(|| config.target_language.clone()),
                source_text: args.source_text,
                target_text: args.target_text,
                priority: args.priority,
            };
            client.tm_upsert(kind, &entry).await?;
            info!("Added {} entry", kind.label());
        }
        TmEntryCommands::Remove(args) => {
            let client = client_for(&args.global)?;
            client.tm_delete(kind, args.id).await?;
            info!("Removed {} entry {}", kind.label(), args.id);
        }
        TmEntryCommands::Import(args) => {
            let client = client_for(&args.global)?;
            let file_name = args
                .file
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_else(|| "import.csv".to_string());
            let data = FileManager::read_bytes(&args.file)?;
            client.tm_import_csv(kind, &file_name, data).await?;
            info!("Imported {} entries from {:?}", kind.label(), args.file);
        }
        TmEntryCommands::Export(args) => {
            let client = client_for(&args.global)?;
            let csv = client.tm_export_csv(kind).await?;
            match &args.output {
                Some(path) => {
                    FileManager::write_to_file(path, &csv)?;
                    info!("Exported {} entries to {:?}", kind.label(), path);
                }
                None => print!("{}", csv),
            }
        }
    }
    Ok(())
}

async fn run_terms(command: TermsCommands) -> Result<()> {
    match command {
        TermsCommands::List(args) => {
            let client = client_for(&args.global)?;
            let terms = client.preserve_terms().await?;
            if terms.is_empty() {
                info!("No preserve terms");
                return Ok(());
            }
            for term in terms {
                let id = term
                    .id
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "-".to_string());
                let case_marker = if term.case_sensitive { "" } else { " (any case)" };
                if term.category.is_empty() {
                    println!("{:>6}  {}{}", id, term.term, case_marker);
                } else {
                    println!("{:>6}  {}{}  [{}]", id, term.term, case_marker, term.category);
                }
            }
        }
        TermsCommands::Add(args) => {
            let client = client_for(&args.global)?;
            let term = PreserveTerm {
                id: None,
                term: args.term.clone(),
                category: args.category,
                case_sensitive: !args.ignore_case,
                created_at: None,
            };
            client.add_preserve_term(&term).await?;
            info!("Added preserve term '{}'", args.term);
        }
        TermsCommands::Remove(args) => {
            let client = client_for(&args.global)?;
            client.delete_preserve_term(args.id).await?;
            info!("Removed preserve term {}", args.id);
        }
        TermsCommands::Import(args) => {
            let client = client_for(&args.global)?;
            let csv_data = FileManager::read_to_string(&args.file)?;
            let summary = client.import_preserve_terms(&csv_data).await?;
            info!(
                "Imported {} term(s), skipped {} duplicate(s)",
                summary.imported, summary.skipped
            );
        }
        TermsCommands::Export(args) => {
            let client = client_for(&args.global)?;
            let csv = client.export_preserve_terms().await?;
            match &args.output {
                Some(path) => {
                    FileManager::write_to_file(path, &csv)?;
                    info!("Exported preserve terms to {:?}", path);
                }
                None => print!("{}", csv),
            }
        }
    }
    Ok(())
}

async fn run_prompts(command: PromptCommands) -> Result<()> {
    match command {
        PromptCommands::List(args) => {
            let client = client_for(&args.global)?;
            for name in client.prompt_names().await? {
                println!("{}", name);
            }
        }
        PromptCommands::Show(args) => {
            let client = client_for(&args.global)?;
            let content = client.prompt(&args.name).await?;
            print!("{}", content);
            if !content.ends_with('\n') {
                println!();
            }
        }
        PromptCommands::Save(args) => {
            let client = client_for(&args.global)?;
            let content = FileManager::read_to_string(&args.file)?;
            client.save_prompt(&args.name, &content).await?;
            info!("Saved prompt '{}'", args.name);
        }
    }
    Ok(())
}

async fn run_stats(args: StatsArgs) -> Result<()> {
    let client = client_for(&args.global)?;
    let stats = client.token_stats().await?;
    println!("Session:  {}", stats.session.summary());
    println!("All time: {}", stats.all_time.summary());
    Ok(())
}
