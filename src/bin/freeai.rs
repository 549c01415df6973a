//! CLI for FreeAI Studio - prompt-to-image generation.

use clap::{Args, Parser, Subcommand, ValueEnum};
use freeai_studio::image::{GenerationForm, GenerationResult, Model};
use freeai_studio::storage::HISTORY_LIMIT;
use freeai_studio::studio::presenter::{Notice, NoticeKind, NullPresenter, Presenter};
use freeai_studio::{
    CredentialStore, DirectorySaver, HistoryStore, JsonFileStore, Osc52Clipboard, Studio,
    StudioConfig, TogetherClient,
};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "freeai")]
#[command(about = "Generate images from text prompts via Together.AI (FLUX.1)")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Directory holding the stored API key and gallery
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// API key for this run (not saved)
    #[arg(long, global = true, env = "TOGETHER_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an image from a text prompt
    Generate(GenerateArgs),

    /// Manage the stored API key
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },

    /// Show past generations, newest first
    History {
        /// Maximum number of entries to show
        #[arg(short, long, default_value_t = HISTORY_LIMIT)]
        limit: usize,
    },

    /// List available models
    Models,
}

#[derive(Subcommand)]
enum KeyAction {
    /// Save an API key for future runs
    Set { value: String },
    /// Show the stored API key (masked)
    Show,
}

#[derive(Args)]
struct GenerateArgs {
    /// The text prompt describing the image
    prompt: String,

    /// Image width in pixels
    #[arg(long, default_value_t = 1024)]
    width: u32,

    /// Image height in pixels
    #[arg(long, default_value_t = 1024)]
    height: u32,

    /// Diffusion steps (1-4)
    #[arg(short, long, default_value_t = 4)]
    steps: u32,

    /// Model to use (defaults to FREEAI_MODEL or FLUX.1 Schnell Free)
    #[arg(short, long, value_enum)]
    model: Option<ModelArg>,

    /// Download the image into this directory
    #[arg(short, long)]
    download: Option<PathBuf>,

    /// Copy the image URL to the clipboard (OSC 52)
    #[arg(short, long)]
    copy: bool,

    /// Classic mode: no gallery, no steps check
    #[arg(long)]
    classic: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModelArg {
    SchnellFree,
    Schnell,
    Dev,
}

impl From<ModelArg> for Model {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::SchnellFree => Model::FluxSchnellFree,
            ModelArg::Schnell => Model::FluxSchnell,
            ModelArg::Dev => Model::FluxDev,
        }
    }
}

/// Renders studio state to stderr.
struct TerminalPresenter {
    show_progress: bool,
}

impl Presenter for TerminalPresenter {
    fn busy(&self, busy: bool) {
        if !busy && self.show_progress {
            eprintln!();
        }
    }

    fn loading(&self) {
        eprintln!("Generating image...");
    }

    fn progress(&self, percent: u8) {
        if !self.show_progress {
            return;
        }
        let filled = usize::from(percent.min(100)) / 5;
        let mut stderr = std::io::stderr();
        let _ = write!(
            stderr,
            "\r[{}{}] {:>3}%",
            "#".repeat(filled),
            " ".repeat(20 - filled),
            percent
        );
        let _ = stderr.flush();
    }

    fn error(&self, message: &str) {
        eprintln!("Error: {}", message);
    }

    fn success(&self, result: &GenerationResult) {
        println!("{}", result.image_url);
        eprintln!("Prompt:     {}", result.prompt);
        eprintln!("Dimensions: {}", result.dimensions());
        eprintln!("Steps:      {}", result.steps);
        eprintln!("Model:      {}", result.model.display_name());
    }

    fn notify(&self, notice: &Notice) {
        let marker = match notice.kind {
            NoticeKind::Success => "✓",
            NoticeKind::Warning => "!",
            NoticeKind::Error => "✗",
        };
        eprintln!("{} {}", marker, notice.message);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = StudioConfig::from_env();
    if let Some(dir) = &cli.data_dir {
        config = config.with_data_dir(dir);
    }

    match cli.command {
        Commands::Generate(args) => generate(args, config, cli.api_key, cli.json).await,
        Commands::Key { action } => {
            manage_key(action, &config, cli.json)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::History { limit } => {
            show_history(&config, limit, cli.json)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Models => {
            list_models(&config, cli.json)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn generate(
    args: GenerateArgs,
    config: StudioConfig,
    api_key: Option<String>,
    json_output: bool,
) -> anyhow::Result<ExitCode> {
    let config = generate_config(config, args.classic);

    let store = Arc::new(JsonFileStore::in_dir(config.resolve_data_dir()));
    let presenter: Arc<dyn Presenter> = if json_output {
        Arc::new(NullPresenter)
    } else {
        Arc::new(TerminalPresenter {
            show_progress: config.show_progress,
        })
    };
    let saver = DirectorySaver::new(args.download.clone().unwrap_or_else(|| PathBuf::from(".")));

    let form = GenerationForm::new(&args.prompt)
        .with_size(args.width, args.height)
        .with_steps(args.steps)
        .with_model(args.model.map(Model::from).unwrap_or(config.default_model));

    let mut builder = Studio::builder(Arc::new(TogetherClient::default()))
        .config(config)
        .presenter(presenter)
        .credentials(store.clone())
        .history(store)
        .clipboard(Arc::new(terminal_clipboard()))
        .saver(Arc::new(saver));
    if let Some(key) = api_key {
        builder = builder.api_key(key);
    }
    let studio = builder.build();

    let result = match studio.submit(&form).await {
        Ok(Some(result)) => result,
        Ok(None) => anyhow::bail!("another generation is already running"),
        Err(e) => {
            if json_output {
                let output = serde_json::json!({
                    "type": "image",
                    "success": false,
                    "error": e.to_string(),
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            return Ok(ExitCode::FAILURE);
        }
    };

    let mut downloaded = None;
    if args.download.is_some() {
        downloaded = studio
            .download_current()
            .await
            .ok()
            .flatten()
            .map(|p| p.display().to_string());
    }
    let copied = args.copy && matches!(studio.copy_current_url(), Ok(Some(_)));

    if json_output {
        let mut stdout = std::io::stdout().lock();
        write_report(&mut stdout, &result, downloaded, copied)?;
    }

    Ok(ExitCode::SUCCESS)
}

/// Classic mode turns off the gallery and steps check, keeping the rest of
/// the environment's settings.
fn generate_config(config: StudioConfig, classic: bool) -> StudioConfig {
    if classic {
        config.with_history(false).with_steps_check(false)
    } else {
        config
    }
}

/// OSC 52 goes to stderr; stdout carries only the URL or the JSON report.
fn terminal_clipboard() -> Osc52Clipboard<std::io::Stderr> {
    Osc52Clipboard::stderr()
}

fn write_report(
    out: &mut impl Write,
    result: &GenerationResult,
    downloaded: Option<String>,
    copied: bool,
) -> anyhow::Result<()> {
    let output = serde_json::json!({
        "type": "image",
        "success": true,
        "url": result.image_url,
        "prompt": result.prompt,
        "width": result.width,
        "height": result.height,
        "steps": result.steps,
        "model": result.model.as_str(),
        "timestamp": result.timestamp.to_rfc3339(),
        "downloaded": downloaded,
        "copied": copied,
    });
    writeln!(out, "{}", serde_json::to_string_pretty(&output)?)?;
    Ok(())
}

fn manage_key(action: KeyAction, config: &StudioConfig, json_output: bool) -> anyhow::Result<()> {
    let store = JsonFileStore::in_dir(config.resolve_data_dir());

    match action {
        KeyAction::Set { value } => {
            if value.trim().is_empty() {
                anyhow::bail!("API key must not be empty");
            }
            store.save_credential(value.trim())?;
            if json_output {
                println!("{}", serde_json::json!({ "saved": true }));
            } else {
                println!("API key saved to {}", store.path().display());
            }
        }
        KeyAction::Show => {
            let masked = store.load_credential()?.map(|key| mask(&key));
            if json_output {
                println!("{}", serde_json::json!({ "api_key": masked }));
            } else {
                match masked {
                    Some(key) => println!("{}", key),
                    None => println!("No API key stored. Run `freeai key set <KEY>`."),
                }
            }
        }
    }

    Ok(())
}

fn mask(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}…{}", head, tail)
}

fn show_history(config: &StudioConfig, limit: usize, json_output: bool) -> anyhow::Result<()> {
    let store = JsonFileStore::in_dir(config.resolve_data_dir());
    let entries = store.load_history()?;
    let newest: Vec<&GenerationResult> = entries.iter().rev().take(limit).collect();

    if json_output {
        println!("{}", serde_json::to_string_pretty(&newest)?);
        return Ok(());
    }

    if newest.is_empty() {
        println!("No generations yet.");
        return Ok(());
    }

    for entry in newest {
        println!(
            "{}  {}  {} steps  {}",
            entry.timestamp.format("%Y-%m-%d %H:%M"),
            entry.dimensions(),
            entry.steps,
            entry.prompt
        );
        println!("    {}", entry.image_url);
    }

    Ok(())
}

fn list_models(config: &StudioConfig, json_output: bool) -> anyhow::Result<()> {
    #[derive(serde::Serialize)]
    struct ModelInfo {
        id: &'static str,
        name: &'static str,
        default: bool,
    }

    let models: Vec<ModelInfo> = Model::ALL
        .into_iter()
        .map(|m| ModelInfo {
            id: m.as_str(),
            name: m.display_name(),
            default: m == config.default_model,
        })
        .collect();

    if json_output {
        println!("{}", serde_json::to_string_pretty(&models)?);
    } else {
        println!("Available models:\n");
        for m in &models {
            let marker = if m.default { "*" } else { " " };
            println!("  {} {} ({})", marker, m.name, m.id);
        }
    }

    Ok(())
}
