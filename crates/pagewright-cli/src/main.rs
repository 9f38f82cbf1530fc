//! Pagewright CLI - guided landing page builder
//!
//! Usage:
//!   pagewright init                 Write a default .pagewright/config.toml
//!   pagewright questions            Print the interview questions
//!   pagewright build                Run the wizard and write the page
//!   pagewright build --logo l.png   Also drop a logo into the page

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use pagewright_agent::GeminiClient;
use pagewright_core::{Asset, AssetRole, PagewrightConfig};
use pagewright_wizard::{QuestionBank, WizardController, WizardSession, WizardState};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "pagewright")]
#[command(author, version, about = "Guided landing page builder")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Project path (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Print the interview questions
    Questions {
        /// Configuration file (defaults to .pagewright/config.toml)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Run the interview, generate the page and write it to disk
    Build {
        /// Configuration file (defaults to .pagewright/config.toml)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Output file (defaults to a name derived from the page title)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Logo image (PNG or JPEG)
        #[arg(long, value_name = "FILE")]
        logo: Option<PathBuf>,

        /// Hero image (PNG or JPEG)
        #[arg(long, value_name = "FILE")]
        hero: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging; RUST_LOG wins over --verbose
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Init { path } => cmd_init(path),
        Commands::Questions { config } => cmd_questions(config),
        Commands::Build {
            config,
            output,
            logo,
            hero,
        } => cmd_build(config, output, logo, hero).await,
    }
}

fn load_config(path: Option<&Path>) -> Result<PagewrightConfig> {
    match path {
        Some(path) => PagewrightConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => {
            let cwd = std::env::current_dir()?;
            PagewrightConfig::load_or_default(&cwd).context("Failed to load config")
        }
    }
}

fn cmd_init(path: PathBuf) -> Result<()> {
    info!("Initializing Pagewright in {:?}", path);

    let written = PagewrightConfig::write_default(&path)
        .with_context(|| format!("Failed to write config in {}", path.display()))?;

    println!("Pagewright initialized");
    println!("  Config: {}", written.display());
    println!();
    println!("Set your API key before building:");
    println!("  export {}=...", PagewrightConfig::default().generation.api_key_env);
    println!("Then run: pagewright build");

    Ok(())
}

fn cmd_questions(config: Option<PathBuf>) -> Result<()> {
    let config = load_config(config.as_deref())?;
    let bank = QuestionBank::from_config(&config.wizard)?;

    let mut category = "";
    for question in bank.iter() {
        if question.category_label != category {
            category = &question.category_label;
            println!();
            println!("{}", category);
        }
        let marker = if question.required { "" } else { " (optional)" };
        println!("  {}. {}{}", question.id, question.prompt, marker);
        if !question.help_text.is_empty() {
            println!("     {}", question.help_text);
        }
    }

    Ok(())
}

async fn cmd_build(
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    logo: Option<PathBuf>,
    hero: Option<PathBuf>,
) -> Result<()> {
    let config = load_config(config.as_deref())?;

    // Read assets up front so a bad path fails before the interview
    let mut assets = Vec::new();
    if let Some(path) = &logo {
        assets.push(read_asset(AssetRole::Logo, path).await?);
    }
    if let Some(path) = &hero {
        assets.push(read_asset(AssetRole::HeroImage, path).await?);
    }

    let client = GeminiClient::from_config(&config.generation)
        .context("Failed to set up the generation client")?;
    info!("Using model {}", client.model());
    let controller = WizardController::from_config(&config, Arc::new(client))?;

    let mut session = controller.new_session();
    let mut input = Input::new();

    run_wizard(&controller, &mut session, &mut input).await?;

    if !assets.is_empty() {
        match controller.request_refinement(&mut session, assets).await {
            Ok(outcome) if outcome.is_changed() => println!("Images added to the page."),
            Ok(_) => {}
            Err(e) => warn!("Keeping the page without your images: {}", e),
        }
    }

    let document = session
        .document()
        .context("Wizard finished without a document")?;
    let path = output.unwrap_or_else(|| PathBuf::from(document.download_name()));
    document.write_to(&path).await?;

    println!();
    println!("Your page is ready: {}", path.display());
    for role in AssetRole::ALL {
        if document.has_placeholder(role) {
            println!(
                "  Placeholder for the {} is still in the page ({})",
                role,
                role.placeholder()
            );
        }
    }

    Ok(())
}

/// Drive the session until a document has been generated
async fn run_wizard(
    controller: &WizardController,
    session: &mut WizardSession,
    input: &mut Input,
) -> Result<()> {
    println!("Answer each question, then press Enter.");
    println!("Type :back for the previous question or :reset to start over.");

    loop {
        match session.state().clone() {
            WizardState::NotStarted => controller.start(session)?,

            WizardState::Asking { step } => {
                ask_question(controller, session, input, step).await?;
            }

            WizardState::Review => {
                print_review(controller, session);
                let choice = input
                    .ask("Press Enter to generate, :edit to change answers, :reset to start over:")
                    .await?;
                match choice.as_str() {
                    ":edit" => controller.edit_answers(session)?,
                    ":reset" => controller.reset(session),
                    _ => {
                        println!("Generating your page, this can take a minute...");
                        if let Err(e) = controller.generate(session).await {
                            println!("Generation failed: {}", e);
                        }
                    }
                }
            }

            WizardState::Error { message } => {
                println!("Last attempt failed: {}", message);
                let choice = input
                    .ask("Press Enter to retry, :edit to change answers, :reset to start over, :quit to stop:")
                    .await?;
                match choice.as_str() {
                    ":edit" => controller.edit_answers(session)?,
                    ":reset" => controller.reset(session),
                    ":quit" => bail!("Generation abandoned: {}", message),
                    _ => {
                        if let Err(e) = controller.generate(session).await {
                            println!("Generation failed: {}", e);
                        }
                    }
                }
            }

            WizardState::Generated => return Ok(()),

            other => bail!("Wizard stopped in unexpected state: {}", other),
        }
    }
}

async fn ask_question(
    controller: &WizardController,
    session: &mut WizardSession,
    input: &mut Input,
    step: u32,
) -> Result<()> {
    let question = controller
        .current_question(session)
        .context("No question for the current step")?
        .clone();
    let (_, total) = controller.progress(session).unwrap_or((step, step));

    println!();
    println!("[{}/{}] {}", step, total, question.category_label);
    println!("{}", question.prompt);
    if !question.help_text.is_empty() {
        println!("  {}", question.help_text);
    }

    let previous = session.briefing().answer(step).to_string();
    if !previous.is_empty() {
        println!("  Current answer: {} (press Enter to keep)", previous);
    }

    let text = input.ask(">").await?;
    match text.as_str() {
        ":back" => {
            if let Err(e) = controller.back(session) {
                println!("{}", e);
            }
        }
        ":reset" => {
            controller.reset(session);
            println!("Starting over.");
        }
        _ => {
            if !text.is_empty() || previous.is_empty() {
                controller.answer(session, step, text.as_str())?;
            }
            if let Err(e) = controller.next(session) {
                println!("{}", e);
            }
        }
    }

    Ok(())
}

fn print_review(controller: &WizardController, session: &WizardSession) {
    println!();
    println!("Review your answers");
    for question in controller.question_bank().iter() {
        let answer = session.briefing().answer(question.id);
        let answer = if answer.trim().is_empty() {
            "(not provided)"
        } else {
            answer
        };
        println!("  {}. {}", question.id, question.prompt);
        println!("     {}", answer);
    }
}

async fn read_asset(role: AssetRole, path: &Path) -> Result<Asset> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {} from {}", role, path.display()))?;
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    Ok(Asset::new(role, bytes, mime.essence_str()))
}

/// Line-oriented answers from stdin
struct Input {
    lines: Lines<BufReader<Stdin>>,
}

impl Input {
    fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    async fn ask(&mut self, prompt: &str) -> Result<String> {
        print!("{} ", prompt);
        std::io::stdout().flush()?;
        match self.lines.next_line().await? {
            Some(line) => Ok(line.trim().to_string()),
            None => bail!("Input closed before the wizard finished"),
        }
    }
}
