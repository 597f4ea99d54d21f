use clap::{Parser, Subcommand};
use std::path::PathBuf;

use wpg_engine::country::build_country_snapshots;
use wpg_engine::demo::{DEMO_GAME_ID, DEMO_MESSAGES, DEMO_SETTING, mentioned_countries_summary, seed_demo};
use wpg_engine::error::AppError;
use wpg_engine::events::DEFAULT_SETTING;
use wpg_engine::settings::DEFAULT_SETTINGS_PATH;
use wpg_engine::{EventGenerator, MessageClassifier, OpenRouterClient, RagSystem, Settings, SqliteStore, logging};

#[derive(Parser)]
#[command(name = "wpg-engine", version, about = "Message classification and admin briefings for a chat-based strategy game")]
struct Cli {
    /// Settings file (JSON); defaults are used when it does not exist
    #[arg(long, env = "WPG_SETTINGS", default_value = DEFAULT_SETTINGS_PATH)]
    settings: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a player message as question, order, project or other
    Classify {
        message: String,
        /// Sender country name
        #[arg(long)]
        country: String,
    },
    /// Generate the admin briefing for a player message
    Brief {
        message: String,
        #[arg(long)]
        country: String,
        #[arg(long)]
        game: i64,
        #[arg(long)]
        player: i64,
    },
    /// Generate a random game event, global or for one country
    Event {
        #[arg(long)]
        game: i64,
        /// Country name or synonym; omit for a global event
        #[arg(long)]
        country: Option<String>,
        #[arg(long, default_value = DEFAULT_SETTING)]
        setting: String,
    },
    /// Create the demo countries and brief the demo messages
    SeedDemo {
        #[arg(long, default_value_t = DEMO_GAME_ID)]
        game: i64,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let settings = Settings::load_or_default(&cli.settings)?.with_env_overrides()?;
    logging::init(&settings.log_dir, settings.log_level_filter()?)?;
    log::info!("Starting wpg-engine (model: {})", settings.ai.default_model);

    let provider = OpenRouterClient::from_settings(&settings)?;
    if provider.is_none() {
        log::warn!("No OpenRouter API key configured, model calls are disabled");
    }

    match cli.command {
        Commands::Classify { message, country } => {
            let classifier = MessageClassifier::new(provider);
            let label = classifier.classify_message(&message, &country).await;
            println!("{label} ({})", label.russian());
        }
        Commands::Brief {
            message,
            country,
            game,
            player,
        } => {
            let store = SqliteStore::open(&settings.database.path).await?;
            let rag = RagSystem::new(store, provider);
            let analysis = rag.analyze_message(&message, &country, game, player).await;
            match analysis.label {
                Some(label) => println!("Type: {label}"),
                None => println!("Type: not classified"),
            }
            if analysis.has_briefing() {
                println!("{}", analysis.briefing);
            }
        }
        Commands::Event {
            game,
            country,
            setting,
        } => {
            let store = SqliteStore::open(&settings.database.path).await?;
            let generator = EventGenerator::new(store, provider);
            let event = generator.generate_event(game, country.as_deref(), &setting).await;
            println!("[{}] {}", event.tone, event.text);
        }
        Commands::SeedDemo { game } => {
            let store = SqliteStore::open(&settings.database.path).await?;
            let ids = seed_demo(&store, game).await?;
            println!("Seeded {} countries into game {game} ({DEMO_SETTING})", ids.len());

            let countries = build_country_snapshots(&store, game).await?;
            let rag = RagSystem::new(store, provider);
            for (i, (sender, message)) in DEMO_MESSAGES.iter().enumerate() {
                println!("\nTest {}: {sender}: {message}", i + 1);
                let briefing = rag.generate_admin_context(message, sender, game, 0).await;
                if briefing.is_empty() {
                    println!("No briefing generated (no API key or model error)");
                    for line in mentioned_countries_summary(&countries, message) {
                        println!("  {line}");
                    }
                } else {
                    println!("{briefing}");
                }
            }
        }
    }

    Ok(())
}
