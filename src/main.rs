use clap::{Parser, Subcommand};
use std::sync::Arc;

use skillgate::application::errors::ConfigError;
use skillgate::application::messaging::{job_queue, MessageDispatcher, Worker, QUEUE_CAPACITY};
use skillgate::domain::entities::User;
use skillgate::infrastructure::adapters::console::{ConsoleSense, CONSOLE_SENSE};
use skillgate::infrastructure::config::Config;
use skillgate::skills::SkillCatalog;
use skillgate::{AppContext, BotError};

#[derive(Parser)]
#[command(name = "skillgate")]
#[command(about = "Routes chat messages to skills behind group permissions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot on the console sense
    Run,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
    /// Validate the config and list the routes it produces
    CheckConfig,
}

fn main() {
    let cli = Cli::parse();
    let (config, load_error) = load_config(&cli.config);

    // Initialize logging
    let level = config
        .log
        .level
        .parse::<tracing_subscriber::filter::Directive>()
        .unwrap_or_else(|_| tracing::Level::INFO.into());
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level))
        .init();

    if let Some(e) = load_error {
        tracing::warn!("Failed to load config: {}, using defaults", e);
    }

    let result = match cli.command {
        Commands::Run => run_bot(config),
        Commands::Version => {
            println!("skillgate v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::InitConfig => init_config(),
        Commands::CheckConfig => check_config(config),
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

/// Runs before logging is up, so a load failure is handed back for reporting
fn load_config(config_path: &str) -> (Config, Option<ConfigError>) {
    let (mut config, error) = if std::path::Path::new(config_path).exists() {
        match Config::load(config_path) {
            Ok(config) => (config, None),
            Err(e) => (Config::default(), Some(e)),
        }
    } else {
        (Config::default(), None)
    };
    config.apply_env();
    (config, error)
}

fn build_app(config: &Config) -> Result<AppContext, BotError> {
    config.validate()?;
    let catalog = SkillCatalog::with_builtin()?;
    AppContext::from_config(config, catalog)
}

fn run_bot(config: Config) -> Result<(), BotError> {
    tracing::info!("Starting skillgate: {}", config.bot.name);

    let app = Arc::new(build_app(&config)?.with_sense(CONSOLE_SENSE));
    tracing::info!("Loaded {} routes", app.registry.len());

    let user = User::new(&config.console.user_email, &config.console.user_email)
        .with_handle(&config.console.user_handle);
    let sense = Arc::new(ConsoleSense::new(&config.bot.name, user));

    let rt = tokio::runtime::Runtime::new().map_err(|e| BotError::Internal(e.to_string()))?;
    rt.block_on(async {
        let (sender, receiver) = job_queue(QUEUE_CAPACITY);
        let worker = Worker::new(app.clone()).with_sense(sense.clone());
        let worker = tokio::spawn(worker.run(receiver));

        let dispatcher = MessageDispatcher::new(app.clone(), sender);
        let result = sense
            .run(|message| {
                let dispatcher = &dispatcher;
                async move { dispatcher.dispatch(CONSOLE_SENSE, message).await.map(|_| ()) }
            })
            .await;

        drop(dispatcher);
        if let Err(e) = worker.await {
            tracing::error!("Worker stopped unexpectedly: {}", e);
        }
        result
    })
}

fn init_config() -> Result<(), BotError> {
    let config = Config::default();
    let yaml = serde_yaml::to_string(&config).map_err(|e| BotError::Internal(e.to_string()))?;
    println!("{}", yaml);
    println!("\nSave this to config.yaml and adjust as needed.");
    Ok(())
}

fn check_config(config: Config) -> Result<(), BotError> {
    let app = build_app(&config)?;

    println!("Config OK: {}", config.bot.name);
    println!("Encryption key fingerprint: {}", app.storage.current_fingerprint());
    for skill in app.skills.list_skills(&app.registry) {
        println!("{}: {}", skill.name, skill.description);
        for name in &skill.routes {
            if let Some(route) = app.registry.find(name) {
                println!("  [{:>2}] {} -> {}", route.priority(), route.name(), route.action());
            }
        }
    }
    Ok(())
}
