use std::path::PathBuf;

use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};
use tabled::Table;

use moodify::{
    classifier::{Classifiers, TrainOptions, dataset},
    config, error, info, server,
    spotify::{SpotifyApi, SpotifyClient},
    success,
    types::ModelTableRow,
    utils, warning,
};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP API
    Serve(ServeOptions),

    /// Train the emotion, intent and context classifiers
    Train(TrainOptionsArgs),

    /// Generate a PKCE verifier, its challenge and the Spotify authorize URL
    Pkce(PkceOptions),

    /// Exchange an authorization code for a token from the command line
    Exchange(ExchangeOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct ServeOptions {
    /// Train on the built-in dataset when the model files are missing
    #[clap(long)]
    pub train_on_start: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct TrainOptionsArgs {
    /// JSON file with `sentence`, `emotion`, `intent` and `context` rows
    #[clap(long)]
    pub data: Option<PathBuf>,

    /// Output directory (defaults to MOODIFY_MODELS_DIR or ./models)
    #[clap(long)]
    pub out: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct PkceOptions {
    /// Open the authorize URL in the default browser
    #[clap(long)]
    pub open: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct ExchangeOptions {
    /// Authorization code returned to the redirect URI
    #[clap(long)]
    pub code: String,

    /// PKCE code verifier the challenge was derived from
    #[clap(long)]
    pub verifier: String,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    config::load_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve(opt) => serve(opt).await,
        Command::Train(opt) => train(opt).await,
        Command::Pkce(opt) => pkce(opt),
        Command::Exchange(opt) => exchange(opt).await,
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}

async fn serve(opt: ServeOptions) {
    let config = match config::Config::from_env() {
        Ok(config) => config,
        Err(e) => error!("Invalid configuration: {}", e),
    };

    if let Err(e) = server::start_api_server(config, opt.train_on_start).await {
        error!("Server failed: {}", e);
    }
}

async fn train(opt: TrainOptionsArgs) {
    let samples = match opt.data {
        Some(path) => match dataset::load_dataset(&path).await {
            Ok(samples) => samples,
            Err(e) => error!("Cannot read training data: {}", e),
        },
        None => dataset::sample_dataset(),
    };
    info!("Training classifiers on {} sentences", samples.len());

    let classifiers = match Classifiers::train(&samples, TrainOptions::default()) {
        Ok(classifiers) => classifiers,
        Err(e) => error!("Training failed: {}", e),
    };

    let out = opt.out.unwrap_or_else(config::models_dir);
    if let Err(e) = classifiers.save(&out).await {
        error!("Cannot write models: {}", e);
    }

    let rows: Vec<ModelTableRow> = classifiers
        .named()
        .iter()
        .map(|(name, classifier)| ModelTableRow {
            model: name.to_string(),
            labels: classifier.labels().join(", "),
            vocabulary: classifier.vocabulary_len(),
            iterations: classifier.iterations(),
        })
        .collect();

    println!("{}", Table::new(rows));
    success!("All models trained and saved to {}", out.display());
}

fn pkce(opt: PkceOptions) {
    let spotify = match config::spotify_from_env() {
        Ok(spotify) => spotify,
        Err(e) => error!("Invalid configuration: {}", e),
    };

    let verifier = utils::generate_code_verifier();
    let challenge = utils::generate_code_challenge(&verifier);
    let url = match utils::build_authorize_url(&spotify, &challenge) {
        Ok(url) => url,
        Err(e) => error!("{}", e),
    };

    info!("code_verifier:  {}", verifier);
    info!("code_challenge: {}", challenge);
    info!("authorize url:  {}", url);

    if opt.open && webbrowser::open(url.as_str()).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            url
        )
    }
}

async fn exchange(opt: ExchangeOptions) {
    let config = match config::Config::from_env() {
        Ok(config) => config,
        Err(e) => error!("Invalid configuration: {}", e),
    };

    let client = match SpotifyClient::new(config.spotify, config.upstream_timeout) {
        Ok(client) => client,
        Err(e) => error!("Cannot create HTTP client: {}", e),
    };

    match client.exchange_code(&opt.code, &opt.verifier).await {
        Ok(token) => match serde_json::to_string_pretty(&token) {
            Ok(json) => {
                println!("{}", json);
                success!("Token exchange successful");
            }
            Err(e) => error!("Cannot print token: {}", e),
        },
        Err(e) => error!("Token exchange failed: {}", e),
    }
}
