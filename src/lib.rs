//! Moodify API Library
//!
//! This library provides the building blocks of the Moodify backend: a small
//! HTTP service that exchanges Spotify authorization codes for access tokens,
//! classifies free text into mood, intent and context labels, and recommends a
//! track from the user's own library.
//!
//! # Modules
//!
//! - `api` - HTTP handlers for the public endpoints
//! - `classifier` - TF-IDF + logistic regression text classifiers
//! - `config` - Configuration management and environment variables
//! - `error` - Error taxonomy and the JSON error envelope
//! - `recommend` - Track scoring and recommendation engine
//! - `server` - Router construction, middleware stack and shared state
//! - `spotify` - Spotify Web API client implementation
//! - `types` - Data structures and type definitions
//! - `utils` - Utility functions and helpers
//!
//! # Example
//!
//! ```
//! use moodify::{config, server};
//!
//! #[tokio::main]
//! async fn main() -> moodify::Res<()> {
//!     config::load_env();
//!     let config = config::Config::from_env()?;
//!     server::start_api_server(config, false).await
//! }
//! ```

pub mod api;
pub mod classifier;
pub mod config;
pub mod error;
pub mod recommend;
pub mod server;
pub mod spotify;
pub mod types;
pub mod utils;

/// A convenient Result type alias for operations that may fail.
///
/// Used by the command-line glue and the server bootstrap, where errors of
/// different modules meet and are only reported, never matched on. Library
/// code below the bootstrap returns typed errors from [`error`].
///
/// # Example
///
/// ```
/// use moodify::Res;
///
/// async fn fetch_data() -> Res<String> {
///     Ok("data".to_string())
/// }
/// ```
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints an informational message with a blue bullet point.
///
/// Console output for the command-line subcommands. The HTTP server logs
/// through `tracing` instead.
///
/// # Example
///
/// ```
/// info!("Training {} classifiers...", 3);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
///
/// # Example
///
/// ```
/// success!("Models written to {}", dir.display());
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Only for fatal errors in the command-line entry points, where recovery is
/// not possible.
///
/// # Example
///
/// ```
/// error!("Missing required environment variable: {}", var_name);
/// // Program exits here - code after this will not execute
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// # Example
///
/// ```
/// warning!("Failed to open browser, open the URL manually");
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
