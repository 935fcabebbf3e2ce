use std::{env, fmt::Display, net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use clap::{Parser, ValueEnum};
use tracing::{info, warn};

use crate::error::ConfigError;

const DEV_SESSION_SECRET: &str = "recipe-hub-dev-secret";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format {other:?}")),
        }
    }
}

/// Command-line overrides for the server binary. Anything left unset falls
/// back to the environment (and `.env`), then to built-in defaults.
#[derive(Parser, Debug, Default)]
#[command(name = "recipe_hub", about = "Recipe search web app", long_about = None)]
pub struct Cli {
    /// Recipe table (CSV)
    #[arg(long)]
    pub recipes: Option<PathBuf>,

    /// Review table (CSV)
    #[arg(long)]
    pub reviews: Option<PathBuf>,

    #[arg(short, long)]
    pub bind: Option<SocketAddr>,

    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub recipes_path: PathBuf,
    pub reviews_path: PathBuf,
    pub bind_addr: SocketAddr,
    pub session_secret: String,
    pub session_ttl: Duration,
    pub bcrypt_cost: u32,
    pub seed_username: String,
    pub seed_password: String,
    pub log_format: LogFormat,
}

impl Config {
    /// Environment first, then CLI overrides on top.
    pub fn load(cli: Cli) -> Result<Self, ConfigError> {
        let mut config = Self::from_env()?;
        if let Some(path) = cli.recipes {
            config.recipes_path = path;
        }
        if let Some(path) = cli.reviews {
            config.reviews_path = path;
        }
        if let Some(addr) = cli.bind {
            config.bind_addr = addr;
        }
        if let Some(format) = cli.log_format {
            config.log_format = format;
        }
        Ok(config)
    }

    pub fn log_summary(&self) {
        info!(
            recipes = %self.recipes_path.display(),
            reviews = %self.reviews_path.display(),
            bind = %self.bind_addr,
            session_ttl_secs = self.session_ttl.as_secs(),
            bcrypt_cost = self.bcrypt_cost,
            "configuration loaded"
        );
        if self.session_secret == DEV_SESSION_SECRET {
            warn!("SESSION_SECRET not set, signing sessions with the development secret");
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            recipes_path: try_load("RECIPES_PATH", "resource/recipes.csv")?,
            reviews_path: try_load("REVIEWS_PATH", "resource/reviews.csv")?,
            bind_addr: try_load("BIND_ADDR", "0.0.0.0:5000")?,
            session_secret: session_secret(),
            session_ttl: Duration::from_secs(try_load("SESSION_TTL_SECS", "3600")?),
            bcrypt_cost: try_load("BCRYPT_COST", &bcrypt::DEFAULT_COST.to_string())?,
            seed_username: try_load("SEED_USERNAME", "user")?,
            seed_password: try_load("SEED_PASSWORD", "password")?,
            log_format: try_load("LOG_FORMAT", "pretty")?,
        })
    }
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        reason: e.to_string(),
        value: raw.clone(),
    })
}

fn session_secret() -> String {
    env::var("SESSION_SECRET").unwrap_or_else(|_| DEV_SESSION_SECRET.to_string())
}
