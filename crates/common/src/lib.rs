use clap::Parser;
use database::Database;

pub mod auth;
pub mod money;
pub mod users;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Config,
}

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:finance.db")]
    pub database_url: String,

    #[arg(long, env = "PORT", default_value = "3000")]
    pub port: u16,

    #[arg(long, env = "APP_PASSWORD")]
    pub app_password: Option<String>,

    /// Lifetime of cached category lists, in seconds.
    #[arg(long, env = "CACHE_TTL_SECS", default_value = "60")]
    pub cache_ttl_secs: u64,
}

impl Config {
    /// Configuration for tests: in-memory URL, auth disabled.
    pub fn for_tests() -> Self {
        Self {
            database_url: "sqlite::memory:".into(),
            port: 0,
            app_password: None,
            cache_ttl_secs: 60,
        }
    }
}
