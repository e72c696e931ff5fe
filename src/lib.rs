use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

pub mod domain;
pub mod infrastructure;

#[derive(Clone, Debug, Deserialize)]
pub struct LunchlyConfig {
    pub database: Database,
    #[serde(default)]
    pub logger: Logger,
}

impl LunchlyConfig {
    /// `lunchly.toml` と `LUNCHLY_` 環境変数から設定を読み込む
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("lunchly").required(false))
            .add_source(Environment::with_prefix("LUNCHLY").separator("_"))
            .build()?
            .try_deserialize::<LunchlyConfig>()
    }

    /// TOML文字列から設定を読み込む
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize::<LunchlyConfig>()
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Database {
    pub url: String,
    #[serde(default = "Database::default_max_connections")]
    pub max_connections: u32,
}

impl Database {
    fn default_max_connections() -> u32 {
        5
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Logger {
    pub level: Level,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub enum Level {
    TRACE,
    DEBUG,
    #[default]
    INFO,
    WARN,
    ERROR,
}

impl From<&Level> for tracing::Level {
    fn from(value: &Level) -> Self {
        match value {
            Level::TRACE => tracing::Level::TRACE,
            Level::DEBUG => tracing::Level::DEBUG,
            Level::INFO => tracing::Level::INFO,
            Level::WARN => tracing::Level::WARN,
            Level::ERROR => tracing::Level::ERROR,
        }
    }
}

/// ログ出力を初期化する（二回目以降の呼び出しは無視される）
pub fn init_tracing(logger: &Logger) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::from(&logger.level))
        .try_init();
}
