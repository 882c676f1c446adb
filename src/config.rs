use clap::Parser;
use serde::Deserialize;
use tally_core::{AccountKind, Amount};

#[derive(Parser, Debug)]
#[command(name = "tally", about = "Tally - personal-finance ledger demo")]
pub struct CliArgs {
    /// Path to config file
    #[arg(short, long, default_value = "tally.toml")]
    pub config: String,

    /// SQLite database file (overrides config file)
    #[arg(short, long)]
    pub database: Option<String>,

    /// Log level (overrides config file)
    #[arg(short, long)]
    pub log_level: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_storage")]
    pub storage: StorageConfig,

    #[serde(default = "default_logging")]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub demo: DemoConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// SQLite file; `:memory:` keeps everything in memory.
    #[serde(default = "default_path")]
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,
}

/// Accounts to seed and deltas to apply when the binary runs.
#[derive(Debug, Deserialize, Clone)]
pub struct DemoConfig {
    #[serde(default)]
    pub accounts: Vec<SeedAccount>,

    #[serde(default)]
    pub deltas: Vec<DeltaConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SeedAccount {
    pub id: String,
    pub kind: AccountKind,
    #[serde(default = "default_initial")]
    pub initial: AmountValue,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DeltaConfig {
    pub account: String,
    pub amount: AmountValue,
    #[serde(default)]
    pub reason: Option<String>,
    /// `YYYY-MM-DD`; today when absent.
    #[serde(default)]
    pub date: Option<String>,
}

/// TOML integers stay whole, floats stay real.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(untagged)]
pub enum AmountValue {
    Whole(i64),
    Real(f64),
}

impl From<AmountValue> for Amount {
    fn from(value: AmountValue) -> Self {
        match value {
            AmountValue::Whole(w) => Amount::Whole(w),
            AmountValue::Real(r) => Amount::Real(r),
        }
    }
}

fn default_storage() -> StorageConfig {
    StorageConfig {
        path: default_path(),
    }
}

fn default_logging() -> LoggingConfig {
    LoggingConfig {
        level: default_log_level(),
        json: false,
    }
}

fn default_path() -> String {
    "tally.db".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_initial() -> AmountValue {
    AmountValue::Whole(0)
}

fn seed(id: &str, kind: AccountKind, initial: i64) -> SeedAccount {
    SeedAccount {
        id: id.to_string(),
        kind,
        initial: AmountValue::Whole(initial),
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        DemoConfig {
            accounts: vec![
                seed("cash", AccountKind::Current, 200),
                seed("wechat", AccountKind::Current, 20),
                seed("alipay", AccountKind::Current, 120),
                seed("icbc", AccountKind::Current, 90),
                seed("stock_000002SZ", AccountKind::Investment, 2000),
            ],
            deltas: vec![
                DeltaConfig {
                    account: "cash".to_string(),
                    amount: AmountValue::Real(-20.0),
                    reason: Some("meal".to_string()),
                    date: None,
                },
                DeltaConfig {
                    account: "stock_000002SZ".to_string(),
                    amount: AmountValue::Whole(4000),
                    reason: None,
                    date: None,
                },
            ],
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            storage: default_storage(),
            logging: default_logging(),
            demo: DemoConfig::default(),
        }
    }
}

impl Config {
    pub fn load(cli: &CliArgs) -> Self {
        let mut config = match std::fs::read_to_string(&cli.config) {
            Ok(contents) => Self::parse(&contents).unwrap_or_else(|e| {
                eprintln!("Warning: Failed to parse config file: {}", e);
                Config::default()
            }),
            Err(_) => Config::default(),
        };

        // CLI overrides
        if let Some(ref path) = cli.database {
            config.storage.path = path.clone();
        }
        if let Some(ref level) = cli.log_level {
            config.logging.level = level.clone();
        }

        config
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_reproduce_demo() {
        let config = Config::default();
        assert_eq!(config.storage.path, "tally.db");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.demo.accounts.len(), 5);
        assert_eq!(config.demo.accounts[4].kind, AccountKind::Investment);
        assert_eq!(config.demo.deltas[0].reason.as_deref(), Some("meal"));
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.storage.path, "tally.db");
        assert_eq!(config.demo.accounts.len(), 5);
    }

    #[test]
    fn test_parse_custom_demo() {
        let config = Config::parse(
            r#"
            [storage]
            path = ":memory:"

            [logging]
            level = "debug"
            json = true

            [[demo.accounts]]
            id = "wallet"
            kind = "current"
            initial = 12.5

            [[demo.accounts]]
            id = "fund_A"
            kind = "investment"
            initial = 10

            [[demo.deltas]]
            account = "wallet"
            amount = -2.5
            reason = "coffee"
            date = "2024-04-05"
            "#,
        )
        .unwrap();

        assert_eq!(config.storage.path, ":memory:");
        assert!(config.logging.json);
        assert_eq!(config.demo.accounts[0].initial, AmountValue::Real(12.5));
        assert_eq!(config.demo.accounts[1].initial, AmountValue::Whole(10));
        assert_eq!(config.demo.deltas.len(), 1);
        assert_eq!(config.demo.deltas[0].date.as_deref(), Some("2024-04-05"));
    }

    #[test]
    fn test_cli_overrides() {
        let cli = CliArgs::parse_from([
            "tally",
            "--config",
            "/nonexistent/tally.toml",
            "--database",
            ":memory:",
            "--log-level",
            "trace",
        ]);
        let config = Config::load(&cli);
        assert_eq!(config.storage.path, ":memory:");
        assert_eq!(config.logging.level, "trace");
    }

    #[test]
    fn test_unknown_kind_is_a_parse_error() {
        let result = Config::parse(
            r#"
            [[demo.accounts]]
            id = "x"
            kind = "crypto"
            "#,
        );
        assert!(result.is_err());
    }
}
