use anyhow::Context as _;
use igams_core::config::{Config, CONFIG_FILE};
use igams_core::sqlite::SqliteLogStore;
use std::path::{Path, PathBuf};

/// Resolved global options shared by every subcommand.
pub struct Context {
    pub config_path: PathBuf,
    pub config: Config,
    pub db_path: PathBuf,
    actor: Option<String>,
}

impl Context {
    /// Resolve paths and load the config.
    ///
    /// Priority for the database path:
    /// 1. `--db` flag / `IGAMS_DB` env var
    /// 2. `log_store.path` from the config, relative to the config's directory
    pub fn load(
        config_path: Option<&Path>,
        db_path: Option<&Path>,
        actor: Option<String>,
    ) -> anyhow::Result<Self> {
        let config_path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
        let config = Config::load(&config_path)
            .with_context(|| format!("failed to load config {}", config_path.display()))?;
        let db_path = match db_path {
            Some(p) => p.to_path_buf(),
            None => resolve_relative(&config_path, &config.log_store.path),
        };
        Ok(Self {
            config_path,
            config,
            db_path,
            actor,
        })
    }

    pub fn actor(&self) -> anyhow::Result<&str> {
        self.actor
            .as_deref()
            .filter(|a| !a.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("no actor given; pass --actor or set IGAMS_ACTOR"))
    }

    pub fn open_store(&self) -> anyhow::Result<SqliteLogStore> {
        SqliteLogStore::open(&self.db_path)
            .with_context(|| format!("failed to open log store {}", self.db_path.display()))
    }
}

fn resolve_relative(config_path: &Path, target: &Path) -> PathBuf {
    if target.is_absolute() {
        return target.to_path_buf();
    }
    match config_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(target),
        _ => target.to_path_buf(),
    }
}
