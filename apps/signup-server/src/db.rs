use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use runtime::{AppConfig, DatabaseConfig};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use url::Url;

pub const MEMORY_DSN: &str = "sqlite::memory:";

const DEFAULT_MAX_CONNS: u32 = 10;
const DEFAULT_ACQUIRE_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Sqlite,
    Postgres,
}

/// Detect DB backend from URL scheme.
pub fn detect_backend(dsn: &str) -> Result<Backend> {
    let raw = dsn.trim();
    if raw.is_empty() {
        return Err(anyhow!("Database URL not configured"));
    }
    if raw.eq_ignore_ascii_case(MEMORY_DSN) {
        return Ok(Backend::Sqlite);
    }

    let url = Url::parse(raw).map_err(|e| anyhow!("Invalid database DSN '{}': {}", raw, e))?;

    match url.scheme() {
        "sqlite" | "sqlite3" => Ok(Backend::Sqlite),
        "postgres" | "postgresql" => Ok(Backend::Postgres),
        other => Err(anyhow!("Unsupported database type: {}", other)),
    }
}

/// Expand a sqlite DSN into an absolute-path DSN using a base directory.
/// - Keeps "sqlite::memory:" as-is.
/// - Normalizes backslashes into forward slashes (Windows).
pub fn absolutize_sqlite_dsn(dsn: &str, base_dir: &Path, create_dirs: bool) -> Result<String> {
    if dsn.eq_ignore_ascii_case(MEMORY_DSN) || dsn.eq_ignore_ascii_case("sqlite://:memory:") {
        return Ok(MEMORY_DSN.to_string());
    }
    let db_path = dsn
        .strip_prefix("sqlite://")
        .ok_or_else(|| anyhow!("DSN must start with sqlite:// (got: {})", dsn))?;

    let (path_str, query) = match db_path.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (db_path, None),
    };

    let mut p = PathBuf::from(path_str);
    if p.as_os_str().is_empty() {
        return Err(anyhow!("Empty SQLite path in DSN"));
    }
    if p.is_relative() {
        p = base_dir.join(p);
    }

    if create_dirs {
        if let Some(dir) = p.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create database dir {}", dir.display()))?;
        }
    }

    let mut out = String::from("sqlite://");
    out.push_str(&p.to_string_lossy().replace('\\', "/"));
    if let Some(q) = query {
        out.push('?');
        out.push_str(q);
    }
    Ok(out)
}

/// Final DSN the server connects to: `--mock` wins, then the configured URL
/// (or the built-in default when no `database` section exists).
/// `create_dirs` creates the parent directory of a SQLite file.
pub fn resolve_dsn(config: &AppConfig, mock: bool, create_dirs: bool) -> Result<String> {
    if mock {
        return Ok(MEMORY_DSN.to_string());
    }

    let url = match &config.database {
        Some(db) => db.url.trim().to_owned(),
        None => {
            tracing::info!("No database section configured, using the default SQLite file");
            DatabaseConfig::default().url
        }
    };
    detect_backend(&url)?;

    if url.starts_with("sqlite://") {
        absolutize_sqlite_dsn(&url, Path::new(&config.server.home_dir), create_dirs)
    } else {
        Ok(url)
    }
}

pub async fn connect(config: &AppConfig, mock: bool) -> Result<DatabaseConnection> {
    let dsn = resolve_dsn(config, mock, true)?;
    let db_cfg = config.database.clone().unwrap_or_default();

    let mut opts = ConnectOptions::new(dsn.clone());
    opts.acquire_timeout(Duration::from_millis(
        db_cfg
            .acquire_timeout_ms
            .unwrap_or(DEFAULT_ACQUIRE_TIMEOUT_MS),
    ))
    .sqlx_logging(false);

    if dsn == MEMORY_DSN {
        // Every connection gets its own in-memory database; keep exactly one.
        opts.max_connections(1).min_connections(1);
    } else {
        opts.max_connections(db_cfg.max_conns.unwrap_or(DEFAULT_MAX_CONNS));
    }

    tracing::info!("Connecting to database: {}", redact_dsn(&dsn));
    let db = Database::connect(opts)
        .await
        .with_context(|| format!("Failed to connect to database {}", redact_dsn(&dsn)))?;
    tracing::info!("Connected DB backend: {:?}", db.get_database_backend());

    Ok(db)
}

/// Hide the password part of a DSN for logs.
pub fn redact_dsn(dsn: &str) -> String {
    match Url::parse(dsn) {
        Ok(mut url) if url.password().is_some() => {
            if url.set_password(Some("***")).is_err() {
                return dsn.to_string();
            }
            url.to_string()
        }
        _ => dsn.to_string(),
    }
}
