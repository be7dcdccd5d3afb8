//! Logging bootstrap: one human-readable console layer and one JSON file layer,
//! both driven by per-target level tables built from [`LoggingConfig`].
//!
//! The `default` section sets the fallback level for any target that is not
//! named by another section. Named sections may point at their own log file;
//! everything else lands in the default file.

use crate::config::{LoggingConfig, Section};
use std::{
    io::{IsTerminal, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{filter::Targets, fmt};

use file_rotate::{
    compression::Compression,
    suffix::{AppendTimestamp, FileLimit},
    ContentLimit, FileRotate,
};

const DEFAULT_SECTION: &str = "default";
const DEFAULT_MAX_SIZE_MB: u64 = 100;

/// "off"/"none" silence a target; unknown strings fall back to INFO.
fn parse_level(s: &str) -> LevelFilter {
    match s.trim().to_ascii_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        "off" | "none" => LevelFilter::OFF,
        _ => LevelFilter::INFO,
    }
}

/// `target` equals `prefix` or lives in a submodule of it.
fn target_matches(target: &str, prefix: &str) -> bool {
    target
        .strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

// -------- files --------

type SharedFile = Arc<Mutex<FileRotate<AppendTimestamp>>>;

/// A log sink that may be absent; writes to an absent sink are discarded.
struct LogFile(Option<SharedFile>);

impl Write for LogFile {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &self.0 {
            Some(f) => f
                .lock()
                .map_err(|_| std::io::Error::other("log file writer poisoned"))?
                .write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &self.0 {
            Some(f) => f
                .lock()
                .map_err(|_| std::io::Error::other("log file writer poisoned"))?
                .flush(),
            None => Ok(()),
        }
    }
}

/// Picks the file for a record by its target.
#[derive(Clone, Default)]
struct FileRouter {
    fallback: Option<SharedFile>,
    routes: Vec<(String, SharedFile)>,
}

impl FileRouter {
    fn file_for(&self, target: &str) -> Option<SharedFile> {
        self.routes
            .iter()
            .find(|(prefix, _)| target_matches(target, prefix))
            .map(|(_, f)| f)
            .or(self.fallback.as_ref())
            .cloned()
    }

    fn is_empty(&self) -> bool {
        self.fallback.is_none() && self.routes.is_empty()
    }
}

impl<'a> fmt::MakeWriter<'a> for FileRouter {
    type Writer = LogFile;

    fn make_writer(&'a self) -> Self::Writer {
        LogFile(self.fallback.clone())
    }

    fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Self::Writer {
        LogFile(self.file_for(meta.target()))
    }
}

/// Relative paths are anchored at `base_dir`.
fn resolve_log_path(file: &str, base_dir: &Path) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

/// `max_backups` wins over `max_age_days`.
fn file_limit_for(section: &Section) -> FileLimit {
    match section.max_backups {
        Some(n) if n > 0 => FileLimit::MaxFiles(n),
        _ => FileLimit::Age(chrono::Duration::days(
            section.max_age_days.unwrap_or(1).max(1).into(),
        )),
    }
}

fn open_rotating(path: &Path, max_bytes: usize, limit: FileLimit) -> std::io::Result<SharedFile> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let rot = FileRotate::new(
        path,
        AppendTimestamp::default(limit),
        ContentLimit::BytesSurpassed(max_bytes),
        Compression::None,
        #[cfg(unix)]
        None,
    );

    Ok(Arc::new(Mutex::new(rot)))
}

/// `None` when the section has no file or the file cannot be opened.
fn open_section_file(name: &str, section: &Section, base_dir: &Path) -> Option<SharedFile> {
    if section.file.trim().is_empty() {
        return None;
    }

    let path = resolve_log_path(&section.file, base_dir);
    let max_bytes = section.max_size_mb.unwrap_or(DEFAULT_MAX_SIZE_MB) * 1024 * 1024;

    match open_rotating(&path, max_bytes as usize, file_limit_for(section)) {
        Ok(file) => Some(file),
        Err(e) => {
            // No subscriber yet; stderr is all there is.
            eprintln!(
                "Failed to open log file for '{}' at {}: {}",
                name,
                path.display(),
                e
            );
            None
        }
    }
}

// -------- plan --------

/// Level tables and file routing derived from a [`LoggingConfig`].
struct LogPlan {
    console: Targets,
    file: Targets,
    files: FileRouter,
}

impl LogPlan {
    fn build(cfg: &LoggingConfig, base_dir: &Path) -> Self {
        let mut console = Targets::new().with_default(LevelFilter::OFF);
        let mut file = Targets::new().with_default(LevelFilter::OFF);
        let mut files = FileRouter::default();

        if let Some(section) = cfg.get(DEFAULT_SECTION) {
            console = console.with_default(parse_level(&section.console_level));
            files.fallback = open_section_file(DEFAULT_SECTION, section, base_dir);
            if files.fallback.is_some() {
                file = file.with_default(parse_level(&section.file_level));
            }
        }

        for (name, section) in cfg.iter().filter(|(k, _)| k.as_str() != DEFAULT_SECTION) {
            console = console.with_target(name.clone(), parse_level(&section.console_level));

            // A named section without its own file is kept out of the default file too.
            match open_section_file(name, section, base_dir) {
                Some(f) => {
                    files.routes.push((name.clone(), f));
                    file = file.with_target(name.clone(), parse_level(&section.file_level));
                }
                None => file = file.with_target(name.clone(), LevelFilter::OFF),
            }
        }

        Self {
            console,
            file,
            files,
        }
    }

    fn install(self) {
        use tracing_subscriber::{layer::SubscriberExt, Layer, Registry};

        let console_layer = fmt::layer()
            .with_ansi(std::io::stdout().is_terminal())
            .with_target(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_filter(self.console);

        let file_filter = self.file;
        let file_layer = (!self.files.is_empty()).then(|| {
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_target(true)
                .with_timer(fmt::time::UtcTime::rfc_3339())
                .with_writer(self.files)
                .with_filter(file_filter)
        });

        install(Registry::default().with(console_layer).with(file_layer));
    }
}

/// First installer wins; `log` records are bridged only alongside it.
fn install<S>(subscriber: S)
where
    S: tracing::Subscriber + Send + Sync + 'static,
{
    if tracing::subscriber::set_global_default(subscriber).is_ok() {
        let _ = tracing_log::LogTracer::init();
    }
}

/// Install the global subscriber.
///
/// `base_dir` anchors relative log file paths (normally `server.home_dir`).
/// Calling this again after a subscriber is installed has no effect.
pub fn init_logging_from_config(cfg: &LoggingConfig, base_dir: &Path) {
    if tracing::dispatcher::has_been_set() {
        return;
    }

    if cfg.is_empty() {
        install(
            fmt()
                .with_target(true)
                .with_timer(fmt::time::UtcTime::rfc_3339())
                .finish(),
        );
        return;
    }

    LogPlan::build(cfg, base_dir).install();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_logging_config;
    use tempfile::tempdir;
    use tracing::Level;

    fn section(file: &str) -> Section {
        Section {
            console_level: "warn".into(),
            file: file.into(),
            file_level: "debug".into(),
            max_age_days: Some(7),
            max_backups: Some(3),
            max_size_mb: Some(10),
        }
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("trace"), LevelFilter::TRACE);
        assert_eq!(parse_level("DEBUG"), LevelFilter::DEBUG);
        assert_eq!(parse_level(" Info "), LevelFilter::INFO);
        assert_eq!(parse_level("error"), LevelFilter::ERROR);
        assert_eq!(parse_level("off"), LevelFilter::OFF);
        assert_eq!(parse_level("none"), LevelFilter::OFF);
        assert_eq!(parse_level("loud"), LevelFilter::INFO);
    }

    #[test]
    fn test_target_matches() {
        assert!(target_matches("registration", "registration"));
        assert!(target_matches("registration::api::rest", "registration"));
        assert!(!target_matches("registration_extra", "registration"));
        assert!(!target_matches("sea_orm", "registration"));
    }

    #[test]
    fn test_resolve_log_path() {
        let tmp = tempdir().unwrap();

        let resolved = resolve_log_path("logs/test.log", tmp.path());
        assert!(resolved.starts_with(tmp.path()));
        assert!(resolved.ends_with("logs/test.log"));

        let abs = tmp.path().join("elsewhere.log");
        assert_eq!(resolve_log_path(&abs.to_string_lossy(), Path::new("/x")), abs);
    }

    #[test]
    fn test_open_rotating_creates_parent() {
        let tmp = tempdir().unwrap();
        let p = tmp.path().join("nested/dir/app.log");

        assert!(open_rotating(&p, 128 * 1024, FileLimit::MaxFiles(2)).is_ok());
        assert!(p.parent().unwrap().is_dir());
    }

    #[test]
    fn test_blank_file_means_no_file() {
        let tmp = tempdir().unwrap();
        assert!(open_section_file("default", &section("  "), tmp.path()).is_none());
    }

    #[test]
    fn test_file_limit_selection() {
        let mut s = section("x.log");
        assert!(matches!(file_limit_for(&s), FileLimit::MaxFiles(3)));

        s.max_backups = None;
        assert!(matches!(file_limit_for(&s), FileLimit::Age(_)));
    }

    #[test]
    fn test_plan_levels_and_routes() {
        let tmp = tempdir().unwrap();
        let mut cfg = default_logging_config();
        cfg.insert("registration".into(), section("logs/registration.log"));
        cfg.insert("sqlx".into(), section(""));

        let plan = LogPlan::build(&cfg, tmp.path());

        // default section: console info, file debug
        assert!(plan.console.would_enable("axum::serve", &Level::INFO));
        assert!(!plan.console.would_enable("axum::serve", &Level::DEBUG));
        assert!(plan.file.would_enable("axum::serve", &Level::DEBUG));

        // named section overrides the default
        assert!(!plan.console.would_enable("registration::domain", &Level::INFO));
        assert!(plan.console.would_enable("registration::domain", &Level::WARN));

        // no own file: silenced in files altogether
        assert!(!plan.file.would_enable("sqlx::query", &Level::ERROR));

        assert!(plan.files.fallback.is_some());
        assert_eq!(plan.files.routes.len(), 1);
        let own = plan.files.file_for("registration::domain").unwrap();
        let fallback = plan.files.file_for("sea_orm::driver").unwrap();
        assert!(!Arc::ptr_eq(&own, &fallback));
    }

    #[test]
    fn test_second_init_is_a_no_op() {
        let tmp = tempdir().unwrap();

        // Empty config: plain fmt subscriber becomes the global default.
        init_logging_from_config(&LoggingConfig::new(), tmp.path());
        assert!(tracing::dispatcher::has_been_set());

        // A full config afterwards must not replace it.
        let mut cfg = default_logging_config();
        if let Some(s) = cfg.get_mut(DEFAULT_SECTION) {
            s.file = "logs/second.log".into();
        }
        init_logging_from_config(&cfg, tmp.path());

        tracing::error!(target: "second_init", "after second init");

        let second = tmp.path().join("logs/second.log");
        let written = std::fs::read_to_string(&second).unwrap_or_default();
        assert!(written.is_empty(), "second config got installed: {written}");
    }

    #[test]
    fn test_plan_without_default_file() {
        let tmp = tempdir().unwrap();
        let mut cfg = default_logging_config();
        if let Some(s) = cfg.get_mut(DEFAULT_SECTION) {
            s.file = String::new();
        }

        let plan = LogPlan::build(&cfg, tmp.path());

        assert!(plan.files.is_empty());
        assert!(!plan.file.would_enable("anything", &Level::ERROR));
    }
}
