use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};

/// Resolve the service home directory.
///
/// - `None` (or empty) → `<user home>/<default_subdir>`
/// - `~` / `~/...` → expanded against the user home
/// - relative paths → joined with the current working directory
///
/// The returned path is always absolute. With `create` set, the directory is created.
pub fn resolve_home_dir(
    configured: Option<String>,
    default_subdir: &str,
    create: bool,
) -> Result<PathBuf> {
    let resolved = match configured.as_deref().map(str::trim) {
        None | Some("") => user_home()?.join(default_subdir),
        Some(raw) => expand(raw)?,
    };

    if create {
        std::fs::create_dir_all(&resolved)
            .with_context(|| format!("Failed to create home dir {}", resolved.display()))?;
    }

    Ok(resolved)
}

fn expand(raw: &str) -> Result<PathBuf> {
    if raw == "~" {
        return user_home();
    }
    if let Some(rest) = raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\")) {
        return Ok(user_home()?.join(rest));
    }

    let p = Path::new(raw);
    if p.is_absolute() {
        Ok(p.to_path_buf())
    } else {
        let cwd = std::env::current_dir().context("Failed to read current directory")?;
        Ok(cwd.join(p))
    }
}

fn user_home() -> Result<PathBuf> {
    #[cfg(target_os = "windows")]
    let base = dirs::config_dir();
    #[cfg(not(target_os = "windows"))]
    let base = dirs::home_dir();

    base.ok_or_else(|| anyhow!("Unable to determine the user home directory"))
}
