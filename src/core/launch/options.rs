use std::path::Path;

use tracing::debug;

use crate::core::error::{LauncherError, LauncherResult};

pub const OPTIONS_FILE: &str = "options.txt";
const LANGUAGE_PREFIX: &str = "lang:";

/// Writes the launcher language into the game's `options.txt`, replacing an
/// existing `lang:` line or appending one. The file is created if missing.
pub async fn sync_language(game_dir: &Path, language: &str) -> LauncherResult<()> {
    let path = game_dir.join(OPTIONS_FILE);
    let current = match tokio::fs::read_to_string(&path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(LauncherError::io(&path, e)),
    };

    let updated = with_language(&current, language);
    if updated == current {
        return Ok(());
    }

    tokio::fs::write(&path, updated)
        .await
        .map_err(|e| LauncherError::io(&path, e))?;
    debug!("Synced game language to {}", language.to_lowercase());
    Ok(())
}

fn with_language(contents: &str, language: &str) -> String {
    let entry = format!("{}{}", LANGUAGE_PREFIX, language.to_lowercase());
    let mut found = false;
    let mut lines: Vec<String> = contents
        .lines()
        .map(|line| {
            if line.starts_with(LANGUAGE_PREFIX) {
                found = true;
                entry.clone()
            } else {
                line.to_string()
            }
        })
        .collect();
    if !found {
        lines.push(entry);
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}
