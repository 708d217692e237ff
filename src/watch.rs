//! File watcher: resolves a reference on startup, then re-resolves on source changes.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use notify::{RecursiveMode, Watcher as _};

use crate::cache::ResolutionCache;
use crate::commands;
use crate::config::CONFIG_FILE;
use crate::engine::Engine;
use crate::error;
use crate::grammar;
use crate::oracle::Oracle;
use crate::oracle::ts::TsOracle;

/// Debounce delay between filesystem events and re-resolution.
const DEBOUNCE_MS: u64 = 100;

/// Non-source files whose changes affect resolution.
const PROJECT_FILES: [&str; 4] = [CONFIG_FILE, "jsconfig.json", "package.json", "tsconfig.json"];

/// Create a filesystem watcher that sends an event for every relevant change,
/// `true` when a project file is among the changed paths.
///
/// # Errors
///
/// Returns an error if the watcher cannot be created.
fn create_watcher(
    tx: crossbeam_channel::Sender<bool>,
) -> Result<notify::RecommendedWatcher, error::Error> {
    return notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
        if let Ok(event) = res
            && matches!(
                event.kind,
                notify::EventKind::Create(_)
                    | notify::EventKind::Modify(_)
                    | notify::EventKind::Remove(_)
            )
            && event.paths.iter().any(|p| return is_relevant(p))
        {
            let _ = tx.send(event.paths.iter().any(|p| return is_project_file(p)));
        }
    })
    .map_err(|e| {
        return error::Error::WatchFailed {
            reason: format!("watcher setup failed: {e}"),
        };
    });
}

/// Config files that change compiler options or the module format.
fn is_project_file(path: &Path) -> bool {
    return path.file_name().is_some_and(|n| {
        let name = n.to_string_lossy();
        return PROJECT_FILES.contains(&&*name);
    });
}

/// Source modules and project files outside dependency and hidden directories.
fn is_relevant(path: &Path) -> bool {
    let hidden = path.components().any(|c| {
        let name = c.as_os_str().to_string_lossy();
        return name == "node_modules" || (name.starts_with('.') && name != "." && name != "..");
    });
    if hidden && !path.ends_with(CONFIG_FILE) {
        return false;
    }
    return grammar::is_source_path(path) || is_project_file(path);
}

/// Resolve once and print the result. Returns the exit code for that run.
fn resolve_once<O: Oracle>(
    engine: &Engine<O>,
    reference: &str,
    json: bool,
    cache: &mut ResolutionCache,
) -> ExitCode {
    return match engine.resolve_docs_cached(reference, cache) {
        Ok(docs) => {
            commands::print_docs(&docs, json);
            ExitCode::SUCCESS
        },
        Err(e) => {
            commands::report_error(&e, json);
            ExitCode::FAILURE
        },
    };
}

/// Entry point for the watch command.
///
/// Resolves the reference, then watches the project root and re-resolves on
/// changes. One resolution cache lives for the whole session; it is emptied
/// when a project file changes, and the engine reads the new options on the
/// next resolution.
///
/// # Errors
///
/// Returns errors from engine construction or watcher setup.
pub fn run(root: &Path, reference: &str, json: bool) -> Result<ExitCode, error::Error> {
    let engine = Engine::new(TsOracle, root)?;
    let mut cache = ResolutionCache::default();

    eprintln!("watch: initial resolve");
    let mut last_code = resolve_once(&engine, reference, json, &mut cache);

    let (tx, rx) = crossbeam_channel::unbounded();
    let mut watcher = create_watcher(tx)?;
    let watch_root: PathBuf = engine.root().to_path_buf();
    watcher.watch(&watch_root, RecursiveMode::Recursive).map_err(|e| {
        return error::Error::WatchFailed {
            reason: format!("cannot watch {}: {e}", watch_root.display()),
        };
    })?;

    eprintln!("watch: monitoring {}, press Ctrl+C to stop", watch_root.display());

    while let Ok(first) = rx.recv() {
        let debounce = Duration::from_millis(DEBOUNCE_MS);
        let mut project_changed = first;
        while let Ok(next) = rx.recv_timeout(debounce) {
            project_changed |= next;
        }
        if project_changed {
            tracing::info!("project file changed, dropping cached resolutions");
            cache.clear();
        }
        eprintln!("watch: change detected, re-resolving...");
        tracing::debug!(cached = cache.len(), "re-resolving");
        last_code = resolve_once(&engine, reference, json, &mut cache);
    }

    return Ok(last_code);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relevance_filter() {
        assert!(is_relevant(Path::new("/p/src/a.ts")));
        assert!(is_relevant(Path::new("/p/tsconfig.json")));
        assert!(is_relevant(Path::new("/p/.symdoc.toml")));
        assert!(!is_relevant(Path::new("/p/node_modules/x/index.js")));
        assert!(!is_relevant(Path::new("/p/.git/index")));
        assert!(!is_relevant(Path::new("/p/README.md")));
    }

    #[test]
    fn project_files_are_told_apart() {
        assert!(is_project_file(Path::new("/p/tsconfig.json")));
        assert!(is_project_file(Path::new("/p/.symdoc.toml")));
        assert!(!is_project_file(Path::new("/p/src/a.ts")));
    }
}
