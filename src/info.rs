use std::path::Path;

use serde::Serialize;

use crate::config::{CONFIG_FILE, Config};
use crate::error::ErrorCode;
use crate::grammar::SOURCE_EXTENSIONS;
use crate::module_locator::GLOBAL_NAMES;
use crate::oracle::project;
use crate::scanner;

/// Every error code with its meaning, in wire order.
const ERROR_CODES: [(ErrorCode, &str); 6] = [
    (ErrorCode::InvalidRequest, "The reference string is malformed"),
    (ErrorCode::MemberNotFound, "The symbol has no such static or instance member"),
    (ErrorCode::ModuleNotFound, "The module specifier resolved to nothing"),
    (ErrorCode::ParseError, "A source, config, or I/O failure"),
    (ErrorCode::SymbolNotFound, "The module does not export the symbol"),
    (ErrorCode::TypeError, "The symbol cannot be used the way the reference asks"),
];

/// Output the comprehensive symdoc reference document.
pub fn run(root: &Path, json: bool) {
    let state = gather_state(root);

    if json {
        print_json(&state);
    } else {
        print_markdown(&state);
    }
    return;
}

// ── State gathering ───────────────────────────────────────────────────

/// What the current directory looks like to symdoc.
struct CurrentState {
    /// `.symdoc.toml` present.
    config_found: bool,
    /// Load failure of `.symdoc.toml`, if any.
    config_error: Option<String>,
    /// Source modules the listing would show.
    module_count: usize,
    /// tsconfig/jsconfig in effect.
    project_config: Option<String>,
}

/// Inspect `root` the way the other commands would see it.
fn gather_state(root: &Path) -> CurrentState {
    let config_found = root.join(CONFIG_FILE).exists();
    let (config, config_error) = match Config::load(root) {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e.to_string())),
    };

    let project_config = config
        .tsconfig()
        .map(|p| return root.join(p))
        .or_else(|| return project::find_config_file(root))
        .map(|p| return p.display().to_string());
    let module_count = scanner::scan(root, &config).len();

    return CurrentState {
        config_found,
        config_error,
        module_count,
        project_config,
    };
}

// ── Markdown output ───────────────────────────────────────────────────

/// Full markdown reference.
fn print_markdown(state: &CurrentState) {
    let version = env!("CARGO_PKG_VERSION");
    print_markdown_header(version);
    print_markdown_state(state);
    println!();
    print_markdown_error_codes();
    return;
}

/// Static part of the reference: syntax, commands, sources, globals, config.
fn print_markdown_header(version: &str) {
    let extensions = SOURCE_EXTENSIONS.map(|e| return format!(".{e}")).join(" ");
    let globals = GLOBAL_NAMES.join(", ");
    print!(
        "\
# symdoc {version}

Resolve `module:Symbol#member` references in JavaScript and TypeScript projects
to structured documentation.

## Reference Syntax

    ./src/util.ts                     file overview (exports, @fileoverview)
    ./src/util.ts:parse               exported symbol
    lodash:debounce                   package export (node_modules, tsconfig paths)
    ./sample.js:TestClass.create      static member
    ./types.ts:Options#verbose        instance member
    node:Math.max                     runtime global

## Commands

    symdoc docs <ref> [--json]        Documentation for a symbol or file
    symdoc locate <ref> [--json]      Resolved file and module format
    symdoc modules [--json]           Every source module with its export count
    symdoc watch <ref> [--json]       Re-resolve on every change
    symdoc info [--json]              This document

## Sources

    {extensions}

## Runtime Globals

    {globals}

## Configuration ({CONFIG_FILE})

    tsconfig = \"tsconfig.build.json\"  # project config, otherwise discovered
    include = [\"src/\"]                # only list these paths
    exclude = [\"src/generated/\"]      # skip these paths

## Current State

"
    );
    return;
}

/// Config, project, and module count lines.
fn print_markdown_state(state: &CurrentState) {
    match (&state.config_error, state.config_found) {
        (Some(e), _) => println!("Config:   {CONFIG_FILE} (invalid: {e})"),
        (None, true) => println!("Config:   {CONFIG_FILE} (found)"),
        (None, false) => println!("Config:   {CONFIG_FILE} (not found)"),
    }

    match &state.project_config {
        Some(path) => println!("Project:  {path}"),
        None => println!("Project:  (no tsconfig.json or jsconfig.json, defaults)"),
    }

    println!("Modules:  {}", state.module_count);
    return;
}

/// Exit code and error code tables.
fn print_markdown_error_codes() {
    print!(
        "\
## Exit Codes

| Code | Meaning |
|------|---------|
| 0    | Success |
| 1    | Resolution or runtime error |

## Error Codes

| Code | Meaning |
|------|---------|
"
    );
    for (code, meaning) in ERROR_CODES {
        println!("| {} | {meaning} |", code.as_str());
    }
    return;
}

// ── JSON output ───────────────────────────────────────────────────────

/// One row of the error code table.
#[derive(Serialize)]
struct ErrorCodeInfo {
    /// Stable code.
    code: ErrorCode,
    /// What the code means.
    meaning: String,
}

/// The whole reference as JSON.
#[derive(Serialize)]
struct InfoJson {
    /// What the current directory looks like.
    current_state: StateJson,
    /// Every error code.
    error_codes: Vec<ErrorCodeInfo>,
    /// Source extensions, dotted.
    extensions: Vec<String>,
    /// Allow-listed runtime globals.
    globals: Vec<String>,
    /// Crate version.
    version: String,
}

/// Serialized [`CurrentState`].
#[derive(Serialize)]
struct StateJson {
    /// Load failure of the config file.
    config_error: Option<String>,
    /// Config file present.
    config_found: bool,
    /// Source modules found.
    module_count: usize,
    /// tsconfig/jsconfig in effect.
    project_config: Option<String>,
}

/// Full JSON reference.
fn print_json(state: &CurrentState) {
    let info = InfoJson {
        current_state: StateJson {
            config_error: state.config_error.clone(),
            config_found: state.config_found,
            module_count: state.module_count,
            project_config: state.project_config.clone(),
        },
        error_codes: ERROR_CODES
            .iter()
            .map(|(code, meaning)| {
                return ErrorCodeInfo {
                    code: *code,
                    meaning: (*meaning).to_string(),
                };
            })
            .collect(),
        extensions: SOURCE_EXTENSIONS.iter().map(|e| return format!(".{e}")).collect(),
        globals: GLOBAL_NAMES.iter().map(|g| return (*g).to_string()).collect(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    // serde_json::to_string_pretty won't fail on this structure.
    let json = serde_json::to_string_pretty(&info).unwrap_or_default();
    println!("{json}");
    return;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_reports_project_config_and_modules() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tsconfig.json"), "{}").unwrap();
        std::fs::write(dir.path().join("a.ts"), "export const a = 1;").unwrap();

        let state = gather_state(dir.path());
        assert!(!state.config_found);
        assert!(state.config_error.is_none());
        assert_eq!(state.module_count, 1);
        assert!(state.project_config.unwrap().ends_with("tsconfig.json"));
    }

    #[test]
    fn malformed_config_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "unknown_key = 1\n").unwrap();
        let state = gather_state(dir.path());
        assert!(state.config_found);
        assert!(state.config_error.is_some());
    }
}
