//! Core CLI commands for symdoc: docs, locate, modules, info.

use std::path::Path;

use serde::Serialize;

use crate::config::Config;
use crate::diagnostics;
use crate::engine::Engine;
use crate::error::Error;
use crate::oracle::ts::TsOracle;
use crate::render;
use crate::scanner;
use crate::types::Docs;

/// One row of the module listing.
#[derive(Debug, Serialize)]
struct ModuleRow {
    /// Code of the failure when the module could not be summarized.
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'static str>,
    /// Number of exports.
    #[serde(rename = "exportCount", skip_serializing_if = "Option::is_none")]
    export_count: Option<usize>,
    /// Path relative to the root, `/` separated.
    path: String,
}

/// Resolve a reference and print its documentation.
///
/// # Errors
///
/// Returns the engine's failure.
pub fn docs(root: &Path, reference: &str, json: bool) -> Result<(), Error> {
    let engine = Engine::new(TsOracle, root)?;
    let docs = engine.resolve_docs(reference)?;
    print_docs(&docs, json);
    return Ok(());
}

/// Output the symdoc reference document.
pub fn info(root: &Path, json: bool) {
    return crate::info::run(root, json);
}

/// Resolve a reference's module to its file and print the location.
///
/// # Errors
///
/// Returns the engine's failure.
pub fn locate(root: &Path, reference: &str, json: bool) -> Result<(), Error> {
    let engine = Engine::new(TsOracle, root)?;
    let location = engine.resolve_location(reference)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&location).unwrap_or_default());
    } else {
        print!("{}", render::location(&location));
    }
    return Ok(());
}

/// List every source module under the root with its export count. Modules
/// that fail to parse are listed with their error code.
///
/// # Errors
///
/// Returns config or project-config failures.
pub fn modules(root: &Path, json: bool) -> Result<(), Error> {
    let engine = Engine::new(TsOracle, root)?;
    let config = Config::load(engine.root())?;

    let rows: Vec<ModuleRow> = scanner::scan(engine.root(), &config)
        .iter()
        .map(|relative| {
            let path = scanner::to_slash(relative);
            return match engine.resolve_docs(&format!("./{path}")) {
                Ok(Docs::File(info)) => ModuleRow {
                    error: None,
                    export_count: Some(info.export_count),
                    path,
                },
                Ok(Docs::Symbol(_)) => ModuleRow {
                    error: None,
                    export_count: None,
                    path,
                },
                Err(e) => {
                    tracing::warn!(module = path, error = %e, "module could not be summarized");
                    ModuleRow {
                        error: Some(e.code().as_str()),
                        export_count: None,
                        path,
                    }
                },
            };
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows).unwrap_or_default());
        return Ok(());
    }
    for row in &rows {
        match (row.export_count, row.error) {
            (Some(count), _) => println!("{}  ({count} exports)", row.path),
            (None, Some(code)) => println!("{}  ({code})", row.path),
            (None, None) => println!("{}", row.path),
        }
    }
    eprintln!("{} modules", rows.len());
    return Ok(());
}

/// Print a documentation result as markdown or pretty JSON.
pub fn print_docs(docs: &Docs, json: bool) {
    if json {
        // Serializing plain data records cannot fail.
        println!("{}", serde_json::to_string_pretty(docs).unwrap_or_default());
    } else {
        print!("{}", render::docs(docs));
    }
    return;
}

/// Print a failure: the JSON envelope on stdout, or a markdown diagnostic on stderr.
pub fn report_error(e: &Error, json: bool) {
    if json {
        println!("{}", serde_json::to_string_pretty(&e.to_envelope()).unwrap_or_default());
    } else {
        diagnostics::print_error(e);
    }
    return;
}
