use std::path::Path;
use std::process::Command;

use symdoc::cache::ResolutionCache;
use symdoc::engine::Engine;
use symdoc::error::ErrorCode;
use symdoc::oracle::ts::TsOracle;
use symdoc::types::{Docs, FileInfo, ModuleFormat, SymbolInfo, SymbolKind};

const BASIC: &str = "tests/fixtures/basic";

fn symdoc_cmd(fixture: &str) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_symdoc"));
    cmd.current_dir(Path::new("tests/fixtures").join(fixture));
    return cmd;
}

fn symbol(reference: &str) -> SymbolInfo {
    match symdoc::resolve_docs(Path::new(BASIC), reference) {
        Ok(Docs::Symbol(info)) => return info,
        other => panic!("{reference}: expected symbol docs, got {other:?}"),
    }
}

fn file(reference: &str) -> FileInfo {
    match symdoc::resolve_docs(Path::new(BASIC), reference) {
        Ok(Docs::File(info)) => return info,
        other => panic!("{reference}: expected file docs, got {other:?}"),
    }
}

fn error_code(reference: &str) -> ErrorCode {
    return symdoc::resolve_docs(Path::new(BASIC), reference).unwrap_err().code();
}

// ── Library API ───────────────────────────────────────────────────────

#[test]
fn commonjs_function_with_jsdoc_types() {
    let info = symbol("sample.js:greetUser");
    assert_eq!(info.name, "greetUser");
    assert_eq!(info.kind, SymbolKind::Function);
    assert_eq!(info.signature.as_deref(), Some("greetUser(name: string): string"));
    assert_eq!(info.documentation.as_deref(), Some("Greets a user by name."));
    let js_doc = info.js_doc.unwrap();
    assert!(js_doc.contains("@param name The user's name."), "{js_doc}");
    assert!(js_doc.contains("@returns The greeting."), "{js_doc}");
    assert!(info.location.starts_with("sample.js:10:"), "{}", info.location);
}

#[test]
fn static_member_of_commonjs_class() {
    let info = symbol("sample.js:TestClass.create");
    assert_eq!(info.name, "TestClass.create");
    assert_eq!(info.kind, SymbolKind::Method);
    assert_eq!(info.signature.as_deref(), Some("create(value: number): TestClass"));
    assert_eq!(info.documentation.as_deref(), Some("Creates a TestClass."));
}

#[test]
fn instance_member_of_commonjs_class() {
    let info = symbol("sample.js:TestClass#getValue");
    assert_eq!(info.name, "TestClass#getValue");
    assert_eq!(info.kind, SymbolKind::Method);
}

#[test]
fn global_math_max() {
    let info = symbol("node:Math.max");
    assert_eq!(info.name, "Math.max");
    assert_eq!(info.kind, SymbolKind::Method);
    let signature = info.signature.unwrap();
    assert!(signature.contains("...values: number[]"), "{signature}");
}

#[test]
fn bare_global() {
    let info = symbol("node:JSON");
    assert_eq!(info.name, "JSON");
    assert_eq!(info.kind, SymbolKind::Variable);
    assert_eq!(error_code("node:process"), ErrorCode::ModuleNotFound);
}

#[test]
fn missing_module() {
    let err = symdoc::resolve_docs(Path::new(BASIC), "./missing.ts:Foo").unwrap_err();
    assert_eq!(err.code(), ErrorCode::ModuleNotFound);
    assert_eq!(err.to_string(), "Cannot find module './missing.ts'");
}

#[test]
fn missing_member_lists_members() {
    let reference = "./types.ts:SomeInterface#missingMember";
    let err = symdoc::resolve_docs(Path::new(BASIC), reference).unwrap_err();
    assert_eq!(err.code(), ErrorCode::MemberNotFound);
    let message = err.to_string();
    for member in ["name", "retries", "describe"] {
        assert!(message.contains(member), "{message}");
    }
}

#[test]
fn missing_symbol_lists_every_export() {
    let err = symdoc::resolve_docs(Path::new(BASIC), "sample.js:greet").unwrap_err();
    assert_eq!(err.code(), ErrorCode::SymbolNotFound);
    assert_eq!(
        err.to_string(),
        "Symbol 'greet' not found in module 'sample.js'. Available exports: greetUser, TestClass"
    );
    let details = err.details().unwrap();
    assert_eq!(details["available"], serde_json::json!(["greetUser", "TestClass"]));
}

#[test]
fn static_access_on_interface_is_type_error() {
    assert_eq!(error_code("./types.ts:SomeInterface.name"), ErrorCode::TypeError);
}

#[test]
fn malformed_references() {
    for raw in ["", "sample.js:", "sample.js:TestClass#", ":greetUser", "node:"] {
        assert_eq!(error_code(raw), ErrorCode::InvalidRequest, "{raw:?}");
    }
}

#[test]
fn interface_type_renders_inline() {
    let info = symbol("./types.ts:SomeInterface");
    assert_eq!(info.kind, SymbolKind::Interface);
    assert_eq!(info.type_text, "{ name: string; retries?: number; describe: () => string }");
    let member = symbol("./types.ts:SomeInterface#retries");
    assert_eq!(member.kind, SymbolKind::Property);
    assert_eq!(member.documentation.as_deref(), Some("Optional retry count."));
}

#[test]
fn file_overview_sorted_by_line() {
    let info = file("./types.ts");
    assert_eq!(info.path, "types.ts");
    assert_eq!(
        info.overview.as_deref(),
        Some("Shared type declarations.\nUsed by the sample API.")
    );
    assert_eq!(info.export_count, 4);
    assert!(info.exports.windows(2).all(|w| w[0].line <= w[1].line));
    let first = &info.exports[0];
    assert_eq!(first.name, "SomeInterface");
    assert_eq!(first.documentation.as_deref(), Some("Configuration accepted by the sample API."));
}

#[test]
fn commonjs_file_overview() {
    let info = file("sample.js");
    let names: Vec<(&str, SymbolKind)> =
        info.exports.iter().map(|e| return (e.name.as_str(), e.kind)).collect();
    assert_eq!(names, [("greetUser", SymbolKind::Function), ("TestClass", SymbolKind::Class)]);
}

#[test]
fn tsconfig_paths_and_directory_index() {
    let aliased = symbol("@lib/format:formatName");
    assert_eq!(
        aliased.signature.as_deref(),
        Some("formatName(name: string, upper?: boolean): string")
    );
    assert_eq!(aliased.location, "lib/format.ts:5:8");

    let reexported = symbol("./lib:formatName");
    assert_eq!(reexported.location, aliased.location);
}

#[test]
fn resolution_is_idempotent() {
    for reference in ["sample.js:greetUser", "./types.ts", "node:Math.max", "./missing.ts:Foo"] {
        let first = symdoc::resolve_docs(Path::new(BASIC), reference);
        let second = symdoc::resolve_docs(Path::new(BASIC), reference);
        match (first, second) {
            (Ok(a), Ok(b)) => assert_eq!(a, b, "{reference}"),
            (Err(a), Err(b)) => assert_eq!(a.to_string(), b.to_string(), "{reference}"),
            _ => panic!("{reference}: outcomes differ"),
        }
    }
}

#[test]
fn location_and_format() {
    let js = symdoc::resolve_location(Path::new(BASIC), "sample.js:greetUser").unwrap();
    assert_eq!(js.format, ModuleFormat::CommonJs);
    assert!(js.path.ends_with("sample.js"));

    let ts = symdoc::resolve_location(Path::new(BASIC), "@lib/format").unwrap();
    assert_eq!(ts.format, ModuleFormat::TypeScript);

    let err = symdoc::resolve_location(Path::new(BASIC), "node:Math.max").unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[test]
fn cache_invalidates_on_content_change() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("dep.ts"), "export const first = 1;\n").unwrap();
    let engine = Engine::new(TsOracle, dir.path()).unwrap();
    let mut cache = ResolutionCache::default();

    assert!(engine.resolve_docs_cached("./dep:first", &mut cache).is_ok());
    assert_eq!(cache.len(), 1);

    std::fs::write(dir.path().join("dep.ts"), "export const second = 2;\n").unwrap();
    let err = engine.resolve_docs_cached("./dep:first", &mut cache).unwrap_err();
    assert_eq!(err.code(), ErrorCode::SymbolNotFound);
    assert!(engine.resolve_docs_cached("./dep:second", &mut cache).is_ok());

    std::fs::remove_file(dir.path().join("dep.ts")).unwrap();
    let err = engine.resolve_docs_cached("./dep:second", &mut cache).unwrap_err();
    assert_eq!(err.code(), ErrorCode::ModuleNotFound);
    assert!(cache.is_empty());
}

// ── Binary ────────────────────────────────────────────────────────────

#[test]
fn cli_docs_json() {
    let output =
        symdoc_cmd("basic").args(["docs", "sample.js:greetUser", "--json"]).output().unwrap();
    assert!(output.status.success(), "docs failed: {}", String::from_utf8_lossy(&output.stderr));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["name"], "greetUser");
    assert_eq!(json["kind"], "function");
    assert_eq!(json["type"], "(name: string) => string");
    assert!(json.get("jsDoc").is_some());
}

#[test]
fn cli_error_envelope_and_exit_code() {
    let output = symdoc_cmd("basic").args(["docs", "./missing.ts:Foo", "--json"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["error"]["code"], "MODULE_NOT_FOUND");
    assert_eq!(json["error"]["message"], "Cannot find module './missing.ts'");
}

#[test]
fn cli_markdown_diagnostic() {
    let output = symdoc_cmd("basic").args(["docs", "sample.js:greet"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error: Symbol Not Found"), "{stderr}");
    assert!(stderr.contains("- `greetUser`"), "{stderr}");
}

#[test]
fn cli_modules_listing() {
    let output = symdoc_cmd("basic").args(["modules", "--json"]).output().unwrap();
    assert!(output.status.success(), "modules failed: {}", String::from_utf8_lossy(&output.stderr));
    let rows: Vec<serde_json::Value> = serde_json::from_slice(&output.stdout).unwrap();
    let paths: Vec<&str> = rows.iter().map(|r| r["path"].as_str().unwrap()).collect();
    assert_eq!(paths, ["lib/format.ts", "lib/index.ts", "sample.js", "types.ts"]);
    assert_eq!(rows[3]["exportCount"], 4);
}

#[test]
fn cli_locate_and_info() {
    let output = symdoc_cmd("basic").args(["locate", "@lib/format"]).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.trim_end().ends_with("format.ts (typescript)"), "{stdout}");

    let info = symdoc_cmd("basic").args(["info", "--json"]).output().unwrap();
    let json: serde_json::Value = serde_json::from_slice(&info.stdout).unwrap();
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(json["current_state"]["module_count"], 4);
}
