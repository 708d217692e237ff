//! File-level overview: the `@fileoverview` text plus a summary of every export.

use std::path::Path;

use regex::Regex;

use crate::commonjs;
use crate::oracle::{Checker, DeclarationKind, UnitId};
use crate::projector::{classify, display_path};
use crate::types::{ExportSummary, FileInfo};

/// Summarize a unit. Exports are sorted by declaration line, ties keeping
/// export-table order.
pub fn extract<C: Checker>(checker: &C, unit: UnitId, root: &Path) -> FileInfo {
    let overview = file_overview(checker.leading_comments(unit));

    let mut exports: Vec<ExportSummary> = checker
        .exports_of_module(unit)
        .unwrap_or_default()
        .into_iter()
        .map(|entry| {
            let is_commonjs = checker
                .declarations(entry.symbol)
                .iter()
                .any(|d| return d.kind == DeclarationKind::CommonJsExport);
            let symbol = if is_commonjs {
                commonjs::recover(checker, unit, &entry.name).unwrap_or(entry.symbol)
            } else {
                entry.symbol
            };
            let declarations = checker.declarations(symbol);
            let documentation = checker
                .documentation_comment(symbol)
                .and_then(|doc| return doc.lines().next().map(|l| return l.trim().to_string()))
                .filter(|line| return !line.is_empty());
            return ExportSummary {
                documentation,
                kind: classify(&declarations),
                line: declarations.first().map_or(0, |d| return d.position.line.saturating_add(1)),
                name: entry.name,
            };
        })
        .collect();
    exports.sort_by_key(|e| return e.line);

    let path = display_path(checker.unit_path(unit), root);
    tracing::debug!(path, exports = exports.len(), "extracted file overview");
    return FileInfo {
        export_count: exports.len(),
        exports,
        overview,
        path,
    };
}

/// First `@fileoverview` / `@file` text among the leading comments.
fn file_overview(comments: &[String]) -> Option<String> {
    let tag = Regex::new(r"@(?:fileoverview|file)\b").ok()?;
    return comments.iter().find_map(|comment| return overview_text(&tag, comment));
}

/// Text after the tag up to the next tag or the end of the comment, with the
/// comment gutter stripped from every line.
fn overview_text(tag: &Regex, comment: &str) -> Option<String> {
    let found = tag.find(comment)?;
    let rest = comment.get(found.end()..)?;
    let rest = rest.trim_end();
    let rest = rest.strip_suffix("*/").unwrap_or(rest);

    let mut lines: Vec<&str> = Vec::new();
    for line in rest.lines() {
        let cleaned = line.trim_start().trim_start_matches("//").trim_start_matches('*').trim();
        if cleaned.starts_with('@') {
            break;
        }
        lines.push(cleaned);
    }

    let text = lines.join("\n");
    let text = text.trim();
    return (!text.is_empty()).then(|| return text.to_string());
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::oracle::ts::{TsContext, TsOracle};
    use crate::oracle::{CompilerOptions, Oracle, SourceInput};
    use crate::types::SymbolKind;

    fn context(path: &str, text: &str) -> TsContext {
        let input = SourceInput::Virtual {
            path: PathBuf::from(path),
            text: text.to_string(),
        };
        return TsOracle.create_checking_context(&[input], &CompilerOptions::default()).unwrap();
    }

    #[test]
    fn overview_stops_at_next_tag() {
        let comments = vec![
            "// license".to_string(),
            "/**\n * @fileoverview Shared types.\n * Second line.\n * @author someone\n */"
                .to_string(),
        ];
        assert_eq!(file_overview(&comments).as_deref(), Some("Shared types.\nSecond line."));
    }

    #[test]
    fn file_tag_and_empty_tags() {
        let comments = vec!["/** @file */".to_string(), "/** @file Helpers. */".to_string()];
        assert_eq!(file_overview(&comments).as_deref(), Some("Helpers."));
        assert!(file_overview(&["/** @filename x */".to_string()]).is_none());
    }

    #[test]
    fn exports_sorted_by_line() {
        let source = "\
/** @fileoverview Sorting. */\n\
export { b as later };\n\
/** First.\n * More. */\n\
export function a() {}\n\
function b() {}\n";
        let ctx = context("/project/sort.ts", source);
        let info = extract(&ctx, ctx.root_units()[0], Path::new("/project"));
        assert_eq!(info.path, "sort.ts");
        assert_eq!(info.overview.as_deref(), Some("Sorting."));
        let names: Vec<&str> = info.exports.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["a", "later"]);
        assert_eq!(info.exports[0].documentation.as_deref(), Some("First."));
        assert!(info.exports.windows(2).all(|w| w[0].line <= w[1].line));
        assert_eq!(info.export_count, 2);
    }

    #[test]
    fn commonjs_exports_report_original_declarations() {
        let source = "class Box {}\nfunction make() {}\nmodule.exports = { make, Box };\n";
        let ctx = context("/project/lib.js", source);
        let info = extract(&ctx, ctx.root_units()[0], Path::new("/project"));
        let kinds: Vec<(&str, SymbolKind, u32)> =
            info.exports.iter().map(|e| (e.name.as_str(), e.kind, e.line)).collect();
        assert_eq!(kinds, [("Box", SymbolKind::Class, 1), ("make", SymbolKind::Function, 2)]);
    }

    #[test]
    fn script_has_no_exports() {
        let ctx = context("/project/script.js", "function local() {}\n");
        let info = extract(&ctx, ctx.root_units()[0], Path::new("/project"));
        assert!(info.exports.is_empty());
        assert_eq!(info.export_count, 0);
    }
}
