//! Human-readable markdown for successful results.

use std::fmt::Write as _;

use crate::types::{Docs, FileInfo, ModuleLocation, SymbolInfo};

/// Render a documentation result.
pub fn docs(docs: &Docs) -> String {
    return match docs {
        Docs::File(info) => file(info),
        Docs::Symbol(info) => symbol(info),
    };
}

/// Render a file overview: heading, overview text, one bullet per export.
pub fn file(info: &FileInfo) -> String {
    let mut out = format!("# {}\n", info.path);
    if let Some(overview) = &info.overview {
        let _ = write!(out, "\n{overview}\n");
    }

    let _ = write!(out, "\n## Exports ({})\n\n", info.export_count);
    if info.exports.is_empty() {
        out.push_str("(none)\n");
    }
    for export in &info.exports {
        let _ = write!(out, "- `{}` ({}, line {})", export.name, export.kind, export.line);
        if let Some(doc) = &export.documentation {
            let _ = write!(out, ": {doc}");
        }
        out.push('\n');
    }
    return out;
}

/// Render a resolved module location.
pub fn location(location: &ModuleLocation) -> String {
    return format!("{} ({})\n", location.path, location.format.as_str());
}

/// Render a symbol record.
pub fn symbol(info: &SymbolInfo) -> String {
    let mut out = format!("# {} ({})\n", info.name, info.kind);
    if let Some(signature) = &info.signature {
        let _ = write!(out, "\n    {signature}\n");
    }
    if let Some(documentation) = &info.documentation {
        let _ = write!(out, "\n{documentation}\n");
    }
    if let Some(tags) = &info.js_doc {
        out.push_str("\n## JSDoc\n\n");
        for tag in tags.lines() {
            let _ = writeln!(out, "    {tag}");
        }
    }
    let _ = write!(out, "\nType:     `{}`\nLocation: {}\n", info.type_text, info.location);
    return out;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ExportSummary, SymbolKind};

    #[test]
    fn symbol_sections_are_optional() {
        let info = SymbolInfo {
            documentation: None,
            js_doc: None,
            kind: SymbolKind::Variable,
            location: "a.ts:1:7".to_string(),
            name: "LIMIT".to_string(),
            signature: None,
            type_text: "number".to_string(),
        };
        let md = symbol(&info);
        assert!(md.starts_with("# LIMIT (variable)\n"));
        assert!(!md.contains("## JSDoc"));
        assert!(md.contains("Location: a.ts:1:7"));
    }

    #[test]
    fn file_lists_exports_with_first_doc_line() {
        let info = FileInfo {
            export_count: 1,
            exports: vec![ExportSummary {
                documentation: Some("Adds.".to_string()),
                kind: SymbolKind::Function,
                line: 3,
                name: "add".to_string(),
            }],
            overview: Some("Math helpers.".to_string()),
            path: "math.ts".to_string(),
        };
        let md = file(&info);
        assert!(md.contains("Math helpers."));
        assert!(md.contains("- `add` (function, line 3): Adds."));
    }
}
