//! Result projection: a located symbol becomes a [`SymbolInfo`].

use std::path::Path;

use crate::oracle::{Checker, Declaration, DeclarationKind, SymbolId, ValueShape};
use crate::scanner;
use crate::types::{SymbolInfo, SymbolKind};

/// Declaration kind → reported kind, checked in order. First match wins.
const KIND_TABLE: [(DeclarationKind, SymbolKind); 10] = [
    (DeclarationKind::Function, SymbolKind::Function),
    (DeclarationKind::Class, SymbolKind::Class),
    (DeclarationKind::Enum, SymbolKind::Enum),
    (DeclarationKind::EnumMember, SymbolKind::EnumMember),
    (DeclarationKind::Method, SymbolKind::Method),
    (DeclarationKind::Property, SymbolKind::Property),
    (DeclarationKind::Variable, SymbolKind::Variable),
    (DeclarationKind::Interface, SymbolKind::Interface),
    (DeclarationKind::TypeAlias, SymbolKind::Type),
    (DeclarationKind::Module, SymbolKind::Module),
];

/// Longest declaration line shown as a signature.
const PREVIEW_LIMIT: usize = 120;

/// Project a symbol into its documentation record. `name` is the display name
/// (`Base`, `Base.member`, or `Base#member`); `root` makes the location relative.
/// Call signatures are labelled with the last segment of `name`, so an
/// export alias shows the name it was requested by.
pub fn project<C: Checker>(checker: &C, symbol: SymbolId, name: &str, root: &Path) -> SymbolInfo {
    let declarations = checker.declarations(symbol);
    let kind = classify(&declarations);
    let documentation =
        checker.documentation_comment(symbol).filter(|d| return !d.trim().is_empty());
    let tags: Vec<String> = checker
        .jsdoc_tags(symbol)
        .iter()
        .map(|tag| return format!("@{} {}", tag.name, tag.text).trim_end().to_string())
        .collect();
    let location = declarations.first().map_or_else(String::new, |d| {
        return format!(
            "{}:{}:{}",
            display_path(&d.file, root),
            d.position.line.saturating_add(1),
            d.position.column.saturating_add(1)
        );
    });

    tracing::debug!(name, kind = %kind, "projected symbol");
    return SymbolInfo {
        documentation,
        js_doc: (!tags.is_empty()).then(|| return tags.join("\n")),
        kind,
        location,
        name: name.to_string(),
        signature: signature(checker, symbol, label(name), kind, &declarations),
        type_text: type_text(checker, symbol, kind, &declarations),
    };
}

/// Classify a symbol by its declarations: the ordered table first, then the
/// value shapes of CommonJS and object-property declarations. Those bound to
/// plain data are properties of the exports object.
pub fn classify(declarations: &[Declaration]) -> SymbolKind {
    for (declared, reported) in KIND_TABLE {
        if declarations.iter().any(|d| return d.kind == declared) {
            return reported;
        }
    }

    let raw: Vec<&Declaration> = declarations
        .iter()
        .filter(|d| {
            return matches!(
                d.kind,
                DeclarationKind::CommonJsExport | DeclarationKind::ObjectProperty
            );
        })
        .collect();
    for declaration in &raw {
        match declaration.value {
            ValueShape::Class => return SymbolKind::Class,
            ValueShape::Function => return SymbolKind::Function,
            ValueShape::Method => return SymbolKind::Method,
            ValueShape::None | ValueShape::Object | ValueShape::Other => {},
        }
    }
    if raw.iter().any(|d| return matches!(d.value, ValueShape::Object | ValueShape::Other)) {
        return SymbolKind::Property;
    }
    return SymbolKind::Unknown;
}

/// `path` relative to `root` with `/` separators, or absolute when outside it.
pub fn display_path(path: &Path, root: &Path) -> String {
    return path
        .strip_prefix(root)
        .map_or_else(|_| return path.display().to_string(), scanner::to_slash);
}

/// Collapse all whitespace runs to single spaces.
fn compact(text: &str) -> String {
    return text.split_whitespace().collect::<Vec<_>>().join(" ");
}

/// First line of the declaration, capped.
fn first_line_preview(text: &str) -> String {
    let line = text.lines().next().unwrap_or("").trim_end();
    if line.chars().count() <= PREVIEW_LIMIT {
        return line.to_string();
    }
    let cut: String = line.chars().take(PREVIEW_LIMIT).collect();
    return format!("{cut}...");
}

/// `{ a: T; b?: U }` over the own properties of a declared type.
fn inline_members<C: Checker>(checker: &C, symbol: SymbolId) -> Option<String> {
    let declared = checker.declared_type_of_symbol(symbol)?;
    let members: Vec<String> = checker
        .properties_of_type(declared)
        .into_iter()
        .map(|member| {
            let optional = checker.declarations(member).iter().any(|d| return d.optional);
            let rendered = checker.type_to_string(checker.type_of_symbol(member));
            let mark = if optional { "?" } else { "" };
            return format!("{}{mark}: {rendered}", checker.symbol_name(member));
        })
        .collect();
    if members.is_empty() {
        return Some("{}".to_string());
    }
    return Some(format!("{{ {} }}", members.join("; ")));
}

/// Last segment of a display name: `Base#member` → `member`.
fn label(name: &str) -> &str {
    return name.rsplit(['.', '#']).next().unwrap_or(name);
}

/// Type alias whose aliased type is an object type literal.
fn is_object_alias(declarations: &[Declaration]) -> bool {
    return declarations.iter().any(|d| {
        return d.kind == DeclarationKind::TypeAlias
            && d.text
                .split_once('=')
                .is_some_and(|(_, aliased)| return aliased.trim_start().starts_with('{'));
    });
}

/// Signature line: call, construct, declaration body, class preview, or the
/// first line of the declaration.
fn signature<C: Checker>(
    checker: &C,
    symbol: SymbolId,
    label: &str,
    kind: SymbolKind,
    declarations: &[Declaration],
) -> Option<String> {
    let value_type = checker.type_of_symbol(symbol);
    if !matches!(kind, SymbolKind::Interface | SymbolKind::Type) {
        if let Some(call) = checker.call_signatures(value_type).first() {
            return Some(format!("{label}{}", checker.signature_to_string(*call)));
        }
        if let Some(construct) = checker.construct_signatures(value_type).first() {
            return Some(format!("new {}", checker.signature_to_string(*construct)));
        }
    }

    let first = declarations.first()?;
    return match kind {
        SymbolKind::Interface | SymbolKind::Type => Some(compact(&first.text)),
        _ => Some(first_line_preview(&first.text)).filter(|line| return !line.is_empty()),
    };
}

/// Rendered type: inline members for interfaces and object aliases, the
/// declared type for other type-only symbols, else the value type.
fn type_text<C: Checker>(
    checker: &C,
    symbol: SymbolId,
    kind: SymbolKind,
    declarations: &[Declaration],
) -> String {
    let inline = kind == SymbolKind::Interface
        || (kind == SymbolKind::Type && is_object_alias(declarations));
    if inline && let Some(rendered) = inline_members(checker, symbol) {
        return rendered;
    }
    if matches!(kind, SymbolKind::Interface | SymbolKind::Type)
        && let Some(declared) = checker.declared_type_of_symbol(symbol)
    {
        return checker.type_to_string(declared);
    }
    return checker.type_to_string(checker.type_of_symbol(symbol));
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::oracle::ts::{TsContext, TsOracle};
    use crate::oracle::{CompilerOptions, Oracle, SourceInput};

    const SOURCE: &str = "\
/**\n * Greets a user.\n * @param name Who to greet.\n * @returns The greeting.\n */\n\
export function greet(name: string): string { return `hi ${name}`; }\n\
export interface Options {\n  verbose?: boolean;\n  level: number;\n}\n\
export type Pair = { left: string; right: string };\n\
export type Id = string;\n\
export class Widget {\n  constructor(label: string) {}\n}\n\
export const LIMIT = 10;\n\
export { greet as salute };\n";

    fn context() -> TsContext {
        let input = SourceInput::Virtual {
            path: PathBuf::from("/project/src/lib.ts"),
            text: SOURCE.to_string(),
        };
        return TsOracle.create_checking_context(&[input], &CompilerOptions::default()).unwrap();
    }

    fn info(name: &str) -> SymbolInfo {
        let ctx = context();
        let unit = ctx.root_units()[0];
        let exports = ctx.exports_of_module(unit).unwrap();
        let symbol = exports.into_iter().find(|e| return e.name == name).unwrap().symbol;
        return project(&ctx, symbol, name, Path::new("/project"));
    }

    #[test]
    fn function_projection() {
        let greet = info("greet");
        assert_eq!(greet.kind, SymbolKind::Function);
        assert_eq!(greet.signature.as_deref(), Some("greet(name: string): string"));
        assert_eq!(greet.documentation.as_deref(), Some("Greets a user."));
        assert_eq!(
            greet.js_doc.as_deref(),
            Some("@param name Who to greet.\n@returns The greeting.")
        );
        assert_eq!(greet.location, "src/lib.ts:6:8");
    }

    #[test]
    fn alias_signature_uses_requested_name() {
        let salute = info("salute");
        assert_eq!(salute.name, "salute");
        assert_eq!(salute.signature.as_deref(), Some("salute(name: string): string"));
        assert_eq!(salute.location, info("greet").location);
    }

    #[test]
    fn label_is_last_display_segment() {
        assert_eq!(label("Counter.create"), "create");
        assert_eq!(label("Counter#increment"), "increment");
        assert_eq!(label("greet"), "greet");
    }

    #[test]
    fn commonjs_data_exports_are_properties() {
        let kind_of = |text: &str, name: &str| {
            let input = SourceInput::Virtual {
                path: PathBuf::from("/project/data.js"),
                text: text.to_string(),
            };
            let ctx =
                TsOracle.create_checking_context(&[input], &CompilerOptions::default()).unwrap();
            let unit = ctx.root_units()[0];
            let exports = ctx.exports_of_module(unit).unwrap();
            let symbol = exports.into_iter().find(|e| return e.name == name).unwrap().symbol;
            return project(&ctx, symbol, name, Path::new("/project")).kind;
        };
        let named = "exports.y = 1;\nexports.run = function () {};\n";
        assert_eq!(kind_of(named, "y"), SymbolKind::Property);
        assert_eq!(kind_of(named, "run"), SymbolKind::Function);
        let whole = "module.exports = { answer: 42 };\n";
        assert_eq!(kind_of(whole, "answer"), SymbolKind::Property);
    }

    #[test]
    fn interface_renders_inline_members() {
        let options = info("Options");
        assert_eq!(options.kind, SymbolKind::Interface);
        assert_eq!(options.type_text, "{ verbose?: boolean; level: number }");
        assert_eq!(
            options.signature.as_deref(),
            Some("interface Options { verbose?: boolean; level: number; }")
        );
    }

    #[test]
    fn aliases_inline_only_object_types() {
        assert_eq!(info("Pair").type_text, "{ left: string; right: string }");
        let id = info("Id");
        assert_eq!(id.kind, SymbolKind::Type);
        assert_ne!(id.type_text, "{}");
    }

    #[test]
    fn class_uses_constructor_signature() {
        let widget = info("Widget");
        assert_eq!(widget.kind, SymbolKind::Class);
        assert!(widget.signature.unwrap().starts_with("new (label: string)"));
    }

    #[test]
    fn variable_without_documentation() {
        let limit = info("LIMIT");
        assert_eq!(limit.kind, SymbolKind::Variable);
        assert!(limit.documentation.is_none());
        assert!(limit.js_doc.is_none());
    }

    #[test]
    fn preview_is_capped() {
        let long = "x".repeat(200);
        let preview = first_line_preview(&format!("{long}\nsecond"));
        assert_eq!(preview.len(), PREVIEW_LIMIT + 3);
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn paths_outside_root_stay_absolute() {
        assert_eq!(display_path(Path::new("/a/b/c.ts"), Path::new("/a")), "b/c.ts");
        assert_eq!(display_path(Path::new("/x/c.ts"), Path::new("/a")), "/x/c.ts");
    }
}
