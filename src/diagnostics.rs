use std::fmt::Write as _;

use crate::error::Error;
use crate::reference::GLOBAL_PREFIX;

/// Bold on.
const BOLD: &str = "\x1b[1m";
/// Attributes off.
const RESET: &str = "\x1b[0m";

/// Render an error as valid markdown with bold headings and print to stderr.
pub fn print_error(e: &Error) {
    let md = render_error(e);
    for line in md.lines() {
        if line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
    return;
}

/// Render an error as a structured markdown diagnostic.
///
/// Each variant produces a block with what happened and, where there is one,
/// how to fix it. Readable by both humans and LLM agents.
pub fn render_error(e: &Error) -> String {
    return match e {
        Error::InvalidRequest { reason } => render_invalid_request(reason),
        Error::MemberNotFound { available, member, owner } => {
            render_member_not_found(owner, member, available)
        },
        Error::ModuleNotFound { specifier } => render_module_not_found(specifier),
        Error::SymbolNotFound { available, module, symbol } => {
            render_symbol_not_found(module, symbol, available)
        },
        Error::TypeMismatch { reason } => format!(
            "\
# Error: Type Error

{reason}

## Fix

Use `Symbol.member` for static members and `Symbol#member` for instance members.
"
        ),
        _ => render_generic(e),
    };
}

/// Closest candidate to a mistyped name: case-insensitive equality first, then
/// a shared prefix of at least three characters.
pub(crate) fn find_closest_suggestion(name: &str, candidates: &[String]) -> Option<String> {
    let lowered = name.to_lowercase();
    if let Some(exact) = candidates.iter().find(|c| return c.to_lowercase() == lowered) {
        return Some(exact.clone());
    }
    return candidates
        .iter()
        .map(|c| return (common_prefix(&c.to_lowercase(), &lowered), c))
        .filter(|(shared, _)| return *shared >= 3)
        .max_by_key(|(shared, _)| return *shared)
        .map(|(_, c)| return c.clone());
}

/// Number of leading characters two strings share.
fn common_prefix(a: &str, b: &str) -> usize {
    return a.chars().zip(b.chars()).take_while(|(x, y)| return x == y).count();
}

/// "Did you mean" plus the full list of names.
fn push_alternatives(out: &mut String, heading: &str, missing: &str, available: &[String]) {
    if let Some(suggestion) = find_closest_suggestion(missing, available) {
        let _ = write!(out, "\n## Did you mean `{suggestion}`?\n");
    }
    if !available.is_empty() {
        let _ = write!(out, "\n## {heading}\n\n");
        for name in available {
            let _ = writeln!(out, "- `{name}`");
        }
    }
    return;
}

fn render_generic(e: &Error) -> String {
    return match e {
        Error::FileTooLarge { file, size_bytes, max_bytes } => format!(
            "\
# Error: File Too Large

`{}` is {size_bytes} bytes (max {max_bytes}).
",
            file.display()
        ),
        Error::Io(e) => format!(
            "\
# Error: I/O

{e}
"
        ),
        Error::ParseFailed { file, reason } => format!(
            "\
# Error: Parse Failed

Could not parse `{}`: {reason}
",
            file.display()
        ),
        Error::ProjectConfig { path, reason } => format!(
            "\
# Error: Invalid Project Config

`{}`: {reason}

## Fix

Check the JSON and the `extends` chain, or point `tsconfig` in `.symdoc.toml`
at a different file.
",
            path.display()
        ),
        Error::TomlDe(e) => format!(
            "\
# Error: Invalid TOML

{e}
"
        ),
        Error::UnsupportedLanguage { ext } => format!(
            "\
# Error: Unsupported Language

No grammar for `.{ext}` files.

## Supported extensions

- `.ts`, `.mts`, `.cts`, `.d.ts`, `.tsx`
- `.js`, `.mjs`, `.cjs`, `.jsx`
"
        ),
        _ => format!(
            "\
# Error

{e}
"
        ),
    };
}

fn render_invalid_request(reason: &str) -> String {
    return format!(
        "\
# Error: Invalid Reference

{reason}

## Syntax

    module                    file overview
    module:Symbol             exported symbol
    module:Symbol.member      static member
    module:Symbol#member      instance member
    {GLOBAL_PREFIX}Global[.member]       runtime global
"
    );
}

fn render_member_not_found(owner: &str, member: &str, available: &[String]) -> String {
    let mut out = format!(
        "\
# Error: Member Not Found

`{owner}` has no member `{member}`.
"
    );
    push_alternatives(&mut out, "Available members", member, available);
    return out;
}

fn render_module_not_found(specifier: &str) -> String {
    let hint = if specifier.starts_with(GLOBAL_PREFIX) {
        "Only the standard runtime globals are available: run `symdoc info` for the list."
    } else {
        "Check the path relative to the project root, or run `symdoc modules` to list\n\
         every module in the project."
    };
    return format!(
        "\
# Error: Module Not Found

Cannot find module `{specifier}`.

## Fix

{hint}
"
    );
}

fn render_symbol_not_found(module: &str, symbol: &str, available: &[String]) -> String {
    let mut out = format!(
        "\
# Error: Symbol Not Found

Symbol `{symbol}` is not exported by `{module}`.
"
    );
    if available.is_empty() {
        out.push_str("\nThe module has no exports.\n");
    }
    push_alternatives(&mut out, "Available exports", symbol, available);
    return out;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggestion_prefers_case_insensitive_match() {
        let names = vec!["greetUser".to_string(), "greeting".to_string()];
        assert_eq!(find_closest_suggestion("GreetUser", &names).as_deref(), Some("greetUser"));
        assert_eq!(find_closest_suggestion("greetings", &names).as_deref(), Some("greeting"));
        assert!(find_closest_suggestion("xyz", &names).is_none());
    }

    #[test]
    fn symbol_not_found_lists_exports() {
        let err = Error::SymbolNotFound {
            available: vec!["greetUser".to_string(), "TestClass".to_string()],
            module: "sample.js".to_string(),
            symbol: "greetuser".to_string(),
        };
        let md = render_error(&err);
        assert!(md.starts_with("# Error: Symbol Not Found"));
        assert!(md.contains("## Did you mean `greetUser`?"));
        assert!(md.contains("- `TestClass`"));
    }

    #[test]
    fn empty_module_says_so() {
        let err = Error::SymbolNotFound {
            available: Vec::new(),
            module: "script.js".to_string(),
            symbol: "x".to_string(),
        };
        assert!(render_error(&err).contains("The module has no exports."));
    }

    #[test]
    fn invalid_request_shows_syntax() {
        let md = render_error(&Error::invalid("Module path is required"));
        assert!(md.contains("module:Symbol#member"));
    }
}
