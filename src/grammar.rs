/// Tree-sitter grammar resolution by file extension.
use std::path::Path;

use tree_sitter::Language;

use crate::error::Error;

/// Extensions of every source module the engine accepts, `.d.ts` covered by `ts`.
pub const SOURCE_EXTENSIONS: [&str; 8] = ["cjs", "cts", "js", "jsx", "mjs", "mts", "ts", "tsx"];

/// Whether `path` names a TypeScript or JavaScript source file.
pub fn is_source_path(path: &Path) -> bool {
    let ext = path.extension().and_then(|e| return e.to_str()).unwrap_or("");
    return SOURCE_EXTENSIONS.contains(&ext);
}

/// Map a file extension to its tree-sitter language. Plain JavaScript parses
/// with the TypeScript grammar, JSX with TSX.
///
/// # Errors
///
/// Returns `Error::UnsupportedLanguage` for unknown extensions.
pub fn language_for_path(path: &Path) -> Result<Language, Error> {
    let ext = path.extension().and_then(|e| return e.to_str()).unwrap_or("");

    return match ext {
        "cjs" | "cts" | "js" | "mjs" | "mts" | "ts" => {
            Ok(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into())
        },
        "jsx" | "tsx" => Ok(tree_sitter_typescript::LANGUAGE_TSX.into()),
        _ => Err(Error::UnsupportedLanguage {
            ext: ext.to_string(),
        }),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declaration_files_are_sources() {
        assert!(is_source_path(Path::new("types/index.d.ts")));
        assert!(is_source_path(Path::new("lib/util.cjs")));
        assert!(!is_source_path(Path::new("README.md")));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = language_for_path(Path::new("main.rs")).unwrap_err();
        assert!(err.to_string().contains("rs"), "{err}");
    }
}
