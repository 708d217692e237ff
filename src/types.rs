/// Core domain types: parsed references and the records a resolution produces.
use serde::Serialize;

/// A SHA-256 content hash: 64 lowercase hex chars.
/// Newtype prevents mixing with arbitrary strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentHash(
    /// The hex-encoded SHA-256 digest string.
    pub String,
);

/// Successful output of a documentation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Docs {
    /// Whole-module summary, produced when the reference names no symbol.
    File(FileInfo),
    /// Documentation for one symbol or member.
    Symbol(SymbolInfo),
}

/// One exported symbol in a file overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    /// First line of the symbol's documentation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    /// Classified declaration kind.
    pub kind: SymbolKind,
    /// One-based declaration line.
    pub line: u32,
    /// Export name.
    pub name: String,
}

/// Whole-module summary. `exports` is sorted by `line`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileInfo {
    /// Number of entries in `exports`.
    #[serde(rename = "exportCount")]
    pub export_count: usize,
    /// Exported symbols in declaration order.
    pub exports: Vec<ExportSummary>,
    /// Text of the leading `@fileoverview` / `@file` tag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    /// Module path, relative to the project root when under it.
    pub path: String,
}

/// How a resolved module file is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleFormat {
    /// `require`/`module.exports` JavaScript.
    CommonJs,
    /// ECMAScript module JavaScript.
    Module,
    /// TypeScript source or declaration file.
    TypeScript,
}

impl ModuleFormat {
    /// Wire spelling of the format.
    pub const fn as_str(self) -> &'static str {
        return match self {
            Self::CommonJs => "commonjs",
            Self::Module => "module",
            Self::TypeScript => "typescript",
        };
    }
}

/// Output of a location request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleLocation {
    /// Module system of the file.
    pub format: ModuleFormat,
    /// Absolute path of the resolved file.
    pub path: String,
}

/// Parsed intent of a reference string. Created once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// `true` for `.member`, `false` for `#member`, `None` without a member.
    pub is_static: Option<bool>,
    /// Member name after `#` or `.`.
    pub member: Option<String>,
    /// Module specifier, or `node:<name>` for runtime globals.
    pub module: String,
    /// Symbol name after `:`; `None` requests a file overview.
    pub symbol: Option<String>,
}

impl Reference {
    /// Global references resolve against the ambient runtime declarations.
    pub fn is_global(&self) -> bool {
        return self.module.starts_with(crate::reference::GLOBAL_PREFIX);
    }
}

/// Documentation record for one symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolInfo {
    /// Summary text of the symbol's doc comment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    /// JSDoc tags, one `@tag text` per line.
    #[serde(rename = "jsDoc", skip_serializing_if = "Option::is_none")]
    pub js_doc: Option<String>,
    /// Classified declaration kind.
    pub kind: SymbolKind,
    /// `file:line:col`, one-based.
    pub location: String,
    /// `Symbol`, `Symbol.member` (static), or `Symbol#member` (instance).
    pub name: String,
    /// Call, construct, or declaration signature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    /// Rendered type.
    #[serde(rename = "type")]
    pub type_text: String,
}

/// Declaration kinds a symbol is classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    /// `class` declarations and expressions.
    Class,
    /// `enum` declarations.
    Enum,
    /// Members of an `enum`.
    #[serde(rename = "enum member")]
    EnumMember,
    /// Functions, including CommonJS-exported function values.
    Function,
    /// `interface` declarations.
    Interface,
    /// Methods of classes, interfaces, and object literals.
    Method,
    /// Namespaces.
    Module,
    /// Class fields, accessors, and interface properties.
    Property,
    /// `type` aliases.
    Type,
    /// Nothing matched.
    Unknown,
    /// `var`, `let`, `const`.
    Variable,
}

impl SymbolKind {
    /// Wire spelling of the kind.
    pub const fn as_str(self) -> &'static str {
        return match self {
            Self::Class => "class",
            Self::Enum => "enum",
            Self::EnumMember => "enum member",
            Self::Function => "function",
            Self::Interface => "interface",
            Self::Method => "method",
            Self::Module => "module",
            Self::Property => "property",
            Self::Type => "type",
            Self::Unknown => "unknown",
            Self::Variable => "variable",
        };
    }
}

impl std::fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return f.write_str(self.as_str());
    }
}
