//! The type system oracle seam.
//!
//! Resolution logic never inspects source text directly. It asks an [`Oracle`]
//! for compiler options, module resolution and checking contexts, then asks the
//! context (a [`Checker`]) for symbols, types and documentation. Every handle
//! returned by a checker (`SymbolId`, `TypeId`, ...) is an index that is only
//! valid for the context that produced it.

pub mod project;
pub mod resolution;
pub mod ts;

use std::path::{Path, PathBuf};

pub use project::CompilerOptions;

use crate::error::Error;

/// Opaque handle to a parsed source unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(
    /// Index into the context's unit table.
    pub usize,
);

/// Opaque handle to a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(
    /// Index into the context's symbol table.
    pub usize,
);

/// Opaque handle to a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(
    /// Index into the context's type table.
    pub usize,
);

/// Opaque handle to a call or construct signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SignatureId(
    /// Index into the context's signature table.
    pub usize,
);

/// Opaque handle to a syntax node that can be asked for its symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(
    /// Index into the context's node table.
    pub usize,
);

/// Zero-based source position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// Zero-based column.
    pub column: u32,
    /// Zero-based line.
    pub line: u32,
}

/// One declaration of a symbol, as the projector sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// File the declaration lives in.
    pub file: PathBuf,
    /// Declared with `static`.
    pub is_static: bool,
    /// Syntactic kind of the declaration.
    pub kind: DeclarationKind,
    /// Declared with `?`, a default value, or a bracketed JSDoc name.
    pub optional: bool,
    /// Start of the declaration.
    pub position: Position,
    /// Source text of the declaration.
    pub text: String,
    /// Shape of the value the declaration binds, for value-carrying kinds.
    pub value: ValueShape,
}

/// Syntactic declaration kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclarationKind {
    /// `class` declaration or expression.
    Class,
    /// A property of a CommonJS `module.exports` object or an `exports.x =` assignment.
    CommonJsExport,
    /// `enum` declaration.
    Enum,
    /// Member of an `enum`.
    EnumMember,
    /// `function` declaration or overload signature.
    Function,
    /// `interface` declaration.
    Interface,
    /// Method of a class or interface.
    Method,
    /// Namespace or namespace import.
    Module,
    /// Property of an object literal.
    ObjectProperty,
    /// Class field, accessor, parameter property, or interface property.
    Property,
    /// `type` alias.
    TypeAlias,
    /// Import or re-export whose target could not be found.
    Unresolved,
    /// `var`, `let`, or `const` binding.
    Variable,
}

/// Shape of the value a declaration binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueShape {
    /// A class expression.
    Class,
    /// A function or arrow function expression.
    Function,
    /// An object literal method.
    Method,
    /// The declaration binds no value.
    None,
    /// An object literal.
    Object,
    /// Any other expression.
    Other,
}

/// One entry of a module's export table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportEntry {
    /// Exported name.
    pub name: String,
    /// Export target, with aliases followed as far as the checker can.
    pub symbol: SymbolId,
}

/// One JSDoc block tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsDocTag {
    /// Tag name without the `@`.
    pub name: String,
    /// Tag text with any `{type}` expression removed.
    pub text: String,
}

/// Outcome of resolving one specifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleResolution {
    /// Candidates tried before the answer that did not exist. A file
    /// appearing at any of them can change the answer.
    pub failed_lookups: Vec<PathBuf>,
    /// Resolved file, `None` when nothing matched.
    pub resolved: Option<PathBuf>,
}

/// What a checking context is built over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceInput {
    /// A file on disk.
    File(PathBuf),
    /// In-memory source with a synthetic path.
    Virtual {
        /// Path the unit reports.
        path: PathBuf,
        /// Source text.
        text: String,
    },
}

// ── Syntax view ───────────────────────────────────────────────────────

/// Top-level statement of a unit, reduced to what CommonJS recovery needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// `class Name { ... }`.
    ClassDeclaration {
        /// Declared name.
        name: String,
        /// Node resolving to the class symbol.
        node: NodeId,
    },
    /// Expression statement.
    Expression(Expression),
    /// `function name() { ... }`.
    FunctionDeclaration {
        /// Declared name.
        name: String,
        /// Node resolving to the function symbol.
        node: NodeId,
    },
    /// Anything else.
    Other,
    /// `var`/`let`/`const` statement.
    VariableStatement(Vec<VariableDeclarator>),
}

/// One binding of a variable statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableDeclarator {
    /// Initializer expression, if present.
    pub initializer: Option<Expression>,
    /// Bound name.
    pub name: String,
    /// Node resolving to the variable symbol.
    pub node: NodeId,
}

/// Expression reduced to the forms CommonJS recovery inspects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    /// `left = right`.
    Assignment {
        /// Assignment target.
        left: Box<Expression>,
        /// Assigned value.
        right: Box<Expression>,
    },
    /// Bare identifier.
    Identifier {
        /// Identifier text.
        name: String,
        /// Node resolving to the referenced symbol.
        node: NodeId,
    },
    /// `object.property`.
    Member {
        /// Accessed object.
        object: Box<Expression>,
        /// Property name.
        property: String,
    },
    /// Object literal.
    Object(Vec<ObjectMember>),
    /// Anything else.
    Other,
}

/// One member of an object literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectMember {
    /// Methods, spreads, computed keys.
    Other,
    /// `key: value`.
    Property {
        /// Property key.
        key: String,
        /// Property value.
        value: Expression,
    },
    /// `{ name }`.
    Shorthand {
        /// Property name, also the referenced identifier.
        name: String,
        /// Node resolving to the referenced symbol.
        node: NodeId,
    },
}

// ── Traits ────────────────────────────────────────────────────────────

/// Factory for checking contexts plus project-level queries.
pub trait Oracle {
    /// Checking context this oracle produces.
    type Context: Checker;

    /// Build a fresh checking context over `roots`.
    ///
    /// # Errors
    ///
    /// Returns an error if a root cannot be read or parsed.
    fn create_checking_context(
        &self,
        roots: &[SourceInput],
        options: &CompilerOptions,
    ) -> Result<Self::Context, Error>;

    /// Discover compiler options for a project rooted at `root`. `explicit`
    /// names a config file that overrides discovery.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but is malformed.
    fn find_project_config(
        &self,
        root: &Path,
        explicit: Option<&Path>,
    ) -> Result<CompilerOptions, Error>;

    /// Resolve a module specifier as an import from `containing_file` would.
    fn resolve_module_name(
        &self,
        specifier: &str,
        containing_file: &Path,
        options: &CompilerOptions,
    ) -> ModuleResolution;
}

/// Symbol and type queries over one checking context.
pub trait Checker {
    /// Call signatures of a type.
    fn call_signatures(&self, ty: TypeId) -> Vec<SignatureId>;

    /// Construct signatures of a type.
    fn construct_signatures(&self, ty: TypeId) -> Vec<SignatureId>;

    /// Every declaration of a symbol, in source order.
    fn declarations(&self, symbol: SymbolId) -> Vec<Declaration>;

    /// Declared type of a type-bearing symbol (class instance, interface, alias, enum).
    fn declared_type_of_symbol(&self, symbol: SymbolId) -> Option<TypeId>;

    /// Summary text of a symbol's doc comment.
    fn documentation_comment(&self, symbol: SymbolId) -> Option<String>;

    /// Export table of a unit, `None` when the unit is not a module.
    fn exports_of_module(&self, unit: UnitId) -> Option<Vec<ExportEntry>>;

    /// Symbol in the global scope.
    fn global_symbol(&self, name: &str) -> Option<SymbolId>;

    /// JSDoc block tags of a symbol's doc comment.
    fn jsdoc_tags(&self, symbol: SymbolId) -> Vec<JsDocTag>;

    /// Comments preceding the first statement of a unit, verbatim.
    fn leading_comments(&self, unit: UnitId) -> &[String];

    /// Properties of a type, own members first.
    fn properties_of_type(&self, ty: TypeId) -> Vec<SymbolId>;

    /// Return type of a signature.
    fn return_type_of_signature(&self, signature: SignatureId) -> TypeId;

    /// Units the context was built over, in input order.
    fn root_units(&self) -> Vec<UnitId>;

    /// Render a signature as `<T>(a: A, b?: B): R`.
    fn signature_to_string(&self, signature: SignatureId) -> String;

    /// Top-level statements of a unit.
    fn statements(&self, unit: UnitId) -> &[Statement];

    /// Symbol a node declares or refers to.
    fn symbol_at_location(&self, node: NodeId) -> Option<SymbolId>;

    /// Declared name of a symbol.
    fn symbol_name(&self, symbol: SymbolId) -> String;

    /// Value type of a symbol.
    fn type_of_symbol(&self, symbol: SymbolId) -> TypeId;

    /// Render a type.
    fn type_to_string(&self, ty: TypeId) -> String;

    /// Path of a unit.
    fn unit_path(&self, unit: UnitId) -> &Path;
}
