//! Tree-sitter backed oracle for TypeScript and JavaScript sources.
//!
//! A context is built by parsing every root, binding declarations into owned
//! tables, then loading the modules those roots import (breadth first, capped)
//! so re-exports and aliases can be followed. Trees are dropped after binding;
//! the checker works purely on the tables.

mod binder;
mod checker;
pub mod jsdoc;

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};

use tree_sitter::Parser;

use super::{
    CompilerOptions, DeclarationKind, ModuleResolution, Oracle, Position, SignatureId, SourceInput,
    Statement, SymbolId, TypeId, UnitId,
};
use crate::error::Error;
use crate::grammar;
use jsdoc::DocComment;

/// Maximum source file size (16 MiB).
const MAX_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// Dependency loading stops once a context holds this many units.
const MAX_UNITS: usize = 200;

/// Ambient declarations for the runtime globals.
const LIB_SOURCE: &str = include_str!("lib.symdoc.d.ts");

/// Path the ambient declarations report.
const LIB_PATH: &str = "lib.symdoc.d.ts";

/// The tree-sitter oracle. Stateless; every context it builds is independent.
#[derive(Debug, Clone, Copy, Default)]
pub struct TsOracle;

/// One checking context: the bound program plus interned types.
pub struct TsContext {
    /// Signatures whose return type is being inferred, guarding recursion.
    inferring: RefCell<Vec<SignatureId>>,
    /// Bound declarations of every loaded unit.
    program: Program,
    /// Units the context was built over.
    roots: Vec<UnitId>,
    /// Interned types. Mutated behind `&self` by type queries.
    types: RefCell<TypeTable>,
}

impl Oracle for TsOracle {
    type Context = TsContext;

    fn create_checking_context(
        &self,
        roots: &[SourceInput],
        options: &CompilerOptions,
    ) -> Result<TsContext, Error> {
        let mut program = Program::default();
        bind_source(&mut program, Path::new(LIB_PATH), LIB_SOURCE)?;

        let mut by_path: HashMap<PathBuf, UnitId> = HashMap::new();
        let mut root_units = Vec::with_capacity(roots.len());
        for input in roots {
            let unit = match input {
                SourceInput::File(path) => {
                    let source = read_source(path)?;
                    let unit = bind_source(&mut program, path, &source)?;
                    by_path.insert(path.clone(), unit);
                    unit
                },
                SourceInput::Virtual { path, text } => bind_source(&mut program, path, text)?,
            };
            root_units.push(unit);
        }

        load_dependencies(&mut program, &root_units, &mut by_path, options);

        tracing::debug!(
            roots = root_units.len(),
            units = program.units.len(),
            symbols = program.symbols.len(),
            "checking context ready"
        );
        return Ok(TsContext {
            inferring: RefCell::new(Vec::new()),
            program,
            roots: root_units,
            types: RefCell::new(TypeTable::default()),
        });
    }

    fn find_project_config(
        &self,
        root: &Path,
        explicit: Option<&Path>,
    ) -> Result<CompilerOptions, Error> {
        return super::project::discover(root, explicit);
    }

    fn resolve_module_name(
        &self,
        specifier: &str,
        containing_file: &Path,
        options: &CompilerOptions,
    ) -> ModuleResolution {
        return super::resolution::resolve_module_name(specifier, containing_file, options);
    }
}

/// Parse and bind one source text as a new unit.
///
/// # Errors
///
/// Returns `Error::UnsupportedLanguage` for unknown extensions and
/// `Error::ParseFailed` if tree-sitter cannot parse the source.
fn bind_source(program: &mut Program, path: &Path, source: &str) -> Result<UnitId, Error> {
    let language = grammar::language_for_path(path)?;
    let mut parser = Parser::new();
    parser.set_language(&language).map_err(|e| {
        return Error::ParseFailed {
            file: path.to_path_buf(),
            reason: e.to_string(),
        };
    })?;
    let tree = parser.parse(source, None).ok_or_else(|| {
        return Error::ParseFailed {
            file: path.to_path_buf(),
            reason: "tree-sitter returned None".to_string(),
        };
    })?;

    let unit = UnitId(program.units.len());
    let data = binder::bind(program, unit, path, source, tree.root_node());
    program.units.push(data);
    return Ok(unit);
}

/// Breadth-first load of every module the roots reach, up to [`MAX_UNITS`].
/// A dependency that fails to load is recorded as unresolved, never fatal.
fn load_dependencies(
    program: &mut Program,
    roots: &[UnitId],
    by_path: &mut HashMap<PathBuf, UnitId>,
    options: &CompilerOptions,
) {
    let mut queue: VecDeque<UnitId> = roots.iter().copied().collect();

    while let Some(unit) = queue.pop_front() {
        let Some(data) = program.units.get(unit.0) else {
            continue;
        };
        let containing = data.path.clone();
        let specifiers = data.specifiers.clone();

        for specifier in specifiers {
            let resolution =
                super::resolution::resolve_module_name(&specifier, &containing, options);
            let target = resolution.resolved.and_then(|path| {
                if let Some(existing) = by_path.get(&path) {
                    return Some(*existing);
                }
                if program.units.len() >= MAX_UNITS {
                    let skipped = path.display();
                    tracing::warn!(path = %skipped, "unit limit reached, not loading dependency");
                    return None;
                }
                let loaded = read_source(&path)
                    .and_then(|source| return bind_source(program, &path, &source));
                return match loaded {
                    Ok(id) => {
                        by_path.insert(path, id);
                        queue.push_back(id);
                        Some(id)
                    },
                    Err(e) => {
                        let failed = path.display();
                        tracing::warn!(path = %failed, error = %e, "failed to load dependency");
                        None
                    },
                };
            });
            if target.is_none() {
                tracing::debug!(specifier, from = %containing.display(), "unresolved import");
            }
            if let Some(data) = program.units.get_mut(unit.0) {
                data.module_refs.insert(specifier, target);
            }
        }
    }
    return;
}

/// Read a source file, refusing anything above [`MAX_FILE_SIZE`].
///
/// # Errors
///
/// Returns `Error::FileTooLarge` or `Error::Io`.
fn read_source(path: &Path) -> Result<String, Error> {
    let size_bytes = std::fs::metadata(path)?.len();
    if size_bytes > MAX_FILE_SIZE {
        return Err(Error::FileTooLarge {
            file: path.to_path_buf(),
            max_bytes: MAX_FILE_SIZE,
            size_bytes,
        });
    }
    return Ok(std::fs::read_to_string(path)?);
}

// ── Bound program ─────────────────────────────────────────────────────

/// Where an import-like symbol points.
#[derive(Debug, Clone)]
enum AliasTarget {
    /// `import { name } from "specifier"` or `export { name } from "specifier"`.
    Import {
        /// Export name in the target module.
        name: String,
        /// Module specifier as written.
        specifier: String,
    },
    /// `export { name }` of a local binding.
    Local(String),
    /// `import * as ns from "specifier"`.
    Namespace(String),
}

/// One declaration as bound from the tree.
#[derive(Debug, Clone)]
struct DeclData {
    /// Kind-specific payload.
    detail: DeclDetail,
    /// Parsed doc comment attached to the declaration.
    doc: Option<DocComment>,
    /// Declared `static`.
    is_static: bool,
    /// Syntactic kind.
    kind: DeclarationKind,
    /// `?`, default value, or bracketed JSDoc name.
    optional: bool,
    /// Start of the declaration node.
    position: Position,
    /// Declaration source text.
    text: String,
}

/// Kind-specific declaration payload.
#[derive(Debug, Clone)]
enum DeclDetail {
    /// Function, method, or overload signature.
    Callable {
        /// Has an implementation body.
        has_body: bool,
        /// The declared signature.
        signature: SignatureId,
    },
    /// Class declaration or expression.
    Class {
        /// Constructor signatures, synthesized when none are written.
        constructors: Vec<SignatureId>,
        /// Text of the `extends` expression.
        extends: Option<String>,
    },
    /// Interface declaration.
    Interface {
        /// Call signatures.
        call: Vec<SignatureId>,
        /// Construct signatures.
        construct: Vec<SignatureId>,
        /// Texts of the `extends` clause entries.
        extends: Vec<String>,
    },
    /// Nothing beyond the kind.
    None,
    /// Type alias.
    TypeAlias {
        /// The aliased type is an object type literal whose members are bound.
        object: bool,
        /// Aliased type text.
        value: String,
    },
    /// Variable, property, or export binding a value.
    Value {
        /// Written or JSDoc-declared type.
        annotation: Option<String>,
        /// Initializer.
        value: ValueExpr,
    },
}

/// Export table slot before alias resolution.
#[derive(Debug, Clone)]
enum ExportSlot {
    /// A named export.
    Named {
        /// Exported name.
        name: String,
        /// Local or alias symbol.
        symbol: SymbolId,
    },
    /// `export * from "specifier"`.
    Star(String),
}

/// What a registered node stands for.
#[derive(Debug, Clone)]
enum NodeTarget {
    /// The node declares this symbol.
    Declaration(SymbolId),
    /// The node is an identifier looked up by name in its unit.
    Reference {
        /// Identifier text.
        name: String,
        /// Unit whose scope the lookup starts in.
        unit: UnitId,
    },
}

/// One parameter of a signature.
#[derive(Debug, Clone)]
struct ParamData {
    /// Parameter name without `...`.
    name: String,
    /// `?`, default value, or bracketed JSDoc name.
    optional: bool,
    /// `...rest` parameter.
    rest: bool,
    /// Written, JSDoc, or default-inferred type.
    type_text: Option<String>,
}

/// Every table a context owns.
#[derive(Debug, Default)]
struct Program {
    /// Global scope: script units and `declare global` blocks.
    globals: HashMap<String, SymbolId>,
    /// Registered nodes.
    nodes: Vec<NodeTarget>,
    /// Written object type literals by `(unit, text)`, members bound on the symbol.
    object_types: HashMap<(UnitId, String), SymbolId>,
    /// Signatures.
    signatures: Vec<SignatureData>,
    /// Symbols.
    symbols: Vec<SymbolData>,
    /// Units, index = `UnitId`.
    units: Vec<UnitData>,
}

/// How a signature's return type is obtained.
#[derive(Debug, Clone)]
enum ReturnSpec {
    /// Written or JSDoc `@returns` type.
    Annotation(String),
    /// Inferred from the first `return` expression.
    Inferred {
        /// Returned expression, `None` for `void`.
        expr: Option<ValueExpr>,
        /// `async` functions wrap the result in `Promise<...>`.
        is_async: bool,
    },
    /// A constructor returning an instance of the class.
    Instance(SymbolId),
}

/// A call or construct signature.
#[derive(Debug, Clone)]
struct SignatureData {
    /// Parameters in order.
    params: Vec<ParamData>,
    /// Return type source.
    returns: ReturnSpec,
    /// `<T, U>` text.
    type_parameters: Option<String>,
    /// Unit whose scope names in the signature resolve in.
    unit: UnitId,
}

/// A bound symbol. Declarations of one name in one scope merge into one symbol.
#[derive(Debug, Clone)]
struct SymbolData {
    /// Set for imports and re-exports.
    alias: Option<AliasTarget>,
    /// Declarations in source order.
    declarations: Vec<DeclData>,
    /// Instance members, interface/object/enum members.
    members: Vec<SymbolId>,
    /// Declared name.
    name: String,
    /// Owning class, interface, object, enum, or namespace.
    parent: Option<SymbolId>,
    /// Static class members and namespace exports.
    statics: Vec<SymbolId>,
    /// Unit the symbol was declared in.
    unit: UnitId,
}

/// Interned type representation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum TypeData {
    /// A named type reference with arguments, e.g. `Promise<string>`.
    Alias {
        /// Text as written.
        display: String,
        /// Type the base name resolves to.
        target: TypeId,
    },
    /// Unknown or unresolvable.
    Any,
    /// Function or method: call signatures of its declarations.
    Callable(SymbolId),
    /// Instance side of a class.
    ClassInstance(SymbolId),
    /// Constructor side of a class.
    ClassStatic(SymbolId),
    /// An interface or type alias.
    Declared(SymbolId),
    /// Object holding an enum's members.
    EnumObject(SymbolId),
    /// Namespace object of a module.
    ModuleNamespace(UnitId),
    /// Namespace declaration's value.
    Namespace(SymbolId),
    /// Object literal.
    Object(SymbolId),
    /// Keyword type.
    Primitive(String),
    /// Function expression.
    Signature(SignatureId),
    /// Unstructured type text.
    Text(String),
}

/// Interning table for [`TypeData`].
#[derive(Debug, Default)]
struct TypeTable {
    /// Reverse lookup.
    ids: HashMap<TypeData, TypeId>,
    /// Type by id.
    types: Vec<TypeData>,
}

/// A bound unit.
#[derive(Debug, Default)]
struct UnitData {
    /// Comments before the first statement.
    comments: Vec<String>,
    /// Export table, `None` for scripts.
    exports: Option<Vec<ExportSlot>>,
    /// Module-scope bindings.
    locals: HashMap<String, SymbolId>,
    /// Specifier to loaded unit, `None` when unresolved.
    module_refs: HashMap<String, Option<UnitId>>,
    /// Source path.
    path: PathBuf,
    /// Module specifiers the unit imports, in source order.
    specifiers: Vec<String>,
    /// Top-level statements.
    statements: Vec<Statement>,
}

/// Initializer expression, reduced to what type inference needs.
#[derive(Debug, Clone)]
enum ValueExpr {
    /// Array literal.
    Array,
    /// Call of the named callee.
    Call(String),
    /// Class expression.
    Class(SymbolId),
    /// Function or arrow expression.
    Function(SignatureId),
    /// Reference to a binding.
    Identifier(String),
    /// Literal of a primitive type.
    Literal(&'static str),
    /// Object literal method.
    Method(SignatureId),
    /// `new Name(...)`.
    New(String),
    /// Object literal.
    Object(SymbolId),
    /// `require("specifier")`.
    Require(String),
    /// Anything else.
    Unknown,
}
