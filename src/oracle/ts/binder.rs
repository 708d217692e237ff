//! Tree walk that turns one parsed unit into symbols, signatures, the export
//! table, and the oracle-neutral statement view.

use std::collections::HashMap;
use std::path::Path;

use tree_sitter::Node;

use super::jsdoc::{self, DocComment};
use super::{
    AliasTarget, DeclData, DeclDetail, ExportSlot, NodeTarget, ParamData, Program, ReturnSpec,
    SignatureData, SymbolData, UnitData, ValueExpr,
};
use crate::oracle::{
    DeclarationKind, Expression, NodeId, ObjectMember, Position, SignatureId, Statement, SymbolId,
    UnitId, VariableDeclarator,
};

/// Parents a doc comment lookup climbs through when the node itself has none.
const DOC_WRAPPERS: [&str; 5] = [
    "ambient_declaration",
    "export_statement",
    "expression_statement",
    "lexical_declaration",
    "variable_declaration",
];

/// Expression kinds that create a function value.
const FUNCTION_EXPRESSIONS: [&str; 4] =
    ["arrow_function", "function", "function_expression", "generator_function"];

/// Node kinds whose `return` statements belong to a nested function.
const RETURN_BOUNDARIES: [&str; 10] = [
    "arrow_function",
    "class",
    "class_declaration",
    "function",
    "function_declaration",
    "function_expression",
    "generator_function",
    "generator_function_declaration",
    "method_definition",
    "object",
];

/// How a unit shares its bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModuleKind {
    /// `module.exports` / `exports.x` assignments, no ESM syntax.
    CommonJs,
    /// Has `import` or `export` statements.
    Esm,
    /// Neither; declarations are global.
    Script,
}

/// Where a declaration is bound.
#[derive(Debug, Clone, Copy)]
enum Scope {
    /// Not reachable by name; only through the returned symbol.
    Detached,
    /// The global scope.
    Globals,
    /// The unit's module scope.
    Locals,
    /// Instance or type members of the owner.
    Members(SymbolId),
    /// Static members or namespace exports of the owner.
    Statics(SymbolId),
}

/// Where a CommonJS assignment writes.
enum ExportTarget {
    /// `module.exports.name =` or `exports.name =`.
    Named(String),
    /// `module.exports =`.
    Whole,
}

/// Per-unit binding state. Symbols and signatures go straight into the
/// program; everything unit-scoped is collected here and returned.
struct Binder<'p, 's> {
    /// Inside `declare` or a `.d.ts` file, where namespace members are implicitly exported.
    ambient: bool,
    /// Leading comments.
    comments: Vec<String>,
    /// Export slots in source order.
    exports: Vec<ExportSlot>,
    /// JavaScript source: JSDoc types stand in for annotations.
    is_js: bool,
    /// Module scope.
    locals: HashMap<String, SymbolId>,
    /// How this unit exports.
    module_kind: ModuleKind,
    /// Tables being filled.
    program: &'p mut Program,
    /// Source text.
    source: &'s str,
    /// Imported module specifiers.
    specifiers: Vec<String>,
    /// Statement view.
    statements: Vec<Statement>,
    /// Unit being bound.
    unit: UnitId,
}

/// Bind one unit's tree into `program`.
pub(super) fn bind(
    program: &mut Program,
    unit: UnitId,
    path: &Path,
    source: &str,
    root: Node<'_>,
) -> UnitData {
    let ext = path.extension().and_then(|e| return e.to_str()).unwrap_or("");
    let is_declaration_file = path.to_string_lossy().ends_with(".d.ts");
    let module_kind = detect_module_kind(root, source);

    let mut binder = Binder {
        ambient: is_declaration_file,
        comments: Vec::new(),
        exports: Vec::new(),
        is_js: matches!(ext, "js" | "jsx" | "mjs" | "cjs"),
        locals: HashMap::new(),
        module_kind,
        program,
        source,
        specifiers: Vec::new(),
        statements: Vec::new(),
        unit,
    };
    binder.bind_program(root);

    return UnitData {
        comments: binder.comments,
        exports: (module_kind != ModuleKind::Script).then_some(binder.exports),
        locals: binder.locals,
        module_refs: HashMap::new(),
        path: path.to_path_buf(),
        specifiers: binder.specifiers,
        statements: binder.statements,
    };
}

impl<'s> Binder<'_, 's> {
    /// Record a specifier for dependency loading.
    fn add_specifier(&mut self, specifier: &str) {
        if !self.specifiers.iter().any(|s| return s == specifier) {
            self.specifiers.push(specifier.to_string());
        }
        return;
    }

    /// Bind an import/re-export symbol.
    fn alias_symbol(
        &mut self,
        scope: Scope,
        name: &str,
        target: AliasTarget,
        kind: DeclarationKind,
        node: Node<'_>,
    ) -> SymbolId {
        let symbol = self.declare(scope, name);
        if let Some(data) = self.program.symbols.get_mut(symbol.0) {
            data.alias = Some(target);
        }
        self.push_decl(symbol, DeclData {
            detail: DeclDetail::None,
            doc: None,
            is_static: false,
            kind,
            optional: false,
            position: position(node),
            text: self.text(node).to_string(),
        });
        return symbol;
    }

    /// Text of a type annotation field, `: ` stripped.
    fn annotation(&self, node: Node<'_>, field: &str) -> Option<String> {
        let annotation = node.child_by_field_name(field)?;
        let text = self.text(annotation).trim_start_matches(':').trim();
        if text.is_empty() {
            return None;
        }
        return Some(text.to_string());
    }

    /// `declare ...`: unwrap the inner declaration; `declare global { }` binds globally.
    fn bind_ambient(&mut self, node: Node<'_>, scope: Scope) -> (Statement, Vec<SymbolId>) {
        let was_ambient = self.ambient;
        self.ambient = true;
        let mut result = (Statement::Other, Vec::new());
        for child in named_children(node) {
            match child.kind() {
                "comment" => {},
                "statement_block" => {
                    for inner in named_children(child) {
                        let _ = self.bind_statement(inner, Scope::Globals);
                    }
                },
                _ => {
                    result = self.bind_statement(child, scope);
                    break;
                },
            }
        }
        self.ambient = was_ambient;
        return result;
    }

    /// Class declaration or expression, with members, statics, and constructors.
    fn bind_class(&mut self, node: Node<'_>, scope: Scope, name: &str) -> SymbolId {
        let symbol = self.declare(scope, name);
        let doc = doc_comment(node, self.source);
        let mut constructors = Vec::new();
        let mut js_constructor = None;

        if let Some(body) = node.child_by_field_name("body") {
            for member in named_children(body) {
                match member.kind() {
                    "abstract_method_signature" | "method_definition" | "method_signature" => {
                        let Some(member_name) = self.field_name(member, "name") else {
                            continue;
                        };
                        if member_name == "constructor" {
                            let member_doc = doc_comment(member, self.source);
                            let params = self.parameters(member, member_doc.as_ref());
                            constructors.push(self.new_signature(SignatureData {
                                params,
                                returns: ReturnSpec::Instance(symbol),
                                type_parameters: None,
                                unit: self.unit,
                            }));
                            self.bind_parameter_properties(member, symbol);
                            if self.is_js {
                                js_constructor = Some(member);
                            }
                        } else {
                            self.bind_method(member, symbol, &member_name);
                        }
                    },
                    "public_field_definition" => self.bind_field(member, symbol),
                    _ => {},
                }
            }
        }

        if constructors.is_empty() {
            constructors.push(self.new_signature(SignatureData {
                params: Vec::new(),
                returns: ReturnSpec::Instance(symbol),
                type_parameters: None,
                unit: self.unit,
            }));
        }

        let extends = self.class_extends(node);
        self.push_decl(symbol, DeclData {
            detail: DeclDetail::Class { constructors, extends },
            doc,
            is_static: false,
            kind: DeclarationKind::Class,
            optional: false,
            position: position(node),
            text: self.text(node).to_string(),
        });

        if let Some(constructor) = js_constructor {
            self.bind_this_assignments(constructor, symbol);
        }
        return symbol;
    }

    /// Top-level CommonJS assignment: `module.exports = ...`, `exports.x = ...`.
    fn bind_commonjs_export(&mut self, statement: Node<'_>) {
        let Some(assignment) =
            first_named(statement).filter(|n| return n.kind() == "assignment_expression")
        else {
            return;
        };
        let (Some(left), Some(right)) = (
            assignment.child_by_field_name("left"),
            assignment.child_by_field_name("right"),
        ) else {
            return;
        };
        let doc = doc_comment(statement, self.source);

        let kind = DeclarationKind::CommonJsExport;
        match commonjs_target(self.text(left)) {
            Some(ExportTarget::Whole) if right.kind() == "object" => {
                for member in named_children(right) {
                    if let Some(symbol) = self.bind_object_member(member, Scope::Detached, kind) {
                        let name = self.symbol_name(symbol);
                        self.push_export(&name, symbol);
                    }
                }
            },
            Some(ExportTarget::Whole) => {
                let symbol = self.bind_value_declaration("default", right, doc, statement, kind);
                self.push_export("default", symbol);
            },
            Some(ExportTarget::Named(name)) => {
                let symbol = self.bind_value_declaration(&name, right, doc, statement, kind);
                self.push_export(&name, symbol);
            },
            None => {},
        }
        return;
    }

    /// `export default <expression>`.
    fn bind_default_value(&mut self, value: Node<'_>, statement: Node<'_>) -> SymbolId {
        if value.kind() == "identifier" {
            let local = self.text(value).to_string();
            return self.alias_symbol(
                Scope::Detached,
                "default",
                AliasTarget::Local(local),
                DeclarationKind::Unresolved,
                statement,
            );
        }
        if value.kind() == "class" {
            return self.bind_class(value, Scope::Detached, "default");
        }
        let doc = doc_comment(value, self.source);
        if FUNCTION_EXPRESSIONS.contains(&value.kind()) {
            let symbol = self.declare(Scope::Detached, "default");
            let signature = self.signature(value, doc.as_ref());
            self.push_decl(symbol, DeclData {
                detail: DeclDetail::Callable { has_body: true, signature },
                doc,
                is_static: false,
                kind: DeclarationKind::Function,
                optional: false,
                position: position(value),
                text: self.text(statement).to_string(),
            });
            return symbol;
        }
        return self.bind_value_declaration(
            "default",
            value,
            doc,
            statement,
            DeclarationKind::Variable,
        );
    }

    /// `enum E { A, B = 2 }`.
    fn bind_enum(&mut self, node: Node<'_>, scope: Scope) -> Option<SymbolId> {
        let name = self.field_name(node, "name")?;
        let symbol = self.declare(scope, &name);
        self.push_decl(symbol, DeclData {
            detail: DeclDetail::None,
            doc: doc_comment(node, self.source),
            is_static: false,
            kind: DeclarationKind::Enum,
            optional: false,
            position: position(node),
            text: self.text(node).to_string(),
        });

        if let Some(body) = node.child_by_field_name("body") {
            for member in named_children(body) {
                let member_name = match member.kind() {
                    "enum_assignment" => self.field_name(member, "name"),
                    "number" | "property_identifier" | "string" => {
                        Some(unquote(self.text(member)).to_string())
                    },
                    _ => None,
                };
                let Some(member_name) = member_name else {
                    continue;
                };
                let member_symbol = self.declare(Scope::Members(symbol), &member_name);
                self.push_decl(member_symbol, DeclData {
                    detail: DeclDetail::None,
                    doc: doc_comment(member, self.source),
                    is_static: true,
                    kind: DeclarationKind::EnumMember,
                    optional: false,
                    position: position(member),
                    text: self.text(member).to_string(),
                });
            }
        }
        return Some(symbol);
    }

    /// `export ...` in all its forms.
    fn bind_export(&mut self, node: Node<'_>, scope: Scope) -> (Statement, Vec<SymbolId>) {
        let source_node = node.child_by_field_name("source");
        let specifier = source_node.map(|s| return unquote(self.text(s)).to_string());
        if let Some(specifier) = &specifier {
            self.add_specifier(specifier);
        }
        let value_node = node.child_by_field_name("value");
        let is_default = has_token(node, "default");
        let at_module_scope = matches!(scope, Scope::Locals);

        let mut result = (Statement::Other, Vec::new());
        let mut has_clause = false;

        for child in named_children(node) {
            if Some(child) == value_node {
                let symbol = self.bind_default_value(child, node);
                if at_module_scope {
                    self.push_export("default", symbol);
                }
                continue;
            }
            if Some(child) == source_node {
                continue;
            }
            match child.kind() {
                "comment" | "decorator" => {},
                "export_clause" => {
                    has_clause = true;
                    if at_module_scope {
                        self.bind_export_clause(child, specifier.as_deref());
                    }
                },
                "namespace_export" => {
                    has_clause = true;
                    let Some(name_node) = named_children(child).into_iter().last() else {
                        continue;
                    };
                    if let Some(specifier) = &specifier
                        && at_module_scope
                    {
                        let name = unquote(self.text(name_node)).to_string();
                        let symbol = self.alias_symbol(
                            Scope::Detached,
                            &name,
                            AliasTarget::Namespace(specifier.clone()),
                            DeclarationKind::Module,
                            node,
                        );
                        self.push_export(&name, symbol);
                    }
                },
                _ => {
                    let bound = self.bind_statement(child, scope);
                    if at_module_scope {
                        for &symbol in &bound.1 {
                            let name = if is_default {
                                "default".to_string()
                            } else {
                                self.symbol_name(symbol)
                            };
                            self.push_export(&name, symbol);
                        }
                    }
                    result = bound;
                },
            }
        }

        if !has_clause
            && at_module_scope
            && has_token(node, "*")
            && let Some(specifier) = specifier
        {
            self.exports.push(ExportSlot::Star(specifier));
        }
        return result;
    }

    /// `export { a, b as c }` with or without `from`.
    fn bind_export_clause(&mut self, clause: Node<'_>, specifier: Option<&str>) {
        for item in named_children(clause) {
            if item.kind() != "export_specifier" {
                continue;
            }
            let Some(name) = self.field_name(item, "name") else {
                continue;
            };
            let exported = self.field_name(item, "alias").unwrap_or_else(|| return name.clone());
            let target = match specifier {
                Some(specifier) => AliasTarget::Import {
                    name,
                    specifier: specifier.to_string(),
                },
                None => AliasTarget::Local(name),
            };
            let symbol = self.alias_symbol(
                Scope::Detached,
                &exported,
                target,
                DeclarationKind::Unresolved,
                item,
            );
            self.push_export(&exported, symbol);
        }
        return;
    }

    /// Class field: `static x: T = v;`, `y?: U;`.
    fn bind_field(&mut self, member: Node<'_>, owner: SymbolId) {
        let Some(name) = self.field_name(member, "name") else {
            return;
        };
        let is_static = has_token(member, "static");
        let scope = if is_static { Scope::Statics(owner) } else { Scope::Members(owner) };
        let symbol = self.declare(scope, &name);
        let doc = doc_comment(member, self.source);
        let annotation =
            self.object_annotation(member, "type").or_else(|| return self.js_type(doc.as_ref()));
        let value = member
            .child_by_field_name("value")
            .map_or(ValueExpr::Unknown, |v| return self.value_expr(v, doc.as_ref(), &name));
        self.push_decl(symbol, DeclData {
            detail: DeclDetail::Value { annotation, value },
            doc,
            is_static,
            kind: DeclarationKind::Property,
            optional: has_token(member, "?"),
            position: position(member),
            text: self.text(member).to_string(),
        });
        return;
    }

    /// Function declaration or overload signature.
    fn bind_function(&mut self, node: Node<'_>, scope: Scope, name: &str) -> SymbolId {
        let symbol = self.declare(scope, name);
        let doc = doc_comment(node, self.source);
        let signature = self.signature(node, doc.as_ref());
        self.push_decl(symbol, DeclData {
            detail: DeclDetail::Callable {
                has_body: node.child_by_field_name("body").is_some(),
                signature,
            },
            doc,
            is_static: false,
            kind: DeclarationKind::Function,
            optional: false,
            position: position(node),
            text: self.text(node).to_string(),
        });
        return symbol;
    }

    /// `import d, { a as b } from "x"`, `import * as ns from "x"`.
    fn bind_import(&mut self, node: Node<'_>) {
        let Some(source) = node.child_by_field_name("source") else {
            return;
        };
        let specifier = unquote(self.text(source)).to_string();
        self.add_specifier(&specifier);

        for clause in named_children(node) {
            if clause.kind() != "import_clause" {
                continue;
            }
            for part in named_children(clause) {
                match part.kind() {
                    "identifier" => {
                        let local = self.text(part).to_string();
                        let target = AliasTarget::Import {
                            name: "default".to_string(),
                            specifier: specifier.clone(),
                        };
                        self.alias_symbol(
                            Scope::Locals,
                            &local,
                            target,
                            DeclarationKind::Unresolved,
                            part,
                        );
                    },
                    "namespace_import" => {
                        let Some(local_node) = named_children(part).into_iter().last() else {
                            continue;
                        };
                        let local = self.text(local_node).to_string();
                        let target = AliasTarget::Namespace(specifier.clone());
                        self.alias_symbol(
                            Scope::Locals,
                            &local,
                            target,
                            DeclarationKind::Module,
                            part,
                        );
                    },
                    "named_imports" => {
                        for item in named_children(part) {
                            if item.kind() != "import_specifier" {
                                continue;
                            }
                            let Some(name) = self.field_name(item, "name") else {
                                continue;
                            };
                            let local = self
                                .field_name(item, "alias")
                                .unwrap_or_else(|| return name.clone());
                            let target = AliasTarget::Import {
                                name,
                                specifier: specifier.clone(),
                            };
                            self.alias_symbol(
                                Scope::Locals,
                                &local,
                                target,
                                DeclarationKind::Unresolved,
                                item,
                            );
                        }
                    },
                    _ => {},
                }
            }
        }
        return;
    }

    /// Interface declaration. Repeated declarations merge into one symbol.
    fn bind_interface(&mut self, node: Node<'_>, scope: Scope) -> Option<SymbolId> {
        let name = self.field_name(node, "name")?;
        let symbol = self.declare(scope, &name);
        let doc = doc_comment(node, self.source);

        let mut extends = Vec::new();
        for child in named_children(node) {
            if child.kind() == "extends_type_clause" {
                for base in named_children(child) {
                    if base.kind() != "comment" {
                        extends.push(self.text(base).to_string());
                    }
                }
            }
        }

        let (call, construct) = match node.child_by_field_name("body") {
            Some(body) => self.bind_type_members(body, symbol),
            None => (Vec::new(), Vec::new()),
        };

        self.push_decl(symbol, DeclData {
            detail: DeclDetail::Interface { call, construct, extends },
            doc,
            is_static: false,
            kind: DeclarationKind::Interface,
            optional: false,
            position: position(node),
            text: self.text(node).to_string(),
        });
        return Some(symbol);
    }

    /// Class or interface method; accessors bind as properties.
    fn bind_method(&mut self, member: Node<'_>, owner: SymbolId, name: &str) {
        let is_static = has_token(member, "static");
        let scope = if is_static { Scope::Statics(owner) } else { Scope::Members(owner) };
        let symbol = self.declare(scope, name);
        let doc = doc_comment(member, self.source);

        let (kind, detail) = if has_token(member, "get") || has_token(member, "set") {
            let annotation = self.annotation(member, "return_type").or_else(|| {
                return self
                    .parameters(member, doc.as_ref())
                    .into_iter()
                    .next()
                    .and_then(|p| return p.type_text);
            });
            (DeclarationKind::Property, DeclDetail::Value {
                annotation,
                value: ValueExpr::Unknown,
            })
        } else {
            let signature = self.signature(member, doc.as_ref());
            (DeclarationKind::Method, DeclDetail::Callable {
                has_body: member.child_by_field_name("body").is_some(),
                signature,
            })
        };

        self.push_decl(symbol, DeclData {
            detail,
            doc,
            is_static,
            kind,
            optional: has_token(member, "?"),
            position: position(member),
            text: self.text(member).to_string(),
        });
        return;
    }

    /// `namespace N { ... }`. Exported members (all members when ambient) become statics.
    fn bind_namespace(&mut self, node: Node<'_>, scope: Scope) -> Option<SymbolId> {
        let name_node = node.child_by_field_name("name")?;
        if name_node.kind() == "string" {
            return None;
        }
        let name = self.text(name_node).to_string();
        let symbol = self.declare(scope, &name);
        self.push_decl(symbol, DeclData {
            detail: DeclDetail::None,
            doc: doc_comment(node, self.source),
            is_static: false,
            kind: DeclarationKind::Module,
            optional: false,
            position: position(node),
            text: self.text(node).to_string(),
        });

        if let Some(body) = node.child_by_field_name("body") {
            for child in named_children(body) {
                if child.kind() == "comment" {
                    continue;
                }
                let target = if child.kind() == "export_statement" || self.ambient {
                    Scope::Statics(symbol)
                } else {
                    Scope::Detached
                };
                let _ = self.bind_statement(child, target);
            }
        }
        return Some(symbol);
    }

    /// One object literal member as a property of `scope`.
    fn bind_object_member(
        &mut self,
        member: Node<'_>,
        scope: Scope,
        kind: DeclarationKind,
    ) -> Option<SymbolId> {
        let doc = doc_comment(member, self.source);
        let (name, value) = match member.kind() {
            "method_definition" => {
                let name = self.field_name(member, "name")?;
                let signature = self.signature(member, doc.as_ref());
                (name, ValueExpr::Method(signature))
            },
            "pair" => {
                let name = self.field_name(member, "key")?;
                let value_node = member.child_by_field_name("value")?;
                let value = self.value_expr(value_node, doc.as_ref(), &name);
                (name, value)
            },
            "shorthand_property_identifier" => {
                let name = self.text(member).to_string();
                (name.clone(), ValueExpr::Identifier(name))
            },
            _ => return None,
        };

        let symbol = self.declare(scope, &name);
        let annotation = self.js_type(doc.as_ref());
        self.push_decl(symbol, DeclData {
            detail: DeclDetail::Value { annotation, value },
            doc,
            is_static: false,
            kind,
            optional: false,
            position: position(member),
            text: self.text(member).to_string(),
        });
        return Some(symbol);
    }

    /// `constructor(private readonly x: T)` declares an instance property.
    fn bind_parameter_properties(&mut self, constructor: Node<'_>, owner: SymbolId) {
        let Some(list) = constructor.child_by_field_name("parameters") else {
            return;
        };
        for param in named_children(list) {
            let is_property = named_children(param)
                .iter()
                .any(|c| return c.kind() == "accessibility_modifier")
                || has_token(param, "readonly");
            if !is_property {
                continue;
            }
            let Some(pattern) = param.child_by_field_name("pattern") else {
                continue;
            };
            let name = self.text(pattern).to_string();
            let symbol = self.declare(Scope::Members(owner), &name);
            let annotation = self.annotation(param, "type");
            self.push_decl(symbol, DeclData {
                detail: DeclDetail::Value {
                    annotation,
                    value: ValueExpr::Unknown,
                },
                doc: None,
                is_static: false,
                kind: DeclarationKind::Property,
                optional: param.kind() == "optional_parameter",
                position: position(param),
                text: self.text(param).to_string(),
            });
        }
        return;
    }

    /// Walk the unit's top-level statements.
    fn bind_program(&mut self, root: Node<'_>) {
        let top = if self.module_kind == ModuleKind::Script {
            Scope::Globals
        } else {
            Scope::Locals
        };
        let mut before_first_statement = true;

        for node in named_children(root) {
            match node.kind() {
                "comment" => {
                    if before_first_statement {
                        self.comments.push(self.text(node).to_string());
                    }
                },
                "hash_bang_line" => {},
                _ => {
                    before_first_statement = false;
                    let (statement, _) = self.bind_statement(node, top);
                    self.statements.push(statement);
                    if self.module_kind == ModuleKind::CommonJs
                        && node.kind() == "expression_statement"
                    {
                        self.bind_commonjs_export(node);
                    }
                },
            }
        }
        return;
    }

    /// Bind one statement, returning its view and the symbols it declared.
    fn bind_statement(&mut self, node: Node<'_>, scope: Scope) -> (Statement, Vec<SymbolId>) {
        return match node.kind() {
            "abstract_class_declaration" | "class_declaration" => {
                let Some(name) = self.field_name(node, "name") else {
                    return (Statement::Other, Vec::new());
                };
                let symbol = self.bind_class(node, scope, &name);
                let statement = Statement::ClassDeclaration {
                    name,
                    node: self.declaration_node(symbol),
                };
                (statement, vec![symbol])
            },
            "ambient_declaration" => self.bind_ambient(node, scope),
            "enum_declaration" => {
                (Statement::Other, self.bind_enum(node, scope).into_iter().collect())
            },
            "export_statement" => self.bind_export(node, scope),
            "expression_statement" => {
                let Some(expression) = first_named(node) else {
                    return (Statement::Other, Vec::new());
                };
                if matches!(expression.kind(), "internal_module" | "module") {
                    let symbols = self.bind_namespace(expression, scope).into_iter().collect();
                    return (Statement::Other, symbols);
                }
                (Statement::Expression(self.expression(expression)), Vec::new())
            },
            "function_declaration" | "function_signature" | "generator_function_declaration" => {
                let Some(name) = self.field_name(node, "name") else {
                    return (Statement::Other, Vec::new());
                };
                let symbol = self.bind_function(node, scope, &name);
                let statement = Statement::FunctionDeclaration {
                    name,
                    node: self.declaration_node(symbol),
                };
                (statement, vec![symbol])
            },
            "import_statement" => {
                self.bind_import(node);
                (Statement::Other, Vec::new())
            },
            "interface_declaration" => {
                (Statement::Other, self.bind_interface(node, scope).into_iter().collect())
            },
            "internal_module" | "module" => {
                (Statement::Other, self.bind_namespace(node, scope).into_iter().collect())
            },
            "lexical_declaration" | "variable_declaration" => {
                let (declarators, symbols) = self.bind_variables(node, scope);
                (Statement::VariableStatement(declarators), symbols)
            },
            "type_alias_declaration" => {
                (Statement::Other, self.bind_type_alias(node, scope).into_iter().collect())
            },
            _ => (Statement::Other, Vec::new()),
        };
    }

    /// JS constructors declare instance properties through `this.x = value`.
    fn bind_this_assignments(&mut self, constructor: Node<'_>, owner: SymbolId) {
        let Some(body) = constructor.child_by_field_name("body") else {
            return;
        };
        for statement in named_children(body) {
            if statement.kind() != "expression_statement" {
                continue;
            }
            let Some(assignment) =
                first_named(statement).filter(|n| return n.kind() == "assignment_expression")
            else {
                continue;
            };
            let (Some(left), Some(right)) = (
                assignment.child_by_field_name("left"),
                assignment.child_by_field_name("right"),
            ) else {
                continue;
            };
            let is_this_member = left.kind() == "member_expression"
                && left.child_by_field_name("object").is_some_and(|o| return o.kind() == "this");
            if !is_this_member {
                continue;
            }
            let Some(name) = self.field_name(left, "property") else {
                continue;
            };
            if self.find_child(owner, &name, false).is_some() {
                continue;
            }
            let symbol = self.declare(Scope::Members(owner), &name);
            let doc = doc_comment(statement, self.source);
            let annotation = self.js_type(doc.as_ref());
            let value = self.value_expr(right, doc.as_ref(), &name);
            self.push_decl(symbol, DeclData {
                detail: DeclDetail::Value { annotation, value },
                doc,
                is_static: false,
                kind: DeclarationKind::Property,
                optional: false,
                position: position(left),
                text: self.text(statement).to_string(),
            });
        }
        return;
    }

    /// `type T = ...`. Object type literals bind their members.
    fn bind_type_alias(&mut self, node: Node<'_>, scope: Scope) -> Option<SymbolId> {
        let name = self.field_name(node, "name")?;
        let symbol = self.declare(scope, &name);
        let value_node = node.child_by_field_name("value");
        let object = value_node.is_some_and(|v| return v.kind() == "object_type");
        if let Some(value) = value_node
            && object
        {
            let _ = self.bind_type_members(value, symbol);
        }
        let value = value_node
            .map_or_else(|| return "any".to_string(), |v| return self.text(v).to_string());
        self.push_decl(symbol, DeclData {
            detail: DeclDetail::TypeAlias { object, value },
            doc: doc_comment(node, self.source),
            is_static: false,
            kind: DeclarationKind::TypeAlias,
            optional: false,
            position: position(node),
            text: self.text(node).to_string(),
        });
        return Some(symbol);
    }

    /// Members of an interface body or object type. Returns the call and
    /// construct signatures, which are not named members.
    fn bind_type_members(
        &mut self,
        body: Node<'_>,
        owner: SymbolId,
    ) -> (Vec<SignatureId>, Vec<SignatureId>) {
        let mut call = Vec::new();
        let mut construct = Vec::new();

        for member in named_children(body) {
            match member.kind() {
                "call_signature" => {
                    let doc = doc_comment(member, self.source);
                    call.push(self.signature(member, doc.as_ref()));
                },
                "construct_signature" => {
                    let doc = doc_comment(member, self.source);
                    let params = self.parameters(member, doc.as_ref());
                    let annotation = self
                        .object_annotation(member, "type")
                        .unwrap_or_else(|| return "any".to_string());
                    let returns = ReturnSpec::Annotation(annotation);
                    let type_parameters = member
                        .child_by_field_name("type_parameters")
                        .map(|n| return self.text(n).to_string());
                    construct.push(self.new_signature(SignatureData {
                        params,
                        returns,
                        type_parameters,
                        unit: self.unit,
                    }));
                },
                "method_signature" => {
                    if let Some(name) = self.field_name(member, "name") {
                        self.bind_method(member, owner, &name);
                    }
                },
                "property_signature" => {
                    let Some(name) = self.field_name(member, "name") else {
                        continue;
                    };
                    let symbol = self.declare(Scope::Members(owner), &name);
                    let annotation = self.object_annotation(member, "type");
                    self.push_decl(symbol, DeclData {
                        detail: DeclDetail::Value {
                            annotation,
                            value: ValueExpr::Unknown,
                        },
                        doc: doc_comment(member, self.source),
                        is_static: false,
                        kind: DeclarationKind::Property,
                        optional: has_token(member, "?"),
                        position: position(member),
                        text: self.text(member).to_string(),
                    });
                },
                _ => {},
            }
        }
        return (call, construct);
    }

    /// A named binding whose declaration kind is decided by the caller, typed by its value.
    fn bind_value_declaration(
        &mut self,
        name: &str,
        value: Node<'_>,
        doc: Option<DocComment>,
        declaration: Node<'_>,
        kind: DeclarationKind,
    ) -> SymbolId {
        let symbol = self.declare(Scope::Detached, name);
        let annotation = self.js_type(doc.as_ref());
        let value = self.value_expr(value, doc.as_ref(), name);
        self.push_decl(symbol, DeclData {
            detail: DeclDetail::Value { annotation, value },
            doc,
            is_static: false,
            kind,
            optional: false,
            position: position(declaration),
            text: self.text(declaration).to_string(),
        });
        return symbol;
    }

    /// `var`/`let`/`const` declarators with plain identifier names.
    fn bind_variables(
        &mut self,
        node: Node<'_>,
        scope: Scope,
    ) -> (Vec<VariableDeclarator>, Vec<SymbolId>) {
        let mut declarators = Vec::new();
        let mut symbols = Vec::new();

        for declarator in named_children(node) {
            if declarator.kind() != "variable_declarator" {
                continue;
            }
            let Some(name_node) = declarator.child_by_field_name("name") else {
                continue;
            };
            if name_node.kind() != "identifier" {
                continue;
            }
            let name = self.text(name_node).to_string();
            let symbol = self.declare(scope, &name);
            let doc = doc_comment(declarator, self.source);
            let value_node = declarator.child_by_field_name("value");
            let annotation = self
                .object_annotation(declarator, "type")
                .or_else(|| return self.js_type(doc.as_ref()));
            let value = value_node
                .map_or(ValueExpr::Unknown, |v| return self.value_expr(v, doc.as_ref(), &name));

            self.push_decl(symbol, DeclData {
                detail: DeclDetail::Value { annotation, value },
                doc,
                is_static: false,
                kind: DeclarationKind::Variable,
                optional: false,
                position: position(declarator),
                text: self.text(node).to_string(),
            });

            let initializer = value_node.map(|v| return self.expression(v));
            declarators.push(VariableDeclarator {
                initializer,
                name,
                node: self.declaration_node(symbol),
            });
            symbols.push(symbol);
        }
        return (declarators, symbols);
    }

    /// Text of the `extends` expression of a class.
    fn class_extends(&self, node: Node<'_>) -> Option<String> {
        for child in named_children(node) {
            if child.kind() != "class_heritage" {
                continue;
            }
            for clause in named_children(child) {
                if clause.kind() != "extends_clause" {
                    continue;
                }
                let value =
                    clause.child_by_field_name("value").or_else(|| return first_named(clause))?;
                return Some(self.text(value).to_string());
            }
        }
        return None;
    }

    /// Register a node that declares `symbol`.
    fn declaration_node(&mut self, symbol: SymbolId) -> NodeId {
        let id = NodeId(self.program.nodes.len());
        self.program.nodes.push(NodeTarget::Declaration(symbol));
        return id;
    }

    /// Symbol for `name` in `scope`, merging with an existing one of the same name.
    fn declare(&mut self, scope: Scope, name: &str) -> SymbolId {
        let existing = match scope {
            Scope::Detached => None,
            Scope::Globals => self.program.globals.get(name).copied(),
            Scope::Locals => self.locals.get(name).copied(),
            Scope::Members(owner) => self.find_child(owner, name, false),
            Scope::Statics(owner) => self.find_child(owner, name, true),
        };
        if let Some(symbol) = existing {
            return symbol;
        }

        let symbol = SymbolId(self.program.symbols.len());
        let parent = match scope {
            Scope::Members(owner) | Scope::Statics(owner) => Some(owner),
            Scope::Detached | Scope::Globals | Scope::Locals => None,
        };
        self.program.symbols.push(SymbolData {
            alias: None,
            declarations: Vec::new(),
            members: Vec::new(),
            name: name.to_string(),
            parent,
            statics: Vec::new(),
            unit: self.unit,
        });

        match scope {
            Scope::Detached => {},
            Scope::Globals => {
                self.program.globals.insert(name.to_string(), symbol);
            },
            Scope::Locals => {
                self.locals.insert(name.to_string(), symbol);
            },
            Scope::Members(owner) => {
                if let Some(data) = self.program.symbols.get_mut(owner.0) {
                    data.members.push(symbol);
                }
            },
            Scope::Statics(owner) => {
                if let Some(data) = self.program.symbols.get_mut(owner.0) {
                    data.statics.push(symbol);
                }
            },
        }
        return symbol;
    }

    /// Statement-view expression.
    fn expression(&mut self, node: Node<'_>) -> Expression {
        return match node.kind() {
            "assignment_expression" => {
                let (Some(left), Some(right)) =
                    (node.child_by_field_name("left"), node.child_by_field_name("right"))
                else {
                    return Expression::Other;
                };
                Expression::Assignment {
                    left: Box::new(self.expression(left)),
                    right: Box::new(self.expression(right)),
                }
            },
            "identifier" => {
                let name = self.text(node).to_string();
                let reference = self.reference_node(&name);
                Expression::Identifier { name, node: reference }
            },
            "member_expression" => {
                let (Some(object), Some(property)) =
                    (node.child_by_field_name("object"), node.child_by_field_name("property"))
                else {
                    return Expression::Other;
                };
                Expression::Member {
                    object: Box::new(self.expression(object)),
                    property: self.text(property).to_string(),
                }
            },
            "object" => {
                let members = named_children(node)
                    .into_iter()
                    .map(|m| return self.object_member(m))
                    .collect();
                Expression::Object(members)
            },
            "parenthesized_expression" => {
                first_named(node).map_or(Expression::Other, |inner| return self.expression(inner))
            },
            _ => Expression::Other,
        };
    }

    /// Name-like field text with quotes removed.
    fn field_name(&self, node: Node<'_>, field: &str) -> Option<String> {
        let child = node.child_by_field_name(field)?;
        return Some(unquote(self.text(child)).to_string());
    }

    /// Member or static of `owner` named `name`.
    fn find_child(&self, owner: SymbolId, name: &str, is_static: bool) -> Option<SymbolId> {
        let data = self.program.symbols.get(owner.0)?;
        let list = if is_static { &data.statics } else { &data.members };
        return list
            .iter()
            .copied()
            .find(|id| {
                return self.program.symbols.get(id.0).is_some_and(|s| return s.name == name);
            });
    }

    /// Type from a JSDoc `@type` tag, JavaScript only.
    fn js_type(&self, doc: Option<&DocComment>) -> Option<String> {
        if !self.is_js {
            return None;
        }
        return doc.and_then(|d| return d.type_text.clone());
    }

    /// Register a signature.
    fn new_signature(&mut self, data: SignatureData) -> SignatureId {
        let id = SignatureId(self.program.signatures.len());
        self.program.signatures.push(data);
        return id;
    }

    /// [`Self::annotation`] that also binds the members of a written object
    /// type. The checker finds them again by `(unit, text)`.
    fn object_annotation(&mut self, node: Node<'_>, field: &str) -> Option<String> {
        let text = self.annotation(node, field)?;
        let written = node.child_by_field_name(field).and_then(|annotation| {
            if annotation.kind() == "object_type" {
                return Some(annotation);
            }
            return first_named(annotation).filter(|t| return t.kind() == "object_type");
        });
        let key = (self.unit, text.clone());
        if let Some(object) = written
            && !self.program.object_types.contains_key(&key)
        {
            let symbol = self.declare(Scope::Detached, "__type");
            let _ = self.bind_type_members(object, symbol);
            self.program.object_types.insert(key, symbol);
        }
        return Some(text);
    }

    /// Statement-view object member.
    fn object_member(&mut self, member: Node<'_>) -> ObjectMember {
        return match member.kind() {
            "pair" => {
                let (Some(key), Some(value)) =
                    (self.field_name(member, "key"), member.child_by_field_name("value"))
                else {
                    return ObjectMember::Other;
                };
                ObjectMember::Property {
                    key,
                    value: self.expression(value),
                }
            },
            "shorthand_property_identifier" => {
                let name = self.text(member).to_string();
                let node = self.reference_node(&name);
                ObjectMember::Shorthand { name, node }
            },
            _ => ObjectMember::Other,
        };
    }

    /// One formal parameter.
    fn parameter(&self, param: Node<'_>, doc: Option<&DocComment>) -> Option<ParamData> {
        if !matches!(param.kind(), "optional_parameter" | "required_parameter") {
            return None;
        }
        let pattern = param.child_by_field_name("pattern")?;
        let raw = self.text(pattern);
        let rest = pattern.kind() == "rest_pattern" || raw.starts_with("...");
        let name = raw.trim_start_matches("...").to_string();
        let default = param.child_by_field_name("value");
        let documented = if self.is_js { doc.and_then(|d| return d.param(&name)) } else { None };

        let type_text = self
            .annotation(param, "type")
            .or_else(|| return documented.and_then(|d| return d.type_text.clone()))
            .or_else(|| {
                return default.and_then(|v| return literal_type(v.kind())).map(str::to_string);
            });
        let optional = param.kind() == "optional_parameter"
            || default.is_some()
            || documented.is_some_and(|d| return d.optional);

        return Some(ParamData {
            name,
            optional,
            rest,
            type_text,
        });
    }

    /// Parameters of a function-like node.
    fn parameters(&self, node: Node<'_>, doc: Option<&DocComment>) -> Vec<ParamData> {
        if let Some(list) = node.child_by_field_name("parameters") {
            return named_children(list)
                .into_iter()
                .filter_map(|p| return self.parameter(p, doc))
                .collect();
        }
        if let Some(single) = node.child_by_field_name("parameter") {
            let name = self.text(single).to_string();
            let type_text = if self.is_js {
                doc.and_then(|d| return d.param(&name)).and_then(|p| return p.type_text.clone())
            } else {
                None
            };
            return vec![ParamData {
                name,
                optional: false,
                rest: false,
                type_text,
            }];
        }
        return Vec::new();
    }

    /// Append a declaration to a symbol.
    fn push_decl(&mut self, symbol: SymbolId, decl: DeclData) {
        if let Some(data) = self.program.symbols.get_mut(symbol.0) {
            data.declarations.push(decl);
        }
        return;
    }

    /// Record an export, first binding of a name wins.
    fn push_export(&mut self, name: &str, symbol: SymbolId) {
        let exists = self
            .exports
            .iter()
            .any(|slot| {
                return matches!(slot, ExportSlot::Named { name: existing, .. } if existing == name);
            });
        if !exists {
            self.exports.push(ExportSlot::Named {
                name: name.to_string(),
                symbol,
            });
        }
        return;
    }

    /// Register an identifier resolved by name in this unit.
    fn reference_node(&mut self, name: &str) -> NodeId {
        let id = NodeId(self.program.nodes.len());
        self.program.nodes.push(NodeTarget::Reference {
            name: name.to_string(),
            unit: self.unit,
        });
        return id;
    }

    /// How a function-like node's return type is obtained.
    fn return_spec(&mut self, node: Node<'_>, doc: Option<&DocComment>) -> ReturnSpec {
        if let Some(annotation) = self.object_annotation(node, "return_type") {
            return ReturnSpec::Annotation(annotation);
        }
        if self.is_js
            && let Some(returns) = doc.and_then(|d| return d.returns.clone())
        {
            return ReturnSpec::Annotation(returns);
        }
        let Some(body) = node.child_by_field_name("body") else {
            return ReturnSpec::Annotation("any".to_string());
        };
        let is_async = has_token(node, "async");
        let expr = if body.kind() == "statement_block" {
            first_return(body).map(|e| return self.value_expr(e, None, ""))
        } else {
            Some(self.value_expr(body, None, ""))
        };
        return ReturnSpec::Inferred { expr, is_async };
    }

    /// Build a signature from a function-like node.
    fn signature(&mut self, node: Node<'_>, doc: Option<&DocComment>) -> SignatureId {
        let params = self.parameters(node, doc);
        let returns = self.return_spec(node, doc);
        let type_parameters = node
            .child_by_field_name("type_parameters")
            .map(|n| return self.text(n).to_string());
        return self.new_signature(SignatureData {
            params,
            returns,
            type_parameters,
            unit: self.unit,
        });
    }

    /// Declared name of a symbol.
    fn symbol_name(&self, symbol: SymbolId) -> String {
        return self
            .program
            .symbols
            .get(symbol.0)
            .map(|s| return s.name.clone())
            .unwrap_or_default();
    }

    /// Source text of a node.
    fn text(&self, node: Node<'_>) -> &'s str {
        return node.utf8_text(self.source.as_bytes()).unwrap_or("");
    }

    /// Reduce an initializer for type inference. Nested classes, objects and
    /// functions are bound as detached symbols.
    fn value_expr(
        &mut self,
        node: Node<'_>,
        doc: Option<&DocComment>,
        name_hint: &str,
    ) -> ValueExpr {
        if let Some(literal) = literal_type(node.kind()) {
            return ValueExpr::Literal(literal);
        }
        if FUNCTION_EXPRESSIONS.contains(&node.kind()) {
            return ValueExpr::Function(self.signature(node, doc));
        }
        return match node.kind() {
            "array" => ValueExpr::Array,
            "call_expression" => {
                let Some(callee) = node.child_by_field_name("function") else {
                    return ValueExpr::Unknown;
                };
                let callee_text = self.text(callee).to_string();
                if callee_text == "require"
                    && let Some(arguments) = node.child_by_field_name("arguments")
                    && let Some(first) = first_named(arguments)
                    && first.kind() == "string"
                {
                    let specifier = unquote(self.text(first)).to_string();
                    self.add_specifier(&specifier);
                    return ValueExpr::Require(specifier);
                }
                ValueExpr::Call(callee_text)
            },
            "class" => {
                let name =
                    self.field_name(node, "name").unwrap_or_else(|| return name_hint.to_string());
                ValueExpr::Class(self.bind_class(node, Scope::Detached, &name))
            },
            "identifier" => ValueExpr::Identifier(self.text(node).to_string()),
            "new_expression" => node
                .child_by_field_name("constructor")
                .map_or(ValueExpr::Unknown, |c| return ValueExpr::New(self.text(c).to_string())),
            "object" => {
                let symbol = self.declare(Scope::Detached, "__object");
                for member in named_children(node) {
                    let _ = self.bind_object_member(
                        member,
                        Scope::Members(symbol),
                        DeclarationKind::ObjectProperty,
                    );
                }
                ValueExpr::Object(symbol)
            },
            "parenthesized_expression" => {
                first_named(node).map_or(ValueExpr::Unknown, |inner| {
                    return self.value_expr(inner, doc, name_hint);
                })
            },
            _ => ValueExpr::Unknown,
        };
    }
}

// ── Free helpers ──────────────────────────────────────────────────────

/// Classify a CommonJS assignment target by its source text.
fn commonjs_target(left: &str) -> Option<ExportTarget> {
    if left == "module.exports" {
        return Some(ExportTarget::Whole);
    }
    let name = left
        .strip_prefix("module.exports.")
        .or_else(|| return left.strip_prefix("exports."))?;
    if name.is_empty() || name.contains(['.', '[']) {
        return None;
    }
    return Some(ExportTarget::Named(name.to_string()));
}

/// ESM if any `import`/`export` statement exists, CommonJS if a top-level
/// export assignment exists, script otherwise.
fn detect_module_kind(root: Node<'_>, source: &str) -> ModuleKind {
    let mut commonjs = false;
    for child in named_children(root) {
        match child.kind() {
            "export_statement" | "import_statement" => return ModuleKind::Esm,
            "expression_statement" => {
                let target = first_named(child)
                    .filter(|n| return n.kind() == "assignment_expression")
                    .and_then(|n| return n.child_by_field_name("left"))
                    .and_then(|left| return left.utf8_text(source.as_bytes()).ok());
                if target.is_some_and(|t| return commonjs_target(t).is_some()) {
                    commonjs = true;
                }
            },
            _ => {},
        }
    }
    return if commonjs { ModuleKind::CommonJs } else { ModuleKind::Script };
}

/// Nearest `/** ... */` comment before a declaration, climbing through
/// export/declare/statement wrappers. A plain comment in between ends the search.
fn doc_comment(node: Node<'_>, source: &str) -> Option<DocComment> {
    let mut current = node;
    loop {
        let mut previous = current.prev_sibling();
        let mut saw_comment = false;
        while let Some(sibling) = previous
            && sibling.kind() == "comment"
        {
            saw_comment = true;
            let text = sibling.utf8_text(source.as_bytes()).unwrap_or("");
            if text.starts_with("/**") {
                return Some(jsdoc::parse(text));
            }
            previous = sibling.prev_sibling();
        }
        if saw_comment {
            return None;
        }
        let parent = current.parent()?;
        if !DOC_WRAPPERS.contains(&parent.kind()) {
            return None;
        }
        current = parent;
    }
}

/// First named child that is not a comment.
fn first_named(node: Node<'_>) -> Option<Node<'_>> {
    return named_children(node).into_iter().find(|c| return c.kind() != "comment");
}

/// First `return <expr>` in a body, not descending into nested functions.
fn first_return(body: Node<'_>) -> Option<Node<'_>> {
    let mut stack = vec![body];
    while let Some(node) = stack.pop() {
        if node.kind() == "return_statement" {
            if let Some(expr) = first_named(node) {
                return Some(expr);
            }
            continue;
        }
        if node != body && RETURN_BOUNDARIES.contains(&node.kind()) {
            continue;
        }
        let mut children = named_children(node);
        children.reverse();
        stack.extend(children);
    }
    return None;
}

/// Whether a node has a direct child token of the given kind.
fn has_token(node: Node<'_>, token: &str) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|c| return c.kind() == token);
    return found;
}

/// Primitive type of a literal node kind.
fn literal_type(kind: &str) -> Option<&'static str> {
    return match kind {
        "false" | "true" => Some("boolean"),
        "null" => Some("null"),
        "number" => Some("number"),
        "regex" => Some("RegExp"),
        "string" | "template_string" => Some("string"),
        "undefined" => Some("undefined"),
        _ => None,
    };
}

/// Named children as an owned list.
fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    let children = node.named_children(&mut cursor).collect();
    return children;
}

/// Zero-based start position of a node.
fn position(node: Node<'_>) -> Position {
    let point = node.start_position();
    return Position {
        column: u32::try_from(point.column).unwrap_or(u32::MAX),
        line: u32::try_from(point.row).unwrap_or(u32::MAX),
    };
}

/// Strip string quotes from a name.
fn unquote(text: &str) -> &str {
    return text.trim_matches(|c| return c == '"' || c == '\'' || c == '`');
}
