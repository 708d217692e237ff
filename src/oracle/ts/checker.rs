//! `Checker` over a bound program: alias following, export tables, light type
//! inference, and type/signature rendering.

use std::collections::HashSet;
use std::path::Path;

use super::{
    AliasTarget, DeclData, DeclDetail, ExportSlot, NodeTarget, ParamData, ReturnSpec, SignatureData,
    SymbolData, TsContext, TypeData, ValueExpr,
};
use crate::oracle::{
    Checker, Declaration, DeclarationKind, ExportEntry, JsDocTag, NodeId, SignatureId, Statement,
    SymbolId, TypeId, UnitId, ValueShape,
};

/// Recursion limit for alias chains, inference, and rendering.
const MAX_DEPTH: usize = 16;

/// Keyword types rendered as written.
const PRIMITIVES: [&str; 14] = [
    "any",
    "bigint",
    "boolean",
    "never",
    "null",
    "number",
    "object",
    "string",
    "symbol",
    "this",
    "undefined",
    "unknown",
    "void",
    "Function",
];

impl TsContext {
    /// Call signatures hidden behind an implementation: when overloads exist,
    /// the body-bearing declaration is not callable from outside.
    fn callable_signatures(&self, symbol: SymbolId) -> Vec<SignatureId> {
        let Some(data) = self.symbol(symbol) else {
            return Vec::new();
        };
        let callables: Vec<(bool, SignatureId)> = data
            .declarations
            .iter()
            .filter_map(|decl| {
                return match decl.detail {
                    DeclDetail::Callable { has_body, signature } => Some((has_body, signature)),
                    _ => None,
                };
            })
            .collect();
        let has_overloads =
            callables.len() > 1 && callables.iter().any(|(has_body, _)| return !has_body);
        return callables
            .into_iter()
            .filter(|(has_body, _)| return !has_overloads || !has_body)
            .map(|(_, signature)| return signature)
            .collect();
    }

    /// Own members (or statics) of `symbol`, then inherited ones not shadowed.
    fn collect_members(
        &self,
        symbol: SymbolId,
        is_static: bool,
        out: &mut Vec<SymbolId>,
        names: &mut HashSet<String>,
        depth: usize,
    ) {
        if depth > MAX_DEPTH {
            return;
        }
        let Some(data) = self.symbol(symbol) else {
            return;
        };
        let own = if is_static { &data.statics } else { &data.members };
        for &member in own {
            if let Some(member_data) = self.symbol(member)
                && names.insert(member_data.name.clone())
            {
                out.push(member);
            }
        }

        for base in self.base_types(data) {
            if let Some(base_symbol) = self.resolve_type_name(data.unit, &base) {
                self.collect_members(base_symbol, is_static, out, names, depth.saturating_add(1));
            }
        }
        return;
    }

    /// `extends` texts of every class and interface declaration.
    fn base_types(&self, data: &SymbolData) -> Vec<String> {
        let mut bases = Vec::new();
        for decl in &data.declarations {
            match &decl.detail {
                DeclDetail::Class { extends: Some(base), .. } => bases.push(base.clone()),
                DeclDetail::Interface { extends, .. } => bases.extend(extends.iter().cloned()),
                _ => {},
            }
        }
        return bases;
    }

    /// Collect a unit's exports: named slots first, then `export *` targets.
    fn collect_exports(
        &self,
        unit: UnitId,
        include_default: bool,
        entries: &mut Vec<ExportEntry>,
        visited: &mut HashSet<UnitId>,
    ) {
        let Some(slots) = self.program.units.get(unit.0).and_then(|u| return u.exports.as_ref())
        else {
            return;
        };
        for slot in slots {
            if let ExportSlot::Named { name, symbol } = slot {
                if !include_default && name == "default" {
                    continue;
                }
                if entries.iter().any(|e| return &e.name == name) {
                    continue;
                }
                let resolved = self.resolve_alias(*symbol, 0).unwrap_or(*symbol);
                entries.push(ExportEntry {
                    name: name.clone(),
                    symbol: resolved,
                });
            }
        }
        for slot in slots {
            if let ExportSlot::Star(specifier) = slot
                && let Some(target) = self.module_ref(unit, specifier)
                && visited.insert(target)
            {
                self.collect_exports(target, false, entries, visited);
            }
        }
        return;
    }

    /// Raw export slot `name` of `unit`, following `export *`.
    fn export_named(
        &self,
        unit: UnitId,
        name: &str,
        visited: &mut HashSet<UnitId>,
    ) -> Option<SymbolId> {
        if !visited.insert(unit) {
            return None;
        }
        let slots = self.program.units.get(unit.0)?.exports.as_ref()?;
        for slot in slots {
            if let ExportSlot::Named { name: exported, symbol } = slot
                && exported == name
            {
                return Some(*symbol);
            }
        }
        if name == "default" {
            return None;
        }
        for slot in slots {
            if let ExportSlot::Star(specifier) = slot
                && let Some(target) = self.module_ref(unit, specifier)
                && let Some(found) = self.export_named(target, name, visited)
            {
                return Some(found);
            }
        }
        return None;
    }

    /// Whether any declaration of `symbol` has one of `kinds`.
    fn has_kind(&self, symbol: SymbolId, kinds: &[DeclarationKind]) -> bool {
        return self
            .symbol(symbol)
            .is_some_and(|data| {
                return data.declarations.iter().any(|d| return kinds.contains(&d.kind));
            });
    }

    /// Type of an initializer.
    fn infer_value(&self, value: &ValueExpr, unit: UnitId, depth: usize) -> TypeId {
        if depth > MAX_DEPTH {
            return self.intern(TypeData::Any);
        }
        let next = depth.saturating_add(1);
        return match value {
            ValueExpr::Array => self.intern(TypeData::Text("any[]".to_string())),
            ValueExpr::Call(callee) => {
                let Some(target) = self.resolve_name(unit, callee) else {
                    return self.intern(TypeData::Any);
                };
                let callee_type = self.type_of(target, next);
                match self.call_signatures(callee_type).first() {
                    Some(signature) => self.return_type_of_signature(*signature),
                    None => self.intern(TypeData::Any),
                }
            },
            ValueExpr::Class(symbol) => self.intern(TypeData::ClassStatic(*symbol)),
            ValueExpr::Function(signature) | ValueExpr::Method(signature) => {
                self.intern(TypeData::Signature(*signature))
            },
            ValueExpr::Identifier(name) => {
                if name == "undefined" {
                    return self.intern(TypeData::Primitive("undefined".to_string()));
                }
                match self.resolve_name(unit, name) {
                    Some(target) => self.type_of(target, next),
                    None => self.intern(TypeData::Any),
                }
            },
            ValueExpr::Literal(literal) => self.resolve_annotation(literal, unit, next),
            ValueExpr::New(constructor) => {
                let base = constructor.split('<').next().unwrap_or(constructor).trim();
                let Some(target) = self.resolve_name(unit, base) else {
                    return self.intern(TypeData::Any);
                };
                if self.has_kind(target, &[DeclarationKind::Class]) {
                    return self.intern(TypeData::ClassInstance(target));
                }
                let constructor_type = self.type_of(target, next);
                match self.construct_signatures(constructor_type).first() {
                    Some(signature) => self.return_type_of_signature(*signature),
                    None => self.intern(TypeData::Any),
                }
            },
            ValueExpr::Object(symbol) => self.intern(TypeData::Object(*symbol)),
            ValueExpr::Require(specifier) => match self.module_ref(unit, specifier) {
                Some(target) => self.intern(TypeData::ModuleNamespace(target)),
                None => self.intern(TypeData::Any),
            },
            ValueExpr::Unknown => self.intern(TypeData::Any),
        };
    }

    /// Intern a type.
    fn intern(&self, data: TypeData) -> TypeId {
        let mut table = self.types.borrow_mut();
        if let Some(id) = table.ids.get(&data) {
            return *id;
        }
        let id = TypeId(table.types.len());
        table.types.push(data.clone());
        table.ids.insert(data, id);
        return id;
    }

    /// Unit a specifier imported by `unit` loaded as.
    fn module_ref(&self, unit: UnitId, specifier: &str) -> Option<UnitId> {
        return self
            .program
            .units
            .get(unit.0)
            .and_then(|u| return u.module_refs.get(specifier).copied().flatten());
    }

    /// Render `{ a: T; b?: U; }` over the given members.
    fn render_members(&self, members: &[SymbolId], depth: usize) -> String {
        if members.is_empty() {
            return "{}".to_string();
        }
        if depth > 2 {
            return "{ ... }".to_string();
        }
        let mut out = String::from("{ ");
        for &member in members {
            let name = self.symbol_name(member);
            let optional = self
                .symbol(member)
                .is_some_and(|d| return d.declarations.iter().any(|decl| return decl.optional));
            let member_type = self.type_of(member, depth);
            let rendered = self.render_type(member_type, depth.saturating_add(1));
            out.push_str(&format!("{name}{}: {rendered}; ", if optional { "?" } else { "" }));
        }
        out.push('}');
        return out;
    }

    /// Render one parameter list plus return type.
    fn render_signature(&self, signature: SignatureId, arrow: bool, depth: usize) -> String {
        let Some(data) = self.program.signatures.get(signature.0) else {
            return "() => any".to_string();
        };
        let params: Vec<String> = data.params.iter().map(render_param).collect();
        let return_type = self.return_type_of_signature(signature);
        let rendered_return = if depth > MAX_DEPTH {
            "any".to_string()
        } else {
            self.render_type(return_type, depth.saturating_add(1))
        };
        let type_parameters = data.type_parameters.as_deref().unwrap_or("");
        let separator = if arrow { " => " } else { ": " };
        return format!("{type_parameters}({}){separator}{rendered_return}", params.join(", "));
    }

    /// Depth-limited [`Checker::type_to_string`].
    fn render_type(&self, ty: TypeId, depth: usize) -> String {
        if depth > MAX_DEPTH {
            return "any".to_string();
        }
        return match self.type_data(ty) {
            TypeData::Alias { display, .. } => display,
            TypeData::Any => "any".to_string(),
            TypeData::Callable(_) => {
                let signatures = self.call_signatures(ty);
                match signatures.as_slice() {
                    [] => "Function".to_string(),
                    [single] => self.render_signature(*single, true, depth),
                    many => {
                        let rendered: Vec<String> = many
                            .iter()
                            .map(|s| return self.render_signature(*s, false, depth))
                            .collect();
                        format!("{{ {}; }}", rendered.join("; "))
                    },
                }
            },
            TypeData::ClassInstance(symbol) | TypeData::Declared(symbol) => {
                self.symbol_name(symbol)
            },
            TypeData::ClassStatic(symbol)
            | TypeData::EnumObject(symbol)
            | TypeData::Namespace(symbol) => {
                format!("typeof {}", self.symbol_name(symbol))
            },
            TypeData::ModuleNamespace(unit) => {
                let stem = self
                    .unit_path(unit)
                    .file_stem()
                    .map(|s| return s.to_string_lossy().to_string())
                    .unwrap_or_default();
                format!("typeof import(\"{stem}\")")
            },
            TypeData::Object(symbol) => {
                let members =
                    self.symbol(symbol).map(|d| return d.members.clone()).unwrap_or_default();
                self.render_members(&members, depth)
            },
            TypeData::Primitive(name) | TypeData::Text(name) => name,
            TypeData::Signature(signature) => self.render_signature(signature, true, depth),
        };
    }

    /// Follow an import/re-export chain to the symbol it names. `None` when a
    /// link cannot be resolved; namespace imports resolve to themselves.
    fn resolve_alias(&self, symbol: SymbolId, depth: usize) -> Option<SymbolId> {
        let mut current = symbol;
        for _ in depth..MAX_DEPTH {
            let data = self.symbol(current)?;
            let next = match &data.alias {
                None | Some(AliasTarget::Namespace(_)) => return Some(current),
                Some(AliasTarget::Local(name)) => {
                    let unit = self.program.units.get(data.unit.0)?;
                    unit.locals
                        .get(name)
                        .copied()
                        .or_else(|| return self.program.globals.get(name).copied())?
                },
                Some(AliasTarget::Import { name, specifier }) => {
                    let target = self.module_ref(data.unit, specifier)?;
                    let mut visited = HashSet::new();
                    self.export_named(target, name, &mut visited)?
                },
            };
            if next == current {
                return None;
            }
            current = next;
        }
        tracing::debug!(symbol = symbol.0, "alias chain too deep");
        return None;
    }

    /// Type written as `text`, resolved in `unit`.
    fn resolve_annotation(&self, text: &str, unit: UnitId, depth: usize) -> TypeId {
        let text = text.trim();
        if PRIMITIVES.contains(&text) {
            return self.intern(TypeData::Primitive(text.to_string()));
        }
        if depth > MAX_DEPTH {
            return self.intern(TypeData::Text(text.to_string()));
        }
        if let Some(target) = text.strip_prefix("typeof ") {
            return match self.resolve_name(unit, target.trim()) {
                Some(symbol) => self.type_of(symbol, depth.saturating_add(1)),
                None => self.intern(TypeData::Text(text.to_string())),
            };
        }

        if text.starts_with('{')
            && let Some(symbol) = self.program.object_types.get(&(unit, text.to_string())).copied()
        {
            let target = self.intern(TypeData::Object(symbol));
            return self.intern(TypeData::Alias {
                display: text.to_string(),
                target,
            });
        }

        let base = text.split('<').next().unwrap_or(text).trim();
        let is_reference = !base.is_empty()
            && base
                .chars()
                .all(|c| return c.is_alphanumeric() || c == '_' || c == '$' || c == '.');
        if is_reference && let Some(symbol) = self.resolve_type_name(unit, base) {
            let target = if self.has_kind(symbol, &[DeclarationKind::Class]) {
                Some(TypeData::ClassInstance(symbol))
            } else if self.has_kind(symbol, &[
                DeclarationKind::Enum,
                DeclarationKind::Interface,
                DeclarationKind::TypeAlias,
            ]) {
                Some(TypeData::Declared(symbol))
            } else {
                None
            };
            if let Some(target) = target {
                let target = self.intern(target);
                if base == text {
                    return target;
                }
                return self.intern(TypeData::Alias {
                    display: text.to_string(),
                    target,
                });
            }
        }
        return self.intern(TypeData::Text(text.to_string()));
    }

    /// Look up a possibly dotted name from `unit`: module scope, then globals,
    /// then statics or exports for each further segment. Aliases are followed.
    fn resolve_name(&self, unit: UnitId, name: &str) -> Option<SymbolId> {
        let mut segments = name.split('.');
        let first = segments.next()?;
        let local = self
            .program
            .units
            .get(unit.0)
            .and_then(|u| return u.locals.get(first).copied())
            .or_else(|| return self.program.globals.get(first).copied())?;
        let mut current = self.resolve_alias(local, 0).unwrap_or(local);

        for segment in segments {
            current = self.static_member(current, segment)?;
        }
        return Some(current);
    }

    /// [`Self::resolve_name`] for a type reference, type arguments dropped.
    fn resolve_type_name(&self, unit: UnitId, name: &str) -> Option<SymbolId> {
        let base = name.split('<').next().unwrap_or(name).trim();
        return self.resolve_name(unit, base);
    }

    /// Named static member or namespace export of `symbol`.
    fn static_member(&self, symbol: SymbolId, name: &str) -> Option<SymbolId> {
        let data = self.symbol(symbol)?;
        if let Some(AliasTarget::Namespace(specifier)) = &data.alias {
            let target = self.module_ref(data.unit, specifier)?;
            let mut visited = HashSet::new();
            let found = self.export_named(target, name, &mut visited)?;
            return Some(self.resolve_alias(found, 0).unwrap_or(found));
        }
        return data
            .statics
            .iter()
            .copied()
            .find(|id| return self.symbol(*id).is_some_and(|s| return s.name == name));
    }

    /// Symbol data by id.
    fn symbol(&self, symbol: SymbolId) -> Option<&SymbolData> {
        return self.program.symbols.get(symbol.0);
    }

    /// Cloned type data, `Any` for a stale id.
    fn type_data(&self, ty: TypeId) -> TypeData {
        return self.types.borrow().types.get(ty.0).cloned().unwrap_or(TypeData::Any);
    }

    /// Depth-limited [`Checker::type_of_symbol`].
    fn type_of(&self, symbol: SymbolId, depth: usize) -> TypeId {
        if depth > MAX_DEPTH {
            return self.intern(TypeData::Any);
        }
        let Some(data) = self.symbol(symbol) else {
            return self.intern(TypeData::Any);
        };

        if let Some(AliasTarget::Namespace(specifier)) = &data.alias {
            return match self.module_ref(data.unit, specifier) {
                Some(unit) => self.intern(TypeData::ModuleNamespace(unit)),
                None => self.intern(TypeData::Any),
            };
        }
        if data.alias.is_some() {
            return match self.resolve_alias(symbol, 0) {
                Some(target) if target != symbol => self.type_of(target, depth.saturating_add(1)),
                _ => self.intern(TypeData::Any),
            };
        }

        let decls = &data.declarations;
        let any_kind = |kinds: &[DeclarationKind]| {
            return decls.iter().any(|d| return kinds.contains(&d.kind));
        };

        if decls.iter().any(|d| return matches!(d.detail, DeclDetail::Callable { .. })) {
            return self.intern(TypeData::Callable(symbol));
        }
        if any_kind(&[DeclarationKind::Class]) {
            return self.intern(TypeData::ClassStatic(symbol));
        }
        if any_kind(&[DeclarationKind::Enum]) {
            return self.intern(TypeData::EnumObject(symbol));
        }
        if any_kind(&[DeclarationKind::Module]) {
            return self.intern(TypeData::Namespace(symbol));
        }
        if let Some(ty) =
            decls.iter().find_map(|decl| return self.value_type(decl, data.unit, depth))
        {
            return ty;
        }
        if any_kind(&[DeclarationKind::EnumMember])
            && let Some(parent) = data.parent
        {
            let text = format!("{}.{}", self.symbol_name(parent), data.name);
            return self.intern(TypeData::Text(text));
        }
        return self.intern(TypeData::Any);
    }

    /// Type of a value-carrying declaration.
    fn value_type(&self, decl: &DeclData, unit: UnitId, depth: usize) -> Option<TypeId> {
        let DeclDetail::Value { annotation, value } = &decl.detail else {
            return None;
        };
        if let Some(annotation) = annotation {
            return Some(self.resolve_annotation(annotation, unit, depth.saturating_add(1)));
        }
        return Some(self.infer_value(value, unit, depth.saturating_add(1)));
    }
}

impl Checker for TsContext {
    fn call_signatures(&self, ty: TypeId) -> Vec<SignatureId> {
        return match self.type_data(ty) {
            TypeData::Alias { target, .. } => self.call_signatures(target),
            TypeData::Callable(symbol) => self.callable_signatures(symbol),
            TypeData::Declared(symbol) => self
                .symbol(symbol)
                .map(|data| {
                    return data
                        .declarations
                        .iter()
                        .flat_map(|decl| {
                            return match &decl.detail {
                                DeclDetail::Interface { call, .. } => call.clone(),
                                _ => Vec::new(),
                            };
                        })
                        .collect();
                })
                .unwrap_or_default(),
            TypeData::Signature(signature) => vec![signature],
            _ => Vec::new(),
        };
    }

    fn construct_signatures(&self, ty: TypeId) -> Vec<SignatureId> {
        let (symbol, from_class) = match self.type_data(ty) {
            TypeData::Alias { target, .. } => return self.construct_signatures(target),
            TypeData::ClassStatic(symbol) => (symbol, true),
            TypeData::Declared(symbol) => (symbol, false),
            _ => return Vec::new(),
        };
        let Some(data) = self.symbol(symbol) else {
            return Vec::new();
        };
        return data
            .declarations
            .iter()
            .flat_map(|decl| {
                return match &decl.detail {
                    DeclDetail::Class { constructors, .. } if from_class => constructors.clone(),
                    DeclDetail::Interface { construct, .. } if !from_class => construct.clone(),
                    _ => Vec::new(),
                };
            })
            .collect();
    }

    fn declarations(&self, symbol: SymbolId) -> Vec<Declaration> {
        let Some(data) = self.symbol(symbol) else {
            return Vec::new();
        };
        let file = self.unit_path(data.unit).to_path_buf();
        return data
            .declarations
            .iter()
            .map(|decl| {
                let value = match &decl.detail {
                    DeclDetail::Value { value, .. } => match value {
                        ValueExpr::Class(_) => ValueShape::Class,
                        ValueExpr::Function(_) => ValueShape::Function,
                        ValueExpr::Method(_) => ValueShape::Method,
                        ValueExpr::Object(_) => ValueShape::Object,
                        _ => ValueShape::Other,
                    },
                    _ => ValueShape::None,
                };
                return Declaration {
                    file: file.clone(),
                    is_static: decl.is_static,
                    kind: decl.kind,
                    optional: decl.optional,
                    position: decl.position,
                    text: decl.text.clone(),
                    value,
                };
            })
            .collect();
    }

    fn declared_type_of_symbol(&self, symbol: SymbolId) -> Option<TypeId> {
        let symbol = self.resolve_alias(symbol, 0)?;
        if self.has_kind(symbol, &[DeclarationKind::Class]) {
            return Some(self.intern(TypeData::ClassInstance(symbol)));
        }
        if self.has_kind(symbol, &[
            DeclarationKind::Enum,
            DeclarationKind::Interface,
            DeclarationKind::TypeAlias,
        ]) {
            return Some(self.intern(TypeData::Declared(symbol)));
        }
        return None;
    }

    fn documentation_comment(&self, symbol: SymbolId) -> Option<String> {
        return self.symbol(symbol)?.declarations.iter().find_map(|decl| {
            return decl.doc.as_ref().and_then(|doc| return doc.summary.clone());
        });
    }

    fn exports_of_module(&self, unit: UnitId) -> Option<Vec<ExportEntry>> {
        self.program.units.get(unit.0)?.exports.as_ref()?;
        let mut entries = Vec::new();
        let mut visited = HashSet::from([unit]);
        self.collect_exports(unit, true, &mut entries, &mut visited);
        return Some(entries);
    }

    fn global_symbol(&self, name: &str) -> Option<SymbolId> {
        return self.program.globals.get(name).copied();
    }

    fn jsdoc_tags(&self, symbol: SymbolId) -> Vec<JsDocTag> {
        return self
            .symbol(symbol)
            .and_then(|data| {
                return data
                    .declarations
                    .iter()
                    .filter_map(|decl| return decl.doc.as_ref())
                    .find(|doc| return !doc.tags.is_empty())
                    .map(|doc| return doc.tags.clone());
            })
            .unwrap_or_default();
    }

    fn leading_comments(&self, unit: UnitId) -> &[String] {
        return self.program.units.get(unit.0).map_or(&[], |u| return u.comments.as_slice());
    }

    fn properties_of_type(&self, ty: TypeId) -> Vec<SymbolId> {
        let mut out = Vec::new();
        let mut names = HashSet::new();
        match self.type_data(ty) {
            TypeData::Alias { target, .. } => return self.properties_of_type(target),
            TypeData::ClassInstance(symbol) => {
                self.collect_members(symbol, false, &mut out, &mut names, 0);
            },
            TypeData::ClassStatic(symbol) | TypeData::Namespace(symbol) => {
                self.collect_members(symbol, true, &mut out, &mut names, 0);
            },
            TypeData::Declared(symbol) => {
                let aliased = self.symbol(symbol).and_then(|data| {
                    return data.declarations.iter().find_map(|decl| {
                        return match &decl.detail {
                            DeclDetail::TypeAlias { object: false, value } => {
                                Some((value.clone(), data.unit))
                            },
                            _ => None,
                        };
                    });
                });
                if let Some((value, unit)) = aliased {
                    let target = self.resolve_annotation(&value, unit, 1);
                    if target != ty {
                        return self.properties_of_type(target);
                    }
                }
                self.collect_members(symbol, false, &mut out, &mut names, 0);
            },
            TypeData::EnumObject(symbol) | TypeData::Object(symbol) => {
                self.collect_members(symbol, false, &mut out, &mut names, 0);
            },
            TypeData::ModuleNamespace(unit) => {
                out = self
                    .exports_of_module(unit)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|e| return e.symbol)
                    .collect();
            },
            TypeData::Primitive(name) => {
                if let Some(interface) = apparent_interface(&name)
                    && let Some(symbol) = self.global_symbol(interface)
                {
                    self.collect_members(symbol, false, &mut out, &mut names, 0);
                }
            },
            TypeData::Any
            | TypeData::Callable(_)
            | TypeData::Signature(_)
            | TypeData::Text(_) => {},
        }
        return out;
    }

    fn return_type_of_signature(&self, signature: SignatureId) -> TypeId {
        let Some(SignatureData { returns, unit, .. }) = self.program.signatures.get(signature.0)
        else {
            return self.intern(TypeData::Any);
        };
        return match returns {
            ReturnSpec::Annotation(text) => self.resolve_annotation(text, *unit, 0),
            ReturnSpec::Inferred { expr: None, is_async } => {
                let text = if *is_async { "Promise<void>" } else { "void" };
                self.resolve_annotation(text, *unit, 0)
            },
            ReturnSpec::Inferred {
                expr: Some(expr),
                is_async,
            } => {
                if self.inferring.borrow().contains(&signature) {
                    return self.intern(TypeData::Any);
                }
                self.inferring.borrow_mut().push(signature);
                let inferred = self.infer_value(expr, *unit, 1);
                self.inferring.borrow_mut().retain(|s| return *s != signature);
                if *is_async {
                    let inner = self.render_type(inferred, 1);
                    self.resolve_annotation(&format!("Promise<{inner}>"), *unit, 1)
                } else {
                    inferred
                }
            },
            ReturnSpec::Instance(class) => self.intern(TypeData::ClassInstance(*class)),
        };
    }

    fn root_units(&self) -> Vec<UnitId> {
        return self.roots.clone();
    }

    fn signature_to_string(&self, signature: SignatureId) -> String {
        return self.render_signature(signature, false, 0);
    }

    fn statements(&self, unit: UnitId) -> &[Statement] {
        return self.program.units.get(unit.0).map_or(&[], |u| return u.statements.as_slice());
    }

    fn symbol_at_location(&self, node: NodeId) -> Option<SymbolId> {
        return match self.program.nodes.get(node.0)? {
            NodeTarget::Declaration(symbol) => Some(*symbol),
            NodeTarget::Reference { name, unit } => self.resolve_name(*unit, name),
        };
    }

    fn symbol_name(&self, symbol: SymbolId) -> String {
        return self.symbol(symbol).map(|s| return s.name.clone()).unwrap_or_default();
    }

    fn type_of_symbol(&self, symbol: SymbolId) -> TypeId {
        return self.type_of(symbol, 0);
    }

    fn type_to_string(&self, ty: TypeId) -> String {
        return self.render_type(ty, 0);
    }

    fn unit_path(&self, unit: UnitId) -> &Path {
        return self.program.units.get(unit.0).map_or(Path::new(""), |u| return u.path.as_path());
    }
}

/// Ambient interface carrying the apparent members of a primitive.
fn apparent_interface(primitive: &str) -> Option<&'static str> {
    return match primitive {
        "bigint" => Some("BigInt"),
        "boolean" => Some("Boolean"),
        "number" => Some("Number"),
        "string" => Some("String"),
        "symbol" => Some("Symbol"),
        _ => None,
    };
}

/// `...name?: type`, untyped parameters shown as `any`.
fn render_param(param: &ParamData) -> String {
    let type_text = match (&param.type_text, param.rest) {
        (Some(text), _) => text.clone(),
        (None, true) => "any[]".to_string(),
        (None, false) => "any".to_string(),
    };
    let rest = if param.rest { "..." } else { "" };
    let optional = if param.optional && !param.rest { "?" } else { "" };
    return format!("{rest}{}{optional}: {type_text}", param.name);
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::oracle::ts::TsOracle;
    use crate::oracle::{CompilerOptions, Expression, ObjectMember, Oracle, SourceInput};

    fn context(path: &str, text: &str) -> TsContext {
        let input = SourceInput::Virtual {
            path: PathBuf::from(path),
            text: text.to_string(),
        };
        return TsOracle.create_checking_context(&[input], &CompilerOptions::default()).unwrap();
    }

    fn export(ctx: &TsContext, name: &str) -> SymbolId {
        let unit = ctx.root_units()[0];
        return ctx
            .exports_of_module(unit)
            .unwrap()
            .into_iter()
            .find(|e| e.name == name)
            .unwrap_or_else(|| panic!("no export {name}"))
            .symbol;
    }

    fn names(ctx: &TsContext, symbols: &[SymbolId]) -> Vec<String> {
        return symbols.iter().map(|s| ctx.symbol_name(*s)).collect();
    }

    #[test]
    fn overloads_hide_implementation() {
        let ctx = context(
            "/virtual/pick.ts",
            "export function pick(a: string): string;\n\
             export function pick(a: number): number;\n\
             export function pick(a: any): any { return a; }\n",
        );
        let pick = export(&ctx, "pick");
        let signatures = ctx.call_signatures(ctx.type_of_symbol(pick));
        assert_eq!(signatures.len(), 2);
        assert_eq!(ctx.signature_to_string(signatures[0]), "(a: string): string");
        assert_eq!(ctx.declarations(pick).len(), 3);
    }

    #[test]
    fn class_members_statics_and_inheritance() {
        let ctx = context(
            "/virtual/classes.ts",
            "export class Base {\n  greet(): string { return \"hi\"; }\n\
             static make(): Base { return new Base(); }\n}\n\
             export class Child extends Base {\n\
             constructor(public name: string) { super(); }\n  run(count?: number): void {}\n}\n",
        );
        let child = export(&ctx, "Child");
        let constructors = ctx.construct_signatures(ctx.type_of_symbol(child));
        assert_eq!(ctx.signature_to_string(constructors[0]), "(name: string): Child");

        let instance = ctx.return_type_of_signature(constructors[0]);
        let members = names(&ctx, &ctx.properties_of_type(instance));
        for expected in ["name", "run", "greet"] {
            assert!(members.contains(&expected.to_string()), "{members:?}");
        }

        let base = export(&ctx, "Base");
        let statics = names(&ctx, &ctx.properties_of_type(ctx.type_of_symbol(base)));
        assert_eq!(statics, vec!["make".to_string()]);
        assert_eq!(ctx.type_to_string(ctx.type_of_symbol(base)), "typeof Base");
    }

    #[test]
    fn optional_parameter_rendering() {
        let ctx = context(
            "/virtual/run.ts",
            "export function run(count?: number, ...rest: string[]): void {}\n",
        );
        let run = export(&ctx, "run");
        let signature = ctx.call_signatures(ctx.type_of_symbol(run))[0];
        assert_eq!(ctx.signature_to_string(signature), "(count?: number, ...rest: string[]): void");
    }

    #[test]
    fn commonjs_exports_and_jsdoc_types() {
        let ctx = context(
            "/virtual/sample.js",
            "/**\n * Greets.\n * @param {string} name - who\n * @returns {string}\n */\n\
             function greet(name) { return \"hi \" + name; }\n\
             module.exports = { greet };\n",
        );
        let unit = ctx.root_units()[0];
        let exported = export(&ctx, "greet");
        assert_eq!(ctx.declarations(exported)[0].kind, DeclarationKind::CommonJsExport);

        let statements = ctx.statements(unit);
        let Some(Statement::Expression(Expression::Assignment { right, .. })) = statements.get(1)
        else {
            panic!("expected module.exports assignment");
        };
        let Expression::Object(members) = right.as_ref() else {
            panic!("expected object literal");
        };
        let Some(ObjectMember::Shorthand { node, .. }) = members.first() else {
            panic!("expected shorthand member");
        };
        let original = ctx.symbol_at_location(*node).unwrap();
        assert_eq!(ctx.declarations(original)[0].kind, DeclarationKind::Function);
        let signature = ctx.call_signatures(ctx.type_of_symbol(original))[0];
        assert_eq!(ctx.signature_to_string(signature), "(name: string): string");
        assert_eq!(ctx.documentation_comment(original).as_deref(), Some("Greets."));
        assert_eq!(ctx.jsdoc_tags(original).len(), 2);
    }

    #[test]
    fn global_math_members() {
        let ctx = context("/virtual/global.ts", "const __probe__ = Math;\n");
        let math = ctx.global_symbol("Math").unwrap();
        let properties = ctx.properties_of_type(ctx.type_of_symbol(math));
        let max = properties
            .into_iter()
            .find(|p| ctx.symbol_name(*p) == "max")
            .unwrap();
        let signature = ctx.call_signatures(ctx.type_of_symbol(max))[0];
        assert_eq!(ctx.signature_to_string(signature), "(...values: number[]): number");
    }

    #[test]
    fn reexports_follow_into_loaded_units() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.ts");
        let index = dir.path().join("index.ts");
        std::fs::write(
            &a,
            "/** Adds. */\nexport function add(x: number, y: number): number { return x + y; }\n",
        )
        .unwrap();
        std::fs::write(&index, "export * from \"./a\";\nexport { add as plus } from \"./a\";\n")
            .unwrap();

        let ctx = TsOracle
            .create_checking_context(&[SourceInput::File(index)], &CompilerOptions::default())
            .unwrap();
        let add = export(&ctx, "add");
        let plus = export(&ctx, "plus");
        assert_eq!(add, plus);
        assert_eq!(ctx.documentation_comment(add).as_deref(), Some("Adds."));
        assert!(ctx.declarations(add)[0].file.ends_with("a.ts"));
    }

    #[test]
    fn merged_interfaces_with_extends() {
        let ctx = context(
            "/virtual/shapes.ts",
            "interface A { a: string; }\ninterface B extends A { b?: number; }\n\
             interface B { c(): void; }\nexport { B };\n",
        );
        let b = export(&ctx, "B");
        let declared = ctx.declared_type_of_symbol(b).unwrap();
        let properties = ctx.properties_of_type(declared);
        assert_eq!(names(&ctx, &properties), vec!["b", "c", "a"]);
        assert!(ctx.declarations(properties[0])[0].optional);
        assert_eq!(ctx.type_to_string(declared), "B");
    }

    #[test]
    fn enum_members_and_literal_inference() {
        let ctx = context(
            "/virtual/enum.ts",
            "/** @fileoverview Things. */\nexport enum Color { Red, Green = 2 }\n\
             export const count = 1;\n",
        );
        let unit = ctx.root_units()[0];
        assert_eq!(ctx.leading_comments(unit), ["/** @fileoverview Things. */".to_string()]);

        let color = export(&ctx, "Color");
        let members = ctx.properties_of_type(ctx.type_of_symbol(color));
        assert_eq!(names(&ctx, &members), vec!["Red", "Green"]);
        assert_eq!(ctx.type_to_string(ctx.type_of_symbol(members[0])), "Color.Red");

        let count = export(&ctx, "count");
        assert_eq!(ctx.type_to_string(ctx.type_of_symbol(count)), "number");
    }

    #[test]
    fn script_units_have_no_export_table() {
        let ctx = context("/virtual/script.js", "function helper() {}\n");
        let unit = ctx.root_units()[0];
        assert!(ctx.exports_of_module(unit).is_none());
        assert!(ctx.global_symbol("helper").is_some());
    }
}
