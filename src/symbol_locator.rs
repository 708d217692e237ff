//! Symbol location: an ordered chain of lookup strategies over a located module.

use crate::commonjs;
use crate::error::Error;
use crate::module_locator::{GLOBAL_PROBE, ModuleHandle};
use crate::oracle::{Checker, DeclarationKind, Expression, Statement, SymbolId, UnitId};

/// Declaration kinds an export table entry can be accepted with directly.
const USABLE_KINDS: [DeclarationKind; 7] = [
    DeclarationKind::Class,
    DeclarationKind::Enum,
    DeclarationKind::Function,
    DeclarationKind::Interface,
    DeclarationKind::Module,
    DeclarationKind::TypeAlias,
    DeclarationKind::Variable,
];

/// Outcome of one strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Lookup {
    /// The strategy saw every name the module offers and `name` is not among them.
    Absent(Vec<String>),
    /// Resolved.
    Found(SymbolId),
    /// The strategy does not apply; the next one runs.
    NotApplicable,
}

/// One link of the chain.
type Strategy<C> = fn(&C, UnitId, &str) -> Lookup;

/// Find `name` in the handle's module. `module` is the specifier as written,
/// used in messages.
///
/// # Errors
///
/// Returns `Error::SymbolNotFound` listing every export the module has when no
/// strategy finds the symbol.
pub fn locate<C: Checker>(
    handle: &ModuleHandle<C>,
    module: &str,
    name: &str,
) -> Result<SymbolId, Error> {
    let chain: [(&str, Strategy<C>); 2] = if handle.is_global {
        [("global scope", global_scope), ("probe initializer", probe_initializer)]
    } else {
        [("export table", export_table), ("commonjs recovery", commonjs_recovery)]
    };

    let mut available = Vec::new();
    for (label, strategy) in chain {
        match strategy(&handle.context, handle.unit, name) {
            Lookup::Found(symbol) => {
                tracing::debug!(strategy = label, symbol = name, "symbol located");
                return Ok(symbol);
            },
            Lookup::Absent(names) => {
                tracing::debug!(strategy = label, symbol = name, "symbol absent");
                available = names;
                break;
            },
            Lookup::NotApplicable => {
                tracing::trace!(strategy = label, symbol = name, "strategy not applicable");
            },
        }
    }

    return Err(Error::SymbolNotFound {
        available,
        module: module.to_string(),
        symbol: name.to_string(),
    });
}

/// Module without an export table: recovery over the raw statements.
fn commonjs_recovery<C: Checker>(checker: &C, unit: UnitId, name: &str) -> Lookup {
    return commonjs::recover(checker, unit, name).map_or(Lookup::NotApplicable, Lookup::Found);
}

/// Module with an export table. Entries backed by a usable declaration are
/// accepted; others go through recovery and fall back to the entry itself.
fn export_table<C: Checker>(checker: &C, unit: UnitId, name: &str) -> Lookup {
    let Some(exports) = checker.exports_of_module(unit) else {
        return Lookup::NotApplicable;
    };
    let Some(entry) = exports.iter().find(|e| return e.name == name) else {
        return Lookup::Absent(exports.into_iter().map(|e| return e.name).collect());
    };

    let usable = checker
        .declarations(entry.symbol)
        .iter()
        .any(|d| return USABLE_KINDS.contains(&d.kind));
    if usable {
        return Lookup::Found(entry.symbol);
    }
    tracing::debug!(symbol = name, "export entry is an alias, trying recovery");
    return Lookup::Found(commonjs::recover(checker, unit, name).unwrap_or(entry.symbol));
}

/// Global scope lookup by name.
fn global_scope<C: Checker>(checker: &C, _unit: UnitId, name: &str) -> Lookup {
    return checker.global_symbol(name).map_or(Lookup::NotApplicable, Lookup::Found);
}

/// The probe unit's initializer, resolved through the checker.
fn probe_initializer<C: Checker>(checker: &C, unit: UnitId, name: &str) -> Lookup {
    let found = checker.statements(unit).iter().find_map(|statement| {
        let Statement::VariableStatement(declarators) = statement else {
            return None;
        };
        return declarators.iter().find_map(|d| {
            return match &d.initializer {
                Some(Expression::Identifier { name: identifier, node })
                    if d.name == GLOBAL_PROBE && identifier == name =>
                {
                    checker.symbol_at_location(*node)
                },
                _ => None,
            };
        });
    });
    return found.map_or(Lookup::NotApplicable, Lookup::Found);
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::error::ErrorCode;
    use crate::oracle::ts::{TsContext, TsOracle};
    use crate::oracle::{CompilerOptions, Oracle, SourceInput};

    fn handle(path: &str, text: &str) -> ModuleHandle<TsContext> {
        let input = SourceInput::Virtual {
            path: PathBuf::from(path),
            text: text.to_string(),
        };
        let context =
            TsOracle.create_checking_context(&[input], &CompilerOptions::default()).unwrap();
        let unit = context.root_units()[0];
        return ModuleHandle {
            context,
            is_global: false,
            path: PathBuf::from(path),
            unit,
        };
    }

    fn kind_of(handle: &ModuleHandle<TsContext>, symbol: SymbolId) -> DeclarationKind {
        return handle.context.declarations(symbol)[0].kind;
    }

    #[test]
    fn esm_exports_are_accepted() {
        let h = handle("/virtual/a.ts", "export interface Shape {}\nexport function area() {}\n");
        let symbol = locate(&h, "./a.ts", "Shape").unwrap();
        assert_eq!(kind_of(&h, symbol), DeclarationKind::Interface);
    }

    #[test]
    fn commonjs_property_export_recovers_original() {
        let h = handle("/virtual/a.js", "function greet() {}\nmodule.exports = { greet };\n");
        let symbol = locate(&h, "./a.js", "greet").unwrap();
        assert_eq!(kind_of(&h, symbol), DeclarationKind::Function);
    }

    #[test]
    fn unrecoverable_alias_keeps_the_entry() {
        let h = handle("/virtual/a.js", "module.exports = { answer: 42 };\n");
        let symbol = locate(&h, "./a.js", "answer").unwrap();
        assert_eq!(h.context.symbol_name(symbol), "answer");
    }

    #[test]
    fn missing_symbol_lists_every_export() {
        let h = handle("/virtual/a.ts", "export const one = 1;\nexport const two = 2;\n");
        let err = locate(&h, "./a.ts", "three").unwrap_err();
        assert_eq!(err.code(), ErrorCode::SymbolNotFound);
        assert_eq!(
            err.to_string(),
            "Symbol 'three' not found in module './a.ts'. Available exports: one, two"
        );
    }

    #[test]
    fn script_without_exports() {
        let h = handle("/virtual/a.js", "function local() {}\n");
        let err = locate(&h, "./a.js", "local").unwrap_err();
        assert!(err.to_string().ends_with("Module has no exports"), "{err}");
    }

    #[test]
    fn global_strategy_finds_ambient_declarations() {
        let dir = tempfile::tempdir().unwrap();
        let options = CompilerOptions::default();
        let locator = crate::module_locator::ModuleLocator::new(&TsOracle, &options, dir.path());
        let h = locator.locate_global("Math").unwrap();
        let symbol = locate(&h, "node:Math", "Math").unwrap();
        assert_eq!(h.context.symbol_name(symbol), "Math");
    }
}
