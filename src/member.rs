//! Static/instance member descent.

use crate::error::Error;
use crate::oracle::{Checker, DeclarationKind, SymbolId, TypeId};

/// Declaration kinds that only introduce a type.
const TYPE_ONLY_KINDS: [DeclarationKind; 2] =
    [DeclarationKind::Interface, DeclarationKind::TypeAlias];

/// A member found on a symbol's static or instance side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberMatch {
    /// `Base.member` or `Base#member`.
    pub display_name: String,
    /// The member symbol.
    pub symbol: SymbolId,
}

/// Find `member` on the static (`Base.member`) or instance (`Base#member`)
/// side of `symbol`. `base` is the name the reference used. Only the first
/// construct or call signature is consulted.
///
/// # Errors
///
/// Returns `Error::TypeMismatch` when the symbol has no shape of the requested
/// side, or `Error::MemberNotFound` listing every member of that shape.
pub fn descend<C: Checker>(
    checker: &C,
    symbol: SymbolId,
    base: &str,
    member: &str,
    is_static: bool,
) -> Result<MemberMatch, Error> {
    let shape = if is_static {
        static_shape(checker, symbol, base)?
    } else {
        instance_shape(checker, symbol, base)?
    };
    let properties = checker.properties_of_type(shape);

    let separator = if is_static { "." } else { "#" };
    if let Some(found) =
        properties.iter().copied().find(|p| return checker.symbol_name(*p) == member)
    {
        tracing::debug!(base, member, is_static, "member found");
        return Ok(MemberMatch {
            display_name: format!("{base}{separator}{member}"),
            symbol: found,
        });
    }

    return Err(Error::MemberNotFound {
        available: properties.iter().map(|p| return checker.symbol_name(*p)).collect(),
        member: member.to_string(),
        owner: base.to_string(),
    });
}

/// Instance shape: class instance, interface/alias declared type, or the
/// return type of the first construct (else call) signature.
///
/// # Errors
///
/// Returns `Error::TypeMismatch` when no instance shape exists.
fn instance_shape<C: Checker>(checker: &C, symbol: SymbolId, base: &str) -> Result<TypeId, Error> {
    let kinds: Vec<DeclarationKind> =
        checker.declarations(symbol).iter().map(|d| return d.kind).collect();
    let value_type = checker.type_of_symbol(symbol);

    if kinds.contains(&DeclarationKind::Class) {
        let instance = checker
            .construct_signatures(value_type)
            .first()
            .map(|s| return checker.return_type_of_signature(*s))
            .or_else(|| return checker.declared_type_of_symbol(symbol));
        if let Some(instance) = instance {
            return Ok(instance);
        }
    }
    if kinds.iter().any(|k| return TYPE_ONLY_KINDS.contains(k))
        && let Some(declared) = checker.declared_type_of_symbol(symbol)
    {
        return Ok(declared);
    }
    if let Some(signature) = checker.construct_signatures(value_type).first() {
        return Ok(checker.return_type_of_signature(*signature));
    }
    if let Some(signature) = checker.call_signatures(value_type).first() {
        return Ok(checker.return_type_of_signature(*signature));
    }
    return Err(Error::TypeMismatch {
        reason: format!("'{base}' is not a constructor or class"),
    });
}

/// Static shape: constructor/enum/namespace/variable value type.
///
/// # Errors
///
/// Returns `Error::TypeMismatch` for type-only symbols.
fn static_shape<C: Checker>(checker: &C, symbol: SymbolId, base: &str) -> Result<TypeId, Error> {
    let declarations = checker.declarations(symbol);
    let type_only = !declarations.is_empty()
        && declarations.iter().all(|d| return TYPE_ONLY_KINDS.contains(&d.kind));
    if type_only {
        return Err(Error::TypeMismatch {
            reason: format!("'{base}' is a type and has no static members"),
        });
    }
    return Ok(checker.type_of_symbol(symbol));
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::error::ErrorCode;
    use crate::oracle::ts::{TsContext, TsOracle};
    use crate::oracle::{CompilerOptions, Oracle, SourceInput};

    const SOURCE: &str = "\
export class Counter {\n  count = 0;\n  static create(): Counter { return new Counter(); }\n\
  increment(by?: number): void {}\n}\n\
export interface Shape { area(): number; }\n\
export enum Level { Low, High }\n\
export function makeCounter() { return new Counter(); }\n\
export const settings = { verbose: true };\n\
export function factory(): { go(): void; n: number } { return { go() {}, n: 1 }; }\n\
export const cfg: { port: number } = { port: 80 };\n\
export declare const decl: { host: string };\n\
interface Fac { (): { w: number } }\n\
export const fac: Fac = () => ({ w: 1 });\n";

    fn context() -> TsContext {
        let input = SourceInput::Virtual {
            path: PathBuf::from("/virtual/members.ts"),
            text: SOURCE.to_string(),
        };
        return TsOracle.create_checking_context(&[input], &CompilerOptions::default()).unwrap();
    }

    fn export(ctx: &TsContext, name: &str) -> SymbolId {
        let unit = ctx.root_units()[0];
        let exports = ctx.exports_of_module(unit).unwrap();
        return exports.into_iter().find(|e| return e.name == name).unwrap().symbol;
    }

    #[test]
    fn static_and_instance_class_members() {
        let ctx = context();
        let counter = export(&ctx, "Counter");
        let create = descend(&ctx, counter, "Counter", "create", true).unwrap();
        assert_eq!(create.display_name, "Counter.create");
        let increment = descend(&ctx, counter, "Counter", "increment", false).unwrap();
        assert_eq!(increment.display_name, "Counter#increment");
    }

    #[test]
    fn static_lookup_does_not_see_instance_members() {
        let ctx = context();
        let counter = export(&ctx, "Counter");
        let err = descend(&ctx, counter, "Counter", "increment", true).unwrap_err();
        assert_eq!(err.code(), ErrorCode::MemberNotFound);
        assert!(err.to_string().contains("Available members: create"), "{err}");
    }

    #[test]
    fn interface_instance_members_and_static_rejection() {
        let ctx = context();
        let shape = export(&ctx, "Shape");
        assert!(descend(&ctx, shape, "Shape", "area", false).is_ok());
        let err = descend(&ctx, shape, "Shape", "area", true).unwrap_err();
        assert_eq!(err.to_string(), "'Shape' is a type and has no static members");
    }

    #[test]
    fn enum_members_are_static() {
        let ctx = context();
        let level = export(&ctx, "Level");
        assert_eq!(descend(&ctx, level, "Level", "High", true).unwrap().display_name, "Level.High");
    }

    #[test]
    fn factory_function_instance_side() {
        let ctx = context();
        let factory = export(&ctx, "makeCounter");
        assert!(descend(&ctx, factory, "makeCounter", "count", false).is_ok());
    }

    #[test]
    fn written_object_return_type_members() {
        let ctx = context();
        let factory = export(&ctx, "factory");
        let go = descend(&ctx, factory, "factory", "go", false).unwrap();
        assert_eq!(go.display_name, "factory#go");
        assert!(descend(&ctx, factory, "factory", "n", false).is_ok());
        let err = descend(&ctx, factory, "factory", "missing", false).unwrap_err();
        assert!(err.to_string().contains("Available members: go, n"), "{err}");
        let rendered = ctx.type_to_string(ctx.type_of_symbol(factory));
        assert_eq!(rendered, "() => { go(): void; n: number }");
    }

    #[test]
    fn annotated_object_statics() {
        let ctx = context();
        let cfg = export(&ctx, "cfg");
        assert_eq!(descend(&ctx, cfg, "cfg", "port", true).unwrap().display_name, "cfg.port");
        let decl = export(&ctx, "decl");
        assert!(descend(&ctx, decl, "decl", "host", true).is_ok());
    }

    #[test]
    fn callable_interface_return_members() {
        let ctx = context();
        let fac = export(&ctx, "fac");
        assert_eq!(descend(&ctx, fac, "fac", "w", false).unwrap().display_name, "fac#w");
    }

    #[test]
    fn plain_object_has_no_instance_side() {
        let ctx = context();
        let settings = export(&ctx, "settings");
        let err = descend(&ctx, settings, "settings", "verbose", false).unwrap_err();
        assert_eq!(err.code(), ErrorCode::TypeError);
        assert_eq!(err.to_string(), "'settings' is not a constructor or class");
        assert!(descend(&ctx, settings, "settings", "verbose", true).is_ok());
    }
}
