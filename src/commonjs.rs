//! CommonJS export recovery.
//!
//! A name exported through `module.exports = { name }` is, to the checker, a
//! property of an object literal. Recovery walks the unit's top-level
//! statements to find the identifier the export refers to, then the original
//! declaration of that identifier.

use crate::oracle::{Checker, Expression, NodeId, ObjectMember, Statement, SymbolId, UnitId};

/// An identifier an export points at.
struct ExportedIdentifier<'s> {
    /// Identifier text.
    name: &'s str,
    /// Node the checker can resolve.
    node: NodeId,
}

/// Original declaration behind the CommonJS export `name` of `unit`.
///
/// Recognised forms: `module.exports = { name }`, `module.exports = { name: ident }`,
/// `module.exports.name = ident`, `exports.name = ident`, and `module.exports = ident`
/// for `default`. The first top-level function, class, or variable declaring
/// the identifier wins; failing that, the checker resolves the identifier.
pub fn recover<C: Checker>(checker: &C, unit: UnitId, name: &str) -> Option<SymbolId> {
    let statements = checker.statements(unit);
    let Some(exported) = statements.iter().find_map(|s| return exported_identifier(s, name)) else {
        tracing::debug!(symbol = name, "no CommonJS export pattern matched");
        return None;
    };

    if let Some(symbol) = statements
        .iter()
        .find_map(|s| return declaration_node(s, exported.name))
        .and_then(|node| return checker.symbol_at_location(node))
    {
        let identifier = exported.name;
        tracing::debug!(symbol = name, identifier, "recovered CommonJS export declaration");
        return Some(symbol);
    }
    let identifier = exported.name;
    tracing::debug!(symbol = name, identifier, "falling back to identifier resolution");
    return checker.symbol_at_location(exported.node);
}

/// Node of a top-level function, class, or variable declaring `identifier`.
fn declaration_node(statement: &Statement, identifier: &str) -> Option<NodeId> {
    return match statement {
        Statement::ClassDeclaration { name, node }
        | Statement::FunctionDeclaration { name, node } => {
            (name == identifier).then_some(*node)
        },
        Statement::VariableStatement(declarators) => declarators
            .iter()
            .find(|d| return d.name == identifier)
            .map(|d| return d.node),
        Statement::Expression(_) | Statement::Other => None,
    };
}

/// Identifier that `statement` exports as `name`, if it is an export assignment.
fn exported_identifier<'s>(
    statement: &'s Statement,
    name: &str,
) -> Option<ExportedIdentifier<'s>> {
    let Statement::Expression(Expression::Assignment { left, right }) = statement else {
        return None;
    };

    if is_module_exports(left) {
        return match right.as_ref() {
            Expression::Object(members) => {
                members.iter().find_map(|member| return object_member_identifier(member, name))
            },
            Expression::Identifier { name: identifier, node } if name == "default" => {
                Some(ExportedIdentifier {
                    name: identifier,
                    node: *node,
                })
            },
            _ => None,
        };
    }

    let Expression::Member { object, property } = left.as_ref() else {
        return None;
    };
    let is_exports_object = is_module_exports(object)
        || matches!(object.as_ref(), Expression::Identifier { name, .. } if name == "exports");
    if !is_exports_object || property != name {
        return None;
    }
    return match right.as_ref() {
        Expression::Identifier { name: identifier, node } => Some(ExportedIdentifier {
            name: identifier,
            node: *node,
        }),
        _ => None,
    };
}

/// `module.exports`.
fn is_module_exports(expression: &Expression) -> bool {
    let Expression::Member { object, property } = expression else {
        return false;
    };
    return property == "exports"
        && matches!(object.as_ref(), Expression::Identifier { name, .. } if name == "module");
}

/// `{ name }` or `{ name: ident }` inside an exported object literal.
fn object_member_identifier<'s>(
    member: &'s ObjectMember,
    name: &str,
) -> Option<ExportedIdentifier<'s>> {
    return match member {
        ObjectMember::Property {
            key,
            value: Expression::Identifier { name: identifier, node },
        } if key == name => Some(ExportedIdentifier {
            name: identifier,
            node: *node,
        }),
        ObjectMember::Shorthand { name: identifier, node } if identifier == name => {
            Some(ExportedIdentifier {
                name: identifier,
                node: *node,
            })
        },
        ObjectMember::Other | ObjectMember::Property { .. } | ObjectMember::Shorthand { .. } => {
            None
        },
    };
}
