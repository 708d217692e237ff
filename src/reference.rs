//! Reference string parsing: `module[:symbol[#member|.member]]` and `node:<global>`.

use crate::error::Error;
use crate::types::Reference;

/// Prefix that routes a reference to the runtime globals.
pub const GLOBAL_PREFIX: &str = "node:";

/// A symbol name split into its base and optional member access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolPath {
    /// Symbol before `#` or `.`.
    pub base: String,
    /// `true` for `.`, `false` for `#`.
    pub is_static: Option<bool>,
    /// Member after `#` or `.`.
    pub member: Option<String>,
}

/// Parse a raw reference string. Total: every input yields a reference or
/// an `INVALID_REQUEST`.
///
/// # Errors
///
/// Returns `Error::InvalidRequest` when the module part is missing, the symbol
/// after `:` is empty, or either side of a `#`/`.` member access is empty.
pub fn parse(raw: &str) -> Result<Reference, Error> {
    let input = raw.trim();
    if input.is_empty() {
        return Err(Error::invalid("Module path is required"));
    }

    // The global name doubles as the symbol; the member split happens when the
    // global strategy runs.
    if let Some(global) = input.strip_prefix(GLOBAL_PREFIX) {
        if global.is_empty() {
            return Err(Error::invalid("Global name is required after 'node:'"));
        }
        return Ok(Reference {
            is_static: None,
            member: None,
            module: input.to_string(),
            symbol: Some(global.to_string()),
        });
    }

    let Some((module, symbol)) = input.split_once(':') else {
        return Ok(Reference {
            is_static: None,
            member: None,
            module: input.to_string(),
            symbol: None,
        });
    };

    if module.is_empty() {
        return Err(Error::invalid("Module path is required"));
    }
    if symbol.is_empty() {
        return Err(Error::invalid("Symbol name is required after ':'"));
    }

    let path = split_member(symbol)?;
    return Ok(Reference {
        is_static: path.is_static,
        member: path.member,
        module: module.to_string(),
        symbol: Some(path.base),
    });
}

/// Split `Symbol#member` (instance) or `Symbol.member` (static). `#` wins
/// when both appear.
///
/// # Errors
///
/// Returns `Error::InvalidRequest` if either side of the separator is empty.
pub fn split_member(symbol: &str) -> Result<SymbolPath, Error> {
    let (separator, is_static) = if symbol.contains('#') {
        ('#', false)
    } else if symbol.contains('.') {
        ('.', true)
    } else {
        return Ok(SymbolPath {
            base: symbol.to_string(),
            is_static: None,
            member: None,
        });
    };

    let Some((base, member)) = symbol.split_once(separator) else {
        return Err(Error::invalid(format!("Invalid member reference '{symbol}'")));
    };
    if base.is_empty() || member.is_empty() {
        let expected = if is_static { "Symbol.member" } else { "Symbol#member" };
        return Err(Error::invalid(format!(
            "Invalid member reference '{symbol}': expected {expected}"
        )));
    }

    return Ok(SymbolPath {
        base: base.to_string(),
        is_static: Some(is_static),
        member: Some(member.to_string()),
    });
}
