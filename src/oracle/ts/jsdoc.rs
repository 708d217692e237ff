//! JSDoc comment parsing: summary text, block tags, and the `{type}`
//! expressions JavaScript sources use in place of annotations.

use crate::oracle::JsDocTag;

/// Tags whose first word after an optional `{type}` names a parameter.
const PARAM_TAGS: [&str; 3] = ["arg", "argument", "param"];

/// Tags whose `{type}` is the return type.
const RETURN_TAGS: [&str; 2] = ["return", "returns"];

/// A parsed `/** ... */` block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocComment {
    /// `@param` entries with their names and optional types.
    pub params: Vec<ParamDoc>,
    /// Type from `@returns {T}`.
    pub returns: Option<String>,
    /// Text before the first block tag.
    pub summary: Option<String>,
    /// Every block tag, types removed from the text.
    pub tags: Vec<JsDocTag>,
    /// Type from `@type {T}`.
    pub type_text: Option<String>,
}

/// One `@param` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDoc {
    /// Parameter name, brackets and default removed.
    pub name: String,
    /// Written as `[name]` or `[name=default]`.
    pub optional: bool,
    /// `{T}` contents.
    pub type_text: Option<String>,
}

impl DocComment {
    /// Documented type of the named parameter.
    pub fn param(&self, name: &str) -> Option<&ParamDoc> {
        return self.params.iter().find(|p| return p.name == name);
    }
}

/// Parse the raw text of a `/** ... */` comment.
pub fn parse(raw: &str) -> DocComment {
    let body = raw
        .trim()
        .trim_start_matches("/**")
        .trim_end_matches("*/");

    let mut summary_lines: Vec<&str> = Vec::new();
    let mut raw_tags: Vec<(String, Vec<&str>)> = Vec::new();

    for line in body.lines() {
        let line = strip_gutter(line);
        if let Some(rest) = line.strip_prefix('@') {
            let (name, text) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            raw_tags.push((name.to_string(), vec![text.trim()]));
        } else if let Some((_, lines)) = raw_tags.last_mut() {
            lines.push(line.trim());
        } else {
            summary_lines.push(line);
        }
    }

    let mut doc = DocComment {
        summary: join_trimmed(&summary_lines),
        ..DocComment::default()
    };

    for (name, lines) in raw_tags {
        let joined = join_trimmed(&lines).unwrap_or_default();
        let (type_text, rest) = split_type_expression(&joined);

        if PARAM_TAGS.contains(&name.as_str()) {
            if let Some(param) = parse_param_name(rest) {
                doc.params.push(ParamDoc {
                    type_text: type_text.map(str::to_string),
                    ..param
                });
            }
        } else if RETURN_TAGS.contains(&name.as_str()) {
            doc.returns = type_text.map(str::to_string);
        } else if name == "type" {
            doc.type_text = type_text.map(str::to_string);
        }

        let text = if type_text.is_some() && name != "type" {
            rest.trim().to_string()
        } else {
            joined
        };
        doc.tags.push(JsDocTag { name, text });
    }

    return doc;
}

/// Join lines, drop blank edges, `None` when nothing is left.
fn join_trimmed(lines: &[&str]) -> Option<String> {
    let joined = lines.join("\n");
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        return None;
    }
    return Some(trimmed.to_string());
}

/// `name`, `[name]`, or `[name=default]` followed by description text.
fn parse_param_name(rest: &str) -> Option<ParamDoc> {
    let rest = rest.trim_start();
    if let Some(bracketed) = rest.strip_prefix('[') {
        let close = bracketed.find(']')?;
        let inner = bracketed.get(..close)?;
        let name = inner.split('=').next().unwrap_or(inner).trim();
        return Some(ParamDoc {
            name: name.to_string(),
            optional: true,
            type_text: None,
        });
    }
    let name = rest.split_whitespace().next()?;
    return Some(ParamDoc {
        name: name.to_string(),
        optional: false,
        type_text: None,
    });
}

/// Split a leading balanced `{...}` off tag text.
fn split_type_expression(text: &str) -> (Option<&str>, &str) {
    let trimmed = text.trim_start();
    if !trimmed.starts_with('{') {
        return (None, text);
    }
    let mut depth = 0_u32;
    for (i, ch) in trimmed.char_indices() {
        match ch {
            '{' => depth = depth.saturating_add(1),
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    let inner = trimmed.get(1..i).unwrap_or("").trim();
                    let rest = trimmed.get(i.saturating_add(1)..).unwrap_or("");
                    return (Some(inner), rest);
                }
            },
            _ => {},
        }
    }
    return (None, text);
}

/// Remove the ` * ` gutter of a comment line.
fn strip_gutter(line: &str) -> &str {
    let trimmed = line.trim_start();
    let without_star = trimmed.strip_prefix('*').unwrap_or(trimmed);
    return without_star.strip_prefix(' ').unwrap_or(without_star).trim_end();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_and_param_tags() {
        let doc = parse(
            "/**\n * Greets a user by name.\n *\n * @param {string} name - The user's name\n \
             * @returns {string} The greeting\n */",
        );
        assert_eq!(doc.summary.as_deref(), Some("Greets a user by name."));
        assert_eq!(doc.tags.len(), 2);
        assert_eq!(doc.tags[0].name, "param");
        assert_eq!(doc.tags[0].text, "name - The user's name");
        assert_eq!(doc.param("name").unwrap().type_text.as_deref(), Some("string"));
        assert_eq!(doc.returns.as_deref(), Some("string"));
        assert_eq!(doc.tags[1].text, "The greeting");
    }

    #[test]
    fn optional_bracketed_param() {
        let doc = parse("/** @param {number} [count=1] how many */");
        let param = doc.param("count").unwrap();
        assert!(param.optional);
        assert_eq!(param.type_text.as_deref(), Some("number"));
    }

    #[test]
    fn nested_braces_in_type() {
        let doc = parse("/** @type {{ a: number }} */");
        assert_eq!(doc.type_text.as_deref(), Some("{ a: number }"));
    }

    #[test]
    fn multiline_tag_text() {
        let doc = parse("/**\n * @deprecated use\n *   something else\n */");
        assert_eq!(doc.tags[0].text, "use\nsomething else");
        assert!(doc.summary.is_none());
    }

    #[test]
    fn single_line_comment() {
        let doc = parse("/** A test class. */");
        assert_eq!(doc.summary.as_deref(), Some("A test class."));
        assert!(doc.tags.is_empty());
    }
}
