//! XPath splitting for configuration edits.
//!
//! Edits address leaves with paths such as
//! `/network-instances/network-instance[name='mic']/config/type`. A path is
//! split into [`XPathNode`]s; each node carries its local name, an optional
//! namespace prefix and the key predicates written after it.

use itertools::Itertools;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{ModelError, ModelResult};

/// One step of an xpath.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XPathNode {
    pub name: String,
    pub ns: Option<String>,
    pub attrs: BTreeMap<String, String>,
}

impl XPathNode {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let (ns, name) = split_name(&name);
        Self {
            name: name.to_string(),
            ns: ns.map(str::to_string),
            attrs: BTreeMap::new(),
        }
    }

    /// Adds a key predicate.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    /// Name including the namespace prefix, if any.
    pub fn node_name(&self) -> String {
        match &self.ns {
            Some(ns) => format!("{}:{}", ns, self.name),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for XPathNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.node_name())?;
        for (key, value) in &self.attrs {
            write!(f, "[{}='{}']", key, value)?;
        }
        Ok(())
    }
}

/// Splits `ns:name` into its prefix and local name.
pub fn split_name(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((ns, local)) => (Some(ns), local),
        None => (None, name),
    }
}

/// Joins nodes back into an absolute path.
pub fn xpath_from_nodes(nodes: &[XPathNode]) -> String {
    format!("/{}", nodes.iter().join("/"))
}

/// Splits `xpath` into nodes.
///
/// Predicate values may be quoted with `'` or `"`; a `/` inside a predicate
/// does not split the path. An empty path yields no nodes.
pub fn parse_xpath(xpath: &str) -> ModelResult<Vec<XPathNode>> {
    split_steps(xpath)?
        .into_iter()
        .map(|step| parse_step(xpath, step))
        .collect()
}

fn split_steps(xpath: &str) -> ModelResult<Vec<&str>> {
    let mut steps = Vec::new();
    let mut start = 0usize;
    let mut in_predicate = false;
    let mut quote: Option<char> = None;

    for (pos, c) in xpath.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') if in_predicate => quote = Some(c),
            (None, '[') if in_predicate => {
                return Err(ModelError::invalid_xpath(xpath, "nested predicate"));
            }
            (None, '[') => in_predicate = true,
            (None, ']') if !in_predicate => {
                return Err(ModelError::invalid_xpath(xpath, "unbalanced ']'"));
            }
            (None, ']') => in_predicate = false,
            (None, '/') if !in_predicate => {
                if pos > start {
                    steps.push(&xpath[start..pos]);
                }
                start = pos + 1;
            }
            _ => {}
        }
    }

    if in_predicate || quote.is_some() {
        return Err(ModelError::invalid_xpath(xpath, "unterminated predicate"));
    }
    if start < xpath.len() {
        steps.push(&xpath[start..]);
    }
    Ok(steps)
}

fn parse_step(xpath: &str, step: &str) -> ModelResult<XPathNode> {
    let (name, mut rest) = match step.find('[') {
        Some(pos) => (&step[..pos], &step[pos..]),
        None => (step, ""),
    };
    let name = name.trim();
    if name.is_empty() {
        return Err(ModelError::invalid_xpath(xpath, "predicate without a node name"));
    }

    let mut node = XPathNode::new(name);
    while !rest.is_empty() {
        let body = rest
            .strip_prefix('[')
            .ok_or_else(|| ModelError::invalid_xpath(xpath, format!("unexpected '{}'", rest)))?;
        let (key, value_part) = body
            .split_once('=')
            .ok_or_else(|| ModelError::invalid_xpath(xpath, "predicate without '='"))?;
        let value_part = value_part.trim_start();

        let (value, after) = match value_part.chars().next() {
            Some(q @ ('\'' | '"')) => {
                let inner = &value_part[1..];
                let end = inner
                    .find(q)
                    .ok_or_else(|| ModelError::invalid_xpath(xpath, "unterminated predicate"))?;
                let after = inner[end + 1..].trim_start();
                let after = after
                    .strip_prefix(']')
                    .ok_or_else(|| ModelError::invalid_xpath(xpath, "unterminated predicate"))?;
                (&inner[..end], after)
            }
            _ => {
                let end = value_part
                    .find(']')
                    .ok_or_else(|| ModelError::invalid_xpath(xpath, "unterminated predicate"))?;
                (value_part[..end].trim(), &value_part[end + 1..])
            }
        };

        let key = key.trim();
        let key = split_name(key).1;
        node.attrs.insert(key.to_string(), value.to_string());
        rest = after;
    }

    Ok(node)
}
