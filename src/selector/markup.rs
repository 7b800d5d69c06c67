//! Markup-path selector adapter for tagged-markup documents.
//!
//! Documents are parsed into a small element tree with `quick-xml` and
//! addressed with a restricted path language:
//!
//! - `/spec/requirements/requirement` — child steps from the current scope
//! - `//requirement` — any descendant, at any depth
//! - `name`, `semantics/expr` — relative paths (equivalent to a leading `/`)
//! - `*` — wildcard name test
//! - trailing `@attr` — attribute value of the matched element
//! - trailing `text()` — text content of the matched element
//!
//! A value selector without `@attr`/`text()` yields the text content of each
//! matched element. A collection selector yields the matched elements
//! themselves as sub-documents.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::selector::SelectorAdapter;

/// One element of a markup document. The document itself is represented as a
/// synthetic root node with an empty name whose children are the top-level
/// elements, so absolute paths work uniformly.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Child>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Child {
    Element(Node),
    Text(String),
}

impl Node {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Attribute value by name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Concatenated text content of this element and its descendants,
    /// trimmed.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out.trim().to_string()
    }

    fn child_elements(&self) -> impl Iterator<Item = &Node> {
        self.children.iter().filter_map(|c| match c {
            Child::Element(n) => Some(n),
            Child::Text(_) => None,
        })
    }
}

fn collect_text(node: &Node, out: &mut String) {
    for child in &node.children {
        match child {
            Child::Text(t) => out.push_str(t),
            Child::Element(n) => collect_text(n, out),
        }
    }
}

/// Parse a markup document into its synthetic root node.
pub fn parse_document(bytes: &[u8]) -> Result<Node, String> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Node> = vec![Node::new("")];

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                let node = element_from_start(&start)?;
                stack.push(node);
            }
            Ok(Event::Empty(start)) => {
                let node = element_from_start(&start)?;
                attach(&mut stack, Child::Element(node));
            }
            Ok(Event::End(_)) => {
                let node = match stack.pop() {
                    Some(n) if !stack.is_empty() => n,
                    _ => return Err("unbalanced closing tag in markup document".to_string()),
                };
                attach(&mut stack, Child::Element(node));
            }
            Ok(Event::Text(text)) => {
                let unescaped = text
                    .unescape()
                    .map_err(|e| format!("invalid text content: {}", e))?;
                if !unescaped.is_empty() {
                    attach(&mut stack, Child::Text(unescaped.into_owned()));
                }
            }
            Ok(Event::CData(cdata)) => {
                let raw = String::from_utf8_lossy(&cdata.into_inner()).into_owned();
                attach(&mut stack, Child::Text(raw));
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(format!("malformed markup document: {}", e)),
        }
    }

    if stack.len() != 1 {
        return Err("unclosed element in markup document".to_string());
    }
    // stack holds exactly the synthetic root here
    Ok(stack.remove(0))
}

fn element_from_start(start: &quick_xml::events::BytesStart<'_>) -> Result<Node, String> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut node = Node::new(name);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| format!("malformed attribute: {}", e))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| format!("malformed attribute value: {}", e))?
            .into_owned();
        node.attrs.push((key, value));
    }
    Ok(node)
}

fn attach(stack: &mut Vec<Node>, child: Child) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(child);
    }
}

/// Step axis: direct children or any-depth descendants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NameTest {
    Name(String),
    Any,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    axis: Axis,
    test: NameTest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    Element,
    Attribute(String),
    Text,
}

/// A validated markup path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupPath {
    steps: Vec<Step>,
    target: Target,
}

fn valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':'))
}

impl MarkupPath {
    /// Parse a markup path, rejecting invalid syntax.
    pub fn parse(path: &str) -> Result<Self, String> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return Err("empty markup path".to_string());
        }

        // A leading "//" makes the first step a descendant step; a single
        // leading "/" is the same as a relative path.
        let (mut axis, body) = if let Some(rest) = trimmed.strip_prefix("//") {
            (Axis::Descendant, rest)
        } else if let Some(rest) = trimmed.strip_prefix('/') {
            (Axis::Child, rest)
        } else {
            (Axis::Child, trimmed)
        };

        if body.is_empty() {
            return Err(format!("markup path '{}' has no steps", path));
        }

        let mut steps = Vec::new();
        let mut target = Target::Element;
        let segments: Vec<&str> = body.split('/').collect();

        for (i, segment) in segments.iter().enumerate() {
            let last = i == segments.len() - 1;

            if segment.is_empty() {
                // An empty segment is the gap inside "a//b": the next step
                // becomes a descendant step.
                if axis == Axis::Descendant {
                    return Err(format!("invalid '///' in markup path '{}'", path));
                }
                if last {
                    return Err(format!("markup path '{}' ends with '/'", path));
                }
                axis = Axis::Descendant;
                continue;
            }

            if let Some(attr) = segment.strip_prefix('@') {
                if !last {
                    return Err(format!(
                        "attribute '@{}' must be the last step in markup path '{}'",
                        attr, path
                    ));
                }
                if !valid_name(attr) {
                    return Err(format!("invalid attribute name '@{}' in '{}'", attr, path));
                }
                target = Target::Attribute(attr.to_string());
                continue;
            }

            if *segment == "text()" {
                if !last {
                    return Err(format!(
                        "text() must be the last step in markup path '{}'",
                        path
                    ));
                }
                target = Target::Text;
                continue;
            }

            let test = if *segment == "*" {
                NameTest::Any
            } else if valid_name(segment) {
                NameTest::Name(segment.to_string())
            } else {
                return Err(format!("invalid step '{}' in markup path '{}'", segment, path));
            };

            steps.push(Step { axis, test });
            axis = Axis::Child;
        }

        Ok(Self { steps, target })
    }

    /// Elements matched by the step portion of this path.
    fn select_elements<'a>(&self, scope: &'a Node) -> Vec<&'a Node> {
        let mut current: Vec<&Node> = vec![scope];
        for step in &self.steps {
            let mut next = Vec::new();
            for node in current {
                match step.axis {
                    Axis::Child => {
                        for child in node.child_elements() {
                            if step.matches(child) {
                                next.push(child);
                            }
                        }
                    }
                    Axis::Descendant => descend(node, step, &mut next),
                }
            }
            current = next;
        }
        current
    }
}

fn descend<'a>(node: &'a Node, step: &Step, out: &mut Vec<&'a Node>) {
    for child in node.child_elements() {
        if step.matches(child) {
            out.push(child);
        }
        descend(child, step, out);
    }
}

impl Step {
    fn matches(&self, node: &Node) -> bool {
        match &self.test {
            NameTest::Any => true,
            NameTest::Name(name) => node.name == *name,
        }
    }
}

/// Selector adapter over markup node trees.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkupAdapter;

impl SelectorAdapter for MarkupAdapter {
    type Scope = Node;
    type Selector = MarkupPath;

    fn compile(selector: &str) -> Result<MarkupPath, String> {
        MarkupPath::parse(selector)
    }

    fn select_docs(&self, selector: &MarkupPath, scope: &Node) -> Vec<Node> {
        match selector.target {
            Target::Element => selector
                .select_elements(scope)
                .into_iter()
                .cloned()
                .collect(),
            // Attribute and text targets do not address sub-documents.
            _ => Vec::new(),
        }
    }

    fn select_values(&self, selector: &MarkupPath, scope: &Node) -> Vec<String> {
        let elements = selector.select_elements(scope);
        match &selector.target {
            Target::Element | Target::Text => {
                elements.into_iter().map(|n| n.text_content()).collect()
            }
            Target::Attribute(name) => elements
                .into_iter()
                .filter_map(|n| n.attr(name).map(str::to_string))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"
        <spec>
          <requirements>
            <requirement name="req1">
              <expr>H (alt &gt; 0)</expr>
              <description>altitude stays positive</description>
            </requirement>
            <requirement name="req2">
              <expr>O pressed</expr>
            </requirement>
          </requirements>
        </spec>
    "#;

    #[test]
    fn test_parse_document_tree() {
        let root = parse_document(DOC.as_bytes()).unwrap();
        assert_eq!(root.name, "");
        let spec = root.child_elements().next().unwrap();
        assert_eq!(spec.name, "spec");
    }

    #[test]
    fn test_descendant_selection() {
        let root = parse_document(DOC.as_bytes()).unwrap();
        let adapter = MarkupAdapter;
        let path = MarkupPath::parse("//requirement").unwrap();
        let matched = adapter.select_docs(&path, &root);
        assert_eq!(matched.len(), 2);
        assert_eq!(matched[0].attr("name"), Some("req1"));
    }

    #[test]
    fn test_absolute_path() {
        let root = parse_document(DOC.as_bytes()).unwrap();
        let adapter = MarkupAdapter;
        let path = MarkupPath::parse("/spec/requirements/requirement").unwrap();
        assert_eq!(adapter.select_docs(&path, &root).len(), 2);
    }

    #[test]
    fn test_scoped_value_selectors() {
        let root = parse_document(DOC.as_bytes()).unwrap();
        let adapter = MarkupAdapter;
        let collection = MarkupPath::parse("//requirement").unwrap();
        let elements = adapter.select_docs(&collection, &root);

        let name = MarkupPath::parse("@name").unwrap();
        let expr = MarkupPath::parse("expr").unwrap();
        let description = MarkupPath::parse("description").unwrap();

        assert_eq!(adapter.select_values(&name, &elements[0]), vec!["req1"]);
        assert_eq!(
            adapter.select_values(&expr, &elements[0]),
            vec!["H (alt > 0)"]
        );
        assert_eq!(
            adapter.select_values(&description, &elements[0]),
            vec!["altitude stays positive"]
        );
        // req2 has no description element
        assert!(adapter.select_values(&description, &elements[1]).is_empty());
    }

    #[test]
    fn test_text_target() {
        let root = parse_document(DOC.as_bytes()).unwrap();
        let adapter = MarkupAdapter;
        let path = MarkupPath::parse("//requirement/expr/text()").unwrap();
        let values = adapter.select_values(&path, &root);
        assert_eq!(values, vec!["H (alt > 0)", "O pressed"]);
    }

    #[test]
    fn test_parse_rejects_bad_paths() {
        assert!(MarkupPath::parse("").is_err());
        assert!(MarkupPath::parse("/").is_err());
        assert!(MarkupPath::parse("a///b").is_err());
        assert!(MarkupPath::parse("a/@n/b").is_err());
        assert!(MarkupPath::parse("a/text()/b").is_err());
        assert!(MarkupPath::parse("a/<b>").is_err());
    }

    #[test]
    fn test_malformed_document() {
        assert!(parse_document(b"<a><b></a>").is_err());
    }
}
