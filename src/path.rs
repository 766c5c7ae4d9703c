//! Context path evaluation
//!
//! Rules designate the nodes they constrain with a restricted XPath subset:
//!
//! - `//a/b/c` - find `a` anywhere in the tree, then `b` and `c` as direct children
//! - `/a/b` or `a/b` - start at the root element, which must be `a`
//! - `//a/@id` - a final `@name` step asks whether the matched element carries `id`
//! - `x:name` - namespace prefixes are ignored, steps match on local name
//!
//! Predicates, positional indices, wildcards, axes and functions are rejected
//! with a [`PathError`]. Only the first match in document order is ever
//! reported; repeated matches of the same path are not distinguished.

use crate::parser::{Element, Node};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("path '{0}' contains an empty step")]
    EmptyStep(String),
    #[error("attribute step must be the last step in path '{0}'")]
    MisplacedAttribute(String),
    #[error("path '{0}' has no element step")]
    MissingElementStep(String),
    #[error("unsupported syntax '{syntax}' in path '{path}'")]
    Unsupported { path: String, syntax: String },
}

/// Where the first step is looked up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// The first step must name the root element
    Root,
    /// The first step may match any element, searched in document order
    Anywhere,
}

/// A parsed context path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExpr {
    source: String,
    anchor: Anchor,
    steps: Vec<String>,
    attribute: Option<String>,
}

/// The first full match of a path in a tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMatch<'a> {
    /// Element matched by the last element step
    pub element: &'a Element,
    /// Value of the final `@attribute` step, if the path has one
    pub attribute_value: Option<&'a str>,
    /// The path ends in `@attribute` but the element does not carry it
    pub missing_attribute: bool,
    /// Location token reported for this match
    pub location: String,
}

impl PathMatch<'_> {
    /// The value rules assert on: the attribute value for `@` paths,
    /// otherwise the element's trimmed text
    pub fn value(&self) -> String {
        match self.attribute_value {
            Some(v) => v.to_string(),
            None => self.element.text_content().trim().to_string(),
        }
    }
}

const UNSUPPORTED_CHARS: &[char] = &['[', ']', '*', '(', ')', '|', '=', '"', '\'', '$', ' ', '\t'];

impl PathExpr {
    /// Parse a context path
    pub fn parse(path: &str) -> Result<Self, PathError> {
        let source = path.trim();
        let (anchor, rest) = if let Some(rest) = source.strip_prefix("//") {
            (Anchor::Anywhere, rest)
        } else if let Some(rest) = source.strip_prefix('/') {
            (Anchor::Root, rest)
        } else {
            (Anchor::Root, source)
        };

        let parts: Vec<&str> = rest.split('/').collect();
        let last = parts.len() - 1;
        let mut steps = Vec::with_capacity(parts.len());
        let mut attribute = None;

        for (i, part) in parts.iter().enumerate() {
            if part.is_empty() {
                return Err(PathError::EmptyStep(source.to_string()));
            }

            let (is_attribute, name) = match part.strip_prefix('@') {
                Some(name) => (true, name),
                None => (false, *part),
            };

            if name.is_empty() {
                return Err(PathError::EmptyStep(source.to_string()));
            }
            if name.contains("::") || name == "." || name == ".." || name.contains(UNSUPPORTED_CHARS) {
                return Err(PathError::Unsupported {
                    path: source.to_string(),
                    syntax: part.to_string(),
                });
            }

            let local = local_name(name).to_string();
            if is_attribute {
                if i != last {
                    return Err(PathError::MisplacedAttribute(source.to_string()));
                }
                attribute = Some(local);
            } else {
                steps.push(local);
            }
        }

        if steps.is_empty() {
            return Err(PathError::MissingElementStep(source.to_string()));
        }

        Ok(Self {
            source: source.to_string(),
            anchor,
            steps,
            attribute,
        })
    }

    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    /// Element steps, local names
    pub fn steps(&self) -> &[String] {
        &self.steps
    }

    /// Name of the final `@attribute` step
    pub fn attribute(&self) -> Option<&str> {
        self.attribute.as_deref()
    }

    /// The path as written, trimmed
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Find the first full match in document order
    ///
    /// A final `@attribute` step only matches elements carrying the attribute.
    pub fn find_match<'a>(&self, tree: &'a Node) -> Option<PathMatch<'a>> {
        self.search(tree, true)
    }

    /// Find the first element matched by the element steps alone
    ///
    /// A final `@attribute` step does not take part in matching; if the
    /// element lacks it the match reports [`PathMatch::missing_attribute`].
    pub fn find_element_match<'a>(&self, tree: &'a Node) -> Option<PathMatch<'a>> {
        self.search(tree, false)
    }

    fn search<'a>(&self, tree: &'a Node, require_attribute: bool) -> Option<PathMatch<'a>> {
        let (first, rest) = self.steps.split_first()?;
        match self.anchor {
            Anchor::Root => tree
                .as_element()
                .filter(|root| root.name == *first)
                .and_then(|root| self.match_from(root, rest, require_attribute)),
            Anchor::Anywhere => tree
                .descendants()
                .filter_map(Node::as_element)
                .filter(|e| e.name == *first)
                .find_map(|e| self.match_from(e, rest, require_attribute)),
        }
    }

    fn match_from<'a>(
        &self,
        element: &'a Element,
        rest: &[String],
        require_attribute: bool,
    ) -> Option<PathMatch<'a>> {
        match rest.split_first() {
            None => self.finish(element, require_attribute),
            Some((step, tail)) => element
                .child_elements()
                .filter(|child| child.name == *step)
                .find_map(|child| self.match_from(child, tail, require_attribute)),
        }
    }

    fn finish<'a>(&self, element: &'a Element, require_attribute: bool) -> Option<PathMatch<'a>> {
        let attribute_value = match &self.attribute {
            Some(name) => match element.attr(name) {
                Some(value) => Some(value),
                None if require_attribute => return None,
                None => None,
            },
            None => None,
        };
        Some(PathMatch {
            element,
            attribute_value,
            missing_attribute: self.attribute.is_some() && attribute_value.is_none(),
            location: self.source.clone(),
        })
    }
}

fn local_name(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

/// Evaluate `path` against `tree`, returning the location of the first match
///
/// An empty path never matches.
pub fn evaluate(tree: &Node, path: &str) -> Result<Option<String>, PathError> {
    if path.trim().is_empty() {
        return Ok(None);
    }
    let expr = PathExpr::parse(path)?;
    Ok(expr.find_match(tree).map(|m| m.location))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    const DOC: &str = r#"<dmodule>
  <identAndStatusSection>
    <dmAddress>
      <dmIdent>
        <dmCode modelIdentCode="DEMO" systemCode="00"/>
        <language languageIsoCode="en" countryIsoCode="US"/>
      </dmIdent>
      <dmAddressItems>
        <issueDate year="2024" month="01" day="01"/>
        <dmTitle>
          <techName>Technical Document</techName>
        </dmTitle>
      </dmAddressItems>
    </dmAddress>
  </identAndStatusSection>
  <content/>
</dmodule>"#;

    #[test]
    fn test_parse_anywhere() {
        let expr = PathExpr::parse("//dmTitle/techName").unwrap();
        assert_eq!(expr.anchor(), Anchor::Anywhere);
        assert_eq!(expr.steps(), &["dmTitle".to_string(), "techName".to_string()]);
        assert_eq!(expr.attribute(), None);
    }

    #[test]
    fn test_parse_rooted_and_relative() {
        assert_eq!(PathExpr::parse("/dmodule/content").unwrap().anchor(), Anchor::Root);
        assert_eq!(PathExpr::parse("dmodule/content").unwrap().anchor(), Anchor::Root);
    }

    #[test]
    fn test_parse_attribute_step() {
        let expr = PathExpr::parse("//dmCode/@modelIdentCode").unwrap();
        assert_eq!(expr.steps(), &["dmCode".to_string()]);
        assert_eq!(expr.attribute(), Some("modelIdentCode"));
    }

    #[test]
    fn test_parse_strips_prefixes() {
        let expr = PathExpr::parse("//s:dmCode/@xml:lang").unwrap();
        assert_eq!(expr.steps(), &["dmCode".to_string()]);
        assert_eq!(expr.attribute(), Some("lang"));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(PathExpr::parse("a//b"), Err(PathError::EmptyStep(_))));
        assert!(matches!(PathExpr::parse("/"), Err(PathError::EmptyStep(_))));
        assert!(matches!(PathExpr::parse("//a/"), Err(PathError::EmptyStep(_))));
        assert!(matches!(PathExpr::parse("//a/@"), Err(PathError::EmptyStep(_))));
        assert!(matches!(PathExpr::parse("//a/@id/b"), Err(PathError::MisplacedAttribute(_))));
        assert!(matches!(PathExpr::parse("//@id"), Err(PathError::MissingElementStep(_))));
        assert!(matches!(PathExpr::parse("//a[1]"), Err(PathError::Unsupported { .. })));
        assert!(matches!(PathExpr::parse("//a/*"), Err(PathError::Unsupported { .. })));
        assert!(matches!(PathExpr::parse("//a/text()"), Err(PathError::Unsupported { .. })));
        assert!(matches!(PathExpr::parse("//a/child::b"), Err(PathError::Unsupported { .. })));
        assert!(matches!(PathExpr::parse("//a/.."), Err(PathError::Unsupported { .. })));
    }

    #[test]
    fn test_evaluate_anywhere() {
        let tree = parse(DOC).unwrap();
        assert_eq!(
            evaluate(&tree, "//dmTitle/techName").unwrap(),
            Some("//dmTitle/techName".to_string())
        );
        assert_eq!(evaluate(&tree, "//issueDate").unwrap(), Some("//issueDate".to_string()));
        assert_eq!(evaluate(&tree, "//dmTitle/infoName").unwrap(), None);
    }

    #[test]
    fn test_evaluate_requires_direct_children() {
        let tree = parse(DOC).unwrap();
        // techName is a grandchild of dmAddressItems, not a child
        assert_eq!(evaluate(&tree, "//dmAddressItems/techName").unwrap(), None);
        assert!(evaluate(&tree, "//dmAddressItems/dmTitle/techName").unwrap().is_some());
    }

    #[test]
    fn test_evaluate_rooted() {
        let tree = parse(DOC).unwrap();
        assert!(evaluate(&tree, "/dmodule/content").unwrap().is_some());
        assert!(evaluate(&tree, "dmodule/identAndStatusSection/dmAddress").unwrap().is_some());
        assert_eq!(evaluate(&tree, "/content").unwrap(), None);
        assert_eq!(evaluate(&tree, "/dmAddress/dmIdent").unwrap(), None);
    }

    #[test]
    fn test_evaluate_attribute_presence() {
        let tree = parse(DOC).unwrap();
        assert!(evaluate(&tree, "//dmCode/@modelIdentCode").unwrap().is_some());
        assert_eq!(evaluate(&tree, "//dmCode/@infoCode").unwrap(), None);
    }

    #[test]
    fn test_evaluate_empty_path() {
        let tree = parse(DOC).unwrap();
        assert_eq!(evaluate(&tree, "").unwrap(), None);
        assert_eq!(evaluate(&tree, "   ").unwrap(), None);
    }

    #[test]
    fn test_evaluate_propagates_path_errors() {
        let tree = parse(DOC).unwrap();
        assert!(evaluate(&tree, "//dmCode[@systemCode='00']").is_err());
    }

    #[test]
    fn test_backtracks_to_later_anchor() {
        // The first <a> has no <b>; the second one does
        let tree = parse("<r><a><c/></a><a><b/></a></r>").unwrap();
        let expr = PathExpr::parse("//a/b").unwrap();
        assert!(expr.find_match(&tree).is_some());
    }

    #[test]
    fn test_backtracks_across_siblings() {
        let tree = parse(r#"<r><a><b/><b><c k="1"/></b></a></r>"#).unwrap();
        let m = PathExpr::parse("//a/b/c/@k").unwrap().find_match(&tree).unwrap();
        assert_eq!(m.attribute_value, Some("1"));
    }

    #[test]
    fn test_element_match_ignores_attribute_step() {
        let tree = parse(r#"<r><dmCode/><dmCode modelIdentCode="DEMO"/></r>"#).unwrap();
        let expr = PathExpr::parse("//dmCode/@modelIdentCode").unwrap();

        let full = expr.find_match(&tree).unwrap();
        assert_eq!(full.attribute_value, Some("DEMO"));
        assert!(!full.missing_attribute);

        let first = expr.find_element_match(&tree).unwrap();
        assert_eq!(first.attribute_value, None);
        assert!(first.missing_attribute);
        assert_eq!(first.location, "//dmCode/@modelIdentCode");
    }

    #[test]
    fn test_element_match_without_attribute_step() {
        let tree = parse(DOC).unwrap();
        let m = PathExpr::parse("//techName").unwrap().find_element_match(&tree).unwrap();
        assert!(!m.missing_attribute);
        assert_eq!(m.value(), "Technical Document");
    }

    #[test]
    fn test_first_match_in_document_order() {
        let tree = parse("<r><t>first</t><x><t>second</t></x></r>").unwrap();
        let m = PathExpr::parse("//t").unwrap().find_match(&tree).unwrap();
        assert_eq!(m.value(), "first");
    }

    #[test]
    fn test_match_value() {
        let tree = parse(DOC).unwrap();
        let tech = PathExpr::parse("//techName").unwrap().find_match(&tree).unwrap();
        assert_eq!(tech.value(), "Technical Document");

        let lang = PathExpr::parse("//language/@languageIsoCode")
            .unwrap()
            .find_match(&tree)
            .unwrap();
        assert_eq!(lang.value(), "en");
        assert_eq!(lang.element.name, "language");
    }

    #[test]
    fn test_location_is_trimmed_path() {
        let tree = parse(DOC).unwrap();
        assert_eq!(
            evaluate(&tree, "  //issueDate ").unwrap(),
            Some("//issueDate".to_string())
        );
    }

    #[test]
    fn test_evaluate_is_deterministic() {
        let tree = parse(DOC).unwrap();
        let first = evaluate(&tree, "//dmIdent/language/@countryIsoCode").unwrap();
        for _ in 0..5 {
            assert_eq!(evaluate(&tree, "//dmIdent/language/@countryIsoCode").unwrap(), first);
        }
    }

    #[test]
    fn test_text_root_never_matches() {
        let tree = Node::Text("loose".to_string());
        assert_eq!(evaluate(&tree, "/loose").unwrap(), None);
        assert_eq!(evaluate(&tree, "//loose").unwrap(), None);
    }
}
