//! Rule extraction from BREX rule-authoring documents
//!
//! Expected shape (element names are matched on local name):
//!
//! ```xml
//! <brex>
//!   <contextRules>
//!     <structureObjectRuleGroup>
//!       <structureObjectRule>
//!         <objectPath id="R1">//dmCode/@itemLocationCode</objectPath>
//!         <objectUse type="error"><value>Item location code not allowed</value></objectUse>
//!       </structureObjectRule>
//!       <!-- entries may also sit directly in the group -->
//!       <objectPath id="R2">//warning</objectPath>
//!       <objectUse type="warning"><value>Avoid warnings</value></objectUse>
//!     </structureObjectRuleGroup>
//!   </contextRules>
//! </brex>
//! ```

use super::Rule;
use crate::parser::{self, Element, Node, ParseError};
use crate::Severity;
use thiserror::Error;

const CONTAINER: &str = "contextRules";
const GROUP: &str = "structureObjectRuleGroup";
const WRAPPER: &str = "structureObjectRule";
const ENTRY: &str = "objectPath";
const USAGE: &str = "objectUse";
const MESSAGE: &str = "value";

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Rule document is not well-formed: {0}")]
    Parse(#[from] ParseError),
    #[error("Rule document has no <contextRules> element")]
    MissingContainer,
    #[error("<contextRules> contains no <structureObjectRuleGroup> element")]
    MissingGroups,
}

/// Extract rules in document order
pub fn extract(text: &str) -> Result<Vec<Rule>, ExtractError> {
    let tree = parser::parse(text)?;
    extract_from_tree(&tree)
}

/// Extract rules from an already parsed rule document
pub fn extract_from_tree(tree: &Node) -> Result<Vec<Rule>, ExtractError> {
    let container = tree
        .descendants()
        .filter_map(Node::as_element)
        .find(|e| e.name == CONTAINER)
        .ok_or(ExtractError::MissingContainer)?;

    let groups: Vec<&Element> = container
        .child_elements()
        .filter(|e| e.name == GROUP)
        .collect();
    if groups.is_empty() {
        return Err(ExtractError::MissingGroups);
    }

    let mut rules = Vec::new();
    for group in groups {
        let children: Vec<&Element> = group.child_elements().collect();
        for (i, child) in children.iter().enumerate() {
            match child.name.as_str() {
                ENTRY => rules.push(entry_rule(&children, i)),
                WRAPPER => {
                    let inner: Vec<&Element> = child.child_elements().collect();
                    rules.extend(
                        (0..inner.len())
                            .filter(|&j| inner[j].name == ENTRY)
                            .map(|j| entry_rule(&inner, j)),
                    );
                }
                _ => {}
            }
        }
    }
    Ok(rules)
}

/// Build the rule for the `objectPath` at `siblings[at]`, pairing it with the
/// first `objectUse` that follows before the next entry
fn entry_rule(siblings: &[&Element], at: usize) -> Rule {
    let entry = siblings[at];
    let usage = siblings[at + 1..]
        .iter()
        .take_while(|e| e.name != ENTRY)
        .find(|e| e.name == USAGE);

    let severity = usage
        .and_then(|u| u.attr("type"))
        .map(usage_severity)
        .unwrap_or(Severity::Info);
    let message = usage
        .and_then(|u| u.child(MESSAGE))
        .map(|v| v.text_content().trim().to_string())
        .unwrap_or_default();

    Rule::new(
        entry.attr("id").unwrap_or_default(),
        severity,
        entry.text_content().trim(),
        message,
    )
}

fn usage_severity(kind: &str) -> Severity {
    match kind.trim().to_ascii_lowercase().as_str() {
        "error" => Severity::Error,
        "warning" => Severity::Warning,
        _ => Severity::Info,
    }
}
