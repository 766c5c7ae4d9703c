//! Structural backbone check
//!
//! Confirms that the fixed minimum of elements every data module needs is
//! present, independent of any business rules.

use crate::diagnostics::StructureResult;
use crate::parser::{Element, Node};

/// A required element and the elements required directly beneath it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requirement {
    pub name: &'static str,
    pub children: &'static [Requirement],
}

impl Requirement {
    pub const fn leaf(name: &'static str) -> Self {
        Self { name, children: &[] }
    }
}

/// `dmodule` > `identAndStatusSection` > `dmAddress` > `dmIdent`
pub const BACKBONE: Requirement = Requirement {
    name: "dmodule",
    children: &[Requirement {
        name: "identAndStatusSection",
        children: &[Requirement {
            name: "dmAddress",
            children: &[Requirement::leaf("dmIdent")],
        }],
    }],
};

/// Check a tree against the data module backbone
pub fn validate_structure(tree: &Node) -> StructureResult {
    validate_against(tree, &BACKBONE)
}

/// Check a tree against an arbitrary backbone
///
/// Every missing element is reported once. Siblings are still checked after a
/// miss, but nothing below a missing element is.
pub fn validate_against(tree: &Node, backbone: &Requirement) -> StructureResult {
    let mut errors = Vec::new();

    match tree.as_element() {
        None => errors.push("Document has no root element".to_string()),
        Some(root) if root.name != backbone.name => errors.push(format!(
            "Root element must be <{}>, found <{}>",
            backbone.name, root.name
        )),
        Some(root) => check_children(root, backbone, &mut errors),
    }

    StructureResult::from_errors(errors)
}

fn check_children(element: &Element, requirement: &Requirement, errors: &mut Vec<String>) {
    for required in requirement.children {
        match element.child(required.name) {
            Some(child) => check_children(child, required, errors),
            None => errors.push(format!(
                "Missing required element <{}> in <{}>",
                required.name, requirement.name
            )),
        }
    }
}
