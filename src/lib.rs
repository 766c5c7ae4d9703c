//! s1000d-lint: structural and business-rule validation for S1000D data modules
//!
//! A document is parsed once into a small owned tree, checked for the
//! required data module backbone, and then run against the active rule set.
//! Rules come either from the built-in defaults or from a BREX rule document
//! loaded at runtime.
//!
//! ```
//! use s1000d_lint::Validator;
//!
//! let validator = Validator::default();
//! let result = validator.validate("<dmodule/>");
//! assert!(!result.schema_valid);
//! assert!(result.brex_valid);
//! ```

pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod output;
pub mod parser;
pub mod path;
pub mod rules;
pub mod session;
pub mod structure;

pub use config::{CliOptions, Config, ConfigError};
pub use diagnostics::{BrexResult, CombinedResult, Severity, StructureResult, Violation};
pub use engine::{validate_with, Statistics, Validator};
pub use parser::{parse, Document, Element, Node, ParseError};
pub use path::{evaluate, PathError, PathExpr};
pub use rules::{Assertion, ExtractError, Rule, RuleSet};
pub use session::{Offer, ResultGate, Ticket, ValidationSession};
pub use structure::validate_structure;
