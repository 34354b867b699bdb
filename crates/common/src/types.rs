//! Core types for Stepwright

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// A page of the application under test.
///
/// Each page is exported as one page-object module; its selectors become
/// locator fields of the generated class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub id: i64,
    pub name: String,
    pub url_pattern: Option<String>,
    pub description: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Locator syntax of a selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectorKind {
    Css,
    Xpath,
}

impl SelectorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectorKind::Css => "css",
            SelectorKind::Xpath => "xpath",
        }
    }
}

impl Default for SelectorKind {
    fn default() -> Self {
        Self::Css
    }
}

impl std::fmt::Display for SelectorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SelectorKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "css" => Ok(SelectorKind::Css),
            "xpath" => Ok(SelectorKind::Xpath),
            other => Err(Error::InvalidPayload(format!(
                "unknown selector kind '{}'",
                other
            ))),
        }
    }
}

/// A named element locator belonging to a page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Selector {
    pub id: i64,
    pub page_id: i64,
    pub name: String,
    pub kind: SelectorKind,
    pub value: String,
    pub description: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Catalog descriptor row as exposed over the API.
///
/// Mirrors one `ActionSpec` of the built-in catalog; the store table is a
/// read-only projection for UIs, not the source of validity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionType {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub has_selector: bool,
    pub has_value: bool,
    pub has_assertion: bool,
}

/// A group of test cases
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuite {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A named ordered collection of steps within a suite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    pub id: i64,
    pub suite_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// One stored step of a test case.
///
/// `order_index` is unique within the owning case after any successful
/// reorder; the sequencer enforces this, the schema deliberately does not
/// (a legal swap transiently violates an immediate UNIQUE constraint).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestStep {
    pub id: i64,
    pub test_case_id: i64,
    pub action: String,
    pub selector_id: Option<i64>,
    pub input_value: Option<String>,
    pub assertion_value: Option<String>,
    pub description: Option<String>,
    pub order_index: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Fields accepted when creating a step.
///
/// `order_index` defaults to one past the current maximum when omitted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewStep {
    pub action: String,
    pub selector_id: Option<i64>,
    pub input_value: Option<String>,
    pub assertion_value: Option<String>,
    pub description: Option<String>,
    pub order_index: Option<i64>,
}

/// Full replacement of a step's mutable fields.
///
/// `order_index` is absent on purpose: the sequencer's reorder protocol is
/// the only writer of step positions.
#[derive(Debug, Clone, Deserialize)]
pub struct StepPatch {
    pub action: String,
    pub selector_id: Option<i64>,
    pub input_value: Option<String>,
    pub assertion_value: Option<String>,
    pub description: Option<String>,
}

/// One entry of a proposed ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepPosition {
    pub id: i64,
    pub order_index: i64,
}

/// Selector data resolved onto a step via its `selector_id`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorBinding {
    pub name: String,
    pub kind: SelectorKind,
    pub value: String,
    pub page_name: String,
}

/// A step joined with its selector binding, in presentation order.
///
/// This is the shape the compiler consumes and the step listing returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepDetails {
    pub id: i64,
    pub test_case_id: i64,
    pub action: String,
    pub selector_id: Option<i64>,
    pub input_value: Option<String>,
    pub assertion_value: Option<String>,
    pub description: Option<String>,
    pub order_index: i64,
    pub created_at: i64,
    pub updated_at: i64,
    pub selector: Option<SelectorBinding>,
}
