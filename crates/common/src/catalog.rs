//! Action catalog: the closed set of step kinds and their line templates

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Step action kinds understood by the compiler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Navigate,
    Click,
    Type,
    Assert,
    Wait,
    DoubleClick,
    Hover,
    Check,
    Uncheck,
    Clear,
    Press,
    SelectOption,
    GoBack,
    Reload,
    WaitForUrl,
    AssertVisible,
    AssertHidden,
    AssertValue,
    AssertUrl,
    AssertTitle,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Navigate => "navigate",
            ActionKind::Click => "click",
            ActionKind::Type => "type",
            ActionKind::Assert => "assert",
            ActionKind::Wait => "wait",
            ActionKind::DoubleClick => "double_click",
            ActionKind::Hover => "hover",
            ActionKind::Check => "check",
            ActionKind::Uncheck => "uncheck",
            ActionKind::Clear => "clear",
            ActionKind::Press => "press",
            ActionKind::SelectOption => "select_option",
            ActionKind::GoBack => "go_back",
            ActionKind::Reload => "reload",
            ActionKind::WaitForUrl => "wait_for_url",
            ActionKind::AssertVisible => "assert_visible",
            ActionKind::AssertHidden => "assert_hidden",
            ActionKind::AssertValue => "assert_value",
            ActionKind::AssertUrl => "assert_url",
            ActionKind::AssertTitle => "assert_title",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Shape of the single script line a step renders to.
///
/// Every action kind maps onto one of these shapes, so adding a kind is one
/// catalog row rather than a new compiler branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineTemplate {
    /// `await page.<method>();`
    Page { method: &'static str },
    /// `await page.<method>('<value>');`
    PageWithValue { method: &'static str },
    /// `await page.locator('<selector>').<method>();`
    Locator { method: &'static str },
    /// `await page.locator('<selector>').<method>('<value>');`
    LocatorWithValue { method: &'static str },
    /// `await expect(page.locator('<selector>')).<method>();`
    ExpectLocator { method: &'static str },
    /// `await expect(page.locator('<selector>')).<method>('<assertion>');`
    ExpectLocatorWithValue { method: &'static str },
    /// `await expect(page).<method>('<assertion>');`
    ExpectPage { method: &'static str },
}

/// Catalog row describing one action kind
#[derive(Debug, Clone)]
pub struct ActionSpec {
    pub kind: ActionKind,
    pub description: &'static str,
    pub has_selector: bool,
    pub has_value: bool,
    pub has_assertion: bool,
    pub template: LineTemplate,
}

/// Read-only lookup from action kind name to its catalog row
#[derive(Debug, Clone)]
pub struct ActionCatalog {
    specs: Vec<ActionSpec>,
}

impl ActionCatalog {
    /// The built-in catalog covering every `ActionKind`
    pub fn builtin() -> Self {
        use ActionKind::*;
        use LineTemplate::*;

        let spec = |kind,
                    description,
                    has_selector,
                    has_value,
                    has_assertion,
                    template| ActionSpec {
            kind,
            description,
            has_selector,
            has_value,
            has_assertion,
            template,
        };

        Self {
            specs: vec![
                spec(Navigate, "Navigate to a URL", false, true, false, PageWithValue { method: "goto" }),
                spec(Click, "Click an element", true, false, false, Locator { method: "click" }),
                spec(Type, "Type text into an input", true, true, false, LocatorWithValue { method: "fill" }),
                spec(Assert, "Assert an element's text content", true, false, true, ExpectLocatorWithValue { method: "toHaveText" }),
                spec(Wait, "Wait for an element", true, false, false, Locator { method: "waitFor" }),
                spec(DoubleClick, "Double-click an element", true, false, false, Locator { method: "dblclick" }),
                spec(Hover, "Hover over an element", true, false, false, Locator { method: "hover" }),
                spec(Check, "Check a checkbox", true, false, false, Locator { method: "check" }),
                spec(Uncheck, "Uncheck a checkbox", true, false, false, Locator { method: "uncheck" }),
                spec(Clear, "Clear an input's value", true, false, false, Locator { method: "clear" }),
                spec(Press, "Press a key on an element", true, true, false, LocatorWithValue { method: "press" }),
                spec(SelectOption, "Select an option from a dropdown", true, true, false, LocatorWithValue { method: "selectOption" }),
                spec(GoBack, "Go back in browser history", false, false, false, Page { method: "goBack" }),
                spec(Reload, "Reload the current page", false, false, false, Page { method: "reload" }),
                spec(WaitForUrl, "Wait until the page URL matches", false, true, false, PageWithValue { method: "waitForURL" }),
                spec(AssertVisible, "Assert an element is visible", true, false, false, ExpectLocator { method: "toBeVisible" }),
                spec(AssertHidden, "Assert an element is hidden", true, false, false, ExpectLocator { method: "toBeHidden" }),
                spec(AssertValue, "Assert an input's value", true, false, true, ExpectLocatorWithValue { method: "toHaveValue" }),
                spec(AssertUrl, "Assert the page URL", false, false, true, ExpectPage { method: "toHaveURL" }),
                spec(AssertTitle, "Assert the page title", false, false, true, ExpectPage { method: "toHaveTitle" }),
            ],
        }
    }

    /// Look up a catalog row by kind name
    pub fn get(&self, name: &str) -> Option<&ActionSpec> {
        self.specs.iter().find(|s| s.kind.as_str() == name)
    }

    /// All catalog rows, in catalog order
    pub fn specs(&self) -> &[ActionSpec] {
        &self.specs
    }

    /// Validate step fields against the catalog before they are stored.
    ///
    /// Unknown kinds are rejected here; at compile time they downgrade to a
    /// skip-with-warning instead.
    pub fn validate_step(
        &self,
        action: &str,
        has_selector: bool,
        has_value: bool,
        has_assertion: bool,
    ) -> Result<()> {
        let spec = self
            .get(action)
            .ok_or_else(|| Error::UnsupportedAction(action.to_string()))?;

        if spec.has_selector && !has_selector {
            return Err(Error::InvalidPayload(format!(
                "action '{}' requires a selector",
                action
            )));
        }
        if spec.has_value && !has_value {
            return Err(Error::InvalidPayload(format!(
                "action '{}' requires an input value",
                action
            )));
        }
        if spec.has_assertion && !has_assertion {
            return Err(Error::InvalidPayload(format!(
                "action '{}' requires an assertion value",
                action
            )));
        }
        Ok(())
    }
}

impl Default for ActionCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
