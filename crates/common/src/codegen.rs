//! Compiles an ordered step sequence into Playwright test source

use crate::catalog::{ActionCatalog, ActionSpec, LineTemplate};
use crate::pageobject;
use crate::types::{SelectorBinding, SelectorKind, StepDetails, TestCase};
use serde::Serialize;
use tracing::warn;

/// A compiled test script plus any steps the compiler had to skip
#[derive(Debug, Clone, Serialize)]
pub struct CompiledScript {
    pub code: String,
    pub skipped: Vec<SkippedStep>,
}

/// A step the compiler could not render
#[derive(Debug, Clone, Serialize)]
pub struct SkippedStep {
    pub step_id: i64,
    pub action: String,
    pub reason: SkipReason,
}

/// Why a step was skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    UnknownAction,
    MissingSelector,
    MissingValue,
    MissingAssertion,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::UnknownAction => write!(f, "unknown action"),
            SkipReason::MissingSelector => write!(f, "missing selector"),
            SkipReason::MissingValue => write!(f, "missing input value"),
            SkipReason::MissingAssertion => write!(f, "missing assertion value"),
        }
    }
}

/// Escape a literal for a single-quoted JS/TS string.
///
/// Backslash first, then the quote itself; control characters that would
/// split the line become their escape sequences.
pub fn escape_single_quoted(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out
}

/// Locator expression for a selector; xpath selectors carry the engine prefix
pub fn locator_expression(kind: SelectorKind, value: &str) -> String {
    match kind {
        SelectorKind::Css => value.to_string(),
        SelectorKind::Xpath => format!("xpath={}", value),
    }
}

/// Page-object class names referenced by the steps, in first-referenced
/// order. First-referenced (rather than alphabetical) keeps the import block
/// stable when steps are reordered without changing the referenced pages.
pub fn resolve_imports(steps: &[StepDetails]) -> Vec<String> {
    let mut classes: Vec<String> = Vec::new();
    for step in steps {
        if let Some(binding) = &step.selector {
            let class = pageobject::class_name(&binding.page_name);
            if !classes.contains(&class) {
                classes.push(class);
            }
        }
    }
    classes
}

/// Compile a test case's steps into one Playwright test's source text.
///
/// `steps` must already be in presentation order (`order_index` ascending,
/// id ascending on ties, as the store read provides); the compiler never
/// re-sorts. Steps with an unknown action kind or a missing required field
/// render nothing and are reported in `skipped` instead of failing the
/// compile. Output is byte-identical for identical inputs.
pub fn compile(test_case: &TestCase, steps: &[StepDetails], catalog: &ActionCatalog) -> CompiledScript {
    let mut skipped = Vec::new();
    let mut body: Vec<String> = Vec::new();

    if let Some(description) = &test_case.description {
        body.extend(comment_lines(description));
    }

    for step in steps {
        let spec = match catalog.get(&step.action) {
            Some(spec) => spec,
            None => {
                warn!(
                    step_id = step.id,
                    action = %step.action,
                    "skipping step with unknown action kind"
                );
                skipped.push(SkippedStep {
                    step_id: step.id,
                    action: step.action.clone(),
                    reason: SkipReason::UnknownAction,
                });
                continue;
            }
        };

        match render_step(spec, step) {
            Ok(line) => {
                if let Some(description) = &step.description {
                    body.extend(comment_lines(description));
                }
                body.push(line);
            }
            Err(reason) => {
                warn!(
                    step_id = step.id,
                    action = %step.action,
                    %reason,
                    "skipping step the catalog cannot render"
                );
                skipped.push(SkippedStep {
                    step_id: step.id,
                    action: step.action.clone(),
                    reason,
                });
            }
        }
    }

    let mut code = String::new();
    code.push_str("import { test, expect } from '@playwright/test';\n");
    for class in resolve_imports(steps) {
        code.push_str(&format!("import {{ {} }} from '../pages/{}';\n", class, class));
    }
    code.push('\n');
    code.push_str(&format!(
        "test('{}', async ({{ page }}) => {{\n",
        escape_single_quoted(&test_case.name)
    ));
    for line in &body {
        code.push_str("  ");
        code.push_str(line);
        code.push('\n');
    }
    code.push_str("});\n");

    CompiledScript { code, skipped }
}

/// Render one step to its script line, or say why it cannot be rendered
fn render_step(spec: &ActionSpec, step: &StepDetails) -> std::result::Result<String, SkipReason> {
    let locator = |binding: Option<&SelectorBinding>| {
        binding
            .map(|b| escape_single_quoted(&locator_expression(b.kind, &b.value)))
            .ok_or(SkipReason::MissingSelector)
    };
    let value = || {
        step.input_value
            .as_deref()
            .map(escape_single_quoted)
            .ok_or(SkipReason::MissingValue)
    };
    let assertion = || {
        step.assertion_value
            .as_deref()
            .map(escape_single_quoted)
            .ok_or(SkipReason::MissingAssertion)
    };
    let binding = step.selector.as_ref();

    let line = match spec.template {
        LineTemplate::Page { method } => format!("await page.{}();", method),
        LineTemplate::PageWithValue { method } => {
            format!("await page.{}('{}');", method, value()?)
        }
        LineTemplate::Locator { method } => {
            format!("await page.locator('{}').{}();", locator(binding)?, method)
        }
        LineTemplate::LocatorWithValue { method } => format!(
            "await page.locator('{}').{}('{}');",
            locator(binding)?,
            method,
            value()?
        ),
        LineTemplate::ExpectLocator { method } => format!(
            "await expect(page.locator('{}')).{}();",
            locator(binding)?,
            method
        ),
        LineTemplate::ExpectLocatorWithValue { method } => format!(
            "await expect(page.locator('{}')).{}('{}');",
            locator(binding)?,
            method,
            assertion()?
        ),
        LineTemplate::ExpectPage { method } => {
            format!("await expect(page).{}('{}');", method, assertion()?)
        }
    };
    Ok(line)
}

/// Split free text into `//` comment lines, one per non-empty source line
fn comment_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .map(|line| format!("// {}", line))
        .collect()
}
