//! Generates Playwright page-object module source for a page

use crate::codegen::{escape_single_quoted, locator_expression};
use crate::types::{Page, Selector};

/// PascalCase words of a name, dropping anything that is not alphanumeric
fn pascal_case(name: &str) -> String {
    let mut out = String::new();
    for word in name
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

/// camelCase variant of `pascal_case`
fn camel_case(name: &str) -> String {
    let pascal = pascal_case(name);
    let mut chars = pascal.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => pascal,
    }
}

/// Exported class name for a page: PascalCase plus the `Page` suffix
pub fn class_name(page_name: &str) -> String {
    format!("{}Page", pascal_case(page_name))
}

/// Render one page's Playwright page-object module.
///
/// One private locator expression field per selector, an accessor and
/// `click…`/`fill…` helpers per selector, and a `goto()` when the page has a
/// URL pattern. Interpolated literals go through the same escaper as the
/// test compiler, so quotes in selector values survive.
pub fn generate_page_object(page: &Page, selectors: &[Selector]) -> String {
    let class = class_name(&page.name);
    let mut code = String::new();

    code.push_str("import { Page } from '@playwright/test';\n\n");
    code.push_str(&format!("export class {} {{\n", class));
    code.push_str("  constructor(private page: Page) {}\n");

    if !selectors.is_empty() {
        code.push_str("\n  // Selectors\n");
        for selector in selectors {
            let expression = locator_expression(selector.kind, &selector.value);
            code.push_str(&format!(
                "  private {}Selector = '{}';\n",
                camel_case(&selector.name),
                escape_single_quoted(&expression)
            ));
        }

        code.push_str("\n  // Methods\n");
        for selector in selectors {
            let accessor = camel_case(&selector.name);
            let suffix = pascal_case(&selector.name);
            code.push_str(&format!(
                "  async {}() {{\n    return this.page.locator(this.{}Selector);\n  }}\n\n",
                accessor, accessor
            ));
            code.push_str(&format!(
                "  async click{}() {{\n    const element = await this.{}();\n    await element.click();\n  }}\n\n",
                suffix, accessor
            ));
            code.push_str(&format!(
                "  async fill{}(value: string) {{\n    const element = await this.{}();\n    await element.fill(value);\n  }}\n\n",
                suffix, accessor
            ));
        }
    } else {
        code.push('\n');
    }

    if let Some(url) = &page.url_pattern {
        code.push_str(&format!(
            "  async goto() {{\n    await this.page.goto('{}');\n  }}\n",
            escape_single_quoted(url)
        ));
    }

    code.push_str("}\n");
    code
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SelectorKind;

    fn page(name: &str, url: Option<&str>) -> Page {
        Page {
            id: 1,
            name: name.to_string(),
            url_pattern: url.map(String::from),
            description: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn selector(name: &str, kind: SelectorKind, value: &str) -> Selector {
        Selector {
            id: 1,
            page_id: 1,
            name: name.to_string(),
            kind,
            value: value.to_string(),
            description: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_class_name() {
        assert_eq!(class_name("login"), "LoginPage");
        assert_eq!(class_name("user profile"), "UserProfilePage");
        assert_eq!(class_name("checkout-v2"), "CheckoutV2Page");
        assert_eq!(class_name("admin_settings"), "AdminSettingsPage");
    }

    #[test]
    fn test_generated_module_shape() {
        let p = page("login", Some("https://example.com/login"));
        let selectors = vec![
            selector("email input", SelectorKind::Css, "#email"),
            selector("submit", SelectorKind::Xpath, "//button[@type='submit']"),
        ];

        let code = generate_page_object(&p, &selectors);

        assert!(code.starts_with("import { Page } from '@playwright/test';\n"));
        assert!(code.contains("export class LoginPage {"));
        assert!(code.contains("  private emailInputSelector = '#email';\n"));
        // xpath values carry the engine prefix and survive quoting
        assert!(code.contains("  private submitSelector = 'xpath=//button[@type=\\'submit\\']';\n"));
        assert!(code.contains("  async emailInput() {\n    return this.page.locator(this.emailInputSelector);\n  }"));
        assert!(code.contains("  async clickEmailInput() {"));
        assert!(code.contains("  async fillSubmit(value: string) {"));
        assert!(code.contains("  async goto() {\n    await this.page.goto('https://example.com/login');\n  }"));
        assert!(code.ends_with("}\n"));
    }

    #[test]
    fn test_goto_omitted_without_url() {
        let code = generate_page_object(&page("blank", None), &[]);
        assert!(!code.contains("goto"));
        assert!(code.contains("export class BlankPage {"));
    }

    #[test]
    fn test_generation_is_deterministic() {
        let p = page("home", Some("/"));
        let selectors = vec![selector("logo", SelectorKind::Css, ".logo")];
        assert_eq!(
            generate_page_object(&p, &selectors),
            generate_page_object(&p, &selectors)
        );
    }
}
