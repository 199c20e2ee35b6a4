//! HTML templates for list entries, popups and the standalone map page.
//!
//! Template names end in `.html` so minijinja auto-escapes every value.

use minijinja::Environment;
use std::sync::OnceLock;

use crate::error::RenderError;

static ENTRY_TMPL: &str = include_str!("./templates/entry.html");
static LIST_TMPL: &str = include_str!("./templates/list.html");
static POPUP_TMPL: &str = include_str!("./templates/popup.html");
static PAGE_TMPL: &str = include_str!("./templates/page.html");
static QUERY_POPUP_TMPL: &str = include_str!("./templates/query_popup.html");

pub const ENTRY: &str = "entry.html";
pub const LIST: &str = "list.html";
pub const POPUP: &str = "popup.html";
pub const PAGE: &str = "page.html";
pub const QUERY_POPUP: &str = "query_popup.html";

static ENV: OnceLock<Environment<'static>> = OnceLock::new();

fn build() -> Environment<'static> {
    let mut env = Environment::new();
    // Sources are compile-time constants; a parse failure surfaces at render time
    for (name, source) in [
        (ENTRY, ENTRY_TMPL),
        (LIST, LIST_TMPL),
        (POPUP, POPUP_TMPL),
        (PAGE, PAGE_TMPL),
        (QUERY_POPUP, QUERY_POPUP_TMPL),
    ] {
        if let Err(e) = env.add_template(name, source) {
            tracing::error!("Template {} failed to parse: {}", name, e);
        }
    }
    env
}

/// Render a named template with the given context.
pub fn render<S: serde::Serialize>(name: &str, ctx: S) -> Result<String, RenderError> {
    let env = ENV.get_or_init(build);
    let tmpl = env.get_template(name)?;
    Ok(tmpl.render(ctx)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    #[test]
    fn test_all_templates_parse() {
        let env = build();
        for name in [ENTRY, LIST, POPUP, PAGE, QUERY_POPUP] {
            assert!(env.get_template(name).is_ok(), "{} missing", name);
        }
    }

    #[test]
    fn test_values_are_escaped() {
        let html = render(
            POPUP,
            context! { popup => context! {
                name => "<script>alert(1)</script>",
                category => "Junk Shop",
                address_label => "Address",
                address => "A & B",
                materials => vec!["metal"],
                distance => "1.00 km",
            }},
        )
        .unwrap();
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("A &amp; B"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_unknown_template() {
        assert!(matches!(
            render("nope.html", ()),
            Err(RenderError::Template(_))
        ));
    }
}
