//! Conversion pipeline: render Markdown, sanitize the HTML, embed it in a
//! page template.
//!
//! The pipeline is pure: identical input and template always yield identical
//! output bytes, and nothing is written or served from here.

use std::{fs, path::Path};

use bytes::Bytes;
use comrak::Options;
use tera::{Context, Tera};
use tracing::debug;

use crate::error::ConvertError;

/// Title bound into every generated page.
pub const PAGE_TITLE: &str = "Markdown Preview Tool";

// The `.html` suffix keeps Tera's autoescaping active for template fields;
// the sanitized body bypasses it through the `safe` filter.
const TEMPLATE_NAME: &str = "page.html";
const DEFAULT_TEMPLATE: &str = include_str!("../templates/default.html");

/// Convert the Markdown file at `input` into a complete sanitized HTML page.
///
/// Rendering and sanitizing must each produce non-empty output; an empty
/// buffer after either stage indicates degenerate or unsafe input and fails
/// the conversion with [`ConvertError::MalformedContent`].
pub fn convert(input: &Path, template: Option<&Path>) -> Result<Bytes, ConvertError> {
    let tera = load_template(template)?;

    let markdown = fs::read_to_string(input).map_err(|source| ConvertError::InputRead {
        path: input.to_path_buf(),
        source,
    })?;

    let rendered = comrak::markdown_to_html(&markdown, &markdown_options());
    if rendered.trim().is_empty() {
        return Err(ConvertError::MalformedContent { stage: "renderer" });
    }
    debug!(bytes = rendered.len(), "rendered markdown");

    let sanitized = sanitizer().clean(&rendered).to_string();
    if sanitized.trim().is_empty() {
        return Err(ConvertError::MalformedContent { stage: "sanitizer" });
    }
    debug!(bytes = sanitized.len(), "sanitized html");

    let mut context = Context::new();
    context.insert("title", PAGE_TITLE);
    context.insert("body", &sanitized);

    let page = tera
        .render(TEMPLATE_NAME, &context)
        .map_err(ConvertError::TemplateExecution)?;

    Ok(Bytes::from(page))
}

/// Load the user-supplied template when a path is given, the embedded default
/// otherwise. The user path always wins.
fn load_template(path: Option<&Path>) -> Result<Tera, ConvertError> {
    let mut tera = Tera::default();
    match path {
        Some(path) => {
            tera.add_template_file(path, Some(TEMPLATE_NAME))
                .map_err(|source| ConvertError::Template {
                    name: path.display().to_string(),
                    source,
                })?;
        }
        None => {
            tera.add_raw_template(TEMPLATE_NAME, DEFAULT_TEMPLATE)
                .map_err(|source| ConvertError::Template {
                    name: "built-in default".to_string(),
                    source,
                })?;
        }
    }
    Ok(tera)
}

fn markdown_options() -> Options<'static> {
    let mut options = Options::default();
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.footnotes = true;
    // Raw HTML passes through the renderer and is stripped by the sanitizer.
    options.render.r#unsafe = true;
    options
}

fn sanitizer() -> ammonia::Builder<'static> {
    let mut builder = ammonia::Builder::default();
    // Footnote back-references need their anchors to survive.
    builder.add_generic_attributes(&["id"]);
    builder
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn markdown_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("tmp file");
        file.write_all(contents.as_bytes()).expect("write markdown");
        file
    }

    #[test]
    fn heading_renders_into_default_template() {
        let input = markdown_file("# Hi\n");
        let page = convert(input.path(), None).expect("convert");
        let page = String::from_utf8(page.to_vec()).expect("utf-8");

        assert!(page.contains("<h1>"));
        assert!(page.contains("Hi"));
        assert!(page.contains(PAGE_TITLE));
    }

    #[test]
    fn conversion_is_deterministic() {
        let input = markdown_file("Some *emphasis* and a [link](https://example.com).\n");
        let first = convert(input.path(), None).expect("first convert");
        let second = convert(input.path(), None).expect("second convert");
        assert_eq!(first, second);
    }

    #[test]
    fn script_tags_do_not_survive_sanitization() {
        let input = markdown_file("Safe text\n\n<script>alert(1)</script>\n");
        let page = convert(input.path(), None).expect("convert");
        let page = String::from_utf8(page.to_vec()).expect("utf-8");

        assert!(page.contains("Safe text"));
        assert!(!page.contains("<script"));
        assert!(!page.contains("alert(1)"));
    }

    #[test]
    fn empty_input_is_rejected_as_malformed() {
        let input = markdown_file("");
        let err = convert(input.path(), None).expect_err("must fail");
        assert!(matches!(
            err,
            ConvertError::MalformedContent { stage: "renderer" }
        ));
    }

    #[test]
    fn script_only_input_is_rejected_after_sanitizing() {
        let input = markdown_file("<script>alert(1)</script>\n");
        let err = convert(input.path(), None).expect_err("must fail");
        assert!(matches!(
            err,
            ConvertError::MalformedContent { stage: "sanitizer" }
        ));
    }

    #[test]
    fn missing_input_reports_the_path() {
        let err = convert(Path::new("/nonexistent/input.md"), None).expect_err("must fail");
        match err {
            ConvertError::InputRead { path, .. } => {
                assert_eq!(path, Path::new("/nonexistent/input.md"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn user_template_overrides_the_default() {
        let input = markdown_file("# Hi\n");
        let template = markdown_file("<main>{{ body | safe }}</main>\n");

        let page = convert(input.path(), Some(template.path())).expect("convert");
        let page = String::from_utf8(page.to_vec()).expect("utf-8");

        assert!(page.starts_with("<main>"));
        assert!(page.contains("<h1>"));
        assert!(!page.contains(PAGE_TITLE));
    }

    #[test]
    fn malformed_template_fails_to_parse() {
        let input = markdown_file("# Hi\n");
        let template = markdown_file("{{ body");

        let err = convert(input.path(), Some(template.path())).expect_err("must fail");
        assert!(matches!(err, ConvertError::Template { .. }));
    }

    #[test]
    fn missing_template_file_fails_to_parse() {
        let input = markdown_file("# Hi\n");
        let err = convert(input.path(), Some(Path::new("/nonexistent/template.html")))
            .expect_err("must fail");
        assert!(matches!(err, ConvertError::Template { .. }));
    }
}
