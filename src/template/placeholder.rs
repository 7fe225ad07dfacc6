use crate::error::ScaffoldError;
use crate::mapping::context::TemplateContext;
use crate::template::{TemplateRenderer, TemplateStore};

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Renders templates from a [`TemplateStore`] by substituting `{{ key }}`.
///
/// Substitution is a single pass: text coming from the context is never
/// scanned for placeholders. A placeholder that is alone on its line (only
/// indentation before it) has every line of its value indented the same way.
#[derive(Clone, Copy)]
pub struct PlaceholderRenderer<'a> {
    store: &'a dyn TemplateStore,
}

impl<'a> PlaceholderRenderer<'a> {
    /// Renderer over `store`.
    pub fn new(store: &'a dyn TemplateStore) -> Self {
        Self { store }
    }
}

impl TemplateRenderer for PlaceholderRenderer<'_> {
    fn render(&self, template_key: &str, context: &TemplateContext) -> Result<String, ScaffoldError> {
        let text = self
            .store
            .template(template_key)
            .ok_or_else(|| ScaffoldError::rendering(template_key, "template not found"))?;
        render_text(template_key, text, context)
    }
}

/// Substitute every placeholder of `text`; `template_key` only labels errors.
pub fn render_text(
    template_key: &str,
    text: &str,
    context: &TemplateContext,
) -> Result<String, ScaffoldError> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find(OPEN) {
        out.push_str(&rest[..start]);
        let after = &rest[start + OPEN.len()..];
        let Some(end) = after.find(CLOSE) else {
            let offset = text.len() - rest.len() + start;
            return Err(ScaffoldError::rendering(
                template_key,
                format!("unterminated placeholder at byte {offset}"),
            ));
        };

        let name = after[..end].trim();
        let value = context.get(name).ok_or_else(|| {
            ScaffoldError::rendering(template_key, format!("unresolved placeholder '{name}'"))
        })?;

        let line_start = out.rfind('\n').map_or(0, |idx| idx + 1);
        let indent = &out[line_start..];
        let rendered = value.render();
        if !indent.is_empty() && indent.chars().all(|c| c == ' ' || c == '\t') {
            let indent = indent.to_string();
            let mut lines = rendered.split('\n');
            if let Some(first) = lines.next() {
                out.push_str(first);
            }
            for line in lines {
                out.push('\n');
                if !line.is_empty() {
                    out.push_str(&indent);
                    out.push_str(line);
                }
            }
        } else {
            out.push_str(&rendered);
        }

        rest = &after[end + CLOSE.len()..];
    }

    out.push_str(rest);
    Ok(out)
}
