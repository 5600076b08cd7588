use std::fmt;

use handlebars::Handlebars;
use serde::Serialize;
use thiserror::Error;

use crate::spec::step::StepName;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template '{template}' failed to render: {source}")]
    Render {
        template: String,
        #[source]
        source: Box<handlebars::RenderError>,
    },
    #[error("message field '{0}' has not been answered")]
    Unanswered(StepName),
}

/// Handlebars registry for prompt templates such as `Total enrollment: {{total}}`.
///
/// Strict mode turns a missing variable into an error instead of an empty
/// string; output is plain text, so HTML escaping is off.
#[derive(Clone)]
pub struct TemplateEngine {
    registry: Handlebars<'static>,
}

impl TemplateEngine {
    pub fn new() -> Self {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry.register_escape_fn(handlebars::no_escape);
        Self { registry }
    }

    pub fn render<T: Serialize>(&self, template: &str, data: &T) -> Result<String, TemplateError> {
        self.registry
            .render_template(template, data)
            .map_err(|source| TemplateError::Render {
                template: template.to_string(),
                source: Box::new(source),
            })
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TemplateEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateEngine").finish_non_exhaustive()
    }
}
