//! Handlebars pages
//!
//! Templates are compiled into the binary and registered once at startup.

use handlebars::Handlebars;
use serde_json::json;

use crate::monitor::{ExperimentView, Overview};
use crate::Result;

const HEADER: &str = include_str!("../../templates/header.hbs");
const FOOTER: &str = include_str!("../../templates/footer.hbs");
const INDEX: &str = include_str!("../../templates/index.hbs");
const EXPERIMENT: &str = include_str!("../../templates/experiment.hbs");

/// Registered page templates.
pub struct Pages {
    registry: Handlebars<'static>,
}

impl Pages {
    /// Compile and register every page template.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Template`] if a template does not parse.
    pub fn new() -> Result<Self> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(false);
        registry.register_partial("header", HEADER)?;
        registry.register_partial("footer", FOOTER)?;
        registry.register_template_string("index", INDEX)?;
        registry.register_template_string("experiment", EXPERIMENT)?;
        Ok(Self { registry })
    }

    /// Render the overview page.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Template`] on render failure.
    pub fn overview(&self, overview: &Overview) -> Result<String> {
        let context = json!({
            "title": "Experiments",
            "overview": overview,
        });
        Ok(self.registry.render("index", &context)?)
    }

    /// Render one experiment's detail page.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Template`] on render failure.
    pub fn experiment(&self, view: &ExperimentView) -> Result<String> {
        let context = json!({
            "title": format!("Experiment {}", view.current_id),
            "info": view,
        });
        Ok(self.registry.render("experiment", &context)?)
    }
}
