use std::sync::Arc;

use anyhow::Context;
use portfolio_templates_contracts::{Template, TemplateService, TEMPLATES};
use tera::Tera;

#[derive(Debug, Clone)]
pub struct TemplateServiceImpl {
    tera: Arc<Tera>,
}

impl TemplateServiceImpl {
    pub fn new() -> anyhow::Result<Self> {
        let mut tera = Tera::default();

        for &(name, template) in TEMPLATES {
            tera.add_raw_template(name, template)
                .with_context(|| format!("Failed to parse template {name}"))?;
        }

        Ok(Self { tera: tera.into() })
    }
}

impl TemplateService for TemplateServiceImpl {
    fn render<T: Template>(&self, template: &T) -> anyhow::Result<String> {
        let context = tera::Context::from_serialize(template)?;
        self.tera.render(T::NAME, &context).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use portfolio_templates_contracts::ContactMessageTemplate;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn contact_message() {
        // Arrange
        let sut = TemplateServiceImpl::new().unwrap();

        // Act
        let result = sut
            .render(&ContactMessageTemplate {
                name: "Ana".into(),
                email: "ana@x.com".into(),
                message: "Hi".into(),
            })
            .unwrap();

        // Assert
        assert_eq!(
            result.trim_end(),
            "<p>Has recibido un nuevo mensaje de tu formulario de contacto:</p>\n\
             <p><strong>Nombre:</strong> Ana</p>\n\
             <p><strong>Email:</strong> ana@x.com</p>\n\
             <p><strong>Mensaje:</strong> Hi</p>"
        );
    }

    #[test]
    fn contact_message_escapes_html() {
        // Arrange
        let sut = TemplateServiceImpl::new().unwrap();

        // Act
        let result = sut
            .render(&ContactMessageTemplate {
                name: "<b>Mallory</b>".into(),
                email: "mallory@example.com".into(),
                message: "<script>alert(1)</script> & \"quotes\"".into(),
            })
            .unwrap();

        // Assert
        assert!(!result.contains("<script>"));
        assert!(!result.contains("<b>Mallory"));
        assert!(result.contains("&lt;b&gt;Mallory&lt;"));
        assert!(result.contains("&lt;script&gt;alert(1)&lt;"));
        assert!(result.contains("&amp; &quot;quotes&quot;"));
    }
}
