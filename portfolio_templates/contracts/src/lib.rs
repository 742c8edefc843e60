use serde::Serialize;

#[cfg_attr(feature = "mock", mockall::automock)]
pub trait TemplateService: Send + Sync + 'static {
    /// Render the given template.
    fn render<T: Template + 'static>(&self, template: &T) -> anyhow::Result<String>;
}

#[cfg(feature = "mock")]
impl MockTemplateService {
    pub fn with_render<T: Template + Send + PartialEq + std::fmt::Debug + 'static>(
        mut self,
        template: T,
        result: anyhow::Result<String>,
    ) -> Self {
        self.expect_render()
            .once()
            .with(mockall::predicate::eq(template))
            .return_once(|_| result);
        self
    }
}

/// A template which can be rendered with its own fields as the context.
///
/// Templates whose [`NAME`](Template::NAME) ends in `.html` are rendered with
/// HTML escaping for every interpolated value.
pub trait Template: Serialize {
    const NAME: &'static str;
    const TEMPLATE: &'static str;
}

macro_rules! templates {
    ($( $ident:ident ( $path:literal ), )* ) => {
        $(
            impl Template for $ident {
                const NAME: &'static str = $path;
                const TEMPLATE: &'static str = include_str!(concat!("../templates/", $path));
            }
        )*

        pub const TEMPLATES: &[(&str, &str)] = &[
            $( ($ident::NAME, $ident::TEMPLATE) ),*
        ];
    };
}

templates! {
    ContactMessageTemplate("contact_message.html"),
}

/// Body of the email relayed to the site owner for each contact submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactMessageTemplate {
    pub name: String,
    pub email: String,
    pub message: String,
}
