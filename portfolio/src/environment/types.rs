use portfolio_core_contact_impl::ContactFeatureServiceImpl;
use portfolio_email_impl::ResendEmailServiceImpl;
use portfolio_templates_impl::TemplateServiceImpl;

// API
pub type RestServer = portfolio_api_rest::RestServer<ContactFeature>;

// Email
pub type Email = ResendEmailServiceImpl;

// Templates
pub type Template = TemplateServiceImpl;

// Core
pub type ContactFeature = ContactFeatureServiceImpl<Email, Template>;
