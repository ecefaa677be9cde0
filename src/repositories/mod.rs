// Repository layer - one repository per entity, all backed by the
// shared Diesel connection pool

pub mod domain;
pub mod funnel;
pub mod page;
pub mod template;
pub mod template_category;
pub mod user;

pub use domain::DomainRepository;
pub use funnel::FunnelRepository;
pub use page::PageRepository;
pub use template::TemplateRepository;
pub use template_category::TemplateCategoryRepository;
pub use user::UserRepository;
