// Library exports for the funnel data layer
// This file exposes modules and functions for library consumers

pub mod app_config;
pub mod context;
pub mod db;
pub mod migrations;
pub mod models;
pub mod repositories;
pub mod schema;
pub mod utils;

// Re-export commonly used types
pub use app_config::{config, AppConfig, CONFIG};
pub use context::{initialize_data_context, DataContext};
pub use db::{
    check_diesel_health, create_diesel_pool, execute_raw, query_raw, transaction,
    DieselDatabaseConfig, DieselPool,
};
pub use models::domain::{
    CreateDomainRequest, Domain, DomainChanges, DomainFilter, DomainStatus, DomainStatusCount,
    DomainType, NewDomain, SslStatus,
};
pub use models::funnel::{
    Funnel, FunnelChanges, FunnelFilter, FunnelOrder, FunnelSort, FunnelStatus, FunnelStatusCount,
    NewFunnel,
};
pub use models::funnel_domain::{FunnelDomain, NewFunnelDomain};
pub use models::page::{
    CreatePageRequest, NewPage, Page, PageChanges, PageFilter, PageOrderAggregates,
};
pub use models::pagination::{Paginated, Pagination, SortDirection};
pub use models::template::{
    CreateTemplateRequest, NewTemplate, Template, TemplateCategoryCount, TemplateChanges,
    TemplateFilter, TemplateSort, TemplateUsageAggregates,
};
pub use models::template_category::{
    CreateCategoryRequest, NewTemplateCategory, TemplateCategory, TemplateCategoryChanges,
    TemplateCategoryFilter,
};
pub use models::template_image::{
    CreateTemplateImageRequest, NewTemplateImage, TemplateImage, TemplateImageChanges,
};
pub use models::template_page::{NewTemplatePage, TemplatePage, TemplatePageChanges};
pub use models::user::{
    CreateUserRequest, NewUser, User, UserChanges, UserFilter, UserSort,
};
pub use repositories::{
    DomainRepository, FunnelRepository, PageRepository, TemplateCategoryRepository,
    TemplateRepository, UserRepository,
};
pub use utils::data_error::{DataError, DataResult};
