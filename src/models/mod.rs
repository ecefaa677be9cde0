pub mod domain;
pub mod funnel;
pub mod funnel_domain;
pub mod page;
pub mod pagination;
pub mod template;
pub mod template_category;
pub mod template_image;
pub mod template_page;
pub mod user;

// Re-export common types
pub use domain::{
    CreateDomainRequest, Domain, DomainChanges, DomainFilter, DomainStatus, DomainStatusCount,
    DomainType, NewDomain, SslStatus,
};
pub use funnel::{
    Funnel, FunnelChanges, FunnelFilter, FunnelOrder, FunnelSort, FunnelStatus, FunnelStatusCount,
    NewFunnel,
};
pub use funnel_domain::{FunnelDomain, NewFunnelDomain};
pub use page::{
    CreatePageRequest, NewPage, Page, PageChanges, PageFilter, PageOrderAggregates,
};
pub use pagination::{Paginated, Pagination, SortDirection};
pub use template::{
    CreateTemplateRequest, NewTemplate, Template, TemplateCategoryCount, TemplateChanges,
    TemplateFilter, TemplateSort, TemplateUsageAggregates,
};
pub use template_category::{
    CreateCategoryRequest, NewTemplateCategory, TemplateCategory, TemplateCategoryChanges,
    TemplateCategoryFilter,
};
pub use template_image::{
    CreateTemplateImageRequest, NewTemplateImage, TemplateImage, TemplateImageChanges,
};
pub use template_page::{NewTemplatePage, TemplatePage, TemplatePageChanges};
pub use user::{CreateUserRequest, NewUser, User, UserChanges, UserFilter, UserSort};
