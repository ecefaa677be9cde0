// Funnel lifecycle integration tests: templates, instantiation, page
// ordering and domain attachments against a live PostgreSQL
// Tests skip cleanly when DATABASE_URL is not configured

mod common;

use common::{test_email, test_hostname, test_slug, try_test_pool};
use funnel_data_core::models::domain::DomainType;
use funnel_data_core::models::funnel::{FunnelFilter, FunnelStatus};
use funnel_data_core::models::page::{CreatePageRequest, PageFilter};
use funnel_data_core::models::template::CreateTemplateRequest;
use funnel_data_core::models::template_category::CreateCategoryRequest;
use funnel_data_core::models::template_page::NewTemplatePage;
use funnel_data_core::models::user::CreateUserRequest;
use funnel_data_core::repositories::{
    DomainRepository, FunnelRepository, PageRepository, TemplateCategoryRepository,
    TemplateRepository, UserRepository,
};
use funnel_data_core::utils::data_error::DataError;
use funnel_data_core::DieselPool;
use serial_test::serial;
use uuid::Uuid;

struct Fixture {
    users: UserRepository,
    funnels: FunnelRepository,
    domains: DomainRepository,
    pages: PageRepository,
    templates: TemplateRepository,
    categories: TemplateCategoryRepository,
    user_id: Uuid,
}

impl Fixture {
    async fn create(pool: DieselPool) -> Self {
        let users = UserRepository::new(pool.clone());
        let user = users
            .register(CreateUserRequest {
                email: test_email("lifecycle"),
                name: None,
                password: "a-long-enough-password".to_string(),
                is_admin: false,
            })
            .await
            .expect("registration failed");

        Self {
            users,
            funnels: FunnelRepository::new(pool.clone()),
            domains: DomainRepository::new(pool.clone()),
            pages: PageRepository::new(pool.clone()),
            templates: TemplateRepository::new(pool.clone()),
            categories: TemplateCategoryRepository::new(pool),
            user_id: user.id,
        }
    }

    /// Cascades clean up funnels, pages and attachments under the user
    async fn teardown(self) {
        self.users.delete(self.user_id).await.expect("cleanup failed");
    }
}

#[tokio::test]
#[serial]
async fn test_instantiate_funnel_from_template() {
    let Some(pool) = try_test_pool().await else {
        return;
    };
    let fx = Fixture::create(pool).await;

    let category = fx
        .categories
        .create(CreateCategoryRequest {
            name: "Lead Gen".to_string(),
            slug: test_slug("lead-gen"),
            description: None,
            icon: None,
            category_order: 0,
        })
        .await
        .expect("category create failed");

    let template = fx
        .templates
        .create(
            CreateTemplateRequest {
                name: "Webinar Classic".to_string(),
                slug: test_slug("webinar-classic"),
                description: Some("Opt-in plus thank-you".to_string()),
                category_id: category.id,
                tags: vec!["webinar".to_string()],
                is_public: true,
                metadata: serde_json::json!({}),
            },
            fx.user_id,
        )
        .await
        .expect("template create failed");
    assert_eq!(template.usage_count, 0);

    for (order, name) in ["Opt-in", "Thank You"].iter().enumerate() {
        fx.templates
            .add_page(NewTemplatePage {
                template_id: template.id,
                name: name.to_string(),
                content: Some(format!("<h1>{}</h1>", name)),
                page_order: order as i32,
                settings: None,
                linking_id_prefix: Some(format!("blk{}", order)),
                metadata: None,
            })
            .await
            .expect("blueprint create failed");
    }

    let (funnel, pages) = fx
        .funnels
        .instantiate_from_template(fx.user_id, "My Webinar".to_string(), template.id)
        .await
        .expect("instantiation failed");

    assert_eq!(funnel.status_enum(), FunnelStatus::Draft);
    assert_eq!(funnel.template_id, Some(template.id));
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].page_order, 0);
    assert_eq!(pages[1].page_order, 1);
    assert!(pages[0]
        .linking_id
        .as_deref()
        .is_some_and(|id| id.starts_with("blk0-")));

    let used = fx
        .templates
        .get_by_id(template.id)
        .await
        .expect("template lookup failed");
    assert_eq!(used.usage_count, 1);

    // An empty template must not instantiate
    let empty = fx
        .templates
        .create(
            CreateTemplateRequest {
                name: "Empty".to_string(),
                slug: test_slug("empty"),
                description: None,
                category_id: category.id,
                tags: vec![],
                is_public: false,
                metadata: serde_json::json!({}),
            },
            fx.user_id,
        )
        .await
        .expect("template create failed");
    assert!(matches!(
        fx.funnels
            .instantiate_from_template(fx.user_id, "Broken".to_string(), empty.id)
            .await,
        Err(DataError::Validation(_))
    ));

    // A template id that matches nothing is a missing record, not
    // a validation failure
    assert!(matches!(
        fx.funnels
            .instantiate_from_template(fx.user_id, "Ghost".to_string(), Uuid::new_v4())
            .await,
        Err(DataError::NotFound)
    ));

    fx.funnels.delete(funnel.id).await.expect("funnel cleanup failed");
    fx.templates.delete(template.id).await.expect("template cleanup failed");
    fx.templates.delete(empty.id).await.expect("template cleanup failed");
    fx.categories.delete(category.id).await.expect("category cleanup failed");
    fx.teardown().await;
}

#[tokio::test]
#[serial]
async fn test_page_ordering_and_reorder() {
    let Some(pool) = try_test_pool().await else {
        return;
    };
    let fx = Fixture::create(pool).await;

    let funnel = fx
        .funnels
        .create(funnel_data_core::NewFunnel::draft("Ordering", fx.user_id))
        .await
        .expect("funnel create failed");

    let mut ids = Vec::new();
    for name in ["First", "Second", "Third"] {
        let page = fx
            .pages
            .create_in_funnel(
                funnel.id,
                CreatePageRequest {
                    name: name.to_string(),
                    content: None,
                    linking_id: None,
                },
            )
            .await
            .expect("page create failed");
        ids.push(page.id);
    }

    let aggregates = fx
        .pages
        .order_aggregates(funnel.id)
        .await
        .expect("aggregates failed");
    assert_eq!(aggregates.count, 3);
    assert_eq!(aggregates.min_order, Some(0));
    assert_eq!(aggregates.max_order, Some(2));

    let reversed: Vec<Uuid> = ids.iter().rev().copied().collect();
    let reordered = fx
        .pages
        .reorder(funnel.id, reversed.clone())
        .await
        .expect("reorder failed");
    let reordered_ids: Vec<Uuid> = reordered.iter().map(|p| p.id).collect();
    assert_eq!(reordered_ids, reversed);

    // A partial id list is rejected
    assert!(matches!(
        fx.pages.reorder(funnel.id, vec![ids[0]]).await,
        Err(DataError::Validation(_))
    ));

    // Repeating an id to pad out the list is rejected too
    assert!(matches!(
        fx.pages
            .reorder(funnel.id, vec![ids[0], ids[0], ids[1]])
            .await,
        Err(DataError::Validation(_))
    ));
    let aggregates = fx
        .pages
        .order_aggregates(funnel.id)
        .await
        .expect("aggregates failed");
    assert_eq!(aggregates.min_order, Some(0));
    assert_eq!(aggregates.max_order, Some(2));

    let listed = fx
        .pages
        .find_many(&PageFilter {
            funnel_id: Some(funnel.id),
            ..Default::default()
        })
        .await
        .expect("list failed");
    assert_eq!(listed.len(), 3);
    assert_eq!(listed[0].id, reversed[0]);

    fx.teardown().await;
}

#[tokio::test]
#[serial]
async fn test_domain_attachment() {
    let Some(pool) = try_test_pool().await else {
        return;
    };
    let fx = Fixture::create(pool).await;

    let funnel = fx
        .funnels
        .create(funnel_data_core::NewFunnel::draft("Attach", fx.user_id))
        .await
        .expect("funnel create failed");
    let domain = fx
        .domains
        .create(funnel_data_core::NewDomain::pending(
            test_hostname("attach"),
            DomainType::CustomDomain,
            fx.user_id,
        ))
        .await
        .expect("domain create failed");

    fx.funnels
        .attach_domain(funnel.id, domain.id)
        .await
        .expect("attach failed");

    // Duplicate pairings hit the compound unique index
    assert!(matches!(
        fx.funnels.attach_domain(funnel.id, domain.id).await,
        Err(DataError::Conflict(_))
    ));

    let active = fx
        .funnels
        .active_domains(funnel.id)
        .await
        .expect("active domains failed");
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, domain.id);

    fx.funnels
        .set_domain_active(funnel.id, domain.id, false)
        .await
        .expect("deactivate failed");
    assert!(fx
        .funnels
        .active_domains(funnel.id)
        .await
        .expect("active domains failed")
        .is_empty());

    fx.funnels
        .detach_domain(funnel.id, domain.id)
        .await
        .expect("detach failed");

    let status_counts = fx
        .funnels
        .counts_by_status(Some(fx.user_id))
        .await
        .expect("status counts failed");
    assert!(status_counts
        .iter()
        .any(|row| row.status == "draft" && row.count == 1));

    let none_with_filter = fx
        .funnels
        .count(&FunnelFilter {
            user_id: Some(fx.user_id),
            status: Some(FunnelStatus::Published),
            ..Default::default()
        })
        .await
        .expect("count failed");
    assert_eq!(none_with_filter, 0);

    fx.teardown().await;
}
