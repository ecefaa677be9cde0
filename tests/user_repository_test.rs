// User repository integration tests against a live PostgreSQL
// Tests skip cleanly when DATABASE_URL is not configured

mod common;

use common::{test_email, try_test_pool};
use funnel_data_core::models::user::{CreateUserRequest, UserChanges, UserFilter};
use funnel_data_core::repositories::UserRepository;
use funnel_data_core::utils::data_error::DataError;
use serial_test::serial;

fn registration(email: String) -> CreateUserRequest {
    CreateUserRequest {
        email,
        name: Some("Integration Tester".to_string()),
        password: "a-long-enough-password".to_string(),
        is_admin: false,
    }
}

#[tokio::test]
#[serial]
async fn test_register_find_update_delete() {
    let Some(pool) = try_test_pool().await else {
        return;
    };
    let users = UserRepository::new(pool);

    let email = test_email("crud");
    let user = users
        .register(registration(email.clone()))
        .await
        .expect("registration failed");
    assert_eq!(user.email, email);
    assert_ne!(user.password_hash, "a-long-enough-password");

    // find_by_email is a unique lookup, absent rows come back as None
    let found = users.find_by_email(&email).await.expect("lookup failed");
    assert_eq!(found.map(|u| u.id), Some(user.id));
    assert!(users
        .find_by_email("nobody@nowhere.example")
        .await
        .expect("lookup failed")
        .is_none());

    // LIKE metacharacters in the lookup input are not wildcards
    assert!(users
        .find_by_email("%@%")
        .await
        .expect("lookup failed")
        .is_none());
    let underscored = format!("_{}", &email[1..]);
    assert!(users
        .find_by_email(&underscored)
        .await
        .expect("lookup failed")
        .is_none());

    let mut changes = UserChanges::new();
    changes.name = Some(Some("Renamed".to_string()));
    let updated = users.update(user.id, changes).await.expect("update failed");
    assert_eq!(updated.name.as_deref(), Some("Renamed"));

    let deleted = users.delete(user.id).await.expect("delete failed");
    assert_eq!(deleted.id, user.id);
    assert!(matches!(
        users.get_by_id(user.id).await,
        Err(DataError::NotFound)
    ));
}

#[tokio::test]
#[serial]
async fn test_duplicate_email_is_conflict() {
    let Some(pool) = try_test_pool().await else {
        return;
    };
    let users = UserRepository::new(pool);

    let email = test_email("dup");
    let user = users
        .register(registration(email.clone()))
        .await
        .expect("registration failed");

    let second = users.register(registration(email)).await;
    assert!(matches!(second, Err(DataError::Conflict(_))));

    users.delete(user.id).await.expect("cleanup failed");
}

#[tokio::test]
#[serial]
async fn test_verify_credentials() {
    let Some(pool) = try_test_pool().await else {
        return;
    };
    let users = UserRepository::new(pool);

    let email = test_email("login");
    let user = users
        .register(registration(email.clone()))
        .await
        .expect("registration failed");

    let ok = users
        .verify_credentials(&email, "a-long-enough-password")
        .await
        .expect("verify failed");
    assert_eq!(ok.map(|u| u.id), Some(user.id));

    // Wrong password and unknown email both come back as None
    assert!(users
        .verify_credentials(&email, "wrong-password")
        .await
        .expect("verify failed")
        .is_none());
    assert!(users
        .verify_credentials("nobody@nowhere.example", "whatever-pass")
        .await
        .expect("verify failed")
        .is_none());

    users.delete(user.id).await.expect("cleanup failed");
}

#[tokio::test]
#[serial]
async fn test_password_reset_flow() {
    let Some(pool) = try_test_pool().await else {
        return;
    };
    let users = UserRepository::new(pool);

    let email = test_email("reset");
    let user = users
        .register(registration(email.clone()))
        .await
        .expect("registration failed");

    // Unknown email does not reveal account existence
    assert!(users
        .begin_password_reset("nobody@nowhere.example")
        .await
        .expect("begin failed")
        .is_none());

    let token_info = users
        .begin_password_reset(&email)
        .await
        .expect("begin failed")
        .expect("token expected for known email");

    let updated = users
        .complete_password_reset(&token_info.token, "brand-new-password")
        .await
        .expect("complete failed");
    assert_eq!(updated.id, user.id);

    // Single use: the same token is rejected the second time
    assert!(matches!(
        users
            .complete_password_reset(&token_info.token, "another-password")
            .await,
        Err(DataError::NotFound)
    ));

    let logged_in = users
        .verify_credentials(&email, "brand-new-password")
        .await
        .expect("verify failed");
    assert_eq!(logged_in.map(|u| u.id), Some(user.id));

    users.delete(user.id).await.expect("cleanup failed");
}

#[tokio::test]
#[serial]
async fn test_filtered_count_and_delete_many() {
    let Some(pool) = try_test_pool().await else {
        return;
    };
    let users = UserRepository::new(pool);

    let marker = uuid::Uuid::new_v4().simple().to_string();
    for i in 0..3 {
        users
            .register(registration(format!("bulk-{}-{}@example.com", marker, i)))
            .await
            .expect("registration failed");
    }

    let filter = UserFilter {
        email_contains: Some(marker.clone()),
        ..Default::default()
    };
    assert_eq!(users.count(&filter).await.expect("count failed"), 3);

    // Bulk update runs filter and update in one transaction
    let mut changes = UserChanges::new();
    changes.name = Some(Some("Bulk Renamed".to_string()));
    let touched = users
        .update_many(&filter, changes)
        .await
        .expect("update_many failed");
    assert_eq!(touched, 3);

    let page = users
        .find_many(
            &filter,
            &Default::default(),
            Default::default(),
            Default::default(),
        )
        .await
        .expect("find_many failed");
    assert!(page
        .items
        .iter()
        .all(|u| u.name.as_deref() == Some("Bulk Renamed")));

    let removed = users.delete_many(&filter).await.expect("delete_many failed");
    assert_eq!(removed, 3);
    assert_eq!(users.count(&filter).await.expect("count failed"), 0);
}
