use wiremock::matchers::{any, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use early_access::configuration::MailingListProvider;
use early_access::domain::{NewSignup, SubscriberEmail};
use early_access::storage::{self, StorageError};

use crate::helpers::{spawn_app, spawn_app_with, TestApp};

// Matches `mailing_list.list_id` in configuration/base.yml.
const MEMBERS_PATH: &str = "/lists/launch-list/members";

async fn mount_mailing_list_ok(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(MEMBERS_PATH))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
}

async fn saved_signups(app: &TestApp) -> Vec<(String, Option<String>, Option<String>, Option<String>, String)> {
    sqlx::query_as(
        "SELECT email, first_name, job_role, organization_size, status FROM beta_signups",
    )
    .fetch_all(&app.db_pool)
    .await
    .expect("failed to fetch saved signups")
}

#[tokio::test]
async fn signup_returns_200_and_stores_the_signup_for_valid_form_data() {
    // Arrange
    let app = spawn_app().await;
    mount_mailing_list_ok(&app.mailing_server).await;

    // Act
    let body = "email=ann%40example.com&first_name=Ann&job_role=PM&organization_size=11-50";
    let response = app.post_signup(body.into()).await;

    // Assert
    assert_eq!(200, response.status().as_u16());

    let saved = saved_signups(&app).await;
    assert_eq!(saved.len(), 1);
    let (email, first_name, job_role, organization_size, status) = saved[0].clone();
    assert_eq!(email, "ann@example.com");
    assert_eq!(first_name.as_deref(), Some("Ann"));
    assert_eq!(job_role.as_deref(), Some("PM"));
    assert_eq!(organization_size.as_deref(), Some("11-50"));
    assert_eq!(status, "pending");
}

#[tokio::test]
async fn signup_syncs_the_contact_to_the_mailing_list() {
    // Arrange
    let app = spawn_app().await;

    Mock::given(method("POST"))
        .and(path(MEMBERS_PATH))
        .and(body_partial_json(serde_json::json!({
            "email_address": "ann@example.com",
            "merge_fields": { "FNAME": "Ann", "ORGSIZE": "11-50" },
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.mailing_server)
        .await;

    // Act
    let body = "email=ann%40example.com&first_name=Ann&organization_size=11-50";
    let response = app.post_signup(body.into()).await;

    // Assert - mock expectations are verified on drop
    assert_eq!(200, response.status().as_u16());
}

#[tokio::test]
async fn signup_returns_409_with_the_duplicate_message_for_a_repeated_email() {
    // Arrange
    let app = spawn_app().await;
    mount_mailing_list_ok(&app.mailing_server).await;
    let body = "email=ann%40example.com&first_name=Ann&job_role=PM&organization_size=11-50";

    // Act
    let first = app.post_signup(body.into()).await;
    let second = app.post_signup(body.into()).await;

    // Assert
    assert_eq!(200, first.status().as_u16());
    assert_eq!(409, second.status().as_u16());
    assert_eq!(
        second.text().await.unwrap(),
        "This email is already registered for early access."
    );
    assert_eq!(saved_signups(&app).await.len(), 1);
}

#[tokio::test]
async fn a_second_insert_for_the_same_email_hits_the_unique_constraint() {
    // Arrange - two inserts straight against the pool, as two concurrent
    // submissions that both passed the lookup would issue them.
    let app = spawn_app().await;
    let signup = NewSignup {
        email: SubscriberEmail::parse("ann@example.com".to_string()).unwrap(),
        first_name: None,
        job_role: None,
        organization_size: None,
    };

    // Act
    let first = storage::insert_signup(&app.db_pool, &signup).await;
    let second = storage::insert_signup(&app.db_pool, &signup).await;

    // Assert
    assert!(first.is_ok());
    assert!(
        matches!(second, Err(StorageError::DuplicateEmail)),
        "expected the duplicate classification, got {second:?}"
    );
    assert_eq!(saved_signups(&app).await.len(), 1);
}

#[tokio::test]
async fn signup_returns_500_with_a_generic_message_when_the_write_fails() {
    // Arrange
    let app = spawn_app().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.mailing_server)
        .await;

    // Break the insert while leaving the email lookup intact.
    sqlx::query("ALTER TABLE beta_signups DROP COLUMN subscribed_at;")
        .execute(&app.db_pool)
        .await
        .unwrap();

    // Act
    let response = app.post_signup("email=ann%40example.com".into()).await;

    // Assert
    assert_eq!(500, response.status().as_u16());
    assert_eq!(
        response.text().await.unwrap(),
        "Unable to complete registration. Please try again later."
    );
}

#[tokio::test]
async fn signup_still_succeeds_when_the_mailing_list_sync_fails() {
    // Arrange
    let app = spawn_app().await;

    Mock::given(method("POST"))
        .and(path(MEMBERS_PATH))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&app.mailing_server)
        .await;

    // Act
    let body = "email=ann%40example.com&first_name=Ann";
    let response = app.post_signup(body.into()).await;

    // Assert - the write is authoritative, the sync is best-effort
    assert_eq!(200, response.status().as_u16());
    assert_eq!(saved_signups(&app).await.len(), 1);
}

#[tokio::test]
async fn signup_returns_422_when_the_email_field_is_missing() {
    // Arrange
    let app = spawn_app().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.mailing_server)
        .await;

    let test_cases = vec![
        ("first_name=Ann", "missing the email"),
        ("", "missing every field"),
    ];

    for (invalid_body, error_message) in test_cases {
        // Act
        let response = app.post_signup(invalid_body.into()).await;

        // Assert
        assert_eq!(
            422,
            response.status().as_u16(),
            "The API did not fail with 422 when the payload was {error_message}"
        );
    }
    assert_eq!(saved_signups(&app).await.len(), 0);
}

#[tokio::test]
async fn signup_returns_400_when_fields_are_present_but_invalid() {
    // Arrange
    let app = spawn_app().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.mailing_server)
        .await;

    let test_cases = vec![
        ("email=", "empty email"),
        ("email=definitely-not-an-email", "invalid email"),
        (
            "email=ann%40example.com&organization_size=tons",
            "unknown organization size",
        ),
        (
            "email=ann%40example.com&first_name=%3Cscript%3E",
            "first name with markup",
        ),
    ];

    for (body, description) in test_cases {
        // Act
        let response = app.post_signup(body.into()).await;

        // Assert
        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not return a 400 Bad Request when the payload was {}",
            description
        );
    }
    assert_eq!(saved_signups(&app).await.len(), 0);
}

#[tokio::test]
async fn signup_syncs_through_the_brevo_provider_when_configured() {
    // Arrange - base.yml selects mailchimp; switch the provider and give it
    // the numeric list id the brevo client requires.
    let app = spawn_app_with(|c| {
        c.mailing_list.provider = MailingListProvider::Brevo;
        c.mailing_list.list_id = "7".to_string();
    })
    .await;

    Mock::given(method("POST"))
        .and(path("/contacts"))
        .and(body_partial_json(serde_json::json!({
            "email": "ann@example.com",
            "attributes": { "FIRSTNAME": "Ann" },
            "listIds": [7],
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&app.mailing_server)
        .await;

    // Act
    let body = "email=ann%40example.com&first_name=Ann";
    let response = app.post_signup(body.into()).await;

    // Assert
    assert_eq!(200, response.status().as_u16());
    assert_eq!(saved_signups(&app).await.len(), 1);
}

#[tokio::test]
async fn signup_requires_consent_when_the_policy_is_enabled() {
    // Arrange
    let app = spawn_app_with(|c| c.application.require_consent = true).await;
    mount_mailing_list_ok(&app.mailing_server).await;

    // Act
    let without_consent = app.post_signup("email=ann%40example.com".into()).await;
    let with_consent = app
        .post_signup("email=ann%40example.com&consent=true".into())
        .await;

    // Assert
    assert_eq!(400, without_consent.status().as_u16());
    assert_eq!(200, with_consent.status().as_u16());
    assert_eq!(saved_signups(&app).await.len(), 1);
}

#[tokio::test]
async fn signup_ignores_consent_when_the_policy_is_disabled() {
    // Arrange - require_consent defaults to false in base.yml
    let app = spawn_app().await;
    mount_mailing_list_ok(&app.mailing_server).await;

    // Act
    let response = app.post_signup("email=ann%40example.com".into()).await;

    // Assert
    assert_eq!(200, response.status().as_u16());
}
