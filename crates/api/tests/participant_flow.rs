//! End-to-end tests for the invitation-token participant flow and the
//! organization dashboard and report that summarise it.

mod common;

use assessment_api::state::AppState;
use axum::http::StatusCode;
use axum::Router;
use common::{
    admin_token, body_json, create_user, get, get_auth, login, post_json, post_json_auth,
    put_json, ORG_USER_ROLE_ID,
};
use serde_json::{json, Value};
use sqlx::PgPool;

/// Organization, published assessment and the ids a participant answers with.
struct Fixture {
    app: Router,
    admin: String,
    org_id: i64,
    assessment_id: i64,
    /// `(question_id, [agree_option_id, disagree_option_id])`
    questions: Vec<(i64, [i64; 2])>,
}

async fn create_question(app: &Router, admin: &str, assessment_id: i64, dimension: &str) -> (i64, [i64; 2]) {
    let body = json!({
        "prompt": format!("I lead with {dimension}"),
        "dimension": dimension,
        "options": [
            { "label": "Agree", "score": 5 },
            { "label": "Disagree", "score": 1 }
        ],
        "correct_index": 0
    });
    let response = post_json_auth(
        app.clone(),
        &format!("/api/v1/admin/assessments/{assessment_id}/questions"),
        body,
        admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let data = body_json(response).await["data"].clone();
    let options = data["options"].as_array().unwrap();
    assert_eq!(data["correct_option_id"], options[0]["id"]);
    (
        data["id"].as_i64().unwrap(),
        [
            options[0]["id"].as_i64().unwrap(),
            options[1]["id"].as_i64().unwrap(),
        ],
    )
}

async fn setup(pool: &PgPool) -> Fixture {
    let app = common::build_test_app(pool.clone());
    let admin = admin_token(pool, app.clone()).await;

    let org = post_json_auth(
        app.clone(),
        "/api/v1/admin/organizations",
        json!({ "name": "Northwind" }),
        &admin,
    )
    .await;
    assert_eq!(org.status(), StatusCode::CREATED);
    let org_id = body_json(org).await["data"]["id"].as_i64().unwrap();

    let assessment = post_json_auth(
        app.clone(),
        "/api/v1/admin/assessments",
        json!({ "title": "Leadership 360", "is_published": true }),
        &admin,
    )
    .await;
    assert_eq!(assessment.status(), StatusCode::CREATED);
    let assessment_id = body_json(assessment).await["data"]["id"].as_i64().unwrap();

    let questions = vec![
        create_question(&app, &admin, assessment_id, "Vision").await,
        create_question(&app, &admin, assessment_id, "Empathy").await,
    ];

    Fixture {
        app,
        admin,
        org_id,
        assessment_id,
        questions,
    }
}

/// Invite a participant and return `(participant_id, invitation_token)`.
async fn invite(fx: &Fixture, email: &str) -> (i64, String) {
    let response = post_json_auth(
        fx.app.clone(),
        &format!("/api/v1/organizations/{}/participants", fx.org_id),
        json!({ "email": email, "full_name": "Pat Participant" }),
        &fx.admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let data = body_json(response).await["data"].clone();
    (
        data["participant"]["id"].as_i64().unwrap(),
        data["invitation_token"].as_str().unwrap().to_string(),
    )
}

async fn start(fx: &Fixture, token: &str) -> (StatusCode, Value) {
    let response = post_json(
        fx.app.clone(),
        &format!("/api/v1/participate/{token}/attempts"),
        json!({ "assessment_id": fx.assessment_id }),
    )
    .await;
    let status = response.status();
    (status, body_json(response).await)
}

// ---------------------------------------------------------------------------
// Test: the full flow from invitation to report
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_participant_completes_assessment(pool: PgPool) {
    let fx = setup(&pool).await;
    let (participant_id, token) = invite(&fx, "Pat@Example.com").await;

    // The view hides option weights and the answer key.
    let view = get(fx.app.clone(), &format!("/api/v1/participate/{token}")).await;
    assert_eq!(view.status(), StatusCode::OK);
    let view = body_json(view).await["data"].clone();
    assert_eq!(view["participant"]["id"], participant_id);
    assert_eq!(view["participant"]["email"], "pat@example.com");
    let question = &view["assessments"][0]["questions"][0];
    assert_eq!(question["dimension"], "vision");
    assert!(question["options"][0].get("score").is_none());
    assert!(question.get("correct_option_id").is_none());
    assert_eq!(view["attempts"], json!([]));

    // Starting twice resumes the open attempt.
    let (status, first) = start(&fx, &token).await;
    assert_eq!(status, StatusCode::CREATED);
    let attempt_id = first["data"]["id"].as_i64().unwrap();
    let (status, again) = start(&fx, &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["data"]["id"], attempt_id);

    let (q1, q1_opts) = fx.questions[0];
    let (q2, q2_opts) = fx.questions[1];
    let responses_uri = format!("/api/v1/participate/{token}/attempts/{attempt_id}/responses");

    // Answer, then change the first answer.
    let response = put_json(
        fx.app.clone(),
        &responses_uri,
        json!({ "responses": [{ "question_id": q1, "option_id": q1_opts[1] }] }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = put_json(
        fx.app.clone(),
        &responses_uri,
        json!({ "responses": [
            { "question_id": q1, "option_id": q1_opts[0] },
            { "question_id": q2, "option_id": q2_opts[1] }
        ] }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 2);

    let complete_uri = format!("/api/v1/participate/{token}/attempts/{attempt_id}/complete");
    let response = post_json(fx.app.clone(), &complete_uri, json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let done = body_json(response).await["data"].clone();
    assert_eq!(done["score"]["total"], 6);
    assert_eq!(done["score"]["correct_count"], 1);
    assert_eq!(done["score"]["answered"], 2);
    assert_eq!(done["attempt"]["score"], 6);
    assert!(done["attempt"]["completed_at"].is_string());
    assert_eq!(done["dimensions"]["vision"], 5.0);
    assert_eq!(done["dimensions"]["empathy"], 1.0);

    // A completed attempt is closed for completion and answers.
    let response = post_json(fx.app.clone(), &complete_uri, json!({})).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let response = put_json(
        fx.app.clone(),
        &responses_uri,
        json!({ "responses": [{ "question_id": q2, "option_id": q2_opts[0] }] }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Dashboard and report reflect the completed attempt.
    let dashboard = get_auth(
        fx.app.clone(),
        &format!("/api/v1/organizations/{}/dashboard", fx.org_id),
        &fx.admin,
    )
    .await;
    assert_eq!(dashboard.status(), StatusCode::OK);
    assert_eq!(dashboard.headers()["x-ratelimit-limit"], "200");
    let dashboard = body_json(dashboard).await["data"].clone();
    assert_eq!(dashboard["degraded"], false);
    assert_eq!(dashboard["participant_count"], 1);
    assert_eq!(dashboard["invited_count"], 1);
    assert_eq!(dashboard["started_count"], 1);
    assert_eq!(dashboard["completed_count"], 1);
    assert_eq!(dashboard["average_score"], 6.0);

    let report = get_auth(
        fx.app.clone(),
        &format!("/api/v1/organizations/{}/report", fx.org_id),
        &fx.admin,
    )
    .await;
    assert_eq!(report.status(), StatusCode::OK);
    assert_eq!(report.headers()["x-ratelimit-limit"], "10");
    let report = body_json(report).await["data"].clone();
    let row = &report["participants"][0];
    assert_eq!(row["participant_id"], participant_id);
    assert_eq!(row["attempt_id"], attempt_id);
    assert_eq!(row["score"], 6);
    assert_eq!(row["dimensions"]["vision"], 5.0);
    assert_eq!(report["dimensions"]["empathy"], 1.0);
}

// ---------------------------------------------------------------------------
// Test: answers must belong to the attempt's assessment
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_mismatched_option_is_rejected(pool: PgPool) {
    let fx = setup(&pool).await;
    let (_, token) = invite(&fx, "pat@example.com").await;
    let (_, attempt) = start(&fx, &token).await;
    let attempt_id = attempt["data"]["id"].as_i64().unwrap();

    let (q1, _) = fx.questions[0];
    let (_, q2_opts) = fx.questions[1];
    let response = put_json(
        fx.app.clone(),
        &format!("/api/v1/participate/{token}/attempts/{attempt_id}/responses"),
        json!({ "responses": [{ "question_id": q1, "option_id": q2_opts[0] }] }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = put_json(
        fx.app.clone(),
        &format!("/api/v1/participate/{token}/attempts/{attempt_id}/responses"),
        json!({ "responses": [] }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Test: tokens are checked and attempts are private to their participant
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_tokens_and_attempt_ownership(pool: PgPool) {
    let fx = setup(&pool).await;
    let (_, alice) = invite(&fx, "alice@example.com").await;
    let (_, bob) = invite(&fx, "bob@example.com").await;

    let response = get(fx.app.clone(), "/api/v1/participate/not-a-real-token").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let (_, attempt) = start(&fx, &alice).await;
    let attempt_id = attempt["data"]["id"].as_i64().unwrap();

    let response = post_json(
        fx.app.clone(),
        &format!("/api/v1/participate/{bob}/attempts/{attempt_id}/complete"),
        json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Test: unpublished assessments cannot be started
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unpublished_assessment_is_hidden(pool: PgPool) {
    let fx = setup(&pool).await;
    let (_, token) = invite(&fx, "pat@example.com").await;

    let response = common::put_json_auth(
        fx.app.clone(),
        &format!("/api/v1/admin/assessments/{}", fx.assessment_id),
        json!({ "is_published": false }),
        &fx.admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let view = body_json(get(fx.app.clone(), &format!("/api/v1/participate/{token}")).await).await;
    assert_eq!(view["data"]["assessments"], json!([]));

    let (status, _) = start(&fx, &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Test: organization routes are limited to admins and members
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_org_routes_require_membership(pool: PgPool) {
    let fx = setup(&pool).await;
    let member = create_user(&pool, "member@example.com", ORG_USER_ROLE_ID).await;
    let token = login(fx.app.clone(), "member@example.com").await;
    let uri = format!("/api/v1/organizations/{}/participants", fx.org_id);

    let response = get_auth(fx.app.clone(), &uri, &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = post_json_auth(
        fx.app.clone(),
        &format!("/api/v1/admin/organizations/{}/members", fx.org_id),
        json!({ "user_id": member.id }),
        &fx.admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = get_auth(fx.app.clone(), &uri, &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get_auth(
        fx.app.clone(),
        "/api/v1/organizations/999999/participants",
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Test: invitations may only target the organization's own cohorts
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_invite_rejects_foreign_cohort(pool: PgPool) {
    let fx = setup(&pool).await;

    let other = post_json_auth(
        fx.app.clone(),
        "/api/v1/admin/organizations",
        json!({ "name": "Contoso" }),
        &fx.admin,
    )
    .await;
    let other_id = body_json(other).await["data"]["id"].as_i64().unwrap();
    let cohort = post_json_auth(
        fx.app.clone(),
        &format!("/api/v1/admin/organizations/{other_id}/cohorts"),
        json!({ "name": "Spring" }),
        &fx.admin,
    )
    .await;
    let cohort_id = body_json(cohort).await["data"]["id"].as_i64().unwrap();

    let response = post_json_auth(
        fx.app.clone(),
        &format!("/api/v1/organizations/{}/participants", fx.org_id),
        json!({ "email": "pat@example.com", "full_name": "Pat", "cohort_id": cohort_id }),
        &fx.admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Test: a failed invitation insert leaves the email free to invite again
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_failed_invite_leaves_no_participant(pool: PgPool) {
    let fx = setup(&pool).await;
    let uri = format!("/api/v1/organizations/{}/participants", fx.org_id);
    let body = json!({ "email": "pat@example.com", "full_name": "Pat" });

    sqlx::query(
        "CREATE FUNCTION refuse_invitation() RETURNS trigger AS $$
         BEGIN RAISE EXCEPTION 'invitations are disabled'; END;
         $$ LANGUAGE plpgsql",
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query(
        "CREATE TRIGGER trg_refuse_invitation BEFORE INSERT ON invitations
         FOR EACH ROW EXECUTE FUNCTION refuse_invitation()",
    )
    .execute(&pool)
    .await
    .unwrap();

    let response = post_json_auth(fx.app.clone(), &uri, body.clone(), &fx.admin).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let (participants,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM participants")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(participants, 0);

    sqlx::query("DROP TRIGGER trg_refuse_invitation ON invitations")
        .execute(&pool)
        .await
        .unwrap();

    let response = post_json_auth(fx.app.clone(), &uri, body, &fx.admin).await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

// ---------------------------------------------------------------------------
// Test: the dashboard serves an empty summary while the database is down
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_dashboard_degrades_when_database_unhealthy(pool: PgPool) {
    let fx = setup(&pool).await;
    invite(&fx, "pat@example.com").await;

    let state = AppState::new(pool.clone(), common::test_config());
    state.db_health.mark_unhealthy().await;
    let app = common::build_test_app_from_state(state);
    let admin = login(app.clone(), "admin@example.com").await;

    let response = get_auth(
        app,
        &format!("/api/v1/organizations/{}/dashboard", fx.org_id),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let dashboard = body_json(response).await["data"].clone();
    assert_eq!(dashboard["degraded"], true);
    assert_eq!(dashboard["organization_id"], fx.org_id);
    assert_eq!(dashboard["participant_count"], 0);
    assert_eq!(dashboard["invited_count"], 0);
    assert_eq!(dashboard["completed_count"], 0);
    assert!(dashboard["average_score"].is_null());
}
