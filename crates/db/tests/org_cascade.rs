use assert_matches::assert_matches;
use assessment_core::types::DbId;
use assessment_db::models::assessment::{CreateAssessment, CreateQuestion, OptionInput};
use assessment_db::models::attempt::AnswerInput;
use assessment_db::models::cohort::CreateCohort;
use assessment_db::models::organization::CreateOrganization;
use assessment_db::models::participant::CreateParticipant;
use assessment_db::models::user::CreateUser;
use assessment_db::repositories::{
    AssessmentRepo, AttemptRepo, CohortDeletion, CohortRepo, MembershipRepo,
    OrganizationRepo, ParticipantRepo, QuestionRepo, ResponseRepo, UserRepo,
};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// An assessment with four two-option questions. Returns the first option of each.
async fn seed_assessment(pool: &PgPool) -> (DbId, Vec<(DbId, DbId)>) {
    let assessment = AssessmentRepo::create(
        pool,
        &CreateAssessment {
            title: "Leadership Pulse".to_string(),
            description: None,
            is_published: Some(true),
        },
    )
    .await
    .unwrap();

    let mut answers = Vec::new();
    for position in 0..4 {
        let q = QuestionRepo::create(
            pool,
            &CreateQuestion {
                assessment_id: assessment.id,
                prompt: format!("Question {position}"),
                dimension: "vision".to_string(),
                position,
                options: vec![
                    OptionInput { label: "Agree".to_string(), score: 3 },
                    OptionInput { label: "Disagree".to_string(), score: 1 },
                ],
                correct_index: Some(0),
            },
        )
        .await
        .unwrap();
        answers.push((q.question.id, q.options[0].id));
    }
    (assessment.id, answers)
}

/// An organization with a member, a cohort, and 3 participants who each have
/// an invitation and 2 attempts of 4 responses.
async fn seed_org(pool: &PgPool, name: &str) -> DbId {
    let (assessment_id, answers) = seed_assessment(pool).await;
    let org = OrganizationRepo::create(pool, &CreateOrganization { name: name.to_string() })
        .await
        .unwrap();

    let user = UserRepo::create(
        pool,
        &CreateUser {
            email: format!("lead@{name}.test"),
            full_name: "Org Lead".to_string(),
            password_hash: "not-a-real-hash".to_string(),
            role_id: 2,
        },
    )
    .await
    .unwrap();
    MembershipRepo::add(pool, org.id, user.id).await.unwrap();

    let cohort = CohortRepo::create(
        pool,
        &CreateCohort { organization_id: org.id, name: "Spring".to_string() },
    )
    .await
    .unwrap();

    let inputs: Vec<AnswerInput> = answers
        .iter()
        .map(|&(question_id, option_id)| AnswerInput { question_id, option_id })
        .collect();

    for i in 0..3 {
        let (participant, _) = ParticipantRepo::create_with_invitation(
            pool,
            &CreateParticipant {
                organization_id: org.id,
                cohort_id: Some(cohort.id),
                email: format!("p{i}@{name}.test"),
                full_name: format!("Participant {i}"),
            },
            &format!("{name}-hash-{i}"),
            chrono::Utc::now() + chrono::Duration::days(7),
        )
        .await
        .unwrap();

        for _ in 0..2 {
            let attempt = AttemptRepo::create(pool, participant.id, assessment_id)
                .await
                .unwrap();
            ResponseRepo::upsert_many(pool, attempt.id, &inputs)
                .await
                .unwrap()
                .expect("attempt is open");
        }
    }
    org.id
}

async fn count(pool: &PgPool, table: &str) -> i64 {
    let row: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap();
    row.0
}

// ---------------------------------------------------------------------------
// Test: organization delete removes all dependent rows
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_org_delete_cascades_in_order(pool: PgPool) {
    let org_id = seed_org(&pool, "acme").await;

    let summary = OrganizationRepo::delete(&pool, org_id)
        .await
        .unwrap()
        .expect("organization should exist");

    assert_eq!(summary.responses, 24);
    assert_eq!(summary.attempts, 6);
    assert_eq!(summary.invitations, 3);
    assert_eq!(summary.participants, 3);
    assert_eq!(summary.cohorts, 1);
    assert_eq!(summary.memberships, 1);

    for table in ["responses", "attempts", "invitations", "participants", "cohorts", "memberships", "organizations"] {
        assert_eq!(count(&pool, table).await, 0, "{table} should be empty");
    }
    // Users and assessment content are not owned by the organization.
    assert_eq!(count(&pool, "users").await, 1);
    assert_eq!(count(&pool, "questions").await, 4);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_org_delete_leaves_other_orgs_alone(pool: PgPool) {
    let doomed = seed_org(&pool, "doomed").await;
    let kept = seed_org(&pool, "kept").await;

    OrganizationRepo::delete(&pool, doomed).await.unwrap();

    assert!(OrganizationRepo::find_by_id(&pool, kept).await.unwrap().is_some());
    assert_eq!(count(&pool, "participants").await, 3);
    assert_eq!(count(&pool, "responses").await, 24);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_org_delete_missing_returns_none(pool: PgPool) {
    assert!(OrganizationRepo::delete(&pool, 9999).await.unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Test: a failure on the last step rolls back every prior delete
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_org_delete_failure_rolls_back(pool: PgPool) {
    let org_id = seed_org(&pool, "sticky").await;

    sqlx::query(
        "CREATE FUNCTION refuse_org_delete() RETURNS trigger AS $$
         BEGIN RAISE EXCEPTION 'organization deletes are disabled'; END;
         $$ LANGUAGE plpgsql",
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query(
        "CREATE TRIGGER trg_refuse_org_delete BEFORE DELETE ON organizations
         FOR EACH ROW EXECUTE FUNCTION refuse_org_delete()",
    )
    .execute(&pool)
    .await
    .unwrap();

    let result = OrganizationRepo::delete(&pool, org_id).await;
    assert_matches!(result, Err(sqlx::Error::Database(_)));

    assert_eq!(count(&pool, "organizations").await, 1);
    assert_eq!(count(&pool, "memberships").await, 1);
    assert_eq!(count(&pool, "cohorts").await, 1);
    assert_eq!(count(&pool, "participants").await, 3);
    assert_eq!(count(&pool, "invitations").await, 3);
    assert_eq!(count(&pool, "attempts").await, 6);
    assert_eq!(count(&pool, "responses").await, 24);
}

// ---------------------------------------------------------------------------
// Test: cohort delete guard
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_cohort_with_active_participants_is_kept(pool: PgPool) {
    let org_id = seed_org(&pool, "cohorts").await;
    let cohort = CohortRepo::list_by_organization(&pool, org_id).await.unwrap().remove(0);

    let outcome = CohortRepo::delete(&pool, cohort.id).await.unwrap();
    assert_eq!(outcome, CohortDeletion::HasActiveParticipants(3));

    for p in ParticipantRepo::list_by_organization(&pool, org_id).await.unwrap() {
        ParticipantRepo::set_active(&pool, p.id, false).await.unwrap();
    }
    assert_eq!(CohortRepo::delete(&pool, cohort.id).await.unwrap(), CohortDeletion::Deleted);

    let detached = ParticipantRepo::list_by_organization(&pool, org_id).await.unwrap();
    assert!(detached.iter().all(|p| p.cohort_id.is_none()));
    assert_eq!(CohortRepo::delete(&pool, cohort.id).await.unwrap(), CohortDeletion::NotFound);
}

// ---------------------------------------------------------------------------
// Test: participant and invitation are inserted together or not at all
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_invite_failure_leaves_no_participant(pool: PgPool) {
    let org = OrganizationRepo::create(&pool, &CreateOrganization { name: "Umbrella".to_string() })
        .await
        .unwrap();
    let input = CreateParticipant {
        organization_id: org.id,
        cohort_id: None,
        email: "dee@umbrella.test".to_string(),
        full_name: "Dee".to_string(),
    };
    let expires_at = chrono::Utc::now() + chrono::Duration::days(7);

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

    let result = ParticipantRepo::create_with_invitation(&pool, &input, "hash-1", expires_at).await;
    assert_matches!(result, Err(sqlx::Error::Database(_)));
    assert_eq!(count(&pool, "participants").await, 0);
    assert_eq!(count(&pool, "invitations").await, 0);

    sqlx::query("DROP TRIGGER trg_refuse_invitation ON invitations")
        .execute(&pool)
        .await
        .unwrap();

    let (participant, invitation) =
        ParticipantRepo::create_with_invitation(&pool, &input, "hash-1", expires_at)
            .await
            .expect("retry succeeds once invitations are accepted again");
    assert_eq!(invitation.participant_id, participant.id);
    assert_eq!(count(&pool, "participants").await, 1);
}
