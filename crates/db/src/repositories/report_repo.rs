//! Read-only aggregate queries behind organization dashboards and reports.

use assessment_core::types::DbId;
use sqlx::PgPool;

use crate::models::attempt::{DashboardSummary, ParticipantResult, ScoredResponseRow};

pub struct ReportRepo;

impl ReportRepo {
    /// Participant funnel counts and mean completed score for one organization.
    pub async fn dashboard_summary(
        pool: &PgPool,
        organization_id: DbId,
    ) -> Result<DashboardSummary, sqlx::Error> {
        sqlx::query_as::<_, DashboardSummary>(
            "SELECT
                COUNT(*) AS participant_count,
                COUNT(*) FILTER (
                    WHERE EXISTS (SELECT 1 FROM invitations i WHERE i.participant_id = p.id)
                ) AS invited_count,
                COUNT(*) FILTER (
                    WHERE EXISTS (SELECT 1 FROM attempts a WHERE a.participant_id = p.id)
                ) AS started_count,
                COUNT(*) FILTER (
                    WHERE EXISTS (
                        SELECT 1 FROM attempts a
                        WHERE a.participant_id = p.id AND a.completed_at IS NOT NULL
                    )
                ) AS completed_count,
                (
                    SELECT AVG(a.score)::FLOAT8
                    FROM attempts a
                    JOIN participants p2 ON p2.id = a.participant_id
                    WHERE p2.organization_id = $1 AND a.completed_at IS NOT NULL
                ) AS average_score
             FROM participants p
             WHERE p.organization_id = $1",
        )
        .bind(organization_id)
        .fetch_one(pool)
        .await
    }

    /// Every participant of the organization with their latest completed attempt.
    pub async fn participant_results(
        pool: &PgPool,
        organization_id: DbId,
    ) -> Result<Vec<ParticipantResult>, sqlx::Error> {
        sqlx::query_as::<_, ParticipantResult>(
            "SELECT p.id AS participant_id, p.full_name, p.email, p.cohort_id,
                    a.id AS attempt_id, a.assessment_id, a.score, a.correct_count, a.completed_at
             FROM participants p
             LEFT JOIN LATERAL (
                SELECT id, assessment_id, score, correct_count, completed_at
                FROM attempts
                WHERE participant_id = p.id AND completed_at IS NOT NULL
                ORDER BY completed_at DESC
                LIMIT 1
             ) a ON true
             WHERE p.organization_id = $1
             ORDER BY p.full_name, p.id",
        )
        .bind(organization_id)
        .fetch_all(pool)
        .await
    }

    /// Scored responses of every completed attempt in the organization.
    pub async fn scored_responses_for_org(
        pool: &PgPool,
        organization_id: DbId,
    ) -> Result<Vec<ScoredResponseRow>, sqlx::Error> {
        sqlx::query_as::<_, ScoredResponseRow>(
            "SELECT r.attempt_id, r.question_id, r.option_id,
                    o.score AS option_score,
                    ca.option_id AS correct_option_id,
                    q.dimension
             FROM responses r
             JOIN attempts a ON a.id = r.attempt_id
             JOIN participants p ON p.id = a.participant_id
             JOIN question_options o ON o.id = r.option_id
             JOIN questions q ON q.id = r.question_id
             LEFT JOIN correct_answers ca ON ca.question_id = r.question_id
             WHERE p.organization_id = $1 AND a.completed_at IS NOT NULL",
        )
        .bind(organization_id)
        .fetch_all(pool)
        .await
    }
}
