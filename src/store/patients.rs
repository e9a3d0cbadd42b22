use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder};
use tracing::warn;
use uuid::Uuid;

use crate::entities::patient::{self, PatientStatus};
use crate::entities::prelude::Patient;

/// Patients visible to one organization, ordered by name. Accounts that
/// never enrolled anyone have no organization yet; they see an empty
/// directory without a round trip.
pub async fn list_for_organization(
    db: &DatabaseConnection,
    organization_id: Option<Uuid>,
) -> Result<Vec<patient::Model>, DbErr> {
    let Some(organization_id) = organization_id else {
        return Ok(vec![]);
    };
    Patient::find()
        .filter(patient::Column::OrganizationId.eq(organization_id))
        .order_by_asc(patient::Column::Name)
        .all(db)
        .await
}

pub async fn ids_for_organization(
    db: &DatabaseConnection,
    organization_id: Option<Uuid>,
) -> Result<Vec<Uuid>, DbErr> {
    let patients = list_for_organization(db, organization_id).await?;
    Ok(patients.iter().map(|p| p.id).collect())
}

/// Single patient, but only when the caller's organization owns it.
pub async fn find_owned(
    db: &DatabaseConnection,
    organization_id: Uuid,
    patient_id: Uuid,
) -> Result<Option<patient::Model>, DbErr> {
    match Patient::find_by_id(patient_id).one(db).await? {
        Some(p) if p.organization_id == Some(organization_id) => Ok(Some(p)),
        _ => Ok(None),
    }
}

/// Enrolment linking heuristic: pending bot registrations whose name
/// contains the entered name, case-insensitively. Only rows that carry a
/// telegram identity qualify.
pub async fn find_link_candidates(
    db: &DatabaseConnection,
    name: &str,
) -> Result<Vec<patient::Model>, DbErr> {
    let pattern = format!("%{}%", name.trim());
    Patient::find()
        .filter(Expr::col(patient::Column::Name).ilike(pattern))
        .filter(patient::Column::TelegramId.is_not_null())
        .filter(patient::Column::Status.eq(PatientStatus::Pending))
        .order_by_asc(patient::Column::CreatedAt)
        .all(db)
        .await
}

/// Picks the candidate to link. Substring matching can hit more than one
/// pending registration; that ambiguity is logged and the first match
/// wins, which is what the original single-row lookup silently did.
pub fn choose_link_candidate(mut candidates: Vec<patient::Model>) -> Option<patient::Model> {
    if candidates.len() > 1 {
        let ids: Vec<Uuid> = candidates.iter().map(|p| p.id).collect();
        warn!(
            matches = candidates.len(),
            ?ids,
            "ambiguous patient link match, keeping the first"
        );
    }
    if candidates.is_empty() {
        None
    } else {
        Some(candidates.remove(0))
    }
}

/// Approval queue, newest registrations first.
pub async fn list_pending(db: &DatabaseConnection) -> Result<Vec<patient::Model>, DbErr> {
    Patient::find()
        .filter(patient::Column::Status.eq(PatientStatus::Pending))
        .order_by_desc(patient::Column::CreatedAt)
        .all(db)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn registered(name: &str) -> patient::Model {
        let day = NaiveDate::from_ymd_opt(2026, 4, 2).unwrap();
        patient::Model {
            id: Uuid::new_v4(),
            organization_id: None,
            name: name.to_string(),
            birth_date: None,
            phone: None,
            avatar: None,
            caregiver_name: None,
            caregiver_phone: None,
            telegram_id: Some("556199990000".to_string()),
            username: Some("maria".to_string()),
            status: PatientStatus::Pending,
            active: true,
            timezone: "America/Sao_Paulo".to_string(),
            created_at: day.and_hms_opt(10, 0, 0).unwrap(),
            updated_at: day.and_hms_opt(10, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn missing_organization_lists_nothing_without_a_query() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let patients = list_for_organization(&db, None).await.unwrap();
        assert!(patients.is_empty());

        let ids = ids_for_organization(&db, None).await.unwrap();
        assert!(ids.is_empty());

        assert!(db.into_transaction_log().is_empty());
    }

    #[tokio::test]
    async fn listing_maps_rows_for_the_owning_organization() {
        let org = Uuid::new_v4();
        let mut ana = registered("Ana");
        ana.organization_id = Some(org);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![ana.clone()]])
            .into_connection();

        let patients = list_for_organization(&db, Some(org)).await.unwrap();
        assert_eq!(patients, vec![ana]);
        assert_eq!(db.into_transaction_log().len(), 1);
    }

    #[test]
    fn link_candidate_chooses_nothing_from_an_empty_match() {
        assert_eq!(choose_link_candidate(vec![]), None);
    }

    #[test]
    fn link_candidate_keeps_the_first_of_many_matches() {
        let first = registered("Maria Silva");
        let second = registered("Maria Souza");
        let chosen = choose_link_candidate(vec![first.clone(), second]).unwrap();
        assert_eq!(chosen.id, first.id);
    }
}
