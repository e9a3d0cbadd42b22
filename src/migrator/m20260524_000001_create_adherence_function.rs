use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// Server-side adherence percentage for operators and the messaging
// worker. The dashboard API computes the same figure in application code
// over the rows it already fetched; keep the two formulas in sync.
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE OR REPLACE FUNCTION calculate_patient_adherence(\
                     patient_uuid uuid, days_back integer DEFAULT 7) \
                 RETURNS integer \
                 LANGUAGE sql STABLE AS $$ \
                     SELECT CASE \
                         WHEN COUNT(*) = 0 THEN 0 \
                         ELSE ROUND(COUNT(*) FILTER (WHERE status = 'taken') \
                                    * 100.0 / COUNT(*))::integer \
                     END \
                     FROM medication_history \
                     WHERE patient_id = patient_uuid \
                       AND date >= CURRENT_DATE - days_back \
                 $$",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                "DROP FUNCTION IF EXISTS calculate_patient_adherence(uuid, integer)",
            )
            .await?;

        Ok(())
    }
}
