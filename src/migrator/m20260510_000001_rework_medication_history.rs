use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// Links history rows to their medication and organization and replaces the
// denormalized medication name. The medication FK stays NO ACTION so a
// medication with recorded doses cannot be hard-deleted (the API turns
// that rejection into the archive prompt); deleting a patient still
// cascades both tables in one statement.
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(MedicationHistory::Table)
                    .add_column(ColumnDef::new(MedicationHistory::OrganizationId).uuid())
                    .add_column(ColumnDef::new(MedicationHistory::MedicationId).uuid())
                    .add_column(
                        ColumnDef::new(MedicationHistory::ScheduledMinutes)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_foreign_key(
                ForeignKey::create()
                    .name("fk-medication_history-organization_id")
                    .from(
                        MedicationHistory::Table,
                        MedicationHistory::OrganizationId,
                    )
                    .to(Organizations::Table, Organizations::Id)
                    .on_delete(ForeignKeyAction::SetNull)
                    .on_update(ForeignKeyAction::Cascade)
                    .to_owned(),
            )
            .await?;

        manager
            .create_foreign_key(
                ForeignKey::create()
                    .name("fk-medication_history-medication_id")
                    .from(MedicationHistory::Table, MedicationHistory::MedicationId)
                    .to(Medications::Table, Medications::Id)
                    .on_delete(ForeignKeyAction::NoAction)
                    .on_update(ForeignKeyAction::NoAction)
                    .to_owned(),
            )
            .await?;

        let conn = manager.get_connection();
        conn.execute_unprepared(
            "UPDATE medication_history h SET organization_id = p.organization_id \
             FROM patients p WHERE p.id = h.patient_id",
        )
        .await?;
        conn.execute_unprepared(
            "UPDATE medication_history h SET medication_id = m.id \
             FROM medications m \
             WHERE m.patient_id = h.patient_id AND m.name = h.medication_name",
        )
        .await?;
        conn.execute_unprepared(
            "UPDATE medication_history SET scheduled_minutes = \
             split_part(scheduled_time, ':', 1)::int * 60 + \
             split_part(scheduled_time, ':', 2)::int",
        )
        .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(MedicationHistory::Table)
                    .drop_column(MedicationHistory::MedicationName)
                    .drop_column(MedicationHistory::ActualTime)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_medication_history_patient_id_date")
                    .table(MedicationHistory::Table)
                    .col(MedicationHistory::PatientId)
                    .col(MedicationHistory::Date)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_medication_history_patient_id_date")
                    .table(MedicationHistory::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_foreign_key(
                ForeignKey::drop()
                    .name("fk-medication_history-medication_id")
                    .table(MedicationHistory::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_foreign_key(
                ForeignKey::drop()
                    .name("fk-medication_history-organization_id")
                    .table(MedicationHistory::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(MedicationHistory::Table)
                    .add_column(ColumnDef::new(MedicationHistory::MedicationName).string())
                    .add_column(ColumnDef::new(MedicationHistory::ActualTime).string())
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                "UPDATE medication_history h SET medication_name = m.name \
                 FROM medications m WHERE m.id = h.medication_id",
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(MedicationHistory::Table)
                    .drop_column(MedicationHistory::OrganizationId)
                    .drop_column(MedicationHistory::MedicationId)
                    .drop_column(MedicationHistory::ScheduledMinutes)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum MedicationHistory {
    Table,
    MedicationName,
    ActualTime,
    OrganizationId,
    MedicationId,
    ScheduledMinutes,
    PatientId,
    Date,
}

#[derive(DeriveIden)]
enum Medications {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Organizations {
    Table,
    Id,
}
