use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// First-generation history: denormalized medication name, no link back to
// the medication row. Reworked later once the messaging worker landed.
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MedicationHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MedicationHistory::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(MedicationHistory::PatientId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MedicationHistory::MedicationName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MedicationHistory::ScheduledTime)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(MedicationHistory::ActualTime).string())
                    .col(
                        ColumnDef::new(MedicationHistory::Status)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(MedicationHistory::Date).date().not_null())
                    .col(
                        ColumnDef::new(MedicationHistory::CreatedAt)
                            .date_time()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-medication_history-patient_id")
                            .from(MedicationHistory::Table, MedicationHistory::PatientId)
                            .to(Patients::Table, Patients::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MedicationHistory::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum MedicationHistory {
    Table,
    Id,
    PatientId,
    MedicationName,
    ScheduledTime,
    ActualTime,
    Status,
    Date,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Patients {
    Table,
    Id,
}
