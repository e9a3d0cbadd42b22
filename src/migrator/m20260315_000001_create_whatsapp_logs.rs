use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(WhatsappLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WhatsappLogs::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    // Nullable on purpose: log rows outlive their patient.
                    .col(ColumnDef::new(WhatsappLogs::PatientId).uuid())
                    .col(
                        ColumnDef::new(WhatsappLogs::MessageType)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(WhatsappLogs::Message).text().not_null())
                    .col(
                        ColumnDef::new(WhatsappLogs::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(WhatsappLogs::SentTo).string())
                    .col(
                        ColumnDef::new(WhatsappLogs::SentAt)
                            .date_time()
                            .not_null(),
                    )
                    .col(ColumnDef::new(WhatsappLogs::DeliveredAt).date_time())
                    .col(
                        ColumnDef::new(WhatsappLogs::CreatedAt)
                            .date_time()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-whatsapp_log-patient_id")
                            .from(WhatsappLogs::Table, WhatsappLogs::PatientId)
                            .to(Patients::Table, Patients::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(WhatsappLogs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum WhatsappLogs {
    Table,
    Id,
    PatientId,
    MessageType,
    Message,
    Status,
    SentTo,
    SentAt,
    DeliveredAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Patients {
    Table,
    Id,
}
