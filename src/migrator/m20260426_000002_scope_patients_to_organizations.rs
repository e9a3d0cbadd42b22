use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// Moves patients from per-account scoping to organization scoping and adds
// the columns the messaging-bot integration needs: telegram identity,
// approval status, soft-active flag, timezone. Age becomes a birth date
// (approximated for existing rows, which only recorded an age).
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Patients::Table)
                    .add_column(ColumnDef::new(Patients::OrganizationId).uuid())
                    .add_column(ColumnDef::new(Patients::BirthDate).date())
                    .add_column(ColumnDef::new(Patients::TelegramId).string())
                    .add_column(ColumnDef::new(Patients::Username).string())
                    .add_column(
                        ColumnDef::new(Patients::Status)
                            .string()
                            .not_null()
                            .default("active"),
                    )
                    .add_column(
                        ColumnDef::new(Patients::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .add_column(
                        ColumnDef::new(Patients::Timezone)
                            .string()
                            .not_null()
                            .default("America/Sao_Paulo"),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_foreign_key(
                ForeignKey::create()
                    .name("fk-patient-organization_id")
                    .from(Patients::Table, Patients::OrganizationId)
                    .to(Organizations::Table, Organizations::Id)
                    .on_delete(ForeignKeyAction::Cascade)
                    .on_update(ForeignKeyAction::Cascade)
                    .to_owned(),
            )
            .await?;

        let conn = manager.get_connection();
        conn.execute_unprepared("UPDATE patients SET organization_id = user_id")
            .await?;
        conn.execute_unprepared(
            "UPDATE patients SET birth_date = \
             (CURRENT_DATE - make_interval(years => age))::date",
        )
        .await?;

        manager
            .drop_foreign_key(
                ForeignKey::drop()
                    .name("fk-patient-user_id")
                    .table(Patients::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(Patients::Table)
                    .drop_column(Patients::UserId)
                    .drop_column(Patients::Age)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_patients_organization_id")
                    .table(Patients::Table)
                    .col(Patients::OrganizationId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_patients_organization_id")
                    .table(Patients::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_foreign_key(
                ForeignKey::drop()
                    .name("fk-patient-organization_id")
                    .table(Patients::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(Patients::Table)
                    .add_column(ColumnDef::new(Patients::UserId).uuid())
                    .add_column(ColumnDef::new(Patients::Age).integer())
                    .to_owned(),
            )
            .await?;

        let conn = manager.get_connection();
        conn.execute_unprepared("UPDATE patients SET user_id = organization_id")
            .await?;
        conn.execute_unprepared(
            "UPDATE patients SET age = \
             date_part('year', age(CURRENT_DATE, birth_date))::int",
        )
        .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(Patients::Table)
                    .drop_column(Patients::OrganizationId)
                    .drop_column(Patients::BirthDate)
                    .drop_column(Patients::TelegramId)
                    .drop_column(Patients::Username)
                    .drop_column(Patients::Status)
                    .drop_column(Patients::Active)
                    .drop_column(Patients::Timezone)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum Patients {
    Table,
    UserId,
    Age,
    OrganizationId,
    BirthDate,
    TelegramId,
    Username,
    Status,
    Active,
    Timezone,
}

#[derive(DeriveIden)]
enum Organizations {
    Table,
    Id,
}
