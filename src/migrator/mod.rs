use sea_orm_migration::prelude::*;

mod m20260301_000001_create_users;
mod m20260301_000002_create_patients;
mod m20260308_000001_create_medications;
mod m20260308_000002_create_medication_history;
mod m20260315_000001_create_whatsapp_logs;
mod m20260426_000001_create_organizations;
mod m20260426_000002_scope_patients_to_organizations;
mod m20260510_000001_rework_medication_history;
mod m20260524_000001_create_adherence_function;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_create_users::Migration),
            Box::new(m20260301_000002_create_patients::Migration),
            Box::new(m20260308_000001_create_medications::Migration),
            Box::new(m20260308_000002_create_medication_history::Migration),
            Box::new(m20260315_000001_create_whatsapp_logs::Migration),
            Box::new(m20260426_000001_create_organizations::Migration),
            Box::new(m20260426_000002_scope_patients_to_organizations::Migration),
            Box::new(m20260510_000001_rework_medication_history::Migration),
            Box::new(m20260524_000001_create_adherence_function::Migration),
        ]
    }
}
