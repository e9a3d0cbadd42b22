use sea_orm::DbErr;

pub mod history;
pub mod logs;
pub mod medications;
pub mod patients;

/// Postgres unique violation (23505). Matched on the driver message
/// because errors cross the pool as strings.
pub fn is_unique_violation(err: &DbErr) -> bool {
    err.to_string()
        .contains("duplicate key value violates unique constraint")
}

/// Postgres foreign-key violation (23503). On medication delete this is
/// the signal that history rows still reference it.
pub fn is_foreign_key_violation(err: &DbErr) -> bool {
    err.to_string().contains("violates foreign key constraint")
}
