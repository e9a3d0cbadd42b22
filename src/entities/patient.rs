use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Patients enter either as `pending` (self-registered through the
/// messaging bot, or freshly enrolled by a caregiver) or get promoted to
/// `active` once approved / linked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Deserialize, Serialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum PatientStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "active")]
    Active,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "patients")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Option<Uuid>,
    pub name: String,
    pub birth_date: Option<Date>,
    pub phone: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub avatar: Option<String>,
    pub caregiver_name: Option<String>,
    pub caregiver_phone: Option<String>,
    pub telegram_id: Option<String>,
    pub username: Option<String>,
    pub status: PatientStatus,
    pub active: bool,
    pub timezone: String,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::organization::Entity",
        from = "Column::OrganizationId",
        to = "super::organization::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Organization,
    #[sea_orm(has_many = "super::medication::Entity")]
    Medication,
    #[sea_orm(has_many = "super::medication_history::Entity")]
    MedicationHistory,
    #[sea_orm(has_many = "super::whatsapp_log::Entity")]
    WhatsappLog,
}

impl Related<super::organization::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organization.def()
    }
}

impl Related<super::medication::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Medication.def()
    }
}

impl Related<super::medication_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MedicationHistory.def()
    }
}

impl Related<super::whatsapp_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WhatsappLog.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
