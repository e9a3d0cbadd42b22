use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Outcome of one scheduled dose, written by the messaging worker.
/// `missed`, `pending` and `delayed` are the alert-bearing states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Deserialize, Serialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum AdherenceStatus {
    #[sea_orm(string_value = "taken")]
    Taken,
    #[sea_orm(string_value = "missed")]
    Missed,
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "delayed")]
    Delayed,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "medication_history")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub patient_id: Uuid,
    pub organization_id: Option<Uuid>,
    pub medication_id: Option<Uuid>,
    /// Scheduled clock time as "HH:MM"; string sort equals time sort.
    pub scheduled_time: String,
    /// Same instant as minutes after midnight, for the worker's window math.
    pub scheduled_minutes: i32,
    pub status: AdherenceStatus,
    pub date: Date,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::patient::Entity",
        from = "Column::PatientId",
        to = "super::patient::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Patient,
    #[sea_orm(
        belongs_to = "super::medication::Entity",
        from = "Column::MedicationId",
        to = "super::medication::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Medication,
    #[sea_orm(
        belongs_to = "super::organization::Entity",
        from = "Column::OrganizationId",
        to = "super::organization::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    Organization,
}

impl Related<super::patient::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Patient.def()
    }
}

impl Related<super::medication::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Medication.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
