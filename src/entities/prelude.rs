pub use super::medication::Entity as Medication;
pub use super::medication_history::Entity as MedicationHistory;
pub use super::organization::Entity as Organization;
pub use super::patient::Entity as Patient;
pub use super::user::Entity as User;
pub use super::whatsapp_log::Entity as WhatsappLog;
