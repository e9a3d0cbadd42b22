pub mod medication;
pub mod medication_history;
pub mod organization;
pub mod patient;
pub mod user;
pub mod whatsapp_log;

pub use medication::Entity as Medication;
pub use medication_history::Entity as MedicationHistory;
pub use organization::Entity as Organization;
pub use patient::Entity as Patient;
pub use user::Entity as User;
pub use whatsapp_log::Entity as WhatsappLog;

pub mod prelude;
