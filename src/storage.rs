mod folio;
/// The key/value form requirements take inside a folio.
pub mod record;
mod standard;

pub use folio::Folio;
pub use record::{RecordError, RequirementRecord};
pub use standard::{ReadError, Standard, CUSTOMER_DIR, FOLIO_EXTENSION, PROJECT_DIR};
