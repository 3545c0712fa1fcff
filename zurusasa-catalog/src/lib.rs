pub mod experience;
pub mod reel;
pub mod profile;

pub use experience::{Category, Experience, NewExperience};
pub use reel::{Reel, ReelStatus, NewReel, MAX_REEL_SECONDS};
pub use profile::{Profile, UserRole, newsletter_opt_in};

/// Catalog validation errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Unknown value for {field}: {value}")]
    UnknownValue {
        field: &'static str,
        value: String,
    },

    #[error("Invalid listing: {0}")]
    InvalidListing(String),
}
