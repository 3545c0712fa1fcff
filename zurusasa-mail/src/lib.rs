//! Transactional and marketing email for ZuruSasa.
//!
//! [`templates`] renders the branded HTML for each email type, [`ResendClient`]
//! talks to the email provider's REST API, and [`MemoryMailer`] records calls
//! for tests.

pub mod types;
pub mod templates;
pub mod resend;
pub mod memory;

pub use types::{Broadcast, Contact, EmailMessage, MailError, MailResult, Mailer};
pub use templates::{EmailKind, RenderedEmail};
pub use resend::{ResendClient, ResendSettings};
pub use memory::MemoryMailer;
