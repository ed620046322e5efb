// Service exports
pub mod docstore;
pub mod mailer;
pub mod postgres;

pub use docstore::{DocStoreError, DocumentStoreClient};
pub use mailer::{MailError, Mailer};
pub use postgres::{PostgresClient, PostgresError};
