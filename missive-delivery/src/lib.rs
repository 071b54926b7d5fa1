pub mod error;
pub mod mailer;
pub mod retry;
pub mod worker;

pub use error::{MailError, WorkerError};
pub use mailer::{LogMailer, Mailer, MailerConfig, MessageId, MockMailer, SentMail};
pub use retry::RetryPolicy;
pub use worker::Worker;
