pub mod auth;
pub mod endpoint;
pub mod error;
pub mod service;
pub mod template;
pub mod types;

pub use auth::AuthGate;
pub use endpoint::BatchSendEndpoint;
pub use error::{AuthError, DispatchError};
pub use service::DispatchService;
pub use types::{BatchReceipt, Recipient, SendRequest};
