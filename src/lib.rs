pub mod auth;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod http; // HTTP 认证 API
pub mod infra;
pub mod logging;
pub mod model;
pub mod repository;
pub mod session; // 会话存储

pub use auth::{SessionManager, TokenService};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ServerConfig, TokenConfig};
pub use error::{ErrorKind, Result, ServerError};
pub use session::{MemorySessionStore, Namespace, SessionStore};
