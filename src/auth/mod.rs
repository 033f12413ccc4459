// 认证模块 - 提供JWT签发验证、刷新令牌轮换和登出撤销功能

pub mod models;
pub mod opaque;
pub mod password;
pub mod session_manager;
pub mod signer;
pub mod token_service;

// 重新导出主要类型
pub use models::{
    AdminUser, CreateCompanyRequest, LoginRequest, RefreshRequest, RefreshToken,
    RegisterEmployeeRequest, Role, SessionPayload, TokenPair,
};
pub use password::{PasswordHasher, MIN_PASSWORD_COST, PASSWORD_COST};
pub use session_manager::SessionManager;
pub use signer::{JwtSigner, SignerError};
pub use token_service::TokenService;
