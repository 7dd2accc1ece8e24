//! 身份校验边界
//!
//! 发帖需要有效凭证，但消息上显示的作者名是自由字段，两者互不绑定。

use domain::UserId;

use crate::error::ApplicationError;

/// 凭证校验通过后得到的调用方身份
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub subject_id: UserId,
    pub display_handle: String,
}

#[cfg_attr(test, mockall::automock)]
pub trait CredentialVerifier: Send + Sync {
    /// 凭证无效或过期时返回 `ApplicationError::Authentication`
    fn verify_credential(&self, token: &str) -> Result<Identity, ApplicationError>;
}
