use crate::error::{Result, SmartCitizenError};

pub const DEFAULT_USERNAME_ENV: &str = "SMARTCITIZEN_USERNAME";
pub const DEFAULT_PASSWORD_ENV: &str = "SMARTCITIZEN_PASSWORD";
pub const DEFAULT_TOKEN_ENV: &str = "SMARTCITIZEN_TOKEN";

/// 用户凭据，令牌优先于密码
#[derive(Clone, Default)]
pub struct UserCredential {
    pub username: String,
    pub password: String,
    pub token: String,
}

impl std::fmt::Debug for UserCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserCredential")
            .field("username", &self.username)
            .field("password", &"***")
            .field("token", &"***")
            .finish()
    }
}

/// 从环境变量读取凭据
#[derive(Debug, Clone)]
pub struct UserCredentialEnvProvider {
    username_env: String,
    password_env: String,
    token_env: String,
}

impl UserCredentialEnvProvider {
    pub fn new(
        username_env: impl Into<String>,
        password_env: impl Into<String>,
        token_env: impl Into<String>,
    ) -> Self {
        Self {
            username_env: username_env.into(),
            password_env: password_env.into(),
            token_env: token_env.into(),
        }
    }

    /// 用户名必需，密码与令牌至少提供一个
    pub fn retrieve(&self) -> Result<UserCredential> {
        let username = read_env(&self.username_env);
        if username.is_empty() {
            return Err(SmartCitizenError::Credential(format!(
                "environment variable {} must be set",
                self.username_env
            )));
        }

        let password = read_env(&self.password_env);
        let token = read_env(&self.token_env);

        if password.is_empty() && token.is_empty() {
            return Err(SmartCitizenError::Credential(format!(
                "either environment variable {} or {} must be set",
                self.password_env, self.token_env
            )));
        }

        Ok(UserCredential {
            username,
            password,
            token,
        })
    }
}

impl Default for UserCredentialEnvProvider {
    fn default() -> Self {
        Self::new(DEFAULT_USERNAME_ENV, DEFAULT_PASSWORD_ENV, DEFAULT_TOKEN_ENV)
    }
}

fn read_env(name: &str) -> String {
    std::env::var(name).unwrap_or_default()
}
