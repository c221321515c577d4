use std::fmt;

use crate::command::REDACTED;
use crate::error::{BridgeError, CredentialField};

/// OMERO login handed over by the hosting session.
/// （由主程式工作階段提供的 OMERO 登入資訊。）
///
/// Both values are fixed at construction. The password is only reachable
/// through [`Credentials::expose_secret`] and is masked in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    user: String,
    secret: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            secret: secret.into(),
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    /// Raw password, for adapters that must forward it to the server.
    pub fn expose_secret(&self) -> &str {
        &self.secret
    }

    /// Fails on the first empty field, user name before password.
    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.user.is_empty() {
            return Err(BridgeError::MissingCredential(CredentialField::User));
        }
        if self.secret.is_empty() {
            return Err(BridgeError::MissingCredential(CredentialField::Password));
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("secret", &REDACTED)
            .finish()
    }
}
