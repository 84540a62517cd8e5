use secrecy::{ExposeSecret, SecretString};

/// Credentials for authenticating with a PCE.
///
/// Both variants travel as an HTTP Basic-Auth pair on every request; the
/// distinction only matters for diagnostics and config resolution.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// API key pair generated under My Profile > API Keys.
    /// The key id looks like `api_1a2b3c4d5e`.
    ApiKey { key_id: String, secret: SecretString },

    /// Interactive user login (username + password).
    User {
        username: String,
        password: SecretString,
    },
}

impl Credentials {
    /// Build API-key credentials.
    pub fn api_key(key_id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self::ApiKey {
            key_id: key_id.into(),
            secret: SecretString::from(secret.into()),
        }
    }

    /// Build username/password credentials.
    pub fn user(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::User {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }

    /// The Basic-Auth user half (key id or username).
    pub fn principal(&self) -> &str {
        match self {
            Self::ApiKey { key_id, .. } => key_id,
            Self::User { username, .. } => username,
        }
    }

    /// Attach the Basic-Auth header to a request.
    pub(crate) fn apply(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let secret = match self {
            Self::ApiKey { secret, .. } => secret,
            Self::User { password, .. } => password,
        };
        builder.basic_auth(self.principal(), Some(secret.expose_secret()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn principal_is_key_id_for_api_keys() {
        let creds = Credentials::api_key("api_1a2b3c", "s3cret");
        assert_eq!(creds.principal(), "api_1a2b3c");
    }

    #[test]
    fn principal_is_username_for_user_logins() {
        let creds = Credentials::user("alice@example.com", "hunter2");
        assert_eq!(creds.principal(), "alice@example.com");
    }
}
