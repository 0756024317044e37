/// Per-call request context.
///
/// Every client call takes one of these explicitly; nothing reads auth
/// state from ambient storage, so tests can construct requests directly.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub auth_token: Option<String>,
    pub locale: Option<String>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            auth_token: Some(token.into()),
            locale: None,
        }
    }

    /// Value for the Authorization header, if a token is present.
    pub fn bearer(&self) -> Option<String> {
        self.auth_token.as_ref().map(|t| format!("Bearer {}", t))
    }
}
