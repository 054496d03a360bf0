use std::fmt;

/// Represents a user as seen by a sense
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct User {
    pub id: String,
    pub email: String,
    pub handle: Option<String>,
    pub display_name: Option<String>,
}

impl User {
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            handle: None,
            display_name: None,
        }
    }

    pub fn with_handle(mut self, handle: impl Into<String>) -> Self {
        self.handle = Some(handle.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Email normalized the way group membership stores it
    pub fn normalized_email(&self) -> String {
        self.email.trim().to_lowercase()
    }

    pub fn label(&self) -> String {
        if let Some(ref handle) = self.handle {
            handle.clone()
        } else if let Some(ref name) = self.display_name {
            name.clone()
        } else {
            self.email.clone()
        }
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_email() {
        let user = User::new("1", "  Homer.Simpson@Example.COM ");
        assert_eq!(user.normalized_email(), "homer.simpson@example.com");
    }

    #[test]
    fn test_label_prefers_handle() {
        let user = User::new("1", "a@example.com").with_name("Abe").with_handle("abe");
        assert_eq!(user.label(), "abe");
        assert_eq!(User::new("2", "b@example.com").to_string(), "b@example.com");
    }
}
