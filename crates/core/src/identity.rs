//! Signed-in state supplied by the frontend.

use crate::config::IdentitySettings;

/// Who is using the browser right now.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    signed_in: bool,
    display_name: Option<String>,
}

impl Identity {
    /// Anonymous, signed-out identity.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Signed-in identity with an optional display name.
    pub fn signed_in(display_name: Option<String>) -> Self {
        Self {
            signed_in: true,
            display_name: display_name.filter(|name| !name.trim().is_empty()),
        }
    }

    /// Start-up identity: signed in when a display name is configured.
    pub fn from_settings(settings: &IdentitySettings) -> Self {
        match settings.display_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Self::signed_in(Some(name.to_string())),
            _ => Self::anonymous(),
        }
    }

    /// Whether a user is signed in.
    pub fn is_signed_in(&self) -> bool {
        self.signed_in
    }

    /// Display name, when known.
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Library writes are reserved for signed-in users.
    pub fn can_save(&self) -> bool {
        self.signed_in
    }

    /// Flip between signed in and signed out, keeping the display name.
    pub fn toggle(&mut self) {
        self.signed_in = !self.signed_in;
    }

    /// Headline greeting.
    pub fn greeting(&self) -> String {
        match (self.signed_in, self.display_name.as_deref()) {
            (true, Some(name)) => format!("Welcome, {name}!"),
            _ => "Welcome to MediaAMP!".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_name_signs_in() {
        let identity = Identity::from_settings(&IdentitySettings {
            display_name: Some(" Sam ".to_string()),
        });
        assert!(identity.can_save());
        assert_eq!(identity.greeting(), "Welcome, Sam!");
    }

    #[test]
    fn blank_name_stays_anonymous() {
        let identity = Identity::from_settings(&IdentitySettings {
            display_name: Some("  ".to_string()),
        });
        assert!(!identity.can_save());
        assert_eq!(identity.greeting(), "Welcome to MediaAMP!");
    }

    #[test]
    fn toggle_keeps_name() {
        let mut identity = Identity::signed_in(Some("Sam".to_string()));
        identity.toggle();
        assert!(!identity.is_signed_in());
        assert_eq!(identity.greeting(), "Welcome to MediaAMP!");
        identity.toggle();
        assert_eq!(identity.display_name(), Some("Sam"));
    }
}
