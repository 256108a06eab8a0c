//! Credentials for GitHub basic authentication
//!
//! "Do X": Turn `user[:password]` into a username/password pair.
//!
//! The password comes from, in order:
//! 1. the `:password` suffix of the argument
//! 2. the `GITHUB_PASSWORD` environment variable
//! 3. a masked prompt on the terminal

use anyhow::{bail, Context, Result};
use std::fmt;

/// Environment variable consulted when no password is embedded in the argument.
pub const PASSWORD_ENV: &str = "GITHUB_PASSWORD";

/// Username and password (or personal access token) for basic auth.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Resolve credentials from the positional argument, falling back to the
    /// environment and then an interactive prompt.
    pub fn resolve(arg: &str) -> Result<Self> {
        Self::resolve_with(arg, std::env::var(PASSWORD_ENV).ok(), prompt_password)
    }

    /// Like `resolve`, with the environment value and prompt supplied.
    ///
    /// An empty environment value counts as unset.
    pub fn resolve_with(
        arg: &str,
        env_password: Option<String>,
        prompt: impl FnOnce() -> Result<String>,
    ) -> Result<Self> {
        let (username, password) = split_login(arg)?;
        if let Some(password) = password {
            return Ok(Self::new(username, password));
        }

        if let Some(password) = env_password.filter(|p| !p.is_empty()) {
            log::debug!("Using password from {}", PASSWORD_ENV);
            return Ok(Self::new(username, password));
        }

        let password = prompt()?;
        Ok(Self::new(username, password))
    }
}

/// Split `user[:password]` on the first colon. Both halves are trimmed.
pub fn split_login(arg: &str) -> Result<(String, Option<String>)> {
    let (user, password) = match arg.trim().split_once(':') {
        Some((user, password)) => (user.trim(), Some(password.trim().to_string())),
        None => (arg.trim(), None),
    };

    if user.is_empty() {
        bail!("Username is empty");
    }

    Ok((user.to_string(), password))
}

fn prompt_password() -> Result<String> {
    let term = console::Term::stderr();
    term.write_str("Password:")
        .context("Failed to write password prompt")?;
    term.read_secure_line()
        .context("Failed to read password from terminal")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_with_password() {
        let (user, pw) = split_login("octocat:hunter2").unwrap();
        assert_eq!(user, "octocat");
        assert_eq!(pw.as_deref(), Some("hunter2"));
    }

    #[test]
    fn test_split_without_password() {
        let (user, pw) = split_login("  octocat ").unwrap();
        assert_eq!(user, "octocat");
        assert!(pw.is_none());
    }

    #[test]
    fn test_split_keeps_colons_in_password() {
        let (user, pw) = split_login("octocat : a:b:c ").unwrap();
        assert_eq!(user, "octocat");
        assert_eq!(pw.as_deref(), Some("a:b:c"));
    }

    #[test]
    fn test_split_rejects_empty_user() {
        assert!(split_login(":secret").is_err());
        assert!(split_login("   ").is_err());
    }

    #[test]
    fn test_argument_password_wins() {
        let creds = Credentials::resolve_with("octocat:hunter2", Some("from-env".into()), || {
            panic!("prompt should not run")
        })
        .unwrap();
        assert_eq!(creds.password, "hunter2");
    }

    #[test]
    fn test_env_password_used_without_suffix() {
        let creds = Credentials::resolve_with("octocat", Some("from-env".into()), || {
            panic!("prompt should not run")
        })
        .unwrap();
        assert_eq!(creds.username, "octocat");
        assert_eq!(creds.password, "from-env");
    }

    #[test]
    fn test_empty_env_password_falls_through_to_prompt() {
        let creds =
            Credentials::resolve_with("octocat", Some(String::new()), || Ok("typed".into())).unwrap();
        assert_eq!(creds.password, "typed");
    }

    #[test]
    fn test_prompt_failure_propagates() {
        let result = Credentials::resolve_with("octocat", None, || anyhow::bail!("no terminal"));
        assert!(result.is_err());
    }

    #[test]
    fn test_debug_redacts_password() {
        let creds = Credentials::new("octocat", "hunter2");
        let shown = format!("{:?}", creds);
        assert!(shown.contains("octocat"));
        assert!(!shown.contains("hunter2"));
    }
}
