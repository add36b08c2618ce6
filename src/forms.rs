//! Field-level form validation. Each form is an explicit struct deserialized
//! from the request body; `validate` returns every field error at once and
//! nothing is persisted while errors remain.

use serde::Deserialize;
use url::Url;

/// Field-scoped validation messages, in field order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FormErrors {
    errors: Vec<(&'static str, String)>,
}

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push((field, message.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn field(&self, field: &str) -> Vec<&str> {
        self.errors
            .iter()
            .filter(|(f, _)| *f == field)
            .map(|(_, m)| m.as_str())
            .collect()
    }

    /// Flattened messages for template rendering.
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(|(_, m)| m.clone()).collect()
    }

    fn into_result(self) -> Result<(), FormErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

pub fn is_valid_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !value.contains(char::is_whitespace)
}

pub fn is_valid_url(value: &str) -> bool {
    match Url::parse(value) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

// -- Auth forms --

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub login_type: Option<String>,
}

impl LoginForm {
    pub fn wants_code(&self) -> bool {
        self.login_type.as_deref() == Some("code")
    }

    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();
        if self.email.trim().is_empty() {
            errors.add("email", "Email is required");
        } else if !is_valid_email(self.email.trim()) {
            errors.add("email", "Invalid email address");
        }
        if !self.wants_code() && self.password.as_deref().unwrap_or("").is_empty() {
            errors.add("password", "Password is required");
        }
        errors.into_result()
    }
}

#[derive(Debug, Deserialize)]
pub struct VerifyForm {
    #[serde(default)]
    pub code: String,
}

impl VerifyForm {
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();
        if self.code.trim().is_empty() {
            errors.add("code", "Verification code is required");
        }
        errors.into_result()
    }
}

#[derive(Debug, Deserialize)]
pub struct RegistrationForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub referral_code: Option<String>,
    /// Checkbox: present when accepted.
    #[serde(default)]
    pub terms: Option<String>,
}

impl RegistrationForm {
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();

        let username = self.username.trim();
        if username.is_empty() {
            errors.add("username", "Username is required");
        } else if username.len() < 3 {
            errors.add("username", "Username must be at least 3 characters long");
        } else if username.len() > 64 {
            errors.add("username", "Username must be at most 64 characters long");
        }

        let email = self.email.trim();
        if email.is_empty() {
            errors.add("email", "Email is required");
        } else if email.len() > 120 || !is_valid_email(email) {
            errors.add("email", "Invalid email address");
        }

        if self.password.is_empty() {
            errors.add("password", "Password is required");
        } else if self.password.len() < 8 {
            errors.add("password", "Password must be at least 8 characters long");
        }

        if self.terms.is_none() {
            errors.add("terms", "You must accept the terms");
        }

        errors.into_result()
    }
}

// -- Social forms --

#[derive(Debug, Deserialize)]
pub struct ChannelForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub channel_type: String,
    #[serde(default)]
    pub visibility: String,
    #[serde(default)]
    pub dag_id: Option<String>,
}

impl ChannelForm {
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();

        let name = self.name.trim();
        if name.is_empty() {
            errors.add("name", "Channel name is required");
        } else if name.len() < 3 || name.len() > 100 {
            errors.add("name", "Channel name must be between 3 and 100 characters");
        }

        if self.description.trim().is_empty() {
            errors.add("description", "Description is required");
        }

        if !matches!(self.channel_type.as_str(), "ecosystem" | "dag" | "personal") {
            errors.add("channel_type", "Invalid channel type");
        }

        if !matches!(
            self.visibility.as_str(),
            "public_world" | "public_da" | "private_dag"
        ) {
            errors.add("visibility", "Invalid visibility");
        }

        // Cross-field: DAG channels and DAG-private visibility need a DAG
        let has_dag = self.dag_id.as_deref().is_some_and(|d| !d.is_empty());
        if (self.channel_type == "dag" || self.visibility == "private_dag") && !has_dag {
            errors.add("dag_id", "A DAG is required for this channel");
        }

        errors.into_result()
    }
}

#[derive(Debug, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub post_type: String,
    #[serde(default)]
    pub external_url: Option<String>,
}

impl PostForm {
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();

        if let Some(title) = &self.title {
            if title.len() > 200 {
                errors.add("title", "Title must be at most 200 characters");
            }
        }

        if self.content.trim().is_empty() {
            errors.add("content", "Content is required");
        }

        if !matches!(
            self.post_type.as_str(),
            "text" | "image" | "video" | "article" | "link" | "poll"
        ) {
            errors.add("post_type", "Invalid post type");
        }

        // Cross-field: link posts carry a valid external URL
        if self.post_type == "link" {
            match self.external_url.as_deref() {
                Some(url) if is_valid_url(url) => {}
                _ => errors.add("external_url", "A valid URL is required for link posts"),
            }
        } else if let Some(url) = self.external_url.as_deref() {
            if !url.is_empty() && !is_valid_url(url) {
                errors.add("external_url", "Invalid URL");
            }
        }

        errors.into_result()
    }
}

#[derive(Debug, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub parent_id: Option<String>,
}

impl CommentForm {
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();
        if self.content.trim().is_empty() {
            errors.add("content", "Comment is required");
        } else if self.content.len() > 1000 {
            errors.add("content", "Comment must be at most 1000 characters");
        }
        errors.into_result()
    }
}

#[derive(Debug, Deserialize)]
pub struct DagForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub dag_type: String,
}

impl DagForm {
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();

        let name = self.name.trim();
        if name.is_empty() {
            errors.add("name", "Name is required");
        } else if name.len() < 3 || name.len() > 100 {
            errors.add("name", "Name must be between 3 and 100 characters");
        }

        if self.description.trim().is_empty() {
            errors.add("description", "Description is required");
        }

        if !matches!(
            self.dag_type.as_str(),
            "research" | "development" | "community"
        ) {
            errors.add("dag_type", "Invalid DAG type");
        }

        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("user.name@sub.example.org"));
        assert!(!is_valid_email("a@x"));
        assert!(!is_valid_email("@x.com"));
        assert!(!is_valid_email("a@"));
        assert!(!is_valid_email("a b@x.com"));
        assert!(!is_valid_email("plainaddress"));
    }

    #[test]
    fn url_validation() {
        assert!(is_valid_url("https://example.com/page"));
        assert!(is_valid_url("http://example.com"));
        assert!(!is_valid_url("ftp://example.com"));
        assert!(!is_valid_url("not a url"));
        assert!(!is_valid_url("javascript:alert(1)"));
    }

    #[test]
    fn registration_collects_all_field_errors() {
        let form = RegistrationForm {
            username: "ab".into(),
            email: "bad".into(),
            password: "short".into(),
            referral_code: None,
            terms: None,
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(
            errors.field("username"),
            vec!["Username must be at least 3 characters long"]
        );
        assert_eq!(errors.field("email"), vec!["Invalid email address"]);
        assert_eq!(
            errors.field("password"),
            vec!["Password must be at least 8 characters long"]
        );
        assert_eq!(errors.field("terms"), vec!["You must accept the terms"]);
    }

    #[test]
    fn registration_accepts_valid_input() {
        let form = RegistrationForm {
            username: "alice".into(),
            email: "alice@example.com".into(),
            password: "correct horse".into(),
            referral_code: None,
            terms: Some("on".into()),
        };
        assert!(form.validate().is_ok());
    }

    #[test]
    fn login_password_mode_requires_password() {
        let form = LoginForm {
            email: "a@x.com".into(),
            password: None,
            login_type: Some("password".into()),
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.field("password"), vec!["Password is required"]);
    }

    #[test]
    fn login_code_mode_needs_no_password() {
        let form = LoginForm {
            email: "a@x.com".into(),
            password: None,
            login_type: Some("code".into()),
        };
        assert!(form.validate().is_ok());
    }

    #[test]
    fn channel_form_requires_dag_for_private_visibility() {
        let form = ChannelForm {
            name: "General".into(),
            description: "Community talk".into(),
            channel_type: "personal".into(),
            visibility: "private_dag".into(),
            dag_id: None,
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(
            errors.field("dag_id"),
            vec!["A DAG is required for this channel"]
        );
    }

    #[test]
    fn link_post_requires_valid_url() {
        let form = PostForm {
            title: None,
            content: "check this out".into(),
            post_type: "link".into(),
            external_url: Some("nope".into()),
        };
        let errors = form.validate().unwrap_err();
        assert!(!errors.field("external_url").is_empty());
    }

    #[test]
    fn poll_post_without_url_is_valid() {
        let form = PostForm {
            title: Some("Favorite color?".into()),
            content: "vote below".into(),
            post_type: "poll".into(),
            external_url: None,
        };
        assert!(form.validate().is_ok());
    }
}
