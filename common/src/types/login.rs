use secrecy::{ExposeSecret, SecretString};

use super::ValidationError;

/// What a user hands over to get an auth token: either a token they already
/// have, or credentials to exchange for one.
#[derive(Debug)]
pub enum LoginInput {
    Token(SecretString),
    Credentials { email: String, password: SecretString },
}

impl LoginInput {
    /// Builds the input from the optional fields of a login prompt.
    ///
    /// A token excludes email and password, and giving both is an error.
    /// Without a token, both email and password are required.
    pub fn from_fields(
        token: Option<String>,
        email: Option<String>,
        password: Option<String>,
    ) -> Result<Self, ValidationError> {
        let token = token.filter(|t| !t.trim().is_empty());
        let email = email.filter(|e| !e.trim().is_empty());
        let password = password.filter(|p| !p.is_empty());

        let input = match (token, email, password) {
            (Some(token), None, None) => Self::Token(SecretString::from(token.trim().to_owned())),
            (Some(_), _, _) => {
                return Err("Provide either a token or an email and password, not both".into());
            }
            (None, Some(email), Some(password)) => Self::Credentials {
                email: email.trim().to_owned(),
                password: SecretString::from(password),
            },
            (None, None, _) => return Err("Please input your token or e-mail".into()),
            (None, Some(_), None) => return Err("Please input your password".into()),
        };
        input.validate()?;
        Ok(input)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Token(token) => {
                if token.expose_secret().trim().is_empty() {
                    return Err("Please input your token".into());
                }
            }
            Self::Credentials { email, password } => {
                validate_email(email)?;
                if password.expose_secret().is_empty() {
                    return Err("Please input your password".into());
                }
            }
        }
        Ok(())
    }
}

fn validate_email(email: &str) -> Result<(), ValidationError> {
    let invalid = || ValidationError(format!("The input is not a valid e-mail: '{email}'"));

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|label| label.is_empty()) {
        return Err(invalid());
    }
    Ok(())
}
