/// The step a front end should show the user next.
///
/// `Idle -> Login -> Options -> Fetching -> {Idle, Login, Options}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Prompt {
    Idle,
    Login,
    Options,
    Fetching,
}

impl Prompt {
    /// Where to go once the user starts a download.
    pub fn on_start(has_token: bool, token_required: bool) -> Self {
        if token_required && !has_token {
            Self::Login
        } else {
            Self::Options
        }
    }

    /// Confirming valid options from the options prompt starts the fetch.
    /// Any other prompt stays where it is.
    pub fn on_confirm(self) -> Self {
        match self {
            Self::Options => Self::Fetching,
            other => other,
        }
    }

    /// A failed login keeps the user at the login prompt.
    pub fn after_login(succeeded: bool) -> Self {
        if succeeded { Self::Options } else { Self::Login }
    }

    /// Only a failed batch that carried a token sends the user back to login.
    pub fn after_batch(succeeded: bool, auth_in_use: bool) -> Self {
        match (succeeded, auth_in_use) {
            (true, _) => Self::Idle,
            (false, true) => Self::Login,
            (false, false) => Self::Options,
        }
    }
}
