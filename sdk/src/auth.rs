use tracing::{info, warn};

use crate::{
    api::{LoginRequest, LogsApi},
    error::ClientError,
    store::{KeyValueStore, TokenCache},
    types::{AuthToken, LoginInput},
};

/// Turns login input into a cached token.
///
/// A supplied token is cached as is. Credentials are exchanged with the auth
/// service and the returned token is cached with the `Bearer ` prefix. Any
/// failure leaves no token behind.
pub async fn login<A, S>(
    api: &A,
    tokens: &TokenCache<S>,
    input: LoginInput,
) -> Result<AuthToken, ClientError>
where
    A: LogsApi + ?Sized,
    S: KeyValueStore,
{
    let result = exchange(api, input).await;
    match result {
        Ok(token) => {
            tokens.set(&token)?;
            info!("auth token cached");
            Ok(token)
        }
        Err(error) => {
            warn!(%error, "login failed, clearing cached token");
            if let Err(clear_error) = tokens.clear() {
                warn!(%clear_error, "failed to clear cached token");
            }
            Err(error)
        }
    }
}

async fn exchange<A>(api: &A, input: LoginInput) -> Result<AuthToken, ClientError>
where
    A: LogsApi + ?Sized,
{
    input.validate()?;
    match input {
        LoginInput::Token(token) => Ok(AuthToken::from(token)),
        LoginInput::Credentials { email, password } => {
            let raw = api
                .login(&LoginRequest {
                    email: &email,
                    password: &password,
                })
                .await?;
            Ok(AuthToken::bearer(&raw))
        }
    }
}

pub fn logout<S: KeyValueStore>(tokens: &TokenCache<S>) -> Result<(), ClientError> {
    tokens.clear()?;
    info!("auth token cleared");
    Ok(())
}
