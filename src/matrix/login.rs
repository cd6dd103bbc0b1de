//! Client creation: fresh login or restore of a saved session.

use anyhow::{Context, anyhow};
use log::{debug, info};
use matrix_sdk::{Client, ruma::OwnedUserId};

use crate::matrix::{UserCredentials, session::SessionStore};

/// Device name shown in the account session list.
const DEVICE_NAME: &str = "chainbot";

async fn build_client(
    user_credentials: &UserCredentials,
    session: &SessionStore,
) -> anyhow::Result<(Client, OwnedUserId)> {
    let user_id: OwnedUserId = user_credentials
        .user_id
        .as_str()
        .try_into()
        .with_context(|| format!("invalid user id {}", user_credentials.user_id))?;

    let client = Client::builder()
        .server_name(user_id.server_name())
        .sqlite_store(session.sqlite_path(), Some(&user_credentials.passphrase))
        .build()
        .await?;

    Ok((client, user_id))
}

async fn create_session(
    user_credentials: &UserCredentials,
    session: &SessionStore,
) -> anyhow::Result<Client> {
    info!("logging in as {}", user_credentials.user_id);

    let (client, user_id) = build_client(user_credentials, session).await?;
    client
        .matrix_auth()
        .login_username(user_id, &user_credentials.password)
        .initial_device_display_name(DEVICE_NAME)
        .send()
        .await?;
    debug!("logged in");

    let user_session = client
        .matrix_auth()
        .session()
        .ok_or_else(|| anyhow!("no session after login"))?;
    session
        .save_user_session(&user_session)
        .await
        .context("failed to save user session")?;

    Ok(client)
}

async fn restore_session(
    user_credentials: &UserCredentials,
    session: &SessionStore,
) -> anyhow::Result<Client> {
    info!("restoring session of {}", user_credentials.user_id);

    let user_session = session
        .user_session()
        .ok_or_else(|| anyhow!("no saved session"))?
        .clone();

    let (client, _) = build_client(user_credentials, session).await?;
    client.restore_session(user_session).await?;

    Ok(client)
}

/// Returns a logged-in client, restoring the saved session when there is one.
pub async fn setup_client(
    user_credentials: &UserCredentials,
    session: &SessionStore,
) -> anyhow::Result<Client> {
    if session.has_session() {
        restore_session(user_credentials, session).await
    } else {
        create_session(user_credentials, session).await
    }
}
