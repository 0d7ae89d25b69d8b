//! Session commands.
//!
//! # Usage
//!
//! ```bash
//! CATALOG_PASSWORD=... catalog login -e admin@example.com
//! catalog whoami
//! catalog logout
//! ```

use catalog_admin::catalog::{CatalogApi, Credentials};
use catalog_admin::{AppError, AppState};
use catalog_admin::storage::Storage;
use secrecy::SecretString;

use super::{CliError, prompt, say};

/// Log in and persist the session.
///
/// The password is prompted for when not given. The prompt reads a plain
/// line, so the input is visible.
///
/// # Errors
///
/// Returns an error if the backend rejects the credentials or the session
/// cannot be saved.
pub async fn login<A: CatalogApi, S: Storage>(
    state: &mut AppState<A, S>,
    email: String,
    password: Option<String>,
) -> Result<(), CliError> {
    let password = match password {
        Some(password) => password,
        None => prompt("Password (input is visible): ").await?,
    };
    let credentials = Credentials {
        email,
        password: SecretString::from(password),
    };

    let api = std::sync::Arc::clone(state.api());
    let user = state
        .session_mut()
        .authenticate(api.as_ref(), &credentials)
        .await
        .map_err(AppError::from)?;

    say(format!("Logged in as {}", user.name));
    Ok(())
}

/// End the session. Local state is cleared even if the backend is unreachable.
///
/// # Errors
///
/// Returns an error if the session file cannot be cleared.
pub async fn logout<A: CatalogApi, S: Storage>(state: &mut AppState<A, S>) -> Result<(), CliError> {
    if !state.session().is_authenticated() {
        say("Not logged in");
        return Ok(());
    }
    state.logout().await?;
    say("Logged out");
    Ok(())
}

/// Describe the logged-in user.
///
/// # Errors
///
/// Returns `AppError::NotAuthenticated` if nobody is logged in.
pub fn whoami<A: CatalogApi, S: Storage>(state: &AppState<A, S>) -> Result<(), CliError> {
    say(describe_user(state)?);
    Ok(())
}

fn describe_user<A: CatalogApi, S: Storage>(state: &AppState<A, S>) -> Result<String, CliError> {
    let session = state.session();
    let user = session
        .current_user()
        .ok_or(AppError::NotAuthenticated)?;
    let authorizer = session.authorizer();

    let mut lines = vec![format!("{} (#{})", user.name, user.id)];
    if let Some(email) = &user.email {
        lines.push(format!("Email: {email}"));
    }
    if let Some(roles) = &user.roles {
        let names: Vec<&str> = roles.iter().map(catalog_core::RoleRef::name).collect();
        lines.push(format!("Roles: {}", names.join(", ")));
    }
    let permissions: Vec<String> = authorizer.effective_permissions().into_iter().collect();
    lines.push(if permissions.is_empty() {
        "Permissions: none".to_owned()
    } else {
        format!("Permissions: {}", permissions.join(", "))
    });
    Ok(lines.join("\n"))
}
