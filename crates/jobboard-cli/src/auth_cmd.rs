//! Auth subcommands: login, logout, status, register.
//!
//! User-facing output uses writeln! to stdout (this is a CLI binary, not debug output).

use std::io::{self, Write};

use jobboard_client::JobBoardClient;
use jobboard_core::Role;
use jobboard_core::models::Registration;

use crate::config::FileCredentialStore;
use crate::fmt::write_session;

/// Roles a new account can be registered with.
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccountRole {
    Seeker,
    Employer,
}

impl From<AccountRole> for Role {
    fn from(role: AccountRole) -> Self {
        match role {
            AccountRole::Seeker => Self::Seeker,
            AccountRole::Employer => Self::Employer,
        }
    }
}

/// Auth subcommand actions.
#[derive(clap::Subcommand, Debug)]
pub enum AuthAction {
    /// Log in to the job board.
    Login {
        /// Account email.
        #[arg(short, long)]
        email: String,
        /// Password.
        #[arg(short, long, env = "JOBBOARD_PASSWORD")]
        password: String,
    },
    /// Forget the stored credential.
    Logout,
    /// Show who is logged in.
    Status,
    /// Create a new account.
    Register {
        /// Display name.
        #[arg(short, long)]
        name: String,
        /// Account email.
        #[arg(short, long)]
        email: String,
        /// Password.
        #[arg(short, long, env = "JOBBOARD_PASSWORD")]
        password: String,
        /// Account role.
        #[arg(short, long, value_enum, default_value = "seeker")]
        role: AccountRole,
    },
}

/// Execute an auth subcommand.
pub async fn run(
    action: AuthAction,
    client: &JobBoardClient,
    store: &FileCredentialStore,
) -> anyhow::Result<()> {
    let mut out = io::stdout();
    match action {
        AuthAction::Login { email, password } => {
            let session = client.login(&email, &password).await?;
            // Remember which server the credential belongs to.
            let base_url = client.config().api.base_url.clone();
            store.update(|c| c.api_url = Some(base_url))?;
            writeln!(out, "Logged in as {} ({})", email, session.role())?;
        }
        AuthAction::Logout => {
            client.logout();
            writeln!(out, "Logged out")?;
        }
        AuthAction::Status => write_session(&mut out, &client.session())?,
        AuthAction::Register {
            name,
            email,
            password,
            role,
        } => {
            let user = client
                .register(&Registration {
                    name,
                    email,
                    password,
                    role: role.into(),
                })
                .await?;
            writeln!(out, "Registered {} as {}", user.email, user.role)?;
            writeln!(out, "Run `jobboard auth login -e {}` to sign in", user.email)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_roles_map_to_session_roles() {
        assert_eq!(Role::from(AccountRole::Seeker), Role::Seeker);
        assert_eq!(Role::from(AccountRole::Employer), Role::Employer);
    }
}
