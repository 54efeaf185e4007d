//! Profile subcommands.

use std::io;
use std::path::PathBuf;

use jobboard_client::JobBoardClient;
use jobboard_core::models::ProfileUpdate;

use crate::fmt::write_profile;
use crate::upload::read_upload;

#[derive(clap::Subcommand, Debug)]
pub enum ProfileAction {
    /// Show your profile.
    Show,
    /// Update profile fields. Only the given fields are sent.
    Update {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        bio: Option<String>,
        /// Comma-separated skills, e.g. "rust,sql".
        #[arg(long, value_delimiter = ',')]
        skills: Option<Vec<String>>,
    },
    /// Upload a new avatar image.
    #[command(after_help = "Accepted types: png, jpg, jpeg, webp (up to 8 MiB).")]
    Avatar { image: PathBuf },
}

pub async fn run(action: ProfileAction, client: &JobBoardClient) -> anyhow::Result<()> {
    let mut out = io::stdout();
    let profile = match action {
        ProfileAction::Show => client.profile().await?,
        ProfileAction::Update { name, bio, skills } => {
            let skills = skills.map(|list| {
                list.into_iter()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            });
            client
                .update_profile(&ProfileUpdate {
                    name,
                    bio,
                    skills,
                    ..ProfileUpdate::default()
                })
                .await?
        }
        ProfileAction::Avatar { image } => {
            let upload = read_upload(&image, "avatar")?;
            client.upload_avatar(upload).await?
        }
    };
    let avatar = client.avatar_url(&profile);
    write_profile(&mut out, &profile, avatar.as_deref())?;
    Ok(())
}
