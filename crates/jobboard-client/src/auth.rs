//! Sign-in, sign-out, registration and the signed-in user's profile.

use jobboard_core::access::Action;
use jobboard_core::models::{
    FileUpload, LoginResponse, ProfileUpdate, Registration, UserProfile, UserSummary,
    join_asset_url,
};
use jobboard_core::{Role, SessionState};
use tracing::{info, instrument, warn};

use crate::client::JobBoardClient;
use crate::error::ApiError;
use crate::transport::ApiRequest;

/// Image types the server accepts for avatars.
pub const AVATAR_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// Largest avatar the server accepts, in bytes.
pub const MAX_AVATAR_BYTES: usize = 8 * 1024 * 1024;

fn check_avatar(image: &FileUpload) -> Result<(), ApiError> {
    let extension = image
        .filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());
    if !extension.is_some_and(|ext| AVATAR_EXTENSIONS.contains(&ext.as_str())) {
        return Err(ApiError::InvalidInput(format!(
            "avatar must be one of: {}",
            AVATAR_EXTENSIONS.join(", ")
        )));
    }
    if image.bytes.is_empty() {
        return Err(ApiError::InvalidInput("avatar file is empty".into()));
    }
    if image.bytes.len() > MAX_AVATAR_BYTES {
        return Err(ApiError::InvalidInput("avatar is larger than 8 MiB".into()));
    }
    Ok(())
}

impl JobBoardClient {
    /// Exchange email and password for a credential and store it.
    ///
    /// User-scoped caches are dropped so nothing from a previous account
    /// leaks into the new session.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionState, ApiError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(ApiError::InvalidInput("email and password are required".into()));
        }
        let request = ApiRequest::post("/auth/login")
            .form(&[("username", email.trim()), ("password", password)]);
        let response: LoginResponse = self.call(request).await?;

        let session = SessionState::derive(Some(&response.access_token));
        if !session.is_authenticated() {
            warn!("Server issued a credential that does not decode");
            return Err(ApiError::Unauthenticated);
        }
        self.caches.clear_user_scoped();
        self.saves.reset();
        self.credentials().store(&response.access_token);
        info!(role = %session.role(), "Signed in");
        Ok(session)
    }

    /// Discard the credential and everything cached for the user.
    pub fn logout(&self) {
        self.credentials().clear();
        self.caches.clear_user_scoped();
        self.saves.reset();
        info!("Signed out");
    }

    /// Create an account. Does not sign in.
    #[instrument(skip(self, registration), fields(email = %registration.email, role = %registration.role))]
    pub async fn register(&self, registration: &Registration) -> Result<UserSummary, ApiError> {
        if registration.role == Role::Anonymous {
            return Err(ApiError::InvalidInput("choose seeker or employer".into()));
        }
        if registration.name.trim().is_empty() || !registration.email.contains('@') {
            return Err(ApiError::InvalidInput("a name and a valid email are required".into()));
        }
        if registration.password.is_empty() {
            return Err(ApiError::InvalidInput("password is required".into()));
        }
        let body = serde_json::to_value(registration)
            .map_err(|e| ApiError::InvalidInput(e.to_string()))?;
        let user: UserSummary = self
            .call(ApiRequest::post("/users/register").json(body))
            .await?;
        info!(user_id = user.id, "Account registered");
        Ok(user)
    }

    /// Profile of the signed-in user.
    #[instrument(skip(self))]
    pub async fn profile(&self) -> Result<UserProfile, ApiError> {
        let session = self.authorize(Action::ViewProfile)?;
        self.caches
            .profile
            .read(|| async {
                let request = Self::with_credential(&session, ApiRequest::get("/users/profile/me"))?;
                self.call(request).await
            })
            .await
    }

    /// Update profile fields and return the server's copy.
    #[instrument(skip(self, update))]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile, ApiError> {
        let session = self.authorize(Action::ViewProfile)?;
        if matches!(&update.name, Some(n) if n.trim().is_empty()) {
            return Err(ApiError::InvalidInput("name cannot be blank".into()));
        }
        let body =
            serde_json::to_value(update).map_err(|e| ApiError::InvalidInput(e.to_string()))?;
        let request = Self::with_credential(&session, ApiRequest::put("/users/me/update").json(body))?;
        let profile: UserProfile = self.call(request).await?;

        self.caches.profile.set_confirmed(profile.clone());
        info!("Profile updated");
        Ok(profile)
    }

    /// Replace the signed-in user's avatar and return the updated profile.
    #[instrument(skip(self, image), fields(filename = %image.filename, len = image.bytes.len()))]
    pub async fn upload_avatar(&self, image: FileUpload) -> Result<UserProfile, ApiError> {
        let session = self.authorize(Action::ViewProfile)?;
        check_avatar(&image)?;
        let request =
            Self::with_credential(&session, ApiRequest::post("/users/me/avatar").file("avatar", image))?;
        let profile: UserProfile = self.call(request).await?;

        self.caches.profile.set_confirmed(profile.clone());
        info!("Avatar uploaded");
        Ok(profile)
    }

    /// Absolute link to a profile's avatar, if one was uploaded.
    pub fn avatar_url(&self, profile: &UserProfile) -> Option<String> {
        profile
            .avatar_url
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(|path| join_asset_url(self.config().api.asset_base(), path))
    }
}
