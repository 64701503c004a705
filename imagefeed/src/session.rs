use std::sync::Arc;

use log::{info, warn};

use crate::api::ApiClient;
use crate::error::{Error, Result};
use crate::feed::PhotoFeedHandle;
use crate::models::{AvatarSize, Profile};
use crate::profile::{ProfileImageService, ProfileService};
use crate::token_store::TokenStore;

/// Everything a signed-in user needs for the lifetime of the app.
pub struct Session<A: ApiClient, T: TokenStore> {
    api: A,
    tokens: T,
    feed: PhotoFeedHandle,
    profile: ProfileService<A>,
    avatar: Arc<ProfileImageService<A>>,
}

impl<A: ApiClient, T: TokenStore> Session<A, T> {
    pub fn new(api: A, tokens: T, feed: PhotoFeedHandle, avatar_size: AvatarSize) -> Self {
        Self {
            profile: ProfileService::new(api.clone()),
            avatar: Arc::new(ProfileImageService::new(api.clone(), avatar_size)),
            api,
            tokens,
            feed,
        }
    }

    pub fn feed(&self) -> &PhotoFeedHandle {
        &self.feed
    }

    pub fn profile(&self) -> &ProfileService<A> {
        &self.profile
    }

    pub fn avatar(&self) -> &ProfileImageService<A> {
        &self.avatar
    }

    pub fn tokens(&self) -> &T {
        &self.tokens
    }

    pub fn is_authenticated(&self) -> Result<bool> {
        Ok(self.tokens.token()?.is_some())
    }

    /// Loads the profile with the stored token, if there is one. The avatar
    /// is fetched in the background afterwards.
    pub async fn restore(&self) -> Result<Option<Profile>> {
        let Some(token) = self.tokens.token()? else {
            info!("no stored token, login required");
            return Ok(None);
        };
        let generation = self.avatar.generation()?;
        let profile = self.profile.fetch_profile(&token).await?;
        if self.avatar.generation()? != generation {
            info!("logged out while the profile of {} was loading", profile.username);
            return Ok(None);
        }

        let avatar = self.avatar.clone();
        let username = profile.username.clone();
        tokio::spawn(async move {
            if let Err(e) = avatar
                .fetch_avatar_url_since(generation, &username, &token)
                .await
            {
                warn!("avatar of {username} not loaded: {e}");
            }
        });
        Ok(Some(profile))
    }

    /// Fetches the avatar of the signed-in user and waits for it.
    pub async fn refresh_avatar(&self) -> Result<String> {
        let token = self.tokens.token()?.ok_or(Error::NotLoggedIn)?;
        let username = self
            .profile
            .profile()?
            .map(|p| p.username)
            .ok_or_else(|| Error::Other("profile is not loaded".to_string()))?;
        self.avatar.fetch_avatar_url(&username, &token).await
    }

    /// Trades an authorization code from the web login for a token, stores
    /// it and loads the profile.
    pub async fn authenticate(&self, code: &str) -> Result<Profile> {
        let token = self.api.exchange_code(code).await.map_err(|e| {
            warn!("authorization code rejected: {e}");
            e
        })?;
        self.tokens.set_token(&token)?;
        info!("logged in");
        self.restore().await?.ok_or(Error::NotLoggedIn)
    }

    /// Forgets the token and everything loaded with it.
    pub async fn logout(&self) -> Result<()> {
        self.tokens.clear_token()?;
        self.profile.clear()?;
        self.avatar.clear()?;
        self.feed.clear().await?;
        info!("logged out");
        Ok(())
    }
}
