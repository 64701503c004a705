use std::sync::Mutex;

use log::{debug, error, info};

use crate::api::{ProfileApi, ProfileImageApi};
use crate::error::{Error, Result};
use crate::message::{AvatarEvent, Subscribers, Subscription, SubscriptionId};
use crate::models::{AvatarSize, Profile};

#[derive(Debug, Default)]
struct ProfileState {
    profile: Option<Profile>,
    generation: u64,
}

/// Holds the profile of the signed-in user.
#[derive(Debug)]
pub struct ProfileService<A: ProfileApi> {
    api: A,
    state: Mutex<ProfileState>,
}

impl<A: ProfileApi> ProfileService<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            state: Mutex::new(ProfileState::default()),
        }
    }

    /// Fetches the profile and replaces the stored one. A profile arriving
    /// after `clear` is returned but not stored.
    pub async fn fetch_profile(&self, token: &str) -> Result<Profile> {
        let generation = self.state.lock()?.generation;
        let profile = self.api.me(token).await.map_err(|e| {
            error!("failed to fetch profile: {e}");
            e
        })?;

        let mut state = self.state.lock()?;
        if state.generation == generation {
            info!("profile of {} loaded", profile.login_name());
            state.profile = Some(profile.clone());
        } else {
            debug!("profile of {} arrived after logout", profile.username);
        }
        Ok(profile)
    }

    pub fn profile(&self) -> Result<Option<Profile>> {
        Ok(self.state.lock()?.profile.clone())
    }

    pub fn clear(&self) -> Result<()> {
        let mut state = self.state.lock()?;
        state.profile = None;
        state.generation = state.generation.wrapping_add(1);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct AvatarState {
    url: Option<String>,
    generation: u64,
    subscribers: Subscribers<AvatarEvent>,
}

/// Resolves and caches the avatar URL of a user.
///
/// Subscribers get an `AvatarEvent::Changed` every time the stored URL
/// changes, and only then.
#[derive(Debug)]
pub struct ProfileImageService<A: ProfileImageApi> {
    api: A,
    size: AvatarSize,
    state: Mutex<AvatarState>,
}

impl<A: ProfileImageApi> ProfileImageService<A> {
    pub fn new(api: A, size: AvatarSize) -> Self {
        Self {
            api,
            size,
            state: Mutex::new(AvatarState::default()),
        }
    }

    pub fn size(&self) -> AvatarSize {
        self.size
    }

    /// Bumped by every `clear`.
    pub fn generation(&self) -> Result<u64> {
        Ok(self.state.lock()?.generation)
    }

    pub async fn fetch_avatar_url(&self, username: &str, token: &str) -> Result<String> {
        let generation = self.generation()?;
        self.fetch_avatar_url_since(generation, username, token)
            .await
    }

    /// Fetches the avatar on behalf of a caller that started at
    /// `generation`. If a `clear` happened since, nothing is requested or
    /// stored and `NotLoggedIn` is returned.
    pub async fn fetch_avatar_url_since(
        &self,
        generation: u64,
        username: &str,
        token: &str,
    ) -> Result<String> {
        if self.generation()? != generation {
            debug!("avatar of {username} not requested, profile was cleared");
            return Err(Error::NotLoggedIn);
        }
        let url = self
            .api
            .profile_image_url(username, self.size, token)
            .await
            .map_err(|e| {
                error!("failed to fetch avatar of {username}: {e}");
                e
            })?;

        let mut state = self.state.lock()?;
        if state.generation != generation {
            debug!("avatar of {username} arrived after logout");
            return Err(Error::NotLoggedIn);
        }
        if state.url.as_deref() != Some(url.as_str()) {
            info!("avatar of {username} changed to {url}");
            state.url = Some(url.clone());
            state
                .subscribers
                .publish(AvatarEvent::Changed { url: url.clone() });
        }
        Ok(url)
    }

    pub fn avatar_url(&self) -> Result<Option<String>> {
        Ok(self.state.lock()?.url.clone())
    }

    pub fn subscribe(&self) -> Result<Subscription<AvatarEvent>> {
        Ok(self.state.lock()?.subscribers.subscribe())
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> Result<bool> {
        Ok(self.state.lock()?.subscribers.unsubscribe(id))
    }

    /// Forgets the URL. Subscribers stay registered.
    pub fn clear(&self) -> Result<()> {
        let mut state = self.state.lock()?;
        state.url = None;
        state.generation = state.generation.wrapping_add(1);
        Ok(())
    }
}
