use std::sync::Arc;

use log::info;

use crate::{
    api::{DefaultApiClient, Endpoints},
    config::{Config, get_config},
    error::{Error, Result},
    feed::{DEFAULT_COMMAND_BUFFER, create_feed},
    http::ReqwestTransport,
    session::Session,
    token_store::FileTokenStore,
};

pub type DefaultSession = Session<DefaultApiClient, FileTokenStore>;

pub struct SessionBuilder {
    config: Option<Config>,
    command_buffer: usize,
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            command_buffer: DEFAULT_COMMAND_BUFFER,
        }
    }

    /// Uses `config` instead of the process-wide configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    pub fn command_buffer(mut self, buffer: usize) -> Self {
        self.command_buffer = buffer;
        self
    }

    pub fn build(self) -> Result<Arc<DefaultSession>> {
        info!("SessionBuilder: Building session...");
        let config = match self.config {
            Some(config) => config,
            None => get_config().read()?.clone(),
        };
        if config.photos_per_page == 0 {
            return Err(Error::Other("photos_per_page must be positive".to_string()));
        }

        let transport = ReqwestTransport::new(config.request_timeout())?;
        info!("HTTP transport created");

        let api = DefaultApiClient::new(transport, Endpoints::from_config(&config)?);
        info!("ApiClient initialized for {}", config.api_base_url);

        let tokens = FileTokenStore::new(&config.token_path);
        info!("Token store at {}", tokens.path().display());

        let (feed, worker) = create_feed(
            self.command_buffer,
            api.clone(),
            tokens.clone(),
            config.photos_per_page,
        );
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(worker.run());
        } else {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            std::thread::spawn(move || rt.block_on(worker.run()));
        }
        info!("Photo feed initialized and worker spawned");

        let session = Arc::new(Session::new(api, tokens, feed, config.avatar_size));
        info!("Session built successfully.");
        Ok(session)
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}
