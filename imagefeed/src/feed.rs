//! The photo feed actor.
//!
//! `FeedWorker` owns the `FeedState` and the subscriber list and is the only
//! place either is mutated. `PhotoFeedHandle`s talk to it over a command
//! channel. Network calls run in their own tasks and post their results back
//! to the worker, so the worker keeps answering snapshots and subscriptions
//! while a page is being downloaded.

pub mod state;

use log::{debug, error, info, warn};
use tokio::sync::{mpsc, oneshot};

use crate::api::ApiClient;
use crate::error::{Error, Result};
use crate::message::{FeedEvent, Subscribers, Subscription, SubscriptionId};
use crate::models::Photo;
use crate::token_store::TokenStore;

pub use state::{FeedChange, FeedSnapshot, FeedState, LikeApplied, PageApplied, PageTicket};

pub const DEFAULT_COMMAND_BUFFER: usize = 32;

/// What became of a `fetch_next_page` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The page was merged. `change` may be empty if the page was.
    Appended(FeedChange),
    /// Another fetch was running; nothing was requested.
    AlreadyInFlight,
    /// The feed was cleared while the page was loading; it was dropped.
    Discarded,
}

enum Command {
    FetchNextPage {
        reply: oneshot::Sender<Result<FetchOutcome>>,
    },
    ToggleLike {
        photo_id: String,
        currently_liked: bool,
        reply: oneshot::Sender<Result<bool>>,
    },
    Clear {
        reply: oneshot::Sender<()>,
    },
    Snapshot {
        reply: oneshot::Sender<FeedSnapshot>,
    },
    Subscribe {
        reply: oneshot::Sender<Subscription<FeedEvent>>,
    },
    Unsubscribe {
        id: SubscriptionId,
    },
}

enum Completion {
    Page {
        ticket: PageTicket,
        result: Result<Vec<Photo>>,
        reply: oneshot::Sender<Result<FetchOutcome>>,
    },
    Like {
        generation: u64,
        photo_id: String,
        result: Result<bool>,
        reply: oneshot::Sender<Result<bool>>,
    },
}

#[derive(Debug, Clone)]
pub struct PhotoFeedHandle {
    sender: mpsc::Sender<Command>,
}

#[must_use = "The worker must be spawned to serve the feed"]
pub struct FeedWorker<A: ApiClient, T: TokenStore> {
    receiver: mpsc::Receiver<Command>,
    completion_sender: mpsc::UnboundedSender<Completion>,
    completions: mpsc::UnboundedReceiver<Completion>,
    api: A,
    tokens: T,
    state: FeedState,
    subscribers: Subscribers<FeedEvent>,
}

/// Creates a feed handle and the worker serving it.
///
/// The worker must be spawned; it stops once every handle is dropped.
pub fn create_feed<A: ApiClient, T: TokenStore>(
    buffer: usize,
    api: A,
    tokens: T,
    per_page: u32,
) -> (PhotoFeedHandle, FeedWorker<A, T>) {
    let (sender, receiver) = mpsc::channel(buffer);
    let (completion_sender, completions) = mpsc::unbounded_channel();
    let handle = PhotoFeedHandle { sender };
    let worker = FeedWorker {
        receiver,
        completion_sender,
        completions,
        api,
        tokens,
        state: FeedState::new(per_page),
        subscribers: Subscribers::new(),
    };
    (handle, worker)
}

impl PhotoFeedHandle {
    /// Loads the page after the last loaded one and appends it.
    ///
    /// Returns `AlreadyInFlight` without touching the network if a fetch is
    /// still running.
    pub async fn fetch_next_page(&self) -> Result<FetchOutcome> {
        let (reply, rx) = oneshot::channel();
        self.sender.send(Command::FetchNextPage { reply }).await?;
        rx.await?
    }

    /// Likes the photo if `currently_liked` is false, unlikes it otherwise.
    /// Returns the flag reported by the server.
    pub async fn toggle_like(&self, photo_id: &str, currently_liked: bool) -> Result<bool> {
        let (reply, rx) = oneshot::channel();
        self.sender
            .send(Command::ToggleLike {
                photo_id: photo_id.to_string(),
                currently_liked,
                reply,
            })
            .await?;
        rx.await?
    }

    /// Empties the feed and rewinds pagination to the first page. Requests
    /// still in flight are ignored when they come back.
    pub async fn clear(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.sender.send(Command::Clear { reply }).await?;
        Ok(rx.await?)
    }

    pub async fn snapshot(&self) -> Result<FeedSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.sender.send(Command::Snapshot { reply }).await?;
        Ok(rx.await?)
    }

    pub async fn subscribe(&self) -> Result<Subscription<FeedEvent>> {
        let (reply, rx) = oneshot::channel();
        self.sender.send(Command::Subscribe { reply }).await?;
        Ok(rx.await?)
    }

    pub async fn unsubscribe(&self, id: SubscriptionId) -> Result<()> {
        Ok(self.sender.send(Command::Unsubscribe { id }).await?)
    }
}

/// Reads the bearer token on the blocking pool; stores may touch the disk.
async fn read_token<T: TokenStore>(tokens: T) -> Result<String> {
    let token = tokio::task::spawn_blocking(move || tokens.token()).await??;
    token.ok_or_else(|| {
        warn!("no bearer token stored");
        Error::NotLoggedIn
    })
}

fn respond<R>(reply: oneshot::Sender<R>, value: R) {
    if reply.send(value).is_err() {
        debug!("requester went away before the reply");
    }
}

impl<A: ApiClient, T: TokenStore> FeedWorker<A, T> {
    /// Runs the command loop until every handle is dropped.
    pub async fn run(mut self) {
        info!("Photo feed actor started.");
        loop {
            tokio::select! {
                command = self.receiver.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(completion) = self.completions.recv() => self.handle_completion(completion),
            }
        }
        info!("Photo feed actor finished.");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::FetchNextPage { reply } => self.start_fetch(reply),
            Command::ToggleLike {
                photo_id,
                currently_liked,
                reply,
            } => self.start_toggle_like(photo_id, currently_liked, reply),
            Command::Clear { reply } => {
                self.state.clear();
                info!("feed cleared, generation {}", self.state.generation());
                self.subscribers.publish(FeedEvent::Reset);
                respond(reply, ());
            }
            Command::Snapshot { reply } => respond(reply, self.state.snapshot()),
            Command::Subscribe { reply } => respond(reply, self.subscribers.subscribe()),
            Command::Unsubscribe { id } => {
                if !self.subscribers.unsubscribe(id) {
                    debug!("subscriber {id:?} was not registered");
                }
            }
        }
    }

    fn start_fetch(&mut self, reply: oneshot::Sender<Result<FetchOutcome>>) {
        let Some(ticket) = self.state.begin_fetch() else {
            debug!("a page fetch is already in flight");
            return respond(reply, Ok(FetchOutcome::AlreadyInFlight));
        };

        let api = self.api.clone();
        let tokens = self.tokens.clone();
        let per_page = self.state.per_page();
        let completions = self.completion_sender.clone();
        debug!("fetching page {} with {per_page} photos", ticket.page);
        tokio::spawn(async move {
            let result = match read_token(tokens).await {
                Ok(token) => api.photos(ticket.page, per_page, &token).await,
                Err(e) => Err(e),
            };
            if completions
                .send(Completion::Page {
                    ticket,
                    result,
                    reply,
                })
                .is_err()
            {
                error!("feed actor is gone, page {} dropped", ticket.page);
            }
        });
    }

    fn start_toggle_like(
        &mut self,
        photo_id: String,
        currently_liked: bool,
        reply: oneshot::Sender<Result<bool>>,
    ) {
        let api = self.api.clone();
        let tokens = self.tokens.clone();
        let generation = self.state.generation();
        let completions = self.completion_sender.clone();
        tokio::spawn(async move {
            let result = match read_token(tokens).await {
                Ok(token) if currently_liked => api.unlike(&photo_id, &token).await,
                Ok(token) => api.like(&photo_id, &token).await,
                Err(e) => Err(e),
            };
            if completions
                .send(Completion::Like {
                    generation,
                    photo_id,
                    result,
                    reply,
                })
                .is_err()
            {
                error!("feed actor is gone, like result dropped");
            }
        });
    }

    fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Page {
                ticket,
                result,
                reply,
            } => {
                let outcome = self.finish_fetch(ticket, result);
                respond(reply, outcome);
            }
            Completion::Like {
                generation,
                photo_id,
                result,
                reply,
            } => {
                let outcome = result.map(|liked| {
                    match self.state.apply_like(generation, &photo_id, liked) {
                        LikeApplied::Updated => debug!("photo {photo_id} liked: {liked}"),
                        LikeApplied::Unchanged => {}
                        LikeApplied::NotFound => {
                            debug!("photo {photo_id} is not in the feed")
                        }
                        LikeApplied::Stale => {
                            debug!("like of {photo_id} belongs to a cleared feed")
                        }
                    }
                    liked
                });
                if let Err(e) = &outcome {
                    error!("failed to change like of {photo_id}: {e}");
                }
                respond(reply, outcome);
            }
        }
    }

    fn finish_fetch(
        &mut self,
        ticket: PageTicket,
        result: Result<Vec<Photo>>,
    ) -> Result<FetchOutcome> {
        let photos = match result {
            Ok(photos) => photos,
            Err(e) => {
                if !self.state.fail_fetch(ticket) {
                    debug!("failed page {} belongs to a cleared feed", ticket.page);
                    return Ok(FetchOutcome::Discarded);
                }
                error!("failed to fetch page {}: {e}", ticket.page);
                return Err(e);
            }
        };

        match self.state.complete_fetch(ticket, photos) {
            PageApplied::Appended { change, skipped } => {
                info!(
                    "page {} loaded, feed grew from {} to {} photos, {skipped} duplicates skipped",
                    ticket.page, change.old_count, change.new_count
                );
                if !change.is_empty() {
                    self.subscribers.publish(change.into());
                }
                Ok(FetchOutcome::Appended(change))
            }
            PageApplied::Stale => {
                info!("page {} arrived after the feed was cleared", ticket.page);
                Ok(FetchOutcome::Discarded)
            }
        }
    }
}

#[cfg(test)]
mod local_tests {
    use serde_json::Value;

    use super::*;
    use crate::error::NetworkError;
    use crate::http::HttpMethod;
    use crate::mock::{MockTransport, like_json, mock_api, page_json, photo_json};
    use crate::token_store::MemoryTokenStore;

    fn start_feed() -> (MockTransport, PhotoFeedHandle) {
        let (transport, api) = mock_api();
        let (handle, worker) =
            create_feed(8, api, MemoryTokenStore::with_token("token"), 10);
        tokio::spawn(worker.run());
        (transport, handle)
    }

    fn ids(snapshot: &FeedSnapshot) -> Vec<String> {
        snapshot.photos().iter().map(|p| p.id.clone()).collect()
    }

    fn change(old_count: usize, new_count: usize) -> FetchOutcome {
        FetchOutcome::Appended(FeedChange {
            old_count,
            new_count,
        })
    }

    async fn wait_for_requests(transport: &MockTransport, count: usize) {
        while transport.requests().len() < count {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_two_pages_are_loaded_in_order() {
        let (transport, feed) = start_feed();
        transport.push_response(HttpMethod::Get, "/photos", page_json(1..=10));
        transport.push_response(HttpMethod::Get, "/photos", page_json(11..=20));
        let mut events = feed.subscribe().await.unwrap();

        assert_eq!(feed.fetch_next_page().await.unwrap(), change(0, 10));
        assert_eq!(feed.fetch_next_page().await.unwrap(), change(10, 20));

        let snapshot = feed.snapshot().await.unwrap();
        let expected: Vec<String> = (1..=20).map(|n| format!("P{n}")).collect();
        assert_eq!(ids(&snapshot), expected);
        assert_eq!(snapshot.last_loaded_page(), 2);

        assert_eq!(
            events.try_recv(),
            Some(FeedEvent::Changed {
                old_count: 0,
                new_count: 10
            })
        );
        assert_eq!(
            events.try_recv(),
            Some(FeedEvent::Changed {
                old_count: 10,
                new_count: 20
            })
        );
        assert_eq!(events.try_recv(), None);

        let requests = transport.requests();
        assert_eq!(requests[0].url.query(), Some("page=1&per_page=10"));
        assert_eq!(requests[1].url.query(), Some("page=2&per_page=10"));
        assert!(
            requests
                .iter()
                .all(|r| r.bearer_token.as_deref() == Some("token"))
        );
    }

    #[tokio::test]
    async fn test_concurrent_fetch_is_coalesced() {
        let (transport, feed) = start_feed();
        transport.push_response(HttpMethod::Get, "/photos", page_json(1..=10));
        let gate = transport.hold();

        let first = tokio::spawn({
            let feed = feed.clone();
            async move { feed.fetch_next_page().await }
        });
        wait_for_requests(&transport, 1).await;

        assert_eq!(
            feed.fetch_next_page().await.unwrap(),
            FetchOutcome::AlreadyInFlight
        );
        // still serving while the page is loading
        assert!(feed.snapshot().await.unwrap().is_empty());

        gate.add_permits(1);
        assert_eq!(first.await.unwrap().unwrap(), change(0, 10));
        assert_eq!(transport.requests().len(), 1);
        assert_eq!(feed.snapshot().await.unwrap().last_loaded_page(), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_can_be_retried() {
        let (transport, feed) = start_feed();
        transport.push_error(HttpMethod::Get, "/photos", NetworkError::HttpStatus(500));
        transport.push_response(HttpMethod::Get, "/photos", page_json(1..=10));
        let mut events = feed.subscribe().await.unwrap();

        let err = feed.fetch_next_page().await.unwrap_err();
        assert_eq!(err.network(), Some(&NetworkError::HttpStatus(500)));
        let snapshot = feed.snapshot().await.unwrap();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.last_loaded_page(), 0);
        assert_eq!(events.try_recv(), None);

        assert_eq!(feed.fetch_next_page().await.unwrap(), change(0, 10));
        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].url.query(), Some("page=1&per_page=10"));
    }

    #[tokio::test]
    async fn test_like_updates_photo_without_event() {
        let (transport, feed) = start_feed();
        transport.push_response(HttpMethod::Get, "/photos", page_json(1..=10));
        transport.push_response(HttpMethod::Post, "/photos/P3/like", like_json("P3", true));
        feed.fetch_next_page().await.unwrap();
        let mut events = feed.subscribe().await.unwrap();

        assert!(feed.toggle_like("P3", false).await.unwrap());

        let snapshot = feed.snapshot().await.unwrap();
        assert!(snapshot.find("P3").unwrap().is_liked);
        assert_eq!(snapshot.photos().iter().filter(|p| p.is_liked).count(), 1);
        assert_eq!(snapshot.len(), 10);
        assert_eq!(events.try_recv(), None);
        assert_eq!(
            transport
                .requests_to(HttpMethod::Post, "/photos/P3/like")
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_unlike_sends_delete() {
        let (transport, feed) = start_feed();
        let page = Value::Array(vec![photo_json("P1", true), photo_json("P2", false)]);
        transport.push_response(HttpMethod::Get, "/photos", page);
        transport.push_response(HttpMethod::Delete, "/photos/P1/like", like_json("P1", false));
        feed.fetch_next_page().await.unwrap();

        assert!(!feed.toggle_like("P1", true).await.unwrap());

        let snapshot = feed.snapshot().await.unwrap();
        assert!(!snapshot.find("P1").unwrap().is_liked);
        assert!(
            transport
                .requests_to(HttpMethod::Post, "/photos/P1/like")
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_failed_like_leaves_photo_unchanged() {
        let (transport, feed) = start_feed();
        transport.push_response(HttpMethod::Get, "/photos", page_json(1..=10));
        transport.push_error(
            HttpMethod::Post,
            "/photos/P3/like",
            NetworkError::Transport("connection reset".into()),
        );
        feed.fetch_next_page().await.unwrap();

        assert!(feed.toggle_like("P3", false).await.is_err());
        assert!(!feed.snapshot().await.unwrap().find("P3").unwrap().is_liked);
    }

    #[tokio::test]
    async fn test_like_completes_while_page_is_in_flight() {
        let (transport, feed) = start_feed();
        transport.push_response(HttpMethod::Get, "/photos", page_json(1..=10));
        transport.push_response(HttpMethod::Get, "/photos", page_json(11..=20));
        transport.push_response(HttpMethod::Post, "/photos/P3/like", like_json("P3", true));
        feed.fetch_next_page().await.unwrap();
        let gate = transport.hold_route(HttpMethod::Get, "/photos");

        let page = tokio::spawn({
            let feed = feed.clone();
            async move { feed.fetch_next_page().await }
        });
        wait_for_requests(&transport, 2).await;

        assert!(feed.toggle_like("P3", false).await.unwrap());
        assert!(!page.is_finished());
        let snapshot = feed.snapshot().await.unwrap();
        assert!(snapshot.find("P3").unwrap().is_liked);
        assert_eq!(snapshot.len(), 10);

        gate.add_permits(1);
        assert_eq!(page.await.unwrap().unwrap(), change(10, 20));
        let snapshot = feed.snapshot().await.unwrap();
        assert!(snapshot.find("P3").unwrap().is_liked);
        assert_eq!(snapshot.last_loaded_page(), 2);
    }

    #[tokio::test]
    async fn test_token_is_read_for_every_request() {
        let (transport, api) = mock_api();
        let tokens = MemoryTokenStore::with_token("first");
        let (feed, worker) = create_feed(8, api, tokens.clone(), 10);
        tokio::spawn(worker.run());
        transport.push_response(HttpMethod::Get, "/photos", page_json(1..=10));
        transport.push_response(HttpMethod::Get, "/photos", page_json(11..=20));

        feed.fetch_next_page().await.unwrap();
        tokens.set_token("second").unwrap();
        feed.fetch_next_page().await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].bearer_token.as_deref(), Some("first"));
        assert_eq!(requests[1].bearer_token.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn test_clear_resets_pagination() {
        let (transport, feed) = start_feed();
        transport.push_response(HttpMethod::Get, "/photos", page_json(1..=10));
        transport.push_response(HttpMethod::Get, "/photos", page_json(1..=10));
        feed.fetch_next_page().await.unwrap();
        let mut events = feed.subscribe().await.unwrap();

        feed.clear().await.unwrap();
        assert_eq!(events.try_recv(), Some(FeedEvent::Reset));
        let snapshot = feed.snapshot().await.unwrap();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.last_loaded_page(), 0);

        assert_eq!(feed.fetch_next_page().await.unwrap(), change(0, 10));
        assert_eq!(transport.requests()[1].url.query(), Some("page=1&per_page=10"));
    }

    #[tokio::test]
    async fn test_page_arriving_after_clear_is_discarded() {
        let (transport, feed) = start_feed();
        transport.push_response(HttpMethod::Get, "/photos", page_json(1..=10));
        let gate = transport.hold();

        let stale = tokio::spawn({
            let feed = feed.clone();
            async move { feed.fetch_next_page().await }
        });
        wait_for_requests(&transport, 1).await;
        feed.clear().await.unwrap();
        gate.add_permits(1);

        assert_eq!(stale.await.unwrap().unwrap(), FetchOutcome::Discarded);
        assert!(feed.snapshot().await.unwrap().is_empty());

        transport.push_response(HttpMethod::Get, "/photos", page_json(21..=30));
        gate.add_permits(1);
        assert_eq!(feed.fetch_next_page().await.unwrap(), change(0, 10));
        let snapshot = feed.snapshot().await.unwrap();
        assert_eq!(snapshot.get(0).unwrap().id, "P21");
        assert_eq!(snapshot.last_loaded_page(), 1);
    }

    #[tokio::test]
    async fn test_fetch_without_token_is_rejected() {
        let (transport, api) = mock_api();
        let (feed, worker) = create_feed(8, api, MemoryTokenStore::new(), 10);
        tokio::spawn(worker.run());

        assert!(matches!(
            feed.fetch_next_page().await,
            Err(Error::NotLoggedIn)
        ));
        assert!(matches!(
            feed.toggle_like("P1", false).await,
            Err(Error::NotLoggedIn)
        ));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_photos_are_skipped() {
        let (transport, feed) = start_feed();
        transport.push_response(HttpMethod::Get, "/photos", page_json(1..=10));
        transport.push_response(HttpMethod::Get, "/photos", page_json(9..=18));

        feed.fetch_next_page().await.unwrap();
        assert_eq!(feed.fetch_next_page().await.unwrap(), change(10, 18));

        let snapshot = feed.snapshot().await.unwrap();
        let expected: Vec<String> = (1..=18).map(|n| format!("P{n}")).collect();
        assert_eq!(ids(&snapshot), expected);
        assert_eq!(snapshot.last_loaded_page(), 2);
    }

    #[tokio::test]
    async fn test_empty_page_advances_without_event() {
        let (transport, feed) = start_feed();
        transport.push_response(HttpMethod::Get, "/photos", page_json(1..=10));
        transport.push_response(HttpMethod::Get, "/photos", Value::Array(Vec::new()));
        feed.fetch_next_page().await.unwrap();
        let mut events = feed.subscribe().await.unwrap();

        assert_eq!(feed.fetch_next_page().await.unwrap(), change(10, 10));
        assert_eq!(events.try_recv(), None);
        let snapshot = feed.snapshot().await.unwrap();
        assert_eq!(snapshot.last_loaded_page(), 2);
        assert!(snapshot.reached_end());
    }

    #[tokio::test]
    async fn test_unsubscribed_receiver_gets_nothing() {
        let (transport, feed) = start_feed();
        transport.push_response(HttpMethod::Get, "/photos", page_json(1..=10));
        let mut kept = feed.subscribe().await.unwrap();
        let mut removed = feed.subscribe().await.unwrap();

        feed.unsubscribe(removed.id).await.unwrap();
        feed.fetch_next_page().await.unwrap();

        assert_eq!(removed.try_recv(), None);
        assert!(kept.try_recv().is_some());
    }

    #[tokio::test]
    async fn test_worker_stops_when_handles_are_dropped() {
        let (_transport, api) = mock_api();
        let (feed, worker) = create_feed(8, api, MemoryTokenStore::new(), 10);
        let running = tokio::spawn(worker.run());

        drop(feed);
        running.await.unwrap();
    }
}
