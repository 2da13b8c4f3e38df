//! Catalog store: fetched games, load status and the user's library.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    models::{GameId, GameSummary},
    remote::{CatalogClient, FetchError},
};

/// Lifecycle of the catalog fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LoadStatus {
    /// Nothing requested yet.
    #[default]
    Idle,
    /// A request is in flight.
    Loading,
    /// The most recent applicable response succeeded.
    Succeeded,
    /// The most recent applicable response failed.
    Failed,
}

impl LoadStatus {
    /// Lower-case label for status lines.
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

/// Point-in-time copy of the store contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogState {
    /// Catalog in fetch order.
    pub games: Vec<GameSummary>,
    /// Fetch lifecycle.
    pub status: LoadStatus,
    /// Cause of the last failed fetch.
    pub error: Option<String>,
    /// Library in save order.
    pub saved_games: Vec<GameSummary>,
}

/// Sequence token handed out when a load starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadTicket {
    seq: u64,
    page: u32,
}

impl LoadTicket {
    /// Remote page the load was issued for.
    pub fn page(&self) -> u32 {
        self.page
    }
}

#[derive(Default)]
struct Inner {
    state: CatalogState,
    issued_seq: u64,
    applied_seq: u64,
    generation: u64,
}

/// Shared handle to the catalog state.
///
/// Clones point at the same state. Every write goes through the load
/// lifecycle or the two library operations, which keep library ids unique.
#[derive(Clone)]
pub struct CatalogStore {
    client: CatalogClient,
    inner: Arc<RwLock<Inner>>,
}

impl CatalogStore {
    /// Create an empty store in the `Idle` state.
    pub fn new(client: CatalogClient) -> Self {
        Self {
            client,
            inner: Arc::new(RwLock::new(Inner::default())),
        }
    }

    /// Client used for catalog loads.
    pub fn client(&self) -> &CatalogClient {
        &self.client
    }

    /// Fetch `page` and record the outcome; failures become state.
    pub async fn load_catalog(&self, page: u32) -> LoadStatus {
        let ticket = self.begin_load(page);
        let result = self.client.fetch_page(ticket.page()).await;
        self.finish_load(ticket, result)
    }

    /// Mark a load as started and hand out its sequence token.
    pub fn begin_load(&self, page: u32) -> LoadTicket {
        let mut inner = self.inner.write();
        inner.issued_seq += 1;
        inner.state.status = LoadStatus::Loading;
        let ticket = LoadTicket {
            seq: inner.issued_seq,
            page: page.max(1),
        };
        info!(page = ticket.page, seq = ticket.seq, "Catalog load started");
        ticket
    }

    /// Apply the outcome of the load identified by `ticket`.
    ///
    /// Responses older than one already applied are dropped. While a newer
    /// request is still outstanding the status stays `Loading`.
    pub fn finish_load(
        &self,
        ticket: LoadTicket,
        result: Result<Vec<GameSummary>, FetchError>,
    ) -> LoadStatus {
        let mut inner = self.inner.write();
        if ticket.seq <= inner.applied_seq {
            warn!(
                seq = ticket.seq,
                applied = inner.applied_seq,
                "Discarding stale catalog response"
            );
            return inner.state.status;
        }
        let superseded = ticket.seq < inner.issued_seq;

        match result {
            Ok(games) => {
                info!(page = ticket.page, count = games.len(), "Catalog loaded");
                inner.applied_seq = ticket.seq;
                inner.generation += 1;
                inner.state.games = games;
                inner.state.error = None;
                if !superseded {
                    inner.state.status = LoadStatus::Succeeded;
                }
            }
            Err(err) if superseded => {
                warn!(seq = ticket.seq, %err, "Superseded catalog load failed");
            }
            Err(err) => {
                warn!(page = ticket.page, %err, "Catalog load failed");
                inner.applied_seq = ticket.seq;
                inner.state.status = LoadStatus::Failed;
                inner.state.error = Some(err.to_string());
            }
        }
        inner.state.status
    }

    /// True until the first load has been requested.
    pub fn should_load(&self) -> bool {
        self.inner.read().state.status == LoadStatus::Idle
    }

    /// Add `game` to the library unless an entry with its id exists.
    ///
    /// Returns whether the library changed.
    pub fn save_game(&self, game: GameSummary) -> bool {
        let mut inner = self.inner.write();
        if inner.state.saved_games.iter().any(|saved| saved.id == game.id) {
            return false;
        }
        debug!(id = game.id, name = %game.name, "Saved to library");
        inner.state.saved_games.push(game);
        true
    }

    /// Remove every library entry with `id`. Returns whether anything was removed.
    pub fn remove_game(&self, id: GameId) -> bool {
        let mut inner = self.inner.write();
        let before = inner.state.saved_games.len();
        inner.state.saved_games.retain(|saved| saved.id != id);
        let removed = inner.state.saved_games.len() != before;
        if removed {
            debug!(id, "Removed from library");
        }
        removed
    }

    /// Whether the library currently holds `id`.
    pub fn is_saved(&self, id: GameId) -> bool {
        self.inner
            .read()
            .state
            .saved_games
            .iter()
            .any(|saved| saved.id == id)
    }

    /// Catalog in fetch order.
    pub fn games(&self) -> Vec<GameSummary> {
        self.inner.read().state.games.clone()
    }

    /// Current load status.
    pub fn status(&self) -> LoadStatus {
        self.inner.read().state.status
    }

    /// Cause of the last failed load, if not cleared by a success.
    pub fn error(&self) -> Option<String> {
        self.inner.read().state.error.clone()
    }

    /// Library in save order.
    pub fn saved_games(&self) -> Vec<GameSummary> {
        self.inner.read().state.saved_games.clone()
    }

    /// Counter bumped whenever `games` is replaced.
    pub fn generation(&self) -> u64 {
        self.inner.read().generation
    }

    /// Copy of the whole state.
    pub fn snapshot(&self) -> CatalogState {
        self.inner.read().state.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::ApiSettings, models::Tag};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn game(id: GameId, name: &str) -> GameSummary {
        GameSummary {
            id,
            name: name.to_string(),
            description: Some(name.to_lowercase()),
            image_url: None,
            rating: Some(4.0),
            category: "Action".to_string(),
            release_year: Some(2020),
            tags: vec![Tag {
                name: "Singleplayer".to_string(),
            }],
        }
    }

    fn client(base_url: &str) -> CatalogClient {
        let settings = ApiSettings {
            base_url: base_url.to_string(),
            key: "test-key".to_string(),
            ..ApiSettings::default()
        };
        CatalogClient::new(&settings).unwrap()
    }

    fn store() -> CatalogStore {
        CatalogStore::new(client("http://127.0.0.1:9"))
    }

    fn fetch_failure() -> FetchError {
        FetchError::Status {
            status: 503,
            body: "Service Unavailable".to_string(),
        }
    }

    async fn serve_once(status: &str, body: &str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let status = status.to_string();
        let body = body.to_string();
        tokio::spawn(async move {
            if let Ok((mut stream, _)) = listener.accept().await {
                let mut buf = vec![0u8; 8192];
                let _ = stream.read(&mut buf).await;
                let resp = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = stream.write_all(resp.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });
        url
    }

    #[test]
    fn starts_idle_and_empty() {
        let store = store();
        assert!(store.should_load());
        assert_eq!(store.snapshot(), CatalogState::default());
    }

    #[test]
    fn begin_load_is_visible_synchronously() {
        let store = store();
        store.begin_load(1);
        assert_eq!(store.status(), LoadStatus::Loading);
        assert!(!store.should_load());
    }

    #[test]
    fn saving_twice_equals_saving_once() {
        let store = store();
        assert!(store.save_game(game(1, "Halo")));
        let once = store.saved_games();
        assert!(!store.save_game(game(1, "Halo")));
        assert_eq!(store.saved_games(), once);
    }

    #[test]
    fn library_ids_stay_unique_and_ordered() {
        let store = store();
        let ops: [(bool, GameId); 9] = [
            (true, 3),
            (true, 1),
            (true, 3),
            (false, 1),
            (true, 2),
            (true, 1),
            (false, 7),
            (true, 2),
            (true, 3),
        ];
        for (save, id) in ops {
            if save {
                store.save_game(game(id, &format!("Game {id}")));
            } else {
                store.remove_game(id);
            }
            let mut ids: Vec<_> = store.saved_games().iter().map(|g| g.id).collect();
            let len = ids.len();
            ids.sort_unstable();
            ids.dedup();
            assert_eq!(ids.len(), len, "duplicate id after op ({save}, {id})");
        }
        let order: Vec<_> = store.saved_games().iter().map(|g| g.id).collect();
        assert_eq!(order, [3, 2, 1]);
    }

    #[test]
    fn removal_clears_membership() {
        let store = store();
        store.save_game(game(1, "Halo"));
        store.save_game(game(2, "Minecraft"));

        assert!(store.remove_game(1));
        assert!(!store.is_saved(1));
        assert!(store.is_saved(2));

        assert!(!store.remove_game(1));
        assert!(!store.remove_game(99));
        assert!(!store.is_saved(99));
    }

    #[test]
    fn successful_load_replaces_games_wholesale() {
        let store = store();
        let first = store.begin_load(1);
        store.finish_load(first, Ok(vec![game(1, "Halo"), game(2, "Minecraft")]));

        let second = store.begin_load(2);
        let next = vec![game(5, "Portal"), game(4, "Doom"), game(6, "Myst")];
        let status = store.finish_load(second, Ok(next.clone()));

        assert_eq!(status, LoadStatus::Succeeded);
        assert_eq!(store.games(), next);
        assert_eq!(store.generation(), 2);
    }

    #[test]
    fn library_survives_reloads() {
        let store = store();
        store.save_game(game(1, "Halo"));
        let ticket = store.begin_load(1);
        store.finish_load(ticket, Ok(vec![game(2, "Minecraft")]));
        let ticket = store.begin_load(1);
        store.finish_load(ticket, Err(fetch_failure()));
        assert!(store.is_saved(1));
    }

    #[test]
    fn failure_then_retry() {
        let store = store();
        let ticket = store.begin_load(1);
        store.finish_load(ticket, Ok(vec![game(1, "Halo")]));
        let before = store.games();

        let ticket = store.begin_load(2);
        let status = store.finish_load(ticket, Err(fetch_failure()));
        assert_eq!(status, LoadStatus::Failed);
        assert!(store.error().is_some_and(|message| !message.is_empty()));
        assert_eq!(store.games(), before);

        let ticket = store.begin_load(2);
        assert_eq!(store.status(), LoadStatus::Loading);
        let status = store.finish_load(ticket, Ok(vec![game(2, "Minecraft")]));
        assert_eq!(status, LoadStatus::Succeeded);
        assert!(store.error().is_none());
        assert_eq!(store.games(), vec![game(2, "Minecraft")]);
    }

    #[test]
    fn stale_response_is_discarded() {
        let store = store();
        let older = store.begin_load(1);
        let newer = store.begin_load(2);

        store.finish_load(newer, Ok(vec![game(2, "Minecraft")]));
        let status = store.finish_load(older, Ok(vec![game(1, "Halo")]));

        assert_eq!(status, LoadStatus::Succeeded);
        assert_eq!(store.games(), vec![game(2, "Minecraft")]);
    }

    #[test]
    fn superseded_response_keeps_loading_until_latest_arrives() {
        let store = store();
        let older = store.begin_load(1);
        let newer = store.begin_load(2);

        let status = store.finish_load(older, Ok(vec![game(1, "Halo")]));
        assert_eq!(status, LoadStatus::Loading);
        assert_eq!(store.games(), vec![game(1, "Halo")]);

        let status = store.finish_load(newer, Ok(vec![game(2, "Minecraft")]));
        assert_eq!(status, LoadStatus::Succeeded);
        assert_eq!(store.games(), vec![game(2, "Minecraft")]);
    }

    #[test]
    fn superseded_failure_is_dropped() {
        let store = store();
        let older = store.begin_load(1);
        let newer = store.begin_load(2);

        store.finish_load(older, Err(fetch_failure()));
        assert_eq!(store.status(), LoadStatus::Loading);
        assert!(store.error().is_none());

        store.finish_load(newer, Ok(vec![game(2, "Minecraft")]));
        assert_eq!(store.status(), LoadStatus::Succeeded);
    }

    #[tokio::test]
    async fn load_catalog_over_http() {
        let url = serve_once(
            "200 OK",
            r#"{"results": [{"id": 10, "name": "Halo", "genres": [{"name": "Shooter"}], "released": "2001-11-15"}]}"#,
        )
        .await;
        let store = CatalogStore::new(client(&url));

        let status = store.load_catalog(1).await;

        assert_eq!(status, LoadStatus::Succeeded);
        let games = store.games();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].id, 10);
        assert_eq!(games[0].category, "Shooter");
    }

    #[tokio::test]
    async fn load_catalog_records_http_failure() {
        let url = serve_once("500 Internal Server Error", "").await;
        let store = CatalogStore::new(client(&url));

        let status = store.load_catalog(1).await;

        assert_eq!(status, LoadStatus::Failed);
        let message = store.error().unwrap_or_default();
        assert!(message.contains("500"), "unexpected message: {message}");
        assert!(store.games().is_empty());
    }
}
