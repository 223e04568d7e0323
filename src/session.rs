//! Confirmed-write synchronization wrapper around the board store.
//!
//! Every operation follows the same shape: send the request, await the
//! server's canonical payload, then apply the pure transition locally
//! using that payload. A failed remote call aborts before any local
//! write, so there is nothing to roll back. The store mutex serializes
//! the apply phase; remote calls may overlap, which makes response
//! order the effective serialization point, and a transition must
//! tolerate arriving against a store that has moved on since its
//! request went out.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::api::{ApiError, BoardApi, CardPatch, CheckItemPatch, ChecklistPatch, ColumnPatch};
use crate::store::{BoardStore, StoreError};

const DEFAULT_COLUMN_NAME: &str = "Untitled column";
const DEFAULT_CARD_NAME: &str = "Untitled Card";

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Remote(#[from] ApiError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Handle to a live board. Cloning shares the same store, api and
/// liveness flag, so one clone closing the session stops all of them
/// from applying further responses.
#[derive(Clone)]
pub struct BoardSession {
    api: Arc<dyn BoardApi>,
    store: Arc<Mutex<BoardStore>>,
    live: Arc<AtomicBool>,
}

impl BoardSession {
    pub fn new(api: Arc<dyn BoardApi>) -> Self {
        Self {
            api,
            store: Arc::new(Mutex::new(BoardStore::new())),
            live: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    /// Stop applying responses. In-flight calls are not cancelled;
    /// their late responses are dropped at the apply guard instead.
    pub fn close(&self) {
        self.live.store(false, Ordering::SeqCst);
    }

    /// Read access to the current snapshot under the store lock.
    pub async fn with_store<R>(&self, read: impl FnOnce(&BoardStore) -> R) -> R {
        let store = self.store.lock().await;
        read(&store)
    }

    /// Liveness-guarded apply. The guard sits around the apply phase,
    /// not the await: a response that arrives after `close` is logged
    /// and dropped without touching the store.
    async fn apply(
        &self,
        operation: &'static str,
        transition: impl FnOnce(&mut BoardStore) -> Result<(), StoreError>,
    ) -> Result<(), SessionError> {
        if !self.is_live() {
            log::debug!(
                "[kanban.session] dropping confirmed {} response, session closed",
                operation
            );
            return Ok(());
        }
        let mut store = self.store.lock().await;
        transition(&mut store).map_err(SessionError::from)
    }

    pub async fn load(&self) -> Result<(), SessionError> {
        let snapshot = self.api.fetch_board().await?;
        self.apply("load_board", |store| {
            store.load_board(snapshot);
            Ok(())
        })
        .await
    }

    pub async fn create_column(&self, name: &str) -> Result<(), SessionError> {
        let name = non_blank(name, DEFAULT_COLUMN_NAME);
        let column = self.api.create_column(name).await?;
        self.apply("create_column", |store| {
            store.create_column(column);
            Ok(())
        })
        .await
    }

    pub async fn update_column(
        &self,
        column_id: &str,
        patch: ColumnPatch,
    ) -> Result<(), SessionError> {
        let column = self.api.update_column(column_id, &patch).await?;
        self.apply("update_column", |store| store.update_column(column))
            .await
    }

    pub async fn clear_column(&self, column_id: &str) -> Result<(), SessionError> {
        self.api.clear_column(column_id).await?;
        self.apply("clear_column", |store| store.clear_column(column_id))
            .await
    }

    pub async fn delete_column(&self, column_id: &str) -> Result<(), SessionError> {
        self.api.remove_column(column_id).await?;
        self.apply("delete_column", |store| store.delete_column(column_id))
            .await
    }

    pub async fn create_card(&self, column_id: &str, name: &str) -> Result<(), SessionError> {
        let name = non_blank(name, DEFAULT_CARD_NAME);
        let card = self.api.create_card(column_id, name).await?;
        self.apply("create_card", |store| store.create_card(card)).await
    }

    pub async fn update_card(&self, card_id: &str, patch: CardPatch) -> Result<(), SessionError> {
        let update = self.api.update_card(card_id, &patch).await?;
        self.apply("update_card", |store| store.update_card(update)).await
    }

    pub async fn move_card(
        &self,
        card_id: &str,
        position: usize,
        column_id: Option<&str>,
    ) -> Result<(), SessionError> {
        self.api.move_card(card_id, position, column_id).await?;
        let target = column_id.map(str::to_string);
        self.apply("move_card", |store| {
            store.move_card(card_id, position, target.as_deref())
        })
        .await
    }

    pub async fn delete_card(&self, card_id: &str) -> Result<(), SessionError> {
        self.api.remove_card(card_id).await?;
        self.apply("delete_card", |store| store.delete_card(card_id)).await
    }

    pub async fn add_comment(&self, card_id: &str, message: &str) -> Result<(), SessionError> {
        let comment = self.api.create_comment(card_id, message).await?;
        self.apply("add_comment", |store| store.add_comment(comment)).await
    }

    pub async fn add_checklist(&self, card_id: &str, name: &str) -> Result<(), SessionError> {
        let checklist = self.api.create_checklist(card_id, name).await?;
        self.apply("add_checklist", |store| store.add_checklist(card_id, checklist))
            .await
    }

    pub async fn update_checklist(
        &self,
        card_id: &str,
        checklist_id: &str,
        patch: ChecklistPatch,
    ) -> Result<(), SessionError> {
        let checklist = self.api.update_checklist(card_id, checklist_id, &patch).await?;
        self.apply("update_checklist", |store| {
            store.update_checklist(card_id, checklist)
        })
        .await
    }

    pub async fn delete_checklist(
        &self,
        card_id: &str,
        checklist_id: &str,
    ) -> Result<(), SessionError> {
        self.api.remove_checklist(card_id, checklist_id).await?;
        self.apply("delete_checklist", |store| {
            store.delete_checklist(card_id, checklist_id)
        })
        .await
    }

    pub async fn add_check_item(
        &self,
        card_id: &str,
        checklist_id: &str,
        name: &str,
    ) -> Result<(), SessionError> {
        let check_item = self.api.create_check_item(card_id, checklist_id, name).await?;
        self.apply("add_check_item", |store| {
            store.add_check_item(card_id, checklist_id, check_item)
        })
        .await
    }

    pub async fn update_check_item(
        &self,
        card_id: &str,
        checklist_id: &str,
        check_item_id: &str,
        patch: CheckItemPatch,
    ) -> Result<(), SessionError> {
        let check_item = self
            .api
            .update_check_item(card_id, checklist_id, check_item_id, &patch)
            .await?;
        self.apply("update_check_item", |store| {
            store.update_check_item(card_id, checklist_id, check_item)
        })
        .await
    }

    pub async fn delete_check_item(
        &self,
        card_id: &str,
        checklist_id: &str,
        check_item_id: &str,
    ) -> Result<(), SessionError> {
        self.api
            .remove_check_item(card_id, checklist_id, check_item_id)
            .await?;
        self.apply("delete_check_item", |store| {
            store.delete_check_item(card_id, checklist_id, check_item_id)
        })
        .await
    }
}

fn non_blank<'a>(name: &'a str, fallback: &'a str) -> &'a str {
    if name.trim().is_empty() {
        fallback
    } else {
        name
    }
}
