//! Remote collaborator contract. The server is the source of truth for
//! generated ids and computed fields: every create/update call returns
//! the canonical entity, and only that confirmed payload is applied
//! locally. Implementations: [`crate::client::HttpBoardApi`] (REST),
//! plus in-memory fakes in the session tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::{
    BoardSnapshot, Card, CardUpdate, CheckItem, CheckItemState, Checklist, Column, Comment,
};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },
}

/// Partial column update; `None` fields are left out of the request
/// body and the server leaves them alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_subscribed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckItemPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<CheckItemState>,
}

/// One method per endpoint. Calls carry only the operation's semantic
/// arguments, never the local store.
#[async_trait]
pub trait BoardApi: Send + Sync {
    async fn fetch_board(&self) -> Result<BoardSnapshot, ApiError>;

    async fn create_column(&self, name: &str) -> Result<Column, ApiError>;
    async fn update_column(&self, column_id: &str, patch: &ColumnPatch)
        -> Result<Column, ApiError>;
    async fn clear_column(&self, column_id: &str) -> Result<(), ApiError>;
    async fn remove_column(&self, column_id: &str) -> Result<(), ApiError>;

    async fn create_card(&self, column_id: &str, name: &str) -> Result<Card, ApiError>;
    async fn update_card(&self, card_id: &str, patch: &CardPatch) -> Result<CardUpdate, ApiError>;
    async fn move_card(
        &self,
        card_id: &str,
        position: usize,
        column_id: Option<&str>,
    ) -> Result<(), ApiError>;
    async fn remove_card(&self, card_id: &str) -> Result<(), ApiError>;

    async fn create_comment(&self, card_id: &str, message: &str) -> Result<Comment, ApiError>;

    async fn create_checklist(&self, card_id: &str, name: &str) -> Result<Checklist, ApiError>;
    async fn update_checklist(
        &self,
        card_id: &str,
        checklist_id: &str,
        patch: &ChecklistPatch,
    ) -> Result<Checklist, ApiError>;
    async fn remove_checklist(&self, card_id: &str, checklist_id: &str) -> Result<(), ApiError>;

    async fn create_check_item(
        &self,
        card_id: &str,
        checklist_id: &str,
        name: &str,
    ) -> Result<CheckItem, ApiError>;
    async fn update_check_item(
        &self,
        card_id: &str,
        checklist_id: &str,
        check_item_id: &str,
        patch: &CheckItemPatch,
    ) -> Result<CheckItem, ApiError>;
    async fn remove_check_item(
        &self,
        card_id: &str,
        checklist_id: &str,
        check_item_id: &str,
    ) -> Result<(), ApiError>;
}
