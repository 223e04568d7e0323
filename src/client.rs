//! REST implementation of [`BoardApi`]. One POST endpoint per
//! operation, small JSON bodies, camelCase on the wire. Mutating calls
//! return the canonical entity wrapped in a one-field envelope
//! (`{ "column": ... }` etc.); pure deletes return an acknowledgment
//! we ignore beyond the status code.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::api::{ApiError, BoardApi, CardPatch, CheckItemPatch, ChecklistPatch, ColumnPatch};
use crate::config::RemoteConfig;
use crate::types::{BoardSnapshot, Card, CardUpdate, CheckItem, Checklist, Column, Comment};

pub struct HttpBoardApi {
    http: reqwest::Client,
    config: RemoteConfig,
}

#[derive(Deserialize)]
struct BoardEnvelope {
    board: BoardSnapshot,
}

#[derive(Deserialize)]
struct ColumnEnvelope {
    column: Column,
}

#[derive(Deserialize)]
struct CardEnvelope {
    card: Card,
}

#[derive(Deserialize)]
struct CardUpdateEnvelope {
    card: CardUpdate,
}

#[derive(Deserialize)]
struct CommentEnvelope {
    comment: Comment,
}

#[derive(Deserialize)]
struct ChecklistEnvelope {
    checklist: Checklist,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckItemEnvelope {
    check_item: CheckItem,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ColumnIdBody<'a> {
    column_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CardIdBody<'a> {
    card_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChecklistRefBody<'a> {
    card_id: &'a str,
    checklist_id: &'a str,
}

impl HttpBoardApi {
    pub fn new(config: RemoteConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Reuse an existing client (connection pooling across sessions).
    pub fn with_client(http: reqwest::Client, config: RemoteConfig) -> Self {
        Self { http, config }
    }

    async fn get_json<R: DeserializeOwned>(&self, path: &str) -> Result<R, ApiError> {
        let mut request = self.http.get(self.config.endpoint(path));
        if let Some(token) = &self.config.auth_token {
            request = request.bearer_auth(token);
        }
        Self::decode(request.send().await?).await
    }

    async fn post_json<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, ApiError> {
        let mut request = self.http.post(self.config.endpoint(path)).json(body);
        if let Some(token) = &self.config.auth_token {
            request = request.bearer_auth(token);
        }
        Self::decode(request.send().await?).await
    }

    /// POST whose response body carries no entity (clear/remove acks).
    async fn post_ack<B: Serialize>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        let mut request = self.http.post(self.config.endpoint(path)).json(body);
        if let Some(token) = &self.config.auth_token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        Self::check_status(response).await?;
        Ok(())
    }

    async fn decode<R: DeserializeOwned>(response: reqwest::Response) -> Result<R, ApiError> {
        let response = Self::check_status(response).await?;
        Ok(response.json().await?)
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        log::warn!("[kanban.client] server rejected request: {} {}", status, message);
        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl BoardApi for HttpBoardApi {
    async fn fetch_board(&self) -> Result<BoardSnapshot, ApiError> {
        let envelope: BoardEnvelope = self.get_json("/api/kanban/board").await?;
        Ok(envelope.board)
    }

    async fn create_column(&self, name: &str) -> Result<Column, ApiError> {
        #[derive(Serialize)]
        struct Body<'a> {
            name: &'a str,
        }
        let envelope: ColumnEnvelope = self
            .post_json("/api/kanban/columns/new", &Body { name })
            .await?;
        Ok(envelope.column)
    }

    async fn update_column(
        &self,
        column_id: &str,
        patch: &ColumnPatch,
    ) -> Result<Column, ApiError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body<'a> {
            column_id: &'a str,
            update: &'a ColumnPatch,
        }
        let envelope: ColumnEnvelope = self
            .post_json(
                "/api/kanban/columns/update",
                &Body {
                    column_id,
                    update: patch,
                },
            )
            .await?;
        Ok(envelope.column)
    }

    async fn clear_column(&self, column_id: &str) -> Result<(), ApiError> {
        self.post_ack("/api/kanban/columns/clear", &ColumnIdBody { column_id })
            .await
    }

    async fn remove_column(&self, column_id: &str) -> Result<(), ApiError> {
        self.post_ack("/api/kanban/columns/remove", &ColumnIdBody { column_id })
            .await
    }

    async fn create_card(&self, column_id: &str, name: &str) -> Result<Card, ApiError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body<'a> {
            column_id: &'a str,
            name: &'a str,
        }
        let envelope: CardEnvelope = self
            .post_json("/api/kanban/cards/new", &Body { column_id, name })
            .await?;
        Ok(envelope.card)
    }

    async fn update_card(&self, card_id: &str, patch: &CardPatch) -> Result<CardUpdate, ApiError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body<'a> {
            card_id: &'a str,
            update: &'a CardPatch,
        }
        let envelope: CardUpdateEnvelope = self
            .post_json(
                "/api/kanban/cards/update",
                &Body {
                    card_id,
                    update: patch,
                },
            )
            .await?;
        Ok(envelope.card)
    }

    async fn move_card(
        &self,
        card_id: &str,
        position: usize,
        column_id: Option<&str>,
    ) -> Result<(), ApiError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body<'a> {
            card_id: &'a str,
            position: usize,
            #[serde(skip_serializing_if = "Option::is_none")]
            column_id: Option<&'a str>,
        }
        self.post_ack(
            "/api/kanban/cards/move",
            &Body {
                card_id,
                position,
                column_id,
            },
        )
        .await
    }

    async fn remove_card(&self, card_id: &str) -> Result<(), ApiError> {
        self.post_ack("/api/kanban/cards/remove", &CardIdBody { card_id })
            .await
    }

    async fn create_comment(&self, card_id: &str, message: &str) -> Result<Comment, ApiError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body<'a> {
            card_id: &'a str,
            message: &'a str,
        }
        let envelope: CommentEnvelope = self
            .post_json("/api/kanban/comments/new", &Body { card_id, message })
            .await?;
        Ok(envelope.comment)
    }

    async fn create_checklist(&self, card_id: &str, name: &str) -> Result<Checklist, ApiError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body<'a> {
            card_id: &'a str,
            name: &'a str,
        }
        let envelope: ChecklistEnvelope = self
            .post_json("/api/kanban/checklists/new", &Body { card_id, name })
            .await?;
        Ok(envelope.checklist)
    }

    async fn update_checklist(
        &self,
        card_id: &str,
        checklist_id: &str,
        patch: &ChecklistPatch,
    ) -> Result<Checklist, ApiError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body<'a> {
            card_id: &'a str,
            checklist_id: &'a str,
            update: &'a ChecklistPatch,
        }
        let envelope: ChecklistEnvelope = self
            .post_json(
                "/api/kanban/checklists/update",
                &Body {
                    card_id,
                    checklist_id,
                    update: patch,
                },
            )
            .await?;
        Ok(envelope.checklist)
    }

    async fn remove_checklist(&self, card_id: &str, checklist_id: &str) -> Result<(), ApiError> {
        self.post_ack(
            "/api/kanban/checklists/remove",
            &ChecklistRefBody {
                card_id,
                checklist_id,
            },
        )
        .await
    }

    async fn create_check_item(
        &self,
        card_id: &str,
        checklist_id: &str,
        name: &str,
    ) -> Result<CheckItem, ApiError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body<'a> {
            card_id: &'a str,
            checklist_id: &'a str,
            name: &'a str,
        }
        let envelope: CheckItemEnvelope = self
            .post_json(
                "/api/kanban/check-items/new",
                &Body {
                    card_id,
                    checklist_id,
                    name,
                },
            )
            .await?;
        Ok(envelope.check_item)
    }

    async fn update_check_item(
        &self,
        card_id: &str,
        checklist_id: &str,
        check_item_id: &str,
        patch: &CheckItemPatch,
    ) -> Result<CheckItem, ApiError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body<'a> {
            card_id: &'a str,
            checklist_id: &'a str,
            check_item_id: &'a str,
            update: &'a CheckItemPatch,
        }
        let envelope: CheckItemEnvelope = self
            .post_json(
                "/api/kanban/check-items/update",
                &Body {
                    card_id,
                    checklist_id,
                    check_item_id,
                    update: patch,
                },
            )
            .await?;
        Ok(envelope.check_item)
    }

    async fn remove_check_item(
        &self,
        card_id: &str,
        checklist_id: &str,
        check_item_id: &str,
    ) -> Result<(), ApiError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body<'a> {
            card_id: &'a str,
            checklist_id: &'a str,
            check_item_id: &'a str,
        }
        self.post_ack(
            "/api/kanban/check-items/remove",
            &Body {
                card_id,
                checklist_id,
                check_item_id,
            },
        )
        .await
    }
}
