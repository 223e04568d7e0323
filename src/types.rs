use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A board lane. Holds the display order of its cards as a list of
/// card ids; the cards themselves live in the store's card collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub card_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    /// Back-reference to the owning column. Must agree with that
    /// column's `card_ids` at all times.
    pub column_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_subscribed: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<Comment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checklists: Vec<Checklist>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub member_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: String,
    pub url: String,
}

/// Checklists live inline inside their card; their lifetime is the
/// card's lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checklist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub check_items: Vec<CheckItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub state: CheckItemState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckItemState {
    #[default]
    Incomplete,
    Complete,
}

impl CheckItemState {
    pub fn is_complete(self) -> bool {
        matches!(self, CheckItemState::Complete)
    }

    pub fn toggled(self) -> Self {
        match self {
            CheckItemState::Incomplete => CheckItemState::Complete,
            CheckItemState::Complete => CheckItemState::Incomplete,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub card_id: String,
    pub member_id: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// A confirmed card-update response. Keys the server leaves out of
/// the payload must not clobber local state, and after plain
/// deserialization into [`Card`] an absent list and an empty list are
/// indistinguishable — so the owned sequences stay `Option` here and
/// `None` means "keep what the store has".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardUpdate {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_subscribed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Attachment>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<Comment>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checklists: Option<Vec<Checklist>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_ids: Option<Vec<String>>,
}

impl From<Card> for CardUpdate {
    fn from(card: Card) -> Self {
        Self {
            id: card.id,
            name: card.name,
            description: card.description,
            cover: card.cover,
            due: card.due,
            is_subscribed: Some(card.is_subscribed),
            attachments: Some(card.attachments),
            comments: Some(card.comments),
            checklists: Some(card.checklists),
            member_ids: Some(card.member_ids),
        }
    }
}

/// Referenced by cards via `member_ids`, never owned by them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Full-board payload as the server sends it: denormalized entity
/// lists. `BoardStore::load_board` normalizes this into byId/allIds
/// collections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSnapshot {
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub cards: Vec<Card>,
    #[serde(default)]
    pub members: Vec<Member>,
}

impl Checklist {
    /// Completion percentage, derived at read time and never stored.
    /// An empty checklist counts as fully complete (100).
    pub fn completion_percent(&self) -> f64 {
        let total = self.check_items.len();
        if total == 0 {
            return 100.0;
        }
        let completed = self
            .check_items
            .iter()
            .filter(|item| item.state.is_complete())
            .count();
        completed as f64 / total as f64 * 100.0
    }
}
