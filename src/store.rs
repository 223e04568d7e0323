//! Normalized board state: each entity stored once under its id, with a
//! separate ordered id list carrying display order. All mutation goes
//! through the operations in [`crate::ops`]; consumers only read.

use std::collections::HashMap;

use crate::types::{Card, Column, Member};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Card not found: {0}")]
    CardNotFound(String),

    #[error("Member not found: {0}")]
    MemberNotFound(String),

    #[error("Checklist {checklist_id} not found on card {card_id}")]
    ChecklistNotFound {
        card_id: String,
        checklist_id: String,
    },

    #[error("Check item {check_item_id} not found in checklist {checklist_id}")]
    CheckItemNotFound {
        checklist_id: String,
        check_item_id: String,
    },

    #[error("Invariant violated: {0}")]
    InvariantViolation(String),
}

/// Anything held in a [`Collection`].
pub trait Entity {
    fn id(&self) -> &str;
}

impl Entity for Column {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for Card {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for Member {
    fn id(&self) -> &str {
        &self.id
    }
}

/// A byId map plus an allIds order list. The list's membership always
/// equals the map's key set; its order is insertion/display order and
/// is independent of the map's own iteration order.
#[derive(Debug, Clone)]
pub struct Collection<T: Entity> {
    by_id: HashMap<String, T>,
    all_ids: Vec<String>,
}

impl<T: Entity> Default for Collection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> Collection<T> {
    pub fn new() -> Self {
        Self {
            by_id: HashMap::new(),
            all_ids: Vec::new(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.by_id.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        self.by_id.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.all_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all_ids.is_empty()
    }

    /// Insert or replace by id. A replace keeps the entity's existing
    /// position in the order list; only a genuinely new id is appended.
    pub(crate) fn insert(&mut self, entity: T) {
        let id = entity.id().to_string();
        if self.by_id.insert(id.clone(), entity).is_none() {
            self.all_ids.push(id);
        }
    }

    pub(crate) fn remove(&mut self, id: &str) -> Option<T> {
        let removed = self.by_id.remove(id);
        if removed.is_some() {
            self.all_ids.retain(|existing| existing != id);
        }
        removed
    }

    /// Entities in display order. Lazy; restart by calling again.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.all_ids.iter().filter_map(|id| self.by_id.get(id))
    }

    pub fn ids(&self) -> &[String] {
        &self.all_ids
    }

    /// Rebuild from a denormalized server list. Later duplicates win,
    /// without duplicating the id in the order list.
    pub(crate) fn replace_all(&mut self, entities: Vec<T>) {
        self.by_id.clear();
        self.all_ids.clear();
        for entity in entities {
            self.insert(entity);
        }
    }

    fn check_consistency(&self, kind: &str) -> Result<(), StoreError> {
        if self.all_ids.len() != self.by_id.len() {
            return Err(StoreError::InvariantViolation(format!(
                "{}: allIds has {} entries but mapping has {}",
                kind,
                self.all_ids.len(),
                self.by_id.len()
            )));
        }
        for id in &self.all_ids {
            if !self.by_id.contains_key(id) {
                return Err(StoreError::InvariantViolation(format!(
                    "{}: allIds references missing id {}",
                    kind, id
                )));
            }
        }
        Ok(())
    }
}

/// The full normalized board snapshot. Columns, cards and members have
/// independent existence and get their own collections; checklists,
/// check items, comments and attachments live inline in their card.
#[derive(Debug, Clone, Default)]
pub struct BoardStore {
    pub is_loaded: bool,
    pub columns: Collection<Column>,
    pub cards: Collection<Card>,
    pub members: Collection<Member>,
}

impl BoardStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column(&self, id: &str) -> Result<&Column, StoreError> {
        self.columns
            .get(id)
            .ok_or_else(|| StoreError::ColumnNotFound(id.to_string()))
    }

    pub fn card(&self, id: &str) -> Result<&Card, StoreError> {
        self.cards
            .get(id)
            .ok_or_else(|| StoreError::CardNotFound(id.to_string()))
    }

    pub fn member(&self, id: &str) -> Result<&Member, StoreError> {
        self.members
            .get(id)
            .ok_or_else(|| StoreError::MemberNotFound(id.to_string()))
    }

    /// Walk the store and report the first broken invariant.
    ///
    /// Checked:
    /// - allIds membership equals the mapping key set, per collection
    /// - every card id listed by a column resolves to a card whose
    ///   `column_id` points back at that column
    /// - no card id appears twice across (or within) columns
    /// - every card in the mapping is listed by its owning column
    ///
    /// `delete_column` intentionally leaves orphaned cards behind (see
    /// [`crate::ops`]), which this check reports as a violation; tests
    /// covering that path pair it with `clear_column` first.
    pub fn check_invariants(&self) -> Result<(), StoreError> {
        self.columns.check_consistency("columns")?;
        self.cards.check_consistency("cards")?;
        self.members.check_consistency("members")?;

        let mut seen: HashMap<&str, &str> = HashMap::new();
        for column in self.columns.iter() {
            for card_id in &column.card_ids {
                if let Some(previous) = seen.insert(card_id, &column.id) {
                    return Err(StoreError::InvariantViolation(format!(
                        "card {} listed by both column {} and column {}",
                        card_id, previous, column.id
                    )));
                }
                match self.cards.get(card_id) {
                    None => {
                        return Err(StoreError::InvariantViolation(format!(
                            "column {} lists missing card {}",
                            column.id, card_id
                        )));
                    }
                    Some(card) if card.column_id != column.id => {
                        return Err(StoreError::InvariantViolation(format!(
                            "card {} listed by column {} but points at column {}",
                            card_id, column.id, card.column_id
                        )));
                    }
                    Some(_) => {}
                }
            }
        }

        for card in self.cards.iter() {
            if !seen.contains_key(card.id.as_str()) {
                return Err(StoreError::InvariantViolation(format!(
                    "card {} (column {}) is not listed by any column",
                    card.id, card.column_id
                )));
            }
        }

        Ok(())
    }
}
