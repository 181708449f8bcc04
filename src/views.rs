use crate::models::Entity;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalKind {
    Add,
    Edit,
    Delete,
}

/// Which create/edit/delete dialog is showing, and for which record.
#[derive(Debug, Clone, PartialEq)]
pub struct ModalState<T> {
    kind: Option<ModalKind>,
    selected: Option<T>,
}

impl<T> Default for ModalState<T> {
    fn default() -> Self {
        Self {
            kind: None,
            selected: None,
        }
    }
}

impl<T> ModalState<T> {
    pub fn open_add(&mut self) {
        self.selected = None;
        self.kind = Some(ModalKind::Add);
    }

    pub fn open_edit(&mut self, entity: T) {
        self.selected = Some(entity);
        self.kind = Some(ModalKind::Edit);
    }

    pub fn open_delete(&mut self, entity: T) {
        self.selected = Some(entity);
        self.kind = Some(ModalKind::Delete);
    }

    /// Drops the selection, then closes.
    pub fn close(&mut self) {
        self.selected = None;
        self.kind = None;
    }

    pub fn is_open(&self) -> bool {
        self.kind.is_some()
    }

    pub fn kind(&self) -> Option<ModalKind> {
        self.kind
    }

    pub fn selected(&self) -> Option<&T> {
        self.selected.as_ref()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModalQuery {
    #[serde(default)]
    pub modal: Option<String>,
    #[serde(default)]
    pub id: Option<i64>,
}

impl<T: Entity> ModalState<T> {
    /// Opens the dialog named by `?modal=add|edit|delete&id=`; edit and
    /// delete stay closed when `id` is not among `items`.
    pub fn from_query(query: &ModalQuery, items: &[T]) -> Self {
        let mut state = Self::default();
        let find = || {
            query
                .id
                .and_then(|id| items.iter().find(|item| item.id() == id).cloned())
        };
        match query.modal.as_deref() {
            Some("add") => state.open_add(),
            Some("edit") => {
                if let Some(entity) = find() {
                    state.open_edit(entity);
                }
            }
            Some("delete") => {
                if let Some(entity) = find() {
                    state.open_delete(entity);
                }
            }
            _ => {}
        }
        state
    }
}

/// Transient banner shown after a redirect.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Notice {
    #[serde(default)]
    pub notice: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Client;
    use serde_json::Map;

    fn client(id: i64) -> Client {
        Client {
            id,
            first_name: format!("client {id}"),
            last_name: String::new(),
            email: None,
            phone: None,
            date_of_birth: None,
            care_level: None,
            status: None,
            extra: Map::new(),
        }
    }

    #[test]
    fn close_clears_selection() {
        let mut modal = ModalState::default();
        modal.open_edit(client(1));
        assert_eq!(modal.kind(), Some(ModalKind::Edit));
        assert_eq!(modal.selected().map(|c| c.id), Some(1));

        modal.close();
        assert!(!modal.is_open());
        assert!(modal.selected().is_none());
    }

    #[test]
    fn add_never_carries_a_selection() {
        let mut modal = ModalState::default();
        modal.open_delete(client(2));
        modal.open_add();
        assert!(modal.selected().is_none());
        assert_eq!(modal.kind(), Some(ModalKind::Add));
    }

    #[test]
    fn query_selects_from_fetched_items() {
        let items = vec![client(1), client(2)];
        let query = ModalQuery {
            modal: Some("delete".into()),
            id: Some(2),
        };
        let modal = ModalState::from_query(&query, &items);
        assert_eq!(modal.kind(), Some(ModalKind::Delete));
        assert_eq!(modal.selected().map(|c| c.id), Some(2));

        let missing = ModalQuery {
            modal: Some("edit".into()),
            id: Some(9),
        };
        assert!(!ModalState::from_query(&missing, &items).is_open());
    }
}
