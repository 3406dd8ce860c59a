use serde::{Deserialize, Serialize};

use crate::random_id;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: String,
    pub text: String,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checklist {
    pub id: String,
    pub name: String,
    pub items: Vec<ChecklistItem>,
}

impl Checklist {
    /// `None` if the trimmed name is empty.
    pub fn new(name: &str) -> Option<Self> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        Some(Self {
            id: random_id(),
            name: name.to_string(),
            items: Vec::new(),
        })
    }

    /// Appends an unchecked item. Blank text is ignored.
    pub fn add_item(&mut self, text: &str) -> Option<&ChecklistItem> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        self.items.push(ChecklistItem {
            id: random_id(),
            text: text.to_string(),
            completed: false,
        });
        self.items.last()
    }

    /// Flips `completed` and returns the new value.
    pub fn toggle_item(&mut self, item_id: &str) -> Option<bool> {
        let item = self.items.iter_mut().find(|item| item.id == item_id)?;
        item.completed = !item.completed;
        Some(item.completed)
    }

    pub fn remove_item(&mut self, item_id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != item_id);
        self.items.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_names_and_items_are_rejected() {
        assert!(Checklist::new("   ").is_none());

        let mut list = Checklist::new("  Packing ").unwrap();
        assert_eq!(list.name, "Packing");
        assert!(list.add_item("\t").is_none());
        assert!(list.items.is_empty());
    }

    #[test]
    fn item_lifecycle() {
        let mut list = Checklist::new("Packing").unwrap();
        let first = list.add_item("Charger").unwrap().id.clone();
        list.add_item("Rain jacket");
        assert_eq!(list.items[1].text, "Rain jacket");

        assert_eq!(list.toggle_item(&first), Some(true));
        assert_eq!(list.toggle_item(&first), Some(false));
        assert_eq!(list.toggle_item("missing"), None);

        assert!(list.remove_item(&first));
        assert!(!list.remove_item(&first));
        assert_eq!(list.items.len(), 1);
    }
}
