//! Multi-select bookkeeping for list screens.
//!
//! The set and the items' own `selected` flags are only ever changed
//! together through [`SelectionSet`], so membership and the rendered
//! indicator cannot drift apart.

use std::collections::HashSet;
use std::hash::Hash;

/// A list item that can carry a visible selection indicator.
pub trait Selectable {
    type Key: Eq + Hash + Clone;

    fn key(&self) -> Self::Key;
    fn is_selected(&self) -> bool;
    fn set_selected(&mut self, selected: bool);
}

#[derive(Debug, Clone)]
pub struct SelectionSet<K> {
    keys: HashSet<K>,
}

impl<K> Default for SelectionSet<K> {
    fn default() -> Self {
        Self {
            keys: HashSet::new(),
        }
    }
}

impl<K: Eq + Hash + Clone> SelectionSet<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips `item` in or out of the set. Returns the new state.
    pub fn toggle<T>(&mut self, item: &mut T) -> bool
    where
        T: Selectable<Key = K>,
    {
        let key = item.key();
        let selected = if self.keys.remove(&key) {
            false
        } else {
            self.keys.insert(key);
            true
        };
        item.set_selected(selected);
        selected
    }

    pub fn select_all<'a, T, I>(&mut self, items: I)
    where
        T: Selectable<Key = K> + 'a,
        I: IntoIterator<Item = &'a mut T>,
    {
        for item in items {
            self.keys.insert(item.key());
            item.set_selected(true);
        }
    }

    pub fn clear<'a, T, I>(&mut self, items: I)
    where
        T: Selectable<Key = K> + 'a,
        I: IntoIterator<Item = &'a mut T>,
    {
        for item in items {
            item.set_selected(false);
        }
        self.keys.clear();
    }

    pub fn contains(&self, key: &K) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
