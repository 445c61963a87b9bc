/// Last-in-first-out stack of suspended screens.
///
/// Unbounded. Popping an empty stack returns `None`, which callers read as
/// "already at home".
#[derive(Debug)]
pub struct History<T> {
    entries: Vec<T>,
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> History<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: T) {
        self.entries.push(entry);
    }

    pub fn pop(&mut self) -> Option<T> {
        self.entries.pop()
    }

    /// Empties the stack and returns the bottom entry, if any.
    pub fn clear(&mut self) -> Option<T> {
        let mut drained = self.entries.drain(..);
        drained.next()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bottom to top.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    /// Number of entries that count as a navigation step.
    pub fn durable_len(&self, is_intermediate: impl Fn(&T) -> bool) -> usize {
        self.entries.iter().filter(|e| !is_intermediate(e)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop_is_lifo() {
        let mut history = History::new();
        history.push("home");
        history.push("mangas");
        assert_eq!(history.pop(), Some("mangas"));
        assert_eq!(history.pop(), Some("home"));
        assert_eq!(history.pop(), None);
    }

    #[test]
    fn test_clear_returns_bottom_entry() {
        let mut history = History::new();
        for screen in ["home", "mangas", "volumes"] {
            history.push(screen);
        }
        assert_eq!(history.clear(), Some("home"));
        assert!(history.is_empty());
        assert_eq!(history.clear(), None);
    }

    #[test]
    fn test_durable_len_skips_intermediate_entries() {
        let mut history = History::new();
        for screen in ["home", "confirm", "chapters", "formats"] {
            history.push(screen);
        }
        let intermediate = |s: &&str| matches!(*s, "confirm" | "formats");
        assert_eq!(history.len(), 4);
        assert_eq!(history.durable_len(intermediate), 2);
    }
}
