use super::Handle;

/// Append-only storage for decoded assets.
pub struct AssetCache<T> {
    items: Vec<T>,
}

impl<T> AssetCache<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn insert(&mut self, item: T) -> Handle<T> {
        let index = self.items.len();
        self.items.push(item);
        Handle::new(index)
    }

    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        self.items.get(handle.index())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for AssetCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_resolve_to_inserted_items() {
        let mut cache = AssetCache::new();
        let a = cache.insert("strom");
        let b = cache.insert("duch");

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(a), Some(&"strom"));
        assert_eq!(cache.get(b), Some(&"duch"));
        assert_eq!(cache.get(Handle::new(7)), None);
    }
}
