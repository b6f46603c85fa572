use std::marker::PhantomData;

/// Typed index into an [`AssetCache`](super::AssetCache).
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct Handle<T> {
    index: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> Handle<T> {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            _marker: PhantomData,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_is_copy_without_copy_payload() {
        let h1: Handle<String> = Handle::new(5);
        let h2 = h1;
        let h3 = h1;
        assert_eq!(h1.index(), h2.index());
        assert_eq!(h1, h3);
    }

    #[test]
    fn handle_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Handle<std::rc::Rc<u8>>>();
    }
}
