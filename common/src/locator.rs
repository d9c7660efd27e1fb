//! 変換結果の参照先（ロケータ）管理
//!
//! ブラウザの `URL.createObjectURL` / `URL.revokeObjectURL` に相当する。
//! 発行したロケータは必ず一度だけ解放する。

use crate::error::Result;
use crate::types::Locator;
use std::collections::HashMap;
use std::sync::Arc;

/// ロケータの発行と解放
pub trait LocatorStore {
    /// 変換結果を公開してロケータを返す
    fn publish(&mut self, file_name: &str, payload: &[u8]) -> Result<Locator>;

    /// 公開済みのロケータを解放する
    fn release(&mut self, locator: &Locator);
}

/// メモリ上に結果を保持するストア（`blob:` URL 相当）
#[derive(Debug, Default)]
pub struct MemoryLocators {
    next_id: u64,
    live: HashMap<Locator, Arc<[u8]>>,
    released: u64,
}

impl MemoryLocators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, locator: &Locator) -> Option<Arc<[u8]>> {
        self.live.get(locator).cloned()
    }

    /// 現在公開中の件数
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// 解放した件数
    pub fn released_count(&self) -> u64 {
        self.released
    }
}

impl LocatorStore for MemoryLocators {
    fn publish(&mut self, file_name: &str, payload: &[u8]) -> Result<Locator> {
        self.next_id += 1;
        let locator = Locator::new(format!("blob:{}/{}", self.next_id, file_name));
        self.live.insert(locator.clone(), Arc::from(payload));
        Ok(locator)
    }

    fn release(&mut self, locator: &Locator) {
        if self.live.remove(locator).is_some() {
            self.released += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_and_release() {
        let mut store = MemoryLocators::new();
        let a = store.publish("a.webp", b"aaa").unwrap();
        let b = store.publish("a.webp", b"bbb").unwrap();

        assert_ne!(a, b);
        assert!(a.as_str().starts_with("blob:"));
        assert_eq!(store.live_count(), 2);
        assert_eq!(&*store.get(&a).unwrap(), b"aaa");

        store.release(&a);
        assert_eq!(store.live_count(), 1);
        assert!(store.get(&a).is_none());
        assert_eq!(store.released_count(), 1);
    }

    #[test]
    fn test_double_release_is_counted_once() {
        let mut store = MemoryLocators::new();
        let a = store.publish("a.webp", b"aaa").unwrap();
        store.release(&a);
        store.release(&a);
        assert_eq!(store.released_count(), 1);
    }
}
