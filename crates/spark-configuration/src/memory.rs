use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;

use crate::path;
use crate::provider::{ConfigurationProvider, merge_child_keys};
use crate::sealed::Sealed;
use crate::source::{BuildContext, ConfigurationSource};
use crate::Result;

/// 内存配置源：以键值对列表描述一层配置。
///
/// 同一键（忽略大小写）出现多次时，以最后一次为准。
#[derive(Clone, Debug, Default)]
pub struct MemoryConfigurationSource {
    entries: Vec<(String, String)>,
}

impl MemoryConfigurationSource {
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Sealed for MemoryConfigurationSource {}

impl ConfigurationSource for MemoryConfigurationSource {
    fn describe(&self) -> Cow<'_, str> {
        Cow::Borrowed("memory")
    }

    fn build(self: Box<Self>, _context: &BuildContext) -> Result<Box<dyn ConfigurationProvider>> {
        Ok(Box::new(MemoryConfigurationProvider::new(self.entries)))
    }
}

struct Entry {
    key: String,
    value: String,
}

/// 内存配置提供者。
///
/// ### 契约说明（What）
/// - 键查找大小写不敏感，枚举子段时保留首次写入的原始拼写；
/// - 读路径持有读锁，可被多个读取方并发调用；`set` 持有写锁，单次写入原子可见。
pub struct MemoryConfigurationProvider {
    data: RwLock<HashMap<String, Entry>>,
}

impl MemoryConfigurationProvider {
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let provider = Self {
            data: RwLock::new(HashMap::new()),
        };
        {
            let mut data = provider.data.write();
            for (key, value) in entries {
                upsert(&mut data, key.into(), value.into());
            }
        }
        provider
    }

    /// 当前保存的键数量。
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

fn upsert(data: &mut HashMap<String, Entry>, key: String, value: String) {
    match data.get_mut(&path::normalize(&key)) {
        Some(entry) => entry.value = value,
        None => {
            data.insert(path::normalize(&key), Entry { key, value });
        }
    }
}

impl ConfigurationProvider for MemoryConfigurationProvider {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed("memory")
    }

    fn try_get(&self, key: &str) -> Option<String> {
        self.data
            .read()
            .get(&path::normalize(key))
            .map(|entry| entry.value.clone())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        upsert(&mut self.data.write(), key.to_owned(), value.to_owned());
        Ok(())
    }

    fn child_keys(&self, earlier: Vec<String>, parent_path: Option<&str>) -> Vec<String> {
        let parent_path = parent_path.filter(|parent| !parent.is_empty());
        let data = self.data.read();
        let contributed = data.values().filter_map(|entry| {
            let remainder = match parent_path {
                Some(parent) => path::strip_segment_prefix(&entry.key, parent)?,
                None => entry.key.as_str(),
            };
            let segment = remainder.split(path::KEY_DELIMITER).next()?;
            (!segment.is_empty()).then(|| segment.to_owned())
        });
        merge_child_keys(earlier, contributed)
    }
}

impl fmt::Debug for MemoryConfigurationProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryConfigurationProvider")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> MemoryConfigurationProvider {
        MemoryConfigurationProvider::new([
            ("Kestrel:Endpoints:Http:Url", "http://*:6001/"),
            ("Kestrel:Endpoints:Https:Url", "https://*:6002/"),
            ("Testing:Blah", "BaseValue"),
        ])
    }

    #[test]
    fn lookups_ignore_case() {
        let provider = provider();
        assert_eq!(provider.try_get("testing:blah").as_deref(), Some("BaseValue"));
        assert_eq!(provider.try_get("Testing"), None);
    }

    #[test]
    fn set_updates_existing_key_and_keeps_spelling() {
        let provider = provider();
        provider.set("TESTING:BLAH", "Changed").expect("set");
        assert_eq!(provider.try_get("Testing:Blah").as_deref(), Some("Changed"));
        assert_eq!(provider.len(), 3);
        assert_eq!(provider.child_keys(Vec::new(), None), vec!["Kestrel", "Testing"]);
    }

    #[test]
    fn later_duplicate_entries_win() {
        let provider = MemoryConfigurationProvider::new([("Key", "first"), ("key", "second")]);
        assert_eq!(provider.len(), 1);
        assert_eq!(provider.try_get("KEY").as_deref(), Some("second"));
    }

    #[test]
    fn child_keys_lists_direct_segments_only() {
        let provider = provider();
        assert_eq!(
            provider.child_keys(Vec::new(), Some("kestrel:endpoints")),
            vec!["Http", "Https"]
        );
        assert_eq!(
            provider.child_keys(vec!["Extra".to_owned()], Some("Testing")),
            vec!["Blah", "Extra"]
        );
        assert!(provider.child_keys(Vec::new(), Some("Missing")).is_empty());
    }
}
