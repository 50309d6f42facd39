use crossbeam_skiplist::SkipMap;

use super::command::LogPointer;

/// key to location of its latest `Set`, rebuilt from the segments on every open
#[derive(Default)]
pub(crate) struct KeyIndex {
    map: SkipMap<String, LogPointer>,
}

impl KeyIndex {
    pub(crate) fn lookup(&self, key: &str) -> Option<LogPointer> {
        self.map.get(key).map(|entry| *entry.value())
    }

    /// point `key` at `pointer`, returning the pointer it superseded
    pub(crate) fn update_on_set(&self, key: String, pointer: LogPointer) -> Option<LogPointer> {
        let previous = self.lookup(&key);
        self.map.insert(key, pointer);
        previous
    }

    /// drop `key`, returning the pointer it had
    pub(crate) fn update_on_remove(&self, key: &str) -> Option<LogPointer> {
        self.map.remove(key).map(|entry| *entry.value())
    }

    /// snapshot of all entries in key order
    pub(crate) fn entries(&self) -> Vec<(String, LogPointer)> {
        self.map
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }
}
