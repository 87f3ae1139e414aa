// Source table
// Id allocation and lookup for sounding sources, independent of the output device

use std::collections::HashMap;

use super::sync::SourceId;

/// Live sources keyed by the id handed back to the synchronizer
#[derive(Debug)]
pub struct SourceTable<T> {
    sources: HashMap<SourceId, T>,
    next_id: u64,
}

impl<T> Default for SourceTable<T> {
    fn default() -> Self {
        Self {
            sources: HashMap::new(),
            next_id: 0,
        }
    }
}

impl<T> SourceTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `source` under a fresh id; ids are never reused
    pub fn insert(&mut self, source: T) -> SourceId {
        let id = SourceId(self.next_id);
        self.next_id += 1;
        self.sources.insert(id, source);
        id
    }

    pub fn remove(&mut self, id: SourceId) -> Option<T> {
        self.sources.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Remove every source for which `finished` holds, returning their ids in order
    pub fn drain_finished(&mut self, mut finished: impl FnMut(&T) -> bool) -> Vec<SourceId> {
        let mut ended: Vec<SourceId> = self
            .sources
            .iter()
            .filter(|(_, source)| finished(source))
            .map(|(id, _)| *id)
            .collect();
        ended.sort();

        for id in &ended {
            self.sources.remove(id);
        }
        ended
    }

    /// Remove everything, for teardown
    pub fn drain_all(&mut self) -> impl Iterator<Item = T> + '_ {
        self.sources.drain().map(|(_, source)| source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct FakeVoice {
        remaining: u32,
    }

    #[test]
    fn test_ids_are_unique() {
        let mut table = SourceTable::new();
        let a = table.insert(FakeVoice { remaining: 1 });
        let b = table.insert(FakeVoice { remaining: 1 });
        table.remove(a);
        let c = table.insert(FakeVoice { remaining: 1 });

        assert_eq!((a, b, c), (SourceId(0), SourceId(1), SourceId(2)));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_stop_removes_once() {
        let mut table = SourceTable::new();
        let id = table.insert(FakeVoice { remaining: 3 });

        assert_eq!(table.remove(id), Some(FakeVoice { remaining: 3 }));
        assert_eq!(table.remove(id), None);
        assert!(table.is_empty());
    }

    #[test]
    fn test_drain_finished_reports_only_ended() {
        let mut table = SourceTable::new();
        let done = table.insert(FakeVoice { remaining: 0 });
        let playing = table.insert(FakeVoice { remaining: 5 });
        let also_done = table.insert(FakeVoice { remaining: 0 });

        assert_eq!(table.drain_finished(|v| v.remaining == 0), vec![done, also_done]);
        assert!(table.drain_finished(|v| v.remaining == 0).is_empty());
        assert_eq!(table.len(), 1);
        assert!(table.remove(playing).is_some());
    }

    #[test]
    fn test_drain_all_empties_table() {
        let mut table = SourceTable::new();
        table.insert(FakeVoice { remaining: 1 });
        table.insert(FakeVoice { remaining: 2 });

        assert_eq!(table.drain_all().count(), 2);
        assert!(table.is_empty());
    }
}
