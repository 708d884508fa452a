use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default)]
pub struct DisjointSet<T>
where
    T: Ord,
{
    //Maps an item into the index of "entries" containing everything it is joined with
    map: BTreeMap<T, usize>,
    entries: Vec<BTreeSet<T>>,
}

impl<T> DisjointSet<T>
where
    T: Ord + Clone,
{
    pub fn new() -> Self {
        Self {
            map: BTreeMap::new(),
            entries: vec![],
        }
    }

    /// Record that p1 and p2 belong to the same set, merging any sets they already belong to.
    pub fn insert(&mut self, p1: T, p2: T) {
        let (p1_idx, p2_idx) = (self.map.get(&p1).copied(), self.map.get(&p2).copied());

        //If we're lucky, both entries might already be in the same group. If so then
        //there is nothing to do.
        if p1_idx.is_some() && p1_idx == p2_idx {
            return;
        }

        match (p1_idx, p2_idx) {
            //no existing entry found, so add a new one
            (None, None) => self.insert_known_new_entry([p1, p2]),

            //one entry found, so append to it
            (None, Some(idx)) | (Some(idx), None) => self.append_to_entry(idx, [p1, p2]),

            //one entry found for each item, so merge them
            (Some(idx_1), Some(idx_2)) => self.merge_entries(idx_1, idx_2),
        }
    }

    fn append_to_entry(&mut self, idx: usize, items: impl IntoIterator<Item = T>) {
        for item in items {
            self.entries[idx].insert(item.clone());
            self.map.insert(item, idx);
        }
    }

    fn insert_known_new_entry(&mut self, items: impl IntoIterator<Item = T>) {
        //the new entry will go at the back of the entry list
        let idx = self.entries.len();
        self.entries.push(BTreeSet::new());
        self.append_to_entry(idx, items);
    }

    //merge the higher-numbered entry into the lower one. The emptied entry stays in place so
    //that no other indices move; empty entries are skipped when the sets are read out.
    fn merge_entries(&mut self, idx_1: usize, idx_2: usize) {
        let (preserve_idx, remove_idx) = if idx_1 < idx_2 {
            (idx_1, idx_2)
        } else {
            (idx_2, idx_1)
        };

        let moved = std::mem::take(&mut self.entries[remove_idx]);
        self.append_to_entry(preserve_idx, moved);
    }

    /// Whether the item has been joined with anything.
    #[cfg(test)]
    pub fn contains(&self, item: &T) -> bool {
        self.map.contains_key(item)
    }

    /// The set containing item, if it has been joined with anything.
    pub fn set_of(&self, item: &T) -> Option<&BTreeSet<T>> {
        self.map.get(item).map(|idx| &self.entries[*idx])
    }

    /// All non-empty sets.
    #[cfg(test)]
    pub fn sets(&self) -> impl Iterator<Item = &BTreeSet<T>> {
        self.entries.iter().filter(|e| !e.is_empty())
    }
}
