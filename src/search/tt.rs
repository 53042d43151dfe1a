use cozy_chess::Move;

/// Bound kind of a stored score.
///
/// `Pv` entries hold exact scores, `Cut` entries lower bounds (the node
/// failed high), `All` entries upper bounds (every move failed low).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeType {
    Pv,
    Cut,
    All,
}

impl NodeType {
    /// Keep priority under replacement: PV > CUT > ALL.
    fn keep_rank(self) -> u8 {
        match self {
            NodeType::Pv => 2,
            NodeType::Cut => 1,
            NodeType::All => 0,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Entry {
    pub key: u64,
    /// Best or refuting move; None for all-nodes.
    pub m: Option<Move>,
    pub score: i32,
    pub depth: i32,
    pub node_type: NodeType,
    /// Root move number of the writing search, for age-based replacement.
    pub age: u16,
}

const BUCKET_WAYS: usize = 4;
pub const DEFAULT_SIZE_MB: usize = 16;

/// Fixed-capacity transposition table, four entries per bucket.
///
/// Single-writer by design: the search is single-threaded, so no internal
/// synchronization is needed. Capacity is fixed at construction.
pub struct Tt {
    buckets: Vec<[Option<Entry>; BUCKET_WAYS]>,
    occupied: usize,
}

impl Tt {
    pub fn new(megabytes: usize) -> Self {
        let entry_bytes = std::mem::size_of::<Option<Entry>>();
        let entries = (megabytes.max(1) * 1024 * 1024 / entry_bytes).max(BUCKET_WAYS);
        let buckets = entries / BUCKET_WAYS;
        Self { buckets: vec![[None; BUCKET_WAYS]; buckets], occupied: 0 }
    }

    pub fn clear(&mut self) {
        for b in &mut self.buckets {
            *b = [None; BUCKET_WAYS];
        }
        self.occupied = 0;
    }

    pub fn capacity(&self) -> usize {
        self.buckets.len() * BUCKET_WAYS
    }

    /// Permille of slots in use, as reported on UCI info lines.
    pub fn hashfull(&self) -> usize {
        1000 * self.occupied / self.capacity()
    }

    fn bucket_index(&self, key: u64) -> usize {
        let mixed = key ^ (key >> 32);
        (mixed as usize) % self.buckets.len()
    }

    pub fn get(&self, key: u64) -> Option<Entry> {
        let idx = self.bucket_index(key);
        for slot in &self.buckets[idx] {
            if let Some(e) = slot {
                if e.key == key {
                    return Some(*e);
                }
            }
        }
        None
    }

    /// Store an entry. Within a bucket the victim is chosen by age first
    /// (entries from older searches go before current ones), then by depth
    /// (shallower goes first), then by node type (ALL before CUT before PV).
    pub fn put(&mut self, e: Entry) {
        let idx = self.bucket_index(e.key);
        let bucket = &mut self.buckets[idx];

        for slot in bucket.iter_mut() {
            if let Some(cur) = slot {
                if cur.key == e.key {
                    if e.depth >= cur.depth || e.age != cur.age {
                        *slot = Some(e);
                    }
                    return;
                }
            }
        }
        for slot in bucket.iter_mut() {
            if slot.is_none() {
                *slot = Some(e);
                self.occupied += 1;
                return;
            }
        }

        let mut victim = 0;
        let mut victim_rank = (u8::MAX, i32::MAX, u8::MAX);
        for (i, slot) in bucket.iter().enumerate() {
            if let Some(cur) = slot {
                let rank = ((cur.age == e.age) as u8, cur.depth, cur.node_type.keep_rank());
                if rank < victim_rank {
                    victim_rank = rank;
                    victim = i;
                }
            }
        }
        bucket[victim] = Some(e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: u64, depth: i32, node_type: NodeType, age: u16) -> Entry {
        Entry { key, m: None, score: 0, depth, node_type, age }
    }

    /// A table sized for exactly one bucket, so eviction is forced.
    fn tiny() -> Tt {
        let mut tt = Tt::new(1);
        tt.buckets = vec![[None; BUCKET_WAYS]];
        tt
    }

    #[test]
    fn get_returns_what_was_put() {
        let mut tt = Tt::new(1);
        tt.put(entry(42, 5, NodeType::Pv, 1));
        let e = tt.get(42).expect("entry must be present");
        assert_eq!(e.depth, 5);
        assert_eq!(e.node_type, NodeType::Pv);
        assert!(tt.get(43).is_none());
    }

    #[test]
    fn stale_age_is_evicted_first() {
        let mut tt = tiny();
        tt.put(entry(1, 9, NodeType::Pv, 1));
        tt.put(entry(2, 5, NodeType::Cut, 2));
        tt.put(entry(3, 5, NodeType::Cut, 2));
        tt.put(entry(4, 5, NodeType::Cut, 2));
        // Full bucket; key 1 is deep but from an old search
        tt.put(entry(5, 1, NodeType::All, 2));
        assert!(tt.get(1).is_none(), "stale entry must go first");
        assert!(tt.get(5).is_some());
    }

    #[test]
    fn shallowest_same_age_is_evicted() {
        let mut tt = tiny();
        tt.put(entry(1, 9, NodeType::Cut, 1));
        tt.put(entry(2, 2, NodeType::Cut, 1));
        tt.put(entry(3, 7, NodeType::Cut, 1));
        tt.put(entry(4, 5, NodeType::Cut, 1));
        tt.put(entry(5, 6, NodeType::Cut, 1));
        assert!(tt.get(2).is_none(), "shallowest entry must go");
        assert!(tt.get(1).is_some());
    }

    #[test]
    fn node_type_breaks_depth_ties() {
        let mut tt = tiny();
        tt.put(entry(1, 5, NodeType::Pv, 1));
        tt.put(entry(2, 5, NodeType::All, 1));
        tt.put(entry(3, 5, NodeType::Cut, 1));
        tt.put(entry(4, 9, NodeType::Cut, 1));
        tt.put(entry(5, 5, NodeType::Cut, 1));
        assert!(tt.get(2).is_none(), "all-node must go before cut/pv at equal depth");
        assert!(tt.get(1).is_some());
    }

    #[test]
    fn same_key_updates_in_place() {
        let mut tt = Tt::new(1);
        tt.put(entry(7, 3, NodeType::All, 1));
        tt.put(entry(7, 6, NodeType::Pv, 1));
        let e = tt.get(7).expect("entry must be present");
        assert_eq!(e.depth, 6);
        assert_eq!(tt.hashfull() > 0, true);
    }

    #[test]
    fn shallower_same_key_same_age_is_kept_out() {
        let mut tt = Tt::new(1);
        tt.put(entry(7, 6, NodeType::Pv, 1));
        tt.put(entry(7, 3, NodeType::All, 1));
        assert_eq!(tt.get(7).map(|e| e.depth), Some(6));
    }

    #[test]
    fn hashfull_counts_occupancy() {
        let mut tt = Tt::new(1);
        assert_eq!(tt.hashfull(), 0);
        for k in 0..(tt.capacity() as u64 / 2) {
            tt.put(entry(k.wrapping_mul(0x9E37_79B9_7F4A_7C15), 1, NodeType::All, 1));
        }
        assert!(tt.hashfull() > 300, "half-filled table, got {}", tt.hashfull());
    }
}
