use crate::partition::Partition;
use fnv::FnvHasher;
use std::borrow::Borrow;
use std::hash::{Hash, Hasher};

/// A concurrent bidirectional map split into independently locked partitions.
///
/// Every key is routed to one partition by an FNV-1a hash modulo the
/// partition count, which is fixed at construction. A partition guards its
/// forward map (`key -> value`) and its reverse map (`value -> key`) with one
/// reader/writer lock: writers take it exclusively, readers share it.
///
/// # Consistency
///
/// Operations are atomic within a single partition only. When a caller stores
/// two related entries under different keys (the shortener stores
/// `original -> code` and `code -> original`), the keys usually hash to
/// different partitions and a concurrent reader may observe the first entry
/// before the second becomes visible. The gap is a few instructions long and
/// closes without further action, so the bijection across keys is eventually
/// consistent rather than atomic. That is acceptable for this non-durable
/// backend; callers that need atomic cross-key commits must use a durable
/// store with transactional upserts.
#[derive(Debug)]
pub struct PartitionedMap<K, V> {
    partitions: Box<[Partition<K, V>]>,
}

impl<K, V> PartitionedMap<K, V>
where
    K: Hash + Eq + Clone,
    V: Hash + Eq + Clone,
{
    /// Creates a map with the given number of partitions (at least one).
    pub fn new(partitions: usize) -> Self {
        let partitions = (0..partitions.max(1)).map(|_| Partition::new()).collect();
        Self { partitions }
    }

    /// Creates a map sized for the machine: two partitions per logical CPU.
    pub fn with_default_partitions() -> Self {
        Self::new(Self::default_partition_count())
    }

    /// The partition count [`with_default_partitions`](Self::with_default_partitions) uses.
    pub fn default_partition_count() -> usize {
        num_cpus::get() * 2
    }

    /// Returns the number of partitions.
    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn set(&self, key: K, value: V) {
        self.partition(&key).set(key, value);
    }

    /// Stores `value` under `key` only if the key is vacant.
    ///
    /// Returns the value already stored (leaving it untouched), or `None`
    /// when the pair was inserted. The check and the insert happen under the
    /// partition's write lock, so exactly one of several racing callers wins.
    pub fn get_or_insert(&self, key: K, value: V) -> Option<V> {
        self.partition(&key).get_or_insert(key, value)
    }

    /// Removes `key` if it currently maps to `value`.
    ///
    /// Returns `true` if an entry was removed.
    pub fn remove_if<Q, R>(&self, key: &Q, value: &R) -> bool
    where
        K: Borrow<Q>,
        V: Borrow<R>,
        Q: Hash + Eq + ?Sized,
        R: Hash + Eq + ?Sized,
    {
        self.partition(key).remove_if(key, value)
    }

    /// Returns a copy of the value stored under `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.partition(key).get(key)
    }

    /// Returns the key that stores `value`.
    ///
    /// Reverse entries live in the partition of their key, which cannot be
    /// derived from the value, so this probes every partition.
    pub fn get_by_value<R>(&self, value: &R) -> Option<K>
    where
        V: Borrow<R>,
        R: Hash + Eq + ?Sized,
    {
        self.partitions
            .iter()
            .find_map(|partition| partition.get_by_value(value))
    }

    /// Returns the number of keys across all partitions.
    pub fn len(&self) -> usize {
        self.partitions.iter().map(Partition::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn partition<Q: Hash + ?Sized>(&self, key: &Q) -> &Partition<K, V> {
        &self.partitions[self.partition_index(key)]
    }

    fn partition_index<Q: Hash + ?Sized>(&self, key: &Q) -> usize {
        let mut hasher = FnvHasher::default();
        key.hash(&mut hasher);
        (hasher.finish() % self.partitions.len() as u64) as usize
    }
}

impl<K, V> Default for PartitionedMap<K, V>
where
    K: Hash + Eq + Clone,
    V: Hash + Eq + Clone,
{
    fn default() -> Self {
        Self::with_default_partitions()
    }
}
