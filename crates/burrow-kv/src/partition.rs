use parking_lot::RwLock;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug)]
struct Buckets<K, V> {
    forward: HashMap<K, V>,
    reverse: HashMap<V, K>,
}

/// One shard of a [`PartitionedMap`](crate::PartitionedMap).
///
/// Both maps live behind the same lock, so the bijection between them holds
/// for every reader of this partition.
#[derive(Debug)]
pub(crate) struct Partition<K, V> {
    buckets: RwLock<Buckets<K, V>>,
}

impl<K, V> Partition<K, V>
where
    K: Hash + Eq + Clone,
    V: Hash + Eq + Clone,
{
    pub(crate) fn new() -> Self {
        Self {
            buckets: RwLock::new(Buckets {
                forward: HashMap::new(),
                reverse: HashMap::new(),
            }),
        }
    }

    pub(crate) fn set(&self, key: K, value: V) {
        let mut buckets = self.buckets.write();
        Self::insert_pair(&mut buckets, key, value);
    }

    pub(crate) fn get_or_insert(&self, key: K, value: V) -> Option<V> {
        let mut buckets = self.buckets.write();
        if let Some(existing) = buckets.forward.get(&key) {
            return Some(existing.clone());
        }
        Self::insert_pair(&mut buckets, key, value);
        None
    }

    pub(crate) fn remove_if<Q, R>(&self, key: &Q, value: &R) -> bool
    where
        K: Borrow<Q>,
        V: Borrow<R>,
        Q: Hash + Eq + ?Sized,
        R: Hash + Eq + ?Sized,
    {
        let mut buckets = self.buckets.write();
        match buckets.forward.get(key) {
            Some(current) if <V as Borrow<R>>::borrow(current) == value => {}
            _ => return false,
        }

        buckets.forward.remove(key);
        if buckets
            .reverse
            .get(value)
            .is_some_and(|owner| <K as Borrow<Q>>::borrow(owner) == key)
        {
            buckets.reverse.remove(value);
        }
        true
    }

    pub(crate) fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.buckets.read().forward.get(key).cloned()
    }

    pub(crate) fn get_by_value<R>(&self, value: &R) -> Option<K>
    where
        V: Borrow<R>,
        R: Hash + Eq + ?Sized,
    {
        self.buckets.read().reverse.get(value).cloned()
    }

    pub(crate) fn len(&self) -> usize {
        self.buckets.read().forward.len()
    }

    // The stale reverse entry of an overwritten key goes first, otherwise the
    // old value would keep pointing at a key that no longer owns it.
    fn insert_pair(buckets: &mut Buckets<K, V>, key: K, value: V) {
        if let Some(old) = buckets.forward.insert(key.clone(), value.clone()) {
            if buckets.reverse.get(&old) == Some(&key) {
                buckets.reverse.remove(&old);
            }
        }
        buckets.reverse.insert(value, key);
    }
}
