//! Memoization of subject tables, keyed by subject id and a fingerprint of the subject's stats files.
//!
//! A cache holds at most one entry per subject. An entry is only ever replaced as a whole, after
//! a complete recomputation, and the computation for one subject holds that subject's lock, so
//! concurrent requests for the same subject wait for the running one instead of racing it.

use log::{debug, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::atlas::SourceKey;
use crate::error::{FsStatsError, Result};
use crate::subject::{SubjectInput, SubjectTable};


/// A content hash of everything a subject table is computed from, as lower case hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute the fingerprint of a subject's stats files, together with the set of sources
    /// expected for it. File names and modification times play no role, only content does.
    /// The order in which the sources are supplied does not matter.
    pub fn of_subject(input: &SubjectInput, expected_sources: &BTreeSet<SourceKey>) -> Fingerprint {
        let mut hasher = Sha256::new();
        for key in expected_sources.iter() {
            hasher.update(key.hemisphere.code().as_bytes());
            hasher.update(key.atlas.name().as_bytes());
            hasher.update(b";");
        }
        hasher.update(b"|");

        let mut sources: Vec<_> = input.sources.iter().collect();
        sources.sort_by(|a, b| a.key.cmp(&b.key).then_with(|| a.content.cmp(&b.content)));
        for source in sources {
            hasher.update(source.key.hemisphere.code().as_bytes());
            hasher.update(source.key.atlas.name().as_bytes());
            hasher.update((source.content.len() as u64).to_le_bytes());
            hasher.update(&source.content);
        }

        Fingerprint(format!("{:x}", hasher.finalize()))
    }

    pub fn to_hex(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}


/// A stored subject table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub subject_id: String,
    pub fingerprint: Fingerprint,
    pub table: SubjectTable,
}


/// Storage for computed subject tables.
pub trait SubjectCache: Send + Sync {
    /// Return the stored table for the subject if its fingerprint matches. Otherwise run `compute`,
    /// store its result in place of any previous entry for the subject, and return it.
    ///
    /// If `compute` fails, nothing is stored and the error is returned.
    ///
    /// The subject's lock is held while `compute` runs and is not reentrant: `compute` must not
    /// request the same subject from this cache, not even from a rayon task it waits on.
    fn get_or_compute(
        &self,
        subject_id: &str,
        fingerprint: &Fingerprint,
        compute: &mut dyn FnMut() -> Result<SubjectTable>,
    ) -> Result<SubjectTable>;

    /// Drop the entry of the given subject, if any.
    fn invalidate(&self, subject_id: &str) -> Result<()>;
}


/// A cache which stores nothing and always computes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl SubjectCache for NoCache {
    fn get_or_compute(
        &self,
        _subject_id: &str,
        _fingerprint: &Fingerprint,
        compute: &mut dyn FnMut() -> Result<SubjectTable>,
    ) -> Result<SubjectTable> {
        compute()
    }

    fn invalidate(&self, _subject_id: &str) -> Result<()> {
        Ok(())
    }
}


type Slot<T> = Arc<Mutex<T>>;

/// Per-subject locks. The map lock is only held to look up a slot.
#[derive(Debug, Default)]
struct SubjectSlots<T> {
    slots: Mutex<HashMap<String, Slot<T>>>,
}

impl<T: Default> SubjectSlots<T> {
    fn slot(&self, subject_id: &str) -> Slot<T> {
        let mut slots = self.slots.lock();
        slots.entry(subject_id.to_string()).or_default().clone()
    }
}


/// An in-process cache.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: SubjectSlots<Option<CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> MemoryCache {
        MemoryCache::default()
    }

    /// The number of subjects with a stored table.
    pub fn len(&self) -> usize {
        let slots: Vec<Slot<Option<CacheEntry>>> = self.entries.slots.lock().values().cloned().collect();
        slots.iter().filter(|slot| slot.lock().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The stored entry of the given subject, if any.
    pub fn entry(&self, subject_id: &str) -> Option<CacheEntry> {
        self.entries.slot(subject_id).lock().clone()
    }
}

impl SubjectCache for MemoryCache {
    fn get_or_compute(
        &self,
        subject_id: &str,
        fingerprint: &Fingerprint,
        compute: &mut dyn FnMut() -> Result<SubjectTable>,
    ) -> Result<SubjectTable> {
        let slot = self.entries.slot(subject_id);
        let mut entry = slot.lock();
        if let Some(stored) = entry.as_ref() {
            if stored.fingerprint == *fingerprint {
                debug!("Cache hit for subject {}", subject_id);
                return Ok(stored.table.clone());
            }
            debug!("Fingerprint of subject {} changed, recomputing", subject_id);
        }
        let table = compute()?;
        *entry = Some(CacheEntry {
            subject_id: subject_id.to_string(),
            fingerprint: fingerprint.clone(),
            table: table.clone(),
        });
        Ok(table)
    }

    fn invalidate(&self, subject_id: &str) -> Result<()> {
        *self.entries.slot(subject_id).lock() = None;
        Ok(())
    }
}


/// A cache keeping one JSON file per subject in a directory, so that results survive the process.
///
/// Entries are written to a temporary file first and then renamed into place, so a reader never
/// sees a partly written entry. Entries which cannot be read are treated as absent.
#[derive(Debug)]
pub struct DiskCache {
    dir: PathBuf,
    locks: SubjectSlots<()>,
}

impl DiskCache {
    /// Open a cache directory, creating it if needed.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<DiskCache> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .map_err(|e| FsStatsError::CacheUnavailable(format!("cannot create cache directory {}: {}", dir.display(), e)))?;
        Ok(DiskCache { dir, locks: SubjectSlots::default() })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The file holding the entry of the given subject, named by the SHA-256 of the subject id
    /// so that every id gets its own file.
    pub fn entry_path(&self, subject_id: &str) -> PathBuf {
        self.dir.join(format!("{:x}.json", Sha256::digest(subject_id.as_bytes())))
    }

    fn load(&self, subject_id: &str) -> Option<CacheEntry> {
        let path = self.entry_path(subject_id);
        let content = match fs::read(&path) {
            Ok(content) => content,
            Err(e) => {
                if e.kind() != ErrorKind::NotFound {
                    warn!("Cannot read cache entry {}: {}", path.display(), e);
                }
                return None;
            }
        };
        match serde_json::from_slice::<CacheEntry>(&content) {
            Ok(entry) if entry.subject_id == subject_id => Some(entry),
            Ok(_) => None,
            Err(e) => {
                warn!("Ignoring invalid cache entry {}: {}", path.display(), e);
                None
            }
        }
    }

    fn store(&self, entry: &CacheEntry) -> Result<()> {
        let path = self.entry_path(&entry.subject_id);
        let tmp_path = path.with_extension("json.tmp");
        let content = serde_json::to_vec(entry)?;
        fs::write(&tmp_path, content)
            .and_then(|_| fs::rename(&tmp_path, &path))
            .map_err(|e| FsStatsError::CacheUnavailable(format!("cannot write cache entry {}: {}", path.display(), e)))
    }
}

impl SubjectCache for DiskCache {
    fn get_or_compute(
        &self,
        subject_id: &str,
        fingerprint: &Fingerprint,
        compute: &mut dyn FnMut() -> Result<SubjectTable>,
    ) -> Result<SubjectTable> {
        let lock = self.locks.slot(subject_id);
        let _guard = lock.lock();
        if let Some(stored) = self.load(subject_id) {
            if stored.fingerprint == *fingerprint {
                debug!("Disk cache hit for subject {}", subject_id);
                return Ok(stored.table);
            }
        }
        let entry = CacheEntry {
            subject_id: subject_id.to_string(),
            fingerprint: fingerprint.clone(),
            table: compute()?,
        };
        self.store(&entry)?;
        Ok(entry.table)
    }

    fn invalidate(&self, subject_id: &str) -> Result<()> {
        let lock = self.locks.slot(subject_id);
        let _guard = lock.lock();
        let path = self.entry_path(subject_id);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(FsStatsError::CacheUnavailable(format!("cannot remove cache entry {}: {}", path.display(), e))),
        }
    }
}


#[cfg(test)]
mod test {
    use super::*;
    use crate::atlas::{Atlas, Hemisphere};
    use crate::subject::StatsSource;
    use std::cell::Cell;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::tempdir;

    fn table(subject_id: &str) -> SubjectTable {
        SubjectTable {
            subject_id: subject_id.to_string(),
            records: Vec::new(),
            present_sources: BTreeSet::new(),
            missing_sources: BTreeSet::new(),
            parse_errors: Vec::new(),
            duplicate_errors: Vec::new(),
        }
    }

    fn input(content: &str) -> SubjectInput {
        SubjectInput::new("sub-01").with_source(StatsSource::new(Hemisphere::Left, Atlas::Desikan, content).unwrap())
    }

    #[test]
    fn fingerprints_depend_on_content_only() {
        let expected: BTreeSet<SourceKey> = SourceKey::all_for(Atlas::Desikan).into_iter().collect();
        let a = Fingerprint::of_subject(&input("insula 1"), &expected);
        let b = Fingerprint::of_subject(&input("insula 1"), &expected);
        let c = Fingerprint::of_subject(&input("insula 2"), &expected);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(64, a.to_hex().len());

        let fewer: BTreeSet<SourceKey> = BTreeSet::new();
        assert_ne!(a, Fingerprint::of_subject(&input("insula 1"), &fewer));
    }

    #[test]
    fn fingerprints_ignore_source_order() {
        let lh = StatsSource::new(Hemisphere::Left, Atlas::Desikan, "a").unwrap();
        let rh = StatsSource::new(Hemisphere::Right, Atlas::Desikan, "b").unwrap();
        let expected = BTreeSet::new();
        let forward = SubjectInput::new("s").with_source(lh.clone()).with_source(rh.clone());
        let backward = SubjectInput::new("s").with_source(rh).with_source(lh);
        assert_eq!(Fingerprint::of_subject(&forward, &expected), Fingerprint::of_subject(&backward, &expected));
    }

    #[test]
    fn memory_cache_computes_once_per_fingerprint() {
        let cache = MemoryCache::new();
        let expected = BTreeSet::new();
        let fp1 = Fingerprint::of_subject(&input("one"), &expected);
        let fp2 = Fingerprint::of_subject(&input("two"), &expected);
        let calls = Cell::new(0);
        let mut compute = || -> Result<SubjectTable> {
            calls.set(calls.get() + 1);
            Ok(table("sub-01"))
        };

        cache.get_or_compute("sub-01", &fp1, &mut compute).unwrap();
        cache.get_or_compute("sub-01", &fp1, &mut compute).unwrap();
        assert_eq!(1, calls.get());

        cache.get_or_compute("sub-01", &fp2, &mut compute).unwrap();
        assert_eq!(2, calls.get());
        assert_eq!(1, cache.len());
        assert_eq!(Some(fp2.clone()), cache.entry("sub-01").map(|e| e.fingerprint));

        cache.get_or_compute("sub-01", &fp2, &mut compute).unwrap();
        assert_eq!(2, calls.get());
    }

    #[test]
    fn failed_computations_are_not_stored() {
        let cache = MemoryCache::new();
        let fp = Fingerprint::of_subject(&input("one"), &BTreeSet::new());
        let res = cache.get_or_compute("sub-01", &fp, &mut || Err(FsStatsError::Cancelled));
        assert!(matches!(res, Err(FsStatsError::Cancelled)));
        assert!(cache.is_empty());
    }

    #[test]
    fn invalidation_forces_recomputation() {
        let cache = MemoryCache::new();
        let fp = Fingerprint::of_subject(&input("one"), &BTreeSet::new());
        let calls = Cell::new(0);
        let mut compute = || -> Result<SubjectTable> {
            calls.set(calls.get() + 1);
            Ok(table("sub-01"))
        };
        cache.get_or_compute("sub-01", &fp, &mut compute).unwrap();
        cache.invalidate("sub-01").unwrap();
        cache.get_or_compute("sub-01", &fp, &mut compute).unwrap();
        assert_eq!(2, calls.get());
    }

    #[test]
    fn no_cache_always_computes() {
        let fp = Fingerprint::of_subject(&input("one"), &BTreeSet::new());
        let calls = Cell::new(0);
        let mut compute = || -> Result<SubjectTable> {
            calls.set(calls.get() + 1);
            Ok(table("sub-01"))
        };
        NoCache.get_or_compute("sub-01", &fp, &mut compute).unwrap();
        NoCache.get_or_compute("sub-01", &fp, &mut compute).unwrap();
        assert_eq!(2, calls.get());
    }

    #[test]
    fn disk_cache_survives_reopening() {
        let dir = tempdir().unwrap();
        let fp = Fingerprint::of_subject(&input("one"), &BTreeSet::new());
        let calls = Cell::new(0);
        let mut compute = || -> Result<SubjectTable> {
            calls.set(calls.get() + 1);
            Ok(table("sub-01"))
        };

        {
            let cache = DiskCache::open(dir.path().join("cache")).unwrap();
            cache.get_or_compute("sub-01", &fp, &mut compute).unwrap();
            assert!(cache.entry_path("sub-01").is_file());
        }
        let cache = DiskCache::open(dir.path().join("cache")).unwrap();
        let stored = cache.get_or_compute("sub-01", &fp, &mut compute).unwrap();
        assert_eq!(1, calls.get());
        assert_eq!("sub-01", stored.subject_id);

        let other = Fingerprint::of_subject(&input("two"), &BTreeSet::new());
        cache.get_or_compute("sub-01", &other, &mut compute).unwrap();
        assert_eq!(2, calls.get());
    }

    #[test]
    fn corrupt_disk_entries_are_misses() {
        let dir = tempdir().unwrap();
        let cache = DiskCache::open(dir.path()).unwrap();
        fs::write(cache.entry_path("sub-01"), "not json").unwrap();
        let fp = Fingerprint::of_subject(&input("one"), &BTreeSet::new());
        let stored = cache.get_or_compute("sub-01", &fp, &mut || Ok(table("sub-01"))).unwrap();
        assert_eq!("sub-01", stored.subject_id);
        assert!(cache.load("sub-01").is_some());

        cache.invalidate("sub-01").unwrap();
        assert!(!cache.entry_path("sub-01").exists());
        cache.invalidate("sub-01").unwrap();
    }

    #[test]
    fn similar_subject_ids_get_separate_disk_entries() {
        let dir = tempdir().unwrap();
        let cache = DiskCache::open(dir.path()).unwrap();
        assert_ne!(cache.entry_path("sub 01"), cache.entry_path("sub_01"));
        assert_ne!(cache.entry_path("sub/01"), cache.entry_path("sub_01"));

        let fp = Fingerprint::of_subject(&input("one"), &BTreeSet::new());
        let calls = Cell::new(0);
        for _ in 0..3 {
            for id in ["sub 01", "sub_01"].iter() {
                let stored = cache
                    .get_or_compute(id, &fp, &mut || -> Result<SubjectTable> {
                        calls.set(calls.get() + 1);
                        Ok(table(id))
                    })
                    .unwrap();
                assert_eq!(*id, stored.subject_id);
            }
        }
        assert_eq!(2, calls.get());
    }

    #[test]
    fn a_table_with_a_rejected_nan_row_is_cached_once() {
        let dir = tempdir().unwrap();
        let cache = DiskCache::open(dir.path()).unwrap();
        let subject = SubjectInput::new("sub-01").with_source(
            StatsSource::new(Hemisphere::Left, Atlas::Desikan, "# ColHeaders StructName ThickAvg ThickStd\ninsula 2.9 nan\n").unwrap(),
        );
        let collector = crate::subject::SubjectCollector::new(BTreeSet::new());
        let fp = Fingerprint::of_subject(&subject, collector.expected_sources());
        let calls = Cell::new(0);

        let mut last = None;
        for _ in 0..3 {
            let stored = cache
                .get_or_compute("sub-01", &fp, &mut || -> Result<SubjectTable> {
                    calls.set(calls.get() + 1);
                    Ok(collector.collect(&subject))
                })
                .unwrap();
            last = Some(stored);
        }
        assert_eq!(1, calls.get());
        let stored = last.unwrap();
        assert_eq!(1, stored.parse_errors.len());
        assert!(stored.records.is_empty());
        assert_eq!(stored, stored.clone());
    }

    fn check_concurrent_requests_compute_once(cache: &dyn SubjectCache) {
        let fp = Fingerprint::of_subject(&input("one"), &BTreeSet::new());
        let calls = AtomicUsize::new(0);
        let (fp, calls) = (&fp, &calls);
        let results: Vec<SubjectTable> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(move || {
                        cache
                            .get_or_compute("sub-01", fp, &mut || -> Result<SubjectTable> {
                                calls.fetch_add(1, Ordering::SeqCst);
                                std::thread::sleep(Duration::from_millis(20));
                                Ok(table("sub-01"))
                            })
                            .unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(1, calls.load(Ordering::SeqCst));
        assert_eq!(8, results.len());
        assert!(results.iter().all(|r| *r == results[0]));
    }

    #[test]
    fn concurrent_requests_for_one_subject_compute_once() {
        check_concurrent_requests_compute_once(&MemoryCache::new());

        let dir = tempdir().unwrap();
        check_concurrent_requests_compute_once(&DiskCache::open(dir.path()).unwrap());
    }

    #[test]
    fn unusable_cache_directories_are_fatal() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("occupied");
        fs::write(&file, "x").unwrap();
        assert!(matches!(DiskCache::open(&file), Err(FsStatsError::CacheUnavailable(_))));
    }
}
