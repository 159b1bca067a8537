//! Bounded, order-preserving fan-out over scoped threads
//!
//! Items are split into at most `workers` contiguous chunks. Each worker
//! returns its own results and the chunks are concatenated in input order,
//! so callers see the same sequence a sequential loop would produce.

use std::num::NonZeroUsize;
use std::thread;

/// Upper bound for the default worker count.
pub const MAX_DEFAULT_JOBS: usize = 8;

/// Available parallelism, capped at [`MAX_DEFAULT_JOBS`].
pub fn default_jobs() -> usize {
    thread::available_parallelism()
        .map_or(1, NonZeroUsize::get)
        .min(MAX_DEFAULT_JOBS)
}

/// Apply `f` to every item using up to `workers` threads.
pub fn map_ordered<T, R, F>(items: &[T], workers: usize, f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync,
{
    let workers = workers.clamp(1, items.len().max(1));
    if workers == 1 {
        return items.iter().map(&f).collect();
    }

    let chunk_size = items.len().div_ceil(workers);
    let f = &f;

    thread::scope(|scope| {
        let handles: Vec<_> = items
            .chunks(chunk_size)
            .map(|chunk| scope.spawn(move || chunk.iter().map(f).collect::<Vec<R>>()))
            .collect();

        handles
            .into_iter()
            .flat_map(|handle| match handle.join() {
                Ok(results) => results,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    #[test]
    fn test_preserves_order() {
        let items: Vec<u32> = (0..37).collect();
        let results = map_ordered(&items, 4, |n| n * 2);
        assert_eq!(results, items.iter().map(|n| n * 2).collect::<Vec<_>>());
    }

    #[test]
    fn test_sequential_and_empty() {
        let items = vec!["a", "b"];
        assert_eq!(map_ordered(&items, 1, |s| s.len()), vec![1, 1]);
        let empty: Vec<u8> = Vec::new();
        assert!(map_ordered(&empty, 8, |b| *b).is_empty());
    }

    #[test]
    fn test_worker_count_is_bounded() {
        let items: Vec<u32> = (0..64).collect();
        let threads = Mutex::new(HashSet::new());
        map_ordered(&items, 3, |_| {
            threads.lock().unwrap().insert(thread::current().id());
        });
        assert!(threads.lock().unwrap().len() <= 3);
    }

    #[test]
    fn test_default_jobs_is_capped() {
        let jobs = default_jobs();
        assert!((1..=MAX_DEFAULT_JOBS).contains(&jobs));
    }
}
