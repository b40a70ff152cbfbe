//! Bounded parallel evaluation.
//!
//! [`WorkerPool`] runs a closure over every element of a slice on a fixed
//! number of scoped threads. Workers pull the next element from a shared
//! cursor, so slow episodes do not stall the rest of the batch. Each element is
//! visited by exactly one worker, and the call returns only after all workers
//! have finished.

use std::{
    num::NonZeroUsize,
    panic,
    sync::{Mutex, PoisonError},
    thread,
};

/// A fixed-size pool of evaluation workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerPool {
    workers: NonZeroUsize,
}

impl WorkerPool {
    /// Creates a pool with `workers` threads. Zero selects the number of
    /// available CPUs.
    #[must_use]
    pub fn new(workers: usize) -> Self {
        let workers = NonZeroUsize::new(workers)
            .or_else(|| thread::available_parallelism().ok())
            .unwrap_or(NonZeroUsize::MIN);
        Self { workers }
    }

    #[must_use]
    pub const fn workers(&self) -> usize {
        self.workers.get()
    }

    /// Applies `f` to every item, using at most [`workers`](Self::workers) threads.
    ///
    /// Returns the first error reported by any worker. Once an error has been
    /// seen, workers stop picking up new items.
    ///
    /// # Panics
    ///
    /// Re-raises a panic from `f` on the calling thread.
    ///
    /// # Example
    ///
    /// ```
    /// use serpentine_training::dispatch::WorkerPool;
    ///
    /// let mut values = vec![1, 2, 3, 4, 5];
    /// WorkerPool::new(2).try_for_each(&mut values, |v| {
    ///     *v *= 10;
    ///     Ok::<_, std::convert::Infallible>(())
    /// })?;
    /// assert_eq!(values, [10, 20, 30, 40, 50]);
    /// # Ok::<(), std::convert::Infallible>(())
    /// ```
    pub fn try_for_each<T, E, F>(&self, items: &mut [T], f: F) -> Result<(), E>
    where
        T: Send,
        E: Send,
        F: Fn(&mut T) -> Result<(), E> + Sync,
    {
        if items.is_empty() {
            return Ok(());
        }
        let workers = self.workers().min(items.len());
        let queue = Mutex::new(items.iter_mut());
        let failure = Mutex::new(None);

        thread::scope(|s| {
            let handles = (0..workers)
                .map(|_| {
                    s.spawn(|| {
                        loop {
                            if lock(&failure).is_some() {
                                break;
                            }
                            let Some(item) = lock(&queue).next() else {
                                break;
                            };
                            if let Err(err) = f(item) {
                                lock(&failure).get_or_insert(err);
                                break;
                            }
                        }
                    })
                })
                .collect::<Vec<_>>();
            for handle in handles {
                if let Err(payload) = handle.join() {
                    panic::resume_unwind(payload);
                }
            }
        });

        match failure.into_inner().unwrap_or_else(PoisonError::into_inner) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
