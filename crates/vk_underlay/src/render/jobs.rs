//! Render-thread job queue
//!
//! Destruction of GPU resources may be requested from outside the render
//! thread (scene invalidation), but must not happen while an in-flight frame
//! still references them. Cleanup is therefore posted here as a one-shot job
//! and executed by the host on the render thread before its next
//! synchronization point.

use std::sync::Mutex;

type RenderJob = Box<dyn FnOnce() + Send>;

/// Queue of one-shot jobs consumed on the render thread.
#[derive(Default)]
pub struct RenderJobQueue {
    jobs: Mutex<Vec<RenderJob>>,
}

impl RenderJobQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a job. May be called from any thread.
    pub fn schedule(&self, job: impl FnOnce() + Send + 'static) {
        self.jobs.lock().unwrap().push(Box::new(job));
    }

    /// Run and drop all pending jobs. The host must call this on the render
    /// thread, before its next synchronization point.
    pub fn run_pending(&self) {
        let jobs = std::mem::take(&mut *self.jobs.lock().unwrap());
        for job in jobs {
            job();
        }
    }

    /// Number of jobs waiting to run
    pub fn pending(&self) -> usize {
        self.jobs.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn jobs_run_once_in_order() {
        let queue = RenderJobQueue::new();
        let counter = Arc::new(AtomicUsize::new(0));

        for expected in 0..3 {
            let counter = Arc::clone(&counter);
            queue.schedule(move || {
                assert_eq!(counter.fetch_add(1, Ordering::SeqCst), expected);
            });
        }
        assert_eq!(queue.pending(), 3);

        queue.run_pending();
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(queue.pending(), 0);

        // Draining again is a no-op.
        queue.run_pending();
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn schedule_is_thread_safe() {
        let queue = Arc::new(RenderJobQueue::new());
        let counter = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let queue = Arc::clone(&queue);
                let counter = Arc::clone(&counter);
                std::thread::spawn(move || {
                    queue.schedule(move || {
                        counter.fetch_add(1, Ordering::SeqCst);
                    });
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        queue.run_pending();
        assert_eq!(counter.load(Ordering::SeqCst), 4);
    }
}
