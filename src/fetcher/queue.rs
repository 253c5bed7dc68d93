//! Concurrency-limited batch executor
//!
//! Runs a batch of requests with at most `concurrency_limit` in flight. As soon
//! as one finishes, success or failure, the next not-yet-started request takes
//! its slot. Results come back index-aligned with the input, and a failure
//! never cancels its siblings.

use futures::stream::{self, StreamExt};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::metrics;

/// Batch executor with a fixed concurrency limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundedRequestQueue {
    concurrency_limit: usize,
}

impl BoundedRequestQueue {
    /// Create a queue; a limit of 0 is clamped to 1
    pub fn new(concurrency_limit: usize) -> Self {
        Self {
            concurrency_limit: concurrency_limit.max(1),
        }
    }

    /// Create a queue from a signed limit; zero and negative values clamp to 1
    pub fn from_signed(concurrency_limit: i64) -> Self {
        Self::new(usize::try_from(concurrency_limit).unwrap_or(1))
    }

    /// Effective concurrency limit
    pub fn concurrency_limit(&self) -> usize {
        self.concurrency_limit
    }

    /// Run `op` over every request.
    ///
    /// The returned vector has one entry per request, at the request's index,
    /// regardless of completion order. An empty batch returns immediately
    /// without invoking `op`.
    pub async fn run<Req, Res, Err, F, Fut>(&self, requests: Vec<Req>, op: F) -> Vec<Result<Res, Err>>
    where
        F: Fn(Req) -> Fut,
        Fut: Future<Output = Result<Res, Err>>,
    {
        if requests.is_empty() {
            return Vec::new();
        }

        let in_flight = AtomicUsize::new(0);
        let in_flight = &in_flight;
        let op = &op;

        let mut completed: Vec<(usize, Result<Res, Err>)> = stream::iter(requests.into_iter().enumerate())
            .map(|(index, request)| async move {
                let started = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                metrics::set_queue_in_flight(started);

                let result = op(request).await;

                let remaining = in_flight.fetch_sub(1, Ordering::SeqCst) - 1;
                metrics::set_queue_in_flight(remaining);
                (index, result)
            })
            .buffer_unordered(self.concurrency_limit)
            .collect()
            .await;

        completed.sort_unstable_by_key(|(index, _)| *index);
        completed.into_iter().map(|(_, result)| result).collect()
    }
}

impl Default for BoundedRequestQueue {
    fn default() -> Self {
        Self::new(1)
    }
}
