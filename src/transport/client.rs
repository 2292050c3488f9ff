//! Best-effort event delivery with a hard deadline.
//!
//! `send` never blocks and never fails: it serializes the event, queues it
//! with a deadline armed at call time, and returns `true` straight away.
//! One dispatcher task per transport starts the requests in queue order,
//! then races each one against its own deadline in a detached task.
//! Whatever happens (success, rejection, abort) is logged at debug level
//! and dropped.

use super::fetch::{HttpFetch, PostRequest};
use crate::payload::schema::Event;
use crate::utils::config::{DEFAULT_TIMEOUT, JSON_CONTENT_TYPE};
use crate::utils::error::TransportError;
use log::debug;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::task::Poll;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, Notify};
use tokio::time::Instant;

type PendingPost = Pin<Box<dyn Future<Output = Result<u16, TransportError>> + Send>>;

/// Outcome of one delivery attempt, observed only inside the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Endpoint answered with a 2xx status
    Delivered(u16),
    /// Network failure or non-2xx status
    Failed(String),
    /// Deadline fired before the fetch settled
    TimedOut,
}

/// Stateful sender bound to one endpoint
pub struct Transport {
    dsn: String,
    timeout: Duration,
    fetch: Arc<dyn HttpFetch>,
    queue: OnceLock<mpsc::UnboundedSender<Dispatch>>,
    in_flight: Arc<InFlight>,
}

impl Transport {
    /// Create a transport with the default 5s deadline
    ///
    /// Starts the dispatcher on the ambient tokio runtime, if any. Otherwise
    /// it starts on the runtime of the first `send` that has one.
    pub fn new(dsn: impl Into<String>, fetch: Arc<dyn HttpFetch>) -> Self {
        Self::with_timeout(dsn, fetch, DEFAULT_TIMEOUT)
    }

    /// Create a transport with a custom deadline
    pub fn with_timeout(
        dsn: impl Into<String>,
        fetch: Arc<dyn HttpFetch>,
        timeout: Duration,
    ) -> Self {
        let queue = OnceLock::new();
        if let Ok(runtime) = Handle::try_current() {
            let _ = queue.set(start_dispatcher(&runtime, Arc::clone(&fetch)));
        }

        Self {
            dsn: dsn.into(),
            timeout,
            fetch,
            queue,
            in_flight: Arc::new(InFlight::default()),
        }
    }

    pub fn dsn(&self) -> &str {
        &self.dsn
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Number of deliveries that have not settled yet
    pub fn pending(&self) -> usize {
        self.in_flight.count.load(Ordering::SeqCst)
    }

    /// Hand an event off for delivery
    ///
    /// **Public** - main entry point for delivery
    ///
    /// # Returns
    /// Always `true`: the send was initiated. This is not a delivery
    /// acknowledgment; failures are swallowed.
    ///
    /// Requests reach the network in the order `send` is called.
    pub fn send(&self, event: &Event) -> bool {
        let body = match serde_json::to_string(event) {
            Ok(body) => body,
            Err(e) => {
                debug!("Dropping event: {}", TransportError::Serialization(e));
                return true;
            }
        };

        let queue = match self.queue.get() {
            Some(queue) => queue,
            None => {
                let Ok(runtime) = Handle::try_current() else {
                    debug!("Dropping event: {}", TransportError::NoRuntime);
                    return true;
                };
                self.queue
                    .get_or_init(|| start_dispatcher(&runtime, Arc::clone(&self.fetch)))
            }
        };

        let dispatch = Dispatch {
            request: self.request(body),
            deadline: Instant::now() + self.timeout,
            guard: InFlightGuard::enter(Arc::clone(&self.in_flight)),
        };

        // Fails only once the dispatcher's runtime is gone; the guard is released with it
        if queue.send(dispatch).is_err() {
            debug!("Dropping event: {}", TransportError::NoRuntime);
        }

        true
    }

    /// Deliver an event inline and report the outcome
    ///
    /// Same request and deadline as `send`, awaited by the caller. Used by
    /// tests and by hosts that want to wait on a single event.
    pub async fn deliver(&self, event: &Event) -> Delivery {
        let body = match serde_json::to_string(event) {
            Ok(body) => body,
            Err(e) => return Delivery::Failed(TransportError::Serialization(e).to_string()),
        };

        let deadline = Instant::now() + self.timeout;
        deliver_until(self.fetch.post(self.request(body)), deadline).await
    }

    /// Wait for in-flight deliveries to settle
    ///
    /// # Returns
    /// `true` if everything settled within `timeout`
    pub async fn flush(&self, timeout: Duration) -> bool {
        let in_flight = Arc::clone(&self.in_flight);
        tokio::time::timeout(timeout, async move {
            loop {
                let idle = in_flight.idle.notified();
                if in_flight.count.load(Ordering::SeqCst) == 0 {
                    return;
                }
                idle.await;
            }
        })
        .await
        .is_ok()
    }

    /// Build the POST for a serialized event
    ///
    /// **Private** - shared by send and deliver
    fn request(&self, body: String) -> PostRequest {
        PostRequest {
            url: self.dsn.clone(),
            content_type: JSON_CONTENT_TYPE,
            body,
            keepalive: true,
        }
    }
}

/// A queued request and what it needs once started
struct Dispatch {
    request: PostRequest,
    deadline: Instant,
    guard: InFlightGuard,
}

fn start_dispatcher(
    runtime: &Handle,
    fetch: Arc<dyn HttpFetch>,
) -> mpsc::UnboundedSender<Dispatch> {
    let (queue, requests) = mpsc::unbounded_channel();
    drop(runtime.spawn(dispatch(fetch, requests)));
    queue
}

/// Start queued requests one after another
///
/// Each request is polled once here, so it has been handed to the fetch
/// before the next one is taken off the queue. Anything still pending is
/// moved to its own task, where only its own deadline can abort it.
async fn dispatch(fetch: Arc<dyn HttpFetch>, mut requests: mpsc::UnboundedReceiver<Dispatch>) {
    while let Some(Dispatch {
        request,
        deadline,
        guard,
    }) = requests.recv().await
    {
        let fetch = Arc::clone(&fetch);
        let mut post: PendingPost = Box::pin(async move { fetch.post(request).await });

        let started = std::future::poll_fn(|cx| Poll::Ready(post.as_mut().poll(cx))).await;
        match started {
            Poll::Ready(result) => {
                log_outcome(&settled(result));
                drop(guard);
            }
            Poll::Pending => {
                drop(tokio::spawn(async move {
                    let outcome = deliver_until(post, deadline).await;
                    log_outcome(&outcome);
                    drop(guard);
                }));
            }
        }
    }
}

/// Race a fetch against the deadline
///
/// The deadline timer is dropped as soon as the fetch settles.
async fn deliver_until<F>(post: F, deadline: Instant) -> Delivery
where
    F: Future<Output = Result<u16, TransportError>>,
{
    match tokio::time::timeout_at(deadline, post).await {
        Ok(result) => settled(result),
        Err(_) => Delivery::TimedOut,
    }
}

fn settled(result: Result<u16, TransportError>) -> Delivery {
    match result {
        Ok(status) => Delivery::Delivered(status),
        Err(e) => Delivery::Failed(e.to_string()),
    }
}

fn log_outcome(outcome: &Delivery) {
    match outcome {
        Delivery::Delivered(status) => debug!("Event delivered (HTTP {})", status),
        Delivery::Failed(reason) => debug!("Event delivery failed: {}", reason),
        Delivery::TimedOut => debug!("Event delivery aborted at deadline"),
    }
}

/// Count of unsettled deliveries
#[derive(Default)]
struct InFlight {
    count: AtomicUsize,
    idle: Notify,
}

/// Holds one slot in `InFlight` until dropped
struct InFlightGuard(Arc<InFlight>);

impl InFlightGuard {
    fn enter(in_flight: Arc<InFlight>) -> Self {
        in_flight.count.fetch_add(1, Ordering::SeqCst);
        Self(in_flight)
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.0.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}
