//! Injectable suspension for polling loops.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Future returned by [`Delay::delay`].
pub type DelayFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

/// A source of non-blocking waits.
///
/// Production code sleeps on the tokio timer; tests swap in a nullable that
/// records the request and returns immediately, so loops run deterministically.
pub trait Delay: Send + Sync {
    fn delay(&self, duration: Duration) -> DelayFuture<'_>;
}

/// [`Delay`] backed by `tokio::time::sleep`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioDelay;

impl Delay for TokioDelay {
    fn delay(&self, duration: Duration) -> DelayFuture<'_> {
        Box::pin(tokio::time::sleep(duration))
    }
}
