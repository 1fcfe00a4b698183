//! Startup banner shown before the entry screen.

use std::time::Duration;

use tokio::io::{AsyncWrite, AsyncWriteExt};

pub const BANNER: &str = "\
==============================
           PHOTON
==============================
Loading...";

/// One-shot splash: show the banner, wait once, then hand off.
///
/// [`run`](Splash::run) consumes the splash, so the hand-off fires exactly
/// once.
#[derive(Debug, Clone, Copy)]
pub struct Splash {
    delay: Duration,
}

impl Splash {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub async fn run<W, F, T>(self, out: &mut W, on_done: F) -> std::io::Result<T>
    where
        W: AsyncWrite + Unpin,
        F: FnOnce() -> T,
    {
        out.write_all(BANNER.as_bytes()).await?;
        out.write_all(b"\n").await?;
        out.flush().await?;

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        tracing::debug!(delay_ms = self.delay.as_millis() as u64, "Splash finished");
        Ok(on_done())
    }
}
