//! # Multiplexed OS signal subscription.
//!
//! A [`SignalListener`] holds one tokio signal stream per subscribed signal and
//! yields whichever fires. Streams are created eagerly so that registration
//! errors surface before any worker is spawned.
//!
//! An empty listener never yields; the dispatch loop then only waits for its
//! cancellation. Polling starts one stream further on each call, so a signal
//! that keeps firing cannot starve the others.

use std::future::poll_fn;
use std::io;
use std::task::Poll;

use crate::signals::OsSignal;

#[cfg(unix)]
pub(crate) struct SignalListener {
    streams: Vec<(OsSignal, tokio::signal::unix::Signal)>,
    next: usize,
}

#[cfg(unix)]
impl SignalListener {
    /// Subscribes every signal in `signals`; the first failure is returned with its signal.
    pub(crate) fn new(signals: &[OsSignal]) -> Result<Self, (OsSignal, io::Error)> {
        let mut streams = Vec::with_capacity(signals.len());
        for &sig in signals {
            let stream = tokio::signal::unix::signal(sig.kind()).map_err(|e| (sig, e))?;
            streams.push((sig, stream));
        }
        Ok(Self { streams, next: 0 })
    }

    /// Next received signal, or `None` once the signal driver is gone.
    pub(crate) async fn recv(&mut self) -> Option<OsSignal> {
        let len = self.streams.len();
        if len == 0 {
            return poll_fn(|_| Poll::<Option<OsSignal>>::Pending).await;
        }
        let start = self.next % len;
        self.next = start + 1;
        let streams = &mut self.streams;
        poll_fn(|cx| {
            for offset in 0..len {
                let (sig, stream) = &mut streams[(start + offset) % len];
                match stream.poll_recv(cx) {
                    Poll::Ready(Some(())) => return Poll::Ready(Some(*sig)),
                    Poll::Ready(None) => return Poll::Ready(None),
                    Poll::Pending => {}
                }
            }
            Poll::Pending
        })
        .await
    }
}

#[cfg(not(unix))]
pub(crate) struct SignalListener {
    interrupt: bool,
}

#[cfg(not(unix))]
impl SignalListener {
    /// Only `Interrupt` (Ctrl-C) is available on this platform.
    pub(crate) fn new(signals: &[OsSignal]) -> Result<Self, (OsSignal, io::Error)> {
        let mut interrupt = false;
        for &sig in signals {
            match sig {
                OsSignal::Interrupt => interrupt = true,
                other => {
                    return Err((
                        other,
                        io::Error::new(io::ErrorKind::Unsupported, "signal not supported"),
                    ))
                }
            }
        }
        Ok(Self { interrupt })
    }

    pub(crate) async fn recv(&mut self) -> Option<OsSignal> {
        if !self.interrupt {
            return poll_fn(|_| Poll::<Option<OsSignal>>::Pending).await;
        }
        tokio::signal::ctrl_c().await.ok().map(|_| OsSignal::Interrupt)
    }
}
