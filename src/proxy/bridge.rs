//! Full-duplex byte relay between two connections.
//!
//! Each direction runs in its own task. The relay ends as soon as either
//! direction reports, whether that is EOF or an error; the other direction
//! is not waited for. Closing the [`Relay`] aborts both tasks, which drops
//! every half of both streams and so closes the sockets.

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    ClientToBackend,
    BackendToClient,
}

/// First outcome observed on either direction.
#[derive(Debug)]
pub struct CompletionSignal {
    pub direction: Direction,
    /// Bytes copied on success. EOF and errors both end the relay.
    pub result: std::io::Result<u64>,
}

/// Handles to the two copy tasks of a relay.
#[derive(Debug)]
pub struct Relay {
    tasks: [JoinHandle<()>; 2],
}

impl Relay {
    /// Stops both directions and releases both streams.
    pub fn close(self) {
        drop(self);
    }
}

impl Drop for Relay {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// Relays bytes between `client` and `backend` until one direction ends.
pub async fn bridge<C, B>(client: C, backend: B) -> (CompletionSignal, Relay)
where
    C: AsyncRead + AsyncWrite + Send + 'static,
    B: AsyncRead + AsyncWrite + Send + 'static,
{
    let (client_read, client_write) = tokio::io::split(client);
    let (backend_read, backend_write) = tokio::io::split(backend);

    let (tx, mut rx) = mpsc::channel(2);

    let relay = Relay {
        tasks: [
            spawn_copy(client_read, backend_write, Direction::ClientToBackend, tx.clone()),
            spawn_copy(backend_read, client_write, Direction::BackendToClient, tx),
        ],
    };

    let signal = match rx.recv().await {
        Some(signal) => signal,
        // Both senders gone without a report: a copy task panicked.
        None => CompletionSignal {
            direction: Direction::ClientToBackend,
            result: Err(std::io::Error::other("relay task exited without reporting")),
        },
    };

    tracing::debug!(
        direction = ?signal.direction,
        result = ?signal.result,
        "Relay finished"
    );

    (signal, relay)
}

fn spawn_copy<R, W>(
    mut src: R,
    mut dst: W,
    direction: Direction,
    done: mpsc::Sender<CompletionSignal>,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let result = tokio::io::copy(&mut src, &mut dst).await;
        let _ = done.send(CompletionSignal { direction, result }).await;
    })
}
