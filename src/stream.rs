//! The result stream: a single-producer, single-consumer channel of [`Row`]s.
//!
//! The producer owns the [`RowSender`]; dropping it closes the stream. A consumer
//! sees closure as `None` from [`RowReceiver::recv`], which always means
//! end-of-stream. Errors travel out of band as the producer's return value.

use tokio::sync::mpsc;

use crate::error::SqlStreamError;
use crate::row::Row;

/// Create a result stream.
///
/// `None` gives an unbounded queue. `Some(n)` gives a bounded queue with `n`
/// slots (a capacity of zero is raised to one, the smallest queue tokio offers).
#[must_use]
pub fn result_stream(capacity: Option<usize>) -> (RowSender, RowReceiver) {
    match capacity {
        Some(n) => {
            let (tx, rx) = mpsc::channel(n.max(1));
            (RowSender::Bounded(tx), RowReceiver::Bounded(rx))
        }
        None => {
            let (tx, rx) = mpsc::unbounded_channel();
            (RowSender::Unbounded(tx), RowReceiver::Unbounded(rx))
        }
    }
}

/// Producer half of a result stream.
#[derive(Debug)]
pub enum RowSender {
    Bounded(mpsc::Sender<Row>),
    Unbounded(mpsc::UnboundedSender<Row>),
}

impl RowSender {
    /// Send a row, waiting for a free slot when the queue is bounded and full.
    ///
    /// # Errors
    /// Returns `SqlStreamError::StreamClosed` if the receiver has been dropped.
    pub async fn send(&self, row: Row) -> Result<(), SqlStreamError> {
        let sent = match self {
            RowSender::Bounded(tx) => tx.send(row).await,
            RowSender::Unbounded(tx) => tx.send(row),
        };
        sent.map_err(|_| SqlStreamError::StreamClosed)
    }

    /// Blocking variant of [`RowSender::send`] for producers on a plain thread.
    ///
    /// Must not be called from within an async execution context.
    ///
    /// # Errors
    /// Returns `SqlStreamError::StreamClosed` if the receiver has been dropped.
    pub fn blocking_send(&self, row: Row) -> Result<(), SqlStreamError> {
        let sent = match self {
            RowSender::Bounded(tx) => tx.blocking_send(row),
            RowSender::Unbounded(tx) => tx.send(row),
        };
        sent.map_err(|_| SqlStreamError::StreamClosed)
    }
}

/// Consumer half of a result stream.
#[derive(Debug)]
pub enum RowReceiver {
    Bounded(mpsc::Receiver<Row>),
    Unbounded(mpsc::UnboundedReceiver<Row>),
}

impl RowReceiver {
    /// Receive the next row, or `None` once the producer has closed the stream.
    pub async fn recv(&mut self) -> Option<Row> {
        match self {
            RowReceiver::Bounded(rx) => rx.recv().await,
            RowReceiver::Unbounded(rx) => rx.recv().await,
        }
    }

    /// Drain every remaining row until the stream closes.
    pub async fn collect(mut self) -> Vec<Row> {
        let mut rows = Vec::new();
        while let Some(row) = self.recv().await {
            rows.push(row);
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::types::RowValue;

    fn row(i: i64) -> Row {
        Row::new(Arc::new(vec!["n".into()]), vec![RowValue::Int(i)])
    }

    #[tokio::test]
    async fn dropping_sender_ends_stream() {
        let (tx, mut rx) = result_stream(Some(4));
        tx.send(row(1)).await.unwrap();
        drop(tx);
        assert!(rx.recv().await.is_some());
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn send_after_receiver_drop_reports_closed() {
        let (tx, rx) = result_stream(None);
        drop(rx);
        assert!(matches!(
            tx.send(row(1)).await,
            Err(SqlStreamError::StreamClosed)
        ));
    }

    #[tokio::test]
    async fn zero_capacity_is_usable() {
        let (tx, rx) = result_stream(Some(0));
        let producer = tokio::spawn(async move {
            for i in 0..3 {
                tx.send(row(i)).await?;
            }
            Ok::<(), SqlStreamError>(())
        });
        let rows = rx.collect().await;
        producer.await.unwrap().unwrap();
        let got: Vec<i64> = rows
            .iter()
            .map(|r| *r.get_by_index(0).and_then(RowValue::as_int).unwrap())
            .collect();
        assert_eq!(got, vec![0, 1, 2]);
    }
}
