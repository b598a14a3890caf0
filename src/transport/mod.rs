//! Waypoint output boundary

use crate::common::Waypoint;
use crate::error::TransportError;
use std::future::Future;
use tokio::sync::mpsc;

/// Destination for emitted waypoints
///
/// The scheduler bounds every publish with a timeout and treats failures as
/// non-fatal per-tick errors.
pub trait WaypointTransport {
    fn publish(&mut self, waypoint: &Waypoint) -> impl Future<Output = Result<(), TransportError>>;
}

/// Publishes into a bounded tokio channel
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    sender: mpsc::Sender<Waypoint>,
}

impl ChannelTransport {
    /// Create a transport and the receiving end of its channel
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Waypoint>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (ChannelTransport { sender }, receiver)
    }
}

impl WaypointTransport for ChannelTransport {
    async fn publish(&mut self, waypoint: &Waypoint) -> Result<(), TransportError> {
        self.sender
            .send(*waypoint)
            .await
            .map_err(|_| TransportError::Closed)
    }
}

/// Writes each waypoint to the log under a topic name
#[derive(Debug, Clone)]
pub struct LogTransport {
    topic: String,
}

impl LogTransport {
    pub fn new(topic: &str) -> Self {
        LogTransport {
            topic: topic.to_string(),
        }
    }
}

impl WaypointTransport for LogTransport {
    async fn publish(&mut self, waypoint: &Waypoint) -> Result<(), TransportError> {
        log::info!(
            "{} #{}: x={:.3}, y={:.3}",
            self.topic,
            waypoint.sequence_id,
            waypoint.x,
            waypoint.y
        );
        Ok(())
    }
}

/// Publishes every waypoint to two transports in order
///
/// Stops at the first failure, so the secondary only sees waypoints the
/// primary accepted.
#[derive(Debug, Clone)]
pub struct TeeTransport<A, B> {
    primary: A,
    secondary: B,
}

impl<A, B> TeeTransport<A, B> {
    pub fn new(primary: A, secondary: B) -> Self {
        TeeTransport { primary, secondary }
    }
}

impl<A: WaypointTransport, B: WaypointTransport> WaypointTransport for TeeTransport<A, B> {
    async fn publish(&mut self, waypoint: &Waypoint) -> Result<(), TransportError> {
        self.primary.publish(waypoint).await?;
        self.secondary.publish(waypoint).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn waypoint(sequence_id: u64) -> Waypoint {
        Waypoint {
            x: 1.0,
            y: 2.0,
            sequence_id,
        }
    }

    #[tokio::test]
    async fn channel_delivers_in_order() {
        let (mut transport, mut rx) = ChannelTransport::new(4);
        transport.publish(&waypoint(1)).await.unwrap();
        transport.publish(&waypoint(2)).await.unwrap();
        assert_eq!(rx.recv().await.unwrap().sequence_id, 1);
        assert_eq!(rx.recv().await.unwrap().sequence_id, 2);
    }

    #[tokio::test]
    async fn channel_reports_closed_receiver() {
        let (mut transport, rx) = ChannelTransport::new(1);
        drop(rx);
        assert_eq!(
            transport.publish(&waypoint(1)).await,
            Err(TransportError::Closed)
        );
    }

    #[tokio::test]
    async fn tee_forwards_to_both() {
        let (first, mut first_rx) = ChannelTransport::new(2);
        let (second, mut second_rx) = ChannelTransport::new(2);
        let mut tee = TeeTransport::new(first, second);
        tee.publish(&waypoint(7)).await.unwrap();
        assert_eq!(first_rx.recv().await.unwrap().sequence_id, 7);
        assert_eq!(second_rx.recv().await.unwrap().sequence_id, 7);
    }

    #[tokio::test]
    async fn tee_stops_at_primary_failure() {
        let (first, first_rx) = ChannelTransport::new(1);
        let (second, mut second_rx) = ChannelTransport::new(1);
        drop(first_rx);
        let mut tee = TeeTransport::new(first, second);
        assert!(tee.publish(&waypoint(1)).await.is_err());
        assert!(second_rx.try_recv().is_err());
    }
}
