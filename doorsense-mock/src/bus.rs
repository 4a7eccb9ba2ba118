use doorsense_embedded::{CanBus, CanFrame, NUM_SWITCHES, SwitchState};
use embedded_can::{Frame, StandardId};
use rand::Rng;
use tokio::sync::mpsc;

#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("Frame not acknowledged")]
    NoAck,
    #[error("Bus monitor is gone")]
    Closed,
}

/// Outbound bus that forwards every frame to the monitor and loses a
/// configurable share of transmissions.
pub struct SimulatedBus {
    monitor: mpsc::UnboundedSender<CanFrame>,
    failure_rate: f64,
}

impl SimulatedBus {
    pub fn new(monitor: mpsc::UnboundedSender<CanFrame>, failure_rate: f64) -> Self {
        Self {
            monitor,
            failure_rate,
        }
    }
}

impl CanBus for SimulatedBus {
    type Error = BusError;

    async fn transmit(&mut self, frame: &CanFrame) -> Result<(), Self::Error> {
        if rand::rng().random_bool(self.failure_rate) {
            return Err(BusError::NoAck);
        }
        self.monitor.send(*frame).map_err(|_| BusError::Closed)
    }
}

/// Listens on the bus and reports every change in the broadcast door state.
pub async fn monitor(mut frames: mpsc::UnboundedReceiver<CanFrame>, status_id: StandardId) {
    let mut last: Option<SwitchState<NUM_SWITCHES>> = None;
    let mut received = 0u64;

    while let Some(frame) = frames.recv().await {
        if frame.standard_id() != Some(status_id) {
            continue;
        }
        let Some(&[low, high]) = frame.data().get(..2) else {
            tracing::warn!("Short status frame: {:?}", frame.data());
            continue;
        };
        received += 1;

        let state = SwitchState::<NUM_SWITCHES>::from_payload([low, high]);
        if last != Some(state) {
            let open: Vec<usize> = (0..NUM_SWITCHES).filter(|&ch| state.is_open(ch)).collect();
            tracing::info!(
                "Status 0x{:03X} [{:02X} {:02X}] open doors: {:?} ({} frames seen)",
                status_id.as_raw(),
                low,
                high,
                open,
                received
            );
            last = Some(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_frames_reach_monitor() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut bus = SimulatedBus::new(tx, 0.0);
        let frame = CanFrame::standard(StandardId::new(0x0D).unwrap(), &[0x01, 0x00]).unwrap();

        bus.transmit(&frame).await.unwrap();
        assert_eq!(rx.recv().await, Some(frame));
    }

    #[tokio::test]
    async fn test_lossy_bus_reports_failure() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut bus = SimulatedBus::new(tx, 1.0);
        let frame = CanFrame::standard(StandardId::new(0x0D).unwrap(), &[0x00, 0x00]).unwrap();

        assert!(matches!(bus.transmit(&frame).await, Err(BusError::NoAck)));
    }
}
