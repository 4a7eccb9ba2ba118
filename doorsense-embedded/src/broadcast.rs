use embassy_time::{Duration, Instant};
use embedded_can::StandardId;

use crate::bus::{CanBus, CanFrame};
use crate::switch::SwitchState;

/// Fixed-rate status sender. State changes are only reflected at the next
/// period, there is no event-triggered transmission and no retry.
#[derive(Debug, Clone)]
pub struct StatusBroadcaster {
    id: StandardId,
    interval: Duration,
    last_tx: Instant,
}

impl StatusBroadcaster {
    pub fn new(id: StandardId, interval: Duration) -> Self {
        Self {
            id,
            interval,
            last_tx: Instant::from_ticks(0),
        }
    }

    pub fn id(&self) -> StandardId {
        self.id
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last_tx) >= self.interval
    }

    pub fn frame<const N: usize>(&self, state: SwitchState<N>) -> CanFrame {
        // A two-byte payload always fits a classic frame
        CanFrame::standard(self.id, &state.to_payload()).unwrap_or_else(|| unreachable!())
    }

    /// Sends the current state when a full period has elapsed. Returns whether
    /// a transmission was attempted. A failed transmission is only logged, the
    /// next period resends the then-current state.
    pub async fn poll<B, const N: usize>(
        &mut self,
        bus: &mut B,
        state: SwitchState<N>,
        now: Instant,
    ) -> bool
    where
        B: CanBus,
    {
        if !self.is_due(now) {
            return false;
        }
        self.last_tx = now;

        if let Err(e) = bus.transmit(&self.frame(state)).await {
            log::warn!("[CAN] TX FAIL: {:?}", e);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use embedded_can::Frame;

    use crate::bus::mock::MockBus;

    use super::*;

    fn broadcaster() -> StatusBroadcaster {
        StatusBroadcaster::new(StandardId::new(0x0D).unwrap(), Duration::from_millis(200))
    }

    #[tokio::test]
    async fn test_sends_on_fixed_period() {
        let mut bus = MockBus::new();
        let mut broadcaster = broadcaster();
        let state = SwitchState::<10>::from_bits(0x301);

        assert!(broadcaster.poll(&mut bus, state, Instant::from_millis(200)).await);
        assert!(!broadcaster.poll(&mut bus, state, Instant::from_millis(250)).await);
        assert!(!broadcaster.poll(&mut bus, state, Instant::from_millis(399)).await);
        assert!(broadcaster.poll(&mut bus, state, Instant::from_millis(400)).await);

        assert_eq!(bus.sent.len(), 2);
        assert_eq!(bus.sent[0].data(), &[0x01, 0x03]);
        assert_eq!(bus.sent[0].standard_id(), Some(StandardId::new(0x0D).unwrap()));
    }

    #[tokio::test]
    async fn test_period_restarts_from_last_transmission() {
        let mut bus = MockBus::new();
        let mut broadcaster = broadcaster();
        let state = SwitchState::<10>::all_closed();

        // A late tick moves the reference point forward
        assert!(broadcaster.poll(&mut bus, state, Instant::from_millis(530)).await);
        assert!(!broadcaster.poll(&mut bus, state, Instant::from_millis(700)).await);
        assert!(broadcaster.poll(&mut bus, state, Instant::from_millis(730)).await);
    }

    #[tokio::test]
    async fn test_failed_transmission_is_not_retried() {
        let mut bus = MockBus::new();
        bus.fail = true;
        let mut broadcaster = broadcaster();
        let state = SwitchState::<10>::all_closed();

        assert!(broadcaster.poll(&mut bus, state, Instant::from_millis(200)).await);
        bus.fail = false;
        assert!(!broadcaster.poll(&mut bus, state, Instant::from_millis(210)).await);
        assert!(bus.sent.is_empty());

        assert!(broadcaster.poll(&mut bus, state, Instant::from_millis(400)).await);
        assert_eq!(bus.sent.len(), 1);
    }
}
