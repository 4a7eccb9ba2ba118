use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use doorsense_embedded::NUM_ADDRESS_PINS;
use embedded_hal::digital::{ErrorType, InputPin};
use rand::Rng;

use crate::settings::Simulation;

/// Input line whose level is driven by the simulation.
#[derive(Debug, Clone, Default)]
pub struct SimulatedPin {
    high: Arc<AtomicBool>,
}

impl SimulatedPin {
    pub fn new(high: bool) -> Self {
        Self {
            high: Arc::new(AtomicBool::new(high)),
        }
    }

    pub fn set_high(&self, high: bool) {
        self.high.store(high, Ordering::Relaxed);
    }

    pub fn is_set_high(&self) -> bool {
        self.high.load(Ordering::Relaxed)
    }
}

impl ErrorType for SimulatedPin {
    type Error = Infallible;
}

impl InputPin for SimulatedPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.is_set_high())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.is_set_high())
    }
}

/// DIP switch lines for `address`: a switch that is ON pulls its line low.
pub fn dip_switches(address: u8) -> [SimulatedPin; NUM_ADDRESS_PINS] {
    core::array::from_fn(|bit| SimulatedPin::new(address & (1 << bit) == 0))
}

/// Opens and closes random doors, chattering each contact before it settles.
pub async fn simulate_doors(doors: &[SimulatedPin], simulation: &Simulation) {
    if doors.is_empty() {
        return;
    }

    loop {
        let pause = {
            let mut rng = rand::rng();
            let mean = simulation.door_toggle_ms.max(1);
            rng.random_range(mean / 2..=mean + mean / 2)
        };
        tokio::time::sleep(Duration::from_millis(pause)).await;

        let (door, settled) = {
            let mut rng = rand::rng();
            let door = &doors[rng.random_range(0..doors.len())];
            (door, !door.is_set_high())
        };

        let mut elapsed = 0;
        while elapsed < simulation.bounce_ms {
            let step = rand::rng().random_range(1..=4u64);
            door.set_high(!door.is_set_high());
            tokio::time::sleep(Duration::from_millis(step)).await;
            elapsed += step;
        }
        door.set_high(settled);

        tracing::debug!(
            "Door moved, contact now {}",
            if settled { "open" } else { "closed" }
        );
    }
}
