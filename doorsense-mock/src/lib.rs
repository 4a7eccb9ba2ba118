use std::error::Error;
use std::time::Duration;

use doorsense_embedded::{
    DeviceIdentity, InboundChannel, NUM_SWITCHES, NodeAddress, SensorNode, SwitchBank,
};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::Instant;
use tokio::sync::mpsc;

use crate::bus::{SimulatedBus, monitor};
use crate::controller::ScriptedController;
use crate::settings::Settings;
use crate::storage::FileStorage;
use crate::switches::{SimulatedPin, dip_switches, simulate_doors};
use crate::update::SimulatedUpdate;

mod bus;
mod controller;
pub mod settings;
mod storage;
mod switches;
mod update;

pub async fn run(settings: &Settings) -> Result<(), Box<dyn Error>> {
    let hardware = &settings.hardware;
    tracing::info!(
        "Starting simulated door sensor ({} bit/s bus, DIP address {})",
        settings.node.bitrate,
        hardware.address
    );

    let doors: [SimulatedPin; NUM_SWITCHES] = core::array::from_fn(|_| SimulatedPin::new(false));
    let address = NodeAddress::read(&mut dip_switches(hardware.address))?;
    let identity = DeviceIdentity::from_mac(&settings.node.hostname_prefix, hardware.mac);

    let (monitor_tx, monitor_rx) = mpsc::unbounded_channel();
    let bus = SimulatedBus::new(monitor_tx, settings.simulation.tx_failure_rate);
    let storage = FileStorage::open(&settings.storage.path)?;

    let mut node = SensorNode::new(
        settings.node.clone(),
        address,
        identity,
        SwitchBank::new(doors.clone()),
        bus,
        storage,
        Instant::now(),
    )?;
    let status_id = node.broadcast_id();
    tracing::info!(
        "Node {} ({}) reporting on 0x{:03X}",
        node.address().value(),
        node.identity().hostname(),
        status_id.as_raw()
    );

    let controller =
        ScriptedController::new(settings.controller.clone(), &settings.node, hardware.mac)?;
    let mut update =
        SimulatedUpdate::new(Duration::from_millis(settings.simulation.update_session_ms));
    let inbound: InboundChannel<CriticalSectionRawMutex> = Channel::new();

    tokio::select! {
        _ = node.run(inbound.receiver(), &mut update) => {},
        _ = simulate_doors(&doors, &settings.simulation) => {},
        _ = async {
            controller.run(inbound.sender()).await;
            core::future::pending::<()>().await
        } => {},
        _ = monitor(monitor_rx, status_id) => {
            tracing::warn!("Bus monitor stopped");
        },
        _ = tokio::time::sleep(Duration::from_millis(settings.simulation.run_for_ms)) => {
            tracing::info!("Simulation finished");
        },
    }

    Ok(())
}
