use embassy_futures::select::{Either, select};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::{Instant, Ticker};
use embedded_can::StandardId;
use embedded_hal::digital::InputPin;

use crate::address::NodeAddress;
use crate::broadcast::StatusBroadcaster;
use crate::bus::{CanBus, CanFrame, InboundReceiver};
use crate::config::NodeConfig;
use crate::protocol::InboundMessage;
use crate::provisioning::{CredentialSession, SessionEvent};
use crate::storage::{Credentials, LocalStorage};
use crate::switch::{Debouncer, NUM_SWITCHES, SwitchBank, SwitchState};
use crate::update::{DeviceIdentity, UpdateProcedure, UpdateRequest};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeMode {
    /// Sampling inputs and broadcasting status
    Normal,
    /// Handed over to the update procedure, sampling and broadcast suspended
    Updating,
}

/// Door/cabinet sensor node.
///
/// Owns every piece of mutable state: the debounced switch state and
/// broadcast timing (touched only by [`SensorNode::tick`]) and the credential
/// session (touched only by [`SensorNode::handle_frame`]).
pub struct SensorNode<P, B, S, const N: usize = NUM_SWITCHES>
where
    P: InputPin,
    B: CanBus,
    S: LocalStorage,
{
    config: NodeConfig,
    address: NodeAddress,
    identity: DeviceIdentity,
    switches: SwitchBank<P, N>,
    debouncer: Debouncer<N>,
    broadcaster: StatusBroadcaster,
    session: CredentialSession,
    bus: B,
    storage: S,
    mode: NodeMode,
}

impl<P, B, S, const N: usize> SensorNode<P, B, S, N>
where
    P: InputPin,
    B: CanBus,
    S: LocalStorage,
{
    /// Validates the configuration, derives the broadcast identifier and
    /// seeds the debounced state from an initial read of the switches.
    pub fn new(
        config: NodeConfig,
        address: NodeAddress,
        identity: DeviceIdentity,
        mut switches: SwitchBank<P, N>,
        bus: B,
        storage: S,
        now: Instant,
    ) -> Result<Self> {
        config.validate()?;

        let broadcast_id = address.broadcast_id(config.base_id)?;
        log::info!(
            "[INIT] DIP address: {}, CAN ID: 0x{:02X}, hostname: {}",
            address.value(),
            broadcast_id.as_raw(),
            identity.hostname()
        );

        let initial = switches.read()?;
        log::info!("[INIT] Initial door state: 0x{:04X}", initial.bits());

        Ok(Self {
            debouncer: Debouncer::new(initial, config.debounce_window(), now),
            broadcaster: StatusBroadcaster::new(broadcast_id, config.tx_interval()),
            config,
            address,
            identity,
            switches,
            session: CredentialSession::new(),
            bus,
            storage,
            mode: NodeMode::Normal,
        })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn address(&self) -> NodeAddress {
        self.address
    }

    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    pub fn broadcast_id(&self) -> StandardId {
        self.broadcaster.id()
    }

    pub fn mode(&self) -> NodeMode {
        self.mode
    }

    /// Published (debounced) switch state.
    pub fn state(&self) -> SwitchState<N> {
        self.debouncer.state()
    }

    pub fn session(&self) -> &CredentialSession {
        &self.session
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Reads the switches and feeds the debouncer. A failed read keeps the
    /// previously published state.
    pub fn sample(&mut self, now: Instant) -> SwitchState<N> {
        if self.mode == NodeMode::Updating {
            return self.debouncer.state();
        }

        match self.switches.read() {
            Ok(raw) => self.debouncer.update(raw, now),
            Err(e) => {
                log::warn!("[INPUT] {}", e);
                self.debouncer.state()
            }
        }
    }

    pub async fn poll_broadcast(&mut self, now: Instant) -> bool {
        if self.mode == NodeMode::Updating {
            return false;
        }
        let state = self.debouncer.state();
        self.broadcaster.poll(&mut self.bus, state, now).await
    }

    /// One iteration of the control loop.
    pub async fn tick(&mut self, now: Instant) -> bool {
        self.sample(now);
        self.poll_broadcast(now).await
    }

    /// Dispatches one inbound frame. Returns the update request when the
    /// frame is an update trigger addressed to this node and usable
    /// credentials are stored.
    pub async fn handle_frame(&mut self, frame: &CanFrame) -> Option<UpdateRequest> {
        match InboundMessage::parse(frame, &self.config) {
            InboundMessage::UpdateTrigger(target) => self.match_trigger(target).await,
            InboundMessage::Provisioning(frame) => {
                if let SessionEvent::Committed(credentials) = self.session.handle(frame) {
                    // Failure is already logged; nothing to report back on the bus
                    credentials.store(&mut self.storage).await.ok();
                }
                None
            }
            InboundMessage::Unhandled => None,
        }
    }

    async fn match_trigger(&mut self, target: [u8; 3]) -> Option<UpdateRequest> {
        if !self
            .identity
            .matches(&self.config.hostname_prefix, target)
        {
            return None;
        }
        log::info!("[OTA] Hostname matched - reading WiFi credentials");

        let credentials = Credentials::load(&self.storage).await.ok()?;
        if !credentials.is_complete() {
            log::error!("[OTA] No WiFi credentials stored - cannot start update");
            return None;
        }

        log::info!("[OTA] Using stored WiFi credentials (SSID: {})", credentials.ssid);
        Some(UpdateRequest {
            credentials,
            hostname: self.identity.to_hostname(),
            window: self.config.update_window(),
        })
    }

    pub fn begin_update(&mut self) {
        self.mode = NodeMode::Updating;
    }

    pub fn finish_update(&mut self) {
        self.mode = NodeMode::Normal;
    }

    /// Suspends normal operation for the length of the update session.
    pub async fn run_update<U>(&mut self, request: &UpdateRequest, update: &mut U) -> Result<()>
    where
        U: UpdateProcedure,
    {
        self.begin_update();
        let result = update.run(request).await;
        self.finish_update();

        match result {
            Ok(()) => {
                log::info!("[OTA] Update mode exited - resuming normal operation");
                Ok(())
            }
            Err(e) => {
                log::error!("[OTA] Update failed: {:?}", e);
                Err(Error::UpdateFailed)
            }
        }
    }

    /// Cooperative main loop. Inbound frames are handled one at a time in
    /// arrival order between sampling ticks.
    pub async fn run<M, U, const Q: usize>(
        &mut self,
        inbound: InboundReceiver<'_, M, Q>,
        update: &mut U,
    ) where
        M: RawMutex,
        U: UpdateProcedure,
    {
        let mut ticker = Ticker::every(self.config.poll_interval());
        loop {
            let event = select(ticker.next(), inbound.receive()).await;
            match event {
                Either::First(()) => {
                    self.tick(Instant::now()).await;
                }
                Either::Second(frame) => {
                    if let Some(request) = self.handle_frame(&frame).await {
                        // Errors are logged, normal operation resumes regardless
                        self.run_update(&request, update).await.ok();
                        // Periods missed while suspended are skipped, not replayed
                        ticker = Ticker::every(self.config.poll_interval());
                    }
                }
            }
        }
    }
}
