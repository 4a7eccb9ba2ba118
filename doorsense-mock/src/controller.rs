use std::time::Duration;

use doorsense_embedded::protocol::{encode_transfer, update_trigger_frame};
use doorsense_embedded::{CanFrame, InboundSender, NodeConfig, deliver};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_can::Frame;

use crate::settings::Controller;

/// Bus-side script: provisions credentials, then asks the node to update.
pub struct ScriptedController {
    settings: Controller,
    target: [u8; 3],
    frames: Vec<CanFrame>,
    trigger: CanFrame,
}

impl ScriptedController {
    pub fn new(
        settings: Controller,
        node: &NodeConfig,
        mac: [u8; 6],
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let target = [mac[3], mac[4], mac[5]];

        let mut frames = encode_transfer(
            node.provisioning_id()?,
            settings.ssid.as_bytes(),
            settings.password.as_bytes(),
        )
        .ok_or("credentials too long for a transfer")?;

        if settings.corrupt_checksum {
            if let Some(finish) = frames.last_mut() {
                let mut data = finish.data().to_vec();
                data[1] ^= 0xFF;
                *finish = CanFrame::new(finish.id(), &data).ok_or("invalid finish frame")?;
            }
        }

        let trigger =
            update_trigger_frame(node.update_trigger_id()?, target).ok_or("invalid trigger")?;

        Ok(Self {
            settings,
            target,
            frames,
            trigger,
        })
    }

    pub async fn run<M, const N: usize>(&self, inbound: InboundSender<'_, M, N>)
    where
        M: RawMutex,
    {
        tokio::time::sleep(Duration::from_millis(self.settings.provision_after_ms)).await;
        tracing::info!(
            "Provisioning SSID {:?} in {} frames{}",
            self.settings.ssid,
            self.frames.len(),
            if self.settings.corrupt_checksum {
                " with a corrupted checksum"
            } else {
                ""
            }
        );
        for frame in &self.frames {
            deliver(&inbound, *frame);
            // Leave the bus some air between frames
            tokio::time::sleep(Duration::from_millis(2)).await;
        }

        tokio::time::sleep(Duration::from_millis(self.settings.trigger_after_ms)).await;
        tracing::info!(
            "Triggering update for target {:X}{:X}{:X}",
            self.target[0],
            self.target[1],
            self.target[2]
        );
        deliver(&inbound, self.trigger);
    }
}
