//! Wire format of the frames a sensor node consumes.
//!
//! Two reserved identifiers carry inbound traffic:
//!
//! * update trigger: bytes 0-2 select the target node by its identity
//! * credential transfer: byte 0 is the frame type
//!   (1 = begin, 2 = append name, 3 = append secret, 4 = finish)
//!
//! Begin carries the declared name/secret lengths in bytes 1 and 2. Append
//! frames carry field data from byte 2 onwards. Finish carries the expected
//! XOR checksum in byte 1.

use alloc::vec::Vec;

use embedded_can::{Frame, StandardId};

use crate::bus::{CanFrame, MAX_FRAME_DATA};
use crate::config::NodeConfig;

pub const FRAME_BEGIN: u8 = 0x01;
pub const FRAME_APPEND_NAME: u8 = 0x02;
pub const FRAME_APPEND_SECRET: u8 = 0x03;
pub const FRAME_FINISH: u8 = 0x04;

/// Offset of field data inside an append frame.
pub const APPEND_DATA_OFFSET: usize = 2;

/// Field bytes an append frame can carry.
pub const APPEND_CHUNK: usize = MAX_FRAME_DATA - APPEND_DATA_OFFSET;

/// Identity bytes carried by an update trigger.
pub const TRIGGER_LEN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisioningFrame<'a> {
    Begin { name_len: u8, secret_len: u8 },
    AppendName(&'a [u8]),
    AppendSecret(&'a [u8]),
    Finish { checksum: u8 },
}

impl<'a> ProvisioningFrame<'a> {
    /// `None` for unknown frame types and frames too short for their fixed fields.
    pub fn parse(data: &'a [u8]) -> Option<Self> {
        let (&kind, _) = data.split_first()?;
        match kind {
            // A truncated begin is dropped whole and leaves any active transfer alone
            FRAME_BEGIN if data.len() >= 3 => Some(Self::Begin {
                name_len: data[1],
                secret_len: data[2],
            }),
            FRAME_APPEND_NAME => Some(Self::AppendName(append_data(data))),
            FRAME_APPEND_SECRET => Some(Self::AppendSecret(append_data(data))),
            FRAME_FINISH if data.len() >= 2 => Some(Self::Finish { checksum: data[1] }),
            _ => None,
        }
    }

    pub fn to_frame(&self, id: StandardId) -> Option<CanFrame> {
        let mut data = [0u8; MAX_FRAME_DATA];
        let len = match *self {
            Self::Begin {
                name_len,
                secret_len,
            } => {
                data[..3].copy_from_slice(&[FRAME_BEGIN, name_len, secret_len]);
                3
            }
            Self::AppendName(chunk) | Self::AppendSecret(chunk) => {
                if chunk.len() > APPEND_CHUNK {
                    return None;
                }
                data[0] = match self {
                    Self::AppendName(_) => FRAME_APPEND_NAME,
                    _ => FRAME_APPEND_SECRET,
                };
                data[APPEND_DATA_OFFSET..APPEND_DATA_OFFSET + chunk.len()].copy_from_slice(chunk);
                APPEND_DATA_OFFSET + chunk.len()
            }
            Self::Finish { checksum } => {
                data[..2].copy_from_slice(&[FRAME_FINISH, checksum]);
                2
            }
        };
        CanFrame::new(id, &data[..len])
    }
}

fn append_data(data: &[u8]) -> &[u8] {
    data.get(APPEND_DATA_OFFSET..).unwrap_or(&[])
}

/// Running XOR over both fields, name first.
pub fn checksum(name: &[u8], secret: &[u8]) -> u8 {
    name.iter().chain(secret).fold(0, |acc, byte| acc ^ byte)
}

/// Inbound frame classified by identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundMessage<'a> {
    UpdateTrigger([u8; TRIGGER_LEN]),
    Provisioning(ProvisioningFrame<'a>),
    Unhandled,
}

impl<'a> InboundMessage<'a> {
    pub fn parse(frame: &'a CanFrame, config: &NodeConfig) -> Self {
        let Some(id) = frame.standard_id() else {
            return Self::Unhandled;
        };
        if frame.is_remote_frame() {
            return Self::Unhandled;
        }

        let data = frame.data();
        if id.as_raw() == config.update_trigger_id {
            match data.get(..TRIGGER_LEN) {
                Some(&[a, b, c]) => Self::UpdateTrigger([a, b, c]),
                _ => {
                    log::debug!("[CAN] Short update trigger ({} bytes) ignored", data.len());
                    Self::Unhandled
                }
            }
        } else if id.as_raw() == config.provisioning_id {
            match ProvisioningFrame::parse(data) {
                Some(frame) => Self::Provisioning(frame),
                None => {
                    log::debug!("[CAN] Malformed credential frame ignored");
                    Self::Unhandled
                }
            }
        } else {
            Self::Unhandled
        }
    }
}

/// Splits a credential pair into the frame sequence a controller sends:
/// begin, name chunks, secret chunks, finish.
pub fn encode_transfer(id: StandardId, name: &[u8], secret: &[u8]) -> Option<Vec<CanFrame>> {
    let name_len = u8::try_from(name.len()).ok()?;
    let secret_len = u8::try_from(secret.len()).ok()?;

    let mut frames = Vec::new();
    frames.push(
        ProvisioningFrame::Begin {
            name_len,
            secret_len,
        }
        .to_frame(id)?,
    );
    for chunk in name.chunks(APPEND_CHUNK) {
        frames.push(ProvisioningFrame::AppendName(chunk).to_frame(id)?);
    }
    for chunk in secret.chunks(APPEND_CHUNK) {
        frames.push(ProvisioningFrame::AppendSecret(chunk).to_frame(id)?);
    }
    frames.push(
        ProvisioningFrame::Finish {
            checksum: checksum(name, secret),
        }
        .to_frame(id)?,
    );

    Some(frames)
}

pub fn update_trigger_frame(id: StandardId, target: [u8; TRIGGER_LEN]) -> Option<CanFrame> {
    CanFrame::new(id, &target)
}
