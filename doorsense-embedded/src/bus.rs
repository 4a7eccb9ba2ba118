use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};
use embedded_can::{Frame, Id, StandardId};

/// Payload capacity of a classic CAN frame.
pub const MAX_FRAME_DATA: usize = 8;

/// Depth of the queue between the receive context and the node loop.
pub const INBOUND_QUEUE_DEPTH: usize = 16;

/// Classic CAN data frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanFrame {
    id: Id,
    dlc: u8,
    remote: bool,
    data: [u8; MAX_FRAME_DATA],
}

impl CanFrame {
    pub fn standard(id: StandardId, data: &[u8]) -> Option<Self> {
        Self::new(id, data)
    }

    /// Raw identifier when this is a standard frame.
    pub fn standard_id(&self) -> Option<StandardId> {
        match self.id {
            Id::Standard(id) => Some(id),
            Id::Extended(_) => None,
        }
    }
}

impl Frame for CanFrame {
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        if data.len() > MAX_FRAME_DATA {
            return None;
        }

        let mut buffer = [0; MAX_FRAME_DATA];
        buffer[..data.len()].copy_from_slice(data);

        Some(Self {
            id: id.into(),
            dlc: data.len() as u8,
            remote: false,
            data: buffer,
        })
    }

    fn new_remote(id: impl Into<Id>, dlc: usize) -> Option<Self> {
        if dlc > MAX_FRAME_DATA {
            return None;
        }

        Some(Self {
            id: id.into(),
            dlc: dlc as u8,
            remote: true,
            data: [0; MAX_FRAME_DATA],
        })
    }

    fn is_extended(&self) -> bool {
        matches!(self.id, Id::Extended(_))
    }

    fn is_remote_frame(&self) -> bool {
        self.remote
    }

    fn id(&self) -> Id {
        self.id
    }

    fn dlc(&self) -> usize {
        self.dlc as usize
    }

    fn data(&self) -> &[u8] {
        if self.remote {
            &[]
        } else {
            &self.data[..self.dlc as usize]
        }
    }
}

/// Outbound side of the bus driver.
#[allow(async_fn_in_trait)]
pub trait CanBus {
    type Error: core::fmt::Debug;

    /// Queue one frame. The result reports whether the transmission succeeded.
    async fn transmit(&mut self, frame: &CanFrame) -> Result<(), Self::Error>;
}

/// Hand-off from the bus receive context to the node loop. Frames are
/// consumed in arrival order by a single receiver, so inbound handlers never
/// overlap.
pub type InboundChannel<M, const N: usize = INBOUND_QUEUE_DEPTH> = Channel<M, CanFrame, N>;
pub type InboundSender<'a, M, const N: usize = INBOUND_QUEUE_DEPTH> = Sender<'a, M, CanFrame, N>;
pub type InboundReceiver<'a, M, const N: usize = INBOUND_QUEUE_DEPTH> =
    Receiver<'a, M, CanFrame, N>;

/// Called from the receive interrupt or driver task. A full queue drops the
/// frame and returns `false`.
pub fn deliver<M, const N: usize>(sender: &InboundSender<'_, M, N>, frame: CanFrame) -> bool
where
    M: RawMutex,
{
    if sender.try_send(frame).is_err() {
        log::warn!("[CAN] Inbound queue full, frame dropped");
        return false;
    }
    true
}


#[cfg(test)]
mod tests {
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    use super::*;

    fn id(raw: u16) -> StandardId {
        StandardId::new(raw).unwrap()
    }

    #[test]
    fn test_frame_data_and_dlc() {
        let frame = CanFrame::standard(id(0x0D), &[0x01, 0x00]).unwrap();

        assert_eq!(frame.dlc(), 2);
        assert_eq!(frame.data(), &[0x01, 0x00]);
        assert_eq!(frame.standard_id(), Some(id(0x0D)));
        assert!(frame.is_standard());
        assert!(frame.is_data_frame());
    }

    #[test]
    fn test_frame_rejects_oversized_payload() {
        assert!(CanFrame::standard(id(0x01), &[0; 9]).is_none());
    }

    #[test]
    fn test_deliver_drops_when_full() {
        let channel: InboundChannel<NoopRawMutex, 2> = Channel::new();
        let sender = channel.sender();
        let frame = CanFrame::standard(id(0x01), &[0x04, 0x00]).unwrap();

        assert!(deliver(&sender, frame));
        assert!(deliver(&sender, frame));
        assert!(!deliver(&sender, frame));

        let receiver = channel.receiver();
        assert_eq!(receiver.try_receive().ok(), Some(frame));
    }
}
