use alloc::string::String;

use heapless::Vec;

use crate::protocol::{ProvisioningFrame, checksum};
use crate::storage::Credentials;

/// Longest network name a transfer may declare.
pub const NAME_CAPACITY: usize = 32;

/// Longest secret a transfer may declare.
pub const SECRET_CAPACITY: usize = 63;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Begin declared a field longer than its buffer
    Oversized { name_len: u8, secret_len: u8 },
    /// Finish arrived with a checksum or length mismatch
    Mismatch {
        checksum_ok: bool,
        name: (usize, usize),
        secret: (usize, usize),
    },
    /// Field bytes are not valid UTF-8
    InvalidText,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Append or finish without an active transfer
    Ignored,
    Started,
    Appended { accepted: usize },
    Committed(Credentials),
    Rejected(Rejection),
}

#[derive(Debug, Clone)]
struct FieldBuffer<const CAP: usize> {
    declared: usize,
    data: Vec<u8, CAP>,
}

impl<const CAP: usize> FieldBuffer<CAP> {
    fn new(declared: u8) -> Self {
        Self {
            declared: declared as usize,
            data: Vec::new(),
        }
    }

    fn received(&self) -> usize {
        self.data.len()
    }

    fn is_complete(&self) -> bool {
        self.received() == self.declared
    }

    /// Appends at most the outstanding declared length. A chunk that would
    /// overrun the buffer is refused whole.
    fn append(&mut self, chunk: &[u8]) -> usize {
        let remaining = self.declared.saturating_sub(self.received());
        let chunk = &chunk[..chunk.len().min(remaining)];
        if self.data.extend_from_slice(chunk).is_err() {
            return 0;
        }
        chunk.len()
    }
}

#[derive(Debug, Clone)]
struct Transfer {
    name: FieldBuffer<NAME_CAPACITY>,
    secret: FieldBuffer<SECRET_CAPACITY>,
}

/// Reassembly of one credential transfer.
///
/// At most one transfer is in flight. A begin frame always discards whatever
/// was being collected. Append and finish frames outside a transfer are
/// ignored, so stragglers from an abandoned transfer cannot leak into the next
/// one. A transfer that never finishes stays allocated until the next begin.
#[derive(Debug, Clone, Default)]
pub struct CredentialSession {
    transfer: Option<Transfer>,
}

impl CredentialSession {
    pub fn new() -> Self {
        Self { transfer: None }
    }

    pub fn is_collecting(&self) -> bool {
        self.transfer.is_some()
    }

    pub fn handle(&mut self, frame: ProvisioningFrame<'_>) -> SessionEvent {
        match frame {
            ProvisioningFrame::Begin {
                name_len,
                secret_len,
            } => self.begin(name_len, secret_len),
            ProvisioningFrame::AppendName(chunk) => match self.transfer.as_mut() {
                Some(transfer) => SessionEvent::Appended {
                    accepted: transfer.name.append(chunk),
                },
                None => SessionEvent::Ignored,
            },
            ProvisioningFrame::AppendSecret(chunk) => match self.transfer.as_mut() {
                Some(transfer) => SessionEvent::Appended {
                    accepted: transfer.secret.append(chunk),
                },
                None => SessionEvent::Ignored,
            },
            ProvisioningFrame::Finish { checksum } => match self.transfer.take() {
                Some(transfer) => Self::finish(transfer, checksum),
                None => SessionEvent::Ignored,
            },
        }
    }

    fn begin(&mut self, name_len: u8, secret_len: u8) -> SessionEvent {
        if self.transfer.take().is_some() {
            log::debug!("[WiFi] Previous transfer discarded");
        }

        if name_len as usize > NAME_CAPACITY || secret_len as usize > SECRET_CAPACITY {
            log::warn!(
                "[WiFi] Config rejected: SSID len={} (max {}), Password len={} (max {})",
                name_len,
                NAME_CAPACITY,
                secret_len,
                SECRET_CAPACITY
            );
            return SessionEvent::Rejected(Rejection::Oversized {
                name_len,
                secret_len,
            });
        }

        self.transfer = Some(Transfer {
            name: FieldBuffer::new(name_len),
            secret: FieldBuffer::new(secret_len),
        });
        log::debug!(
            "[WiFi] Config start: SSID len={}, Password len={}",
            name_len,
            secret_len
        );
        SessionEvent::Started
    }

    fn finish(transfer: Transfer, expected: u8) -> SessionEvent {
        let Transfer { name, secret } = transfer;
        let checksum_ok = checksum(&name.data, &secret.data) == expected;

        if !(checksum_ok && name.is_complete() && secret.is_complete()) {
            log::warn!(
                "[WiFi] Config failed: checksum {}, SSID {}/{}, Password {}/{}",
                if checksum_ok { "OK" } else { "MISMATCH" },
                name.received(),
                name.declared,
                secret.received(),
                secret.declared
            );
            return SessionEvent::Rejected(Rejection::Mismatch {
                checksum_ok,
                name: (name.received(), name.declared),
                secret: (secret.received(), secret.declared),
            });
        }

        let (Ok(ssid), Ok(password)) = (
            core::str::from_utf8(&name.data),
            core::str::from_utf8(&secret.data),
        ) else {
            log::warn!("[WiFi] Config failed: credentials are not valid UTF-8");
            return SessionEvent::Rejected(Rejection::InvalidText);
        };

        SessionEvent::Committed(Credentials::new(String::from(ssid), String::from(password)))
    }
}
