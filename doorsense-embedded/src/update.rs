use core::fmt::Write;

use embassy_time::Duration;
use heapless::String;

use crate::protocol::TRIGGER_LEN;
use crate::storage::Credentials;

pub type Hostname = String<32>;

/// Renders `prefix` followed by each byte in upper-case hex without padding.
/// Update triggers are rendered the same way before comparison.
fn render(prefix: &str, bytes: [u8; TRIGGER_LEN]) -> Hostname {
    let mut hostname = Hostname::new();
    // Prefix is at most 16 bytes and each byte renders to at most 2 digits
    write!(hostname, "{}{:X}{:X}{:X}", prefix, bytes[0], bytes[1], bytes[2]).ok();
    hostname
}

/// Externally visible name of this node, derived from the low three bytes of
/// its hardware address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    hostname: Hostname,
}

impl DeviceIdentity {
    pub fn new(prefix: &str, suffix: [u8; TRIGGER_LEN]) -> Self {
        Self {
            hostname: render(prefix, suffix),
        }
    }

    pub fn from_mac(prefix: &str, mac: [u8; 6]) -> Self {
        Self::new(prefix, [mac[3], mac[4], mac[5]])
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn to_hostname(&self) -> Hostname {
        self.hostname.clone()
    }

    /// Exact string comparison of the rendered trigger against this identity.
    pub fn matches(&self, prefix: &str, target: [u8; TRIGGER_LEN]) -> bool {
        render(prefix, target) == self.hostname
    }
}

/// Everything the update procedure needs to run one session.
#[derive(Debug, Clone)]
pub struct UpdateRequest {
    pub credentials: Credentials,
    pub hostname: Hostname,
    pub window: Duration,
}

/// Over-the-air update session driven outside this crate. `run` returns once
/// the session has concluded; the node stays suspended until then.
#[allow(async_fn_in_trait)]
pub trait UpdateProcedure {
    type Error: core::fmt::Debug;

    async fn run(&mut self, request: &UpdateRequest) -> Result<(), Self::Error>;
}

#[cfg(test)]
pub(crate) mod mock {
    use alloc::vec::Vec;

    use super::*;

    #[derive(Debug, Default)]
    pub struct MockUpdate {
        pub requests: Vec<UpdateRequest>,
        pub fail: bool,
    }

    impl UpdateProcedure for MockUpdate {
        type Error = ();

        async fn run(&mut self, request: &UpdateRequest) -> Result<(), Self::Error> {
            self.requests.push(request.clone());
            if self.fail { Err(()) } else { Ok(()) }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_renders_unpadded_hex() {
        let identity = DeviceIdentity::from_mac("esp32c6-", [0x40, 0x4C, 0xCA, 0x0A, 0xB1, 0x05]);
        assert_eq!(identity.hostname(), "esp32c6-AB15");
    }

    #[test]
    fn test_trigger_matches_own_identity() {
        let identity = DeviceIdentity::new("esp32c6-", [0x4F, 0x12, 0xC3]);

        assert!(identity.matches("esp32c6-", [0x4F, 0x12, 0xC3]));
        assert!(!identity.matches("esp32c6-", [0x4F, 0x12, 0xC4]));
        assert!(!identity.matches("esp32s3-", [0x4F, 0x12, 0xC3]));
    }

    #[test]
    fn test_comparison_is_on_rendered_string() {
        // 0x1,0x23,0x45 and 0x12,0x3,0x45 render to the same name
        let identity = DeviceIdentity::new("esp32c6-", [0x01, 0x23, 0x45]);
        assert!(identity.matches("esp32c6-", [0x12, 0x03, 0x45]));
    }
}
