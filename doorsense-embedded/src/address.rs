use embedded_can::StandardId;
use embedded_hal::digital::InputPin;

use crate::{Error, Result};

/// Number of DIP switch address lines.
pub const NUM_ADDRESS_PINS: usize = 3;

pub const MAX_NODE_ADDRESS: u8 = (1 << NUM_ADDRESS_PINS) - 1;

/// Node address selected on the DIP switches, read once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeAddress(u8);

impl NodeAddress {
    pub fn new(value: u8) -> Result<Self> {
        if value > MAX_NODE_ADDRESS {
            return Err(Error::InvalidConfig);
        }
        Ok(Self(value))
    }

    /// Reads the address lines, first pin is bit 0. A switch turned ON pulls
    /// its line to ground, so a low level sets the bit.
    pub fn read<P>(pins: &mut [P; NUM_ADDRESS_PINS]) -> Result<Self>
    where
        P: InputPin,
    {
        let mut value = 0;
        for (bit, pin) in pins.iter_mut().enumerate() {
            if pin.is_low().map_err(|_| Error::InputRead)? {
                value |= 1 << bit;
            }
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// Identifier of this node's status frames: `base_id + address`.
    pub fn broadcast_id(&self, base_id: u16) -> Result<StandardId> {
        base_id
            .checked_add(self.0 as u16)
            .and_then(StandardId::new)
            .ok_or(Error::InvalidIdentifier)
    }
}

#[cfg(test)]
mod tests {
    use crate::switch::mock::MockPin;

    use super::*;

    #[test]
    fn test_read_active_low_little_endian() {
        // ON, OFF, ON -> 0b101
        let mut pins = [MockPin::new(false), MockPin::new(true), MockPin::new(false)];
        let address = NodeAddress::read(&mut pins).unwrap();

        assert_eq!(address.value(), 5);
    }

    #[test]
    fn test_all_switches_off_is_zero() {
        let mut pins = [MockPin::new(true), MockPin::new(true), MockPin::new(true)];
        assert_eq!(NodeAddress::read(&mut pins).unwrap().value(), 0);
    }

    #[test]
    fn test_broadcast_ids_are_unique() {
        let mut seen = alloc::vec::Vec::new();
        for value in 0..=MAX_NODE_ADDRESS {
            let id = NodeAddress::new(value).unwrap().broadcast_id(0x0A).unwrap();
            assert_eq!(id.as_raw(), 0x0A + value as u16);
            assert!(!seen.contains(&id));
            seen.push(id);
        }

        assert_eq!(seen.first().map(|id| id.as_raw()), Some(0x0A));
        assert_eq!(seen.last().map(|id| id.as_raw()), Some(0x11));
    }

    #[test]
    fn test_address_out_of_range() {
        assert_eq!(NodeAddress::new(8), Err(Error::InvalidConfig));
    }

    #[test]
    fn test_broadcast_id_overflow() {
        let address = NodeAddress::new(7).unwrap();
        assert_eq!(address.broadcast_id(0x7FF), Err(Error::InvalidIdentifier));
    }
}
