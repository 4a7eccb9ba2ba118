mod debounce;

pub use debounce::Debouncer;

use embedded_hal::digital::InputPin;

use crate::{Error, Result};

/// Channels carried by the two-byte status payload.
pub const MAX_CHANNELS: usize = 16;

/// Reed switch channels wired on this board.
pub const NUM_SWITCHES: usize = 10;

/// Open/closed state of `N` switch channels, bit `i` set means channel `i` is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SwitchState<const N: usize = NUM_SWITCHES> {
    bits: u16,
}

impl<const N: usize> SwitchState<N> {
    const CHANNELS_FIT: () = assert!(N > 0 && N <= MAX_CHANNELS);

    pub const MASK: u16 = if N >= MAX_CHANNELS {
        u16::MAX
    } else {
        (1u16 << N) - 1
    };

    /// Bits above channel `N - 1` are dropped.
    pub const fn from_bits(bits: u16) -> Self {
        let () = Self::CHANNELS_FIT;
        Self {
            bits: bits & Self::MASK,
        }
    }

    pub const fn all_closed() -> Self {
        Self::from_bits(0)
    }

    pub const fn bits(&self) -> u16 {
        self.bits
    }

    pub fn is_open(&self, channel: usize) -> bool {
        channel < N && self.bits & (1 << channel) != 0
    }

    pub fn set_open(&mut self, channel: usize, open: bool) {
        if channel >= N {
            return;
        }
        if open {
            self.bits |= 1 << channel;
        } else {
            self.bits &= !(1 << channel);
        }
    }

    /// Status payload: byte 0 carries channels 0-7, byte 1 carries the
    /// remaining channels in its low bits. Unused bits are zero.
    pub fn to_payload(&self) -> [u8; 2] {
        [(self.bits & 0xFF) as u8, (self.bits >> 8) as u8]
    }

    pub fn from_payload(payload: [u8; 2]) -> Self {
        Self::from_bits(u16::from_le_bytes(payload))
    }
}

/// Reed switch inputs with pull-ups: a magnet closes the contact and pulls the
/// line low, so a high level reads as open.
pub struct SwitchBank<P, const N: usize = NUM_SWITCHES>
where
    P: InputPin,
{
    pins: [P; N],
}

impl<P, const N: usize> SwitchBank<P, N>
where
    P: InputPin,
{
    pub fn new(pins: [P; N]) -> Self {
        Self { pins }
    }

    pub fn read(&mut self) -> Result<SwitchState<N>> {
        let mut state = SwitchState::all_closed();
        for (channel, pin) in self.pins.iter_mut().enumerate() {
            let open = pin.is_high().map_err(|_| Error::InputRead)?;
            state.set_open(channel, open);
        }
        Ok(state)
    }
}
