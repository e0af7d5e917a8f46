//! The serial protocol spoken between the host and the bridge.
//!
//! Both directions share one framing: a single length byte, then exactly
//! that many body bytes.
//!
//! ```text
//! host -> bridge:  [N] [payload; N]                      N <= 250
//! bridge -> host:  [M] [sender; 12 hex digits] [payload]  M = 12 + payload
//! ```
//!
//! Host frames longer than [MAX_PAYLOAD_LEN] are read in full and then
//! rejected, never truncated. Air frames whose payload is longer than
//! [MAX_AIR_FRAME_PAYLOAD] can't be described by the length byte and are
//! rejected too.

use crate::{FrameError, HardwareAddress};

pub const BAUD_RATE: u32 = 115200;

/// Largest payload a single radio frame can carry.
pub const MAX_PAYLOAD_LEN: usize = 250;

/// Largest frame body the length prefix can describe.
pub const MAX_FRAME_LEN: usize = u8::MAX as usize;

pub const ADDRESS_LEN: usize = 6;

/// Length of an address in hex, as sent to the host.
pub const ADDRESS_STR_LEN: usize = 2 * ADDRESS_LEN;

/// Largest payload that fits in a frame to the host, after the address.
pub const MAX_AIR_FRAME_PAYLOAD: usize = MAX_FRAME_LEN - ADDRESS_STR_LEN;

/// Size of the buffer host frames are assembled in.
pub const READ_BUFFER_LEN: usize = MAX_FRAME_LEN + 1;

/// Size of the buffer received payloads are copied into, with room for a
/// trailing terminator.
pub const RECEIVE_BUFFER_LEN: usize = MAX_PAYLOAD_LEN + 1;

/// Largest frame on the wire, length prefix included.
pub const MAX_WIRE_FRAME_LEN: usize = MAX_FRAME_LEN + 1;

/// The only destination the bridge ever sends to.
pub const BROADCAST_ADDRESS: HardwareAddress = HardwareAddress::BROADCAST;

pub mod parse;
pub use parse::{FrameParse, ParseResult};

pub mod serialize;
pub use serialize::FrameSerialize;

mod frames;
pub use frames::*;

/// Parse one frame off the front of the input.
///
/// Returns the *number of consumed bytes* and the parse result. A frame
/// that is complete but doesn't parse as `M` is still consumed.
pub fn parse<'a, M>(input: &'a [u8]) -> (usize, ParseResult<&'a [u8], M>)
where
    M: FrameParse<'a>,
{
    parse::frame_parse(input)
}

/// Serialize a frame, length prefix and all, into a writer.
pub fn serialize<W, M>(writer: &mut W, frame: &M) -> Result<(), FrameError<W::Error>>
where
    W: embedded_io::Write,
    M: FrameSerialize,
{
    let mut ser = serialize::SerializerWrap::new(writer);
    frame.frame(&mut ser)
}
