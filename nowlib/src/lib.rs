//! A serial ⇄ ESP-NOW broadcast bridge.
//!
//! The host writes length-prefixed frames over serial, and each one goes
//! out as a single broadcast to every radio in range. Every broadcast heard
//! from a peer comes back to the host as a length-prefixed frame carrying
//! the sender's address in hex, followed by the payload. See [protocol] for
//! the exact wire format.
//!
//! The device side is built from [FrameReader] and [Broadcaster] (driven by
//! [Bridge]) on the way out, and [ReceiveHandler] writing through a
//! [SharedSerial] on the way in. The host side is [Client].

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[macro_use]
mod fmt;

mod address;
pub use address::*;

mod error;
pub use error::*;

pub mod protocol;

mod client;
pub use client::*;

mod serial;
pub use serial::*;

mod radio;
pub use radio::*;

mod receive;
pub use receive::*;

mod bridge;
pub use bridge::*;

#[cfg(feature = "log")]
mod logger;
#[cfg(feature = "log")]
pub use logger::*;
