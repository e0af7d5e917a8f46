use nom::combinator::{map_opt, rest};
use nom::IResult;

use super::parse::FrameParse;
use super::serialize::{FrameSerialize, Serializer};
use super::ADDRESS_STR_LEN;
use crate::HardwareAddress;

/// A frame from the host, carrying one payload to broadcast.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HostFrame<I> {
    pub payload: I,
}

impl<I> HostFrame<I> {
    pub fn new(payload: I) -> Self {
        Self { payload }
    }

    pub fn map<F, J>(self, f: F) -> HostFrame<J>
    where
        F: FnOnce(I) -> J,
    {
        HostFrame {
            payload: f(self.payload),
        }
    }

    pub fn map_ref<F, J>(&self, f: F) -> HostFrame<J>
    where
        F: FnOnce(&I) -> J,
    {
        HostFrame {
            payload: f(&self.payload),
        }
    }
}

impl<I> HostFrame<I>
where
    I: AsRef<[u8]>,
{
    pub fn len(&self) -> usize {
        self.payload.as_ref().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(feature = "alloc")]
    pub fn to_owned(&self) -> HostFrame<alloc::vec::Vec<u8>> {
        self.map_ref(|p| p.as_ref().to_vec())
    }
}

impl<I> FrameSerialize for HostFrame<I>
where
    I: AsRef<[u8]>,
{
    fn frame_body<S>(&self, ser: &mut S) -> Result<(), S::Error>
    where
        S: Serializer,
    {
        ser.write_bytes(self.payload.as_ref())
    }
}

impl<'a> FrameParse<'a> for HostFrame<&'a [u8]> {
    fn parse_body(input: &'a [u8]) -> IResult<&'a [u8], Self> {
        let (input, payload) = rest(input)?;
        Ok((input, HostFrame { payload }))
    }
}

/// A frame to the host, carrying one payload heard over the air.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AirFrame<I> {
    pub sender: HardwareAddress,
    pub payload: I,
}

impl<I> AirFrame<I> {
    pub fn new(sender: HardwareAddress, payload: I) -> Self {
        Self { sender, payload }
    }

    pub fn map<F, J>(self, f: F) -> AirFrame<J>
    where
        F: FnOnce(I) -> J,
    {
        AirFrame {
            sender: self.sender,
            payload: f(self.payload),
        }
    }

    pub fn map_ref<F, J>(&self, f: F) -> AirFrame<J>
    where
        F: FnOnce(&I) -> J,
    {
        AirFrame {
            sender: self.sender,
            payload: f(&self.payload),
        }
    }
}

impl<I> AirFrame<I>
where
    I: AsRef<[u8]>,
{
    pub fn len(&self) -> usize {
        self.payload.as_ref().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(feature = "alloc")]
    pub fn to_owned(&self) -> AirFrame<alloc::vec::Vec<u8>> {
        self.map_ref(|p| p.as_ref().to_vec())
    }
}

impl<I> FrameSerialize for AirFrame<I>
where
    I: AsRef<[u8]>,
{
    fn frame_body<S>(&self, ser: &mut S) -> Result<(), S::Error>
    where
        S: Serializer,
    {
        ser.write_bytes(self.sender.to_hex().as_bytes())?;
        ser.write_bytes(self.payload.as_ref())
    }
}

impl<'a> FrameParse<'a> for AirFrame<&'a [u8]> {
    fn parse_body(input: &'a [u8]) -> IResult<&'a [u8], Self> {
        let (input, sender) = map_opt(
            nom::bytes::complete::take(ADDRESS_STR_LEN),
            HardwareAddress::from_hex,
        )(input)?;
        let (input, payload) = rest(input)?;
        Ok((input, AirFrame { sender, payload }))
    }
}
