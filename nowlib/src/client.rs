use crate::protocol;
use crate::protocol::{
    AirFrame, FrameParse, FrameSerialize, HostFrame, ParseResult, MAX_WIRE_FRAME_LEN,
};
use crate::{FrameError, ReadError};

/// Re-export to allow using [Client] with [std::io] streams.
#[cfg(feature = "std")]
pub use embedded_io_adapters::std::FromStd;

/// A trait to encapsulate a buffer with filled and unfilled areas.
pub trait ClientBuffer {
    /// Modify the filled part of the buffer to remove the first `n` bytes.
    fn skip(&mut self, n: usize);

    /// Returns [true] if the buffer is full.
    fn is_full(&self) -> bool;

    /// Read data from a reader into the filled part, consuming unfilled areas.
    fn read<R>(&mut self, reader: &mut R) -> Result<usize, R::Error>
    where
        R: embedded_io::Read;

    /// Get a hold of the accumulated data.
    fn data(&self) -> &[u8];

    /// Clear the buffer.
    fn clear(&mut self);
}

/// A [ClientBuffer] using a flat array.
///
/// The default size holds two of the largest frames.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ArrayBuffer<const SIZE: usize = { 2 * MAX_WIRE_FRAME_LEN }> {
    len: usize,
    buffer: [u8; SIZE],
}

impl<const SIZE: usize> ArrayBuffer<SIZE> {
    pub const fn new() -> Self {
        Self {
            len: 0,
            buffer: [0u8; SIZE],
        }
    }
}

impl<const SIZE: usize> Default for ArrayBuffer<SIZE> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const SIZE: usize> ClientBuffer for ArrayBuffer<SIZE> {
    fn skip(&mut self, n: usize) {
        let n = n.min(self.len);
        self.buffer.copy_within(n..self.len, 0);
        self.len -= n;
    }

    fn is_full(&self) -> bool {
        self.len >= SIZE
    }

    fn read<R>(&mut self, reader: &mut R) -> Result<usize, R::Error>
    where
        R: embedded_io::Read,
    {
        let amt = reader.read(&mut self.buffer[self.len..])?;
        self.len += amt;
        Ok(amt)
    }

    fn data(&self) -> &[u8] {
        &self.buffer[..self.len]
    }

    fn clear(&mut self) {
        self.len = 0;
    }
}

/// A host-side client for the bridge.
///
/// Writes [HostFrame]s to be broadcast, and reads back [AirFrame]s heard
/// by the bridge.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Client<F, B = ArrayBuffer> {
    port: F,
    buffer: B,
    skip: Option<usize>,
    needs_read: bool,
}

/// A client using an [std::io] port.
#[cfg(feature = "std")]
pub type ClientStd<F, B = ArrayBuffer> = Client<FromStd<F>, B>;

#[cfg(feature = "std")]
impl<F, B> Client<FromStd<F>, B>
where
    B: ClientBuffer,
{
    /// Create a new client using an [std::io] port.
    pub fn new_std(port: F) -> Self
    where
        B: Default,
    {
        Self::new(FromStd::new(port))
    }
}

impl<F, B> Client<F, B>
where
    B: ClientBuffer,
{
    /// Create a new client.
    pub fn new(port: F) -> Self
    where
        B: Default,
    {
        Self::new_with(B::default(), port)
    }

    /// Create a new client with the provided internal buffer.
    pub fn new_with(buffer: B, port: F) -> Self {
        Self {
            port,
            buffer,
            skip: None,
            needs_read: true,
        }
    }

    /// Release the components used to create this client.
    pub fn free(self) -> (B, F) {
        (self.buffer, self.port)
    }

    /// Get the underlying buffer.
    pub fn buffer(&self) -> &B {
        &self.buffer
    }

    /// Get the underlying port.
    pub fn port(&self) -> &F {
        &self.port
    }

    /// Get the underlying port, mutably
    ///
    /// Using this won't confuse the client, but it might cause you to miss
    /// frames if you are not careful.
    pub fn port_mut(&mut self) -> &mut F {
        &mut self.port
    }

    /// Read from the port into the internal buffer, if needed. First
    /// half of [Self::read()].
    pub fn read_into_buffer(&mut self) -> Result<(), ReadError<F::Error>>
    where
        F: embedded_io::Read,
    {
        // apply skip from last read cycle. see parse().
        if let Some(skip) = self.skip.take() {
            self.buffer.skip(skip);
        }

        // a full buffer with no frame in it can never make progress
        if self.buffer.is_full() {
            self.buffer.clear();
            self.needs_read = true;
        }

        if self.needs_read {
            let amt = self.buffer.read(&mut self.port)?;
            if amt == 0 {
                return Err(ReadError::UnexpectedEof);
            }
            self.needs_read = false;
        }

        Ok(())
    }

    /// Parse from the internal buffer. Second half of [Self::read()].
    pub fn parse<'a, M>(&'a mut self) -> ParseResult<&'a [u8], M>
    where
        M: FrameParse<'a>,
    {
        let (skip, res) = protocol::parse(self.buffer.data());

        if let ParseResult::None = res {
            self.needs_read = true;
        }

        // store the skip value until next read_into_buffer, because
        // modifying self.buffer would interfere with the borrow in res
        if skip > 0 {
            self.skip = Some(skip);
        }

        res
    }

    /// Read from the port and attempt to parse a frame.
    pub fn read<'a, M>(&'a mut self) -> Result<ParseResult<&'a [u8], M>, ReadError<F::Error>>
    where
        M: FrameParse<'a>,
        F: embedded_io::Read,
    {
        self.read_into_buffer()?;
        Ok(self.parse())
    }

    /// Read an [AirFrame], as sent by the bridge.
    pub fn read_air(
        &mut self,
    ) -> Result<ParseResult<&[u8], AirFrame<&[u8]>>, ReadError<F::Error>>
    where
        F: embedded_io::Read,
    {
        self.read()
    }

    /// Read a [HostFrame], as sent to the bridge.
    pub fn read_host(
        &mut self,
    ) -> Result<ParseResult<&[u8], HostFrame<&[u8]>>, ReadError<F::Error>>
    where
        F: embedded_io::Read,
    {
        self.read()
    }

    /// Write a frame to the port.
    pub fn write<M>(&mut self, frame: &M) -> Result<(), FrameError<F::Error>>
    where
        F: embedded_io::Write,
        M: FrameSerialize,
    {
        protocol::serialize(&mut self.port, frame)?;
        self.port.flush()?;
        Ok(())
    }
}
