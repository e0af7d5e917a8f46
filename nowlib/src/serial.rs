use core::cell::RefCell;

use crate::protocol::serialize::SerializerArray;
use crate::protocol::{FrameSerialize, HostFrame, READ_BUFFER_LEN};
use crate::{FrameError, ReadError, WriteError};

/// Assembles host frames out of a serial byte stream.
///
/// The port's `read` may return fewer bytes than asked for. Short reads
/// are retried until the whole declared length has arrived.
#[derive(Debug)]
pub struct FrameReader<R> {
    port: R,
    buffer: [u8; READ_BUFFER_LEN],
    used: usize,
    short_reads: u32,
}

impl<R> FrameReader<R> {
    pub const fn new(port: R) -> Self {
        Self {
            port,
            buffer: [0; READ_BUFFER_LEN],
            used: 0,
            short_reads: 0,
        }
    }

    /// Release the underlying port.
    pub fn free(self) -> R {
        self.port
    }

    pub fn port(&self) -> &R {
        &self.port
    }

    /// Get the underlying port, mutably.
    ///
    /// Reading from this directly will desynchronize the framing.
    pub fn port_mut(&mut self) -> &mut R {
        &mut self.port
    }

    /// Number of reads that returned less than was asked for.
    pub fn short_reads(&self) -> u32 {
        self.short_reads
    }

    // only the region the last frame wrote to is dirty
    fn clear(&mut self) {
        self.buffer[..self.used].fill(0);
        self.used = 0;
    }
}

impl<R> FrameReader<R>
where
    R: embedded_io::Read,
{
    /// Read one complete frame, blocking until all of it has arrived.
    ///
    /// The returned payload is exactly as long as its length prefix, up
    /// to 255 bytes. Nothing is clamped here.
    pub fn read_frame(&mut self) -> Result<HostFrame<&[u8]>, ReadError<R::Error>> {
        self.clear();

        let mut prefix = [0u8; 1];
        if self.port.read(&mut prefix)? == 0 {
            return Err(ReadError::UnexpectedEof);
        }
        let len = prefix[0] as usize;

        let mut filled = 0;
        while filled < len {
            let wanted = len - filled;
            let amt = self.port.read(&mut self.buffer[filled..len])?;
            if amt == 0 {
                return Err(ReadError::UnexpectedEof);
            }
            filled += amt;
            self.used = filled;

            if amt < wanted {
                self.short_reads = self.short_reads.wrapping_add(1);
                debug!("short read: got {} of {} bytes", amt, wanted);
            }
        }

        debug!("read frame of {} bytes", len);
        Ok(HostFrame::new(&self.buffer[..len]))
    }
}

impl<R> FrameReader<R>
where
    R: embedded_io::ReadReady,
{
    /// Returns [true] if at least one byte can be read without blocking.
    pub fn is_ready(&mut self) -> Result<bool, R::Error> {
        self.port.read_ready()
    }

    /// Spin until at least one byte can be read.
    pub fn wait_ready(&mut self) -> Result<(), R::Error> {
        while !self.port.read_ready()? {
            core::hint::spin_loop();
        }
        Ok(())
    }
}

/// A serial transmitter shared between the dispatch loop and the radio
/// callbacks.
///
/// Every access happens inside a critical section, so a frame written
/// through here is never interleaved with another writer. Meant to live in
/// a `static`.
pub struct SharedSerial<T> {
    tx: critical_section::Mutex<RefCell<Option<T>>>,
}

impl<T> core::fmt::Debug for SharedSerial<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("SharedSerial")
            .field("installed", &self.is_installed())
            .finish()
    }
}

impl<T> Default for SharedSerial<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SharedSerial<T> {
    pub const fn new() -> Self {
        Self {
            tx: critical_section::Mutex::new(RefCell::new(None)),
        }
    }

    /// Install a transmitter, returning the previous one, if any.
    pub fn install(&self, tx: T) -> Option<T> {
        critical_section::with(|cs| self.tx.borrow(cs).replace(Some(tx)))
    }

    /// Remove the installed transmitter.
    pub fn uninstall(&self) -> Option<T> {
        critical_section::with(|cs| self.tx.borrow(cs).take())
    }

    pub fn is_installed(&self) -> bool {
        critical_section::with(|cs| {
            self.tx
                .borrow(cs)
                .try_borrow()
                .map(|tx| tx.is_some())
                .unwrap_or(true)
        })
    }

    /// Run `f` with exclusive access to the transmitter.
    ///
    /// Returns [None] if nothing is installed, or if the transmitter is
    /// already in use further up this same stack.
    pub fn with<F, O>(&self, f: F) -> Option<O>
    where
        F: FnOnce(&mut T) -> O,
    {
        critical_section::with(|cs| {
            let mut tx = self.tx.borrow(cs).try_borrow_mut().ok()?;
            Some(f(tx.as_mut()?))
        })
    }
}

impl<T> SharedSerial<T>
where
    T: embedded_io::Write,
{
    /// Write and flush raw bytes, as one uninterrupted sequence.
    pub fn write_all(&self, data: &[u8]) -> Result<(), WriteError<T::Error>> {
        self.with(|tx| {
            tx.write_all(data)?;
            tx.flush()
        })
        .ok_or(WriteError::Unavailable)?
        .map_err(WriteError::Io)
    }

    /// Encode a whole frame, then write it with a single [Self::write_all()].
    pub fn write_frame<M>(&self, frame: &M) -> Result<(), WriteError<T::Error>>
    where
        M: FrameSerialize,
    {
        let mut ser = SerializerArray::<{ crate::protocol::MAX_WIRE_FRAME_LEN }>::new();
        frame.frame(&mut ser).map_err(|e| match e {
            FrameError::TooLong(len) => WriteError::TooLong(len),
            FrameError::Io(_) => WriteError::TooLong(frame.body_len()),
        })?;
        self.write_all(ser.data())
    }
}
