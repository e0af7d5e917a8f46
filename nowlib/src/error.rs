/// An error reading from a serial port.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReadError<E> {
    /// EOF in underlying stream.
    UnexpectedEof,
    /// Other IO error in underlying stream.
    Io(E),
}

#[cfg(feature = "std")]
impl<E> std::error::Error for ReadError<E> where E: core::fmt::Debug {}

impl<E> core::fmt::Display for ReadError<E>
where
    E: core::fmt::Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            Self::UnexpectedEof => write!(f, "unexpected eof"),
            Self::Io(e) => write!(f, "io error: {:?}", e),
        }
    }
}

impl<E> From<E> for ReadError<E> {
    fn from(other: E) -> Self {
        Self::Io(other)
    }
}

/// An error encoding a frame.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError<E> {
    /// The frame body is longer than a length prefix can describe.
    TooLong(usize),
    /// Error from the underlying serializer.
    Io(E),
}

#[cfg(feature = "std")]
impl<E> std::error::Error for FrameError<E> where E: core::fmt::Debug {}

impl<E> core::fmt::Display for FrameError<E>
where
    E: core::fmt::Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            Self::TooLong(len) => write!(f, "frame body of {} bytes is too long", len),
            Self::Io(e) => write!(f, "io error: {:?}", e),
        }
    }
}

impl<E> From<E> for FrameError<E> {
    fn from(other: E) -> Self {
        Self::Io(other)
    }
}

/// An error writing to a [crate::SharedSerial].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WriteError<E> {
    /// No transmitter is installed, or it is already in use by this context.
    Unavailable,
    /// The frame body is longer than a length prefix can describe.
    TooLong(usize),
    /// IO error in the transmitter.
    Io(E),
}

#[cfg(feature = "std")]
impl<E> std::error::Error for WriteError<E> where E: core::fmt::Debug {}

impl<E> core::fmt::Display for WriteError<E>
where
    E: core::fmt::Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            Self::Unavailable => write!(f, "serial transmitter unavailable"),
            Self::TooLong(len) => write!(f, "frame body of {} bytes is too long", len),
            Self::Io(e) => write!(f, "io error: {:?}", e),
        }
    }
}

/// A radio driver result other than success.
///
/// Raw ESP-NOW codes convert with [SendError::from_code()].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SendError {
    /// The radio driver is not initialized.
    NotInitialized,
    /// The driver rejected an argument.
    InvalidArgument,
    /// Internal driver error.
    Internal,
    /// The driver ran out of memory.
    OutOfMemory,
    /// The destination is not in the peer table.
    PeerNotFound,
    /// Any other driver code.
    Unknown(i32),
}

#[cfg(feature = "std")]
impl std::error::Error for SendError {}

impl core::fmt::Display for SendError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            Self::NotInitialized => write!(f, "radio not initialized"),
            Self::InvalidArgument => write!(f, "invalid argument"),
            Self::Internal => write!(f, "internal error"),
            Self::OutOfMemory => write!(f, "out of memory"),
            Self::PeerNotFound => write!(f, "peer not found"),
            Self::Unknown(code) => write!(f, "unknown error ({:#x})", code),
        }
    }
}

/// An error broadcasting a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BroadcastError {
    /// The payload is larger than one radio frame.
    Oversized(usize),
    /// The radio driver refused the send.
    Send(SendError),
}

#[cfg(feature = "std")]
impl std::error::Error for BroadcastError {}

impl core::fmt::Display for BroadcastError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            Self::Oversized(len) => write!(f, "payload of {} bytes is oversized", len),
            Self::Send(e) => write!(f, "send failed: {}", e),
        }
    }
}

impl From<SendError> for BroadcastError {
    fn from(other: SendError) -> Self {
        Self::Send(other)
    }
}

/// An error passing a received payload on to the host.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReceiveError<E> {
    /// The address and payload together don't fit in one frame.
    TooLong(usize),
    /// Writing the frame failed.
    Write(WriteError<E>),
}

#[cfg(feature = "std")]
impl<E> std::error::Error for ReceiveError<E> where E: core::fmt::Debug {}

impl<E> core::fmt::Display for ReceiveError<E>
where
    E: core::fmt::Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            Self::TooLong(len) => write!(f, "received frame of {} bytes is too long", len),
            Self::Write(e) => write!(f, "{}", e),
        }
    }
}

impl<E> From<WriteError<E>> for ReceiveError<E> {
    fn from(other: WriteError<E>) -> Self {
        Self::Write(other)
    }
}
