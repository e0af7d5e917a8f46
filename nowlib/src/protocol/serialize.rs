use super::{MAX_FRAME_LEN, MAX_WIRE_FRAME_LEN};
use crate::FrameError;

/// A trait for serializing frames.
pub trait Serializer {
    type Error;

    fn write_u8(&mut self, val: u8) -> Result<(), Self::Error>;

    // everything else can be written in terms of write_u8, but
    // should be specialized where it's cheap. If you add a method
    // here, add one to &mut S and SerializerLength too.

    fn write_bytes(&mut self, val: &[u8]) -> Result<(), Self::Error> {
        for b in val.iter() {
            self.write_u8(*b)?;
        }
        Ok(())
    }
}

impl<S> Serializer for &mut S
where
    S: Serializer,
{
    type Error = S::Error;

    fn write_u8(&mut self, val: u8) -> Result<(), Self::Error> {
        (*self).write_u8(val)
    }

    fn write_bytes(&mut self, val: &[u8]) -> Result<(), Self::Error> {
        (*self).write_bytes(val)
    }
}

/// Wrap an [embedded_io::Write] to become a [Serializer].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SerializerWrap<T> {
    inner: T,
}

impl<T> SerializerWrap<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn done(self) -> T {
        self.inner
    }
}

impl<T> core::ops::Deref for SerializerWrap<T> {
    type Target = T;
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<T> core::ops::DerefMut for SerializerWrap<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

impl<T> Serializer for SerializerWrap<T>
where
    T: embedded_io::Write,
{
    type Error = T::Error;

    fn write_u8(&mut self, val: u8) -> Result<(), Self::Error> {
        self.inner.write_all(&[val])
    }

    fn write_bytes(&mut self, val: &[u8]) -> Result<(), Self::Error> {
        self.inner.write_all(val)
    }
}

/// A serializer that only counts bytes written.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SerializerLength {
    len: usize,
}

impl SerializerLength {
    pub fn new() -> Self {
        SerializerLength { len: 0 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Serializer for SerializerLength {
    type Error = void::Void;

    fn write_u8(&mut self, _val: u8) -> Result<(), Self::Error> {
        self.len += 1;
        Ok(())
    }

    fn write_bytes(&mut self, val: &[u8]) -> Result<(), Self::Error> {
        self.len += val.len();
        Ok(())
    }
}

/// The fixed buffer in a [SerializerArray] ran out of room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Overflow;

/// A serializer into a fixed-size array.
///
/// Used to assemble a whole frame before any of it touches the wire.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SerializerArray<const SIZE: usize = MAX_WIRE_FRAME_LEN> {
    len: usize,
    buffer: [u8; SIZE],
}

impl<const SIZE: usize> SerializerArray<SIZE> {
    pub const fn new() -> Self {
        Self {
            len: 0,
            buffer: [0; SIZE],
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.buffer[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.buffer[..self.len].fill(0);
        self.len = 0;
    }
}

impl<const SIZE: usize> Default for SerializerArray<SIZE> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const SIZE: usize> Serializer for SerializerArray<SIZE> {
    type Error = Overflow;

    fn write_u8(&mut self, val: u8) -> Result<(), Self::Error> {
        self.write_bytes(&[val])
    }

    fn write_bytes(&mut self, val: &[u8]) -> Result<(), Self::Error> {
        let end = self.len + val.len();
        if end > SIZE {
            return Err(Overflow);
        }
        self.buffer[self.len..end].copy_from_slice(val);
        self.len = end;
        Ok(())
    }
}

/// A serializer into a growable [alloc::vec::Vec].
#[cfg(feature = "alloc")]
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SerializerVec {
    inner: alloc::vec::Vec<u8>,
}

#[cfg(feature = "alloc")]
impl SerializerVec {
    pub fn new() -> Self {
        Self {
            inner: alloc::vec::Vec::new(),
        }
    }

    pub fn done(self) -> alloc::vec::Vec<u8> {
        self.inner
    }
}

#[cfg(feature = "alloc")]
impl Serializer for SerializerVec {
    type Error = core::convert::Infallible;

    fn write_u8(&mut self, val: u8) -> Result<(), Self::Error> {
        self.inner.push(val);
        Ok(())
    }

    fn write_bytes(&mut self, val: &[u8]) -> Result<(), Self::Error> {
        self.inner.extend_from_slice(val);
        Ok(())
    }
}

/// A trait for serializing frames.
pub trait FrameSerialize {
    /// Serialize just the frame body, without the length prefix.
    ///
    /// For this to work correctly, it *must* perform the same actions
    /// every time it is called with the same frame. That means no IO,
    /// no funny business.
    fn frame_body<S>(&self, ser: &mut S) -> Result<(), S::Error>
    where
        S: Serializer;

    // these can all use default implementations

    /// Length of the frame body, without the length prefix.
    fn body_len(&self) -> usize {
        use void::ResultVoidExt;

        let mut len_ser = SerializerLength::new();
        self.frame_body(&mut len_ser).void_unwrap();
        len_ser.len()
    }

    /// Serialize the whole frame: length prefix, then body.
    ///
    /// Nothing is written if the body doesn't fit a length prefix.
    fn frame<S>(&self, ser: &mut S) -> Result<(), FrameError<S::Error>>
    where
        S: Serializer,
    {
        let len = self.body_len();
        if len > MAX_FRAME_LEN {
            return Err(FrameError::TooLong(len));
        }

        ser.write_u8(len as u8)?;
        self.frame_body(ser)?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    struct Body<'a>(&'a [u8]);

    impl FrameSerialize for Body<'_> {
        fn frame_body<S>(&self, ser: &mut S) -> Result<(), S::Error>
        where
            S: Serializer,
        {
            ser.write_bytes(self.0)
        }
    }

    #[test]
    fn frame_has_prefix() {
        let mut ser = SerializerArray::<8>::new();
        Body(b"abc").frame(&mut ser).unwrap();
        assert_eq!(ser.data(), b"\x03abc");
    }

    #[test]
    fn empty_frame_is_just_prefix() {
        let mut ser = SerializerArray::<8>::new();
        Body(b"").frame(&mut ser).unwrap();
        assert_eq!(ser.data(), b"\x00");
    }

    #[test]
    fn longest_frame_fits_wire_buffer() {
        let body = [0x5a; MAX_FRAME_LEN];
        let mut ser = SerializerArray::<MAX_WIRE_FRAME_LEN>::new();
        Body(&body).frame(&mut ser).unwrap();
        assert_eq!(ser.len(), MAX_WIRE_FRAME_LEN);
        assert_eq!(ser.data()[0], 0xff);
    }

    #[test]
    fn too_long_writes_nothing() {
        let body = [0; MAX_FRAME_LEN + 1];
        let mut ser = SerializerArray::<512>::new();
        assert_eq!(
            Body(&body).frame(&mut ser),
            Err(FrameError::TooLong(MAX_FRAME_LEN + 1))
        );
        assert!(ser.is_empty());
    }

    #[test]
    fn array_overflow() {
        let mut ser = SerializerArray::<2>::new();
        assert_eq!(ser.write_bytes(b"abc"), Err(Overflow));
        assert_eq!(ser.write_bytes(b"ab"), Ok(()));
        assert_eq!(ser.write_u8(b'c'), Err(Overflow));
    }

    #[test]
    fn array_clear_zeroes_used_bytes() {
        let mut ser = SerializerArray::<4>::new();
        ser.write_bytes(b"abcd").unwrap();
        ser.clear();
        assert!(ser.is_empty());
        assert_eq!(ser.buffer, [0; 4]);
    }
}
