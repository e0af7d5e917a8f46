use crate::protocol::{
    AirFrame, ADDRESS_STR_LEN, MAX_AIR_FRAME_PAYLOAD, MAX_PAYLOAD_LEN, RECEIVE_BUFFER_LEN,
};
use crate::{HardwareAddress, ReceiveError, SharedSerial};

/// An owned copy of one frame heard over the air.
///
/// The driver's buffer is only valid for the length of its callback, so
/// the payload is copied out first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AirReceipt {
    sender: HardwareAddress,
    len: usize,
    buffer: [u8; RECEIVE_BUFFER_LEN],
}

impl AirReceipt {
    /// Copy a received frame, clamped to the radio's payload ceiling.
    ///
    /// The byte after the payload is always zero.
    pub fn new(sender: &[u8; 6], data: &[u8]) -> Self {
        let len = data.len().min(MAX_PAYLOAD_LEN);
        let mut buffer = [0; RECEIVE_BUFFER_LEN];
        buffer[..len].copy_from_slice(&data[..len]);
        Self {
            sender: HardwareAddress::new(*sender),
            len,
            buffer,
        }
    }

    pub fn sender(&self) -> HardwareAddress {
        self.sender
    }

    pub fn payload(&self) -> &[u8] {
        &self.buffer[..self.len]
    }

    /// Length of the frame body sent to the host, address included.
    pub fn encoded_len(&self) -> usize {
        ADDRESS_STR_LEN + self.len
    }

    pub fn as_frame(&self) -> AirFrame<&[u8]> {
        AirFrame::new(self.sender, self.payload())
    }
}

/// Forwards frames heard over the air to the host.
///
/// Each call is independent. Frames are written whole through the shared
/// transmitter, so they never interleave with other serial output.
#[derive(Debug)]
pub struct ReceiveHandler<'a, T> {
    serial: &'a SharedSerial<T>,
}

impl<T> Clone for ReceiveHandler<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ReceiveHandler<'_, T> {}

impl<'a, T> ReceiveHandler<'a, T> {
    pub const fn new(serial: &'a SharedSerial<T>) -> Self {
        Self { serial }
    }

    pub fn serial(&self) -> &'a SharedSerial<T> {
        self.serial
    }
}

impl<T> ReceiveHandler<'_, T>
where
    T: embedded_io::Write,
{
    /// Handle one received frame, as called by the radio driver.
    pub fn on_receive(
        &self,
        sender: &[u8; 6],
        data: &[u8],
    ) -> Result<(), ReceiveError<T::Error>> {
        if data.len() > MAX_PAYLOAD_LEN {
            warn!(
                "received {} bytes, clamping to {}",
                data.len(),
                MAX_PAYLOAD_LEN
            );
        }

        let receipt = AirReceipt::new(sender, data);
        if receipt.payload().len() > MAX_AIR_FRAME_PAYLOAD {
            warn!(
                "dropping {} bytes from {}: too long for one frame",
                receipt.payload().len(),
                receipt.sender().to_hex().as_str()
            );
            return Err(ReceiveError::TooLong(receipt.encoded_len()));
        }

        trace!(
            "forwarding {} bytes from {}",
            receipt.payload().len(),
            receipt.sender().to_hex().as_str()
        );
        self.serial.write_frame(&receipt.as_frame())?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use quickcheck::TestResult;
    use quickcheck_macros::quickcheck;

    use super::*;
    use crate::protocol::{self, ParseResult};
    use crate::WriteError;

    type Received = (Result<(), ReceiveError<core::convert::Infallible>>, Vec<u8>);

    fn received(sender: &[u8; 6], data: &[u8]) -> Received {
        let serial: SharedSerial<Vec<u8>> = SharedSerial::new();
        serial.install(Vec::new());
        let result = ReceiveHandler::new(&serial).on_receive(sender, data);
        (result, serial.uninstall().unwrap_or_default())
    }

    #[test]
    fn example_frame() {
        let (result, wire) = received(&[0xaa, 0xbb, 0xcc, 0x01, 0x02, 0x03], b"hello");
        assert_eq!(result, Ok(()));
        assert_eq!(wire, b"\x11aabbcc010203hello");
    }

    #[test]
    fn empty_payload() {
        let (result, wire) = received(&[0; 6], b"");
        assert_eq!(result, Ok(()));
        assert_eq!(wire, b"\x0c000000000000");
    }

    #[quickcheck]
    fn decodes_to_sender_and_payload(sender: HardwareAddress, payload: Vec<u8>) -> TestResult {
        if payload.len() > MAX_AIR_FRAME_PAYLOAD {
            return TestResult::discard();
        }

        let (result, wire) = received(sender.octets(), &payload);
        if result.is_err() || wire[0] as usize != payload.len() + ADDRESS_STR_LEN {
            return TestResult::failed();
        }

        let (consumed, frame) = protocol::parse::<AirFrame<&[u8]>>(&wire);
        TestResult::from_bool(
            consumed == wire.len()
                && &wire[1..1 + ADDRESS_STR_LEN] == sender.to_hex().as_bytes()
                && frame.ok() == Some(AirFrame::new(sender, &payload[..])),
        )
    }

    #[test]
    fn longest_forwarded() {
        let payload = [0x33; MAX_AIR_FRAME_PAYLOAD];
        let (result, wire) = received(&[1; 6], &payload);
        assert_eq!(result, Ok(()));
        assert_eq!(wire[0], 0xff);
        assert_eq!(wire.len(), 256);
    }

    #[test]
    fn too_long_dropped() {
        for len in MAX_AIR_FRAME_PAYLOAD + 1..=MAX_PAYLOAD_LEN {
            let payload = vec![0x44; len];
            let (result, wire) = received(&[1; 6], &payload);
            assert_eq!(result, Err(ReceiveError::TooLong(len + ADDRESS_STR_LEN)));
            assert!(wire.is_empty());
        }
    }

    #[test]
    fn clamped_then_dropped() {
        let payload = [0x55; 300];
        let receipt = AirReceipt::new(&[1; 6], &payload);
        assert_eq!(receipt.payload().len(), MAX_PAYLOAD_LEN);
        assert_eq!(receipt.buffer[MAX_PAYLOAD_LEN], 0);

        let (result, _) = received(&[1; 6], &payload);
        assert_eq!(
            result,
            Err(ReceiveError::TooLong(MAX_PAYLOAD_LEN + ADDRESS_STR_LEN))
        );
    }

    #[test]
    fn not_installed() {
        let serial: SharedSerial<Vec<u8>> = SharedSerial::new();
        assert_eq!(
            ReceiveHandler::new(&serial).on_receive(&[0; 6], b"x"),
            Err(ReceiveError::Write(WriteError::Unavailable))
        );
    }

    #[test]
    fn frames_do_not_interleave() {
        let serial: SharedSerial<Vec<u8>> = SharedSerial::new();
        serial.install(Vec::new());
        let handler = ReceiveHandler::new(&serial);

        // a receive arriving while the dispatch loop holds the transmitter
        // is refused whole, never spliced into the other write
        let nested = serial.with(|tx| {
            tx.extend_from_slice(b"\x01a");
            handler.on_receive(&[2; 6], b"b")
        });
        assert_eq!(
            nested,
            Some(Err(ReceiveError::Write(WriteError::Unavailable)))
        );

        handler.on_receive(&[2; 6], b"c").unwrap();
        let wire = serial.uninstall().unwrap_or_default();

        let (n, first) = protocol::parse::<protocol::HostFrame<&[u8]>>(&wire);
        assert_eq!(first.ok(), Some(protocol::HostFrame::new(&b"a"[..])));
        let (_, second) = protocol::parse::<AirFrame<&[u8]>>(&wire[n..]);
        assert!(matches!(second, ParseResult::Ok(_, f) if f.payload == b"c"));
    }

    #[cfg(feature = "log")]
    #[test]
    fn frames_and_log_lines_from_two_threads() {
        use log::Log;

        const COUNT: usize = 2000;

        let serial: SharedSerial<Vec<u8>> = SharedSerial::new();
        serial.install(Vec::new());
        let logger = crate::SerialLogger::new(&serial, log::LevelFilter::Info);
        let handler = ReceiveHandler::new(&serial);

        std::thread::scope(|s| {
            s.spawn(|| {
                for i in 0..COUNT {
                    logger.log(
                        &log::Record::builder()
                            .level(log::Level::Info)
                            .args(format_args!("line {}", i))
                            .build(),
                    );
                }
            });
            s.spawn(|| {
                for i in 0..COUNT {
                    let payload = format!("frame {}", i);
                    handler.on_receive(&[3; 6], payload.as_bytes()).unwrap();
                }
            });
        });

        // frames here are 19..=22 bytes, so a `[` always starts a line
        let wire = serial.uninstall().unwrap_or_default();
        let mut rest = &wire[..];
        let (mut lines, mut frames) = (0, 0);
        while !rest.is_empty() {
            if rest[0] == b'[' {
                let end = rest.iter().position(|&b| b == b'\n').unwrap();
                assert_eq!(&rest[..end], format!("[INFO] line {}", lines).as_bytes());
                lines += 1;
                rest = &rest[end + 1..];
            } else {
                let (consumed, frame) = protocol::parse::<AirFrame<&[u8]>>(rest);
                let frame = frame.ok().unwrap();
                assert_eq!(frame.sender, HardwareAddress::new([3; 6]));
                assert_eq!(frame.payload, format!("frame {}", frames).as_bytes());
                frames += 1;
                rest = &rest[consumed..];
            }
        }
        assert_eq!((lines, frames), (COUNT, COUNT));
    }
}
