use embedded_hal::digital::OutputPin;

use crate::protocol::MAX_PAYLOAD_LEN;
use crate::{
    BroadcastError, Broadcaster, FrameReader, NoIndicator, RadioDriver, ReadError, SendError,
};

/// What happened to one frame from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Dispatch {
    /// Broadcast, with this many payload bytes.
    Sent(usize),
    /// Read in full, but too big for one radio frame, so dropped.
    Oversized(usize),
    /// The radio refused it.
    SendFailed(SendError),
}

/// Running totals kept by a [Bridge].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BridgeStats {
    pub frames: u32,
    pub sent: u32,
    pub send_failures: u32,
    pub oversized: u32,
}

/// The host to air path: reads frames from serial and broadcasts them.
///
/// Nothing here is fatal except the serial port itself going away.
#[derive(Debug)]
pub struct Bridge<R, D, P = NoIndicator> {
    reader: FrameReader<R>,
    broadcaster: Broadcaster<D, P>,
    stats: BridgeStats,
}

impl<R, D> Bridge<R, D> {
    pub fn new(port: R, driver: D) -> Self {
        Self::from_parts(FrameReader::new(port), Broadcaster::new(driver))
    }
}

impl<R, D, P> Bridge<R, D, P> {
    pub fn from_parts(reader: FrameReader<R>, broadcaster: Broadcaster<D, P>) -> Self {
        Self {
            reader,
            broadcaster,
            stats: BridgeStats::default(),
        }
    }

    pub fn reader(&self) -> &FrameReader<R> {
        &self.reader
    }

    pub fn broadcaster(&self) -> &Broadcaster<D, P> {
        &self.broadcaster
    }

    pub fn broadcaster_mut(&mut self) -> &mut Broadcaster<D, P> {
        &mut self.broadcaster
    }

    pub fn stats(&self) -> &BridgeStats {
        &self.stats
    }

    /// Release the reader and broadcaster.
    pub fn free(self) -> (FrameReader<R>, Broadcaster<D, P>) {
        (self.reader, self.broadcaster)
    }
}

impl<R, D, P> Bridge<R, D, P>
where
    R: embedded_io::Read,
    D: RadioDriver,
    P: OutputPin,
{
    /// Read one frame from the host and broadcast it.
    ///
    /// Blocks until a whole frame has arrived. Only read errors are
    /// returned as errors.
    pub fn serve_frame(&mut self) -> Result<Dispatch, ReadError<R::Error>> {
        let frame = self.reader.read_frame()?;
        self.stats.frames = self.stats.frames.wrapping_add(1);

        let len = frame.len();
        if len > MAX_PAYLOAD_LEN {
            self.stats.oversized = self.stats.oversized.wrapping_add(1);
            warn!(
                "dropping frame of {} bytes, more than {}",
                len, MAX_PAYLOAD_LEN
            );
            return Ok(Dispatch::Oversized(len));
        }

        match self.broadcaster.broadcast(frame.payload) {
            Ok(()) => {
                self.stats.sent = self.stats.sent.wrapping_add(1);
                Ok(Dispatch::Sent(len))
            }
            Err(BroadcastError::Oversized(len)) => {
                self.stats.oversized = self.stats.oversized.wrapping_add(1);
                Ok(Dispatch::Oversized(len))
            }
            Err(BroadcastError::Send(e)) => {
                self.stats.send_failures = self.stats.send_failures.wrapping_add(1);
                Ok(Dispatch::SendFailed(e))
            }
        }
    }

    /// Serve frames until the serial port fails.
    pub fn run(&mut self) -> ReadError<R::Error> {
        info!("bridge running");
        loop {
            if let Err(e) = self.serve_frame() {
                error!("serial read failed, bridge stopping");
                return e;
            }
        }
    }
}

impl<R, D, P> Bridge<R, D, P>
where
    R: embedded_io::Read + embedded_io::ReadReady,
    D: RadioDriver,
    P: OutputPin,
{
    /// Serve one frame if the host has started sending one.
    ///
    /// Returns [None] right away if no byte is waiting. Once a frame has
    /// started, this blocks until it is complete.
    pub fn poll(&mut self) -> Result<Option<Dispatch>, ReadError<R::Error>> {
        if !self.reader.is_ready()? {
            return Ok(None);
        }
        self.serve_frame().map(Some)
    }

    /// Spin until the host has started sending a frame.
    pub fn wait_ready(&mut self) -> Result<(), ReadError<R::Error>> {
        Ok(self.reader.wait_ready()?)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::radio::test::{MockPin, MockRadio};
    use crate::HardwareAddress;

    struct TestPort<'a> {
        input: &'a [u8],
    }

    impl embedded_io::ErrorType for TestPort<'_> {
        type Error = core::convert::Infallible;
    }

    impl embedded_io::Read for TestPort<'_> {
        fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
            // two bytes at a time, to exercise the fill loop
            let amt = buf.len().min(2).min(self.input.len());
            buf[..amt].copy_from_slice(&self.input[..amt]);
            self.input = &self.input[amt..];
            Ok(amt)
        }
    }

    impl embedded_io::ReadReady for TestPort<'_> {
        fn read_ready(&mut self) -> Result<bool, Self::Error> {
            Ok(!self.input.is_empty())
        }
    }

    fn bridge(input: &[u8]) -> Bridge<TestPort<'_>, MockRadio> {
        Bridge::new(TestPort { input }, MockRadio::default())
    }

    fn sent(bridge: &Bridge<TestPort<'_>, MockRadio, impl Sized>) -> Vec<Vec<u8>> {
        bridge
            .broadcaster()
            .driver()
            .sent
            .iter()
            .map(|(_, p)| p.clone())
            .collect()
    }

    #[test]
    fn forwards_in_order() {
        let mut bridge = bridge(b"\x05hello\x00\x03abc");
        assert_eq!(bridge.serve_frame(), Ok(Dispatch::Sent(5)));
        assert_eq!(bridge.serve_frame(), Ok(Dispatch::Sent(0)));
        assert_eq!(bridge.serve_frame(), Ok(Dispatch::Sent(3)));
        assert_eq!(bridge.serve_frame(), Err(ReadError::UnexpectedEof));

        assert_eq!(
            sent(&bridge),
            vec![b"hello".to_vec(), Vec::new(), b"abc".to_vec()]
        );
        assert!(bridge
            .broadcaster()
            .driver()
            .sent
            .iter()
            .all(|(a, _)| *a == HardwareAddress::BROADCAST));
        assert_eq!(bridge.broadcaster().driver().adds, 1);
        assert_eq!(
            *bridge.stats(),
            BridgeStats {
                frames: 3,
                sent: 3,
                send_failures: 0,
                oversized: 0,
            }
        );
    }

    #[test]
    fn oversized_rejected_and_drained() {
        let mut input = vec![255];
        input.extend_from_slice(&[0xee; 255]);
        input.extend_from_slice(b"\xfb");
        input.extend_from_slice(&[0xdd; 251]);
        input.extend_from_slice(b"\x02ok");

        let mut bridge = bridge(&input);
        assert_eq!(bridge.serve_frame(), Ok(Dispatch::Oversized(255)));
        assert_eq!(bridge.serve_frame(), Ok(Dispatch::Oversized(251)));
        assert_eq!(bridge.serve_frame(), Ok(Dispatch::Sent(2)));

        assert_eq!(sent(&bridge), vec![b"ok".to_vec()]);
        assert_eq!(bridge.stats().oversized, 2);
        assert_eq!(bridge.stats().frames, 3);
    }

    #[test]
    fn largest_payload_sent() {
        let mut input = vec![250];
        input.extend_from_slice(&[0xcc; 250]);
        let mut bridge = bridge(&input);
        assert_eq!(bridge.serve_frame(), Ok(Dispatch::Sent(250)));
        assert_eq!(sent(&bridge), vec![vec![0xcc; 250]]);
    }

    #[test]
    fn send_failure_continues() {
        let radio = MockRadio {
            fail_with: Some(SendError::Internal),
            ..Default::default()
        };
        let broadcaster = Broadcaster::with_indicator(radio, MockPin::default());
        let reader = FrameReader::new(TestPort {
            input: b"\x01a\x01b",
        });
        let mut bridge = Bridge::from_parts(reader, broadcaster);

        assert_eq!(
            bridge.serve_frame(),
            Ok(Dispatch::SendFailed(SendError::Internal))
        );
        bridge.broadcaster_mut().driver_mut().fail_with = None;
        assert_eq!(bridge.serve_frame(), Ok(Dispatch::Sent(1)));

        assert_eq!(sent(&bridge), vec![b"b".to_vec()]);
        assert_eq!(bridge.stats().send_failures, 1);
        assert_eq!(bridge.stats().sent, 1);
    }

    #[test]
    fn run_until_eof() {
        let mut bridge = bridge(b"\x01a\x01b\x01c");
        assert_eq!(bridge.run(), ReadError::UnexpectedEof);
        assert_eq!(bridge.stats().sent, 3);
    }

    #[test]
    fn poll_without_input() {
        let mut bridge = bridge(b"\x01a");
        assert_eq!(bridge.poll(), Ok(Some(Dispatch::Sent(1))));
        assert_eq!(bridge.poll(), Ok(None));
        assert_eq!(bridge.stats().frames, 1);
    }
}
