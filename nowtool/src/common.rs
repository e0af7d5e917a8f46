use std::io::{Read, Write};

#[derive(clap::Args, Debug, Clone)]
pub struct SerialPortArgs {
    /// Serial port, or host:port with --tcp.
    #[arg(default_value_t = default_serial_port())]
    port: String,
    #[arg(short, long, default_value_t = nowlib::protocol::BAUD_RATE)]
    baud: u32,
    /// Connect to a TCP socket instead, such as `nowtool simulate`.
    #[arg(long)]
    tcp: bool,
}

pub enum SerialPort {
    Serial(std::io::BufWriter<Box<dyn serialport::SerialPort>>),
    Tcp(std::io::BufWriter<std::net::TcpStream>),
}

pub fn default_serial_port() -> String {
    if let Ok(infos) = serialport::available_ports() {
        for info in infos {
            #[cfg(target_os = "macos")]
            if info.port_name.ends_with(".Bluetooth-Incoming-Port") {
                // these ports are almost always *not* what we want
                continue;
            }

            #[cfg(target_os = "macos")]
            if info.port_name.starts_with("/dev/tty.") {
                // macos ports with tty. have flow control we don't use
                // use cu. ports instead!
                continue;
            }

            return info.port_name.clone();
        }
    }

    // not great, but reasonable fallback
    "/dev/ttyUSB0".to_owned()
}

impl std::io::Read for SerialPort {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Self::Serial(port) => port.get_mut().read(buf),
            Self::Tcp(port) => port.get_mut().read(buf),
        }
    }
}

impl std::io::Write for SerialPort {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            Self::Serial(port) => port.write(buf),
            Self::Tcp(port) => port.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Self::Serial(port) => port.flush(),
            Self::Tcp(port) => port.flush(),
        }
    }
}

impl SerialPort {
    /// Open a second handle onto the same port, for a writer thread.
    pub fn try_clone(&self) -> anyhow::Result<Self> {
        Ok(match self {
            Self::Serial(port) => Self::Serial(std::io::BufWriter::new(
                serialport::SerialPort::try_clone(port.get_ref().as_ref())?,
            )),
            Self::Tcp(port) => Self::Tcp(std::io::BufWriter::new(port.get_ref().try_clone()?)),
        })
    }
}

impl SerialPortArgs {
    pub fn open(&self) -> anyhow::Result<SerialPort> {
        if self.tcp {
            let port = std::net::TcpStream::connect(&self.port)?;
            port.set_read_timeout(Some(std::time::Duration::from_secs(1)))?;
            log::info!("connected to {}", self.port);
            Ok(SerialPort::Tcp(std::io::BufWriter::new(port)))
        } else {
            let mut port = serialport::new(&self.port, self.baud).open()?;
            port.set_timeout(std::time::Duration::from_secs(1))?;
            log::info!("opened {} at {} baud", self.port, self.baud);
            Ok(SerialPort::Serial(std::io::BufWriter::new(port)))
        }
    }
}

/// Time-outs just mean nothing has been heard yet.
pub fn is_timeout<E>(e: &nowlib::ReadError<E>) -> bool
where
    E: std::borrow::Borrow<std::io::Error>,
{
    match e {
        nowlib::ReadError::Io(io) => matches!(
            io.borrow().kind(),
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
        ),
        nowlib::ReadError::UnexpectedEof => false,
    }
}

/// Parse a payload given on the command line, as text or as hex.
pub fn parse_payload(message: &str, hex: bool) -> anyhow::Result<Vec<u8>> {
    let payload = if hex {
        let digits: Vec<u8> = message
            .bytes()
            .filter(|c| !c.is_ascii_whitespace() && *c != b':')
            .collect();
        anyhow::ensure!(digits.len() % 2 == 0, "odd number of hex digits");
        digits
            .chunks(2)
            .map(|pair| {
                std::str::from_utf8(pair)
                    .ok()
                    .and_then(|s| u8::from_str_radix(s, 16).ok())
                    .ok_or_else(|| anyhow::anyhow!("bad hex digits: {:?}", pair))
            })
            .collect::<anyhow::Result<Vec<u8>>>()?
    } else {
        message.as_bytes().to_owned()
    };

    anyhow::ensure!(
        payload.len() <= nowlib::protocol::MAX_PAYLOAD_LEN,
        "payload is {} bytes, at most {} fit in one broadcast",
        payload.len(),
        nowlib::protocol::MAX_PAYLOAD_LEN
    );
    Ok(payload)
}

/// Show a payload as text when it is printable, otherwise as a hexdump.
pub fn describe(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(s) if !s.chars().any(|c| c.is_control() && c != '\n' && c != '\t') => s.to_owned(),
        _ => "\n".to_owned() + crate::hexdump::hexdump_format(payload).trim_end(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn payload_text() {
        assert_eq!(parse_payload("hello", false).unwrap(), b"hello");
    }

    #[test]
    fn payload_hex() {
        assert_eq!(
            parse_payload("de:ad be EF", true).unwrap(),
            vec![0xde, 0xad, 0xbe, 0xef]
        );
        assert!(parse_payload("abc", true).is_err());
        assert!(parse_payload("zz", true).is_err());
    }

    #[test]
    fn payload_too_long() {
        assert!(parse_payload(&"x".repeat(250), false).is_ok());
        assert!(parse_payload(&"x".repeat(251), false).is_err());
    }

    #[test]
    fn describe_text_and_binary() {
        assert_eq!(describe(b"hi there"), "hi there");
        assert!(describe(b"\x00\x01\x02").starts_with("\n0000"));
    }

    #[test]
    fn timeouts() {
        let e: nowlib::ReadError<std::io::Error> =
            nowlib::ReadError::Io(std::io::ErrorKind::TimedOut.into());
        assert!(is_timeout(&e));
        let e: nowlib::ReadError<std::io::Error> = nowlib::ReadError::UnexpectedEof;
        assert!(!is_timeout(&e));
    }
}
