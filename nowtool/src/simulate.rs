use std::net::{TcpListener, TcpStream};
use std::sync::{mpsc, Arc, Mutex};

use nowlib::{
    Bridge, FromStd, HardwareAddress, RadioDriver, ReadError, ReceiveHandler, SendError,
    SendMonitor, SharedSerial,
};

#[derive(clap::Args, Debug)]
pub struct SimulateOpts {
    #[arg(default_value = "localhost:8855")]
    bind: String,
}

impl crate::ToolRun for SimulateOpts {
    fn run(&self) -> anyhow::Result<()> {
        let listener = TcpListener::bind(&self.bind)?;
        eprintln!("Listening on {}.", self.bind);
        serve(listener, Arc::new(Medium::new()))
    }
}

/// A node's transmitter. Each write is queued for the node's own writer
/// thread, so nothing under the critical section touches a socket.
struct Outbox(mpsc::Sender<Vec<u8>>);

impl embedded_io::ErrorType for Outbox {
    type Error = embedded_io::ErrorKind;
}

impl embedded_io::Write for Outbox {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.0
            .send(buf.to_vec())
            .map_err(|_| embedded_io::ErrorKind::BrokenPipe)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Drain a node's queue onto its socket, until the node goes away.
fn writer(queue: mpsc::Receiver<Vec<u8>>, mut stream: TcpStream) {
    for chunk in queue {
        if let Err(e) = std::io::Write::write_all(&mut stream, &chunk) {
            log::warn!("dropping output: {}", e);
            break;
        }
    }
}

/// One simulated bridge, as seen by the air.
struct Node {
    address: HardwareAddress,
    serial: SharedSerial<Outbox>,
}

impl Node {
    /// A node with its transmitter installed, and the other end of it.
    fn new(address: HardwareAddress) -> (Arc<Self>, mpsc::Receiver<Vec<u8>>) {
        let (tx, rx) = mpsc::channel();
        let node = Arc::new(Self {
            address,
            serial: SharedSerial::new(),
        });
        node.serial.install(Outbox(tx));
        (node, rx)
    }
}

/// The air between simulated bridges. Every broadcast reaches every
/// other node.
struct Medium {
    nodes: Mutex<Vec<Arc<Node>>>,
    monitor: SendMonitor,
}

impl Medium {
    fn new() -> Self {
        Self {
            nodes: Mutex::new(Vec::new()),
            monitor: SendMonitor::new(),
        }
    }

    fn join(&self, node: Arc<Node>) {
        if let Ok(mut nodes) = self.nodes.lock() {
            nodes.push(node);
        }
    }

    fn leave(&self, address: &HardwareAddress) {
        if let Ok(mut nodes) = self.nodes.lock() {
            nodes.retain(|n| n.address != *address);
        }
    }

    fn len(&self) -> usize {
        self.nodes.lock().map(|n| n.len()).unwrap_or(0)
    }

    /// The lowest node address nobody is using.
    fn free_address(&self) -> Option<HardwareAddress> {
        let nodes = self.nodes.lock().ok()?;
        (1..=u8::MAX)
            .map(node_address)
            .find(|a| nodes.iter().all(|n| n.address != *a))
    }

    fn deliver(&self, from: &HardwareAddress, payload: &[u8]) {
        // don't hold the lock while writing to sockets
        let nodes = match self.nodes.lock() {
            Ok(nodes) => nodes.clone(),
            Err(_) => return,
        };

        for node in nodes.iter().filter(|n| n.address != *from) {
            if let Err(e) = ReceiveHandler::new(&node.serial).on_receive(from.octets(), payload) {
                log::warn!("could not deliver to {}: {}", node.address, e);
            }
        }
    }
}

/// A radio driver that broadcasts into a [Medium].
struct SimRadio {
    medium: Arc<Medium>,
    address: HardwareAddress,
    peers: Vec<HardwareAddress>,
}

impl RadioDriver for SimRadio {
    fn has_peer(&self, address: &HardwareAddress) -> bool {
        self.peers.contains(address)
    }

    fn add_peer(&mut self, address: &HardwareAddress) -> Result<(), SendError> {
        if self.has_peer(address) {
            return Err(SendError::Unknown(nowlib::esp_err::ESP_ERR_ESPNOW_EXIST));
        }
        self.peers.push(*address);
        Ok(())
    }

    fn send(&mut self, address: &HardwareAddress, payload: &[u8]) -> Result<(), SendError> {
        if !self.has_peer(address) {
            return Err(SendError::PeerNotFound);
        }
        self.medium.deliver(&self.address, payload);
        self.medium.monitor.on_send_complete(address.octets(), true);
        Ok(())
    }
}

/// Locally administered addresses, 02:00:00:00:00:NN.
fn node_address(n: u8) -> HardwareAddress {
    HardwareAddress::new([0x02, 0, 0, 0, 0, n])
}

fn serve(listener: TcpListener, medium: Arc<Medium>) -> anyhow::Result<()> {
    loop {
        let (stream, addr) = listener.accept()?;
        let Some(address) = medium.free_address() else {
            log::warn!("refusing {}: every node address is taken", addr);
            continue;
        };
        eprintln!("Connected to {} as {}.", addr, address);

        let (node, queue) = Node::new(address);
        let output = stream.try_clone()?;
        std::thread::spawn(move || writer(queue, output));
        medium.join(node.clone());

        let radio = SimRadio {
            medium: medium.clone(),
            address,
            peers: Vec::new(),
        };
        let medium = medium.clone();
        std::thread::spawn(move || {
            let mut bridge = Bridge::new(FromStd::new(stream), radio);
            match bridge.run() {
                ReadError::UnexpectedEof => eprintln!("Disconnected from {}.", addr),
                e => log::warn!("{} stopped: {}", address, e),
            }
            log::info!("{} stats: {:?}", address, bridge.stats());

            medium.leave(&address);
            node.serial.uninstall();
        });
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use nowlib::protocol::{AirFrame, HostFrame};

    #[test]
    fn addresses() {
        assert_eq!(node_address(1).to_hex().as_str(), "020000000001");
        assert_eq!(node_address(0xff).to_hex().as_str(), "0200000000ff");
    }

    #[test]
    fn radio_needs_peer() {
        let mut radio = SimRadio {
            medium: Arc::new(Medium::new()),
            address: node_address(1),
            peers: Vec::new(),
        };
        assert_eq!(
            radio.send(&HardwareAddress::BROADCAST, b"x"),
            Err(SendError::PeerNotFound)
        );
        radio.add_peer(&HardwareAddress::BROADCAST).unwrap();
        assert!(radio.add_peer(&HardwareAddress::BROADCAST).is_err());
        assert_eq!(radio.send(&HardwareAddress::BROADCAST, b"x"), Ok(()));
        assert_eq!(radio.medium.monitor.delivered(), 1);
    }

    #[test]
    fn addresses_reused_only_when_free() {
        let medium = Medium::new();
        for n in 1..=3 {
            medium.join(Node::new(node_address(n)).0);
        }
        assert_eq!(medium.free_address(), Some(node_address(4)));

        medium.leave(&node_address(2));
        assert_eq!(medium.free_address(), Some(node_address(2)));

        for n in 4..=u8::MAX {
            medium.join(Node::new(node_address(n)).0);
        }
        medium.join(Node::new(node_address(2)).0);
        assert_eq!(medium.len(), 255);
        assert_eq!(medium.free_address(), None);
    }

    #[test]
    fn stalled_node_does_not_block_others() {
        let medium = Medium::new();
        // never drained, like a client that stopped reading
        let (stalled, _stalled_queue) = Node::new(node_address(1));
        let (live, live_queue) = Node::new(node_address(2));
        medium.join(stalled);
        medium.join(live);

        let payload = [0x77; 200];
        for _ in 0..5000 {
            medium.deliver(&node_address(3), &payload);
        }

        let frames = live_queue.try_iter().count();
        assert_eq!(frames, 5000);
    }

    #[test]
    fn left_node_output_closed() {
        let (node, queue) = Node::new(node_address(1));
        ReceiveHandler::new(&node.serial)
            .on_receive(node_address(2).octets(), b"hi")
            .unwrap();
        node.serial.uninstall();

        let chunks: Vec<Vec<u8>> = queue.iter().collect();
        assert_eq!(chunks, vec![b"\x0e020000000002hi".to_vec()]);
    }

    #[test]
    fn broadcast_reaches_others() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let local = listener.local_addr().unwrap();
        let medium = Arc::new(Medium::new());
        {
            let medium = medium.clone();
            std::thread::spawn(move || serve(listener, medium));
        }

        let connect = || {
            let stream = TcpStream::connect(local).unwrap();
            stream
                .set_read_timeout(Some(std::time::Duration::from_secs(5)))
                .unwrap();
            nowlib::ClientStd::<_>::new_std(stream)
        };
        let mut a = connect();
        let mut b = connect();
        while medium.len() < 2 {
            std::thread::sleep(std::time::Duration::from_millis(10));
        }

        a.write(&HostFrame::new(b"hello")).unwrap();

        let frame = loop {
            if let Some(frame) = b.read_air().unwrap().ok() {
                break frame.to_owned();
            }
        };
        assert_eq!(frame, AirFrame::new(node_address(1), b"hello".to_vec()));
    }
}
