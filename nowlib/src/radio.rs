use embedded_hal::digital::OutputPin;
use portable_atomic::{AtomicU32, Ordering};

use crate::protocol::{BROADCAST_ADDRESS, MAX_PAYLOAD_LEN};
use crate::{BroadcastError, HardwareAddress, SendError};

/// Raw ESP-NOW driver result codes.
pub mod esp_err {
    pub const ESP_OK: i32 = 0;
    pub const ESP_ERR_ESPNOW_BASE: i32 = 0x3064;
    pub const ESP_ERR_ESPNOW_NOT_INIT: i32 = ESP_ERR_ESPNOW_BASE + 1;
    pub const ESP_ERR_ESPNOW_ARG: i32 = ESP_ERR_ESPNOW_BASE + 2;
    pub const ESP_ERR_ESPNOW_NO_MEM: i32 = ESP_ERR_ESPNOW_BASE + 3;
    pub const ESP_ERR_ESPNOW_FULL: i32 = ESP_ERR_ESPNOW_BASE + 4;
    pub const ESP_ERR_ESPNOW_NOT_FOUND: i32 = ESP_ERR_ESPNOW_BASE + 5;
    pub const ESP_ERR_ESPNOW_INTERNAL: i32 = ESP_ERR_ESPNOW_BASE + 6;
    pub const ESP_ERR_ESPNOW_EXIST: i32 = ESP_ERR_ESPNOW_BASE + 7;
    pub const ESP_ERR_ESPNOW_IF: i32 = ESP_ERR_ESPNOW_BASE + 8;
}

impl SendError {
    /// Classify a raw driver result code.
    pub fn from_code(code: i32) -> Result<(), SendError> {
        use esp_err::*;

        match code {
            ESP_OK => Ok(()),
            ESP_ERR_ESPNOW_NOT_INIT => Err(Self::NotInitialized),
            ESP_ERR_ESPNOW_ARG => Err(Self::InvalidArgument),
            ESP_ERR_ESPNOW_INTERNAL => Err(Self::Internal),
            ESP_ERR_ESPNOW_NO_MEM => Err(Self::OutOfMemory),
            ESP_ERR_ESPNOW_NOT_FOUND => Err(Self::PeerNotFound),
            other => Err(Self::Unknown(other)),
        }
    }
}

/// The parts of a connectionless radio driver the bridge needs.
pub trait RadioDriver {
    /// Returns [true] if the destination is already registered.
    fn has_peer(&self, address: &HardwareAddress) -> bool;

    /// Register a destination.
    fn add_peer(&mut self, address: &HardwareAddress) -> Result<(), SendError>;

    /// Queue one frame for transmission.
    ///
    /// Delivery is reported later, through [SendMonitor::on_send_complete()].
    fn send(&mut self, address: &HardwareAddress, payload: &[u8]) -> Result<(), SendError>;
}

impl<D> RadioDriver for &mut D
where
    D: RadioDriver,
{
    fn has_peer(&self, address: &HardwareAddress) -> bool {
        (**self).has_peer(address)
    }

    fn add_peer(&mut self, address: &HardwareAddress) -> Result<(), SendError> {
        (**self).add_peer(address)
    }

    fn send(&mut self, address: &HardwareAddress, payload: &[u8]) -> Result<(), SendError> {
        (**self).send(address, payload)
    }
}

/// An indicator pin that isn't there.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NoIndicator;

impl embedded_hal::digital::ErrorType for NoIndicator {
    type Error = core::convert::Infallible;
}

impl OutputPin for NoIndicator {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Broadcasts payloads to every radio in range.
///
/// The optional indicator goes high when a send starts and back low
/// when the driver accepts it. It stays high after a failure.
#[derive(Debug)]
pub struct Broadcaster<D, P = NoIndicator> {
    driver: D,
    indicator: P,
}

impl<D> Broadcaster<D> {
    pub fn new(driver: D) -> Self {
        Self::with_indicator(driver, NoIndicator)
    }
}

impl<D, P> Broadcaster<D, P> {
    pub fn with_indicator(driver: D, indicator: P) -> Self {
        Self { driver, indicator }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Release the driver and indicator.
    pub fn free(self) -> (D, P) {
        (self.driver, self.indicator)
    }
}

impl<D, P> Broadcaster<D, P>
where
    D: RadioDriver,
    P: OutputPin,
{
    /// Register the broadcast address, unless it already is.
    pub fn ensure_peer(&mut self) -> Result<(), SendError> {
        if !self.driver.has_peer(&BROADCAST_ADDRESS) {
            debug!("registering broadcast peer");
            self.driver.add_peer(&BROADCAST_ADDRESS)?;
        }
        Ok(())
    }

    /// Broadcast one payload of at most 250 bytes.
    ///
    /// Errors are already logged, and never leave the broadcaster unusable.
    pub fn broadcast(&mut self, payload: &[u8]) -> Result<(), BroadcastError> {
        if payload.len() > MAX_PAYLOAD_LEN {
            warn!("refusing to broadcast {} bytes", payload.len());
            return Err(BroadcastError::Oversized(payload.len()));
        }

        // the indicator is cosmetic, ignore its errors
        let _ = self.indicator.set_high();

        let result = self
            .ensure_peer()
            .and_then(|_| self.driver.send(&BROADCAST_ADDRESS, payload));

        match result {
            Ok(()) => {
                let _ = self.indicator.set_low();
                debug!("sent {} bytes with success", payload.len());
                Ok(())
            }
            Err(e) => {
                warn!("error sending {} bytes: {}", payload.len(), e);
                Err(e.into())
            }
        }
    }
}

/// Keeps track of delivery reports from the radio driver.
///
/// Safe to call from the driver's callback context.
#[derive(Debug, Default)]
pub struct SendMonitor {
    delivered: AtomicU32,
    failed: AtomicU32,
}

impl SendMonitor {
    pub const fn new() -> Self {
        Self {
            delivered: AtomicU32::new(0),
            failed: AtomicU32::new(0),
        }
    }

    /// Record one delivery report.
    pub fn on_send_complete(&self, address: &[u8; 6], success: bool) {
        let address = HardwareAddress::new(*address);
        if success {
            self.delivered.fetch_add(1, Ordering::Relaxed);
            debug!(
                "last packet sent to {}: delivery success",
                address.to_hex().as_str()
            );
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
            warn!(
                "last packet sent to {}: delivery fail",
                address.to_hex().as_str()
            );
        }
    }

    pub fn delivered(&self) -> u32 {
        self.delivered.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u32 {
        self.failed.load(Ordering::Relaxed)
    }
}
