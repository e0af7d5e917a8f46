use crate::protocol::{ADDRESS_LEN, ADDRESS_STR_LEN};

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// A 6-byte radio hardware (MAC) address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HardwareAddress(pub [u8; ADDRESS_LEN]);

impl HardwareAddress {
    /// The all-ones address, meaning every radio in range.
    pub const BROADCAST: Self = Self([0xff; ADDRESS_LEN]);

    pub const fn new(octets: [u8; ADDRESS_LEN]) -> Self {
        Self(octets)
    }

    pub const fn octets(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }

    /// Format as exactly 12 lowercase hex digits, no separators.
    ///
    /// This is the form sent to the host in front of every payload.
    pub fn to_hex(&self) -> AddressString {
        format_address(&self.0)
    }

    /// Parse 12 hex digits (either case) back into an address.
    pub fn from_hex(hex: &[u8]) -> Option<Self> {
        if hex.len() != ADDRESS_STR_LEN {
            return None;
        }

        let mut octets = [0; ADDRESS_LEN];
        for (octet, pair) in octets.iter_mut().zip(hex.chunks_exact(2)) {
            *octet = (hex_value(pair[0])? << 4) | hex_value(pair[1])?;
        }
        Some(Self(octets))
    }
}

impl From<[u8; ADDRESS_LEN]> for HardwareAddress {
    fn from(octets: [u8; ADDRESS_LEN]) -> Self {
        Self(octets)
    }
}

impl From<HardwareAddress> for [u8; ADDRESS_LEN] {
    fn from(address: HardwareAddress) -> Self {
        address.0
    }
}

/// Colon-separated, for humans. The wire uses [HardwareAddress::to_hex()].
impl core::fmt::Display for HardwareAddress {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        for (i, b) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ":")?;
            }
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

/// Format a raw address as 12 lowercase, zero-padded hex digits.
pub fn format_address(octets: &[u8; ADDRESS_LEN]) -> AddressString {
    let mut out = [0u8; ADDRESS_STR_LEN];
    for (pair, b) in out.chunks_exact_mut(2).zip(octets.iter()) {
        pair[0] = HEX_DIGITS[(b >> 4) as usize];
        pair[1] = HEX_DIGITS[(b & 0xf) as usize];
    }
    AddressString(out)
}

fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// The fixed-width printable form of a [HardwareAddress].
///
/// Always 12 ASCII lowercase hex digits.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AddressString([u8; ADDRESS_STR_LEN]);

impl AddressString {
    pub fn as_bytes(&self) -> &[u8; ADDRESS_STR_LEN] {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        // only ever built from HEX_DIGITS, so this never fails
        core::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl core::fmt::Debug for AddressString {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl core::fmt::Display for AddressString {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for AddressString {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=str}", self.as_str());
    }
}

#[cfg(test)]
mod test {
    use quickcheck::{Arbitrary, Gen};
    use quickcheck_macros::quickcheck;

    use super::*;

    impl Arbitrary for HardwareAddress {
        fn arbitrary(g: &mut Gen) -> Self {
            let mut octets = [0; ADDRESS_LEN];
            for b in octets.iter_mut() {
                *b = u8::arbitrary(g);
            }
            HardwareAddress(octets)
        }
    }

    #[test]
    fn format_example() {
        let address = HardwareAddress::new([0xaa, 0xbb, 0xcc, 0x01, 0x02, 0x03]);
        assert_eq!(address.to_hex().as_str(), "aabbcc010203");
    }

    #[test]
    fn format_zero_pads() {
        let address = HardwareAddress::new([0x00, 0x01, 0x0a, 0x10, 0x7f, 0x80]);
        assert_eq!(address.to_hex().as_str(), "00010a107f80");
    }

    #[test]
    fn format_broadcast() {
        assert_eq!(HardwareAddress::BROADCAST.to_hex().as_str(), "ffffffffffff");
        assert!(HardwareAddress::BROADCAST.is_broadcast());
    }

    #[test]
    fn display_uses_colons() {
        let address = HardwareAddress::new([0xaa, 0xbb, 0xcc, 0x01, 0x02, 0x03]);
        assert_eq!(format!("{}", address), "aa:bb:cc:01:02:03");
    }

    #[test]
    fn from_hex_accepts_upper_case() {
        assert_eq!(
            HardwareAddress::from_hex(b"AABBCC010203"),
            Some(HardwareAddress::new([0xaa, 0xbb, 0xcc, 0x01, 0x02, 0x03]))
        );
    }

    #[test]
    fn from_hex_rejects_garbage() {
        assert_eq!(HardwareAddress::from_hex(b"aabbcc01020"), None);
        assert_eq!(HardwareAddress::from_hex(b"aabbcc0102030"), None);
        assert_eq!(HardwareAddress::from_hex(b"aabbcc01020g"), None);
        assert_eq!(HardwareAddress::from_hex(b"aa:bb:cc:01:"), None);
    }

    #[quickcheck]
    fn hex_is_fixed_width_lowercase(address: HardwareAddress) -> bool {
        let hex = address.to_hex();
        hex.as_str().len() == ADDRESS_STR_LEN
            && hex
                .as_bytes()
                .iter()
                .all(|c| c.is_ascii_digit() || (b'a'..=b'f').contains(c))
    }

    #[quickcheck]
    fn hex_is_deterministic(address: HardwareAddress) -> bool {
        address.to_hex() == format_address(address.octets())
    }

    #[quickcheck]
    fn hex_roundtrip(address: HardwareAddress) -> bool {
        HardwareAddress::from_hex(address.to_hex().as_bytes()) == Some(address)
    }
}
