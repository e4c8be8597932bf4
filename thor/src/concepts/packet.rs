use cfg_if::cfg_if;

use crate::feedback::DecodeError;

cfg_if! {
    if #[cfg(feature = "serde")] {
        use serde::{Deserialize, Serialize};
    }
}

/// Reserved next-hop id used in HELLO beacons.
pub const BROADCAST_ID: u32 = 0xFFFF_FFFF;

/// `nextHopId` value meaning "no next hop known".
pub const NO_HOP: u32 = 0;

/// On-wire header size. Every frame starts with exactly this many bytes.
pub const HEADER_LEN: usize = 22;

/// Largest TTL expressible in the 5-bit field.
pub const MAX_TTL: u8 = 31;

/// Frame discriminator, first byte on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum PacketType {
    Hello = 1,
    Ack = 2,
    Data = 3,
}

impl PacketType {
    pub fn from_byte(b: u8) -> Result<PacketType, DecodeError> {
        match b {
            1 => Ok(PacketType::Hello),
            2 => Ok(PacketType::Ack),
            3 => Ok(PacketType::Data),
            other => Err(DecodeError::UnknownType(other)),
        }
    }
}

/// The packed flags-and-TTL octet at offset 1.
///
/// Layout is fixed for wire compatibility:
/// bit 7 `myInternet`, bit 6 `visited`, bit 5 `intneighbour`, bits 0..4 TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FlagsTtl(u8);

impl FlagsTtl {
    pub fn new() -> Self {
        Self(0)
    }

    pub fn from_byte(byte: u8) -> Self {
        Self(byte)
    }

    pub fn as_byte(&self) -> u8 {
        self.0
    }

    /// TTL, 0..=31.
    pub fn ttl(&self) -> u8 {
        self.0 & 0x1F
    }

    pub fn set_ttl(&mut self, ttl: u8) {
        self.0 = (self.0 & 0xE0) | (ttl & 0x1F);
    }

    pub fn decrement_ttl(&mut self) {
        let cur = self.ttl();
        if cur > 0 {
            self.set_ttl(cur - 1);
        }
    }

    /// Bit 5: the sender has a neighbour with direct internet.
    pub fn int_neighbour(&self) -> bool {
        self.0 & 0x20 != 0
    }

    pub fn set_int_neighbour(&mut self, v: bool) {
        if v {
            self.0 |= 0x20;
        } else {
            self.0 &= !0x20;
        }
    }

    /// Bit 6: the packet has already been routed via a marked hop.
    pub fn visited(&self) -> bool {
        self.0 & 0x40 != 0
    }

    pub fn set_visited(&mut self, v: bool) {
        if v {
            self.0 |= 0x40;
        } else {
            self.0 &= !0x40;
        }
    }

    /// Bit 7: the sender itself has direct internet.
    pub fn my_internet(&self) -> bool {
        self.0 & 0x80 != 0
    }

    pub fn set_my_internet(&mut self, v: bool) {
        if v {
            self.0 |= 0x80;
        } else {
            self.0 &= !0x80;
        }
    }
}

/// The fixed 22-byte frame header. Multi-byte fields are little-endian.
///
/// ```text
/// offset  size  field
///   0      1    type            (1=HELLO, 2=ACK, 3=DATA)
///   1      1    flags + TTL     (see FlagsTtl)
///   2      4    destination id  u32 LE
///   6      4    sender id       u32 LE
///  10      4    origin id       u32 LE
///  14      4    next hop id     u32 LE (0 = unset, 0xFFFFFFFF = broadcast)
///  18      4    sequence        u32 LE
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Header {
    pub packet_type: PacketType,
    pub flags: FlagsTtl,
    pub destination_id: u32,
    pub sender_id: u32,
    pub origin_id: u32,
    pub next_hop_id: u32,
    pub sequence: u32,
}

impl Header {
    /// A HELLO beacon: TTL 1, broadcast next hop, all flag bits clear.
    pub fn hello(destination_id: u32, sender_id: u32, origin_id: u32, sequence: u32) -> Header {
        let mut flags = FlagsTtl::new();
        flags.set_ttl(1);
        Header {
            packet_type: PacketType::Hello,
            flags,
            destination_id,
            sender_id,
            origin_id,
            next_hop_id: BROADCAST_ID,
            sequence,
        }
    }

    /// An ACK beacon: TTL 1, visited clear, internet capability bits as given.
    pub fn ack(
        destination_id: u32,
        sender_id: u32,
        origin_id: u32,
        next_hop_id: u32,
        sequence: u32,
        my_internet: bool,
        int_neighbour: bool,
    ) -> Header {
        let mut flags = FlagsTtl::new();
        flags.set_ttl(1);
        flags.set_my_internet(my_internet);
        flags.set_int_neighbour(int_neighbour);
        Header {
            packet_type: PacketType::Ack,
            flags,
            destination_id,
            sender_id,
            origin_id,
            next_hop_id,
            sequence,
        }
    }

    /// A freshly originated DATA header: TTL 15, no next hop yet.
    pub fn data(destination_id: u32, sender_id: u32, origin_id: u32, sequence: u32, ttl: u8) -> Header {
        let mut flags = FlagsTtl::new();
        flags.set_ttl(ttl);
        Header {
            packet_type: PacketType::Data,
            flags,
            destination_id,
            sender_id,
            origin_id,
            next_hop_id: NO_HOP,
            sequence,
        }
    }

    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[0] = self.packet_type as u8;
        buf[1] = self.flags.as_byte();
        buf[2..6].copy_from_slice(&self.destination_id.to_le_bytes());
        buf[6..10].copy_from_slice(&self.sender_id.to_le_bytes());
        buf[10..14].copy_from_slice(&self.origin_id.to_le_bytes());
        buf[14..18].copy_from_slice(&self.next_hop_id.to_le_bytes());
        buf[18..22].copy_from_slice(&self.sequence.to_le_bytes());
        buf
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Header, DecodeError> {
        if bytes.len() < HEADER_LEN {
            return Err(DecodeError::Truncated { len: bytes.len() });
        }
        let packet_type = PacketType::from_byte(bytes[0])?;
        Ok(Header {
            packet_type,
            flags: FlagsTtl::from_byte(bytes[1]),
            destination_id: u32::from_le_bytes(bytes[2..6].try_into().unwrap()),
            sender_id: u32::from_le_bytes(bytes[6..10].try_into().unwrap()),
            origin_id: u32::from_le_bytes(bytes[10..14].try_into().unwrap()),
            next_hop_id: u32::from_le_bytes(bytes[14..18].try_into().unwrap()),
            sequence: u32::from_le_bytes(bytes[18..22].try_into().unwrap()),
        })
    }
}

/// A full frame: header plus an opaque payload. HELLO and ACK frames carry
/// no payload; DATA frames may. There is no length field, the payload spans
/// everything past the header.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Packet {
    pub header: Header,
    pub payload: Vec<u8>,
}

impl Packet {
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_LEN + self.payload.len());
        buf.extend_from_slice(&self.header.to_bytes());
        buf.extend_from_slice(&self.payload);
        buf
    }

    pub fn decode(bytes: &[u8]) -> Result<Packet, DecodeError> {
        let header = Header::from_bytes(bytes)?;
        Ok(Packet {
            header,
            payload: bytes[HEADER_LEN..].to_vec(),
        })
    }
}
