//! Outbound message packetization.
//!
//! The vending machine firmware reads fixed-size frames off the serial link
//! and expects text in the CP852 code page (its display uses the DOS Latin-2
//! character set). A message is therefore encoded first and then segmented:
//!
//! ```text
//! encode("KAVA...") -> [4B 41 56 41 ...]          (CP852, one byte per char)
//!
//! packet 0: | byte 0 .. byte 63 |                  exactly packet_size bytes
//! packet n: | tail bytes | 20 20 20 ... |          padded with CP852 space
//! ```
//!
//! `packet_count = ceil(len / packet_size)`; the empty message produces no
//! packets at all. Packets carry no header, checksum, or sequence number;
//! the firmware reads frames purely by position.

use anyhow::Result;
use codepage_strings::Coding;

/// Frame size expected by the firmware.
pub const DEFAULT_PACKET_SIZE: usize = 64;

/// Single-byte code page of the firmware's command interpreter.
const FIRMWARE_CODE_PAGE: u16 = 852;

/// Replacement byte for characters with no CP852 mapping.
const FALLBACK_BYTE: u8 = b'?';

/// Encodes messages into CP852 and splits them into fixed-size, space-padded
/// packets ready for sequential transmission.
pub struct Packetizer {
    coding: Coding,
    packet_size: usize,
    pad_byte: u8,
}

impl Packetizer {
    /// Create a packetizer producing packets of exactly `packet_size` bytes.
    pub fn new(packet_size: usize) -> Result<Self> {
        if packet_size == 0 {
            anyhow::bail!("packet size must be positive");
        }
        let coding = Coding::new(FIRMWARE_CODE_PAGE)
            .map_err(|e| anyhow::anyhow!("code page {} unavailable: {}", FIRMWARE_CODE_PAGE, e))?;
        // CP852 keeps ASCII in 0x00..0x7F, so this is 0x20.
        let pad_byte = encode_bytes(&coding, " ").first().copied().unwrap_or(b' ');
        Ok(Self {
            coding,
            packet_size,
            pad_byte,
        })
    }

    /// Encode a message into CP852 bytes.
    ///
    /// Characters without a CP852 mapping encode as the `?` replacement
    /// byte. Nothing is ever dropped: the output always has one byte per
    /// input character.
    pub fn encode(&self, message: &str) -> Vec<u8> {
        encode_bytes(&self.coding, message)
    }

    /// Encode and segment a message into transmission-ready packets.
    ///
    /// Every returned packet is exactly `packet_size` bytes; positions past
    /// the message tail in the final packet hold the encoded space character.
    pub fn packetize(&self, message: &str) -> Vec<Vec<u8>> {
        let encoded = self.encode(message);
        let mut packets = Vec::with_capacity(encoded.len().div_ceil(self.packet_size));
        for chunk in encoded.chunks(self.packet_size) {
            let mut packet = vec![self.pad_byte; self.packet_size];
            packet[..chunk.len()].copy_from_slice(chunk);
            packets.push(packet);
        }
        packets
    }
}

/// Per-character strict encode with `?` substitution. The coding rejects a
/// whole string when any character has no mapping, so each character is
/// encoded on its own and the rejects replaced.
fn encode_bytes(coding: &Coding, message: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(message.len());
    let mut utf8 = [0u8; 4];
    for ch in message.chars() {
        match coding.encode(&*ch.encode_utf8(&mut utf8)) {
            Ok(encoded) => bytes.extend_from_slice(&encoded),
            Err(_) => bytes.push(FALLBACK_BYTE),
        }
    }
    bytes
}
