//! The packet payload buffer exchanged with the transport.

use managed::ManagedSlice;

use crate::protocol::hex::hex_digit;

/// Default packet buffer capacity, advertised to GDB via `qSupported`.
pub const RSP_PKT_SIZE: usize = 4096;

/// A fixed-capacity RSP packet payload.
///
/// The buffer holds one unframed packet body; the transport adds framing and
/// checksums on the way out. `len` tracks the logical payload length, and
/// bytes beyond it are undefined. Packed payloads are ASCII.
///
/// The storage may be borrowed from the caller or heap allocated, so that
/// embedders with static buffers can avoid allocation.
pub struct RspPacket<'a> {
    data: ManagedSlice<'a, u8>,
    len: usize,
}

impl RspPacket<'_> {
    /// Allocate a packet buffer of `size` bytes.
    pub fn new(size: usize) -> RspPacket<'static> {
        RspPacket {
            data: ManagedSlice::Owned(vec![0; size]),
            len: 0,
        }
    }

    /// The packet payload.
    pub fn data(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// The full underlying buffer, for transports filling in a payload.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Current payload length.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Is the payload empty?
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Set the payload length after writing through [`RspPacket::data_mut`].
    pub fn set_len(&mut self, len: usize) {
        debug_assert!(len <= self.data.len());
        self.len = len.min(self.data.len());
    }

    /// Total buffer capacity. Advertised to GDB as `PacketSize`, which it
    /// uses to size its own buffers.
    pub fn buf_size(&self) -> usize {
        self.data.len()
    }

    /// Pack an ASCII string as the payload. Oversized input is truncated.
    pub fn pack_str(&mut self, s: &str) {
        let n = s.len().min(self.data.len());
        self.data[..n].copy_from_slice(&s.as_bytes()[..n]);
        self.len = n;
    }

    /// Pack `payload` hex-encoded, two lowercase digits per byte.
    pub fn pack_hexstr(&mut self, payload: &[u8]) {
        let n = payload.len().min(self.data.len() / 2);
        for (i, &b) in payload[..n].iter().enumerate() {
            self.data[2 * i] = hex_digit(b >> 4);
            self.data[2 * i + 1] = hex_digit(b);
        }
        self.len = 2 * n;
    }

    /// Pack a monitor output packet: hex-encoded `s`, with the `O` console
    /// prefix when `to_stdout` is set.
    pub fn pack_rcmd_str(&mut self, s: &str, to_stdout: bool) {
        let header = usize::from(to_stdout);
        let n = s.len().min((self.data.len() - header) / 2);
        if to_stdout {
            self.data[0] = b'O';
        }
        for (i, &b) in s.as_bytes()[..n].iter().enumerate() {
            self.data[header + 2 * i] = hex_digit(b >> 4);
            self.data[header + 2 * i + 1] = hex_digit(b);
        }
        self.len = header + 2 * n;
    }
}

impl<'a> RspPacket<'a> {
    /// Use `buf` as the packet storage instead of heap allocating.
    pub fn with_buffer(buf: &'a mut [u8]) -> RspPacket<'a> {
        RspPacket {
            data: ManagedSlice::Borrowed(buf),
            len: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_str_sets_payload_and_len() {
        let mut pkt = RspPacket::new(RSP_PKT_SIZE);
        pkt.pack_str("OK");
        assert_eq!(pkt.data(), b"OK");
        assert_eq!(pkt.len(), 2);

        pkt.pack_str("");
        assert!(pkt.is_empty());
    }

    #[test]
    fn pack_hexstr_encodes_bytes() {
        let mut pkt = RspPacket::new(64);
        pkt.pack_hexstr(b"hi\n");
        assert_eq!(pkt.data(), b"68690a");
    }

    #[test]
    fn pack_rcmd_str_prefixes_console_output() {
        let mut pkt = RspPacket::new(64);
        pkt.pack_rcmd_str("hi", true);
        assert_eq!(pkt.data(), b"O6869");

        pkt.pack_rcmd_str("hi", false);
        assert_eq!(pkt.data(), b"6869");
    }

    #[test]
    fn borrowed_buffer_caps_capacity() {
        let mut storage = [0u8; 8];
        let mut pkt = RspPacket::with_buffer(&mut storage);
        assert_eq!(pkt.buf_size(), 8);

        pkt.pack_str("0123456789");
        assert_eq!(pkt.data(), b"01234567");

        pkt.pack_hexstr(b"abcdef");
        assert_eq!(pkt.data(), b"61626364");
    }
}
