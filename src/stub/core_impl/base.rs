//! Register, memory, and matchpoint packet handlers.

use core::mem::size_of;

use log::trace;
use log::warn;

use crate::common::RISCV_NUM_REGS;
use crate::conn::Connection;
use crate::protocol::hex::decode_hex;
use crate::protocol::hex::decode_hex_buf;
use crate::protocol::hex::hex_digit;
use crate::protocol::hex::hex_to_val;
use crate::protocol::hex::rsp_unescape;
use crate::protocol::hex::val_to_hex;
use crate::stub::GdbServer;
use crate::target::Target;

/// Register width in `G`/`P` packets.
const REG_BYTES: usize = size_of::<u32>();

/// Parse the `<addr>,<len>` header shared by the memory packets. A trailing
/// `:` after the length is accepted and ignored.
fn parse_addr_len(body: &[u8]) -> Option<(u32, usize)> {
    let comma = body.iter().position(|&b| b == b',')?;
    let addr = decode_hex::<u32>(&body[..comma]).ok()?;

    let len_field = &body[comma + 1..];
    let len_field = match len_field.iter().position(|&b| b == b':') {
        Some(colon) => &len_field[..colon],
        None => len_field,
    };

    let len = decode_hex::<usize>(len_field).ok()?;
    Some((addr, len))
}

impl<T: Target, C: Connection> GdbServer<'_, T, C> {
    /// `g`: read all registers, packed as little-endian hex pairs in
    /// register-number order.
    pub(crate) fn handle_read_all_regs(&mut self) {
        let GdbServer { pkt, cpu, .. } = self;
        let buf = pkt.data_mut();

        let mut pkt_size = 0;
        for regnum in 0..RISCV_NUM_REGS {
            match cpu.read_register(regnum) {
                Some((val, byte_size)) => {
                    val_to_hex(u64::from(val), &mut buf[pkt_size..], byte_size, true);
                    pkt_size += 2 * byte_size;
                }
                None => {
                    warn!("failed to read register {} for 'g' packet", regnum);
                    break;
                }
            }
        }

        pkt.set_len(pkt_size);
        self.send();
    }

    /// `G<data>`: write all registers from little-endian hex pairs.
    pub(crate) fn handle_write_all_regs(&mut self) {
        let mut vals = [0u32; RISCV_NUM_REGS];

        {
            let body = &self.pkt.data()[1..];
            if body.len() < 2 * REG_BYTES * RISCV_NUM_REGS {
                warn!("short 'G' packet: {} digits supplied", body.len());
                self.send_str("E01");
                return;
            }

            for (regnum, val) in vals.iter_mut().enumerate() {
                match hex_to_val(&body[2 * REG_BYTES * regnum..], REG_BYTES, true) {
                    Some(v) => *val = v as u32,
                    None => {
                        warn!("failed to recognize 'G' packet data for reg {}", regnum);
                        self.send_str("E01");
                        return;
                    }
                }
            }
        }

        for (regnum, &val) in vals.iter().enumerate() {
            if self.cpu.write_register(regnum, val) != REG_BYTES {
                warn!("size != {} when writing reg {}", REG_BYTES, regnum);
            }
        }

        self.send_str("OK");
    }

    /// `p<regno>`: read one register.
    pub(crate) fn handle_read_reg(&mut self) {
        let regnum = match decode_hex::<usize>(&self.pkt.data()[1..]) {
            Ok(n) => n,
            Err(_) => {
                warn!(
                    "failed to recognize RSP read register command: {}",
                    String::from_utf8_lossy(self.pkt.data())
                );
                self.send_str("E01");
                return;
            }
        };

        match self.cpu.read_register(regnum) {
            Some((val, byte_size)) => {
                let GdbServer { pkt, .. } = self;
                val_to_hex(u64::from(val), pkt.data_mut(), byte_size, true);
                pkt.set_len(2 * byte_size);
                self.send();
            }
            None => self.send_str("E01"),
        }
    }

    /// `P<regno>=<value>`: write one register from a fixed-width
    /// little-endian hex value.
    pub(crate) fn handle_write_reg(&mut self) {
        let parsed = (|| {
            let body = self.pkt.data().strip_prefix(b"P")?;
            let eq = body.iter().position(|&b| b == b'=')?;
            let regnum = decode_hex::<usize>(&body[..eq]).ok()?;

            let value = &body[eq + 1..];
            if value.len() != 2 * REG_BYTES {
                return None;
            }
            let val = hex_to_val(value, REG_BYTES, true)?;

            Some((regnum, val as u32))
        })();

        let (regnum, val) = match parsed {
            Some(p) => p,
            None => {
                warn!(
                    "failed to recognize RSP write register command: {}",
                    String::from_utf8_lossy(self.pkt.data())
                );
                self.send_str("E01");
                return;
            }
        };

        if self.cpu.write_register(regnum, val) != REG_BYTES {
            warn!("size != {} when writing reg {}", REG_BYTES, regnum);
        }
        self.send_str("OK");
    }

    /// `m<addr>,<len>:`: read memory, replied as hex pairs, lowest address
    /// first.
    pub(crate) fn handle_read_mem(&mut self) {
        let (addr, mut len) = match parse_addr_len(&self.pkt.data()[1..]) {
            Some(h) => h,
            None => {
                warn!(
                    "failed to recognize RSP read memory command: {}",
                    String::from_utf8_lossy(self.pkt.data())
                );
                self.send_str("E01");
                return;
            }
        };

        // Two reply chars per byte must fit in the buffer.
        if len * 2 >= self.pkt.buf_size() {
            warn!("memory read of {} bytes too large for RSP packet: truncated", len);
            len = (self.pkt.buf_size() - 1) / 2;
        }

        let GdbServer { pkt, cpu, .. } = self;
        let buf = pkt.data_mut();

        let mut off = 0;
        while off < len {
            let mut byte = [0u8; 1];
            if cpu.read(addr.wrapping_add(off as u32), &mut byte) != 1 {
                warn!("failed to read memory at {:#x}", addr.wrapping_add(off as u32));
                break;
            }
            buf[off * 2] = hex_digit(byte[0] >> 4);
            buf[off * 2 + 1] = hex_digit(byte[0]);
            off += 1;
        }

        pkt.set_len(off * 2);
        self.send();
    }

    /// `M<addr>,<len>:<data>`: write memory from hex pairs.
    pub(crate) fn handle_write_mem(&mut self) {
        let header = (|| {
            let body = self.pkt.data();
            let colon = body.iter().position(|&b| b == b':')?;
            let (addr, len) = parse_addr_len(&body[1..colon])?;
            Some((addr, len, colon + 1))
        })();

        let (addr, len, data_off) = match header {
            Some(h) => h,
            None => {
                warn!(
                    "failed to recognize RSP write memory command: {}",
                    String::from_utf8_lossy(self.pkt.data())
                );
                self.send_str("E01");
                return;
            }
        };

        let dat_len = self.pkt.len() - data_off;
        if dat_len != 2 * len {
            warn!(
                "write of {} digits requested, but {} digits supplied: packet ignored",
                2 * len,
                dat_len
            );
            self.send_str("E01");
            return;
        }

        let decode_ok = {
            let buf = self.pkt.data_mut();
            decode_hex_buf(&mut buf[data_off..data_off + dat_len]).is_ok()
        };
        if !decode_ok {
            warn!("non-hex data in RSP write memory command: packet ignored");
            self.send_str("E01");
            return;
        }

        let GdbServer { pkt, cpu, .. } = self;
        for (off, &byte) in pkt.data()[data_off..data_off + len].iter().enumerate() {
            if cpu.write(addr.wrapping_add(off as u32), &[byte]) != 1 {
                warn!("failed to write memory at {:#x}", addr.wrapping_add(off as u32));
            }
        }

        self.send_str("OK");
    }

    /// `X<addr>,<len>:<binary>`: write memory from escaped binary data.
    ///
    /// The transport has already removed the packet framing; what remains is
    /// undone here with the RSP `}` escape.
    pub(crate) fn handle_write_mem_bin(&mut self) {
        let header = (|| {
            let body = self.pkt.data();
            let colon = body.iter().position(|&b| b == b':')?;
            let (addr, len) = parse_addr_len(&body[1..colon])?;
            Some((addr, len, colon + 1))
        })();

        let (addr, len, data_off) = match header {
            Some(h) => h,
            None => {
                warn!(
                    "failed to recognize RSP binary write memory command: {}",
                    String::from_utf8_lossy(self.pkt.data())
                );
                self.send_str("E01");
                return;
            }
        };

        let pkt_len = self.pkt.len();
        let new_len = {
            let buf = self.pkt.data_mut();
            rsp_unescape(&mut buf[data_off..pkt_len])
        };

        let write_len = if new_len != len {
            let min_len = len.min(new_len);
            warn!(
                "write of {} bytes requested, but {} bytes supplied: {} will be written",
                len, new_len, min_len
            );
            min_len
        } else {
            len
        };

        let GdbServer { pkt, cpu, .. } = self;
        let data = &pkt.data()[data_off..data_off + write_len];
        if cpu.write(addr, data) != write_len {
            warn!("failed to write {} bytes to {:#x}", write_len, addr);
        }

        self.send_str("OK");
    }

    /// `Z<kind>,<addr>,<len>`: insert a matchpoint.
    ///
    /// Not enforced at the RSP layer: the empty reply tells GDB to fall back
    /// to planting software breakpoints itself through memory writes.
    pub(crate) fn handle_insert_matchpoint(&mut self) {
        trace!(
            "matchpoint insertion not enforced: {}",
            String::from_utf8_lossy(self.pkt.data())
        );
        self.send_empty();
    }

    /// `z<kind>,<addr>,<len>`: remove a matchpoint. See
    /// [`handle_insert_matchpoint`](Self::handle_insert_matchpoint).
    pub(crate) fn handle_remove_matchpoint(&mut self) {
        trace!(
            "matchpoint removal not enforced: {}",
            String::from_utf8_lossy(self.pkt.data())
        );
        self.send_empty();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addr_len_header() {
        assert_eq!(parse_addr_len(b"1000,4"), Some((0x1000, 4)));
        assert_eq!(parse_addr_len(b"1000,4:"), Some((0x1000, 4)));
        assert_eq!(parse_addr_len(b"ffffffff,10"), Some((0xffff_ffff, 0x10)));
        assert_eq!(parse_addr_len(b"1000"), None);
        assert_eq!(parse_addr_len(b"zz,4"), None);
        assert_eq!(parse_addr_len(b"1000,zz"), None);
    }
}
