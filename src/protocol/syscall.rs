//! Parser for the `F` reply GDB sends after servicing a semihosted syscall.

use crate::protocol::hex::decode_hex;

/// A decoded `F<retcode>[,<errno>][;C]` reply.
///
/// `retcode` is the host syscall's return value, `errno` the optional host
/// errno, and `ctrl_c` is set when the user interrupted the syscall with
/// Ctrl-C while GDB was servicing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyscallReply {
    pub retcode: i32,
    pub errno: Option<i32>,
    pub ctrl_c: bool,
}

fn parse_signed(field: &[u8]) -> Option<i32> {
    let (negative, digits) = match field.split_first() {
        Some((b'-', rest)) => (true, rest),
        _ => (false, field),
    };
    let magnitude: u32 = decode_hex(digits).ok()?;
    let val = i64::from(magnitude) * if negative { -1 } else { 1 };
    i32::try_from(val).ok()
}

impl SyscallReply {
    /// Parse a packet payload, returning `None` when it is not a well-formed
    /// `F` reply.
    pub fn parse(body: &[u8]) -> Option<SyscallReply> {
        let body = body.strip_prefix(b"F")?;

        let (body, ctrl_c) = match body.strip_suffix(b";C") {
            Some(rest) => (rest, true),
            None => (body, false),
        };

        let mut fields = body.split(|&b| b == b',');
        let retcode = parse_signed(fields.next()?)?;
        let errno = match fields.next() {
            Some(field) => Some(parse_signed(field)?),
            None => None,
        };
        if fields.next().is_some() {
            return None;
        }

        Some(SyscallReply { retcode, errno, ctrl_c })
    }
}
