//! `q` (query), `Q` (set), and `v` packet handlers.

use log::warn;

use crate::common::DUMMY_TID;
use crate::conn::Connection;
use crate::stub::error::GdbServerError;
use crate::stub::GdbServer;
use crate::target::Target;

impl<T: Target, C: Connection> GdbServer<'_, T, C> {
    /// `q*`: anything without an explicit response gets the empty reply, so
    /// the server degrades gracefully with future GDB releases.
    pub(crate) fn handle_query(&mut self) -> Result<(), GdbServerError<C::Error>> {
        let body = self.pkt.data();

        if body == b"qC" {
            // The current thread id.
            let reply = format!("QC{:x}", DUMMY_TID);
            self.send_str(&reply);
        } else if body.starts_with(b"qCRC") {
            warn!("RSP CRC query not supported");
            self.send_str("E01");
        } else if body == b"qfThreadInfo" {
            // The single thread of control.
            let reply = format!("m{:x}", DUMMY_TID);
            self.send_str(&reply);
        } else if body == b"qsThreadInfo" {
            // No more threads: end of list.
            self.send_str("l");
        } else if body.starts_with(b"qL") {
            warn!("RSP qL deprecated: no info returned");
            self.send_str("qM001");
        } else if body.starts_with(b"qRcmd,") {
            return self.handle_rcmd();
        } else if body.starts_with(b"qSupported") {
            // Ignore the client's feature list; the packet size lets GDB
            // size its own buffers.
            let reply = format!("PacketSize={:x}", self.pkt.buf_size());
            self.send_str(&reply);
        } else if body.starts_with(b"qSymbol:") {
            // Offer to look up symbols; nothing we want.
            self.send_str("OK");
        } else if body.starts_with(b"qThreadExtraInfo,") {
            self.pkt.pack_hexstr(b"Runnable\0");
            self.send();
        } else {
            self.send_empty();
        }

        Ok(())
    }

    /// `Q*`: no set requests are supported.
    pub(crate) fn handle_set(&mut self) {
        self.send_empty();
    }

    /// `v*`: none of the `v` family is supported.
    pub(crate) fn handle_vpkt(&mut self) {
        self.send_empty();
    }
}
