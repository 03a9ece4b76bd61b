//! Per-packet dispatch and the reply helpers shared by all handlers.

use log::trace;
use log::warn;

use crate::common::TargetSignal;
use crate::conn::Connection;
use crate::stub::error::GdbServerError;
use crate::stub::GdbServer;
use crate::stub::KillBehaviour;
use crate::target::Target;

mod base;
mod monitor;
mod query;
mod resume;


/// Where execution resumes once a pending semihosted syscall is answered.
///
/// At most one syscall is in flight at a time: the continuation is recorded
/// immediately before the `F` request goes out, and cleared by whichever
/// branch consumes it (the `F` reply, or a fresh client connection).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SyscallContinuation {
    NonePending,
    FinishStep,
    FinishContinue,
}

impl<T: Target, C: Connection> GdbServer<'_, T, C> {
    /// Read one request from the client and act on it.
    ///
    /// A failed read means the session died: close the connection and let
    /// the serve loop reconnect. Every other outcome produces exactly one
    /// reply (possibly empty) before the next request is read, except the
    /// resume paths, which reply with a stop reply once the target halts.
    pub(crate) fn handle_one_request(&mut self) -> Result<(), GdbServerError<C::Error>> {
        if self.conn.get_pkt(&mut self.pkt).is_err() {
            self.conn.close();
            return Ok(());
        }

        trace!("<-- {}", String::from_utf8_lossy(self.pkt.data()));

        let first = match self.pkt.data().first() {
            Some(&b) => b,
            None => {
                warn!("empty RSP request: ignored");
                self.send_empty();
                return Ok(());
            }
        };

        match first {
            // Extended remote mode, accepted.
            b'!' => self.send_str("OK"),

            // Report the last stop reason.
            b'?' => self.report_stop(TargetSignal::Trap),

            b'A' => {
                warn!("RSP 'A' packet not supported: ignored");
                self.send_str("E01");
            }

            b'b' => warn!("RSP 'b' packet is deprecated and not supported: ignored"),
            b'B' => warn!("RSP 'B' packet is deprecated (use 'Z'/'z' packets instead): ignored"),

            // The signal byte of 'C' is ignored.
            b'c' | b'C' => return self.handle_continue(),

            b'd' => warn!("RSP 'd' packet is deprecated (define a 'Q' packet instead): ignored"),

            // Detach: close the client session; the serve loop will accept
            // a new one.
            b'D' => {
                self.send_str("OK");
                self.conn.close();
            }

            b'F' => return self.handle_syscall_reply(),

            b'g' => self.handle_read_all_regs(),
            b'G' => self.handle_write_all_regs(),

            // Thread selection: single thread, so just agree.
            b'H' => self.send_str("OK"),

            // Cycle step is unimplemented; report the current stop state.
            b'i' | b'I' => self.report_stop(TargetSignal::Trap),

            b'k' => match self.kill_behaviour {
                KillBehaviour::ExitOnKill => self.exit_server = true,
                KillBehaviour::ResetOnKill => {}
            },

            b'm' => self.handle_read_mem(),
            b'M' => self.handle_write_mem(),

            b'p' => self.handle_read_reg(),
            b'P' => self.handle_write_reg(),

            b'q' => return self.handle_query(),
            b'Q' => self.handle_set(),

            b'r' => warn!("RSP 'r' packet is deprecated (use 'R' packet instead): ignored"),

            // Restart: accepted silently.
            b'R' => {}

            // The signal byte of 'S' is ignored.
            b's' | b'S' => return self.handle_single_step(),

            b't' => warn!("RSP 't' packet not supported: ignored"),

            // Thread alive check: bare metal, so always alive.
            b'T' => self.send_str("OK"),

            b'v' => self.handle_vpkt(),

            b'X' => self.handle_write_mem_bin(),

            b'z' => self.handle_remove_matchpoint(),
            b'Z' => self.handle_insert_matchpoint(),

            _ => {
                warn!(
                    "unknown RSP request {}: empty reply",
                    String::from_utf8_lossy(self.pkt.data())
                );
                self.send_empty();
            }
        }

        Ok(())
    }

    /// Send the current packet, best effort. A write failure means the
    /// session died; close it and let the serve loop reconnect.
    pub(crate) fn send(&mut self) {
        trace!("--> {}", String::from_utf8_lossy(self.pkt.data()));
        if self.conn.put_pkt(&self.pkt).is_err() {
            warn!("failed to send RSP reply: closing connection");
            self.conn.close();
        }
    }

    pub(crate) fn send_str(&mut self, s: &str) {
        self.pkt.pack_str(s);
        self.send();
    }

    /// The empty reply: "feature not supported, please degrade".
    pub(crate) fn send_empty(&mut self) {
        self.send_str("");
    }
}
