//! The core [`GdbServer`] type, used to drive a GDB debugging session for a
//! simulated CPU [`Target`] over a packet-level [`Connection`].

use std::time::Duration;

use log::error;

use crate::conn::Connection;
use crate::flags::TraceFlags;
use crate::matchpoint::MatchpointTable;
use crate::protocol::packet::RspPacket;
use crate::target::Target;

mod builder;
mod core_impl;
mod error;

pub use builder::{GdbServerBuilder, GdbServerBuilderError};
pub use error::GdbServerError;

use core_impl::SyscallContinuation;

/// What the server does when the GDB client sends a kill request (`k`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KillBehaviour {
    /// Shut the server down.
    #[default]
    ExitOnKill,
    /// Keep serving, ready for the client to restart the session.
    ResetOnKill,
}

/// A GDB Remote Serial Protocol server for a single bare-metal debuggee.
///
/// The server owns the transport, the target, the packet buffer, and all
/// session state. It is single threaded and cooperative: one event loop
/// blocks on [`Connection::get_pkt`] between packets, and the only other
/// blocking points are the bounded slices handed to [`Target::resume`].
pub struct GdbServer<'a, T: Target, C: Connection> {
    conn: C,
    cpu: T,
    pkt: RspPacket<'a>,
    matchpoints: MatchpointTable,
    trace_flags: TraceFlags,
    timeout: Duration,
    kill_behaviour: KillBehaviour,
    exit_server: bool,
    syscall_continuation: SyscallContinuation,
}

impl<'a, T: Target, C: Connection> GdbServer<'a, T, C> {
    /// Create a [`GdbServerBuilder`] using the provided transport and CPU.
    pub fn builder(conn: C, cpu: T) -> GdbServerBuilder<'a, T, C> {
        GdbServerBuilder::new(conn, cpu)
    }

    /// Create a `GdbServer` with a heap-allocated default packet buffer and
    /// default behaviour. Use [`GdbServer::builder`] for fine-grained
    /// control.
    pub fn new(conn: C, cpu: T) -> GdbServer<'a, T, C> {
        GdbServerBuilder::new(conn, cpu).build().unwrap()
    }

    /// Serve RSP requests until the client asks the server to exit.
    ///
    /// The loop reconnects after a lost client session; a fresh connection
    /// clears any syscall continuation the previous session left pending.
    /// Returns an error only for conditions that would corrupt the debug
    /// session: a failed connect, a failed reset, or a resume result the
    /// server cannot interpret.
    pub fn serve(&mut self) -> Result<(), GdbServerError<C::Error>> {
        while !self.exit_server {
            while !self.conn.is_connected() {
                if let Err(e) = self.conn.connect() {
                    error!("unable to accept a client connection, aborting");
                    return Err(GdbServerError::Connect(e));
                }

                // The last session may have ended mid-syscall.
                self.syscall_continuation = SyscallContinuation::NonePending;
            }

            self.handle_one_request()?;
        }

        Ok(())
    }

    /// The matchpoint table.
    ///
    /// `Z`/`z` packets are not enforced at the RSP layer, so the table only
    /// changes through this accessor; targets that trap on `ebreak` can use
    /// it to plant and restore software breakpoints.
    pub fn matchpoints(&self) -> &MatchpointTable {
        &self.matchpoints
    }

    /// Mutable access to the matchpoint table.
    pub fn matchpoints_mut(&mut self) -> &mut MatchpointTable {
        &mut self.matchpoints
    }

    /// The trace-flag registry, as driven by `monitor set debug`.
    pub fn trace_flags(&self) -> &TraceFlags {
        &self.trace_flags
    }
}
