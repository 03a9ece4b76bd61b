use core::fmt;
use core::fmt::Display;
use std::time::Duration;

use crate::conn::Connection;
use crate::flags::TraceFlags;
use crate::matchpoint::MatchpointTable;
use crate::protocol::packet::RspPacket;
use crate::protocol::packet::RSP_PKT_SIZE;
use crate::stub::core_impl::SyscallContinuation;
use crate::stub::GdbServer;
use crate::stub::KillBehaviour;
use crate::target::Target;

/// An error which may occur when building a [`GdbServer`].
#[derive(Debug)]
pub enum GdbServerBuilderError {
    /// Custom packet buffer size is larger than the provided buffer's length.
    PacketBufSizeMismatch,
}

impl Display for GdbServerBuilderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GdbServerBuilderError::PacketBufSizeMismatch => write!(
                f,
                "`packet_buffer_size` is larger than `with_packet_buffer`'s size."
            ),
        }
    }
}

impl std::error::Error for GdbServerBuilderError {}

/// Helper to construct and customize a [`GdbServer`].
pub struct GdbServerBuilder<'a, T: Target, C: Connection> {
    conn: C,
    cpu: T,
    packet_buffer: Option<&'a mut [u8]>,
    packet_buffer_size: Option<usize>,
    kill_behaviour: KillBehaviour,
    trace_flags: TraceFlags,
}

impl<'a, T: Target, C: Connection> GdbServerBuilder<'a, T, C> {
    /// Create a new `GdbServerBuilder` using the provided transport and CPU.
    pub fn new(conn: C, cpu: T) -> GdbServerBuilder<'static, T, C> {
        GdbServerBuilder {
            conn,
            cpu,
            packet_buffer: None,
            packet_buffer_size: None,
            kill_behaviour: KillBehaviour::default(),
            trace_flags: TraceFlags::new(),
        }
    }

    /// Use a pre-allocated packet buffer (instead of heap-allocating).
    pub fn with_packet_buffer(mut self, packet_buffer: &'a mut [u8]) -> Self {
        self.packet_buffer = Some(packet_buffer);
        self
    }

    /// Specify a custom size for the packet buffer. Defaults to 4096 bytes.
    ///
    /// The size is advertised to GDB via `qSupported`, so when used
    /// alongside `with_packet_buffer` it must not exceed the buffer's
    /// length.
    pub fn packet_buffer_size(mut self, size: usize) -> Self {
        self.packet_buffer_size = Some(size);
        self
    }

    /// What a kill request (`k`) does. Defaults to shutting the server down.
    pub fn kill_behaviour(mut self, behaviour: KillBehaviour) -> Self {
        self.kill_behaviour = behaviour;
        self
    }

    /// Seed the trace-flag registry, e.g. with flags already set from the
    /// command line or extra flags registered by the target.
    pub fn trace_flags(mut self, flags: TraceFlags) -> Self {
        self.trace_flags = flags;
        self
    }

    /// Build the `GdbServer`, returning an error if something went wrong.
    pub fn build(self) -> Result<GdbServer<'a, T, C>, GdbServerBuilderError> {
        let pkt = match self.packet_buffer {
            Some(buf) => {
                let buf = match self.packet_buffer_size {
                    Some(custom_len) => {
                        if custom_len > buf.len() {
                            return Err(GdbServerBuilderError::PacketBufSizeMismatch);
                        }
                        &mut buf[..custom_len]
                    }
                    None => buf,
                };
                RspPacket::with_buffer(buf)
            }
            None => RspPacket::new(self.packet_buffer_size.unwrap_or(RSP_PKT_SIZE)),
        };

        Ok(GdbServer {
            conn: self.conn,
            cpu: self.cpu,
            pkt,
            matchpoints: MatchpointTable::new(),
            trace_flags: self.trace_flags,
            timeout: Duration::ZERO,
            kill_behaviour: self.kill_behaviour,
            exit_server: false,
            syscall_continuation: SyscallContinuation::NonePending,
        })
    }
}
