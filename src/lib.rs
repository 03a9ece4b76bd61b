//! A GDB Remote Serial Protocol (RSP) server core for simulated RISC-V CPUs.
//!
//! An unmodified GDB client connects to the server over a framed byte-stream
//! transport and debugs software running on the simulator as though it were
//! remote hardware. The server translates RSP requests into operations on an
//! abstract CPU [`Target`], and translates target events (breakpoints,
//! semihosted syscalls, timeouts, interrupts) into RSP stop replies.
//!
//! The transport and the CPU are both injected capabilities:
//!
//! - [`Connection`] hides packet framing, checksums, and `+`/`-` acks. The
//!   server only ever sees whole packet payloads.
//! - [`Target`] is the simulated CPU: resume/step/stop, registers, memory,
//!   counters, and a free-form monitor command hook.
//!
//! ```no_run
//! # use riscv_gdbserver::{Connection, GdbServer, Target};
//! # fn demo<C: Connection, T: Target>(conn: C, cpu: T) -> Result<(), Box<dyn std::error::Error>>
//! # where C::Error: std::fmt::Debug + std::fmt::Display + 'static {
//! let mut server = GdbServer::new(conn, cpu);
//! server.serve()?;
//! # Ok(())
//! # }
//! ```

mod common;
mod conn;
mod flags;
mod matchpoint;
mod protocol;
mod stub;
mod target;

pub use common::{TargetSignal, BREAK_INSTR, DUMMY_TID, INTERRUPT_SLICE, RISCV_NUM_REGS};
pub use conn::Connection;
pub use flags::TraceFlags;
pub use matchpoint::{MatchpointKind, MatchpointTable};
pub use protocol::packet::{RspPacket, RSP_PKT_SIZE};
pub use protocol::syscall::SyscallReply;
pub use stub::{GdbServer, GdbServerBuilder, GdbServerBuilderError, GdbServerError, KillBehaviour};
pub use target::{reg, ResetType, ResumeResult, ResumeType, Target};
