//! Protocol-visible types and constants shared across the server.

use core::fmt;
use core::time::Duration;

/// How long the target runs before control returns to the server to poll for
/// a GDB interrupt or a timeout.
///
/// Must always be less than one second, the smallest timeout a user can set
/// with `monitor timeout`. Keeping it short also keeps GDB's Ctrl-C
/// responsive.
pub const INTERRUPT_SLICE: Duration = Duration::from_millis(100);

/// The single thread id this stub reports. The simulator is bare metal, so
/// there is no real thread context behind it.
pub const DUMMY_TID: u32 = 1;

/// Number of registers in the `g`/`G` packet: 32 general registers plus PC.
pub const RISCV_NUM_REGS: usize = 33;

/// The `ebreak` instruction, written over the original instruction word when
/// a software breakpoint is planted.
pub const BREAK_INSTR: u32 = 0x0010_0073;

/// Signal numbers reported to GDB in `S<xx>` stop replies.
///
/// The numeric values are defined by the GDB Remote Serial Protocol and are
/// hex-encoded directly onto the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TargetSignal {
    /// No signal.
    None = 0,
    /// Interrupted (Ctrl-C from the client).
    Int = 2,
    /// Trace/breakpoint trap. Also the initial stop reason.
    Trap = 5,
    /// CPU time limit exceeded (the user-settable continue timeout).
    Xcpu = 24,
    /// Catch-all for conditions GDB has no better name for.
    Unknown = 143,
}

impl TargetSignal {
    /// The wire value, as hex-encoded into an `S<xx>` stop reply.
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for TargetSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TargetSignal::None => "SIGNONE",
            TargetSignal::Int => "SIGINT",
            TargetSignal::Trap => "SIGTRAP",
            TargetSignal::Xcpu => "SIGXCPU",
            TargetSignal::Unknown => "SIGUNKNOWN",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_codes_match_the_protocol() {
        assert_eq!(TargetSignal::None.code(), 0);
        assert_eq!(TargetSignal::Int.code(), 2);
        assert_eq!(TargetSignal::Trap.code(), 5);
        assert_eq!(TargetSignal::Xcpu.code(), 24);
        assert_eq!(TargetSignal::Unknown.code(), 143);
    }

    #[test]
    fn slice_is_below_the_smallest_user_timeout() {
        assert!(INTERRUPT_SLICE < Duration::from_secs(1));
    }
}
