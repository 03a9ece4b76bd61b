//! The simulated-CPU capability consumed by the server.

use core::fmt;
use core::time::Duration;

/// RISC-V ABI register numbers used by the semihosting protocol.
///
/// Register id 32 is the PC on this architecture.
pub mod reg {
    /// `a0`: first syscall argument and return value.
    pub const A0: usize = 10;
    /// `a1`: second syscall argument.
    pub const A1: usize = 11;
    /// `a2`: third syscall argument.
    pub const A2: usize = 12;
    /// `a3`: fourth syscall argument.
    pub const A3: usize = 13;
    /// `a7`: syscall number.
    pub const A7: usize = 17;
    /// Program counter.
    pub const PC: usize = 32;
}

/// How the server wants the target to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeType {
    /// Execute a single instruction.
    Step,
    /// Run freely, bounded by the slice passed to [`Target::resume`].
    Continue,
    /// Halt a running target.
    Stop,
}

/// What kind of reset to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetType {
    /// Reset CPU state, preserve memory contents.
    Warm,
    /// Reset CPU state and memory.
    Cold,
}

/// Why the target returned control to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeResult {
    /// Nothing to report.
    None,
    /// The requested operation completed.
    Success,
    /// The requested operation failed.
    Failure,
    /// A single step completed.
    Stepped,
    /// Execution hit a breakpoint or exception.
    Interrupted,
    /// The slice budget expired with the target still running.
    Timeout,
    /// The target hit a semihosted system call.
    Syscall,
}

impl fmt::Display for ResumeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResumeResult::None => "None",
            ResumeResult::Success => "Success",
            ResumeResult::Failure => "Failure",
            ResumeResult::Stepped => "Stepped",
            ResumeResult::Interrupted => "Interrupted",
            ResumeResult::Timeout => "Timeout",
            ResumeResult::Syscall => "Syscall",
        };
        f.write_str(name)
    }
}

/// The set of operations the server needs from a simulated CPU.
///
/// Registers are 32 bits wide on this architecture; memory is byte
/// addressed. Partial reads and writes are reported through the returned
/// sizes rather than through errors, and the server downgrades them to
/// warnings.
pub trait Target {
    /// Run the target.
    ///
    /// For [`ResumeType::Continue`] the target must honor `slice` and return
    /// [`ResumeResult::Timeout`] once it expires, so that the server can poll
    /// for client interrupts. [`ResumeType::Stop`] halts a running target
    /// and returns [`ResumeResult::Success`].
    fn resume(&mut self, how: ResumeType, slice: Option<Duration>) -> ResumeResult;

    /// Reset the target. Anything but [`ResumeResult::Success`] is treated
    /// as unrecoverable by the server.
    fn reset(&mut self, kind: ResetType) -> ResumeResult;

    /// Shut the target down ahead of server exit.
    fn terminate(&mut self) -> ResumeResult;

    /// Read register `regnum`, returning its value and width in bytes, or
    /// `None` for an invalid register id.
    fn read_register(&mut self, regnum: usize) -> Option<(u32, usize)>;

    /// Write register `regnum`, returning the number of bytes written.
    fn write_register(&mut self, regnum: usize, value: u32) -> usize;

    /// Read memory at `addr` into `data`, returning the bytes read.
    fn read(&mut self, addr: u32, data: &mut [u8]) -> usize;

    /// Write `data` to memory at `addr`, returning the bytes written.
    fn write(&mut self, addr: u32, data: &[u8]) -> usize;

    /// Cycles executed since reset.
    fn cycle_count(&self) -> u64;

    /// Instructions executed since reset.
    fn instr_count(&self) -> u64;

    /// Handle a target-specific monitor command.
    ///
    /// Output written to `out` is relayed to the GDB console. Return `false`
    /// to reject the command.
    fn command(&mut self, cmd: &str, out: &mut dyn fmt::Write) -> bool;
}
