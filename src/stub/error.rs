use core::fmt;
use core::fmt::Debug;
use core::fmt::Display;

use crate::target::ResetType;
use crate::target::ResumeResult;

/// An error which terminates [`serve`](crate::GdbServer::serve).
///
/// The dispatch loop recovers from malformed packets and lost client
/// sessions on its own; what remains here is unrecoverable, because carrying
/// on would corrupt the debug session.
#[derive(Debug)]
pub enum GdbServerError<E> {
    /// The transport failed while waiting for a client to attach.
    Connect(E),
    /// The target failed a reset requested through `monitor reset`.
    ResetFailed(ResetType),
    /// The target returned a resume result the continue loop cannot
    /// interpret.
    UnexpectedResumeResult(ResumeResult),
}

impl<E: Display> Display for GdbServerError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GdbServerError::Connect(e) => {
                write!(f, "unable to accept a client connection: {}", e)
            }
            GdbServerError::ResetFailed(ResetType::Warm) => {
                write!(f, "target failed to warm reset")
            }
            GdbServerError::ResetFailed(ResetType::Cold) => {
                write!(f, "target failed to cold reset")
            }
            GdbServerError::UnexpectedResumeResult(res) => {
                write!(f, "unrecognized resume result from target: {}", res)
            }
        }
    }
}

impl<E: Debug + Display> std::error::Error for GdbServerError<E> {}
