//! The framed-transport capability consumed by the server.

use crate::protocol::packet::RspPacket;

/// A packet-level RSP transport.
///
/// Implementations own the byte-stream details of the protocol: `$...#xx`
/// framing, checksum verification, `+`/`-` acknowledgements, and run-length
/// escaping. The server only ever exchanges whole packet payloads.
pub trait Connection {
    /// Transport-specific error type.
    type Error;

    /// Block until a client attaches.
    ///
    /// An error here is unrecoverable and terminates the server.
    fn connect(&mut self) -> Result<(), Self::Error>;

    /// Drop the current client session, if any.
    fn close(&mut self);

    /// Is a client currently attached?
    fn is_connected(&self) -> bool;

    /// Read the next packet payload into `pkt`, blocking until a complete
    /// packet arrives.
    ///
    /// An error means the stream died (EOF or transport failure); the server
    /// responds by closing the session and waiting for a reconnect.
    fn get_pkt(&mut self, pkt: &mut RspPacket<'_>) -> Result<(), Self::Error>;

    /// Frame and send `pkt`, blocking until it is acknowledged.
    fn put_pkt(&mut self, pkt: &RspPacket<'_>) -> Result<(), Self::Error>;

    /// Non-blocking peek for an out-of-band Ctrl-C byte (`0x03`).
    ///
    /// Polled while the target runs, so this must never block.
    fn have_break(&mut self) -> bool;
}
