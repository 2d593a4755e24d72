//! Byte transport abstraction.
//!
//! The protocol engine only needs a few primitives over a half-duplex link:
//! write a request, read whatever reply bytes show up within a window, and
//! drop stale input before a new exchange. Any implementation that can do
//! that (a serial port, a UART peripheral, a mock in tests) can back a
//! [`crate::Reader`].

pub trait RfidTransport {
    type Error: core::fmt::Debug;

    /// Write the full request frame. Returns the number of bytes written.
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    /// Read available bytes into `buffer`, waiting up to `timeout_ms`.
    /// Returns the number of bytes read; zero means the window elapsed with
    /// nothing on the wire.
    fn read(&mut self, buffer: &mut [u8], timeout_ms: u32) -> Result<usize, Self::Error>;

    /// Number of bytes already buffered and readable without blocking.
    fn bytes_available(&mut self) -> Result<usize, Self::Error>;

    /// Discard any unread input left over from a previous exchange.
    fn clear_input(&mut self) -> Result<(), Self::Error>;
}
