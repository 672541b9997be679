// Byte-channel management for the emulator's flight-software side.
//
// The AT protocol is not frame-oriented on the wire: commands are CR-
// terminated lines interleaved with raw binary writes, so unlike a framed
// transport this connection hands chunks to the caller as they arrive and
// leaves all interpretation to the emulator's state machine.

use bytes::{Bytes, BytesMut};
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter};

/// A byte-oriented channel standing in for the modem's serial line.
///
/// Generic over the stream so a TCP socket (the usual stand-in for a serial
/// port in the simulated topology) and an in-memory duplex used by tests go
/// through the same code.
#[derive(Debug)]
pub struct SerialConnection<T> {
    // Write-level buffering; replies are small and bursty, so batching them
    // before the flush keeps the syscall count down.
    stream: BufWriter<T>,

    // Reusable read buffer.
    buffer: BytesMut,
}

impl<T: AsyncRead + AsyncWrite + Unpin> SerialConnection<T> {
    pub fn new(stream: T) -> SerialConnection<T> {
        SerialConnection {
            stream: BufWriter::new(stream),
            buffer: BytesMut::with_capacity(4 * 1024),
        }
    }

    /// Read the next chunk of bytes from the channel.
    ///
    /// Returns `None` on a clean end of stream. Chunk boundaries carry no
    /// meaning; the caller reassembles lines and binary frames itself.
    pub async fn read_data(&mut self) -> io::Result<Option<Bytes>> {
        if 0 == self.stream.read_buf(&mut self.buffer).await? {
            return Ok(None);
        }

        Ok(Some(self.buffer.split().freeze()))
    }

    /// Write `data` and flush it to the peer.
    pub async fn write_data(&mut self, data: &[u8]) -> io::Result<()> {
        self.stream.write_all(data).await?;
        self.stream.flush().await
    }
}
