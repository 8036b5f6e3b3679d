// protocol.rs -- framed wire protocol spoken over the client/server FIFOs
//
// All multi-byte integers are little-endian i32. Frames are assembled into
// a single buffer before they hit the pipe so that a frame is always one
// write_full call on the sender side.

use std::io::{self, Read, Write};

use crate::error::{GameError, GameResult};

// ============================================================
// Opcodes
// ============================================================

/// Client -> server handshake request; also the server -> client ACK.
pub const OP_CONNECT: u8 = 1;
/// Client -> server orderly termination; no payload.
pub const OP_DISCONNECT: u8 = 2;
/// Client -> server player input; payload is one command byte.
pub const OP_PLAY: u8 = 3;
/// Server -> client world snapshot.
pub const OP_BOARD: u8 = 4;

/// Fixed width of the pipe path fields in a CONNECT request, NUL terminator
/// included. Must match on both ends of the wire.
pub const MAX_PIPE_PATH: usize = 40;

/// Upper bound on `width * height` accepted from the wire. Anything larger
/// is a malformed frame, not an allocation request.
pub const MAX_BOARD_AREA: i32 = 1 << 20;

// ============================================================
// Stream helpers
// ============================================================

/// Read exactly `buf.len()` bytes, retrying on interruption.
///
/// Returns the number of bytes actually read; a short count means the
/// stream hit EOF. Hard I/O errors are returned as-is.
pub fn read_full<R: Read>(r: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut off = 0;
    while off < buf.len() {
        match r.read(&mut buf[off..]) {
            Ok(0) => break,
            Ok(n) => off += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(off)
}

/// Write the whole buffer, retrying on interruption.
pub fn write_full<W: Write>(w: &mut W, buf: &[u8]) -> io::Result<()> {
    let mut off = 0;
    while off < buf.len() {
        match w.write(&buf[off..]) {
            Ok(0) => return Err(io::Error::new(io::ErrorKind::WriteZero, "pipe write returned 0")),
            Ok(n) => off += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

pub fn msg_write_byte(buf: &mut Vec<u8>, v: u8) {
    buf.push(v);
}

pub fn msg_write_long(buf: &mut Vec<u8>, v: i32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

/// Append a NUL-padded fixed-width path field.
pub fn msg_write_path(buf: &mut Vec<u8>, path: &str) -> GameResult<()> {
    let bytes = path.as_bytes();
    if bytes.len() >= MAX_PIPE_PATH {
        return Err(GameError::Protocol("pipe path too long"));
    }
    buf.extend_from_slice(bytes);
    buf.resize(buf.len() + (MAX_PIPE_PATH - bytes.len()), 0);
    Ok(())
}

pub fn msg_read_byte<R: Read>(r: &mut R) -> GameResult<u8> {
    let mut b = [0u8; 1];
    if read_full(r, &mut b)? != 1 {
        return Err(GameError::Disconnected);
    }
    Ok(b[0])
}

pub fn msg_read_long<R: Read>(r: &mut R) -> GameResult<i32> {
    let mut b = [0u8; 4];
    if read_full(r, &mut b)? != 4 {
        return Err(GameError::Disconnected);
    }
    Ok(i32::from_le_bytes(b))
}

/// Read a fixed-width path field; the result is truncated at the first NUL.
pub fn msg_read_path<R: Read>(r: &mut R) -> GameResult<String> {
    let mut b = [0u8; MAX_PIPE_PATH];
    if read_full(r, &mut b)? != MAX_PIPE_PATH {
        return Err(GameError::Disconnected);
    }
    let end = b.iter().position(|&c| c == 0).unwrap_or(MAX_PIPE_PATH - 1);
    match std::str::from_utf8(&b[..end]) {
        Ok(s) => Ok(s.to_owned()),
        Err(_) => Err(GameError::Protocol("pipe path is not valid utf-8")),
    }
}

// ============================================================
// CONNECT
// ============================================================

/// Payload of a client CONNECT request: where the server should reach the
/// client back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectRequest {
    pub req_pipe: String,
    pub notif_pipe: String,
}

impl ConnectRequest {
    /// Encode the full frame, opcode included.
    pub fn encode(&self) -> GameResult<Vec<u8>> {
        let mut buf = Vec::with_capacity(1 + 2 * MAX_PIPE_PATH);
        msg_write_byte(&mut buf, OP_CONNECT);
        msg_write_path(&mut buf, &self.req_pipe)?;
        msg_write_path(&mut buf, &self.notif_pipe)?;
        Ok(buf)
    }

    /// Decode the payload; the opcode byte has already been consumed.
    pub fn read_payload<R: Read>(r: &mut R) -> GameResult<ConnectRequest> {
        let req_pipe = msg_read_path(r)?;
        let notif_pipe = msg_read_path(r)?;
        Ok(ConnectRequest { req_pipe, notif_pipe })
    }
}

/// Encode the server's handshake ACK. `result` 0 means accepted.
pub fn encode_connect_ack(result: u8) -> Vec<u8> {
    vec![OP_CONNECT, result]
}

/// Read the handshake ACK on the client side, opcode included.
pub fn read_connect_ack<R: Read>(r: &mut R) -> GameResult<u8> {
    let op = msg_read_byte(r)?;
    if op != OP_CONNECT {
        return Err(GameError::Protocol("expected CONNECT ack"));
    }
    msg_read_byte(r)
}

// ============================================================
// BOARD
// ============================================================

/// A serialized point-in-time snapshot of one game world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardFrame {
    pub width: i32,
    pub height: i32,
    pub tempo: i32,
    pub victory: i32,
    pub game_over: i32,
    pub points: i32,
    /// Row-major cell glyphs, exactly `width * height` bytes.
    pub data: Vec<u8>,
}

impl BoardFrame {
    /// Encode the full frame, opcode included.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(1 + 6 * 4 + self.data.len());
        msg_write_byte(&mut buf, OP_BOARD);
        msg_write_long(&mut buf, self.width);
        msg_write_long(&mut buf, self.height);
        msg_write_long(&mut buf, self.tempo);
        msg_write_long(&mut buf, self.victory);
        msg_write_long(&mut buf, self.game_over);
        msg_write_long(&mut buf, self.points);
        buf.extend_from_slice(&self.data);
        buf
    }

    /// Decode the payload; the opcode byte has already been consumed.
    pub fn read_payload<R: Read>(r: &mut R) -> GameResult<BoardFrame> {
        let width = msg_read_long(r)?;
        let height = msg_read_long(r)?;
        let tempo = msg_read_long(r)?;
        let victory = msg_read_long(r)?;
        let game_over = msg_read_long(r)?;
        let points = msg_read_long(r)?;

        if width <= 0 || height <= 0 {
            return Err(GameError::Protocol("non-positive board dimensions"));
        }
        match width.checked_mul(height) {
            Some(area) if area <= MAX_BOARD_AREA => {
                let mut data = vec![0u8; area as usize];
                if read_full(r, &mut data)? != data.len() {
                    return Err(GameError::Disconnected);
                }
                Ok(BoardFrame {
                    width,
                    height,
                    tempo,
                    victory,
                    game_over,
                    points,
                    data,
                })
            }
            _ => Err(GameError::Protocol("board dimensions out of range")),
        }
    }
}
