use crate::error::{Error, Result};
use crate::huffman::CodeTable;

/// Packs digits least-significant-bit first; digit `i` of a byte lands in bit `i`.
#[derive(Debug, Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    buf: u8,
    bits_in_buf: u32,
    bit_count: u64,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bit: bool) {
        if bit {
            self.buf |= 1 << self.bits_in_buf;
        }
        self.bits_in_buf += 1;
        self.bit_count += 1;

        if self.bits_in_buf == 8 {
            self.bytes.push(self.buf);
            self.buf = 0;
            self.bits_in_buf = 0;
        }
    }

    pub fn push_code(&mut self, code: &[bool]) {
        for &bit in code {
            self.push(bit);
        }
    }

    pub fn bit_count(&self) -> u64 {
        self.bit_count
    }

    /// Flushes the last partial byte with its unused high bits left zero.
    pub fn finish(mut self) -> (Vec<u8>, u64) {
        if self.bits_in_buf > 0 {
            self.bytes.push(self.buf);
        }
        (self.bytes, self.bit_count)
    }
}

/// Encodes every byte with its code and returns the payload and exact digit count.
///
/// Every byte of `data` must have a code in `codes`.
pub fn pack(data: &[u8], codes: &CodeTable) -> (Vec<u8>, u64) {
    let mut writer = BitWriter::new();
    for &byte in data {
        let code = codes.get(byte).expect("frequency table counts every byte");
        writer.push_code(code);
    }
    writer.finish()
}

/// Number of payload bytes holding `bit_count` digits.
pub fn payload_len(bit_count: u64) -> u64 {
    bit_count.div_ceil(8)
}

/// Widest field `BitStream::read` accepts; wider reads would overflow the buffer.
pub const MAX_READ_BITS: u32 = 24;

pub struct BitStream<'a> {
    bytes: &'a [u8],
    byte_pos: usize,
    buf: u32,
    bits_in_buf: u32,
}

impl<'a> BitStream<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            byte_pos: 0,
            buf: 0,
            bits_in_buf: 0,
        }
    }

    pub fn read(&mut self, need: u32) -> Result<u32> {
        if need > MAX_READ_BITS {
            return Err(Error::CorruptPayload(format!(
                "cannot read {need} bits at once, limit is {MAX_READ_BITS}"
            )));
        }

        let mut val = self.buf;

        while self.bits_in_buf < need {
            if self.byte_pos == self.bytes.len() {
                return Err(Error::CorruptPayload(format!(
                    "unexpected end of payload: total bytes - {}, need - {}",
                    self.bytes.len(),
                    need
                )));
            }
            val |= (self.bytes[self.byte_pos] as u32) << self.bits_in_buf;
            self.byte_pos += 1;
            self.bits_in_buf += 8;
        }

        self.buf = val >> need;
        self.bits_in_buf -= need;

        Ok(val & ((1 << need) - 1))
    }

    pub fn read_bit(&mut self) -> Result<bool> {
        Ok(self.read(1)? == 1)
    }
}

/// Lazily yields exactly `bit_count` digits, ignoring padding in the final byte.
pub fn read_bits(
    payload: &[u8],
    bit_count: u64,
) -> Result<impl Iterator<Item = Result<bool>> + '_> {
    if payload_len(bit_count) > payload.len() as u64 {
        return Err(Error::CorruptPayload(format!(
            "{bit_count} bits need {} bytes, payload has {}",
            payload_len(bit_count),
            payload.len()
        )));
    }

    let mut stream = BitStream::new(payload);
    Ok((0..bit_count).map(move |_| stream.read_bit()))
}

/// Extracts exactly `bit_count` digits, ignoring padding in the final byte.
pub fn unpack(payload: &[u8], bit_count: u64) -> Result<Vec<bool>> {
    read_bits(payload, bit_count)?.collect()
}
