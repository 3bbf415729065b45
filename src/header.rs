use std::io::{Read, Write};

use crate::bitstream::payload_len;
use crate::error::{Error, Result};
use crate::frequency::{ALPHABET_SIZE, FrequencyTable};
use crate::huffman::{CodeTable, Tree};

/// Appended to the base path to name the header file.
pub const HEADER_SUFFIX: &str = ".header";

/// Bit count field plus 256 frequency fields, each a little-endian `i32`.
pub const HEADER_LEN: usize = 4 + 4 * ALPHABET_SIZE;

/// Everything needed to rebuild the tree and bound the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub bit_count: u64,
    pub frequencies: FrequencyTable,
}

impl Header {
    pub fn new(bit_count: u64, frequencies: FrequencyTable) -> Self {
        Self {
            bit_count,
            frequencies,
        }
    }

    pub fn to_bytes(&self) -> Result<[u8; HEADER_LEN]> {
        let mut bytes = [0u8; HEADER_LEN];
        let bit_count = i32::try_from(self.bit_count).map_err(|_| {
            Error::TooLarge(format!(
                "{} encoded bits exceed the header's 32-bit field",
                self.bit_count
            ))
        })?;
        bytes[..4].copy_from_slice(&bit_count.to_le_bytes());

        for (symbol, &count) in self.frequencies.counts().iter().enumerate() {
            let count = i32::try_from(count).map_err(|_| {
                Error::TooLarge(format!("byte {symbol:#04x} occurs {count} times"))
            })?;
            let offset = 4 + 4 * symbol;
            bytes[offset..offset + 4].copy_from_slice(&count.to_le_bytes());
        }

        Ok(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != HEADER_LEN {
            return Err(Error::MalformedHeader(format!(
                "expected {HEADER_LEN} bytes, got {}",
                bytes.len()
            )));
        }

        let mut fields = bytes
            .chunks_exact(4)
            .map(|chunk| i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));

        let bit_count = fields.next().unwrap_or_default();
        let bit_count = u64::try_from(bit_count).map_err(|_| {
            Error::MalformedHeader(format!("negative bit count {bit_count}"))
        })?;

        let mut counts = [0u32; ALPHABET_SIZE];
        for (symbol, (slot, field)) in counts.iter_mut().zip(fields).enumerate() {
            *slot = u32::try_from(field).map_err(|_| {
                Error::MalformedHeader(format!("negative count {field} for byte {symbol:#04x}"))
            })?;
        }

        Ok(Self::new(bit_count, FrequencyTable::from_counts(counts)))
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.to_bytes()?)?;
        Ok(())
    }

    /// Reads one record; trailing data is reported as malformed.
    ///
    /// At most one byte past the record is read, so an oversized file is
    /// rejected without loading it.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut bytes = Vec::with_capacity(HEADER_LEN + 1);
        reader.by_ref().take(HEADER_LEN as u64 + 1).read_to_end(&mut bytes)?;
        Self::from_bytes(&bytes)
    }

    /// Original data length implied by the frequencies.
    pub fn original_len(&self) -> u64 {
        self.frequencies.total()
    }

    /// Checks the record against itself and against the payload it came with.
    ///
    /// Returns the rebuilt tree and code table so callers need not derive them again.
    pub fn validate(&self, payload_bytes: u64) -> Result<Option<(Tree, CodeTable)>> {
        let expected = payload_len(self.bit_count);
        if payload_bytes != expected {
            return Err(Error::MalformedHeader(format!(
                "{} bits need {expected} payload bytes, found {payload_bytes}",
                self.bit_count
            )));
        }

        let Some(tree) = Tree::build(&self.frequencies) else {
            if self.bit_count != 0 {
                return Err(Error::MalformedHeader(format!(
                    "{} bits recorded but no symbol counted",
                    self.bit_count
                )));
            }
            return Ok(None);
        };

        let codes = CodeTable::derive(&tree);
        let implied = codes.encoded_len(&self.frequencies).unwrap_or_default();
        if implied != self.bit_count {
            return Err(Error::MalformedHeader(format!(
                "frequencies imply {implied} bits, header records {}",
                self.bit_count
            )));
        }

        Ok(Some((tree, codes)))
    }
}
