use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use log::{debug, trace};

use crate::bitstream::pack;
use crate::error::{Error, Result};
use crate::frequency::FrequencyTable;
use crate::header::{HEADER_SUFFIX, Header};
use crate::huffman::{CodeTable, Tree};

/// Path of the header file that accompanies the data file at `base`.
pub fn header_path(base: &Path) -> PathBuf {
    let mut path = OsString::from(base.as_os_str());
    path.push(HEADER_SUFFIX);
    PathBuf::from(path)
}

/// Encodes `data` into its header and packed payload.
pub fn encode(data: &[u8]) -> Result<(Header, Vec<u8>)> {
    if data.len() > i32::MAX as usize {
        return Err(Error::TooLarge(format!("{} input bytes", data.len())));
    }
    let frequencies = FrequencyTable::of(data);
    trace!("frequencies: {:?}", frequencies.iter().collect::<Vec<_>>());

    let Some(tree) = Tree::build(&frequencies) else {
        debug!("empty input, writing empty payload");
        return Ok((Header::new(0, frequencies), Vec::new()));
    };
    let codes = CodeTable::derive(&tree);
    let (payload, bit_count) = pack(data, &codes);

    debug!(
        "encoded {} bytes ({} distinct) into {} bits / {} bytes",
        data.len(),
        frequencies.distinct(),
        bit_count,
        payload.len()
    );

    Ok((Header::new(bit_count, frequencies), payload))
}

/// Rebuilds the original bytes from a header and its payload.
pub fn decode(header: &Header, payload: &[u8]) -> Result<Vec<u8>> {
    let Some((tree, _)) = header.validate(payload.len() as u64)? else {
        return Ok(Vec::new());
    };

    let decoded = tree.decode_payload(payload, header.bit_count)?;

    if decoded.len() as u64 != header.original_len() {
        return Err(Error::CorruptPayload(format!(
            "decoded {} bytes, header counts {}",
            decoded.len(),
            header.original_len()
        )));
    }

    debug!(
        "decoded {} bits into {} bytes",
        header.bit_count,
        decoded.len()
    );
    Ok(decoded)
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    let mut file = File::open(path).map_err(|source| Error::InputNotFound {
        path: path.to_path_buf(),
        source,
    })?;
    let mut data = Vec::new();
    file.read_to_end(&mut data)?;
    Ok(data)
}

/// Compresses `input` into a data file at `output_base` and a header file
/// next to it, overwriting both.
///
/// Fails with [`Error::InputNotFound`] before anything is written if
/// `input` cannot be opened.
pub fn compress(input: &Path, output_base: &Path) -> Result<()> {
    let data = read_input(input)?;
    let (header, payload) = encode(&data)?;
    let header_bytes = header.to_bytes()?;

    fs::write(output_base, &payload)?;
    fs::write(header_path(output_base), header_bytes)?;

    debug!(
        "compressed {} -> {} ({} + {} bytes)",
        input.display(),
        output_base.display(),
        payload.len(),
        header_bytes.len()
    );
    Ok(())
}

/// Restores the file compressed at `input_base` into `output`, overwriting it.
///
/// Fails with [`Error::InputNotFound`] if either artifact cannot be opened;
/// `output` is only created once decoding has succeeded.
pub fn decompress(input_base: &Path, output: &Path) -> Result<()> {
    let header = inspect(input_base)?;
    let payload = read_input(input_base)?;
    let decoded = decode(&header, &payload)?;

    fs::write(output, &decoded)?;

    debug!(
        "decompressed {} -> {} ({} bytes)",
        input_base.display(),
        output.display(),
        decoded.len()
    );
    Ok(())
}

/// Reads the header that belongs to `base` without touching the payload.
pub fn inspect(base: &Path) -> Result<Header> {
    let path = header_path(base);
    let file = File::open(&path).map_err(|source| Error::InputNotFound { path, source })?;
    Header::read_from(&mut io::BufReader::new(file))
}
