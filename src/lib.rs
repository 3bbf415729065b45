//! Static Huffman compression of a single file into a payload file and a
//! fixed-size `.header` file holding the bit count and byte frequencies.
//!
//! ```no_run
//! use std::path::Path;
//!
//! hufpack::compress(Path::new("notes.txt"), Path::new("compressed"))?;
//! hufpack::decompress(Path::new("compressed"), Path::new("notes.out"))?;
//! # Ok::<(), hufpack::Error>(())
//! ```

pub mod bitstream;
pub mod codec;
pub mod error;
pub mod frequency;
pub mod header;
pub mod huffman;

pub use codec::{compress, decode, decompress, encode, header_path, inspect};
pub use error::{Error, Result};
pub use frequency::FrequencyTable;
pub use header::{HEADER_SUFFIX, Header};
pub use huffman::{CodeTable, Tree};
