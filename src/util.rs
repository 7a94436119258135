//! Utility functions used in all other fsstats modules.

use flate2::bufread::GzDecoder;

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::Result;

/// Check whether the file extension ends with ".gz".
pub fn is_gz_file<P>(path: P) -> bool
where
    P: AsRef<Path>,
{
    path.as_ref()
        .file_name()
        .map(|a| a.to_string_lossy().ends_with(".gz"))
        .unwrap_or(false)
}


/// Read the full content of a file. If the file's name ends with ".gz", it is GZip decoded.
/// Stats files are not typically compressed, but this is very handy for test data.
pub fn read_file_bytes<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    let gz = is_gz_file(&path);
    let file = BufReader::new(File::open(path)?);
    let mut content: Vec<u8> = Vec::new();
    if gz {
        GzDecoder::new(file).read_to_end(&mut content)?;
    } else {
        let mut file = file;
        file.read_to_end(&mut content)?;
    }
    Ok(content)
}


/// Read the full content of a text file, see [`read_file_bytes`]. Invalid UTF-8 is replaced, not rejected.
pub fn read_text_file<P: AsRef<Path>>(path: P) -> Result<String> {
    let content = read_file_bytes(path)?;
    Ok(String::from_utf8_lossy(&content).into_owned())
}
