use crate::error::VmError;
use crate::state::State;
use byteorder::{BigEndian, ReadBytesExt};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

/// Reads a big-endian LC-3 object file and copies it into `state.memory`
/// starting at the origin stored in its first word. Words past
/// `0x10000 - origin` are dropped (§4.3) rather than treated as an error:
/// a file that overruns addressable memory is truncated, not rejected.
///
/// Loading more than one image writes them in call order, so a later image's
/// words win wherever address ranges overlap (matches `Memory::write`, which
/// has no notion of "already written").
pub fn load_image(state: &mut State, path: &Path) -> Result<(), VmError> {
    let mut reader = BufReader::new(File::open(path).map_err(|source| to_load_error(path, source))?);

    let origin = reader
        .read_u16::<BigEndian>()
        .map_err(|source| to_load_error(path, source))?;

    let max_words = usize::from(u16::max_value() - origin) + 1;
    let mut address = origin;

    for _ in 0..max_words {
        match reader.read_u16::<BigEndian>() {
            Ok(word) => {
                state.memory.write(address, word);
                address = address.wrapping_add(1);
            }
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(err) => return Err(to_load_error(path, err)),
        }
    }

    Ok(())
}

fn to_load_error(path: &Path, source: io::Error) -> VmError {
    VmError::LoadError {
        path: path.to_path_buf(),
        source,
    }
}
