//! Archive extraction into the add-on directory.
//!
//! The catalog only serves ZIP archives. Entries are written verbatim under
//! the install directory; the archive itself carries the add-on folder name.

mod zip;

pub use zip::ZipExtractor;
