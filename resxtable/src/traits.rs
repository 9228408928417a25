//! Traits for reading and writing resource documents.

use std::{
    fs::File,
    io::{BufRead, BufWriter, Cursor, Read, Write},
    path::Path,
};

use crate::error::Error;

/// A document that can be parsed from and written to one file.
///
/// Files are decoded before parsing: a UTF-16 or UTF-8 byte order mark picks
/// the encoding, UTF-8 is assumed otherwise. Writing always produces UTF-8.
///
/// # Example
///
/// ```rust,no_run
/// use resxtable::{traits::Parser, xml::XmlDocument};
/// let document = XmlDocument::read_from("Resources.resx")?;
/// document.write_to("Resources.copy.resx")?;
/// Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub trait Parser {
    /// Parse from a reader yielding UTF-8.
    fn from_reader<R: BufRead>(reader: R) -> Result<Self, Error>
    where
        Self: Sized;

    /// Write to any writer (file, memory, etc.).
    fn to_writer<W: Write>(&self, writer: W) -> Result<(), Error>;

    /// Parse from file path, honoring a byte order mark.
    fn read_from<P: AsRef<Path>>(path: P) -> Result<Self, Error>
    where
        Self: Sized,
    {
        let file = File::open(path)?;
        let mut decoder = encoding_rs_io::DecodeReaderBytesBuilder::new()
            .bom_override(true)
            .build(file);

        let mut decoded = String::new();
        decoder.read_to_string(&mut decoded)?;
        Self::from_str(&decoded)
    }

    /// Write to file path.
    fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.to_writer(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Parse from a string.
    fn from_str(s: &str) -> Result<Self, Error>
    where
        Self: Sized,
    {
        Self::from_reader(Cursor::new(s))
    }
}
