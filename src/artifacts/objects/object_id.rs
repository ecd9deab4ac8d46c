//! Object identifier (SHA-1 digest).
//!
//! Object IDs are 40-character hexadecimal strings naming immutable objects.
//! Two objects with identical canonical encodings always hash to the same
//! identifier, which is the content-addressing invariant everything above
//! the database layer relies on.
//!
//! ## Storage
//!
//! Objects live at `objects/<first-2-chars>/<remaining-38-chars>` under the
//! repository state directory.

use crate::artifacts::objects::OBJECT_ID_LENGTH;
use crate::errors::{Error, Result};
use std::io;
use std::path::PathBuf;

/// A 40-character hexadecimal SHA-1 digest identifying one object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct ObjectId(String);

impl ObjectId {
    /// Parse and validate an object ID from its hexadecimal form.
    pub fn try_parse(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.len() != OBJECT_ID_LENGTH || !id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidOid { value: id });
        }
        Ok(Self(id.to_ascii_lowercase()))
    }

    /// Write the identifier in binary form (20 bytes).
    ///
    /// Used when serializing tree entries and the index.
    pub fn write_h40_to<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        let hex40 = self.as_ref();

        // One byte per hex pair
        for i in (0..OBJECT_ID_LENGTH).step_by(2) {
            let byte = u8::from_str_radix(&hex40[i..i + 2], 16).map_err(|_| Error::InvalidOid {
                value: hex40.to_string(),
            })?;
            writer.write_all(&[byte])?;
        }

        Ok(())
    }

    /// Read an identifier from its binary form (20 bytes).
    pub fn read_h40_from<R: io::Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let mut hex40 = String::with_capacity(OBJECT_ID_LENGTH);
        let mut buffer = [0; 1];

        for _ in 0..(OBJECT_ID_LENGTH / 2) {
            reader.read_exact(&mut buffer)?;
            hex40.push_str(&format!("{:02x}", buffer[0]));
        }

        Self::try_parse(hex40)
    }

    /// Fan-out path for object storage: `abc123...` becomes `ab/c123...`.
    pub fn to_path(&self) -> PathBuf {
        let (dir, file) = self.0.split_at(2);
        PathBuf::from(dir).join(file)
    }

    /// Abbreviated form (first 7 characters), for log lines.
    pub fn to_short_oid(&self) -> String {
        self.0.split_at(7).0.to_string()
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_rejects_wrong_length_and_non_hex() {
        assert!(ObjectId::try_parse("abc123".to_string()).is_err());
        assert!(ObjectId::try_parse("g".repeat(40)).is_err());
        assert!(ObjectId::try_parse("a".repeat(40)).is_ok());
    }

    #[test]
    fn binary_roundtrip_preserves_identifier() {
        let oid = ObjectId::try_parse("0123456789abcdef0123456789abcdef01234567".to_string())
            .expect("valid oid");

        let mut bytes = Vec::new();
        oid.write_h40_to(&mut bytes).expect("write");
        assert_eq!(bytes.len(), 20);

        let read = ObjectId::read_h40_from(&mut bytes.as_slice()).expect("read");
        assert_eq!(read, oid);
    }

    #[test]
    fn fan_out_path_splits_after_two_chars() {
        let oid = ObjectId::try_parse("ab".to_string() + &"c".repeat(38)).expect("valid oid");
        assert_eq!(oid.to_path(), PathBuf::from("ab").join("c".repeat(38)));
    }
}
