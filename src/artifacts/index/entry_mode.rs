use crate::errors::{Error, Result};

#[derive(Debug, Clone, Copy, Eq, Ord, Default, PartialEq, PartialOrd)]
pub enum FileMode {
    #[default]
    Regular,
    Executable,
}

/// Mode of a tree or index entry, in the conventional octal notation:
/// `100644` regular file, `100755` executable file, `40000` directory.
#[derive(Debug, Clone, Copy, Eq, Ord, Default, PartialEq, PartialOrd)]
pub enum EntryMode {
    File(FileMode),
    #[default]
    Directory,
}

impl EntryMode {
    pub fn as_str(&self) -> &str {
        match self {
            EntryMode::File(FileMode::Regular) => "100644",
            EntryMode::File(FileMode::Executable) => "100755",
            EntryMode::Directory => "40000",
        }
    }

    pub fn as_u32(&self) -> u32 {
        match self {
            EntryMode::File(FileMode::Regular) => 0o100644,
            EntryMode::File(FileMode::Executable) => 0o100755,
            EntryMode::Directory => 0o40000,
        }
    }

    pub fn try_from_u32(mode: u32) -> Result<Self> {
        match mode {
            0o100644 => Ok(EntryMode::File(FileMode::Regular)),
            0o100755 => Ok(EntryMode::File(FileMode::Executable)),
            0o40000 => Ok(EntryMode::Directory),
            other => Err(Error::malformed(
                "entry mode",
                format!("unsupported mode {other:o}"),
            )),
        }
    }

    pub fn is_tree(&self) -> bool {
        matches!(self, EntryMode::Directory)
    }

    pub fn is_executable(&self) -> bool {
        matches!(self, EntryMode::File(FileMode::Executable))
    }
}

impl From<FileMode> for EntryMode {
    fn from(mode: FileMode) -> Self {
        EntryMode::File(mode)
    }
}

impl TryFrom<EntryMode> for FileMode {
    type Error = Error;

    fn try_from(value: EntryMode) -> Result<Self> {
        match value {
            EntryMode::File(mode) => Ok(mode),
            EntryMode::Directory => Err(Error::malformed(
                "entry mode",
                "directory mode where a file mode was expected",
            )),
        }
    }
}

impl TryFrom<&str> for EntryMode {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        match value {
            "100644" => Ok(EntryMode::File(FileMode::Regular)),
            "100755" => Ok(EntryMode::File(FileMode::Executable)),
            "40000" => Ok(EntryMode::Directory),
            other => Err(Error::malformed(
                "entry mode",
                format!("unsupported mode {other:?}"),
            )),
        }
    }
}
