use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{Error, Result};
use chrono::SubsecRound;
use derive_new::new;

/// 40 zeros, standing for "no value" on either side of a log line.
pub const ZERO_OID: &str = "0000000000000000000000000000000000000000";

/// One line of a reference's append-only history log.
///
/// Serialized as `<old> <new> <unix-ts> <offset>\t<message>`, one line per
/// applied update, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct ReflogEntry {
    old: Option<ObjectId>,
    new: ObjectId,
    timestamp: chrono::DateTime<chrono::FixedOffset>,
    message: String,
}

impl ReflogEntry {
    /// An entry stamped with the current local time, truncated to the
    /// whole-second precision the line format carries.
    pub fn now(old: Option<ObjectId>, new: ObjectId, message: impl Into<String>) -> Self {
        let stamp = chrono::Local::now().fixed_offset().trunc_subsecs(0);
        Self::new(old, new, stamp, message.into())
    }

    pub fn old(&self) -> Option<&ObjectId> {
        self.old.as_ref()
    }

    pub fn new_value(&self) -> &ObjectId {
        &self.new
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn timestamp(&self) -> chrono::DateTime<chrono::FixedOffset> {
        self.timestamp
    }

    pub fn to_line(&self) -> String {
        let old = self.old.as_ref().map_or(ZERO_OID, |oid| oid.as_ref());
        format!(
            "{} {} {} {}\t{}\n",
            old,
            self.new,
            self.timestamp.timestamp(),
            self.timestamp.format("%z"),
            self.message
        )
    }

    pub fn parse_line(line: &str) -> Result<Self> {
        let (head, message) = line
            .split_once('\t')
            .ok_or_else(|| Error::malformed("reflog line", "missing '\\t'"))?;

        let fields: Vec<&str> = head.split(' ').collect();
        let [old, new, seconds, offset] = fields[..] else {
            return Err(Error::malformed("reflog line", format!("{head:?}")));
        };

        let old = if old == ZERO_OID {
            None
        } else {
            Some(ObjectId::try_parse(old)?)
        };
        let new = ObjectId::try_parse(new)?;
        let timestamp = chrono::DateTime::parse_from_str(&format!("{seconds} {offset}"), "%s %z")
            .map_err(|_| Error::malformed("reflog line", "invalid timestamp"))?;

        Ok(Self {
            old,
            new,
            timestamp,
            message: message.trim_end_matches('\n').to_string(),
        })
    }
}
