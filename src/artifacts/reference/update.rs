use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::reference::ref_name::RefName;
use crate::errors::{Error, NO_VALUE, Result};

/// Precondition of a compare-and-set reference write.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Expect {
    /// The reference must not exist yet.
    Absent,
    /// The reference must currently hold exactly this value.
    At(ObjectId),
    /// No precondition; the write applies over whatever is there.
    #[default]
    Any,
}

impl Expect {
    pub fn admits(&self, current: Option<&ObjectId>) -> bool {
        match self {
            Expect::Absent => current.is_none(),
            Expect::At(oid) => current == Some(oid),
            Expect::Any => true,
        }
    }
}

impl std::fmt::Display for Expect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expect::Absent => write!(f, "{NO_VALUE}"),
            Expect::At(oid) => write!(f, "{oid}"),
            Expect::Any => write!(f, "<any>"),
        }
    }
}

/// What a compare-and-set reference update did.
///
/// `Rejected` is an outcome, not an error: orchestrators record it per ref
/// and carry on. Callers that cannot proceed past a rejection escalate it
/// with [`RefUpdate::required`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefUpdate {
    /// The reference did not exist before this write.
    New,
    /// The prior value is an ancestor of the new value.
    FastForward,
    /// The prior value was replaced by a non-descendant.
    Forced,
    /// The prior value already equals the new value; nothing was written.
    NoChange,
    /// The precondition did not hold; the reference was left untouched.
    /// `<none>` stands for "absent" on either side.
    Rejected { expected: String, actual: String },
}

impl RefUpdate {
    pub fn is_rejected(&self) -> bool {
        matches!(self, RefUpdate::Rejected { .. })
    }

    /// Escalate a rejection into [`Error::CasRejected`] for callers that
    /// cannot proceed past it; every other outcome passes through.
    pub fn required(self, name: &RefName) -> Result<Self> {
        match self {
            RefUpdate::Rejected { expected, actual } => Err(Error::CasRejected {
                name: name.to_string(),
                expected,
                actual,
            }),
            outcome => Ok(outcome),
        }
    }
}

impl std::fmt::Display for RefUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefUpdate::New => write!(f, "new"),
            RefUpdate::FastForward => write!(f, "fast-forward"),
            RefUpdate::Forced => write!(f, "forced"),
            RefUpdate::NoChange => write!(f, "no-change"),
            RefUpdate::Rejected { .. } => write!(f, "rejected"),
        }
    }
}
