//! Persisted form of the incorrectly answered questions.
//!
//! Wire format: entries joined by `-`, each entry `<index>|<orgIndex>`,
//! e.g. `1|0-2|2`. Decoding yields structured entries immediately; raw
//! strings never travel further than this module.

use std::fmt;
use std::str::FromStr;

use crate::error::CodecError;
use crate::model::{Question, QuestionBank};

pub const ENTRY_DELIMITER: &str = "-";
pub const FIELD_DELIMITER: &str = "|";

/// One incorrectly answered question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IncorrectEntry {
    /// Position in the ordering that was active when it was answered.
    pub index: usize,
    /// Position in the original bank.
    pub org_index: usize,
}

impl fmt::Display for IncorrectEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{FIELD_DELIMITER}{}", self.index, self.org_index)
    }
}

impl FromStr for IncorrectEntry {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || CodecError::Malformed(s.to_string());
        let (index, org_index) = s.trim().split_once(FIELD_DELIMITER).ok_or_else(malformed)?;
        Ok(IncorrectEntry {
            index: index.trim().parse().map_err(|_| malformed())?,
            org_index: org_index.trim().parse().map_err(|_| malformed())?,
        })
    }
}

/// Ordered set of incorrectly answered questions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncorrectSet {
    entries: Vec<IncorrectEntry>,
}

impl IncorrectSet {
    pub fn new(entries: Vec<IncorrectEntry>) -> Self {
        Self { entries }
    }

    /// Collect the questions whose correctness flag is false, in list order.
    pub fn from_questions<'a>(questions: impl IntoIterator<Item = &'a Question>) -> Self {
        let entries = questions
            .into_iter()
            .filter(|q| !q.correct)
            .map(|q| IncorrectEntry {
                index: q.index(),
                org_index: q.org_index(),
            })
            .collect();
        Self { entries }
    }

    /// Decode the joined wire form.
    pub fn decode(s: &str) -> Result<Self, CodecError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(CodecError::Empty);
        }
        let entries = s
            .split(ENTRY_DELIMITER)
            .map(str::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entries })
    }

    /// Decode the already-split form handed back by the persistence layer.
    pub fn from_entries<S: AsRef<str>>(entries: &[S]) -> Result<Self, CodecError> {
        if entries.is_empty() {
            return Err(CodecError::Empty);
        }
        let entries = entries
            .iter()
            .map(|e| e.as_ref().parse())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entries })
    }

    /// Encode to the joined wire form.
    pub fn encode(&self) -> String {
        self.to_entries().join(ENTRY_DELIMITER)
    }

    /// Encode to the split form the persistence layer stores.
    pub fn to_entries(&self) -> Vec<String> {
        self.entries.iter().map(ToString::to_string).collect()
    }

    /// Look every entry up in the bank.
    ///
    /// Fails when an entry names a question the bank does not have, when a
    /// question repeats, or when there are more entries than `total`.
    pub fn resolve(&self, bank: &QuestionBank, total: usize) -> Result<Vec<usize>, CodecError> {
        if self.entries.is_empty() {
            return Err(CodecError::Empty);
        }
        if self.entries.len() > total {
            return Err(CodecError::TooMany {
                count: self.entries.len(),
                total,
            });
        }
        let mut order = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let question = bank
                .get(entry.org_index)
                .ok_or(CodecError::UnknownQuestion(entry.org_index))?;
            if order.contains(&question.org_index()) {
                return Err(CodecError::Duplicate(entry.org_index));
            }
            order.push(question.org_index());
        }
        Ok(order)
    }

    pub fn entries(&self) -> &[IncorrectEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for IncorrectSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for IncorrectSet {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}
