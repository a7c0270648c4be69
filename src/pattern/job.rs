//! Job descriptors.
//!
//! A job is a contiguous block of ranks running one collective pattern. The
//! motif arguments that accompany a job (`arg.root=0 arg.count=2048 ...`) are
//! kept as a key/value map; only `root` changes the hop-count analysis, the
//! rest is carried through to the reports unchanged.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Match: "arg.key=value" or "key=value"
static PARAM_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:arg\.)?([A-Za-z_][A-Za-z0-9_.]*)=(\S*)$").expect("Invalid param regex")
});

/// Collective communication pattern of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pattern {
    Allreduce,
    Alltoall,
    Scatter,
    Bcast,
    Barrier,
    PingPong,
}

impl Pattern {
    pub const ALL: [Pattern; 6] = [
        Pattern::Allreduce,
        Pattern::Alltoall,
        Pattern::Scatter,
        Pattern::Bcast,
        Pattern::Barrier,
        Pattern::PingPong,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Pattern::Allreduce => "Allreduce",
            Pattern::Alltoall => "Alltoall",
            Pattern::Scatter => "Scatter",
            Pattern::Bcast => "Bcast",
            Pattern::Barrier => "Barrier",
            Pattern::PingPong => "PingPong",
        }
    }

    /// Patterns where a single root talks to every other rank
    pub fn is_rooted(&self) -> bool {
        matches!(self, Pattern::Scatter | Pattern::Bcast)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// Returned when a pattern name is not one of the known collectives
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown communication pattern '{0}'")]
pub struct UnknownPattern(pub String);

impl FromStr for Pattern {
    type Err = UnknownPattern;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pattern::ALL
            .into_iter()
            .find(|p| p.name() == s.trim())
            .ok_or_else(|| UnknownPattern(s.to_string()))
    }
}

/// Pattern-related job errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("Job {job_id} (start={start}, size={size}): unknown communication pattern '{name}'")]
    Unknown {
        job_id: usize,
        start: usize,
        size: usize,
        name: String,
    },
    #[error("Job {job_id} (start={start}, size={size}): unusable root '{root}' for {pattern}")]
    InvalidRoot {
        job_id: usize,
        start: usize,
        size: usize,
        pattern: Pattern,
        root: String,
    },
    #[error("Job {job_id} (start={start}, size={size}): {pattern} {reason}")]
    InvalidSize {
        job_id: usize,
        start: usize,
        size: usize,
        pattern: Pattern,
        reason: &'static str,
    },
}

/// Motif arguments attached to a job
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobParams(BTreeMap<String, String>);

impl JobParams {
    /// Parses a whitespace separated `arg.key=value` list.
    ///
    /// Tokens that are not `key=value` pairs are skipped.
    pub fn parse(text: &str) -> Self {
        let mut params = BTreeMap::new();
        for token in text.split_whitespace() {
            match PARAM_PATTERN.captures(token) {
                Some(caps) => {
                    params.insert(caps[1].to_string(), caps[2].to_string());
                }
                None => log::debug!("Ignoring motif argument '{}'", token),
            }
        }
        JobParams(params)
    }

    pub fn from_map(map: BTreeMap<String, String>) -> Self {
        JobParams(
            map.into_iter()
                .map(|(k, v)| (k.strip_prefix("arg.").map(str::to_string).unwrap_or(k), v))
                .collect(),
        )
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn root(&self) -> Option<&str> {
        self.get("root")
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for JobParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.iter().map(|(k, v)| format!("arg.{}={}", k, v)).collect();
        f.write_str(&rendered.join(" "))
    }
}

/// A validated job
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Job {
    pub id: usize,
    pub pattern: Pattern,
    /// First rank of the job
    pub start: usize,
    pub size: usize,
    /// Absolute rank of the root; equals `start` for patterns without a root
    pub root: usize,
    pub params: JobParams,
}

impl Job {
    /// Builds a job, resolving the root rank from `params`.
    ///
    /// The root offset is relative to `start` and must lie in `[0, size)`.
    pub fn new(
        id: usize,
        pattern: Pattern,
        start: usize,
        size: usize,
        params: JobParams,
    ) -> Result<Self, PatternError> {
        let invalid_size = |reason| PatternError::InvalidSize {
            job_id: id,
            start,
            size,
            pattern,
            reason,
        };
        if size == 0 {
            return Err(invalid_size("needs at least one rank"));
        }
        if pattern == Pattern::PingPong && size != 2 {
            return Err(invalid_size("needs exactly two ranks"));
        }

        let root = if pattern.is_rooted() {
            match params.root() {
                Some(raw) => {
                    let offset = raw.parse::<usize>().ok().filter(|&o| o < size).ok_or_else(|| {
                        PatternError::InvalidRoot {
                            job_id: id,
                            start,
                            size,
                            pattern,
                            root: raw.to_string(),
                        }
                    })?;
                    start + offset
                }
                None => start,
            }
        } else {
            start
        };

        Ok(Self {
            id,
            pattern,
            start,
            size,
            root,
            params,
        })
    }

    /// Builds a job from a textual pattern name.
    pub fn from_name(
        id: usize,
        name: &str,
        start: usize,
        size: usize,
        params: JobParams,
    ) -> Result<Self, PatternError> {
        let pattern = name.parse::<Pattern>().map_err(|UnknownPattern(name)| PatternError::Unknown {
            job_id: id,
            start,
            size,
            name,
        })?;
        Self::new(id, pattern, start, size, params)
    }

    /// One past the last rank of the job
    pub fn end(&self) -> usize {
        self.start + self.size
    }

    pub fn ranks(&self) -> std::ops::Range<usize> {
        self.start..self.end()
    }

    pub fn overlaps(&self, other: &Job) -> bool {
        self.start < other.end() && other.start < self.end()
    }
}
