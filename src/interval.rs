// Half-open genomic interval `[begin, end)` anchored on a contig.

use crate::error::{CallError, Result};
use std::fmt;
use std::str::FromStr;

#[path = "interval_test.rs"]
mod interval_test;

const CONTIG_SEPARATOR: char = ':';
const BEGIN_END_SEPARATOR: char = '-';
const END_OF_CONTIG: char = '+';
const DIGIT_SEPARATOR: char = ',';

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Interval {
    pub contig: String,
    pub begin: usize,
    pub end: usize,
}

impl Interval {
    /// Build a validated interval; `end < begin` is an error.
    pub fn new(contig: impl Into<String>, begin: usize, end: usize) -> Result<Interval> {
        let interval = Interval {
            contig: contig.into(),
            begin,
            end,
        };
        if interval.end < interval.begin {
            return Err(CallError::OutOfRange(format!(
                "interval end {} precedes begin {} on {}",
                interval.end, interval.begin, interval.contig
            )));
        }
        Ok(interval)
    }

    pub fn size(&self) -> usize {
        self.end - self.begin
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn overlaps(&self, other: &Interval) -> bool {
        self.contig == other.contig && self.begin < other.end && other.begin < self.end
    }

    pub fn contains(&self, other: &Interval) -> bool {
        self.contig == other.contig && self.begin <= other.begin && self.end >= other.end
    }

    /// Smallest interval covering both. The contigs must agree.
    pub fn span_with(&self, other: &Interval) -> Result<Interval> {
        if self.contig != other.contig {
            return Err(CallError::InvalidInput(format!(
                "cannot span intervals on different contigs ({} vs {})",
                self.contig, other.contig
            )));
        }
        Ok(Interval {
            contig: self.contig.clone(),
            begin: self.begin.min(other.begin),
            end: self.end.max(other.end),
        })
    }

    /// Symmetric expansion by `padding` bases, saturating at zero on the left.
    pub fn expand_within_contig(&self, padding: usize) -> Interval {
        Interval {
            contig: self.contig.clone(),
            begin: self.begin.saturating_sub(padding),
            end: self.end + padding,
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}{}",
            self.contig, CONTIG_SEPARATOR, self.begin, BEGIN_END_SEPARATOR, self.end
        )
    }
}

impl FromStr for Interval {
    type Err = CallError;

    /// Accepted forms: `contig` (whole contig), `contig:begin` (single
    /// position), `contig:begin+` (to end of contig), `contig:begin-end`.
    /// Digit-group commas are stripped before parsing.
    fn from_str(s: &str) -> Result<Interval> {
        let parse_coord = |text: &str| -> Result<usize> {
            text.parse::<usize>().map_err(|_| {
                CallError::InvalidInput(format!("malformed interval coordinate \"{}\"", text))
            })
        };

        match s.find(CONTIG_SEPARATOR) {
            None => Interval::new(s, 0, usize::MAX),
            Some(colon) => {
                let contig = &s[..colon];
                let remain: String = s[colon + 1..]
                    .chars()
                    .filter(|&c| c != DIGIT_SEPARATOR)
                    .collect();
                if contig.is_empty() || remain.is_empty() {
                    return Err(CallError::InvalidInput(format!(
                        "malformed interval string \"{}\"",
                        s
                    )));
                }
                match remain.find(BEGIN_END_SEPARATOR) {
                    Some(dash) => {
                        let begin = parse_coord(&remain[..dash])?;
                        let end = parse_coord(&remain[dash + 1..])?;
                        Interval::new(contig, begin, end)
                    }
                    None => {
                        if let Some(stripped) = remain.strip_suffix(END_OF_CONTIG) {
                            let begin = parse_coord(stripped)?;
                            Interval::new(contig, begin, usize::MAX)
                        } else {
                            let begin = parse_coord(&remain)?;
                            Interval::new(contig, begin, begin + 1)
                        }
                    }
                }
            }
        }
    }
}
