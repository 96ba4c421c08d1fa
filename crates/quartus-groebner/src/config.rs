//! Engine configuration.
//!
//! The string forms exist for the command-line collaborators; unknown
//! names surface as configuration errors at startup.

use std::str::FromStr;
use std::time::Duration;

use quartus_poly::LookupKind;

use crate::error::Error;

/// Which polynomial reducer to run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReducerKind {
    /// Classical reducer on a binary heap.
    #[default]
    Heap,
    /// Classical reducer on a tournament tree.
    Tournament,
    /// Classical reducer on a geobucket.
    Geobucket,
    /// Classical reducer on a pairing heap.
    Pairing,
    /// Matrix-based F4 reduction.
    F4,
}

impl FromStr for ReducerKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "heap" => Ok(Self::Heap),
            "tournament" => Ok(Self::Tournament),
            "geobucket" => Ok(Self::Geobucket),
            "pairing" => Ok(Self::Pairing),
            "f4" => Ok(Self::F4),
            other => Err(Error::Config(format!("unknown reducer '{other}'"))),
        }
    }
}

/// Which priority-queue structure backs the S-pair triangle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum QueueKind {
    /// Binary heap.
    #[default]
    Heap,
    /// Tournament tree.
    Tournament,
    /// Geobucket.
    Geobucket,
    /// Pairing heap.
    Pairing,
}

impl FromStr for QueueKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "heap" => Ok(Self::Heap),
            "tournament" => Ok(Self::Tournament),
            "geobucket" => Ok(Self::Geobucket),
            "pairing" => Ok(Self::Pairing),
            other => Err(Error::Config(format!("unknown s-pair queue '{other}'"))),
        }
    }
}

/// Parses a divisor lookup name.
pub fn parse_lookup(s: &str) -> Result<LookupKind, Error> {
    match s {
        "divlist" => Ok(LookupKind::DivList),
        "kdtree" => Ok(LookupKind::KdTree),
        other => Err(Error::Config(format!("unknown divisor lookup '{other}'"))),
    }
}

/// Knobs of the top-level algorithms.
#[derive(Clone, Debug)]
pub struct GbConfig {
    /// The reducer variant.
    pub reducer: ReducerKind,
    /// The divisor lookup implementation.
    pub divisor_lookup: LookupKind,
    /// The S-pair queue structure.
    pub spair_queue: QueueKind,
    /// Prefer reducers with fewer terms.
    pub prefer_sparse_reducers: bool,
    /// Retire basis elements whose lead becomes reducible.
    pub auto_top_reduce: bool,
    /// Tail-reduce the basis whenever an element is inserted.
    pub auto_tail_reduce: bool,
    /// How many S-pairs to reduce at one time; 0 picks a default.
    pub s_pair_group_size: usize,
    /// Stop after this much wall-clock time; zero means no limit.
    pub break_after: Duration,
    /// Log progress every this many reductions; 0 means never.
    pub print_interval: u64,
}

impl Default for GbConfig {
    fn default() -> Self {
        Self {
            reducer: ReducerKind::default(),
            divisor_lookup: LookupKind::default(),
            spair_queue: QueueKind::default(),
            prefer_sparse_reducers: true,
            auto_top_reduce: true,
            auto_tail_reduce: false,
            s_pair_group_size: 0,
            break_after: Duration::ZERO,
            print_interval: 0,
        }
    }
}
