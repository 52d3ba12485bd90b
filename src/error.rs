//! Error types for archipelago
//!
//! This module defines all error types used throughout the library.

use thiserror::Error;

/// Error type for configuration problems
///
/// Raised during parameter derivation, before any island starts.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// The number of objectives must be at least one
    #[error("number of objectives (nova) must be at least 1, got {0}")]
    NoObjectives(usize),

    /// Population size must be even
    #[error("population size (nsol) must be even, got {0}")]
    OddPopulation(usize),

    /// Population size is below the minimum
    #[error("population size (nsol) must be at least 6, got {0}")]
    PopulationTooSmall(usize),

    /// Too many islands for the population size
    #[error("number of islands (ncpu = {ncpu}) must not exceed nsol/2 = {limit}")]
    TooManyIslands { ncpu: usize, limit: usize },

    /// No decision variables were configured
    #[error("no decision variables: flt_min/flt_max and int_min/int_max are all empty")]
    MissingBounds,

    /// Paired bound vectors have different lengths
    #[error("bound length mismatch for {field}: expected {expected}, got {actual}")]
    BoundsMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A lower bound exceeds the corresponding upper bound
    #[error("invalid range for {field}[{index}]: min {min} > max {max}")]
    InvertedRange {
        field: &'static str,
        index: usize,
        min: f64,
        max: f64,
    },

    /// A scalar knob is outside its admissible interval
    #[error("parameter {name} = {value} is outside [{lo}, {hi}]")]
    KnobOutOfRange {
        name: &'static str,
        value: f64,
        lo: f64,
        hi: f64,
    },

    /// Crowding group size does not divide the population
    #[error("nsol = {nsol} must be a multiple of npar_grp = {npar_grp}")]
    GroupMismatch { nsol: usize, npar_grp: usize },

    /// A time interval is zero
    #[error("time interval {name} must be at least 1")]
    ZeroInterval { name: &'static str },
}

/// Error type for failures during the evolutionary run
///
/// These indicate a broken objective-function contract and abort the run;
/// snapshots already recorded remain valid.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuntimeError {
    /// The evaluator wrote a negative out-of-range value
    #[error("solution {solution}: penalty oor[{index}] = {value} is negative")]
    NegativePenalty {
        solution: usize,
        index: usize,
        value: f64,
    },

    /// The evaluator wrote a non-finite objective value
    #[error("solution {solution}: objective ova[{index}] is not finite")]
    NonFiniteObjective { solution: usize, index: usize },
}

/// Error type for broken internal invariants
///
/// These indicate a bug in the engine, not bad user input.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InternalError {
    /// Non-dominated sorting failed to place every solution in a front
    #[error("front assignment incomplete: {assigned} of {total} solutions placed")]
    IncompleteFronts { assigned: usize, total: usize },

    /// Bipartite matching produced an invalid assignment
    #[error("assignment failed: {0}")]
    MatchingFailed(String),
}

/// Top-level error type for the optimizer
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvoError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Runtime error
    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(#[from] InternalError),
}

/// Result type alias for optimizer operations
pub type EvoResult<T> = Result<T, EvoError>;
