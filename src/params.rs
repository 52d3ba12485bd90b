//! Configuration parameters
//!
//! Parameters are read once (JSON is the canonical serialisation), derived
//! and validated with [`Parameters::calc_derived`], and frozen thereafter.
//! Missing fields take defaults; unknown fields are ignored.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, EvoResult};

/// Update strategy used by each island
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GaType {
    /// Roulette/SUS selection with generational replacement
    Standard,
    /// Deterministic crowding in random parent groups
    Crowd,
}

impl Default for GaType {
    fn default() -> Self {
        Self::Standard
    }
}

/// Cross-island migration variant
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationKind {
    /// Each ordered island pair fights best-vs-best; the winner overwrites
    /// the worst of the loser's island
    Tournament,
    /// One random solution from each island replaces a random recipient on
    /// the ring-next neighbour
    Ring,
}

impl Default for MigrationKind {
    fn default() -> Self {
        Self::Tournament
    }
}

/// All configuration parameters
///
/// Field names follow the JSON configuration format.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    // sizes
    /// Number of objective values
    pub nova: usize,
    /// Number of out-of-range (penalty) values
    pub noor: usize,
    /// Number of solutions per island
    pub nsol: usize,
    /// Number of islands
    pub ncpu: usize,

    // time
    /// Final generation
    pub tf: usize,
    /// Generations between migrations
    pub dt_mig: usize,
    /// Generations between output snapshots
    pub dt_out: usize,

    // options
    /// Run islands in parallel
    pub pll: bool,
    /// Master random seed
    pub seed: u64,
    /// Latin-Hypercube duplicates number
    pub latin_dup: usize,
    /// Minimum value for equality-constraint conversion
    pub eps_min_prob: f64,
    /// Emit progress messages
    pub verbose: bool,
    /// Problem index (used by callers to pick a problem definition)
    pub problem: usize,

    // crossover and mutation
    /// Crossover probability (SBX per-pair, DE binomial rate)
    pub de_pc: f64,
    /// Differential evolution multiplier F
    pub de_mult: f64,
    /// Deb's SBX distribution index
    pub deb_etac: f64,
    /// Deb's polynomial mutation distribution index
    pub deb_etam: f64,
    /// Per-gene float mutation probability
    pub pm_flt: f64,
    /// Per-gene integer mutation probability
    pub pm_int: f64,
    /// Use differential-evolution recombination instead of SBX
    pub use_de: bool,

    // selection
    /// Use linear-ranking fitness instead of demerit scaling
    pub rnk: bool,
    /// Selective pressure for linear ranking, in [1, 2]
    pub rnk_sp: f64,
    /// Use roulette-wheel selection instead of SUS
    pub rws: bool,
    /// Use probabilistic (phi-blended) comparison in tournaments
    pub comp_prob: bool,
    /// Blend weight for probabilistic comparison, in [0, 1]
    pub pareto_phi: f64,
    /// Break same-front tournament ties by crowding/neighbour distance
    pub use_dist_fight: bool,
    /// Use absolute-value distances instead of Euclidean
    pub use_abs_dist: bool,

    // update variant
    /// Island update strategy
    pub ga_type: GaType,
    /// Number of parents per crowding group
    pub npar_grp: usize,
    /// Crowding pairing: all-versus-all instead of Munkres matching
    pub all_vs_all: bool,
    /// Keep the previous best if it dominates the new worst
    pub elite: bool,

    // regeneration
    /// Homogeneity threshold triggering regeneration
    pub reg_tol: f64,
    /// Fraction of the population regenerated, in [0, 1]
    pub reg_pct: f64,

    // initialisation and migration
    /// Build one Latin-Hypercube design shared by all islands
    pub gen_all: bool,
    /// Migration variant
    pub migration: MigrationKind,

    // range
    /// Minimum float values
    pub flt_min: Vec<f64>,
    /// Maximum float values
    pub flt_max: Vec<f64>,
    /// Minimum integer values (inclusive)
    pub int_min: Vec<i64>,
    /// Maximum integer values (inclusive)
    pub int_max: Vec<i64>,

    // derived
    /// Number of float genes
    #[serde(skip)]
    pub nflt: usize,
    /// Number of integer genes
    #[serde(skip)]
    pub nint: usize,
    /// Float ranges flt_max - flt_min
    #[serde(skip)]
    pub del_flt: Vec<f64>,
    /// Integer ranges int_max - int_min
    #[serde(skip)]
    pub del_int: Vec<i64>,
}

impl Default for Parameters {
    fn default() -> Self {
        let tf = 100;
        Self {
            nova: 1,
            noor: 0,
            nsol: 24,
            ncpu: 4,
            tf,
            dt_mig: tf / 10,
            dt_out: tf / 5,
            pll: true,
            seed: 0,
            latin_dup: 5,
            eps_min_prob: 0.1,
            verbose: false,
            problem: 1,
            de_pc: 0.1,
            de_mult: 0.5,
            deb_etac: 1.0,
            deb_etam: 1.0,
            pm_flt: 0.0,
            pm_int: 0.1,
            use_de: false,
            rnk: false,
            rnk_sp: 1.2,
            rws: false,
            comp_prob: false,
            pareto_phi: 0.01,
            use_dist_fight: true,
            use_abs_dist: false,
            ga_type: GaType::default(),
            npar_grp: 2,
            all_vs_all: false,
            elite: true,
            reg_tol: 1e-2,
            reg_pct: 0.3,
            gen_all: false,
            migration: MigrationKind::default(),
            flt_min: Vec::new(),
            flt_max: Vec::new(),
            int_min: Vec::new(),
            int_max: Vec::new(),
            nflt: 0,
            nint: 0,
            del_flt: Vec::new(),
            del_int: Vec::new(),
        }
    }
}

impl Parameters {
    /// Parse parameters from a JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Read parameters from a JSON file
    pub fn read(path: &std::path::Path) -> std::io::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text).map_err(std::io::Error::from)
    }

    /// Compute derived variables and check consistency
    ///
    /// Must be called (and succeed) before the parameters are handed to the
    /// optimizer. Returns the first violated constraint.
    pub fn calc_derived(&mut self) -> EvoResult<()> {
        if self.nova < 1 {
            return Err(ConfigError::NoObjectives(self.nova).into());
        }
        if self.nsol % 2 != 0 {
            return Err(ConfigError::OddPopulation(self.nsol).into());
        }
        if self.nsol < 6 {
            return Err(ConfigError::PopulationTooSmall(self.nsol).into());
        }
        if self.ncpu < 1 || self.ncpu > self.nsol / 2 {
            return Err(ConfigError::TooManyIslands {
                ncpu: self.ncpu,
                limit: self.nsol / 2,
            }
            .into());
        }

        self.nflt = self.flt_min.len();
        self.nint = self.int_min.len();
        if self.nflt == 0 && self.nint == 0 {
            return Err(ConfigError::MissingBounds.into());
        }
        if self.flt_max.len() != self.nflt {
            return Err(ConfigError::BoundsMismatch {
                field: "flt_max",
                expected: self.nflt,
                actual: self.flt_max.len(),
            }
            .into());
        }
        if self.int_max.len() != self.nint {
            return Err(ConfigError::BoundsMismatch {
                field: "int_max",
                expected: self.nint,
                actual: self.int_max.len(),
            }
            .into());
        }
        for i in 0..self.nflt {
            if self.flt_min[i] > self.flt_max[i] {
                return Err(ConfigError::InvertedRange {
                    field: "flt",
                    index: i,
                    min: self.flt_min[i],
                    max: self.flt_max[i],
                }
                .into());
            }
        }
        for i in 0..self.nint {
            if self.int_min[i] > self.int_max[i] {
                return Err(ConfigError::InvertedRange {
                    field: "int",
                    index: i,
                    min: self.int_min[i] as f64,
                    max: self.int_max[i] as f64,
                }
                .into());
            }
        }

        if !(1.0..=2.0).contains(&self.rnk_sp) {
            return Err(ConfigError::KnobOutOfRange {
                name: "rnk_sp",
                value: self.rnk_sp,
                lo: 1.0,
                hi: 2.0,
            }
            .into());
        }
        if !(0.0..=1.0).contains(&self.pareto_phi) {
            return Err(ConfigError::KnobOutOfRange {
                name: "pareto_phi",
                value: self.pareto_phi,
                lo: 0.0,
                hi: 1.0,
            }
            .into());
        }
        if !(0.0..=1.0).contains(&self.reg_pct) {
            return Err(ConfigError::KnobOutOfRange {
                name: "reg_pct",
                value: self.reg_pct,
                lo: 0.0,
                hi: 1.0,
            }
            .into());
        }
        if self.ga_type == GaType::Crowd {
            if self.npar_grp < 2 {
                return Err(ConfigError::KnobOutOfRange {
                    name: "npar_grp",
                    value: self.npar_grp as f64,
                    lo: 2.0,
                    hi: self.nsol as f64,
                }
                .into());
            }
            if self.nsol % self.npar_grp != 0 {
                return Err(ConfigError::GroupMismatch {
                    nsol: self.nsol,
                    npar_grp: self.npar_grp,
                }
                .into());
            }
        }
        if self.dt_mig == 0 {
            return Err(ConfigError::ZeroInterval { name: "dt_mig" }.into());
        }
        if self.dt_out == 0 {
            return Err(ConfigError::ZeroInterval { name: "dt_out" }.into());
        }
        if self.latin_dup == 0 {
            self.latin_dup = 1;
        }

        self.del_flt = self
            .flt_min
            .iter()
            .zip(self.flt_max.iter())
            .map(|(lo, hi)| hi - lo)
            .collect();
        self.del_int = self
            .int_min
            .iter()
            .zip(self.int_max.iter())
            .map(|(lo, hi)| hi - lo)
            .collect();
        Ok(())
    }

    /// Clamp a float gene value into its configured range
    pub fn enforce_range(&self, i: usize, x: f64) -> f64 {
        x.clamp(self.flt_min[i], self.flt_max[i])
    }
}
