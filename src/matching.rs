//! Minimum-cost bipartite matching (Munkres / Hungarian algorithm)
//!
//! Used by matched deterministic crowding to pair parents with their
//! phenotypically closest offspring. Rows must not outnumber columns; the
//! matrix is padded to square internally.

use crate::error::{EvoResult, InternalError};

/// Munkres assignment solver
///
/// Reusable across generations: the workspace is sized once and refilled by
/// each [`Munkres::solve`] call.
#[derive(Clone, Debug)]
pub struct Munkres {
    nrow: usize,
    ncol: usize,
    n: usize,
    cost: Vec<Vec<f64>>,
    starred: Vec<Vec<bool>>,
    primed: Vec<Vec<bool>>,
    row_covered: Vec<bool>,
    col_covered: Vec<bool>,
    /// Assigned column for each row after a solve
    pub links: Vec<usize>,
}

impl Munkres {
    /// Allocate a solver for nrow x ncol cost matrices, nrow <= ncol
    pub fn new(nrow: usize, ncol: usize) -> Self {
        assert!(nrow <= ncol, "rows must not outnumber columns");
        let n = ncol;
        Self {
            nrow,
            ncol,
            n,
            cost: vec![vec![0.0; n]; n],
            starred: vec![vec![false; n]; n],
            primed: vec![vec![false; n]; n],
            row_covered: vec![false; n],
            col_covered: vec![false; n],
            links: vec![0; nrow],
        }
    }

    /// Solve the assignment for the given cost matrix
    ///
    /// `cost` must be nrow x ncol. On success `links[row]` holds the column
    /// matched to `row` and the total cost is minimal.
    pub fn solve(&mut self, cost: &[Vec<f64>]) -> EvoResult<()> {
        self.load(cost);
        self.reduce_rows();
        self.star_zeros();
        loop {
            self.cover_starred_columns();
            if self.col_covered.iter().filter(|&&c| c).count() == self.n {
                break;
            }
            let (r, c) = self.find_augmenting_prime()?;
            self.augment(r, c)?;
        }
        for r in 0..self.nrow {
            let col = (0..self.n).find(|&c| self.starred[r][c]).ok_or_else(|| {
                InternalError::MatchingFailed(format!("row {} left unassigned", r))
            })?;
            self.links[r] = col;
        }
        Ok(())
    }

    fn load(&mut self, cost: &[Vec<f64>]) {
        for r in 0..self.n {
            for c in 0..self.n {
                self.cost[r][c] = if r < self.nrow && c < self.ncol {
                    cost[r][c]
                } else {
                    0.0
                };
                self.starred[r][c] = false;
                self.primed[r][c] = false;
            }
        }
        self.row_covered.iter_mut().for_each(|v| *v = false);
        self.col_covered.iter_mut().for_each(|v| *v = false);
    }

    fn reduce_rows(&mut self) {
        for row in self.cost.iter_mut() {
            let min = row.iter().cloned().fold(f64::INFINITY, f64::min);
            for v in row.iter_mut() {
                *v -= min;
            }
        }
    }

    fn star_zeros(&mut self) {
        let mut row_used = vec![false; self.n];
        let mut col_used = vec![false; self.n];
        for r in 0..self.n {
            for c in 0..self.n {
                if self.cost[r][c] == 0.0 && !row_used[r] && !col_used[c] {
                    self.starred[r][c] = true;
                    row_used[r] = true;
                    col_used[c] = true;
                }
            }
        }
    }

    fn cover_starred_columns(&mut self) {
        for c in 0..self.n {
            self.col_covered[c] = (0..self.n).any(|r| self.starred[r][c]);
        }
        self.row_covered.iter_mut().for_each(|v| *v = false);
        for row in self.primed.iter_mut() {
            row.iter_mut().for_each(|v| *v = false);
        }
    }

    /// Prime uncovered zeros until one lies in a row with no star
    ///
    /// Returns that zero's position; adjusts the matrix when no uncovered
    /// zero remains.
    fn find_augmenting_prime(&mut self) -> EvoResult<(usize, usize)> {
        loop {
            match self.find_uncovered_zero() {
                Some((r, c)) => {
                    self.primed[r][c] = true;
                    match (0..self.n).find(|&cc| self.starred[r][cc]) {
                        Some(star_col) => {
                            self.row_covered[r] = true;
                            self.col_covered[star_col] = false;
                        }
                        None => return Ok((r, c)),
                    }
                }
                None => self.adjust_by_min_uncovered()?,
            }
        }
    }

    fn find_uncovered_zero(&self) -> Option<(usize, usize)> {
        for r in 0..self.n {
            if self.row_covered[r] {
                continue;
            }
            for c in 0..self.n {
                if !self.col_covered[c] && self.cost[r][c] == 0.0 {
                    return Some((r, c));
                }
            }
        }
        None
    }

    fn adjust_by_min_uncovered(&mut self) -> EvoResult<()> {
        let mut min = f64::INFINITY;
        for r in 0..self.n {
            if self.row_covered[r] {
                continue;
            }
            for c in 0..self.n {
                if !self.col_covered[c] {
                    min = min.min(self.cost[r][c]);
                }
            }
        }
        if !min.is_finite() {
            return Err(
                InternalError::MatchingFailed("no finite uncovered cost".to_string()).into(),
            );
        }
        for r in 0..self.n {
            for c in 0..self.n {
                if self.row_covered[r] {
                    self.cost[r][c] += min;
                }
                if !self.col_covered[c] {
                    self.cost[r][c] -= min;
                }
            }
        }
        Ok(())
    }

    /// Flip the alternating star/prime path starting at an unstarred prime
    fn augment(&mut self, r0: usize, c0: usize) -> EvoResult<()> {
        let mut path = vec![(r0, c0)];
        loop {
            let (_, c) = *path.last().unwrap_or(&(r0, c0));
            let star_row = (0..self.n).find(|&r| self.starred[r][c]);
            match star_row {
                Some(r) => {
                    path.push((r, c));
                    let prime_col = (0..self.n).find(|&cc| self.primed[r][cc]).ok_or_else(|| {
                        InternalError::MatchingFailed(format!("no prime in row {}", r))
                    })?;
                    path.push((r, prime_col));
                }
                None => break,
            }
        }
        for (i, &(r, c)) in path.iter().enumerate() {
            // even entries are primes to star, odd entries stars to clear
            self.starred[r][c] = i % 2 == 0;
        }
        Ok(())
    }
}
