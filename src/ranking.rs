//! Ranking and distance engine
//!
//! Fast non-dominated sorting into fronts, crowding distances, and
//! nearest-neighbour phenotype distances. All O(N^2) passes over one
//! island's solutions (or the final union).

use crate::error::{EvoResult, InternalError};
use crate::solution::{compare, Solution, EPS_DEN};

/// Fast non-dominated sort
///
/// Assigns `front_id`, `wins`, `n_wins` and `n_losses` to every solution and
/// returns the fronts as index lists; `fronts[0]` is the Pareto-best front.
pub fn non_dominated_sort(sols: &mut [Solution]) -> EvoResult<Vec<Vec<usize>>> {
    let n = sols.len();
    if n == 0 {
        return Ok(vec![]);
    }

    // dominated[i] = solutions beaten by i; n_dominators[i] = count beating i
    let mut dominated: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut n_dominators = vec![0usize; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let (i_dom, j_dom) = compare(&sols[i], &sols[j]);
            if i_dom {
                dominated[i].push(j);
                n_dominators[j] += 1;
            } else if j_dom {
                dominated[j].push(i);
                n_dominators[i] += 1;
            }
        }
    }

    let losses = n_dominators.clone();
    let mut fronts: Vec<Vec<usize>> = Vec::new();
    let mut current: Vec<usize> = (0..n).filter(|&i| n_dominators[i] == 0).collect();
    let mut rank = 0;
    let mut assigned = 0;
    while !current.is_empty() {
        for &i in &current {
            sols[i].front_id = rank;
        }
        assigned += current.len();
        let mut next = Vec::new();
        for &i in &current {
            for &j in &dominated[i] {
                n_dominators[j] -= 1;
                if n_dominators[j] == 0 {
                    next.push(j);
                }
            }
        }
        fronts.push(current);
        current = next;
        rank += 1;
    }

    if assigned != n {
        return Err(InternalError::IncompleteFronts { assigned, total: n }.into());
    }

    for (i, dom) in dominated.into_iter().enumerate() {
        sols[i].n_wins = dom.len();
        sols[i].n_losses = losses[i];
        sols[i].wins = dom;
    }
    Ok(fronts)
}

/// Crowding distance for one front
///
/// Boundary members of the front get +inf; interior members accumulate the
/// normalised gap between their neighbours, summed across objectives.
pub fn crowding_distance(sols: &mut [Solution], front: &[usize]) {
    let n = front.len();
    if n == 0 {
        return;
    }
    if n <= 2 {
        for &i in front {
            sols[i].dist_crowd = f64::INFINITY;
        }
        return;
    }

    for &i in front {
        sols[i].dist_crowd = 0.0;
    }
    let nova = sols[front[0]].ova.len();
    for obj in 0..nova {
        let mut order: Vec<usize> = front.to_vec();
        order.sort_by(|&a, &b| {
            sols[a].ova[obj]
                .partial_cmp(&sols[b].ova[obj])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        sols[order[0]].dist_crowd = f64::INFINITY;
        sols[order[n - 1]].dist_crowd = f64::INFINITY;

        let lo = sols[order[0]].ova[obj];
        let hi = sols[order[n - 1]].ova[obj];
        let den = hi - lo + EPS_DEN;
        for k in 1..(n - 1) {
            let prev = sols[order[k - 1]].ova[obj];
            let next = sols[order[k + 1]].ova[obj];
            let idx = order[k];
            if sols[idx].dist_crowd.is_finite() {
                sols[idx].dist_crowd += (next - prev) / den;
            }
        }
    }
}

/// Objective-space extents over a set of solutions
pub fn ova_extents(sols: &[Solution]) -> (Vec<f64>, Vec<f64>) {
    let nova = sols.first().map_or(0, |s| s.ova.len());
    let mut omin = vec![f64::INFINITY; nova];
    let mut omax = vec![f64::NEG_INFINITY; nova];
    for s in sols {
        for j in 0..nova {
            omin[j] = omin[j].min(s.ova[j]);
            omax[j] = omax[j].max(s.ova[j]);
        }
    }
    (omin, omax)
}

/// Nearest-neighbour phenotype distances
///
/// For every solution, the minimum normalised objective-space distance to
/// any other member of the set, plus the index of that nearest member.
pub fn neighbour_distance(sols: &mut [Solution], absolute: bool) {
    let n = sols.len();
    for s in sols.iter_mut() {
        s.dist_neigh = f64::INFINITY;
        s.closest = None;
    }
    if n < 2 {
        return;
    }
    let (omin, omax) = ova_extents(sols);
    for i in 0..n {
        for j in (i + 1)..n {
            let d = sols[i].ova_distance(&sols[j], &omin, &omax, absolute);
            if d < sols[i].dist_neigh {
                sols[i].dist_neigh = d;
                sols[i].closest = Some(j);
            }
            if d < sols[j].dist_neigh {
                sols[j].dist_neigh = d;
                sols[j].closest = Some(i);
            }
        }
    }
}

/// The full ranking pass: non-dominated sort, crowding per front, and
/// neighbour distances. Returns the number of fronts.
pub fn rank(sols: &mut [Solution], absolute: bool) -> EvoResult<usize> {
    let fronts = non_dominated_sort(sols)?;
    for front in &fronts {
        crowding_distance(sols, front);
    }
    neighbour_distance(sols, absolute);
    Ok(fronts.len())
}
