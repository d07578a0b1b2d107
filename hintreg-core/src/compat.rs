//! Hint compatibility and structural equality of candidates.

use crate::{
    candidate::{Candidate, address},
    hints::{HintKey, HintSet, HintValue},
};
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

/// Whether `candidate` is compatible with the caller's `hints`.
///
/// For every key of the candidate's implementation hints that `hints` also
/// specifies, the requested value must [match](HintValue::matches) the
/// candidate's value. A value that is itself a [`Service`](crate::Service) is a
/// dependency: it is checked the same way against the caller hints minus the
/// keys this level declares. Each dependency sees that same remaining set.
///
/// Dependency cycles terminate: a candidate already being checked on the
/// current path counts as compatible. A dependency shared by several keys or
/// parents is checked once per remaining hint set.
pub fn has_compatible_hints(candidate: &dyn Candidate, hints: &HintSet) -> bool {
    check(candidate, hints, &mut Walk::default())
}

#[derive(Default)]
struct Walk {
    path: HashSet<usize>,
    // (candidate, remaining keys) -> verdict
    known: HashMap<(usize, Vec<usize>), bool>,
    // Keeps checked dependencies alive so their addresses stay unique.
    pinned: Vec<Arc<dyn Candidate>>,
}

fn check(candidate: &dyn Candidate, hints: &HintSet, walk: &mut Walk) -> bool {
    if hints.is_empty() {
        return true;
    }
    let id = address(candidate);
    let mut keys: Vec<usize> = hints.keys().map(HintKey::addr).collect();
    keys.sort_unstable();
    let visit = (id, keys);
    if let Some(&verdict) = walk.known.get(&visit) {
        return verdict;
    }
    if !walk.path.insert(id) {
        return true;
    }
    let own = candidate.implementation_hints();
    let mut remaining: Option<HintSet> = None;
    let mut compatible = true;
    for (key, actual) in own.iter() {
        if let Some(requested) = hints.get(key) {
            if !requested.matches(actual) {
                tracing::trace!(
                    key = %key,
                    requested = %requested,
                    actual = %actual,
                    candidate = %candidate.implementation_type(),
                    "implementation hint mismatch"
                );
                compatible = false;
                break;
            }
        }
        if let HintValue::Service(dependency) = actual {
            let rest = remaining.get_or_insert_with(|| hints.without_keys(own.keys()));
            let dependency = dependency.candidate().clone();
            let verdict = check(dependency.as_ref(), rest, walk);
            walk.pinned.push(dependency);
            if !verdict {
                compatible = false;
                break;
            }
        }
    }
    walk.path.remove(&id);
    // A verdict resting on a cycle assumption is only wrong when some node on
    // the path fails, which fails the whole call anyway.
    walk.known.insert(visit, compatible);
    compatible
}

/// Structural equality: same implementation type and recursively equal
/// implementation hints.
///
/// Dependency values are compared the same way. A pair already under
/// comparison counts as equal, so cyclic dependency graphs terminate.
pub fn candidates_equal(a: &dyn Candidate, b: &dyn Candidate) -> bool {
    let mut visited = HashSet::new();
    let mut pinned = Vec::new();
    equal(a, b, &mut visited, &mut pinned)
}

fn equal(
    a: &dyn Candidate,
    b: &dyn Candidate,
    visited: &mut HashSet<(usize, usize)>,
    pinned: &mut Vec<Arc<dyn Candidate>>,
) -> bool {
    let pair = (address(a), address(b));
    if pair.0 == pair.1 {
        return true;
    }
    if a.implementation_type() != b.implementation_type() {
        return false;
    }
    if !visited.insert(pair) {
        return true;
    }
    let left = a.implementation_hints();
    let right = b.implementation_hints();
    if left.len() != right.len() {
        return false;
    }
    left.iter().all(|(key, value)| match (value, right.get(key)) {
        (HintValue::Service(x), Some(HintValue::Service(y))) => {
            let (x, y) = (x.candidate().clone(), y.candidate().clone());
            let same = equal(x.as_ref(), y.as_ref(), visited, pinned);
            pinned.extend([x, y]);
            same
        }
        (value, Some(other)) => value == other,
        (_, None) => false,
    })
}
