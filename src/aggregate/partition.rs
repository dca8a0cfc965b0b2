//! Work partitioning: sizing dispatch groups to evenly divide a problem.

/// Pick the largest work-group size that both evenly divides `problem_size`
/// and fits under `device_limit`.
///
/// Walks the prime factors of `problem_size` in increasing order and tracks
/// the largest cofactor seen that is within the limit (each time a prime is
/// divided out, the remaining cofactor is a candidate). Returns 1 when no
/// divisor above 1 fits -- still legal, just a single-element group shape.
///
/// Precondition: `problem_size >= 1`. Pure, no failure modes.
pub fn choose_partition(problem_size: usize, device_limit: usize) -> usize {
    debug_assert!(problem_size >= 1);

    let mut best = 1;
    let mut n = problem_size;
    let mut d: usize = 2;
    while n > 1 {
        if d.saturating_mul(d) > n {
            // What remains is prime; it is the last candidate.
            if n <= device_limit && n > best {
                best = n;
            }
            break;
        }
        while n % d == 0 {
            if n <= device_limit && n > best {
                best = n;
            }
            n /= d;
        }
        d += 1;
    }
    best
}
