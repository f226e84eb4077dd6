use rand::Rng;

/// Source of uniform indices for minimal-sample selection.
///
/// Anything implementing [`rand::Rng`] qualifies; tests can plug in a
/// scripted sequence to make sample choice fully reproducible.
pub trait RandomSource {
    /// Uniform draw from `0..upper`; `upper` is always at least 1
    fn draw(&mut self, upper: usize) -> usize;
}

impl<R: Rng> RandomSource for R {
    fn draw(&mut self, upper: usize) -> usize {
        self.random_range(0..upper)
    }
}

/// Pick `K` distinct positions out of `0..n` with a partial Fisher–Yates
/// shuffle. `pool` is scratch space of length `n`; it is reset on every call.
///
/// Out-of-range draws are clamped so a misbehaving source cannot panic.
pub fn draw_sample<S: RandomSource + ?Sized, const K: usize>(
    pool: &mut [usize],
    rng: &mut S,
) -> Option<[usize; K]> {
    let n = pool.len();
    if n < K {
        return None;
    }
    for (i, slot) in pool.iter_mut().enumerate() {
        *slot = i;
    }
    let mut out = [0usize; K];
    for (i, o) in out.iter_mut().enumerate() {
        let span = n - i;
        let j = i + rng.draw(span).min(span - 1);
        pool.swap(i, j);
        *o = pool[i];
    }
    Some(out)
}
