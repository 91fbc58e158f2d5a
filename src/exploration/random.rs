use rand::{seq::SliceRandom, Rng};

/// Pick one of `actions` uniformly at random, or `None` if there are none
pub fn uniform<A: Copy, R: Rng + ?Sized>(actions: &[A], rng: &mut R) -> Option<A> {
    actions.choose(rng).copied()
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    #[test]
    fn uniform_choice() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(uniform::<u8, _>(&[], &mut rng), None);
        assert_eq!(uniform(&[3], &mut rng), Some(3));

        let mut seen = [false; 3];
        for _ in 0..100 {
            let x = uniform(&[0, 1, 2], &mut rng).unwrap();
            seen[x] = true;
        }
        assert_eq!(seen, [true; 3], "Every option is eventually picked");
    }
}
