use num::Float;

/// `n` evenly spaced samples over `[min, max]`, like `numpy.linspace`.
///
/// The final sample is `max` exactly rather than `min + step * (n - 1)`, so
/// universes built from it always end on their declared bound.
#[derive(Clone, Debug)]
pub struct Linspace<F> {
    start: F,
    end: F,
    step: F,
    index: usize,
    len: usize,
}

impl<F: Float> Linspace<F> {
    pub fn new(min: F, max: F, n: usize) -> Self {
        let step = match n {
            0 | 1 => F::zero(),
            _ => (max - min) / F::from(n - 1).unwrap_or_else(F::one),
        };

        Linspace {
            start: min,
            end: max,
            step,
            index: 0,
            len: n,
        }
    }
}

impl<F: Float> Iterator for Linspace<F> {
    type Item = F;

    #[inline]
    fn next(&mut self) -> Option<F> {
        if self.index >= self.len {
            return None;
        }

        let i = self.index;
        self.index += 1;

        if i > 0 && i + 1 == self.len {
            return Some(self.end);
        }

        Some(self.start + self.step * F::from(i).unwrap_or_else(F::zero))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.len - self.index;
        (n, Some(n))
    }
}

impl<F: Float> ExactSizeIterator for Linspace<F> {}

#[test]
fn test_linspace_endpoints() {
    let points: Vec<f64> = Linspace::new(0., 1., 11).collect();

    assert_eq!(points.len(), 11);
    assert_eq!(points[0], 0.);
    assert_eq!(points[10], 1.);
    assert!((points[3] - 0.3).abs() < 1e-12);
}

#[test]
fn test_linspace_degenerate_lengths() {
    assert_eq!(Linspace::new(2.0f64, 5., 0).count(), 0);
    assert_eq!(Linspace::new(2.0f64, 5., 1).collect::<Vec<_>>(), vec![2.]);
    assert_eq!(Linspace::new(2.0f32, 5., 2).collect::<Vec<_>>(), vec![2., 5.]);
}
