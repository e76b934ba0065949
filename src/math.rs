use num::Float;

/// Similar to numpy.interp
///
/// `coords` must be sorted by x. Inputs left of the first coordinate take its
/// y value, inputs right of the last take the last y value.
pub(crate) fn interp<F: Float>(x_input: &[F], coords: impl IntoIterator<Item = (F, F)>) -> Vec<F> {
    let coords: Vec<(F, F)> = coords.into_iter().collect();

    x_input
        .iter()
        .map(|&x| {
            let (Some(&(x_first, y_first)), Some(&(x_last, y_last))) = (coords.first(), coords.last()) else {
                return F::nan();
            };

            if x <= x_first {
                return y_first;
            }
            if x >= x_last {
                return y_last;
            }

            // First segment whose right edge reaches x
            let i = coords.partition_point(|&(xp, _)| xp < x);
            let (x1, y1) = coords[i - 1];
            let (x2, y2) = coords[i];

            if x2 == x1 {
                y2
            } else {
                y1 + (x - x1) * (y2 - y1) / (x2 - x1)
            }
        })
        .collect()
}

/// Splits the area under a sampled membership function into one trapezoid
/// per pair of neighbouring samples, yielding `(area, centroid_x)`.
///
/// Each trapezoid is a rectangle under the lower sample plus a triangle up to
/// the higher one.
pub(crate) fn trapezoids<'a, F: Float>(
    universe: &'a [F],
    membership: &'a [F],
) -> impl Iterator<Item = (F, F)> + 'a {
    let two = F::one() + F::one();
    let three = two + F::one();

    universe
        .windows(2)
        .zip(membership.windows(2))
        .map(move |(u, m)| {
            let base = u[1] - u[0];
            let area_rect = F::min(m[0], m[1]) * base;
            let center_rect = u[0] + base / two;
            let area_tri = base * F::abs(m[1] - m[0]) / two;
            let center_tri = if m[1] > m[0] {
                u[0] + two / three * base
            } else {
                u[0] + base / three
            };
            let area = area_rect + area_tri;
            let center = if area == F::zero() {
                F::zero()
            } else {
                (area_rect * center_rect + area_tri * center_tri) / area
            };

            (area, center)
        })
}

#[test]
fn test_interp() {
    let x = [0., 1., 1.5, 2.72, 3.24];
    let xs = [1., 2., 3.];
    let ys = [3., 2., 0.];

    assert_eq!(
        interp(&x, xs.into_iter().zip(ys)),
        vec![3., 3., 2.5, 0.5599999999999996, 0.]
    );

    let x = [2.5, -1., 7.5];
    let xs = [0., 1., 2., 3., 4.5];
    let ys = [0., 2., 5., 3., 2.];

    assert_eq!(interp(&x, xs.into_iter().zip(ys)), vec![4., 0., 2.]);
}

#[test]
fn test_trapezoid_areas() {
    let universe = [0., 1., 2.];
    let membership = [0., 1., 1.];
    let pieces: Vec<(f64, f64)> = trapezoids(&universe, &membership).collect();

    assert_eq!(pieces[0].0, 0.5);
    assert!((pieces[0].1 - 2. / 3.).abs() < 1e-12);
    assert_eq!(pieces[1], (1., 1.5));
}
