//! Min-max normalisation of density and distances into one weighted suitability score.

use anyhow::Result;
use log::{debug, info};

use crate::{geom::GeometryCollection, reference::Category};

/// Guards min-max normalisation against a zero range.
pub const EPSILON: f64 = 1e-9;

pub const DENSITY_WEIGHT: f64 = 0.4;
pub const HEALTH_WEIGHT: f64 = 0.2;
pub const POLICE_WEIGHT: f64 = 0.2;
pub const ROADS_WEIGHT: f64 = 0.2;

pub const DENSITY_SCORE: &str = "dens_score";
pub const SCORE: &str = "score";

/// Weight of a category's proximity score in the composite.
#[inline]
pub fn weight(category: Category) -> f64 {
    match category {
        Category::Health => HEALTH_WEIGHT,
        Category::Police => POLICE_WEIGHT,
        Category::Roads => ROADS_WEIGHT,
    }
}

/// Minimum and maximum of the defined, finite values; `None` if there are none.
pub fn min_max(values: &[Option<f64>]) -> Option<(f64, f64)> {
    values.iter()
        .flatten()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// `(v - min) / (max - min + EPSILON)`, with every term halved so that a range wider
/// than `f64::MAX` still divides to a finite value.
fn scaled(v: f64, lo: f64, hi: f64) -> f64 {
    ((v / 2.0 - lo / 2.0) / (hi / 2.0 - lo / 2.0 + EPSILON / 2.0)).clamp(0.0, 1.0)
}

/// `(v - min) / (max - min + EPSILON)` over the batch; undefined cells score 0.
pub fn normalize(values: &[Option<f64>]) -> Vec<f64> {
    let Some((lo, hi)) = min_max(values) else { return vec![0.0; values.len()] };
    values.iter()
        .map(|v| match v {
            Some(v) if v.is_finite() => scaled(*v, lo, hi),
            _ => 0.0,
        })
        .collect()
}

/// Like [`normalize`] but reversed, so the smallest value scores highest.
/// Undefined cells still score 0.
pub fn inverted(values: &[Option<f64>]) -> Vec<f64> {
    let Some((lo, hi)) = min_max(values) else { return vec![0.0; values.len()] };
    values.iter()
        .map(|v| match v {
            Some(v) if v.is_finite() => 1.0 - scaled(*v, lo, hi),
            _ => 0.0,
        })
        .collect()
}

/// Positions sorted by descending score. Equal scores keep their input order.
pub fn rank_order(scores: &[f64]) -> Vec<usize> {
    let mut order = (0..scores.len()).collect::<Vec<_>>();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    order
}

/// Add density, per-category and composite score columns, then return the collection
/// reordered best first.
///
/// A missing density column counts as density 1 for every geometry; non-numeric or
/// missing density values count as 0. The density actually used is written back to
/// `density_field`. A missing `dist_<category>` column scores 0 for that category.
pub fn score(mut collection: GeometryCollection, density_field: &str) -> Result<GeometryCollection> {
    let density = match collection.f64_column(density_field)? {
        Some(values) => values.into_iter()
            .map(|v| Some(v.filter(|v| v.is_finite()).unwrap_or(0.0)))
            .collect::<Vec<_>>(),
        None => {
            info!("No {density_field} column; every geometry gets density 1");
            vec![Some(1.0); collection.len()]
        }
    };
    let density_score = normalize(&density);
    collection.set_f64_column(density_field, density)?;

    let mut composite = density_score.iter().map(|s| DENSITY_WEIGHT * s).collect::<Vec<_>>();
    collection.set_f64_column(DENSITY_SCORE, density_score.into_iter().map(Some).collect())?;

    for category in Category::ALL {
        let scores = match collection.f64_column(&category.distance_column())? {
            Some(distances) => inverted(&distances),
            None => {
                debug!("No {} column; {} is 0", category.distance_column(), category.score_column());
                vec![0.0; collection.len()]
            }
        };
        for (total, s) in composite.iter_mut().zip(&scores) {
            *total += weight(category) * s;
        }
        collection.set_f64_column(&category.score_column(), scores.into_iter().map(Some).collect())?;
    }

    let order = rank_order(&composite);
    collection.set_f64_column(SCORE, composite.into_iter().map(Some).collect())?;

    collection.take(&order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::FEATURE_ID;
    use geo::{point, Geometry};
    use polars::{df, prelude::DataFrame};

    fn collection(attributes: DataFrame) -> GeometryCollection {
        let geometries = (0..attributes.height())
            .map(|i| Geometry::Point(point!(x: i as f64, y: 0.0)))
            .collect();
        GeometryCollection::new(geometries, attributes, None).unwrap()
    }

    fn column(collection: &GeometryCollection, name: &str) -> Vec<f64> {
        collection.f64_column(name).unwrap().unwrap().into_iter().map(|v| v.unwrap()).collect()
    }

    #[test]
    fn weights_sum_to_one() {
        let total = DENSITY_WEIGHT + Category::ALL.iter().map(|c| weight(*c)).sum::<f64>();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn constant_columns_normalise_to_zero() {
        assert_eq!(normalize(&[Some(3.0), Some(3.0)]), vec![0.0, 0.0]);
        assert_eq!(inverted(&[Some(3.0), Some(3.0)]), vec![1.0, 1.0]);
        assert_eq!(normalize(&[None, None]), vec![0.0, 0.0]);
        assert_eq!(inverted(&[]), Vec::<f64>::new());
    }

    #[test]
    fn undefined_cells_do_not_move_the_range() {
        let scores = inverted(&[Some(100.0), None, Some(300.0)]);
        assert!((scores[0] - 1.0).abs() < 1e-9);
        assert_eq!(scores[1], 0.0);
        assert!(scores[2].abs() < 1e-9);
    }

    #[test]
    fn extreme_ranges_stay_finite() {
        let up = normalize(&[Some(1e308), Some(-1e308), Some(0.0)]);
        let down = inverted(&[Some(1e308), Some(-1e308), Some(0.0)]);
        for s in up.iter().chain(&down) {
            assert!(s.is_finite() && (0.0..=1.0).contains(s), "{up:?} {down:?}");
        }
        assert!((up[0] - 1.0).abs() < 1e-9);
        assert_eq!(up[1], 0.0);
        assert!((up[2] - 0.5).abs() < 1e-9);
        assert!((down[1] - 1.0).abs() < 1e-9);

        let scored = score(collection(df!("dens_sqkm" => [-1e308, 1e308]).unwrap()), "dens_sqkm").unwrap();
        assert!(column(&scored, SCORE).iter().all(|s| s.is_finite()));
        assert_eq!(column(&scored, FEATURE_ID), vec![1.0, 0.0]);
    }

    #[test]
    fn ties_keep_input_order() {
        assert_eq!(rank_order(&[0.5, 0.9, 0.5, 0.9, 0.1]), vec![1, 3, 0, 2, 4]);

        // Identical rows: nothing distinguishes them, so the input order survives.
        let scored = score(collection(df!(
            "dens_sqkm" => [2.0, 2.0, 2.0],
            "dist_health" => [5.0, 5.0, 5.0]
        ).unwrap()), "dens_sqkm").unwrap();
        assert_eq!(column(&scored, FEATURE_ID), vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn dominant_geometry_ranks_first() {
        let scored = score(collection(df!(
            "dens_sqkm" => [1.0, 9.0, 4.0],
            "dist_health" => [50.0, 10.0, 20.0],
            "dist_police" => [500.0, 100.0, 300.0],
            "dist_roads" => [7.0, 1.0, 3.0]
        ).unwrap()), "dens_sqkm").unwrap();

        assert_eq!(column(&scored, FEATURE_ID), vec![1.0, 2.0, 0.0]);
        let total = column(&scored, SCORE);
        assert!((total[0] - 1.0).abs() < 1e-6);
        assert!(total.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn scores_stay_in_unit_interval() {
        let scored = score(collection(df!(
            "dens_sqkm" => ["12.5", "n/a", "3", "40"],
            "dist_health" => [Some(1.0), None, Some(1e6), Some(42.0)],
            "dist_roads" => [0.0, 0.0, 0.0, 0.0]
        ).unwrap()), "dens_sqkm").unwrap();

        assert_eq!(scored.len(), 4);
        for name in [DENSITY_SCORE, "health_score", "police_score", "roads_score", SCORE] {
            assert!(column(&scored, name).iter().all(|s| (0.0..=1.0).contains(s)), "{name}");
        }
        // Never computed
        assert!(column(&scored, "police_score").iter().all(|s| *s == 0.0));
        // Non-numeric density is coerced to 0 and written back.
        let fid = column(&scored, FEATURE_ID);
        let density = column(&scored, "dens_sqkm");
        let missing = fid.iter().position(|f| *f == 1.0).unwrap();
        assert_eq!(density[missing], 0.0);
    }

    #[test]
    fn missing_density_is_a_constant_one() {
        let scored = score(collection(df!("dist_health" => [30.0, 10.0, 20.0]).unwrap()), "dens_sqkm").unwrap();
        assert!(column(&scored, "dens_sqkm").iter().all(|d| *d == 1.0));
        assert!(column(&scored, DENSITY_SCORE).iter().all(|d| *d == 0.0));
        assert_eq!(column(&scored, FEATURE_ID), vec![1.0, 2.0, 0.0]);
    }
}
