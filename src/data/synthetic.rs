use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::model::{Table, CMC_COLUMNS};
use crate::error::Result;

/// Generate a CMC-shaped table with `n_rows` rows.
///
/// Attribute ranges match the survey codebook (ages 16-49, education and
/// occupation codes 1-4, binary flags 0/1, class 1-3). The class depends on
/// age, education, number of children and media exposure, plus noise, so
/// the classifiers have something to learn. Same seed, same table.
pub fn generate_cmc_like(n_rows: usize, seed: u64) -> Result<Table> {
    let mut rng = StdRng::seed_from_u64(seed);
    let rows: Vec<Vec<f64>> = (0..n_rows).map(|_| sample_row(&mut rng)).collect();
    Table::from_rows(&CMC_COLUMNS, &rows)
}

fn sample_row(rng: &mut StdRng) -> Vec<f64> {
    let wife_age: i32 = rng.gen_range(16..=49);
    let wife_edu: i32 = rng.gen_range(1..=4);
    let husband_edu: i32 = (wife_edu + rng.gen_range(-1..=1)).clamp(1, 4);

    // Older, less educated wives tend to have more children.
    let expected = (wife_age - 15) as f64 / 6.0 + (4 - wife_edu) as f64 * 0.6;
    let n_children = (expected + rng.gen_range(-2.0..2.0)).round().clamp(0.0, 16.0) as i32;

    let wife_religion = i32::from(rng.gen_bool(0.85));
    let wife_working = i32::from(rng.gen_bool(0.75));
    let husband_occup: i32 = rng.gen_range(1..=4);
    let sol_index: i32 = (wife_edu + rng.gen_range(-1..=1)).clamp(1, 4);
    let media_exposure = i32::from(rng.gen_bool(if wife_edu >= 3 { 0.02 } else { 0.15 }));

    // 1 = no use, 2 = long-term, 3 = short-term
    let class = if n_children == 0 || media_exposure == 1 {
        1
    } else if rng.gen_bool(0.25) {
        rng.gen_range(1..=3)
    } else if wife_edu >= 3 && wife_age >= 30 {
        2
    } else if wife_age < 30 {
        3
    } else {
        1
    };

    [
        wife_age,
        wife_edu,
        husband_edu,
        n_children,
        wife_religion,
        wife_working,
        husband_occup,
        sol_index,
        media_exposure,
        class,
    ]
    .iter()
    .map(|&v| v as f64)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_stay_in_codebook_ranges() {
        let table = generate_cmc_like(500, 3).unwrap();
        assert_eq!(table.n_rows(), 500);
        let check = |name: &str, lo: f64, hi: f64| {
            for &v in table.column(name).unwrap().iter() {
                assert!(v >= lo && v <= hi, "{name}={v} outside [{lo}, {hi}]");
            }
        };
        check("wife_age", 16.0, 49.0);
        check("wife_edu", 1.0, 4.0);
        check("n_children", 0.0, 16.0);
        check("media_exposure", 0.0, 1.0);
        check("class", 1.0, 3.0);
    }

    #[test]
    fn same_seed_same_table() {
        assert_eq!(generate_cmc_like(50, 9).unwrap(), generate_cmc_like(50, 9).unwrap());
        assert_ne!(generate_cmc_like(50, 9).unwrap(), generate_cmc_like(50, 10).unwrap());
    }
}
