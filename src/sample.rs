//! Synthetic customer data for trying the pipeline without a real export

use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::Rng;

const REGIONS: [&str; 4] = ["North", "South", "East", "West"];

/// Behavioural archetype: centre and spread of each generated attribute
struct Archetype {
    age: (f64, f64),
    income: (f64, f64),
    spending_score: (f64, f64),
    purchase_frequency: (f64, f64),
}

const ARCHETYPES: [Archetype; 4] = [
    // young, modest income, spends a lot
    Archetype {
        age: (24.0, 4.0),
        income: (32_000.0, 6_000.0),
        spending_score: (78.0, 8.0),
        purchase_frequency: (22.0, 4.0),
    },
    // established, affluent, careful
    Archetype {
        age: (48.0, 6.0),
        income: (110_000.0, 15_000.0),
        spending_score: (25.0, 8.0),
        purchase_frequency: (6.0, 2.0),
    },
    // affluent and loyal
    Archetype {
        age: (36.0, 5.0),
        income: (95_000.0, 12_000.0),
        spending_score: (82.0, 7.0),
        purchase_frequency: (30.0, 5.0),
    },
    // occasional bargain hunters
    Archetype {
        age: (58.0, 7.0),
        income: (45_000.0, 8_000.0),
        spending_score: (40.0, 10.0),
        purchase_frequency: (3.0, 1.5),
    },
];

fn jitter<R: Rng + ?Sized>(rng: &mut R, (centre, spread): (f64, f64)) -> f64 {
    (centre + rng.gen_range(-spread..=spread)).max(0.0)
}

/// Generate `n_customers` synthetic customers drawn from four archetypes.
///
/// Columns: `CustomerID` (text, e.g. `C10000`), `Region` (text), `Age`, `AnnualIncome`,
/// `SpendingScore`, `PurchaseFrequency`.
pub fn generate_customers<R: Rng + ?Sized>(n_customers: usize, rng: &mut R) -> crate::Result<DataFrame> {
    let mut ids = Vec::with_capacity(n_customers);
    let mut regions = Vec::with_capacity(n_customers);
    let mut ages = Vec::with_capacity(n_customers);
    let mut incomes = Vec::with_capacity(n_customers);
    let mut scores = Vec::with_capacity(n_customers);
    let mut frequencies = Vec::with_capacity(n_customers);

    for i in 0..n_customers {
        let archetype = &ARCHETYPES[rng.gen_range(0..ARCHETYPES.len())];
        ids.push(format!("C{}", 10_000 + i));
        regions.push(*REGIONS.choose(rng).unwrap_or(&REGIONS[0]));
        ages.push(jitter(rng, archetype.age).round());
        incomes.push(jitter(rng, archetype.income).round());
        scores.push(jitter(rng, archetype.spending_score).clamp(1.0, 100.0).round());
        frequencies.push(jitter(rng, archetype.purchase_frequency).round());
    }

    let df = DataFrame::new(vec![
        Series::new("CustomerID", ids),
        Series::new("Region", regions),
        Series::new("Age", ages),
        Series::new("AnnualIncome", incomes),
        Series::new("SpendingScore", scores),
        Series::new("PurchaseFrequency", frequencies),
    ])?;
    Ok(df)
}

/// Generate a sample dataset and write it as CSV
pub fn write_sample_csv<R: Rng + ?Sized>(path: &str, n_customers: usize, rng: &mut R) -> crate::Result<()> {
    let mut df = generate_customers(n_customers, rng)?;
    let mut file = std::fs::File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(&mut df)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::load_feature_table;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::NamedTempFile;

    #[test]
    fn test_generate_customers_shape() {
        let mut rng = StdRng::seed_from_u64(42);
        let df = generate_customers(50, &mut rng).unwrap();

        assert_eq!(df.height(), 50);
        assert_eq!(df.width(), 6);
    }

    #[test]
    fn test_sample_round_trip_selects_numeric_columns() {
        let mut rng = StdRng::seed_from_u64(42);
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_str().unwrap();

        write_sample_csv(path, 30, &mut rng).unwrap();
        let table = load_feature_table(path, None).unwrap();

        assert_eq!(table.n_rows(), 30);
        assert!(table.column_index("Region").is_none());
        assert!(table.column_index("CustomerID").is_none());
        assert_eq!(table.names, vec!["Age", "AnnualIncome", "SpendingScore", "PurchaseFrequency"]);
        assert!(table.column("SpendingScore").unwrap().iter().all(|&s| (1.0..=100.0).contains(&s)));
    }
}
