//! Synthetic prediction payloads
//!
//! The serving endpoint expects the MLflow `dataframe_split` shape: a fixed
//! list of column names plus one row of numbers. Each field is drawn
//! independently from the range the model was trained on.

use rand::Rng;
use serde::Serialize;

/// Column order of the healthcare tabular schema, as served by the model.
pub const COLUMNS: [&str; 14] = [
    "Age",
    "Billing Amount",
    "Room Number",
    "Gender_Encoded",
    "Blood Type_Encoded",
    "Medical Condition_Encoded",
    "Date of Admission_Encoded",
    "Doctor_Encoded",
    "Hospital_Encoded",
    "Insurance Provider_Encoded",
    "Admission Type_Encoded",
    "Discharge Date_Encoded",
    "Medication_Encoded",
    "Billing_Amount_Scaled",
];

/// Request body for the prediction endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionRequest {
    pub dataframe_split: DataframeSplit,
}

#[derive(Debug, Clone, Serialize)]
pub struct DataframeSplit {
    pub columns: Vec<&'static str>,
    pub data: Vec<Vec<f64>>,
}

/// Draw one random request. Takes the RNG as a parameter so tests can seed
/// it and check every field against its documented range.
pub fn synthesize(rng: &mut impl Rng) -> PredictionRequest {
    let row = vec![
        rng.gen_range(20..=80) as f64,          // Age
        rng.gen_range(100_000.0..1_000_000.0),  // Billing Amount
        rng.gen_range(100..=500) as f64,        // Room Number
        rng.gen_range(0..=1) as f64,            // Gender_Encoded
        rng.gen_range(0..=7) as f64,            // Blood Type_Encoded
        rng.gen_range(0..=5) as f64,            // Medical Condition_Encoded
        rng.gen_range(1..=365) as f64,          // Date of Admission_Encoded
        rng.gen_range(0..=50) as f64,           // Doctor_Encoded
        rng.gen_range(0..=10) as f64,           // Hospital_Encoded
        rng.gen_range(0..=5) as f64,            // Insurance Provider_Encoded
        rng.gen_range(0..=2) as f64,            // Admission Type_Encoded
        rng.gen_range(1..=365) as f64,          // Discharge Date_Encoded
        rng.gen_range(0..=20) as f64,           // Medication_Encoded
        rng.gen_range(0.0..1.0),                // Billing_Amount_Scaled
    ];

    PredictionRequest {
        dataframe_split: DataframeSplit {
            columns: COLUMNS.to_vec(),
            data: vec![row],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    /// Inclusive range for each column, in order.
    const RANGES: [(f64, f64); 14] = [
        (20.0, 80.0),
        (100_000.0, 1_000_000.0),
        (100.0, 500.0),
        (0.0, 1.0),
        (0.0, 7.0),
        (0.0, 5.0),
        (1.0, 365.0),
        (0.0, 50.0),
        (0.0, 10.0),
        (0.0, 5.0),
        (0.0, 2.0),
        (1.0, 365.0),
        (0.0, 20.0),
        (0.0, 1.0),
    ];

    #[test]
    fn test_every_field_within_its_range() {
        let mut rng = SmallRng::seed_from_u64(42);

        for _ in 0..200 {
            let request = synthesize(&mut rng);
            let row = &request.dataframe_split.data[0];
            assert_eq!(row.len(), 14);

            for (value, (lo, hi)) in row.iter().zip(RANGES.iter()) {
                assert!(
                    value >= lo && value <= hi,
                    "value {} outside range [{}, {}]",
                    value,
                    lo,
                    hi
                );
            }
        }
    }

    #[test]
    fn test_serialized_shape() {
        let mut rng = SmallRng::seed_from_u64(7);
        let request = synthesize(&mut rng);

        let json = serde_json::to_value(&request).unwrap();
        let split = &json["dataframe_split"];

        assert_eq!(split["columns"].as_array().unwrap().len(), 14);
        assert_eq!(split["columns"][0], "Age");
        assert_eq!(split["columns"][13], "Billing_Amount_Scaled");

        let data = split["data"].as_array().unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].as_array().unwrap().len(), 14);
        assert!(data[0][0].is_number());
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let a = synthesize(&mut SmallRng::seed_from_u64(9));
        let b = synthesize(&mut SmallRng::seed_from_u64(9));
        assert_eq!(a.dataframe_split.data, b.dataframe_split.data);
    }
}
