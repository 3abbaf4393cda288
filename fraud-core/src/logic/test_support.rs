//! Synthetic fixtures shared by unit tests

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::logic::data::{Features, Labels};

/// Imbalanced two-class data where fraud rows are shifted on the first two columns
pub fn synthetic(n_samples: usize, n_fraud: usize, n_features: usize, seed: u64) -> (Features, Labels) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut flat = Vec::with_capacity(n_samples * n_features);
    let mut labels = Vec::with_capacity(n_samples);
    let step = if n_fraud > 0 { (n_samples / n_fraud).max(1) } else { usize::MAX };

    for i in 0..n_samples {
        // Spread fraud rows evenly through the table
        let fraud = i % step == 0 && i / step < n_fraud;
        for f in 0..n_features {
            let noise: f64 = rng.gen_range(-1.0..1.0);
            let shift = if fraud && f < 2 { 4.0 } else { 0.0 };
            flat.push(noise + shift);
        }
        labels.push(u8::from(fraud));
    }

    let names = (1..=n_features).map(|i| format!("V{}", i)).collect();
    let values = Array2::from_shape_vec((n_samples, n_features), flat).unwrap();
    (Features::new(names, values), labels)
}

/// Same data rendered as CSV with `Time` and `Class` columns
pub fn synthetic_csv(n_samples: usize, n_fraud: usize, n_features: usize, seed: u64) -> String {
    let (x, y) = synthetic(n_samples, n_fraud, n_features, seed);
    let mut out = String::from("Time");
    for name in &x.names {
        out.push(',');
        out.push_str(name);
    }
    out.push_str(",Class\n");

    for (i, row) in x.values.outer_iter().enumerate() {
        out.push_str(&i.to_string());
        for v in row {
            out.push(',');
            out.push_str(&v.to_string());
        }
        out.push(',');
        out.push_str(&y[i].to_string());
        out.push('\n');
    }
    out
}
