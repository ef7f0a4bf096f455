use std::sync::Arc;

use anyhow::{Context, Result};

use arrow::array::{Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use astrodb_ingest::spectral_type::convert_spt_code_to_string;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let mut rng = SimpleRng::new(42);

    let regimes = ["optical", "nir"];
    let references = ["Kirk19", "Best20.257", "Manj19", "Cruz03"];
    let suffixes = ["", "", "", "pec", " beta", "sb"];

    let mut sources: Vec<String> = Vec::new();
    let mut spectral_types: Vec<String> = Vec::new();
    let mut regime_col: Vec<&str> = Vec::new();
    let mut reference_col: Vec<&str> = Vec::new();
    let mut ra_col: Vec<f64> = Vec::new();

    for i in 0..200 {
        // Codes spread over M0 .. Y4, half-subtype steps.
        let code = 60.0 + (rng.next_f64() * 69.0).floor() / 2.0;
        let spt = convert_spt_code_to_string(code, 1)?;

        sources.push(format!("Sample {i:03}"));
        spectral_types.push(format!("{spt}{}", rng.pick(&suffixes)));
        regime_col.push(rng.pick(&regimes));
        reference_col.push(rng.pick(&references));
        ra_col.push(rng.next_f64() * 360.0);
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new("source", DataType::Utf8, false),
        Field::new("spectral_type", DataType::Utf8, false),
        Field::new("regime", DataType::Utf8, false),
        Field::new("reference", DataType::Utf8, false),
        Field::new("ra", DataType::Float64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(
                sources.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
            )),
            Arc::new(StringArray::from(
                spectral_types.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
            )),
            Arc::new(StringArray::from(regime_col)),
            Arc::new(StringArray::from(reference_col)),
            Arc::new(Float64Array::from(ra_col)),
        ],
    )
    .context("building record batch")?;

    let output_path = "sample_spectral_types.parquet";
    let file = std::fs::File::create(output_path)
        .with_context(|| format!("creating {output_path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;

    println!("Wrote {} spectral types to {output_path}", sources.len());
    Ok(())
}
