use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

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

    fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }
}

const DRUGS: &[(&str, &str, &str, &str)] = &[
    ("DB00783", "Estradiol", "Small Molecule", "approved, investigational"),
    ("DB00675", "Tamoxifen", "Small Molecule", "approved"),
    ("DB00481", "Raloxifene", "Small Molecule", "approved, investigational"),
    ("DB00947", "Fulvestrant", "Small Molecule", "approved, investigational"),
    ("DB00945", "Acetylsalicylic acid", "Small Molecule", "approved, vet_approved"),
    ("DB00001", "Lepirudin", "Biotech", "approved, withdrawn"),
];

const GENES: &[&str] = &["ESR1 ESR NR3A1", "ESR2 ESTRB NR3A2", "GPER1 CMKRL2 GPER", "PTGS1 COX1", "F2"];
const ORGANISMS: &[&str] = &["Homo sapiens (Human)", "Mus musculus (Mouse)", "Rattus norvegicus (Rat)"];
const LOCATIONS: &[&str] = &["Nucleus", "Cytoplasm", "Cell membrane", "Endoplasmic reticulum membrane"];

fn write_drugs_csv(path: &Path, rng: &mut SimpleRng) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating drug CSV")?;
    writer.write_record([
        "DrugBank ID",
        "Name",
        "Type",
        "Groups",
        "Absorption",
        "Protein Binding",
        "Molecular Weight",
    ])?;
    for &(id, name, kind, groups) in DRUGS {
        let low = 20.0 + rng.next_f64() * 50.0;
        let high = low + rng.next_f64() * 30.0;
        let absorption = format!("{low:.0}%, {high:.0}% (reduced with food)");
        let binding = format!("Approximately {:.1}% bound to albumin", 80.0 + rng.next_f64() * 19.0);
        let weight = format!("{:.2}", 150.0 + rng.next_f64() * 500.0);
        writer.write_record([id, name, kind, groups, absorption.as_str(), binding.as_str(), weight.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_proteins_parquet(path: &Path, rows: usize, rng: &mut SimpleRng) -> Result<()> {
    let mut entries = Vec::with_capacity(rows);
    let mut genes = Vec::with_capacity(rows);
    let mut organisms = Vec::with_capacity(rows);
    let mut locations = Vec::with_capacity(rows);
    let mut lengths = Vec::with_capacity(rows);
    let mut masses = Vec::with_capacity(rows);
    let mut references: Vec<Option<String>> = Vec::with_capacity(rows);

    for i in 0..rows {
        entries.push(format!("P{:05}", 10000 + i));
        genes.push(GENES[rng.below(GENES.len())]);
        organisms.push(ORGANISMS[rng.below(ORGANISMS.len())]);
        locations.push(LOCATIONS[rng.below(LOCATIONS.len())]);
        let length = 200 + rng.below(1200) as i64;
        lengths.push(length);
        // ~110 Da per residue.
        masses.push(length as f64 * 110.0);

        let n_refs = rng.below(3);
        if n_refs == 0 {
            references.push(None);
        } else {
            let refs: Vec<String> = (0..n_refs)
                .map(|_| {
                    let (id, name, _, _) = DRUGS[rng.below(DRUGS.len())];
                    format!("\"{id}; {name}\"")
                })
                .collect();
            references.push(Some(refs.join(" ")));
        }
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new("Entry", DataType::Utf8, false),
        Field::new("Gene Names", DataType::Utf8, false),
        Field::new("Organism", DataType::Utf8, false),
        Field::new("Subcellular location", DataType::Utf8, false),
        Field::new("Length", DataType::Int64, false),
        Field::new("Mass", DataType::Float64, false),
        Field::new("DrugBank-reference", DataType::Utf8, true),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(entries)),
            Arc::new(StringArray::from(genes)),
            Arc::new(StringArray::from(organisms)),
            Arc::new(StringArray::from(locations)),
            Arc::new(Int64Array::from(lengths)),
            Arc::new(Float64Array::from(masses)),
            Arc::new(StringArray::from(references)),
        ],
    )
    .context("building protein record batch")?;

    let file = std::fs::File::create(path).context("creating protein parquet")?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    let protein_path = Path::new("sample_uniprot.parquet");
    let drug_path = Path::new("sample_drugbank.csv");
    let rows = 40;

    write_proteins_parquet(protein_path, rows, &mut rng)?;
    write_drugs_csv(drug_path, &mut rng)?;

    println!(
        "Wrote {rows} proteins to {} and {} drugs to {}",
        protein_path.display(),
        DRUGS.len(),
        drug_path.display()
    );
    Ok(())
}
