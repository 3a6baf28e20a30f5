use std::{env, fs, io, path::Path, sync::Arc, time::Instant};

use ngram_pair_features::{
    extract_into, Document, ExtractorConfig, FeatureStore, PairNgramExtractor, SparseFeatureStore,
    VocabularySet, COMBINED, COMBO, PART_ONE, PART_TWO,
};

const SAMPLE: &str = "\
1\tparaphrase\tThe cat sat on the mat\tA cat was sitting on the mat
2\tparaphrase\tDogs bark at night\tThe dog barked all night
3\tunrelated\tThe cat sat on the mat\tStock prices fell sharply
4\tunrelated\tBirds sing at dawn\tThe dog chased the cat";

// one pair per line: id, outcome, part one, part two (tab separated)
fn parse_pairs(text: &str) -> Vec<Document> {
    let mut docs = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let cols: Vec<&str> = line.split('\t').collect();
        if cols.len() != 4 {
            if !line.trim().is_empty() {
                eprintln!("[warn] line {} has {} columns, skipped", line_no + 1, cols.len());
            }
            continue;
        }
        docs.push(
            Document::new(cols[0])
                .with_outcome(cols[1])
                .with_text(PART_ONE, cols[2])
                .with_text(PART_TWO, cols[3]),
        );
    }
    docs
}

fn load_config(path: Option<&String>) -> Result<ExtractorConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(ExtractorConfig::from_json(&fs::read_to_string(path)?)?),
        None => {
            let mut config = ExtractorConfig::default();
            config.stop_terms = vec!["the".into(), "a".into(), "on".into()];
            Ok(config)
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // usage: pair_features [pairs.tsv] [config.json]
    let args: Vec<String> = env::args().skip(1).collect();
    let text = match args.first() {
        Some(path) => fs::read_to_string(path)?,
        None => SAMPLE.to_string(),
    };
    let config = load_config(args.get(1))?;
    let docs = parse_pairs(&text);
    println!("{} pairs loaded", docs.len());

    let start = Instant::now();
    let extractor = PairNgramExtractor::train(config.clone(), &docs)?;
    println!("vocabularies built in {:?}", start.elapsed());
    for field in [PART_ONE, PART_TWO, COMBINED, COMBO] {
        if let Some(v) = extractor.vocabularies().get(field) {
            println!("  {:<9} {:>5} of {:>6} terms", field, v.len(), v.seen_terms());
        }
    }

    let out = Path::new("vocabularies.cbor");
    extractor.vocabularies().write_cbor(io::BufWriter::new(fs::File::create(out)?))?;
    let restored = VocabularySet::read_cbor(io::BufReader::new(fs::File::open(out)?))?;
    let extractor = PairNgramExtractor::with_vocabularies(config, Arc::new(restored))?;

    let start = Instant::now();
    let mut store = SparseFeatureStore::new();
    let failures = extract_into(&mut store, &[&extractor], &docs)?;
    for failure in &failures {
        eprintln!("[warn] {}: {}", failure.doc_id, failure.error);
    }
    println!(
        "{} instances, {} features, {:.3} non-default, in {:?}",
        store.len(),
        store.feature_names().len(),
        store.sparsity_ratio(),
        start.elapsed()
    );

    if let Some(instance) = store.instance(0) {
        println!("instance 0 ({:?}):", instance.outcomes());
        for feature in instance.features().iter().take(20) {
            println!("  {} = {}", feature.name(), feature.value());
        }
    }
    Ok(())
}
