//! Builds the gene table of a GFF3 file and stores it in a minimal model document
//!
//! `cargo run --example gff_to_json -- <GFF FILE> <OUTPUT NAME> [--gzip]`

use std::process;

use modulon::annotations::gff::gff_to_table;
use modulon::{load_json_model, save_to_json, IcaData, Scalar, Table};

fn main() {
    simple_logger::SimpleLogger::new().env().init().unwrap();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        println!("Usage: gff_to_json <GFF FILE> <OUTPUT NAME> [--gzip]");
        process::exit(1);
    }
    let compress = args.iter().any(|arg| arg == "--gzip");

    let genes = gff_to_table(&args[1]).expect("unable to parse GFF file");
    println!("{} coding sequences", genes.dim().0);

    // one empty iModulon, so that the model is complete
    let m = Table::from_rows(
        genes.index().to_vec(),
        vec!["placeholder".into()],
        vec![vec![Scalar::Float(0.0)]; genes.dim().0],
    )
    .expect("one weight per gene");
    let a = Table::with_columns(vec!["placeholder".into()]);

    let mut model = IcaData::new(m, a);
    model.set_gene_table(Some(genes));

    let path = save_to_json(&model, &args[2], compress).expect("unable to save model");
    println!("Saved model to {}", path.display());

    let restored: IcaData = load_json_model(&path).expect("unable to load model");
    assert_eq!(restored, model);
    for row in restored.gene_table().expect("gene table was saved").rows() {
        println!("{}\t{}", row.key(), row.values()[3]);
    }
}
