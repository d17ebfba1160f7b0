//! Gene annotations from GFF3 files
//!
//! ```text
//! NC_000913.3  RefSeq  gene  190  255  .  +  .  ID=gene-b0001;Name=thrL;gene=thrL;locus_tag=b0001;old_locus_tag=ECK0001
//! NC_000913.3  RefSeq  CDS   190  255  .  +  0  ID=cds-NP_414542.1;gene=thrL;locus_tag=b0001;product=thr operon leader peptide;protein_id=NP_414542.1
//! ```
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::field::Scalar;
use crate::table::Table;
use crate::{ModulonError, ModulonResult};

/// The columns of the gene table returned by [`gff_to_table`]
pub const GENE_TABLE_COLUMNS: [&str; 14] = [
    "accession",
    "source",
    "feature",
    "start",
    "end",
    "score",
    "strand",
    "phase",
    "attributes",
    "locus_tag",
    "gene_name",
    "gene_product",
    "ncbi_protein",
    "old_locus_tag",
];

/// Most features carry fewer than 8 attributes
type Attributes<'a> = SmallVec<[(&'a str, &'a str); 8]>;

struct Feature<'a> {
    accession: &'a str,
    source: &'a str,
    feature: &'a str,
    start: i64,
    end: i64,
    score: &'a str,
    strand: &'a str,
    phase: &'a str,
    attributes: &'a str,
}

fn parse_attributes(attributes: &str) -> Attributes<'_> {
    attributes
        .split(';')
        .filter_map(|pair| pair.split_once('='))
        .map(|(key, value)| (key.trim(), value))
        .collect()
}

fn attr<'a>(attributes: &Attributes<'a>, key: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, value)| *value)
}

/// Returns the value of the attribute `key` from a GFF attribute column
///
/// Values are returned as they appear in the file, without percent-decoding.
///
/// # Examples
///
/// ```
/// use modulon::annotations::gff::get_attr;
///
/// let attributes = "ID=gene-b0001;old_locus_tag=ECK0001;locus_tag=b0001";
/// assert_eq!(get_attr(attributes, "locus_tag"), Some("b0001"));
/// assert_eq!(get_attr(attributes, "old_locus_tag"), Some("ECK0001"));
/// assert_eq!(get_attr(attributes, "product"), None);
/// ```
pub fn get_attr<'a>(attributes: &'a str, key: &str) -> Option<&'a str> {
    attr(&parse_attributes(attributes), key)
}

/// Parses a single feature line
///
/// Returns `None` for comments and empty lines
fn parse_line(line: &str) -> ModulonResult<Option<Feature<'_>>> {
    let line = line.trim_end_matches('\r');
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut cols = line.split('\t');
    let (
        Some(accession),
        Some(source),
        Some(feature),
        Some(start),
        Some(end),
        Some(score),
        Some(strand),
        Some(phase),
        Some(attributes),
    ) = (
        cols.next(),
        cols.next(),
        cols.next(),
        cols.next(),
        cols.next(),
        cols.next(),
        cols.next(),
        cols.next(),
        cols.next(),
    )
    else {
        return Err(ModulonError::InvalidInput(line.to_string()));
    };

    Ok(Some(Feature {
        accession,
        source,
        feature,
        start: start.parse::<i64>()?,
        end: end.parse::<i64>()?,
        score,
        strand,
        phase,
        attributes,
    }))
}

/// Builds the gene table from GFF3 formatted data
///
/// Only `CDS` features are kept, sorted by their start position. Rows are keyed
/// by `locus_tag`. The `old_locus_tag` is taken from the `gene` feature with the
/// same `locus_tag`. Parsing stops at a `##FASTA` section.
///
/// # Errors
///
/// - [`ModulonError::Io`]: Reading from `reader` failed
/// - [`ModulonError::InvalidInput`]: A line has less than 9 columns or a `CDS`
///   feature has no `locus_tag`
/// - [`ModulonError::ParseIntError`]: A start or end position is not an integer
pub fn gff_from_reader<R: BufRead>(reader: R) -> ModulonResult<Table> {
    let mut old_locus_tags: HashMap<String, Option<String>> = HashMap::new();
    let mut cds: Vec<(String, Vec<Scalar>)> = Vec::new();

    for line in reader.lines() {
        let line = line?;
        if line.starts_with("##FASTA") {
            break;
        }
        let Some(feature) = parse_line(&line)? else {
            trace!("Ignoring: {}", line);
            continue;
        };
        let attributes = parse_attributes(feature.attributes);

        match feature.feature {
            "gene" => {
                if let Some(locus_tag) = attr(&attributes, "locus_tag") {
                    old_locus_tags
                        .entry(locus_tag.to_string())
                        .or_insert_with(|| attr(&attributes, "old_locus_tag").map(String::from));
                }
            }
            "CDS" => {
                let Some(locus_tag) = attr(&attributes, "locus_tag") else {
                    return Err(ModulonError::InvalidInput(format!(
                        "locus_tag not in attributes: {}",
                        feature.attributes
                    )));
                };
                cds.push((
                    locus_tag.to_string(),
                    vec![
                        feature.accession.into(),
                        feature.source.into(),
                        feature.feature.into(),
                        feature.start.into(),
                        feature.end.into(),
                        feature.score.into(),
                        feature.strand.into(),
                        feature.phase.into(),
                        feature.attributes.into(),
                        locus_tag.into(),
                        attr(&attributes, "gene").into(),
                        attr(&attributes, "product").into(),
                        attr(&attributes, "protein_id").into(),
                    ],
                ));
            }
            _ => {}
        }
    }

    let mut table = Table::with_columns(GENE_TABLE_COLUMNS.iter().map(|c| c.to_string()).collect());
    for (locus_tag, mut row) in cds {
        row.push(
            old_locus_tags
                .get(&locus_tag)
                .cloned()
                .flatten()
                .into(),
        );
        table.push_row(locus_tag, row)?;
    }
    table.sort_by_column("start")?;

    debug!("Parsed {} CDS features", table.dim().0);
    Ok(table)
}

/// Builds the gene table from a GFF3 file
///
/// See [`gff_from_reader`] for details
///
/// # Errors
///
/// - [`ModulonError::CannotOpenFile`]: Source file not present or can't be opened
/// - all errors of [`gff_from_reader`]
///
/// # Examples
///
/// ```
/// use modulon::annotations::gff::gff_to_table;
/// use modulon::Scalar;
///
/// let genes = gff_to_table("tests/example.gff").unwrap();
/// assert_eq!(genes.index(), &["b0001", "b0002", "b0003", "b0005"]);
/// assert_eq!(genes.get("b0001", "gene_name"), Some(&Scalar::from("thrL")));
/// ```
pub fn gff_to_table<P: AsRef<Path>>(file: P) -> ModulonResult<Table> {
    let filename = file.as_ref().display().to_string();
    let file = File::open(file).map_err(|_| ModulonError::CannotOpenFile(filename))?;
    gff_from_reader(BufReader::new(file))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_skip_comments() {
        assert!(parse_line("##gff-version 3").unwrap().is_none());
        assert!(parse_line("#!processor NCBI annotwriter").unwrap().is_none());
        assert!(parse_line("").unwrap().is_none());
    }

    #[test]
    fn test_parse_correct_line() {
        let line = "NC_000913.3\tRefSeq\tCDS\t190\t255\t.\t+\t0\tlocus_tag=b0001;gene=thrL\r";
        let feature = parse_line(line).unwrap().expect("line describes a feature");
        assert_eq!(feature.feature, "CDS");
        assert_eq!(feature.start, 190);
        assert_eq!(feature.end, 255);
        assert_eq!(feature.strand, "+");
        assert_eq!(feature.attributes, "locus_tag=b0001;gene=thrL");
    }

    #[test]
    fn test_missing_columns() {
        let line = "NC_000913.3\tRefSeq\tCDS\t190\t255\t.\t+\t0";
        assert!(parse_line(line).is_err());
        let line = "NC_000913.3 RefSeq CDS 190 255 . + 0 locus_tag=b0001";
        assert!(parse_line(line).is_err());
    }

    #[test]
    fn test_invalid_position() {
        let line = "NC_000913.3\tRefSeq\tCDS\tfoo\t255\t.\t+\t0\tlocus_tag=b0001";
        assert!(matches!(parse_line(line), Err(ModulonError::ParseIntError)));
    }

    #[test]
    fn test_attributes() {
        let attributes = parse_attributes("ID=cds-1; locus_tag=b0001;product=a=b;broken");
        assert_eq!(attr(&attributes, "ID"), Some("cds-1"));
        assert_eq!(attr(&attributes, "locus_tag"), Some("b0001"));
        assert_eq!(attr(&attributes, "product"), Some("a=b"));
        assert_eq!(attr(&attributes, "broken"), None);
    }

    #[test]
    fn test_locus_tag_is_not_old_locus_tag() {
        let attributes = "old_locus_tag=ECK0001;locus_tag=b0001";
        assert_eq!(get_attr(attributes, "locus_tag"), Some("b0001"));
    }

    #[test]
    fn test_cds_requires_locus_tag() {
        let data = "NC_000913.3\tRefSeq\tCDS\t190\t255\t.\t+\t0\tgene=thrL\n";
        assert!(gff_from_reader(data.as_bytes()).is_err());
    }

    #[test]
    fn test_example_file() {
        let table = gff_to_table("tests/example.gff").unwrap();
        assert_eq!(table.index(), &["b0001", "b0002", "b0003", "b0005"]);
        assert_eq!(table.columns(), &GENE_TABLE_COLUMNS);

        assert_eq!(table.get("b0001", "start"), Some(&Scalar::Int(190)));
        assert_eq!(table.get("b0002", "end"), Some(&Scalar::Int(2799)));
        assert_eq!(
            table.get("b0002", "gene_product"),
            Some(&Scalar::from("fused aspartate kinase/homoserine dehydrogenase 1"))
        );
        assert_eq!(
            table.get("b0003", "ncbi_protein"),
            Some(&Scalar::from("NP_414544.1"))
        );
        assert_eq!(table.get("b0005", "strand"), Some(&Scalar::from("-")));
        assert_eq!(table.get("b0005", "gene_name"), Some(&Scalar::Null));
    }

    #[test]
    fn test_old_locus_tags() {
        let table = gff_to_table("tests/example.gff").unwrap();
        assert_eq!(
            table.get("b0001", "old_locus_tag"),
            Some(&Scalar::from("ECK0001"))
        );
        assert_eq!(
            table.get("b0002", "old_locus_tag"),
            Some(&Scalar::from("ECK0002"))
        );
        assert_eq!(table.get("b0003", "old_locus_tag"), Some(&Scalar::Null));
        assert_eq!(table.get("b0005", "old_locus_tag"), Some(&Scalar::Null));
    }

    #[test]
    fn test_gene_after_cds() {
        let data = "\
NC_000913.3\tRefSeq\tCDS\t190\t255\t.\t+\t0\tlocus_tag=b0001
NC_000913.3\tRefSeq\tgene\t190\t255\t.\t+\t.\tlocus_tag=b0001;old_locus_tag=ECK0001
";
        let table = gff_from_reader(data.as_bytes()).unwrap();
        assert_eq!(
            table.get("b0001", "old_locus_tag"),
            Some(&Scalar::from("ECK0001"))
        );
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            gff_to_table("tests/missing.gff"),
            Err(ModulonError::CannotOpenFile(_))
        ));
    }
}
