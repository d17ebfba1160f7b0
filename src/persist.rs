//! Saving and loading models as JSON documents
//!
//! A model is persisted in two steps:
//! 1. [`encode`] reads all identity fields of the model (see [`Model::FIELDS`])
//!    and converts them into JSON values
//! 2. [`write_document`] writes them as a single JSON object, optionally gzip-compressed
//!
//! Loading is the inverse: [`read_document`] parses the document and [`decode`]
//! turns every value back into the kind its field declares, before
//! [`Model::from_fields`] constructs the model.
//!
//! [`save_to_json`], [`load_json_model`] and [`load_json_reader`] run the whole chain.
//!
//! # Examples
//!
//! ```
//! use modulon::{load_json_model, save_to_json, IcaData, Table};
//!
//! let m = Table::from_rows(
//!     vec!["b0001".into(), "b0002".into()],
//!     vec!["Crp-1".into()],
//!     vec![vec![0.02.into()], vec![(-0.31).into()]],
//! ).unwrap();
//! let a = Table::from_rows(
//!     vec!["Crp-1".into()],
//!     vec!["control__wt_glc__1".into()],
//!     vec![vec![1.7.into()]],
//! ).unwrap();
//! let model = IcaData::new(m, a);
//!
//! let dir = tempfile::tempdir().unwrap();
//! let path = save_to_json(&model, dir.path().join("ecoli"), true).unwrap();
//! assert!(path.to_string_lossy().ends_with("ecoli.json.gz"));
//!
//! let restored: IcaData = load_json_model(&path).unwrap();
//! assert_eq!(restored, model);
//! ```
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::model::Model;
use crate::ModulonResult;

mod codec;
mod document;

pub use codec::{decode, decode_value, encode, encode_value, FieldMap};
pub use document::{document_path, read_document, read_document_from, write_document};

/// Saves `model` to a JSON document at `path` and returns the final path
///
/// `.json` is appended to `path` if missing, `.gz` is appended if `compress` is set.
///
/// # Errors
///
/// - [`crate::ModulonError::MissingRequiredData`]: The model lacks a required matrix.
///   No file is written in that case.
/// - [`crate::ModulonError::NonFiniteFloat`]: The model holds NaN or an infinity.
///   No file is written in that case.
/// - [`crate::ModulonError::Io`]: The document cannot be written
pub fn save_to_json<M: Model, P: AsRef<Path>>(
    model: &M,
    path: P,
    compress: bool,
) -> ModulonResult<PathBuf> {
    let map = encode(model)?;
    let path = write_document(&map, path, compress)?;
    debug!("saved model to {}", path.display());
    Ok(path)
}

/// Loads a model from the JSON document at `path`
///
/// Paths ending in `.gz` are decompressed.
///
/// # Errors
///
/// - [`crate::ModulonError::Io`]: The file cannot be read, or a `.gz` file is
///   not valid gzip data
/// - [`crate::ModulonError::DocumentFormat`]: The file is not a JSON object
/// - [`crate::ModulonError::SchemaMismatch`]: The document does not describe an `M`
pub fn load_json_model<M: Model, P: AsRef<Path>>(path: P) -> ModulonResult<M> {
    let map = read_document(path)?;
    M::from_fields(decode::<M>(map)?)
}

/// Loads a model from an uncompressed JSON document
///
/// Compression is not detected here, see [`read_document_from`].
///
/// # Errors
///
/// - [`crate::ModulonError::Io`]: Reading from `reader` failed
/// - [`crate::ModulonError::DocumentFormat`]: The content is not a JSON object
/// - [`crate::ModulonError::SchemaMismatch`]: The document does not describe an `M`
pub fn load_json_reader<M: Model, R: Read>(reader: R) -> ModulonResult<M> {
    let map = read_document_from(reader)?;
    M::from_fields(decode::<M>(map)?)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::field::{Scalar, ScalarSet};
    use crate::{IcaData, ModulonError, Table};

    fn model() -> IcaData {
        let m = Table::from_rows(
            vec!["b0001".into(), "b0002".into(), "b0003".into()],
            vec!["Crp-1".into(), "ArcA".into()],
            vec![
                vec![0.02.into(), 0.11.into()],
                vec![(-0.31).into(), 0.0.into()],
                vec![0.07.into(), (-0.09).into()],
            ],
        )
        .unwrap();
        let a = Table::from_rows(
            vec!["Crp-1".into(), "ArcA".into()],
            vec!["wt_glc__1".into(), "wt_glc__2".into()],
            vec![vec![1.7.into(), 1.5.into()], vec![(-0.2).into(), 0.4.into()]],
        )
        .unwrap();
        let genes = Table::from_rows(
            vec!["b0001".into(), "b0002".into(), "b0003".into()],
            vec!["start".into(), "gene_name".into(), "operon".into()],
            vec![
                vec![190.into(), "thrL".into(), "thrLABC".into()],
                vec![337.into(), "thrA".into(), "thrLABC".into()],
                vec![2801.into(), "thrB".into(), Scalar::Null],
            ],
        )
        .unwrap();

        let mut model = IcaData::new(m, a);
        model.set_gene_table(Some(genes));
        model.set_thresholds(vec![0.1, 0.08]);
        model.set_threshold_method("kmeans");
        model.set_tfs(["Crp", "ArcA"]);
        model
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        for compress in [false, true] {
            let path = save_to_json(&model(), dir.path().join("model"), compress).unwrap();
            let restored: IcaData = load_json_model(path).unwrap();
            assert_eq!(restored, model());
            assert_eq!(restored.gene_table().unwrap().index(), &["b0001", "b0002", "b0003"]);
        }
    }

    #[test]
    fn derived_fields_are_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let mut model = model();
        model.binarize().unwrap();
        assert!(model.m_binarized().is_some());

        let path = save_to_json(&model, dir.path().join("model"), false).unwrap();
        let map = read_document(&path).unwrap();
        assert_eq!(map.len(), IcaData::FIELDS.len());
        assert!(!map.contains_key("m_binarized"));

        let restored: IcaData = load_json_model(path).unwrap();
        assert!(restored.m_binarized().is_none());
        assert_eq!(restored, model);
    }

    #[test]
    fn load_from_reader() {
        let map = encode(&model()).unwrap();
        let text = serde_json::to_string(&map).unwrap();
        let restored: IcaData = load_json_reader(text.as_bytes()).unwrap();
        assert_eq!(restored, model());

        let expected: ScalarSet = ["Crp", "ArcA"].into_iter().map(Scalar::from).collect();
        assert_eq!(restored.tfs(), Some(&expected));
    }

    #[test]
    fn missing_matrix_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut model = model();
        model.set_m(None);
        let res = save_to_json(&model, dir.path().join("model"), false);
        assert!(matches!(res, Err(ModulonError::MissingRequiredData(_))));
        assert!(!dir.path().join("model.json").exists());
    }

    #[test]
    fn nan_weight_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut model = model();
        model.set_thresholds(vec![f64::NAN, 0.08]);
        let res = save_to_json(&model, dir.path().join("model"), true);
        assert!(matches!(res, Err(ModulonError::NonFiniteFloat(_))));
        assert!(!dir.path().join("model.json.gz").exists());
    }

    #[test]
    fn bad_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, "not json").unwrap();
        let res: ModulonResult<IcaData> = load_json_model(&path);
        assert!(matches!(res, Err(ModulonError::DocumentFormat(_))));
    }

    #[test]
    fn foreign_document() {
        let res: ModulonResult<IcaData> =
            load_json_reader(r#"{"M": null, "A": null, "foo": 1}"#.as_bytes());
        assert!(matches!(res, Err(ModulonError::SchemaMismatch(_))));
    }
}
