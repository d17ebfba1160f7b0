//! The iModulon ICA model
use crate::field::{FieldDescriptor, FieldKind, FieldRef, Scalar, ScalarSet};
use crate::model::{Fields, Model};
use crate::table::Table;
use crate::{ModulonError, ModulonResult};

/// Default method to compute iModulon thresholds
pub const DEFAULT_THRESHOLD_METHOD: &str = "dagostino";

#[cfg_attr(doc, aquamarine::aquamarine)]
/// `IcaData` holds the result of an independent component analysis of a
/// transcriptomic compendium
///
/// The two mandatory matrices are
/// - `M`: the gene weights, genes × iModulons
/// - `A`: the iModulon activities, iModulons × samples
///
/// All other tables describe genes, samples, iModulons and the transcriptional
/// regulatory network (TRN). They are optional.
///
/// # Persistence
///
/// `IcaData` implements [`Model`]. Its identity fields are listed in
/// [`IcaData::FIELDS`](`Model::FIELDS`). The binarized M matrix
/// ([`IcaData::m_binarized`]) is derived from `M` and the thresholds and is
/// never persisted.
///
/// ```mermaid
/// erDiagram
///     ICADATA ||--|| M : "gene weights"
///     ICADATA ||--|| A : "activities"
///     ICADATA ||--o| X : "expression"
///     ICADATA ||--o| GENE_TABLE : "genes"
///     ICADATA ||--o| SAMPLE_TABLE : "samples"
///     ICADATA ||--o| IMODULON_TABLE : "iModulons"
///     ICADATA ||--o| TRN : "regulation"
///     M ||--o| M_BINARIZED : "derived, not persisted"
/// ```
///
/// # Examples
///
/// ```
/// use modulon::{IcaData, Scalar, Table};
///
/// let m = Table::from_rows(
///     vec!["b0001".into(), "b0002".into()],
///     vec!["Crp-1".into()],
///     vec![vec![0.02.into()], vec![(-0.31).into()]],
/// ).unwrap();
/// let a = Table::from_rows(
///     vec!["Crp-1".into()],
///     vec!["control__wt_glc__1".into()],
///     vec![vec![1.7.into()]],
/// ).unwrap();
///
/// let mut model = IcaData::new(m, a);
/// model.set_thresholds(vec![0.1]);
///
/// let binarized = model.binarize().unwrap();
/// assert_eq!(binarized.get("b0001", "Crp-1"), Some(&Scalar::Int(0)));
/// assert_eq!(binarized.get("b0002", "Crp-1"), Some(&Scalar::Int(1)));
/// ```
#[derive(Debug, Clone)]
pub struct IcaData {
    m: Option<Table>,
    a: Option<Table>,
    x: Option<Table>,
    log_tpm: Option<Table>,
    gene_table: Option<Table>,
    sample_table: Option<Table>,
    imodulon_table: Option<Table>,
    trn: Option<Table>,
    optimize_cutoff: Scalar,
    dagostino_cutoff: Scalar,
    thresholds: Option<Vec<Scalar>>,
    threshold_method: Scalar,
    tfs: Option<ScalarSet>,
    // derived from `m` and `thresholds`
    m_binarized: Option<Table>,
}

impl IcaData {
    /// Creates a new model from the gene weights `m` and the activities `a`
    pub fn new(m: Table, a: Table) -> Self {
        Self {
            m: Some(m),
            a: Some(a),
            x: None,
            log_tpm: None,
            gene_table: None,
            sample_table: None,
            imodulon_table: None,
            trn: None,
            optimize_cutoff: Scalar::Bool(false),
            dagostino_cutoff: Scalar::Null,
            thresholds: None,
            threshold_method: Scalar::from(DEFAULT_THRESHOLD_METHOD),
            tfs: None,
            m_binarized: None,
        }
    }

    /// The gene weights (genes × iModulons)
    pub fn m(&self) -> Option<&Table> {
        self.m.as_ref()
    }

    /// Replaces the gene weights
    pub fn set_m(&mut self, m: Option<Table>) {
        self.m = m;
        self.m_binarized = None;
    }

    /// The iModulon activities (iModulons × samples)
    pub fn a(&self) -> Option<&Table> {
        self.a.as_ref()
    }

    /// Replaces the iModulon activities
    pub fn set_a(&mut self, a: Option<Table>) {
        self.a = a;
    }

    /// The expression matrix used to compute the ICA
    pub fn x(&self) -> Option<&Table> {
        self.x.as_ref()
    }

    pub fn set_x(&mut self, x: Option<Table>) {
        self.x = x;
    }

    /// Log-transformed TPM values
    pub fn log_tpm(&self) -> Option<&Table> {
        self.log_tpm.as_ref()
    }

    pub fn set_log_tpm(&mut self, log_tpm: Option<Table>) {
        self.log_tpm = log_tpm;
    }

    /// Gene annotations, rows keyed by locus tag
    pub fn gene_table(&self) -> Option<&Table> {
        self.gene_table.as_ref()
    }

    pub fn set_gene_table(&mut self, gene_table: Option<Table>) {
        self.gene_table = gene_table;
    }

    /// Sample metadata
    pub fn sample_table(&self) -> Option<&Table> {
        self.sample_table.as_ref()
    }

    pub fn set_sample_table(&mut self, sample_table: Option<Table>) {
        self.sample_table = sample_table;
    }

    /// iModulon annotations
    pub fn imodulon_table(&self) -> Option<&Table> {
        self.imodulon_table.as_ref()
    }

    pub fn set_imodulon_table(&mut self, imodulon_table: Option<Table>) {
        self.imodulon_table = imodulon_table;
    }

    /// The transcriptional regulatory network
    pub fn trn(&self) -> Option<&Table> {
        self.trn.as_ref()
    }

    pub fn set_trn(&mut self, trn: Option<Table>) {
        self.trn = trn;
    }

    /// Whether the D'Agostino cutoff should be optimized against the TRN
    pub fn optimize_cutoff(&self) -> bool {
        self.optimize_cutoff.as_bool().unwrap_or(false)
    }

    pub fn set_optimize_cutoff(&mut self, optimize: bool) {
        self.optimize_cutoff = Scalar::Bool(optimize);
    }

    /// Cutoff of the D'Agostino K² test used to compute thresholds
    pub fn dagostino_cutoff(&self) -> Option<i64> {
        self.dagostino_cutoff.as_i64()
    }

    pub fn set_dagostino_cutoff(&mut self, cutoff: Option<i64>) {
        self.dagostino_cutoff = cutoff.into();
    }

    /// One threshold per iModulon, in the column order of `M`
    pub fn thresholds(&self) -> Option<&[Scalar]> {
        self.thresholds.as_deref()
    }

    /// Sets the iModulon thresholds, resetting the binarized M matrix
    pub fn set_thresholds(&mut self, thresholds: Vec<f64>) {
        self.thresholds = Some(thresholds.into_iter().map(Scalar::Float).collect());
        self.m_binarized = None;
    }

    /// The method used to compute the thresholds
    pub fn threshold_method(&self) -> &str {
        self.threshold_method
            .as_str()
            .unwrap_or(DEFAULT_THRESHOLD_METHOD)
    }

    pub fn set_threshold_method(&mut self, method: &str) {
        self.threshold_method = Scalar::from(method);
    }

    /// Transcription factors present in the TRN
    pub fn tfs(&self) -> Option<&ScalarSet> {
        self.tfs.as_ref()
    }

    pub fn set_tfs<I, T>(&mut self, tfs: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<Scalar>,
    {
        self.tfs = Some(tfs.into_iter().map(Into::into).collect());
    }

    /// The names of all iModulons, i.e. the columns of `M`
    pub fn imodulon_names(&self) -> Option<&[String]> {
        self.m.as_ref().map(Table::columns)
    }

    /// The binarized M matrix, if it was computed by [`IcaData::binarize`]
    pub fn m_binarized(&self) -> Option<&Table> {
        self.m_binarized.as_ref()
    }

    /// Computes and caches the binarized M matrix
    ///
    /// A gene belongs to an iModulon (`1`) if the absolute value of its weight
    /// exceeds the absolute threshold of the iModulon, otherwise it is `0`.
    ///
    /// # Errors
    ///
    /// - [`ModulonError::MissingRequiredData`]: `M` is absent
    /// - [`ModulonError::InvalidInput`]: Thresholds are missing, not numeric or do
    ///   not match the columns of `M`
    pub fn binarize(&mut self) -> ModulonResult<&Table> {
        let m = self
            .m
            .as_ref()
            .ok_or_else(|| ModulonError::MissingRequiredData("M".to_string()))?;
        let thresholds = self
            .thresholds
            .as_ref()
            .ok_or_else(|| ModulonError::InvalidInput("thresholds are not set".to_string()))?
            .iter()
            .map(|t| {
                t.as_f64()
                    .map(f64::abs)
                    .ok_or_else(|| ModulonError::InvalidInput(format!("invalid threshold {t}")))
            })
            .collect::<ModulonResult<Vec<f64>>>()?;

        if thresholds.len() != m.columns().len() {
            return Err(ModulonError::InvalidInput(format!(
                "{} thresholds for {} iModulons",
                thresholds.len(),
                m.columns().len()
            )));
        }

        let data = m
            .rows()
            .flat_map(|row| {
                row.iter().zip(&thresholds).map(|(weight, threshold)| {
                    match weight.as_f64() {
                        Some(w) if w.abs() > *threshold => Scalar::Int(1),
                        _ => Scalar::Int(0),
                    }
                })
            })
            .collect();
        let binarized = Table::new(m.index().to_vec(), m.columns().to_vec(), data)?;
        Ok(&*self.m_binarized.insert(binarized))
    }
}

impl Model for IcaData {
    const FIELDS: &'static [FieldDescriptor] = &[
        FieldDescriptor::required("M", FieldKind::Table),
        FieldDescriptor::required("A", FieldKind::Table),
        FieldDescriptor::optional("X", FieldKind::Table),
        FieldDescriptor::optional("log_tpm", FieldKind::Table),
        FieldDescriptor::optional("gene_table", FieldKind::Table),
        FieldDescriptor::optional("sample_table", FieldKind::Table),
        FieldDescriptor::optional("imodulon_table", FieldKind::Table),
        FieldDescriptor::optional("trn", FieldKind::Table),
        FieldDescriptor::optional("optimize_cutoff", FieldKind::Scalar),
        FieldDescriptor::optional("dagostino_cutoff", FieldKind::Scalar),
        FieldDescriptor::optional("thresholds", FieldKind::Sequence),
        FieldDescriptor::optional("threshold_method", FieldKind::Scalar),
        FieldDescriptor::optional("tfs", FieldKind::Set),
    ];

    fn field(&self, name: &str) -> Option<FieldRef<'_>> {
        match name {
            "M" => self.m.as_ref().map(FieldRef::Table),
            "A" => self.a.as_ref().map(FieldRef::Table),
            "X" => self.x.as_ref().map(FieldRef::Table),
            "log_tpm" => self.log_tpm.as_ref().map(FieldRef::Table),
            "gene_table" => self.gene_table.as_ref().map(FieldRef::Table),
            "sample_table" => self.sample_table.as_ref().map(FieldRef::Table),
            "imodulon_table" => self.imodulon_table.as_ref().map(FieldRef::Table),
            "trn" => self.trn.as_ref().map(FieldRef::Table),
            "optimize_cutoff" => Some(FieldRef::Scalar(&self.optimize_cutoff)),
            "dagostino_cutoff" => Some(FieldRef::Scalar(&self.dagostino_cutoff)),
            "thresholds" => self.thresholds.as_deref().map(FieldRef::Sequence),
            "threshold_method" => Some(FieldRef::Scalar(&self.threshold_method)),
            "tfs" => self.tfs.as_ref().map(FieldRef::Set),
            _ => None,
        }
    }

    fn from_fields(mut fields: Fields) -> ModulonResult<Self> {
        let m = fields.take_required_table("M")?;
        let a = fields.take_required_table("A")?;
        let mut model = IcaData::new(m, a);

        model.x = fields.take_table("X")?;
        model.log_tpm = fields.take_table("log_tpm")?;
        model.gene_table = fields.take_table("gene_table")?;
        model.sample_table = fields.take_table("sample_table")?;
        model.imodulon_table = fields.take_table("imodulon_table")?;
        model.trn = fields.take_table("trn")?;

        model.set_optimize_cutoff(fields.take_bool("optimize_cutoff")?.unwrap_or(false));

        model.dagostino_cutoff = match fields.take_scalar("dagostino_cutoff")? {
            cutoff @ (Scalar::Null | Scalar::Int(_)) => cutoff,
            other => {
                return Err(ModulonError::SchemaMismatch(format!(
                    "dagostino_cutoff must be an integer, found {other}"
                )))
            }
        };

        if let Some(thresholds) = fields.take_sequence("thresholds")? {
            if let Some(invalid) = thresholds
                .iter()
                .find(|t| !t.is_null() && t.as_f64().is_none())
            {
                return Err(ModulonError::SchemaMismatch(format!(
                    "thresholds must be numeric, found {invalid}"
                )));
            }
            model.thresholds = Some(thresholds);
        }

        if let Some(method) = fields.take_str("threshold_method")? {
            model.threshold_method = Scalar::Str(method);
        }
        model.tfs = fields.take_set("tfs")?;

        if let Some(name) = fields.names().next() {
            return Err(ModulonError::SchemaMismatch(format!("unknown field {name}")));
        }
        Ok(model)
    }
}

/// Two models are equal if all their identity fields are equal
impl PartialEq for IcaData {
    fn eq(&self, other: &Self) -> bool {
        self.m == other.m
            && self.a == other.a
            && self.x == other.x
            && self.log_tpm == other.log_tpm
            && self.gene_table == other.gene_table
            && self.sample_table == other.sample_table
            && self.imodulon_table == other.imodulon_table
            && self.trn == other.trn
            && self.optimize_cutoff == other.optimize_cutoff
            && self.dagostino_cutoff == other.dagostino_cutoff
            && self.thresholds == other.thresholds
            && self.threshold_method == other.threshold_method
            && self.tfs == other.tfs
    }
}
