//! Protein identifier mapping through the UniProt mapping service
//!
//! This module only builds the request body and parses the tab-separated
//! response. Sending the request is up to the caller's HTTP client.
use std::collections::HashSet;

use url::form_urlencoded;

use crate::field::Scalar;
use crate::table::Table;
use crate::{ModulonError, ModulonResult};

/// Endpoint of the UniProt mapping service
pub const UNIPROT_MAPPING_URL: &str = "https://www.uniprot.org/uploadlists/";

/// A UniProt identifier mapping request
///
/// # Examples
///
/// ```
/// use modulon::annotations::id_mapping::IdMapping;
///
/// let request = IdMapping::new(["P0A9Q1", "P0ACJ8"]).output_type("P_REFSEQ_AC");
/// assert_eq!(
///     request.form_body(),
///     "from=ACC%2BID&to=P_REFSEQ_AC&format=tab&query=P0A9Q1+P0ACJ8"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct IdMapping {
    from: String,
    to: String,
    proteins: Vec<String>,
}

impl IdMapping {
    /// Maps `proteins` from UniProt accessions to RefSeq protein IDs
    pub fn new<I, S>(proteins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            from: "ACC+ID".to_string(),
            to: "P_REFSEQ_AC".to_string(),
            proteins: proteins.into_iter().map(Into::into).collect(),
        }
    }

    /// Sets the ID type of the input
    #[must_use]
    pub fn input_type(mut self, id_type: &str) -> Self {
        self.from = id_type.to_string();
        self
    }

    /// Sets the ID type of the output
    #[must_use]
    pub fn output_type(mut self, id_type: &str) -> Self {
        self.to = id_type.to_string();
        self
    }

    /// The proteins to map
    pub fn proteins(&self) -> &[String] {
        &self.proteins
    }

    /// The url-encoded form body to `POST` to [`UNIPROT_MAPPING_URL`]
    pub fn form_body(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .append_pair("from", &self.from)
            .append_pair("to", &self.to)
            .append_pair("format", "tab")
            .append_pair("query", &self.proteins.join(" "))
            .finish()
    }
}

/// Parses the tab-separated response of the mapping service
///
/// The first line is a header and is skipped. Rows are sorted by the mapped ID
/// and only the first mapping of every input ID is kept. Rows are keyed by the
/// input ID, the two columns are named `input_name` and `output_name`.
///
/// # Errors
///
/// [`ModulonError::InvalidInput`] if a line does not have two columns
///
/// # Examples
///
/// ```
/// use modulon::annotations::id_mapping::parse_mapping_response;
/// use modulon::Scalar;
///
/// let response = "From\tTo\nP0A9Q1\tNP_418208.1\nP0A9Q1\tNP_000001.1\n";
/// let table = parse_mapping_response(response, "uniprot", "refseq").unwrap();
/// assert_eq!(table.get("P0A9Q1", "refseq"), Some(&Scalar::from("NP_000001.1")));
/// ```
pub fn parse_mapping_response(
    response: &str,
    input_name: &str,
    output_name: &str,
) -> ModulonResult<Table> {
    let mut mapping: Vec<(&str, &str)> = Vec::new();
    for line in response.lines().skip(1) {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }
        let mut cols = line.split('\t');
        let (Some(input), Some(output)) = (cols.next(), cols.next()) else {
            return Err(ModulonError::InvalidInput(line.to_string()));
        };
        mapping.push((input, output));
    }
    mapping.sort_by(|a, b| a.1.cmp(b.1));

    let mut seen: HashSet<&str> = HashSet::new();
    let mut table = Table::with_columns(vec![input_name.to_string(), output_name.to_string()]);
    for (input, output) in mapping {
        if seen.insert(input) {
            table.push_row(input, vec![Scalar::from(input), Scalar::from(output)])?;
        }
    }
    Ok(table)
}

/// Returns the mapped ID of every input as `(input, output)` pairs
///
/// Convenience accessor for tables built by [`parse_mapping_response`]
pub fn mapped_pairs(table: &Table) -> Vec<(&str, &str)> {
    table
        .rows()
        .filter_map(|row| match row.values() {
            [Scalar::Str(input), Scalar::Str(output)] => Some((input.as_str(), output.as_str())),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_id_types() {
        let request = IdMapping::new(vec!["P0A9Q1".to_string()]);
        assert_eq!(
            request.form_body(),
            "from=ACC%2BID&to=P_REFSEQ_AC&format=tab&query=P0A9Q1"
        );
        assert_eq!(request.proteins(), &["P0A9Q1"]);
    }

    #[test]
    fn custom_id_types() {
        let request = IdMapping::new(["b0001"]).input_type("ID").output_type("ACC");
        assert_eq!(request.form_body(), "from=ID&to=ACC&format=tab&query=b0001");
    }

    #[test]
    fn parse_response() {
        let response = "From\tTo\r\nP2\tNP_3\r\nP1\tNP_2\r\nP2\tNP_1\r\n\r\n";
        let table = parse_mapping_response(response, "uniprot_id", "refseq").unwrap();
        assert_eq!(table.columns(), &["uniprot_id", "refseq"]);
        assert_eq!(table.index(), &["P2", "P1"]);
        assert_eq!(mapped_pairs(&table), vec![("P2", "NP_1"), ("P1", "NP_2")]);
    }

    #[test]
    fn header_only() {
        let table = parse_mapping_response("From\tTo\n", "a", "b").unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn malformed_line() {
        assert!(parse_mapping_response("From\tTo\nP1\n", "a", "b").is_err());
    }
}
