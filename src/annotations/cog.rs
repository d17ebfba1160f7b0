//! Clusters of Orthologous Groups (COG) functional categories
use crate::{ModulonError, ModulonResult};

/// Returns the description of a COG category letter
///
/// # Errors
///
/// [`ModulonError::InvalidInput`] if `category` is not a COG category
///
/// # Examples
///
/// ```
/// use modulon::annotations::cog::cog_description;
///
/// assert_eq!(cog_description('K').unwrap(), "Transcription");
/// assert!(cog_description('1').is_err());
/// ```
pub fn cog_description(category: char) -> ModulonResult<&'static str> {
    let description = match category {
        'A' => "RNA processing and modification",
        'B' => "Chromatin structure and dynamics",
        'C' => "Energy production and conversion",
        'D' => "Cell cycle control, cell division, chromosome partitioning",
        'E' => "Amino acid transport and metabolism",
        'F' => "Nucleotide transport and metabolism",
        'G' => "Carbohydrate transport and metabolism",
        'H' => "Coenzyme transport and metabolism",
        'I' => "Lipid transport and metabolism",
        'J' => "Translation, ribosomal structure and biogenesis",
        'K' => "Transcription",
        'L' => "Replication, recombination and repair",
        'M' => "Cell wall/membrane/envelope biogenesis",
        'N' => "Cell motility",
        'O' => "Post-translational modification, protein turnover, and chaperones",
        'P' => "Inorganic ion transport and metabolism",
        'Q' => "Secondary metabolites biosynthesis, transport, and catabolism",
        'R' => "General function prediction only",
        'S' => "Function unknown",
        'T' => "Signal transduction mechanisms",
        'U' => "Intracellular trafficking, secretion, and vesicular transport",
        'V' => "Defense mechanisms",
        'W' => "Extracellular structures",
        'X' => "No COG annotation",
        'Y' => "Nuclear structure",
        'Z' => "Cytoskeleton",
        _ => {
            return Err(ModulonError::InvalidInput(format!(
                "{category} is not a COG category"
            )))
        }
    };
    Ok(description)
}
