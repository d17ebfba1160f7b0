//! Gene annotations that end up in the tables of an [`IcaData`](`crate::IcaData`) model
//!
//! - [`gff`]: builds the gene table from a GFF3 file
//! - [`cog`]: describes COG functional categories
//! - [`id_mapping`]: maps protein IDs through the UniProt mapping service

pub mod cog;
pub mod gff;
pub mod id_mapping;
