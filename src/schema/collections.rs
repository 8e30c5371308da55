//! Column layouts of the collections served from pangenome and
//! comparison-genome objects. Column order is part of the on-disk format:
//! reordering fields invalidates every cached table for that suffix.

use crate::schema::schema::{CollectionSchema, IndexHome};

pub const ORTHOLOGS_SUFFIX: &str = "_orthologs";
pub const FAMILIES_SUFFIX: &str = "_families";
pub const FUNCTIONS_SUFFIX: &str = "_functions";
pub const COMPARISON_GENOMES_SUFFIX: &str = "_comparison_genomes";

/// Ortholog families of a pangenome
pub fn orthologs() -> CollectionSchema {
    CollectionSchema::new("orthologs", ORTHOLOGS_SUFFIX, IndexHome::Pangenome)
        .add_text_field("id")
        .add_text_field("type")
        .add_text_field("function")
        .add_text_field("md5")
        .add_text_field("protein_translation")
        .add_text_field("orthologs")
}

/// Protein families of a comparison genome
pub fn families() -> CollectionSchema {
    CollectionSchema::new("families", FAMILIES_SUFFIX, IndexHome::ComparisonGenome)
        .add_text_field("core")
        .add_text_field("genome_features")
        .add_text_field("id")
        .add_text_field("type")
        .add_text_field("protein_translation")
        .add_numeric_field("number_genomes")
        .add_numeric_field("fraction_genomes")
        .add_numeric_field("fraction_consistent_annotations")
        .add_text_field("most_consistent_role")
}

/// Functional roles of a comparison genome
pub fn functions() -> CollectionSchema {
    CollectionSchema::new("functions", FUNCTIONS_SUFFIX, IndexHome::ComparisonGenome)
        .add_text_field("core")
        .add_text_field("genome_features")
        .add_text_field("id")
        .add_text_field("reactions")
        .add_text_field("subsystem")
        .add_text_field("primclass")
        .add_text_field("subclass")
        .add_numeric_field("number_genomes")
        .add_numeric_field("fraction_genomes")
        .add_numeric_field("fraction_consistent_families")
        .add_text_field("most_consistent_family")
}

/// Member genomes of a comparison genome
pub fn comparison_genomes() -> CollectionSchema {
    CollectionSchema::new("genomes", COMPARISON_GENOMES_SUFFIX, IndexHome::ComparisonGenome)
        .add_text_field("id")
        .add_text_field("genome_ref")
        .add_text_field("genome_similarity")
        .add_text_field("name")
        .add_text_field("taxonomy")
        .add_numeric_field("features")
        .add_numeric_field("families")
        .add_numeric_field("functions")
}

/// Look a built-in collection up by its record array name or CLI alias.
pub fn by_name(name: &str) -> Option<CollectionSchema> {
    match name {
        "orthologs" => Some(orthologs()),
        "families" => Some(families()),
        "functions" => Some(functions()),
        "genomes" | "comparison_genomes" => Some(comparison_genomes()),
        _ => None,
    }
}

pub fn all() -> Vec<CollectionSchema> {
    vec![orthologs(), families(), functions(), comparison_genomes()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::schema::SortKeyType;

    #[test]
    fn suffixes_are_distinct() {
        let mut suffixes: Vec<String> = all().into_iter().map(|s| s.suffix).collect();
        suffixes.sort();
        suffixes.dedup();
        assert_eq!(suffixes.len(), 4);
    }

    #[test]
    fn families_sort_counts_numerically() {
        let schema = families();
        assert_eq!(schema.column("number_genomes").unwrap(), (6, SortKeyType::Numeric));
        assert_eq!(schema.column("id").unwrap(), (3, SortKeyType::Text));
    }

    #[test]
    fn genomes_alias_resolves() {
        assert_eq!(by_name("comparison_genomes").unwrap().name, "genomes");
        assert!(by_name("contigs").is_none());
    }
}
