//! Read-time display projections for admin-facing listings.
//!
//! # Responsibility
//! - Assemble the denormalized link views shown on entity detail pages.
//! - Apply the reverse-disease truncation policy.
//!
//! # Invariants
//! - Truncation caps entries at `DISEASE_DISPLAY_LIMIT`; the heading always
//!   reports the untruncated total as `"N disease(s)"`.
//! - These are display policies, not storage limits.

use crate::model::prevalence::Prevalence;
use crate::repo::{GeneLink, TermLink};
use serde::Serialize;

/// Maximum linked entries shown on reverse-disease listings. Fixed policy
/// constant; not derived from stored configuration.
pub const DISEASE_DISPLAY_LIMIT: usize = 5;

/// Truncated reverse listing of the diseases linked to a gene, phenotype or
/// inheritance entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiseaseListing {
    /// Untruncated association count.
    pub total: usize,
    /// At most `DISEASE_DISPLAY_LIMIT` linked entries.
    pub entries: Vec<TermLink>,
}

impl DiseaseListing {
    /// Heading line shown above the entries, e.g. `7 disease(s)`.
    pub fn heading(&self) -> String {
        format!("{} disease(s)", self.total)
    }
}

/// Builds the truncated reverse-disease listing from the full link set.
pub fn disease_listing(links: Vec<TermLink>) -> DiseaseListing {
    let total = links.len();
    let entries = links
        .into_iter()
        .take(DISEASE_DISPLAY_LIMIT)
        .collect::<Vec<_>>();
    DiseaseListing { total, entries }
}

/// Linked-entry display text: `label (cui)`.
pub fn link_text(link: &TermLink) -> String {
    format!("{} ({})", link.label, link.cui)
}

/// Denormalized disease detail view: genes, phenotypes, inheritance and
/// epidemiology resolved through the relationship layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiseaseDetail {
    pub genes: Vec<GeneLink>,
    pub phenotypes: Vec<TermLink>,
    pub inheritance: Vec<TermLink>,
    /// Decoded `type, class` entries, one per attached prevalence record.
    pub epidemiology: Vec<String>,
}

/// Assembles the disease detail view from resolved link sets.
pub fn disease_detail(
    genes: Vec<GeneLink>,
    phenotypes: Vec<TermLink>,
    inheritance: Vec<TermLink>,
    epidemiology: &[Prevalence],
) -> DiseaseDetail {
    DiseaseDetail {
        genes,
        phenotypes,
        inheritance,
        epidemiology: epidemiology.iter().map(Prevalence::summary).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn link(label: &str, cui: &str) -> TermLink {
        TermLink {
            uuid: Uuid::new_v4(),
            cui: cui.to_string(),
            label: label.to_string(),
        }
    }

    #[test]
    fn listing_truncates_to_five_and_reports_the_full_count() {
        let links = (0..7)
            .map(|i| link(&format!("disease {i}"), &format!("Orphanet:{i}")))
            .collect::<Vec<_>>();
        let listing = disease_listing(links);
        assert_eq!(listing.heading(), "7 disease(s)");
        assert_eq!(listing.entries.len(), 5);
        assert_eq!(listing.total, 7);
    }

    #[test]
    fn listing_below_the_cap_is_not_padded() {
        let listing = disease_listing(vec![link("one", "Orphanet:1")]);
        assert_eq!(listing.heading(), "1 disease(s)");
        assert_eq!(listing.entries.len(), 1);
    }

    #[test]
    fn link_text_formats_label_and_cui() {
        let entry = link("Marfan syndrome", "Orphanet:558");
        assert_eq!(link_text(&entry), "Marfan syndrome (Orphanet:558)");
    }
}
