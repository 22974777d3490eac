//! Reference vocabulary store.
//!
//! # Responsibility
//! - Define the fixed code→label tables used to annotate catalog entries and
//!   relationships (association types, evidence, onset, frequency bands,
//!   prevalence dimensions).
//! - Provide pure decode/parse lookups over those tables.
//!
//! # Invariants
//! - Vocabularies are process-wide static data; they are never persisted as
//!   rows and never mutated at runtime.
//! - The raw code is the persisted form; labels are display-time decodes.

use serde::{Deserialize, Serialize};

/// Curation status carried by every relationship record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationStatus {
    #[serde(rename = "U")]
    Unknown,
    #[serde(rename = "V")]
    Validated,
    #[serde(rename = "P")]
    Pending,
}

impl RelationStatus {
    pub const ALL: &'static [Self] = &[Self::Unknown, Self::Validated, Self::Pending];

    pub fn code(self) -> &'static str {
        match self {
            Self::Unknown => "U",
            Self::Validated => "V",
            Self::Pending => "P",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Validated => "Validated",
            Self::Pending => "Pending",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|item| item.code() == code)
    }
}

impl Default for RelationStatus {
    fn default() -> Self {
        Self::Unknown
    }
}

/// Orphanet disease–gene association typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeneAssociationType {
    #[serde(rename = "Orphanet_317343")]
    GermlineMutation,
    #[serde(rename = "Orphanet_317344")]
    SomaticMutation,
    #[serde(rename = "Orphanet_317345")]
    SusceptibilityFactor,
    #[serde(rename = "Orphanet_317346")]
    ModifyingGermlineMutation,
    #[serde(rename = "Orphanet_317348")]
    FusionGene,
    #[serde(rename = "Orphanet_317349")]
    RoleInPhenotype,
    #[serde(rename = "Orphanet_327767")]
    CandidateGene,
    #[serde(rename = "Orphanet_410295")]
    GermlineLossOfFunction,
    #[serde(rename = "Orphanet_410296")]
    GermlineGainOfFunction,
    #[serde(rename = "Orphanet_465410")]
    Biomarker,
}

impl GeneAssociationType {
    pub const ALL: &'static [Self] = &[
        Self::GermlineMutation,
        Self::SomaticMutation,
        Self::SusceptibilityFactor,
        Self::ModifyingGermlineMutation,
        Self::FusionGene,
        Self::RoleInPhenotype,
        Self::CandidateGene,
        Self::GermlineLossOfFunction,
        Self::GermlineGainOfFunction,
        Self::Biomarker,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Self::GermlineMutation => "Orphanet_317343",
            Self::SomaticMutation => "Orphanet_317344",
            Self::SusceptibilityFactor => "Orphanet_317345",
            Self::ModifyingGermlineMutation => "Orphanet_317346",
            Self::FusionGene => "Orphanet_317348",
            Self::RoleInPhenotype => "Orphanet_317349",
            Self::CandidateGene => "Orphanet_327767",
            Self::GermlineLossOfFunction => "Orphanet_410295",
            Self::GermlineGainOfFunction => "Orphanet_410296",
            Self::Biomarker => "Orphanet_465410",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::GermlineMutation => "disease-causing germline mutation(s) in",
            Self::SomaticMutation => "disease-causing somatic mutation(s) in",
            Self::SusceptibilityFactor => "major susceptibility factor in",
            Self::ModifyingGermlineMutation => "modifying germline mutation in",
            Self::FusionGene => "part of a fusion gene in",
            Self::RoleInPhenotype => "role in the phenotype of",
            Self::CandidateGene => "candidate gene tested in",
            Self::GermlineLossOfFunction => {
                "disease-causing germline mutation(s) (loss of function) in"
            }
            Self::GermlineGainOfFunction => {
                "disease-causing germline mutation(s) (gain of function) in"
            }
            Self::Biomarker => "biomarker tested in",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|item| item.code() == code)
    }
}

/// HPO annotation evidence codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Evidence {
    #[serde(rename = "PCS")]
    PublishedClinicalStudy,
    #[serde(rename = "IEA")]
    InferredFromElectronicAnnotation,
    #[serde(rename = "TAS")]
    TraceableAuthorStatement,
}

impl Evidence {
    pub const ALL: &'static [Self] = &[
        Self::PublishedClinicalStudy,
        Self::InferredFromElectronicAnnotation,
        Self::TraceableAuthorStatement,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Self::PublishedClinicalStudy => "PCS",
            Self::InferredFromElectronicAnnotation => "IEA",
            Self::TraceableAuthorStatement => "TAS",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::PublishedClinicalStudy => "Published clinical study (PCS)",
            Self::InferredFromElectronicAnnotation => {
                "Inferred from electronic annotation (IEA)"
            }
            Self::TraceableAuthorStatement => "Traceable author statement (TAS)",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|item| item.code() == code)
    }
}

/// Sex qualifier on phenotype annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
    #[serde(rename = "X")]
    Unknown,
}

impl Sex {
    pub const ALL: &'static [Self] = &[Self::Male, Self::Female, Self::Unknown];

    pub fn code(self) -> &'static str {
        match self {
            Self::Male => "M",
            Self::Female => "F",
            Self::Unknown => "X",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
            Self::Unknown => "Unknown",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|item| item.code() == code)
    }
}

/// HPO annotation aspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Aspect {
    #[serde(rename = "P")]
    PhenotypicAbnormality,
    #[serde(rename = "I")]
    Inheritance,
    #[serde(rename = "C")]
    OnsetAndClinicalCourse,
}

impl Aspect {
    pub const ALL: &'static [Self] = &[
        Self::PhenotypicAbnormality,
        Self::Inheritance,
        Self::OnsetAndClinicalCourse,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Self::PhenotypicAbnormality => "P",
            Self::Inheritance => "I",
            Self::OnsetAndClinicalCourse => "C",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::PhenotypicAbnormality => "Phenotypic abnormality",
            Self::Inheritance => "Inheritance",
            Self::OnsetAndClinicalCourse => "Onset and clinical course",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|item| item.code() == code)
    }
}

impl Default for Aspect {
    fn default() -> Self {
        Self::PhenotypicAbnormality
    }
}

/// HPO onset codes, see https://hpo.jax.org/app/help/annotations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Onset {
    #[serde(rename = "HP:0030674")]
    Antenatal,
    #[serde(rename = "HP:0003623")]
    Neonatal,
    #[serde(rename = "HP:0011461")]
    Fetal,
    #[serde(rename = "HP:0011460")]
    Embryonal,
    #[serde(rename = "HP:0003577")]
    Congenital,
    #[serde(rename = "HP:0410280")]
    Pediatric,
    #[serde(rename = "HP:0003593")]
    Infantile,
    #[serde(rename = "HP:0011463")]
    Childhood,
    #[serde(rename = "HP:0003621")]
    Juvenile,
    #[serde(rename = "HP:0003581")]
    Adult,
    #[serde(rename = "HP:0011462")]
    YoungAdult,
    #[serde(rename = "HP:0003596")]
    MiddleAge,
    #[serde(rename = "HP:0003584")]
    Late,
}

impl Onset {
    pub const ALL: &'static [Self] = &[
        Self::Antenatal,
        Self::Neonatal,
        Self::Fetal,
        Self::Embryonal,
        Self::Congenital,
        Self::Pediatric,
        Self::Infantile,
        Self::Childhood,
        Self::Juvenile,
        Self::Adult,
        Self::YoungAdult,
        Self::MiddleAge,
        Self::Late,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Self::Antenatal => "HP:0030674",
            Self::Neonatal => "HP:0003623",
            Self::Fetal => "HP:0011461",
            Self::Embryonal => "HP:0011460",
            Self::Congenital => "HP:0003577",
            Self::Pediatric => "HP:0410280",
            Self::Infantile => "HP:0003593",
            Self::Childhood => "HP:0011463",
            Self::Juvenile => "HP:0003621",
            Self::Adult => "HP:0003581",
            Self::YoungAdult => "HP:0011462",
            Self::MiddleAge => "HP:0003596",
            Self::Late => "HP:0003584",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Antenatal => "Antenatal onset (prior to birth)",
            Self::Neonatal => "Neonatal onset (within the first 28 days of life)",
            Self::Fetal => "Fetal onset (prior to birth but after 8 weeks of gestation)",
            Self::Embryonal => "Embryonal onset (up to 8 weeks of gestation)",
            Self::Congenital => "Congenital onset (present at birth)",
            Self::Pediatric => {
                "Pediatric onset (before the age of 16 years, but excluding neonatal or congenital onset)"
            }
            Self::Infantile => "Infantile onset (between 28 days to one year of life)",
            Self::Childhood => "Childhood onset (age of between 1 and 5 years)",
            Self::Juvenile => "Juvenile onset (between the age of 5 and 15 years)",
            Self::Adult => "Adult onset (age of 16 years or later)",
            Self::YoungAdult => "Young adult onset (age between 16 and 40 years)",
            Self::MiddleAge => "Middle age onset (age between 40 and 60 years)",
            Self::Late => "Late onset (after age of 60 years)",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|item| item.code() == code)
    }
}

/// HPO-coded frequency bands used by `Frequency.value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrequencyBand {
    #[serde(rename = "HP:0040280")]
    Obligate,
    #[serde(rename = "HP:0040281")]
    VeryFrequent,
    #[serde(rename = "HP:0040282")]
    Frequent,
    #[serde(rename = "HP:0040283")]
    Occasional,
    #[serde(rename = "HP:0040284")]
    VeryRare,
    #[serde(rename = "HP:0040285")]
    Excluded,
}

impl FrequencyBand {
    pub const ALL: &'static [Self] = &[
        Self::Obligate,
        Self::VeryFrequent,
        Self::Frequent,
        Self::Occasional,
        Self::VeryRare,
        Self::Excluded,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Self::Obligate => "HP:0040280",
            Self::VeryFrequent => "HP:0040281",
            Self::Frequent => "HP:0040282",
            Self::Occasional => "HP:0040283",
            Self::VeryRare => "HP:0040284",
            Self::Excluded => "HP:0040285",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Obligate => "Obligate (always present, i.e., in 100% of the cases)",
            Self::VeryFrequent => "Very frequent (present in 80% to 99% of the cases)",
            Self::Frequent => "Frequent (present in 30% to 79% of the cases)",
            Self::Occasional => "Occasional (present in 5% to 29% of the cases)",
            Self::VeryRare => "Very rare (present in 1% to 4% of the cases)",
            Self::Excluded => "Excluded (present in 0% of the cases)",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|item| item.code() == code)
    }
}

/// Kind of prevalence statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrevalenceType {
    #[serde(rename = "C")]
    CasesFamilies,
    #[serde(rename = "P")]
    Point,
    #[serde(rename = "A")]
    AnnualIncidence,
    #[serde(rename = "B")]
    AtBirth,
    #[serde(rename = "L")]
    Lifetime,
}

impl PrevalenceType {
    pub const ALL: &'static [Self] = &[
        Self::CasesFamilies,
        Self::Point,
        Self::AnnualIncidence,
        Self::AtBirth,
        Self::Lifetime,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Self::CasesFamilies => "C",
            Self::Point => "P",
            Self::AnnualIncidence => "A",
            Self::AtBirth => "B",
            Self::Lifetime => "L",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::CasesFamilies => "Cases/families",
            Self::Point => "Point prevalence",
            Self::AnnualIncidence => "Annual incidence",
            Self::AtBirth => "Prevalence at birth",
            Self::Lifetime => "Lifetime Prevalence",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|item| item.code() == code)
    }
}

impl Default for PrevalenceType {
    fn default() -> Self {
        Self::Point
    }
}

/// How the prevalence figure is qualified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrevalenceQualification {
    #[serde(rename = "S")]
    Case,
    #[serde(rename = "V")]
    ValueAndClass,
    #[serde(rename = "C")]
    ClassOnly,
    #[serde(rename = "F")]
    Family,
}

impl PrevalenceQualification {
    pub const ALL: &'static [Self] = &[
        Self::Case,
        Self::ValueAndClass,
        Self::ClassOnly,
        Self::Family,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Self::Case => "S",
            Self::ValueAndClass => "V",
            Self::ClassOnly => "C",
            Self::Family => "F",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Case => "Case",
            Self::ValueAndClass => "Value and class",
            Self::ClassOnly => "Class only",
            Self::Family => "Family",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|item| item.code() == code)
    }
}

impl Default for PrevalenceQualification {
    fn default() -> Self {
        Self::ValueAndClass
    }
}

/// Coarse prevalence class band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrevalenceClass {
    #[serde(rename = "A")]
    OverOnePerThousand,
    #[serde(rename = "B")]
    UnderOnePerMillion,
    #[serde(rename = "C")]
    OneToFivePerTenThousand,
    #[serde(rename = "D")]
    OneToNinePerMillion,
    #[serde(rename = "E")]
    OneToNinePerHundredThousand,
    #[serde(rename = "F")]
    SixToNinePerTenThousand,
    #[serde(rename = "X")]
    NotYetDocumented,
    #[serde(rename = "U")]
    Unknown,
}

impl PrevalenceClass {
    pub const ALL: &'static [Self] = &[
        Self::OverOnePerThousand,
        Self::UnderOnePerMillion,
        Self::OneToFivePerTenThousand,
        Self::OneToNinePerMillion,
        Self::OneToNinePerHundredThousand,
        Self::SixToNinePerTenThousand,
        Self::NotYetDocumented,
        Self::Unknown,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Self::OverOnePerThousand => "A",
            Self::UnderOnePerMillion => "B",
            Self::OneToFivePerTenThousand => "C",
            Self::OneToNinePerMillion => "D",
            Self::OneToNinePerHundredThousand => "E",
            Self::SixToNinePerTenThousand => "F",
            Self::NotYetDocumented => "X",
            Self::Unknown => "U",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::OverOnePerThousand => ">1 / 1000",
            Self::UnderOnePerMillion => "<1 / 1 000 000",
            Self::OneToFivePerTenThousand => "1-5 / 10 000",
            Self::OneToNinePerMillion => "1-9 / 1 000 000",
            Self::OneToNinePerHundredThousand => "1-9 / 100 000",
            Self::SixToNinePerTenThousand => "6-9 / 10 000",
            Self::NotYetDocumented => "Not yet documented",
            Self::Unknown => "Unknown",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|item| item.code() == code)
    }
}

impl Default for PrevalenceClass {
    fn default() -> Self {
        Self::OneToNinePerMillion
    }
}

/// Validation state of a prevalence statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrevalenceStatus {
    #[serde(rename = "A")]
    Validated,
    #[serde(rename = "B")]
    NotYetValidated,
}

impl PrevalenceStatus {
    pub const ALL: &'static [Self] = &[Self::Validated, Self::NotYetValidated];

    pub fn code(self) -> &'static str {
        match self {
            Self::Validated => "A",
            Self::NotYetValidated => "B",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Validated => "Validated",
            Self::NotYetValidated => "Not yet validated",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|item| item.code() == code)
    }
}

impl Default for PrevalenceStatus {
    fn default() -> Self {
        Self::Validated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frequency_band_decodes_to_exact_labels() {
        assert_eq!(
            FrequencyBand::parse("HP:0040282").unwrap().label(),
            "Frequent (present in 30% to 79% of the cases)"
        );
        assert_eq!(
            FrequencyBand::Obligate.label(),
            "Obligate (always present, i.e., in 100% of the cases)"
        );
    }

    #[test]
    fn all_vocabularies_round_trip_through_codes() {
        for item in GeneAssociationType::ALL {
            assert_eq!(GeneAssociationType::parse(item.code()), Some(*item));
        }
        for item in Onset::ALL {
            assert_eq!(Onset::parse(item.code()), Some(*item));
        }
        for item in FrequencyBand::ALL {
            assert_eq!(FrequencyBand::parse(item.code()), Some(*item));
        }
        for item in PrevalenceClass::ALL {
            assert_eq!(PrevalenceClass::parse(item.code()), Some(*item));
        }
    }

    #[test]
    fn unknown_codes_parse_to_none() {
        assert_eq!(RelationStatus::parse("Z"), None);
        assert_eq!(Evidence::parse("XYZ"), None);
        assert_eq!(Onset::parse("HP:9999999"), None);
    }

    #[test]
    fn serde_uses_raw_codes() {
        let json = serde_json::to_string(&GeneAssociationType::Biomarker).unwrap();
        assert_eq!(json, "\"Orphanet_465410\"");
        let parsed: Onset = serde_json::from_str("\"HP:0003581\"").unwrap();
        assert_eq!(parsed, Onset::Adult);
    }

    #[test]
    fn table_sizes_match_the_published_vocabularies() {
        assert_eq!(GeneAssociationType::ALL.len(), 10);
        assert_eq!(Evidence::ALL.len(), 3);
        assert_eq!(Onset::ALL.len(), 13);
        assert_eq!(FrequencyBand::ALL.len(), 6);
        assert_eq!(PrevalenceType::ALL.len(), 5);
        assert_eq!(PrevalenceQualification::ALL.len(), 4);
        assert_eq!(PrevalenceClass::ALL.len(), 8);
        assert_eq!(PrevalenceStatus::ALL.len(), 2);
    }
}
