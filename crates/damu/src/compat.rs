//! Red cell compatibility and population facts per blood type.

use crate::protocol::BloodType;
use serde::Serialize;
use std::fmt;

impl BloodType {
    fn has_a(self) -> bool {
        matches!(
            self,
            BloodType::APositive | BloodType::ANegative | BloodType::AbPositive | BloodType::AbNegative
        )
    }

    fn has_b(self) -> bool {
        matches!(
            self,
            BloodType::BPositive | BloodType::BNegative | BloodType::AbPositive | BloodType::AbNegative
        )
    }

    pub fn is_rh_positive(self) -> bool {
        matches!(
            self,
            BloodType::APositive | BloodType::BPositive | BloodType::AbPositive | BloodType::OPositive
        )
    }

    /// Red cell antigens present.
    pub fn antigens(self) -> Vec<&'static str> {
        [(self.has_a(), "A"), (self.has_b(), "B"), (self.is_rh_positive(), "Rh")]
            .into_iter()
            .filter_map(|(present, name)| present.then_some(name))
            .collect()
    }

    /// Antibodies in plasma.
    pub fn antibodies(self) -> Vec<&'static str> {
        [(!self.has_a(), "Anti-A"), (!self.has_b(), "Anti-B")]
            .into_iter()
            .filter_map(|(present, name)| present.then_some(name))
            .collect()
    }

    /// Whether red cells from `self` can be transfused into `recipient`:
    /// every donor antigen must already be present in the recipient.
    pub fn can_donate_to(self, recipient: BloodType) -> bool {
        (!self.has_a() || recipient.has_a())
            && (!self.has_b() || recipient.has_b())
            && (!self.is_rh_positive() || recipient.is_rh_positive())
    }

    pub fn recipients(self) -> Vec<BloodType> {
        BloodType::ALL
            .into_iter()
            .filter(|r| self.can_donate_to(*r))
            .collect()
    }

    pub fn donors(self) -> Vec<BloodType> {
        BloodType::ALL
            .into_iter()
            .filter(|d| d.can_donate_to(self))
            .collect()
    }

    /// Approximate share of the population with this type, in percent.
    pub fn prevalence_percent(self) -> f32 {
        match self {
            BloodType::OPositive => 38.0,
            BloodType::APositive => 34.0,
            BloodType::BPositive => 9.0,
            BloodType::ONegative => 7.0,
            BloodType::ANegative => 6.0,
            BloodType::AbPositive => 3.0,
            BloodType::BNegative => 2.0,
            BloodType::AbNegative => 1.0,
        }
    }

    pub fn insight(self) -> &'static str {
        match self {
            BloodType::APositive => {
                "A common blood type. A+ individuals can receive blood from a large pool of donors."
            }
            BloodType::ANegative => {
                "Can be given to both A and AB patients, making it quite versatile."
            }
            BloodType::BPositive => {
                "More common in some Asian populations compared to Western populations."
            }
            BloodType::BNegative => "A relatively rare and valuable blood type.",
            BloodType::AbPositive => {
                "Known as the \"universal recipient\" because they can receive red blood cells from any ABO/Rh type."
            }
            BloodType::AbNegative => {
                "The rarest blood type. AB- plasma is universal and can be given to anyone."
            }
            BloodType::OPositive => {
                "The most common blood type, making it critical for routine transfusions."
            }
            BloodType::ONegative => {
                "Known as the \"universal donor\". O- blood is used in emergencies when the patient's blood type is unknown."
            }
        }
    }
}

/// Everything known about one blood type, ready to print or serialize.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompatibilityProfile {
    pub blood_type: BloodType,
    pub antigens: Vec<&'static str>,
    pub antibodies: Vec<&'static str>,
    pub can_donate_to: Vec<BloodType>,
    pub can_receive_from: Vec<BloodType>,
    pub prevalence_percent: f32,
    pub insight: &'static str,
}

pub fn profile(blood_type: BloodType) -> CompatibilityProfile {
    CompatibilityProfile {
        blood_type,
        antigens: blood_type.antigens(),
        antibodies: blood_type.antibodies(),
        can_donate_to: blood_type.recipients(),
        can_receive_from: blood_type.donors(),
        prevalence_percent: blood_type.prevalence_percent(),
        insight: blood_type.insight(),
    }
}

/// How hard a blood product is to keep in stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Scarcity {
    Medium,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
}

impl fmt::Display for Scarcity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Scarcity::Medium => "Medium",
            Scarcity::High => "High",
            Scarcity::VeryHigh => "Very High",
        })
    }
}

/// One row of the scarcity and demand index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScarcityEntry {
    pub component: &'static str,
    pub availability: &'static str,
    pub scarcity: Scarcity,
    pub note: &'static str,
}

/// Blood products ordered from scarcest to least scarce.
pub const SCARCITY_INDEX: [ScarcityEntry; 5] = [
    ScarcityEntry {
        component: "O- Blood",
        availability: "7% Prevalence",
        scarcity: Scarcity::VeryHigh,
        note: "Universal donor for red cells, always in demand.",
    },
    ScarcityEntry {
        component: "AB Plasma",
        availability: "4% Prevalence (AB+ & AB-)",
        scarcity: Scarcity::VeryHigh,
        note: "Universal donor for plasma.",
    },
    ScarcityEntry {
        component: "Platelets",
        availability: "All types",
        scarcity: Scarcity::High,
        note: "Short shelf life (5 days), constant need.",
    },
    ScarcityEntry {
        component: "B- Blood",
        availability: "2% Prevalence",
        scarcity: Scarcity::High,
        note: "Needed by B and AB patients.",
    },
    ScarcityEntry {
        component: "O+ Blood",
        availability: "38% Prevalence",
        scarcity: Scarcity::Medium,
        note: "High demand due to being most common type.",
    },
];
