//! Form state of a single protocol.
//!
//! The form is the single source of truth: handlers mutate it, the conditional
//! visibility and the collected record are pure projections of it.

use crate::error::{ProtokolError, Result};
use crate::protocol::ProtocolNumber;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Radio sentinel that reveals the free-text intervention type.
pub const INTERVENTION_TYPE_OTHER: &str = "Jiný";

/// Infestation level used when a pest row leaves the select untouched.
pub const INFESTATION_LEVEL_UNKNOWN: &str = "Neznámý";

/// Offered infestation levels, in form order.
pub const INFESTATION_LEVELS: &[&str] = &["Nízký", "Střední", "Vysoký"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PestRow {
    pub pest_name: String,
    pub level: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChemicalSelection {
    pub name: String,
    pub quantity: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormState {
    pub protocol_number: String,
    pub intervention_place: String,
    /// ISO date (`YYYY-MM-DD`), seeded with today on form load.
    pub intervention_date: String,

    // Odběratel
    pub customer: String,
    pub ico: String,
    pub address: String,

    // Kontakt
    pub client_name: String,
    pub client_phone: String,
    pub client_email: String,

    // Detaily zásahu
    pub intervention_type: Option<String>,
    pub other_intervention_type_spec: String,
    pub work_types: Vec<String>,
    pub other_work_type: bool,
    pub other_work_type_spec: String,
    pub pests: Vec<String>,
    pub other_pests: bool,
    pub other_pests_spec: String,
    pub no_pests: bool,
    pub pest_rows: Vec<PestRow>,
    pub further_intervention: Option<String>,
    pub biocide_agreement: Option<String>,
    pub bait_left_in_stations: Option<String>,

    // Přípravky
    pub chemicals: Vec<ChemicalSelection>,

    // Doporučení a bezpečnost
    pub recommended_actions: Vec<String>,
    pub other_recommendation: bool,
    pub other_recommendation_spec: String,
    pub safety_measures: Vec<String>,
    pub other_safety: bool,
    pub other_safety_spec: String,

    // Podpisy
    pub survey_name: String,
    pub phone_signature: bool,
}

/// Required controls in document order; the first blank one is reported
/// (the UI focuses it and aborts the action).
const REQUIRED_FIELDS: &[(&str, fn(&FormState) -> &str)] = &[
    ("interventionPlace", |f| &f.intervention_place),
    ("interventionDate", |f| &f.intervention_date),
    ("customer", |f| &f.customer),
    ("address", |f| &f.address),
    ("clientName", |f| &f.client_name),
    ("clientEmail", |f| &f.client_email),
];

impl FormState {
    /// Fresh form: issued protocol number, today's date, one blank pest row.
    pub fn seeded(protocol_number: &ProtocolNumber, today: NaiveDate) -> Self {
        Self {
            protocol_number: protocol_number.to_string(),
            intervention_date: today.format("%Y-%m-%d").to_string(),
            pest_rows: vec![PestRow::default()],
            ..Self::default()
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ProtokolError::FileNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        let form: FormState = serde_json::from_str(&content)?;
        Ok(form)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Master "no pests" toggle. Checking it clears the repeatable list;
    /// unchecking over an empty list seeds exactly one blank row.
    pub fn set_no_pests(&mut self, checked: bool) {
        self.no_pests = checked;
        if checked {
            self.pest_rows.clear();
        } else if self.pest_rows.is_empty() {
            self.pest_rows.push(PestRow::default());
        }
    }

    /// Append a blank pest row. Disabled while "no pests" is checked.
    pub fn add_pest_row(&mut self) -> Option<&mut PestRow> {
        if self.no_pests {
            return None;
        }
        self.pest_rows.push(PestRow::default());
        self.pest_rows.last_mut()
    }

    pub fn remove_pest_row(&mut self, index: usize) -> bool {
        if index < self.pest_rows.len() {
            self.pest_rows.remove(index);
            true
        } else {
            false
        }
    }

    /// Pre-dispatch gate: every required control non-blank, first offender
    /// reported.
    pub fn validate(&self) -> Result<()> {
        for (field, getter) in REQUIRED_FIELDS {
            if getter(self).trim().is_empty() {
                return Err(ProtokolError::Validation { field });
            }
        }
        Ok(())
    }
}

/// Visibility of the dependent form regions. Always a deterministic function
/// of the trigger fields, never accumulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visibility {
    pub other_intervention_type_spec: bool,
    pub other_work_type_spec: bool,
    pub other_pests_spec: bool,
    pub other_recommendation_spec: bool,
    pub other_safety_spec: bool,
    pub phone_signature_panel: bool,
    pub pest_rows_enabled: bool,
}

impl Visibility {
    pub fn project(form: &FormState) -> Self {
        Self {
            other_intervention_type_spec: form.intervention_type.as_deref()
                == Some(INTERVENTION_TYPE_OTHER),
            other_work_type_spec: form.other_work_type,
            other_pests_spec: form.other_pests,
            other_recommendation_spec: form.other_recommendation,
            other_safety_spec: form.other_safety,
            phone_signature_panel: form.phone_signature,
            pest_rows_enabled: !form.no_pests,
        }
    }
}
