//! The collected snapshot handed to the renderer.
//!
//! `collect` is a pure projection of the form state and the two signature
//! pads; it mutates nothing and is rebuilt on every render request.

use crate::error::Result;
use crate::form::{FormState, INFESTATION_LEVEL_UNKNOWN};
use crate::signature::SignaturePad;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PestInfestation {
    pub pest: String,
    pub level: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChemicalUsage {
    pub name: String,
    pub quantity: String,
}

/// Consent taken over the phone instead of a drawn signature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhoneConsent {
    pub client_name: String,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormRecord {
    pub protocol_number: String,
    pub intervention_place: String,
    pub intervention_date: String,

    pub customer: String,
    pub ico: String,
    pub address: String,

    pub client_name: String,
    pub client_phone: String,
    pub client_email: String,

    pub intervention_type: Option<String>,
    pub other_intervention_type_spec: String,
    pub work_types: Vec<String>,
    pub other_work_type_spec: String,
    pub pests: Vec<String>,
    pub other_pests_spec: String,
    pub no_pests: bool,
    pub pest_infestations: Vec<PestInfestation>,
    pub further_intervention: Option<String>,
    pub biocide_agreement: Option<String>,
    pub bait_left_in_stations: Option<String>,

    pub chemicals: Vec<ChemicalUsage>,

    pub recommended_actions: Vec<String>,
    pub other_recommendation_spec: String,
    pub safety_measures: Vec<String>,
    pub other_safety_spec: String,

    pub survey_name: String,
    pub client_signature: Option<String>,
    pub survey_signature: Option<String>,
    pub phone_consent: Option<PhoneConsent>,
}

/// Czech short date: `15. 3. 2025`.
pub fn format_date_cs(date: NaiveDate) -> String {
    format!("{}. {}. {}", date.day(), date.month(), date.year())
}

/// Assemble the record. Signatures contribute only when non-empty; a checked
/// phone-signature replaces the drawn client signature with a dated consent.
pub fn collect(
    form: &FormState,
    client_pad: &SignaturePad,
    survey_pad: &SignaturePad,
    today: NaiveDate,
) -> Result<FormRecord> {
    let phone_consent = form.phone_signature.then(|| PhoneConsent {
        client_name: form.client_name.clone(),
        date: format_date_cs(today),
    });

    let client_signature = if form.phone_signature {
        None
    } else {
        client_pad.to_image()?
    };
    let survey_signature = survey_pad.to_image()?;

    let pest_infestations = if form.no_pests {
        Vec::new()
    } else {
        form.pest_rows
            .iter()
            .filter(|row| !row.pest_name.trim().is_empty())
            .map(|row| PestInfestation {
                pest: row.pest_name.trim().to_string(),
                level: row
                    .level
                    .as_deref()
                    .filter(|l| !l.trim().is_empty())
                    .unwrap_or(INFESTATION_LEVEL_UNKNOWN)
                    .to_string(),
            })
            .collect()
    };

    let chemicals = form
        .chemicals
        .iter()
        .filter(|c| !c.name.trim().is_empty())
        .map(|c| ChemicalUsage {
            name: c.name.clone(),
            quantity: c.quantity.trim().to_string(),
        })
        .collect();

    // The "other" free texts are only meaningful while their trigger is on.
    let spec_if = |on: bool, text: &str| if on { text.to_string() } else { String::new() };

    Ok(FormRecord {
        protocol_number: form.protocol_number.clone(),
        intervention_place: form.intervention_place.clone(),
        intervention_date: form.intervention_date.clone(),
        customer: form.customer.clone(),
        ico: form.ico.clone(),
        address: form.address.clone(),
        client_name: form.client_name.clone(),
        client_phone: form.client_phone.clone(),
        client_email: form.client_email.clone(),
        intervention_type: form.intervention_type.clone(),
        other_intervention_type_spec: form.other_intervention_type_spec.clone(),
        work_types: form.work_types.clone(),
        other_work_type_spec: spec_if(form.other_work_type, &form.other_work_type_spec),
        pests: form.pests.clone(),
        other_pests_spec: spec_if(form.other_pests, &form.other_pests_spec),
        no_pests: form.no_pests,
        pest_infestations,
        further_intervention: form.further_intervention.clone(),
        biocide_agreement: form.biocide_agreement.clone(),
        bait_left_in_stations: form.bait_left_in_stations.clone(),
        chemicals,
        recommended_actions: form.recommended_actions.clone(),
        other_recommendation_spec: spec_if(
            form.other_recommendation,
            &form.other_recommendation_spec,
        ),
        safety_measures: form.safety_measures.clone(),
        other_safety_spec: spec_if(form.other_safety, &form.other_safety_spec),
        survey_name: form.survey_name.clone(),
        client_signature,
        survey_signature,
        phone_consent,
    })
}
