//! Protocol document rendering.
//!
//! Produces the fixed one-page A4 layout of the paper protocol as a complete
//! styled HTML document. Every optional value degrades to an empty string.
//! User-supplied text is HTML-escaped before interpolation.

use crate::photos::Photo;
use crate::record::FormRecord;
use chrono::NaiveDate;

/// Pre-supplied technician signature shipped next to the generated document.
const TECHNICIAN_SIGNATURE_SRC: &str = "podpis.png";
const TECHNICIAN_NAME: &str = "Tomáš Šmídek";

const LEGAL_NOTICE: &str = "Odběratel potvrzuje, že výše uvedené práce byly řádně \
provedeny a že byl poučen o možném nebezpečí plynoucím z provedených prací včetně \
následků zneužití nebo znehodnocení použitých přípravků. Poučení zahrnuje rovněž \
bezpečnostní opatření po ukončení práce. Při likvidaci škůdce vyžadující dva zásahy \
poskytujeme záruku až po 2. zásahu. Záruku poskytujeme pouze v případě dodržení \
všech našich pokynů.";

/// Inline stylesheet of the protocol document, shared with the print shell.
pub const PROTOCOL_CSS: &str = r#"
    body {
        font-family: Arial, sans-serif;
        font-size: 11px;
        line-height: 1.3;
        color: #000;
        margin: 0 auto;
        width: 100%;
        box-sizing: border-box;
        background: white;
    }
    .header {
        text-align: center;
        margin-bottom: 8px;
        padding-bottom: 8px;
        border-bottom: 2px solid #333;
    }
    .header h1 {
        font-size: 18px;
        margin: 0 0 5px 0;
        color: #2c5282;
        font-weight: bold;
    }
    .header h2 {
        font-size: 14px;
        margin: 0 0 7px 0;
        color: #4a5568;
        font-weight: normal;
    }
    .section {
        margin-bottom: 8px;
        page-break-inside: avoid;
    }
    .section h3 {
        background: #2c5282;
        color: white;
        padding: 4px 8px;
        margin: 0 0 6px 0;
        font-size: 10px;
        font-weight: bold;
        border-radius: 2px;
    }
    .two-columns {
        display: flex;
        gap: 10px;
        margin-bottom: 8px;
    }
    .column {
        flex: 1;
    }
    .compact-table {
        width: 100%;
        border-collapse: collapse;
        font-size: 10px;
    }
    .compact-table tr {
        border-bottom: 1px solid #eee;
    }
    .compact-table td {
        padding: 2px 4px;
        vertical-align: top;
    }
    .compact-table tr td:first-child {
        width: 40%;
        font-weight: bold;
    }
    .checkbox-list {
        margin: 4px 0;
        font-size: 10px;
    }
    .recommendations {
        background: #f0f9ff;
        padding: 6px;
        border-radius: 3px;
        border-left: 3px solid #3182ce;
        font-size: 10px;
        margin-top: 4px;
    }
    .signature-section {
        margin-top: 12px;
        padding-top: 8px;
        border-top: 1px solid #ccc;
        page-break-inside: avoid;
    }
    .signature-container {
        display: flex;
        justify-content: space-between;
        align-items: flex-end;
        margin-top: 8px;
    }
    .signature-box {
        text-align: center;
        flex: 1;
        margin: 0 5px;
        min-height: 60px;
    }
    .signature-label {
        margin-bottom: 4px;
        font-weight: bold;
        font-size: 9px;
    }
    .signature-line {
        border-top: 1px solid #2c5282;
        margin: 5px 0 3px 0;
        padding-top: 3px;
        height: 8px;
    }
    .signature-name {
        margin-top: 2px;
        font-size: 8px;
    }
    .signature-img {
        max-width: 120px;
        max-height: 40px;
        object-fit: contain;
        margin: 5px auto 10px;
        display: block;
        background: transparent;
    }
    .supplier-info {
        background: #f7fafc;
        padding: 10px;
        border-radius: 4px;
        border-left: 3px solid #2c5282;
        margin-top: 10px;
        font-size: 8px;
        text-align: center;
        page-break-inside: avoid;
    }
"#;

/// Stylesheet of the photos-only sheet, shared with the print shell.
pub const PHOTO_SHEET_CSS: &str = r#"
    body { margin: 0; padding: 0; }
    .photo-grid {
        display: grid;
        grid-template-columns: repeat(3, 1fr);
        gap: 5px;
        padding: 2px;
        width: 100%;
    }
    .photo-cell {
        width: 100%;
        padding-bottom: 100%;
        position: relative;
        overflow: hidden;
        page-break-inside: avoid;
    }
    .photo-cell img {
        position: absolute;
        top: 0;
        left: 0;
        width: 100%;
        height: 100%;
        object-fit: contain;
        object-position: center;
    }
"#;

/// Minimal contextual HTML escaping for text and attribute positions.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// ISO date → Czech short form. Unparsable input is shown escaped as-is so a
/// hand-edited form still renders.
fn format_date(iso: &str) -> String {
    if iso.trim().is_empty() {
        return String::new();
    }
    match NaiveDate::parse_from_str(iso.trim(), "%Y-%m-%d") {
        Ok(date) => crate::record::format_date_cs(date),
        Err(_) => escape_html(iso),
    }
}

fn format_list(items: &[String]) -> String {
    items
        .iter()
        .map(|i| escape_html(i))
        .collect::<Vec<_>>()
        .join(", ")
}

fn bullet(text: &str) -> String {
    format!(
        "<div style=\"margin: 2px 0; padding-left: 15px;\">• {}</div>",
        escape_html(text)
    )
}

fn checkbox_list(items: &[String], other_spec: &str) -> String {
    let mut out: String = items.iter().map(|i| bullet(i)).collect();
    if !other_spec.trim().is_empty() {
        out.push_str(&bullet(other_spec));
    }
    out
}

/// Intervention type cell: the "Jiný" sentinel is substituted by its free
/// text.
fn intervention_type_cell(record: &FormRecord) -> String {
    match record.intervention_type.as_deref() {
        Some(crate::form::INTERVENTION_TYPE_OTHER) => {
            escape_html(&record.other_intervention_type_spec)
        }
        Some(value) => escape_html(value),
        None => String::new(),
    }
}

/// "No pests" sentence, itemized levels, or the not-specified fallback.
fn infestation_cell(record: &FormRecord) -> String {
    if record.no_pests {
        return "Žádný výskyt škůdců".into();
    }
    if record.pest_infestations.is_empty() {
        return "Nezadáno".into();
    }
    record
        .pest_infestations
        .iter()
        .map(|p| format!("{} - {}", escape_html(&p.pest), escape_html(&p.level)))
        .collect::<Vec<_>>()
        .join("<br>")
}

fn chemicals_rows(record: &FormRecord) -> String {
    if record.chemicals.is_empty() {
        return "<tr><td colspan=\"2\">Žádné přípravky nebyly vybrány</td></tr>".into();
    }
    record
        .chemicals
        .iter()
        .map(|chem| {
            format!(
                "<tr><td>{}</td><td>{}</td></tr>",
                escape_html(&chem.name),
                escape_html(&chem.quantity)
            )
        })
        .collect()
}

/// Client slot: phone consent text, drawn signature, or a blank line.
fn client_signature_slot(record: &FormRecord) -> String {
    if let Some(consent) = &record.phone_consent {
        return format!(
            r#"<div style="text-align: center; font-style: italic; font-size: 8px; margin: 5px 0 10px;">
                Souhlas po telefonu<br>
                {}<br>
                {}
            </div>"#,
            escape_html(&consent.client_name),
            escape_html(&consent.date)
        );
    }
    if let Some(signature) = &record.client_signature {
        return format!(
            r#"<img src="{}" class="signature-img" alt="Podpis klienta">"#,
            signature
        );
    }
    r#"<div style="height: 40px; margin: 5px 0 10px;"></div>"#.into()
}

/// The survey-witness box appears only when a witness name was entered.
fn survey_signature_box(record: &FormRecord) -> String {
    if record.survey_name.trim().is_empty() {
        return String::new();
    }
    let signature = match &record.survey_signature {
        Some(data) => format!(
            r#"<img src="{}" class="signature-img" alt="Podpis účastníka průzkumu">"#,
            data
        ),
        None => r#"<div style="height: 40px; margin: 5px 0 10px;"></div>"#.into(),
    };
    format!(
        r#"<div class="signature-box">
            <div class="signature-label">Průzkum za účasti</div>
            {signature}
            <div class="signature-line"></div>
            <div class="signature-name">{}</div>
        </div>"#,
        escape_html(&record.survey_name)
    )
}

fn option_cell(value: &Option<String>) -> String {
    value.as_deref().map(escape_html).unwrap_or_default()
}

/// Body markup of the protocol (no `<html>` wrapper); the print shell embeds
/// it under its own head.
pub fn render_protocol_body(record: &FormRecord) -> String {
    let client_name_label = if record.client_name.trim().is_empty() {
        "Jméno klienta".to_string()
    } else {
        escape_html(&record.client_name)
    };

    let work_type_cell = format!(
        "{} {}",
        format_list(&record.work_types),
        escape_html(&record.other_work_type_spec)
    )
    .trim()
    .to_string();

    let pests_cell = format!(
        "{} {}",
        format_list(&record.pests),
        escape_html(&record.other_pests_spec)
    )
    .trim()
    .to_string();

    let ico_cell = if record.ico.trim().is_empty() {
        "neuvedeno".to_string()
    } else {
        escape_html(&record.ico)
    };

    format!(
        r#"    <div class="header">
        <h1>PROTOKOL O PROVEDENÉ DERATIZACI A DEZINSEKCI</h1>
        <h2>Deratem - Profesionální služby DDD</h2>
        <div style="font-size: 9px;">
            <strong>Číslo protokolu:</strong> {protocol_number} |
            <strong>Místo zásahu:</strong> {intervention_place} |
            <strong>Datum zásahu:</strong> {intervention_date}
        </div>
    </div>

    <div class="two-columns">
        <div class="column">
            <div class="section">
                <h3>ODBĚRATEL</h3>
                <table class="compact-table">
                    <tr><td>Jméno/Název společnosti:</td><td>{customer}</td></tr>
                    <tr><td>IČO:</td><td>{ico}</td></tr>
                    <tr><td>Adresa/Sídlo:</td><td>{address}</td></tr>
                </table>
            </div>
        </div>
        <div class="column">
            <div class="section">
                <h3>KONTAKT</h3>
                <table class="compact-table">
                    <tr><td>Kontaktní osoba:</td><td>{client_name}</td></tr>
                    <tr><td>Telefon:</td><td>{client_phone}</td></tr>
                    <tr><td>E-mail:</td><td>{client_email}</td></tr>
                </table>
            </div>
        </div>
    </div>

    <div class="two-columns">
        <div class="column">
            <div class="section">
                <h3>DETAILY ZÁSAHU</h3>
                <table class="compact-table">
                    <tr><td>Typ zásahu:</td><td>{intervention_type}</td></tr>
                    <tr><td>Druh práce:</td><td>{work_type}</td></tr>
                    <tr><td>Zjištění škůdci:</td><td>{pests}</td></tr>
                    <tr><td>Stupeň zamoření:</td><td>{infestation}</td></tr>
                    <tr><td>Nutnost dalšího zásahu:</td><td>{further_intervention}</td></tr>
                    <tr><td>Po dohodě s odběratelem použit biocid:</td><td>{biocide}</td></tr>
                    <tr><td>Po dohodě s odběratelem byla ponechána nástraha v deratizačních staničkách:</td><td>{bait}</td></tr>
                </table>
            </div>
        </div>
        <div class="column">
            <div class="section">
                <h3>PŘÍPRAVKY A MNOŽSTVÍ</h3>
                <table class="compact-table">
                    {chemicals}
                </table>
            </div>
        </div>
    </div>

    <div class="two-columns">
        <div class="column">
            <div class="section">
                <h3>DOPORUČENÍ</h3>
                <div class="checkbox-list">
                    {recommendations}
                </div>
            </div>
        </div>
        <div class="column">
            <div class="section">
                <h3>BEZPEČNOST</h3>
                <div class="checkbox-list">
                    {safety}
                </div>
            </div>
        </div>
    </div>

    <div class="section">
        <h3>POUČENÍ PRO ODBĚRATELE</h3>
        <div class="recommendations">{legal_notice}</div>
    </div>

    <div class="signature-section">
        <div class="signature-container">
            <div class="signature-box">
                <div class="signature-label">Podpis klienta</div>
                {client_slot}
                <div class="signature-line"></div>
                <div class="signature-name">{client_name_label}</div>
            </div>
            {survey_box}
            <div class="signature-box">
                <div class="signature-label">Podpis technika</div>
                <img src="{technician_signature}" class="signature-img" alt="Podpis technika">
                <div class="signature-line" style="margin-top: 5px;"></div>
                <div class="signature-name">{technician_name}</div>
            </div>
        </div>
    </div>

    <div class="supplier-info">
        <div style="text-align: center; font-weight: bold; margin-bottom: 6px; font-size: 10px;">DODAVATEL</div>
        <div style="display: grid; grid-template-columns: 1fr 1fr; gap: 8px; font-size: 8px; text-align: center;">
            <div style="border-right: 1px solid #2c5282; padding-right: 8px;">
                <strong>Tomáš Šmídek – Deratem.cz</strong><br>
                Štětínská 375/14, Praha 8<br>
                IČO: 18633617
            </div>
            <div style="padding-left: 8px;">
                Č. účtu: 1312513790297/0100<br>
                Tel.: 777 333 164<br>
                E-mail: info@deratem.cz
            </div>
        </div>
    </div>"#,
        protocol_number = escape_html(&record.protocol_number),
        intervention_place = escape_html(&record.intervention_place),
        intervention_date = format_date(&record.intervention_date),
        customer = escape_html(&record.customer),
        ico = ico_cell,
        address = escape_html(&record.address),
        client_name = escape_html(&record.client_name),
        client_phone = escape_html(&record.client_phone),
        client_email = escape_html(&record.client_email),
        intervention_type = intervention_type_cell(record),
        work_type = work_type_cell,
        pests = pests_cell,
        infestation = infestation_cell(record),
        further_intervention = option_cell(&record.further_intervention),
        biocide = option_cell(&record.biocide_agreement),
        bait = option_cell(&record.bait_left_in_stations),
        chemicals = chemicals_rows(record),
        recommendations =
            checkbox_list(&record.recommended_actions, &record.other_recommendation_spec),
        safety = checkbox_list(&record.safety_measures, &record.other_safety_spec),
        legal_notice = LEGAL_NOTICE,
        client_slot = client_signature_slot(record),
        survey_box = survey_signature_box(record),
        technician_signature = TECHNICIAN_SIGNATURE_SRC,
        technician_name = TECHNICIAN_NAME,
    )
}

/// Render the complete protocol document.
pub fn render_protocol(record: &FormRecord) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n<style>{css}</style>\n</head>\n<body>\n{body}\n</body>\n</html>\n",
        css = PROTOCOL_CSS,
        body = render_protocol_body(record),
    )
}

/// Body markup of the photos-only sheet: a 3-per-row grid of the collection.
pub fn render_photo_sheet_body(photos: &[Photo]) -> String {
    let cells: String = photos
        .iter()
        .map(|photo| {
            format!(
                r#"<div class="photo-cell"><img src="{}" alt="{}"></div>"#,
                photo.display_url,
                escape_html(&photo.file_name)
            )
        })
        .collect();

    format!(r#"    <div class="photo-grid">{cells}</div>"#)
}

/// Render the complete photos-only document.
pub fn render_photo_sheet(photos: &[Photo]) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n<title>Fotografie</title>\n<style>{css}</style>\n</head>\n<body>\n{body}\n</body>\n</html>\n",
        css = PHOTO_SHEET_CSS,
        body = render_photo_sheet_body(photos),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::FormState;
    use crate::record::{collect, ChemicalUsage, PestInfestation, PhoneConsent};
    use crate::signature::SignaturePad;

    fn empty_record() -> FormRecord {
        collect(
            &FormState::default(),
            &SignaturePad::default(),
            &SignaturePad::default(),
            NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_header_contains_protocol_number() {
        let mut record = empty_record();
        record.protocol_number = "2025_0007".into();

        let html = render_protocol(&record);
        assert!(html.contains("2025_0007"));
    }

    #[test]
    fn test_empty_record_renders_blank_placeholders() {
        let html = render_protocol(&empty_record());

        // The client slot falls back to the blank line, never an error.
        assert!(html.contains(r#"<div style="height: 40px; margin: 5px 0 10px;"></div>"#));
        assert!(html.contains("Žádné přípravky nebyly vybrány"));
        assert!(html.contains("Nezadáno"));
        assert!(html.contains("Jméno klienta"));
        assert!(html.contains("neuvedeno"));
        // No witness name, no witness box.
        assert!(!html.contains("Průzkum za účasti"));
    }

    #[test]
    fn test_no_pests_sentence() {
        let mut record = empty_record();
        record.no_pests = true;
        let html = render_protocol(&record);
        assert!(html.contains("Žádný výskyt škůdců"));
        assert!(!html.contains("Nezadáno"));
    }

    #[test]
    fn test_infestation_rows_itemized() {
        let mut record = empty_record();
        record.pest_infestations = vec![
            PestInfestation {
                pest: "Potkan".into(),
                level: "Vysoký".into(),
            },
            PestInfestation {
                pest: "Rus domácí".into(),
                level: "Nízký".into(),
            },
        ];

        let html = render_protocol(&record);
        assert!(html.contains("Potkan - Vysoký<br>Rus domácí - Nízký"));
    }

    #[test]
    fn test_chemicals_table() {
        let mut record = empty_record();
        record.chemicals = vec![ChemicalUsage {
            name: "Lanirat".into(),
            quantity: "200 g".into(),
        }];

        let html = render_protocol(&record);
        assert!(html.contains("<tr><td>Lanirat</td><td>200 g</td></tr>"));
    }

    #[test]
    fn test_phone_consent_slot() {
        let mut record = empty_record();
        record.client_name = "Jana Malá".into();
        record.phone_consent = Some(PhoneConsent {
            client_name: "Jana Malá".into(),
            date: "14. 3. 2025".into(),
        });

        let html = render_protocol(&record);
        assert!(html.contains("Souhlas po telefonu"));
        assert!(html.contains("14. 3. 2025"));
    }

    #[test]
    fn test_survey_box_requires_name() {
        let mut record = empty_record();
        record.survey_name = "Petr Dvořák".into();

        let html = render_protocol(&record);
        assert!(html.contains("Průzkum za účasti"));
        assert!(html.contains("Petr Dvořák"));
    }

    #[test]
    fn test_intervention_type_other_substitution() {
        let mut record = empty_record();
        record.intervention_type = Some("Jiný".into());
        record.other_intervention_type_spec = "Ochrana proti ptactvu".into();

        let html = render_protocol(&record);
        assert!(html.contains("Ochrana proti ptactvu"));
    }

    #[test]
    fn test_user_text_is_escaped() {
        let mut record = empty_record();
        record.customer = "<script>alert('x')</script>".into();
        record.intervention_place = "Praha & okolí".into();

        let html = render_protocol(&record);
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("Praha &amp; okolí"));
    }

    #[test]
    fn test_date_formatting() {
        let mut record = empty_record();
        record.intervention_date = "2025-03-14".into();
        let html = render_protocol(&record);
        assert!(html.contains("14. 3. 2025"));
    }

    #[test]
    fn test_legal_notice_present() {
        let html = render_protocol(&empty_record());
        assert!(html.contains("Odběratel potvrzuje"));
        assert!(html.contains("DODAVATEL"));
    }

    #[test]
    fn test_photo_sheet_grid() {
        use crate::photos::Photo;

        let photos = vec![Photo {
            id: "photo-abc".into(),
            data: vec![1, 2, 3],
            display_url: "data:image/jpeg;base64,AAAA".into(),
            file_name: "a.jpg".into(),
            size_bytes: 3,
            mime_type: "image/jpeg".into(),
            captured_at: "2025-03-14 10:00".into(),
        }];

        let html = render_photo_sheet(&photos);
        assert!(html.contains("photo-grid"));
        assert!(html.contains("data:image/jpeg;base64,AAAA"));
    }
}
