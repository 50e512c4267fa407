//! Dispatch of rendered documents: print shell and e-mail composition.

use crate::config::Config;
use crate::record::FormRecord;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Submission lifecycle of one render/print/email attempt. Failures always
/// return the session to `Idle`; nothing is retried automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    Validating,
    Collecting,
    Rendering,
    Dispatching,
}

/// Wrap a rendered document body in a self-printing page: print colors
/// forced, A4 page, auto-print once every embedded image has loaded (or
/// errored), closed after printing with a fallback timeout. `styles` is the
/// document's own stylesheet, appended after the print rules.
pub fn build_print_document(title: &str, styles: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<title>{title}</title>
<meta charset="UTF-8">
<style>
    @page {{
        size: A4;
    }}
    body {{
        font-family: Arial, sans-serif;
        font-size: 10px;
        line-height: 1.2;
        color: #000;
        margin: 0 auto;
        padding: 0;
        width: 100%;
        max-width: 190mm;
        background: white;
        -webkit-print-color-adjust: exact !important;
        print-color-adjust: exact !important;
    }}
    * {{
        -webkit-print-color-adjust: exact !important;
        print-color-adjust: exact !important;
    }}
    @media print {{
        body {{
            margin: 0 auto;
            padding: 10mm;
            width: 190mm;
            max-width: 100%;
        }}
    }}
{styles}
</style>
<script>
    window.onload = function() {{
        var images = document.getElementsByTagName('img');
        var loaded = 0;
        var total = images.length;

        if (total === 0) {{
            startPrint();
            return;
        }}

        var handler = function() {{
            loaded++;
            if (loaded >= total) {{
                startPrint();
            }}
        }};

        Array.prototype.forEach.call(images, function(img) {{
            if (img.complete) {{
                handler();
            }} else {{
                img.addEventListener('load', handler);
                img.addEventListener('error', handler);
            }}
        }});
    }};

    function startPrint() {{
        setTimeout(function() {{
            window.print();
            setTimeout(function() {{ window.close(); }}, 1000);
        }}, 500);
    }}

    window.onafterprint = function() {{
        setTimeout(function() {{ window.close(); }}, 100);
    }};
</script>
</head>
<body>
{body}
</body>
</html>
"#,
        title = crate::render::escape_html(title),
        styles = styles,
        body = body,
    )
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub file_name: String,
    pub base64: String,
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, data: &[u8]) -> Self {
        Self {
            file_name: file_name.into(),
            base64: STANDARD.encode(data),
        }
    }
}

/// Payload for a native mail composer.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct EmailMessage {
    pub to: String,
    pub cc: String,
    pub subject: String,
    pub body: String,
    pub is_html: bool,
    pub attachments: Vec<String>,
}

/// Composer payload when the composer is configured, `mailto:` URI
/// otherwise. The fallback cannot carry attachments (accepted limitation).
#[derive(Debug, Clone, PartialEq)]
pub enum EmailDispatch {
    Composer(EmailMessage),
    Mailto(String),
}

pub fn email_subject(record: &FormRecord) -> String {
    format!("Protokol č. {} - Deratem.cz", record.protocol_number)
}

/// Compose the outgoing protocol e-mail.
pub fn compose_email(
    record: &FormRecord,
    config: &Config,
    attachments: &[Attachment],
) -> EmailDispatch {
    let has_photos = attachments.len() > 1;

    if config.has_composer() {
        let attachments = attachments
            .iter()
            .map(|a| format!("base64:{}//{}", a.file_name, a.base64))
            .collect();

        EmailDispatch::Composer(EmailMessage {
            to: record.client_email.clone(),
            cc: config.email_cc.clone(),
            subject: email_subject(record),
            body: email_body_html(record, &config.technician_name, has_photos),
            is_html: true,
            attachments,
        })
    } else {
        let body = email_body_plain(record, &config.technician_name, has_photos);
        EmailDispatch::Mailto(format!(
            "mailto:{}?cc={}&subject={}&body={}",
            record.client_email,
            config.email_cc,
            percent_encode(&email_subject(record)),
            percent_encode(&body),
        ))
    }
}

fn email_body_html(record: &FormRecord, technician: &str, has_photos: bool) -> String {
    use crate::render::escape_html;

    let photos_note = if has_photos { " a fotodokumentaci" } else { "" };

    format!(
        r#"<html>
<head><meta charset="utf-8"></head>
<body style="font-family: Arial, sans-serif; color: #333; line-height: 1.6;">
    <p>Dobrý den,</p>
    <p>v příloze naleznete protokol o provedeném ošetření{photos_note}.</p>
    <p>
        <strong>Číslo protokolu:</strong> {number}<br>
        <strong>Jméno/Společnost:</strong> {customer}<br>
        <strong>Datum zásahu:</strong> {date}
    </p>
    <p>V případě jakýchkoli dotazů nás neváhejte kontaktovat.</p>
    <p>S přáním hezkého dne,</p>
    <div style="border-top: 2px solid #e0e0e0; padding-top: 20px; margin-top: 20px;">
        <div style="font-weight: bold; font-size: 16px; color: #333;">{technician}</div>
        <div style="color: #666; font-size: 14px;">Technik | Deratem | Štětínská 375/14, Praha 8</div>
        <div style="color: #666; font-size: 14px;">info@deratem.cz | +420 777 333 164</div>
    </div>
</body>
</html>"#,
        photos_note = photos_note,
        number = escape_html(&record.protocol_number),
        customer = escape_html(&record.customer),
        date = escape_html(&record.intervention_date),
        technician = escape_html(technician),
    )
}

fn email_body_plain(record: &FormRecord, technician: &str, has_photos: bool) -> String {
    let photos_note = if has_photos { " a fotodokumentaci" } else { "" };
    format!(
        "Dobrý den,\n\n\
         v příloze naleznete protokol o provedeném ošetření{photos_note}.\n\n\
         Číslo protokolu: {number}\n\
         Jméno/Společnost: {customer}\n\
         Datum zásahu: {date}\n\n\
         V případě jakýchkoli dotazů nás neváhejte kontaktovat.\n\n\
         S přáním hezkého dne,\n\n\
         {technician} - Technik, Deratem\n\
         Štětínská 375/14, Praha 8\n\
         info@deratem.cz | +420 777 333 164",
        photos_note = photos_note,
        number = record.protocol_number,
        customer = record.customer,
        date = record.intervention_date,
        technician = technician,
    )
}

/// `encodeURIComponent`-style escaping for mailto parts.
fn percent_encode(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for byte in text.as_bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' => out.push(*byte as char),
            b'-' | b'_' | b'.' | b'!' | b'~' | b'*' | b'\'' | b'(' | b')' => {
                out.push(*byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::FormState;
    use crate::record::collect;
    use crate::signature::SignaturePad;
    use chrono::NaiveDate;

    fn record() -> FormRecord {
        let mut form = FormState::default();
        form.protocol_number = "2025_0007".into();
        form.customer = "Pekárna U Lípy s.r.o.".into();
        form.client_email = "jana@pekarna.cz".into();
        form.intervention_date = "2025-03-14".into();
        collect(
            &form,
            &SignaturePad::default(),
            &SignaturePad::default(),
            NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
        )
        .unwrap()
    }

    fn composer_config() -> Config {
        let mut config = Config::default();
        config.email_service_id = Some("service_x1".into());
        config.email_template_id = Some("template_y2".into());
        config.email_public_key = Some("key_z3".into());
        config
    }

    #[test]
    fn test_print_document_waits_for_images() {
        let html =
            build_print_document("Protokol 2025_0007", ".header { color: red; }", "<p>tělo</p>");
        assert!(html.contains("getElementsByTagName('img')"));
        assert!(html.contains("window.print()"));
        assert!(html.contains("window.onafterprint"));
        assert!(html.contains("<p>tělo</p>"));
        assert!(html.contains(".header { color: red; }"));
        assert!(html.contains("size: A4"));
    }

    #[test]
    fn test_composer_email_with_attachments() {
        let attachments = vec![
            Attachment::new("protokol_2025_0007.html", b"<html></html>"),
            Attachment::new("fotodokumentace_2025_0007.pdf", b"%PDF-"),
        ];

        let dispatch = compose_email(&record(), &composer_config(), &attachments);
        let EmailDispatch::Composer(email) = dispatch else {
            panic!("expected composer payload");
        };

        assert_eq!(email.to, "jana@pekarna.cz");
        assert_eq!(email.cc, "info@deratem.cz");
        assert_eq!(email.subject, "Protokol č. 2025_0007 - Deratem.cz");
        assert!(email.is_html);
        assert_eq!(email.attachments.len(), 2);
        assert!(email.attachments[0].starts_with("base64:protokol_2025_0007.html//"));
        assert!(email.body.contains("a fotodokumentaci"));
        assert!(email.body.contains("2025_0007"));
    }

    #[test]
    fn test_mailto_fallback_drops_attachments() {
        let attachments = vec![Attachment::new("protokol.html", b"x")];

        let dispatch = compose_email(&record(), &Config::default(), &attachments);
        let EmailDispatch::Mailto(uri) = dispatch else {
            panic!("expected mailto fallback");
        };

        assert!(uri.starts_with("mailto:jana@pekarna.cz?cc=info@deratem.cz"));
        assert!(!uri.contains("base64:"));
        // Percent-encoded, no raw spaces or diacritics.
        assert!(!uri.contains(' '));
        assert!(uri.contains("subject=Protokol%20%C4%8D.%202025_0007"));
    }

    #[test]
    fn test_single_attachment_means_no_photos_note() {
        let attachments = vec![Attachment::new("protokol.html", b"x")];
        let EmailDispatch::Composer(email) =
            compose_email(&record(), &composer_config(), &attachments)
        else {
            panic!("expected composer payload");
        };
        assert!(!email.body.contains("fotodokumentaci"));
    }

    #[test]
    fn test_percent_encode_matches_encode_uri_component() {
        assert_eq!(percent_encode("a b"), "a%20b");
        assert_eq!(percent_encode("č."), "%C4%8D.");
        assert_eq!(percent_encode("A-Z_0.9!~*'()"), "A-Z_0.9!~*'()");
        assert_eq!(percent_encode("x&y=z"), "x%26y%3Dz");
    }
}
