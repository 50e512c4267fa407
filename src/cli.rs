use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "protokol")]
#[command(about = "Generátor protokolů o provedené deratizaci a dezinsekci", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Podrobný výpis
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Založit nový formulář s přiděleným číslem protokolu
    Init {
        /// Výstupní JSON soubor
        #[arg(short, long, default_value = "formular.json")]
        output: PathBuf,
    },

    /// Vygenerovat dokumenty z vyplněného formuláře
    Render {
        /// Vyplněný formulář (JSON)
        #[arg(required = true)]
        form: PathBuf,

        /// Složka s fotografiemi
        #[arg(short, long)]
        photos: Option<PathBuf>,

        /// Podpis klienta (JSON se záznamem tahů)
        #[arg(long)]
        client_signature: Option<PathBuf>,

        /// Podpis účastníka průzkumu (JSON se záznamem tahů)
        #[arg(long)]
        survey_signature: Option<PathBuf>,

        /// Které dokumenty vygenerovat (protocol/photos/both)
        #[arg(short, long, default_value = "both")]
        format: DocumentKind,

        /// Výstupní složka (výchozí: aktuální)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Kvalita obrázků ve fotodokumentaci (high/medium/low)
        #[arg(long, default_value = "medium")]
        pdf_quality: PdfQuality,
    },

    /// Připravit tiskovou verzi protokolu (samo-tisknoucí HTML)
    Print {
        /// Vyplněný formulář (JSON)
        #[arg(required = true)]
        form: PathBuf,

        /// Složka s fotografiemi
        #[arg(short, long)]
        photos: Option<PathBuf>,

        /// Podpis klienta (JSON se záznamem tahů)
        #[arg(long)]
        client_signature: Option<PathBuf>,

        /// Podpis účastníka průzkumu (JSON se záznamem tahů)
        #[arg(long)]
        survey_signature: Option<PathBuf>,

        /// Které dokumenty připravit (protocol/photos/both)
        #[arg(short, long, default_value = "protocol")]
        format: DocumentKind,

        /// Výstupní složka (výchozí: aktuální)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Sestavit e-mail klientovi s protokolem v příloze
    Email {
        /// Vyplněný formulář (JSON)
        #[arg(required = true)]
        form: PathBuf,

        /// Složka s fotografiemi
        #[arg(short, long)]
        photos: Option<PathBuf>,

        /// Podpis klienta (JSON se záznamem tahů)
        #[arg(long)]
        client_signature: Option<PathBuf>,

        /// Podpis účastníka průzkumu (JSON se záznamem tahů)
        #[arg(long)]
        survey_signature: Option<PathBuf>,

        /// Výstupní soubor pro sestavenou zprávu (JSON, výchozí: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Kvalita obrázků ve fotodokumentaci (high/medium/low)
        #[arg(long, default_value = "medium")]
        pdf_quality: PdfQuality,
    },

    /// Interaktivně doplnit zjištěné škůdce a stupně zamoření
    Pests {
        /// Vyplněný formulář (JSON)
        #[arg(required = true)]
        form: PathBuf,

        /// Výstupní soubor (výchozí: přepsat vstup)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Zobrazit/upravit nastavení
    Config {
        /// Nastavit ID e-mailové služby
        #[arg(long)]
        set_service_id: Option<String>,

        /// Nastavit ID šablony e-mailu
        #[arg(long)]
        set_template_id: Option<String>,

        /// Nastavit veřejný klíč e-mailové služby
        #[arg(long)]
        set_public_key: Option<String>,

        /// Nastavit jméno technika
        #[arg(long)]
        set_technician: Option<String>,

        /// Zobrazit nastavení
        #[arg(long)]
        show: bool,
    },

    /// Čítač protokolových čísel
    Counter {
        /// Vynulovat čítač (další protokol začne od 0001)
        #[arg(long)]
        reset: bool,
    },
}

/// Which of the two documents to produce.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DocumentKind {
    Protocol,
    Photos,
    #[default]
    Both,
}

impl std::str::FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "protocol" | "protokol" => Ok(DocumentKind::Protocol),
            "photos" | "foto" => Ok(DocumentKind::Photos),
            "both" => Ok(DocumentKind::Both),
            _ => Err(format!("Unknown format: {}. Use protocol, photos, or both", s)),
        }
    }
}

/// Image quality inside the photos PDF.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PdfQuality {
    /// 1400px
    High,
    /// 800px (výchozí)
    #[default]
    Medium,
    /// 500px
    Low,
}

impl PdfQuality {
    /// Longest-edge cap before embedding.
    pub fn max_width(&self) -> u32 {
        match self {
            PdfQuality::High => 1400,
            PdfQuality::Medium => 800,
            PdfQuality::Low => 500,
        }
    }
}

impl std::str::FromStr for PdfQuality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "high" | "h" => Ok(PdfQuality::High),
            "medium" | "med" | "m" => Ok(PdfQuality::Medium),
            "low" | "l" => Ok(PdfQuality::Low),
            _ => Err(format!("Unknown quality: {}. Use high, medium, or low", s)),
        }
    }
}

impl std::fmt::Display for PdfQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PdfQuality::High => write!(f, "high"),
            PdfQuality::Medium => write!(f, "medium"),
            PdfQuality::Low => write!(f, "low"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_kind_parsing() {
        assert_eq!("protocol".parse::<DocumentKind>(), Ok(DocumentKind::Protocol));
        assert_eq!("FOTO".parse::<DocumentKind>(), Ok(DocumentKind::Photos));
        assert_eq!("both".parse::<DocumentKind>(), Ok(DocumentKind::Both));
        assert!("pdf".parse::<DocumentKind>().is_err());
    }

    #[test]
    fn test_pdf_quality_parsing() {
        assert_eq!("h".parse::<PdfQuality>(), Ok(PdfQuality::High));
        assert_eq!("medium".parse::<PdfQuality>(), Ok(PdfQuality::Medium));
        assert_eq!(PdfQuality::Low.max_width(), 500);
        assert!("ultra".parse::<PdfQuality>().is_err());
    }
}
