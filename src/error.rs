use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtokolError {
    #[error("chyba konfigurace: {0}")]
    Config(String),

    #[error("soubor nebyl nalezen: {0}")]
    FileNotFound(String),

    #[error("složka nebyla nalezena: {0}")]
    FolderNotFound(String),

    #[error("chyba při čtení obrázku: {0}")]
    ImageLoad(String),

    #[error("lze nahrávat pouze obrázkové soubory: {0}")]
    NotAnImage(String),

    #[error("můžete nahrát maximálně {limit} fotografií (přidáváte {incoming} k {existing})")]
    TooManyPhotos {
        limit: usize,
        existing: usize,
        incoming: usize,
    },

    #[error("vyplňte prosím všechna povinná pole (chybí: {field})")]
    Validation { field: &'static str },

    #[error("nejsou k dispozici žádné fotky ke stažení")]
    NoPhotos,

    #[error("neplatné číslo protokolu: {0}")]
    InvalidProtocolNumber(String),

    #[error("chyba při generování PDF: {0}")]
    PdfGeneration(String),

    #[error("chyba při přípravě e-mailu: {0}")]
    EmailCompose(String),

    #[error("chyba JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO chyba: {0}")]
    Io(#[from] std::io::Error),

    #[error("chyba při spuštění: {0}")]
    CliExecution(String),
}

pub type Result<T> = std::result::Result<T, ProtokolError>;
