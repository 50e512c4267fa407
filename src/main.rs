use clap::Parser;
use indicatif::ProgressBar;
use protokol_ddd::{cli, config, error, form, pests, photos, session, signature, store};

use cli::{Cli, Commands, PdfQuality};
use config::Config;
use error::Result;
use session::{DispatchAction, ReportSession};
use std::path::PathBuf;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;
    let today = chrono::Local::now().date_naive();

    match cli.command {
        Commands::Init { output } => {
            println!("🧾 protokol - nový formulář\n");

            let counter_dir = Config::config_dir()?;
            std::fs::create_dir_all(&counter_dir)?;

            let session = ReportSession::start(&counter_dir, today)?;
            session.form.save(&output)?;

            println!("✔ Číslo protokolu: {}", session.form.protocol_number);
            println!("✔ Formulář uložen: {}", output.display());
        }

        Commands::Render {
            form,
            photos,
            client_signature,
            survey_signature,
            format,
            output,
            pdf_quality,
        } => {
            println!("📄 protokol - generování dokumentů\n");

            let mut session =
                load_session(&form, photos, client_signature, survey_signature).await?;
            let out_dir = output.unwrap_or_else(|| PathBuf::from("."));

            println!("- Generuji dokumenty... (kvalita: {})", pdf_quality);
            let outcome = session.submit(
                DispatchAction::Render(format),
                &config,
                &out_dir,
                pdf_quality,
                today,
            )?;

            for path in &outcome.artifacts {
                println!("✔ Výstup: {}", path.display());
            }
            println!("\n✅ Hotovo");
        }

        Commands::Print {
            form,
            photos,
            client_signature,
            survey_signature,
            format,
            output,
        } => {
            println!("🖨 protokol - příprava tisku\n");

            let mut session =
                load_session(&form, photos, client_signature, survey_signature).await?;
            let out_dir = output.unwrap_or_else(|| PathBuf::from("."));

            let outcome = session.submit(
                DispatchAction::Print(format),
                &config,
                &out_dir,
                PdfQuality::default(),
                today,
            )?;

            for path in &outcome.artifacts {
                println!("✔ Tisková stránka: {}", path.display());
            }
            println!("\nStránku otevřete v prohlížeči, tisk se spustí sám.");
        }

        Commands::Email {
            form,
            photos,
            client_signature,
            survey_signature,
            output,
            pdf_quality,
        } => {
            println!("✉ protokol - příprava e-mailu\n");

            let mut session =
                load_session(&form, photos, client_signature, survey_signature).await?;
            let out_dir = std::env::temp_dir();

            let outcome = session.submit(
                DispatchAction::Email,
                &config,
                &out_dir,
                pdf_quality,
                today,
            )?;

            match outcome.email {
                Some(protokol_ddd::dispatch::EmailDispatch::Composer(message)) => {
                    let json = serde_json::to_string_pretty(&message)?;
                    match output {
                        Some(path) => {
                            std::fs::write(&path, json)?;
                            println!("✔ Zpráva uložena: {}", path.display());
                        }
                        None => println!("{}", json),
                    }
                }
                Some(protokol_ddd::dispatch::EmailDispatch::Mailto(uri)) => {
                    println!("E-mailová služba není nastavena, použijte mailto odkaz");
                    println!("(přílohy je nutné připojit ručně):\n");
                    match output {
                        Some(path) => {
                            std::fs::write(&path, &uri)?;
                            println!("✔ Odkaz uložen: {}", path.display());
                        }
                        None => println!("{}", uri),
                    }
                }
                None => {}
            }
            println!("\n✅ Hotovo");
        }

        Commands::Pests { form, output } => {
            println!("🐀 protokol - zadání škůdců\n");
            pests::run_interactive_pests(&form, output.as_deref())?;
        }

        Commands::Config {
            set_service_id,
            set_template_id,
            set_public_key,
            set_technician,
            show,
        } => {
            let mut config = config;
            let mut changed = false;

            if let Some(id) = set_service_id {
                config.email_service_id = Some(id);
                changed = true;
            }
            if let Some(id) = set_template_id {
                config.email_template_id = Some(id);
                changed = true;
            }
            if let Some(key) = set_public_key {
                config.email_public_key = Some(key);
                changed = true;
            }
            if let Some(name) = set_technician {
                config.technician_name = name;
                changed = true;
            }

            if changed {
                config.save()?;
                println!("✔ Nastavení uloženo");
            }

            if show || !changed {
                println!("Nastavení:");
                println!("  Technik: {}", config.technician_name);
                println!("  Kopie e-mailů: {}", config.email_cc);
                println!(
                    "  E-mailová služba: {}",
                    if config.has_composer() {
                        "nastavena"
                    } else {
                        "nenastavena (použije se mailto)"
                    }
                );
            }
        }

        Commands::Counter { reset } => {
            let counter_dir = Config::config_dir()?;
            let counter_path = store::CounterStore::store_path(&counter_dir);
            let counter = store::CounterStore::load(&counter_dir);

            println!("Čítač protokolů:");
            println!("  Soubor: {}", counter_path.display());
            println!(
                "  Poslední číslo: {}",
                counter.last_protocol_number.as_deref().unwrap_or("žádné")
            );

            if reset {
                let confirmed = dialoguer::Confirm::new()
                    .with_prompt("Opravdu vynulovat čítač?")
                    .default(false)
                    .interact()
                    .map_err(|e| error::ProtokolError::CliExecution(e.to_string()))?;

                if confirmed {
                    match store::CounterStore::clear(&counter_dir) {
                        Ok(true) => println!("✔ Čítač vynulován"),
                        Ok(false) => println!("Čítač neexistuje, není co nulovat"),
                        Err(e) => println!("Chyba při nulování čítače: {}", e),
                    }
                }
            }
        }
    }

    Ok(())
}

/// Load the form, the optional signature pads and the photo folder into one
/// session.
async fn load_session(
    form_path: &std::path::Path,
    photos_dir: Option<PathBuf>,
    client_signature: Option<PathBuf>,
    survey_signature: Option<PathBuf>,
) -> Result<ReportSession> {
    println!("[1/2] Načítám formulář...");
    let form = form::FormState::load(form_path)?;
    println!("✔ Protokol č. {}\n", form.protocol_number);

    let mut session = ReportSession::with_form(form);

    if let Some(path) = client_signature {
        session.client_signature = signature::SignaturePad::load(&path)?;
    }
    if let Some(path) = survey_signature {
        session.survey_signature = signature::SignaturePad::load(&path)?;
    }

    if let Some(folder) = photos_dir {
        println!("[2/2] Načítám fotografie...");
        let paths = photos::scan_folder(&folder)?;

        let (_cancel_tx, cancel_rx) = watch::channel(false);
        let progress = ProgressBar::new(paths.len() as u64);
        let rejections = session
            .photos
            .add_batch(&paths, &cancel_rx, Some(&progress))
            .await?;
        progress.finish_and_clear();

        for rejection in &rejections {
            println!("  ⚠ {}: {}", rejection.file_name, rejection.error);
        }
        println!("✔ Načteno {} fotografií\n", session.photos.len());
    }

    Ok(session)
}
