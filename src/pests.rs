//! Interactive completion of the pest table.
//!
//! Walks the rows whose infestation level is missing, then offers to append
//! new rows. The form is saved once at the end.

use crate::error::{ProtokolError, Result};
use crate::form::{FormState, PestRow, INFESTATION_LEVELS};
use dialoguer::Input;
use std::collections::HashSet;
use std::path::Path;

/// Rows with a pest name but no level yet.
pub fn extract_unleveled_rows(form: &FormState) -> Vec<usize> {
    form.pest_rows
        .iter()
        .enumerate()
        .filter(|(_, row)| {
            !row.pest_name.trim().is_empty()
                && row
                    .level
                    .as_deref()
                    .map(|l| l.trim().is_empty())
                    .unwrap_or(true)
        })
        .map(|(i, _)| i)
        .collect()
}

/// Pest names already present in the form, deduplicated.
pub fn collect_known_pests(form: &FormState) -> Vec<String> {
    let mut seen = HashSet::new();
    form.pest_rows
        .iter()
        .filter(|row| !row.pest_name.trim().is_empty())
        .filter_map(|row| {
            let name = row.pest_name.trim().to_string();
            seen.insert(name.clone()).then_some(name)
        })
        .collect()
}

pub enum LevelAction {
    Level(String),
    Skip,
    SkipAll,
    Repeat,
    Quit,
}

pub fn run_interactive_pests(input_path: &Path, output_path: Option<&Path>) -> Result<()> {
    let mut form = FormState::load(input_path)?;

    if form.no_pests {
        println!("✓ Formulář má zaškrtnuto „Bez výskytu škůdců“, není co doplňovat");
        return Ok(());
    }

    let unleveled = extract_unleveled_rows(&form);

    if unleveled.is_empty() {
        println!("✓ Všechny zadané škůdce mají stupeň zamoření");
    } else {
        println!("Škůdci bez stupně zamoření: {}", unleveled.len());
        println!("---");
        println!("Operace: [Enter/s]přeskočit [S]přeskočit zbytek [r]jako předchozí [q]uložit a skončit");
        println!("---\n");

        let mut prev_level: Option<String> = None;
        let mut skip_all = false;
        let mut quit = false;

        for (count, &idx) in unleveled.iter().enumerate() {
            if skip_all || quit {
                break;
            }

            println!(
                "[{}/{}] {}",
                count + 1,
                unleveled.len(),
                form.pest_rows[idx].pest_name.trim()
            );

            match prompt_level_action(prev_level.as_deref())? {
                LevelAction::Level(level) => {
                    form.pest_rows[idx].level = Some(level.clone());
                    prev_level = Some(level.clone());
                    println!("  → {}\n", level);
                }
                LevelAction::Skip => {
                    println!("  → přeskočeno\n");
                }
                LevelAction::SkipAll => {
                    println!("  → zbytek přeskočen\n");
                    skip_all = true;
                }
                LevelAction::Repeat => {
                    if let Some(ref level) = prev_level {
                        form.pest_rows[idx].level = Some(level.clone());
                        println!("  → {} (jako předchozí)\n", level);
                    } else {
                        println!("  → žádný předchozí stupeň, přeskočeno\n");
                    }
                }
                LevelAction::Quit => {
                    println!("Ukládám a končím...");
                    quit = true;
                }
            }
        }
    }

    // Offer to append new rows; an empty name ends the loop.
    let known = collect_known_pests(&form);
    if !known.is_empty() {
        println!("Zadaní škůdci: {}", known.join(", "));
    }
    loop {
        let name: String = Input::new()
            .with_prompt("Další škůdce (Enter = konec)")
            .allow_empty(true)
            .interact_text()
            .map_err(|e| ProtokolError::CliExecution(e.to_string()))?;

        let name = name.trim().to_string();
        if name.is_empty() {
            break;
        }

        let level = match prompt_level_action(None)? {
            LevelAction::Level(level) => Some(level),
            _ => None,
        };

        form.pest_rows.push(PestRow {
            pest_name: name,
            level,
        });
    }

    let output = output_path.unwrap_or(input_path);
    form.save(output)?;
    println!("\n✓ Uloženo: {}", output.display());

    Ok(())
}

fn prompt_level_action(prev: Option<&str>) -> Result<LevelAction> {
    println!("  Stupně: {}", numbered_levels());

    let prompt = if prev.is_some() {
        "Stupeň zamoření (s:přeskočit S:přeskočit zbytek r:jako předchozí q:konec)"
    } else {
        "Stupeň zamoření (s:přeskočit S:přeskočit zbytek q:konec)"
    };

    let input: String = Input::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()
        .map_err(|e| ProtokolError::CliExecution(e.to_string()))?;

    let trimmed = input.trim();

    match trimmed {
        "" | "s" => Ok(LevelAction::Skip),
        "S" => Ok(LevelAction::SkipAll),
        "r" if prev.is_some() => Ok(LevelAction::Repeat),
        "q" | "Q" => Ok(LevelAction::Quit),
        other => Ok(LevelAction::Level(resolve_level(other))),
    }
}

/// A digit picks from the offered levels, anything else is taken verbatim.
fn resolve_level(input: &str) -> String {
    if let Ok(n) = input.parse::<usize>() {
        if n >= 1 && n <= INFESTATION_LEVELS.len() {
            return INFESTATION_LEVELS[n - 1].to_string();
        }
    }
    input.to_string()
}

fn numbered_levels() -> String {
    INFESTATION_LEVELS
        .iter()
        .enumerate()
        .map(|(i, level)| format!("{}:{}", i + 1, level))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_unleveled_rows() {
        let mut form = FormState::default();
        form.pest_rows = vec![
            PestRow {
                pest_name: "Potkan".into(),
                level: Some("Vysoký".into()),
            },
            PestRow {
                pest_name: "Myš".into(),
                level: None,
            },
            PestRow {
                pest_name: "Rus domácí".into(),
                level: Some("  ".into()),
            },
            PestRow {
                pest_name: "".into(),
                level: None,
            },
        ];

        assert_eq!(extract_unleveled_rows(&form), vec![1, 2]);
    }

    #[test]
    fn test_collect_known_pests_dedups() {
        let mut form = FormState::default();
        form.pest_rows = vec![
            PestRow {
                pest_name: "Potkan".into(),
                level: None,
            },
            PestRow {
                pest_name: " Potkan ".into(),
                level: None,
            },
            PestRow {
                pest_name: "Myš".into(),
                level: None,
            },
        ];

        assert_eq!(collect_known_pests(&form), vec!["Potkan", "Myš"]);
    }

    #[test]
    fn test_resolve_level_by_number() {
        assert_eq!(resolve_level("1"), "Nízký");
        assert_eq!(resolve_level("3"), "Vysoký");
        assert_eq!(resolve_level("9"), "9");
        assert_eq!(resolve_level("Extrémní"), "Extrémní");
    }
}
