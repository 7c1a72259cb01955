//! Form command implementations.
//!
//! Mutations print their result first and then run one sheet sync attempt
//! before the process exits (unless `--no-sync`). A failed sync is logged and
//! never changes the exit code.

use crate::cli::FormCommands;
use crate::config::default_actor;
use crate::error::{Error, Result};
use crate::model::{Form, FormUpdate, NewForm};
use crate::storage::events::get_events;
use crate::storage::SqliteStorage;
use crate::sync::{format_datetime, Grid};
use colored::Colorize;
use serde::Serialize;
use std::path::{Path, PathBuf};

use super::existing_db_path;
use super::sync::sync_after_mutation;

/// Output for form list.
#[derive(Serialize)]
struct FormListOutput<'a> {
    forms: &'a [Form],
    count: usize,
    total: usize,
}

#[derive(Serialize)]
struct EventOutput {
    event_type: &'static str,
    actor: String,
    old_value: Option<String>,
    new_value: Option<String>,
    created_at: String,
}

/// Execute form commands.
pub fn execute(
    command: &FormCommands,
    db_path: Option<&PathBuf>,
    actor: Option<&str>,
    no_sync: bool,
    json: bool,
) -> Result<()> {
    let db_path = existing_db_path(db_path)?;
    let actor = actor.map_or_else(default_actor, ToString::to_string);

    let mutated = match command {
        FormCommands::Create {
            name,
            email,
            phone_number,
            company,
            service,
            message,
        } => {
            let form = NewForm {
                name: name.clone(),
                email: email.clone(),
                phone_number: phone_number.clone(),
                message: message.clone(),
                company: company.clone(),
                service: service.clone(),
            };
            create(&db_path, &form, &actor, json)?;
            true
        }
        FormCommands::List { skip, limit, all } => {
            list(&db_path, *skip, *limit, *all, json)?;
            false
        }
        FormCommands::Show { id } => {
            show(&db_path, *id, json)?;
            false
        }
        FormCommands::Update {
            id,
            name,
            email,
            phone_number,
            company,
            service,
            message,
            clear_message,
        } => {
            let update = FormUpdate {
                name: name.clone(),
                email: email.clone(),
                phone_number: phone_number.clone(),
                message: if *clear_message {
                    Some(None)
                } else {
                    message.clone().map(Some)
                },
                company: company.clone(),
                service: service.clone(),
            };
            update_form(&db_path, *id, &update, &actor, json)?;
            true
        }
        FormCommands::Delete { id } => {
            delete(&db_path, *id, &actor, json)?;
            true
        }
        FormCommands::History { id, limit } => {
            history(&db_path, *id, *limit, json)?;
            false
        }
    };

    if mutated && !no_sync {
        sync_after_mutation(&db_path);
    }

    Ok(())
}

fn create(db_path: &Path, form: &NewForm, actor: &str, json: bool) -> Result<()> {
    form.validate()?;

    let mut storage = SqliteStorage::open(db_path)?;
    let created = storage.create_form(form, actor)?;

    if json {
        println!("{}", serde_json::to_string(&created)?);
    } else {
        println!("Created form #{}: {}", created.id, created.name);
    }

    Ok(())
}

fn list(db_path: &Path, skip: u32, limit: u32, all: bool, json: bool) -> Result<()> {
    let storage = SqliteStorage::open(db_path)?;
    let forms = if all {
        storage.list_all_forms()?
    } else {
        storage.list_forms(skip, limit)?
    };

    if crate::is_csv() {
        print!("{}", Grid::from_forms(&forms).to_csv());
    } else if json {
        let output = FormListOutput {
            forms: &forms,
            count: forms.len(),
            total: storage.count_forms()?,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else if forms.is_empty() {
        println!("No forms found.");
    } else {
        println!("Forms ({} of {}):", forms.len(), storage.count_forms()?);
        println!();
        for form in &forms {
            println!(
                "  #{:<5} {} <{}>",
                form.id,
                form.name.bold(),
                form.email
            );
            println!(
                "         {} / {}  {}",
                form.company,
                form.service,
                format_datetime(Some(form.created_at.naive_utc())).dimmed()
            );
        }
    }

    Ok(())
}

fn show(db_path: &Path, id: i64, json: bool) -> Result<()> {
    let storage = SqliteStorage::open(db_path)?;
    let form = storage.get_form(id)?.ok_or(Error::FormNotFound { id })?;

    if json {
        println!("{}", serde_json::to_string(&form)?);
    } else {
        print_form(&form);
    }

    Ok(())
}

fn print_form(form: &Form) {
    println!("{} {}", format!("Form #{}", form.id).bold(), form.name);
    println!("  Email:    {}", form.email);
    println!("  Phone:    {}", form.phone_number);
    println!("  Company:  {}", form.company);
    println!("  Service:  {}", form.service);
    if let Some(message) = &form.message {
        println!("  Message:  {message}");
    }
    println!("  Created:  {}", format_datetime(Some(form.created_at.naive_utc())));
    if let Some(updated) = form.updated_at {
        println!("  Updated:  {}", format_datetime(Some(updated.naive_utc())));
    }
}

fn update_form(db_path: &Path, id: i64, update: &FormUpdate, actor: &str, json: bool) -> Result<()> {
    if update.is_empty() {
        return Err(Error::InvalidArgument(
            "nothing to update; pass at least one field".to_string(),
        ));
    }

    let mut storage = SqliteStorage::open(db_path)?;
    if storage.get_form(id)?.is_none() {
        return Err(Error::FormNotFound { id });
    }
    update.validate()?;

    let updated = storage
        .update_form(id, update, actor)?
        .ok_or(Error::FormNotFound { id })?;

    if json {
        println!("{}", serde_json::to_string(&updated)?);
    } else {
        println!("Updated form #{id}");
    }

    Ok(())
}

fn delete(db_path: &Path, id: i64, actor: &str, json: bool) -> Result<()> {
    let mut storage = SqliteStorage::open(db_path)?;
    if !storage.delete_form(id, actor)? {
        return Err(Error::FormNotFound { id });
    }

    if json {
        println!("{}", serde_json::json!({ "id": id, "deleted": true }));
    } else {
        println!("Deleted form #{id}");
    }

    Ok(())
}

fn history(db_path: &Path, id: i64, limit: u32, json: bool) -> Result<()> {
    let storage = SqliteStorage::open(db_path)?;
    let events = get_events(storage.conn(), "form", &id.to_string(), Some(limit))?;

    let events: Vec<EventOutput> = events
        .into_iter()
        .map(|e| EventOutput {
            event_type: e.event_type.as_str(),
            actor: e.actor,
            old_value: e.old_value,
            new_value: e.new_value,
            created_at: chrono::DateTime::from_timestamp_millis(e.created_at)
                .map(|dt| dt.to_rfc3339())
                .unwrap_or_default(),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string(&events)?);
    } else if events.is_empty() {
        println!("No history for form #{id}.");
    } else {
        println!("History for form #{id}:");
        for event in &events {
            println!(
                "  {}  {:<13} by {}",
                event.created_at.dimmed(),
                event.event_type,
                event.actor
            );
            if let Some(new_value) = &event.new_value {
                println!("      {new_value}");
            }
        }
    }

    Ok(())
}
