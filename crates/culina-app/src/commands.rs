//! Command handlers. Each prints to `out` and returns `culina_core::Result`.

use std::collections::HashSet;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};
use uuid::Uuid;

use culina_chat::{ChatSession, SendOutcome};
use culina_core::error::{CulinaError, Result};
use culina_core::types::{Category, CategoryFilter, InventoryItem, ReviewCandidate};
use culina_inventory::{new_item, InventoryError, ScanOutcome, ScanPipeline, Selection};

use crate::app::App;
use crate::photo::FilePhotoSource;

/// Field changes for `inventory edit`. `None` keeps the current value.
#[derive(Debug, Default, Clone)]
pub struct ItemChanges {
    pub name: Option<String>,
    pub category: Option<Category>,
    pub amount: Option<String>,
    pub expires: Option<String>,
}

fn format_item(item: &InventoryItem) -> String {
    let mut details = Vec::new();
    if !item.amount.is_empty() {
        details.push(item.amount.clone());
    }
    if !item.expiration_date.is_empty() {
        details.push(format!("expires {}", item.expiration_date));
    }
    format!(
        "{}  {:<24} {:<8} {}",
        item.id,
        item.name,
        item.category.to_string(),
        details.join(", ")
    )
    .trim_end()
    .to_string()
}

// =============================================================================
// Inventory
// =============================================================================

/// Show the inventory. Items still missing a picture are looked up first.
pub async fn inventory_list(app: &App, filter: CategoryFilter, out: &mut dyn Write) -> Result<()> {
    let found = app.inventory.enrich(app.api.as_ref()).await;
    if found > 0 {
        debug!(count = found, "Pictures found before listing");
    }
    app.inventory.set_filter(filter);
    let items = app.inventory.visible_items();
    if items.is_empty() {
        writeln!(out, "No ingredients ({}).", filter)?;
        return Ok(());
    }
    for item in &items {
        writeln!(out, "{}", format_item(item))?;
    }
    Ok(())
}

pub async fn inventory_add(
    app: &App,
    name: &str,
    category: Category,
    amount: Option<String>,
    expires: Option<String>,
    out: &mut dyn Write,
) -> Result<InventoryItem> {
    if app.inventory.contains_name(name) {
        writeln!(out, "Note: {} is already listed.", name.trim())?;
    }
    let item = new_item(name, category, amount.unwrap_or_default(), expires.unwrap_or_default());
    app.inventory.add_item(item.clone()).await?;
    writeln!(out, "Added {}", format_item(&item))?;
    Ok(item)
}

pub async fn inventory_edit(app: &App, id: Uuid, changes: ItemChanges, out: &mut dyn Write) -> Result<()> {
    let Some(mut item) = app.inventory.get(id) else {
        return Err(CulinaError::Validation(format!("no ingredient with id {}", id)));
    };
    if let Some(name) = changes.name {
        item.name = name.trim().to_string();
    }
    if let Some(category) = changes.category {
        item.category = category;
    }
    if let Some(amount) = changes.amount {
        item.amount = amount;
    }
    if let Some(expires) = changes.expires {
        item.expiration_date = expires;
    }
    app.inventory.upsert_item(item.clone()).await?;
    writeln!(out, "Updated {}", format_item(&item))?;
    Ok(())
}

pub async fn inventory_remove(app: &App, ids: &[Uuid], out: &mut dyn Write) -> Result<usize> {
    let unique: HashSet<Uuid> = ids.iter().copied().collect();
    let mut selection = Selection::new();
    selection.toggle_mode();
    for id in &unique {
        selection.toggle(*id);
    }
    let removed = selection.delete_selected(&app.inventory).await;
    if removed < unique.len() {
        warn!(requested = unique.len(), removed, "Some ids were not in the inventory");
    }
    writeln!(out, "Removed {} ingredient(s).", removed)?;
    Ok(removed)
}

pub async fn inventory_enrich(app: &App, out: &mut dyn Write) -> Result<usize> {
    let updated = app.inventory.enrich(app.api.as_ref()).await;
    writeln!(out, "Found pictures for {} ingredient(s).", updated)?;
    Ok(updated)
}

// =============================================================================
// Scan
// =============================================================================

/// Scan `photo`. With `yes`, every candidate is accepted; otherwise the
/// review is driven by lines read from `input`.
pub async fn scan<R>(app: &App, photo: &Path, yes: bool, input: &mut R, out: &mut dyn Write) -> Result<Vec<InventoryItem>>
where
    R: AsyncBufRead + Unpin,
{
    let photos = Arc::new(FilePhotoSource::new(photo, app.config.scan.fallback_mime_type.clone()));
    let pipeline = app.scan_pipeline(photos);

    match pipeline.scan().await? {
        ScanOutcome::Notice(notice) => {
            writeln!(out, "{}", notice)?;
            Ok(Vec::new())
        }
        ScanOutcome::Review(_) if yes => confirm(&pipeline, out).await,
        ScanOutcome::Review(_) => review(&pipeline, input, out).await,
    }
}

fn print_candidates(candidates: &[ReviewCandidate], out: &mut dyn Write) -> Result<()> {
    writeln!(out, "Found:")?;
    for (n, candidate) in candidates.iter().enumerate() {
        writeln!(out, "  {}. {}", n + 1, candidate.name)?;
    }
    Ok(())
}

fn candidate_at(pipeline: &ScanPipeline, number: &str) -> Option<Uuid> {
    let index = number.parse::<usize>().ok()?.checked_sub(1)?;
    pipeline.candidates().get(index).map(|c| c.id)
}

async fn confirm(pipeline: &ScanPipeline, out: &mut dyn Write) -> Result<Vec<InventoryItem>> {
    let added = pipeline.confirm().await?;
    writeln!(out, "Added {} ingredient(s):", added.len())?;
    for item in &added {
        writeln!(out, "  {}", item.name)?;
    }
    Ok(added)
}

async fn review<R>(pipeline: &ScanPipeline, input: &mut R, out: &mut dyn Write) -> Result<Vec<InventoryItem>>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    loop {
        print_candidates(&pipeline.candidates(), out)?;
        writeln!(out, "[enter] add all, rename <n> <name>, drop <n>, cancel")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            pipeline.cancel()?;
            writeln!(out, "Scan cancelled.")?;
            return Ok(Vec::new());
        };
        let line = line.trim();
        let (verb, rest) = line.split_once(' ').unwrap_or((line, ""));

        let result = match verb {
            "" | "y" | "yes" | "ok" => {
                if !pipeline.can_confirm() {
                    Err(InventoryError::EmptyReview)
                } else {
                    return confirm(pipeline, out).await;
                }
            }
            "cancel" | "n" | "no" => {
                pipeline.cancel()?;
                writeln!(out, "Scan cancelled.")?;
                return Ok(Vec::new());
            }
            "rename" => {
                let (number, name) = rest.trim().split_once(' ').unwrap_or((rest.trim(), ""));
                match candidate_at(pipeline, number) {
                    Some(id) => pipeline.rename(id, name),
                    None => {
                        writeln!(out, "No candidate {}.", number)?;
                        Ok(())
                    }
                }
            }
            "drop" => match candidate_at(pipeline, rest.trim()) {
                Some(id) => pipeline.remove(id),
                None => {
                    writeln!(out, "No candidate {}.", rest.trim())?;
                    Ok(())
                }
            },
            other => {
                writeln!(out, "Unknown command: {}", other)?;
                Ok(())
            }
        };
        if let Err(e) = result {
            writeln!(out, "{}", e)?;
        }
    }
}

// =============================================================================
// Chat
// =============================================================================

/// Line-based chat REPL. `/clear` starts over, `/quit` or end of input exits.
pub async fn chat<R>(app: &App, input: &mut R, out: &mut dyn Write) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let session = app.chat_session();
    chat_loop(&session, input, out).await
}

async fn chat_loop<R>(session: &ChatSession, input: &mut R, out: &mut dyn Write) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    loop {
        write!(out, "> ")?;
        out.flush()?;
        let Some(line) = lines.next_line().await? else {
            writeln!(out)?;
            return Ok(());
        };
        match line.trim() {
            "/quit" | "/exit" => return Ok(()),
            "/clear" => {
                session.clear()?;
                writeln!(out, "(conversation cleared)")?;
                continue;
            }
            _ => {}
        }
        match session.send_message(&line).await {
            SendOutcome::Ignored => {}
            SendOutcome::Replied(reply) => writeln!(out, "{}", reply)?,
            SendOutcome::Failed(e) => writeln!(out, "Error: {}", e)?,
            other => {
                if let Err(e) = other.into_result() {
                    writeln!(out, "{}", e)?;
                }
            }
        }
    }
}

// =============================================================================
// Preferences & health
// =============================================================================

pub async fn preferences_show(app: &App, out: &mut dyn Write) -> Result<()> {
    let text = app.preferences.load().await;
    if text.is_empty() {
        writeln!(out, "No preferences saved.")?;
    } else {
        writeln!(out, "{}", text)?;
    }
    Ok(())
}

pub async fn preferences_set(app: &App, text: &str, out: &mut dyn Write) -> Result<()> {
    if !app.preferences.save(text).await {
        return Err(CulinaError::Storage("could not save preferences".to_string()));
    }
    writeln!(out, "Preferences saved.")?;
    Ok(())
}

pub async fn ping(app: &App, out: &mut dyn Write) -> Result<()> {
    let message = app.api.ping().await?;
    info!(base_url = %app.api.base_url(), "Backend reachable");
    writeln!(out, "{} ({})", message, app.api.base_url())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_item() {
        let item = InventoryItem::new("Milk", Category::Fridge)
            .with_amount("1 l")
            .with_expiration_date("Friday");
        let line = format_item(&item);
        assert!(line.starts_with(&item.id.to_string()));
        assert!(line.contains("Milk"));
        assert!(line.contains("Fridge"));
        assert!(line.ends_with("1 l, expires Friday"));
    }

    #[test]
    fn test_format_item_without_details() {
        let line = format_item(&InventoryItem::new("Salt", Category::Pantry));
        assert!(line.ends_with("Pantry"));
    }
}
