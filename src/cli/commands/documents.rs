//! Document commands: register, text, extract, show, list.

use std::sync::Arc;

use console::style;

use super::helpers::{print_fields, styled_status, truncate};
use crate::config::Settings;
use crate::models::{document_id_from_url, DocumentItem, DocumentStatus};
use crate::ocr::Ocr;
use crate::services::{write_document, ExtractionService};

/// Register a document without processing it.
pub async fn cmd_register(settings: &Settings, url: &str, id: Option<&str>) -> anyhow::Result<()> {
    let id = id
        .map(str::to_string)
        .unwrap_or_else(|| document_id_from_url(url));

    let ctx = settings.create_db_context();
    write_document(&ctx.documents(), &id, url).await?;

    println!("{} Registered {} ({})", style("✓").green(), id, url);
    Ok(())
}

/// Print the raw OCR text of a document.
pub async fn cmd_text(settings: &Settings, url: &str) -> anyhow::Result<()> {
    let backend = settings.ocr_backend();
    if !backend.is_available() {
        tracing::warn!("{}", backend.availability_hint());
    }

    let location = url.to_string();
    let lines = tokio::task::spawn_blocking(move || backend.extract_raw_text(&location)).await??;

    for line in lines {
        println!("{}", line);
    }
    Ok(())
}

/// Run the extraction pipeline on a document.
pub async fn cmd_extract(
    settings: &Settings,
    url: &str,
    document_type: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let ctx = settings.create_db_context();
    let forms = settings.load_forms()?;
    tracing::debug!("Loaded {} forms from {}", forms.len(), settings.forms_dir.display());

    let service = ExtractionService::new(
        Arc::new(ctx.documents()),
        Arc::new(settings.ocr_backend()),
        forms,
    );

    if !json {
        println!("{} Extracting {}", style("→").cyan(), url);
    }
    let item = service.process(url, document_type).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&item)?);
    } else {
        print_item(&item);
    }
    Ok(())
}

/// Show a stored document.
pub async fn cmd_show(settings: &Settings, id: &str, json: bool) -> anyhow::Result<()> {
    let ctx = settings.create_db_context();
    let Some(stored) = ctx.documents().get_stored(id).await? else {
        anyhow::bail!("Document '{}' not found", id);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&stored.item)?);
        return Ok(());
    }

    print_item(&stored.item);
    println!(
        "  Created {}  Updated {}",
        stored.created_at.format("%Y-%m-%d %H:%M"),
        stored.updated_at.format("%Y-%m-%d %H:%M")
    );
    Ok(())
}

/// List stored documents.
pub async fn cmd_list(settings: &Settings, status: Option<&str>, limit: i64) -> anyhow::Result<()> {
    let status = status
        .map(|s| {
            DocumentStatus::from_str(s).ok_or_else(|| {
                anyhow::anyhow!("Unknown status '{}' (pending, complete, verified)", s)
            })
        })
        .transpose()?;

    let ctx = settings.create_db_context();
    let documents = ctx.documents().list(status, limit).await?;

    if documents.is_empty() {
        println!("{} No documents found", style("!").yellow());
        return Ok(());
    }

    println!("\n{}", style("Documents").bold());
    println!("{}", "-".repeat(90));
    println!(
        "{:<24} {:<10} {:<14} {:<16} URL",
        "ID", "Status", "Type", "Updated"
    );
    println!("{}", "-".repeat(90));

    for doc in documents {
        println!(
            "{:<24} {:<10} {:<14} {:<16} {}",
            truncate(&doc.item.id, 24),
            styled_status(doc.item.status),
            truncate(doc.item.document_type.as_deref().unwrap_or("-"), 14),
            doc.updated_at.format("%Y-%m-%d %H:%M"),
            doc.item.url
        );
    }

    Ok(())
}

fn print_item(item: &DocumentItem) {
    println!(
        "\n{} {} [{}]",
        style(&item.id).bold(),
        item.document_type.as_deref().unwrap_or("untyped"),
        styled_status(item.status)
    );
    println!("  {}", item.url);
    match &item.extracted_data {
        Some(data) => print_fields(data),
        None => println!("  {} Not extracted yet", style("!").yellow()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_show_missing_document_fails() {
        let dir = tempdir().unwrap();
        let settings = Settings::with_data_dir(dir.path().to_path_buf());
        settings.create_db_context().init_schema().await.unwrap();

        cmd_register(&settings, "s3://bucket/input/DogCow.png", None)
            .await
            .unwrap();

        assert!(cmd_show(&settings, "DogCow", false).await.is_ok());
        let err = cmd_show(&settings, "Moof", true).await.unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
