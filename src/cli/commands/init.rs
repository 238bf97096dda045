//! Initialize command.

use console::style;

use crate::config::Settings;

/// Initialize the data directory and database.
pub async fn cmd_init(settings: &Settings) -> anyhow::Result<()> {
    settings.ensure_directories()?;

    let ctx = settings.create_db_context();
    ctx.init_schema().await?;

    let forms = settings.load_forms()?;
    if forms.is_empty() {
        println!(
            "{} No forms defined in {}",
            style("!").yellow(),
            settings.forms_dir.display()
        );
        println!("  Documents will be extracted generically until forms are added");
    } else {
        println!("  {} Loaded {} forms", style("✓").green(), forms.len());
    }

    let backend = settings.ocr_backend();
    if !backend.is_available() {
        println!("{} {}", style("!").yellow(), backend.availability_hint());
    }

    println!(
        "{} Initialized docextract in {}",
        style("✓").green(),
        settings.data_dir.display()
    );

    Ok(())
}
