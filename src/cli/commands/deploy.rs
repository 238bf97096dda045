//! Deploy command.

use console::style;

use crate::config::Settings;
use crate::deploy::{DeployError, DeployEvent, DeployOptions, DeployOutcome, Deployer};

/// Build and deploy. Exits the process with the failing command's code.
pub async fn cmd_deploy(settings: &Settings, options: DeployOptions) -> anyhow::Result<()> {
    let deployer = Deployer::new(settings.deploy.clone());

    let result = tokio::task::spawn_blocking(move || deployer.run(options, print_event)).await?;

    match result {
        Ok(DeployOutcome::Planned) => {
            println!(
                "\n{} Terraform plan completed. Run without --plan-only to apply the changes.",
                style("✓").green()
            );
            Ok(())
        }
        Ok(DeployOutcome::Applied) => {
            println!("\n{} Deployment completed successfully!", style("✓").green());
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {}", style("✗").red(), e);
            if let DeployError::CommandFailed { stdout, stderr, .. } = &e {
                eprintln!("STDOUT: {}", stdout);
                eprintln!("STDERR: {}", stderr);
            }
            std::process::exit(e.exit_code());
        }
    }
}

fn print_event(event: DeployEvent) {
    match event {
        DeployEvent::StepStarted(step) => println!("{} {}", style("===").cyan(), step),
        DeployEvent::StepSkipped(step) => {
            println!("{} Skipping: {}", style("→").cyan(), step)
        }
        DeployEvent::CommandStarted(command) => println!("Running: {}", command),
        DeployEvent::CommandSucceeded { stdout, .. } => {
            if !stdout.trim().is_empty() {
                println!("{}", stdout.trim_end());
            }
        }
    }
}
