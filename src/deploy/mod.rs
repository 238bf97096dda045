//! Build and deploy orchestration.
//!
//! Builds the backend package and the frontend bundle, then ships both with
//! Terraform. Steps run in order and the first failing command stops the run.

mod runner;

pub use runner::{CommandOutput, CommandRunner, CommandSpec, SystemRunner};

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Exit code reported when a command could not be started.
pub const EXIT_NOT_FOUND: i32 = 127;

/// Project layout and credentials for deploys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    pub backend_dir: PathBuf,
    pub ui_dir: PathBuf,
    pub iac_dir: PathBuf,
    /// Command that packages the backend, run in `backend_dir`.
    pub backend_build: Vec<String>,
    pub aws_profile: Option<String>,
    pub aws_region: Option<String>,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            backend_dir: PathBuf::from("backend"),
            ui_dir: PathBuf::from("ui"),
            iac_dir: PathBuf::from("iac"),
            backend_build: vec!["python3".to_string(), "build.py".to_string()],
            aws_profile: None,
            aws_region: None,
        }
    }
}

/// Which parts of a deploy to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeployOptions {
    pub skip_backend: bool,
    pub skip_frontend: bool,
    pub plan_only: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployStep {
    Backend,
    Frontend,
    TerraformInit,
    TerraformPlan,
    TerraformApply,
}

impl fmt::Display for DeployStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Backend => "Building backend",
            Self::Frontend => "Building frontend",
            Self::TerraformInit => "Initializing Terraform",
            Self::TerraformPlan => "Running Terraform plan",
            Self::TerraformApply => "Applying Terraform changes",
        })
    }
}

/// Progress reported while a deploy runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployEvent {
    StepStarted(DeployStep),
    StepSkipped(DeployStep),
    CommandStarted(String),
    CommandSucceeded { command: String, stdout: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployOutcome {
    Planned,
    Applied,
}

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("Command `{command}` failed with exit code {code}")]
    CommandFailed {
        command: String,
        code: i32,
        stdout: String,
        stderr: String,
    },

    #[error("Backend build command is empty")]
    EmptyBuildCommand,
}

impl DeployError {
    /// Process exit code to terminate with.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::CommandFailed { code, .. } => *code,
            Self::EmptyBuildCommand => 1,
        }
    }
}

/// Runs the deploy sequence through a [`CommandRunner`].
pub struct Deployer<R: CommandRunner> {
    config: DeployConfig,
    runner: R,
}

impl Deployer<SystemRunner> {
    pub fn new(config: DeployConfig) -> Self {
        Self::with_runner(config, SystemRunner)
    }
}

impl<R: CommandRunner> Deployer<R> {
    pub fn with_runner(config: DeployConfig, runner: R) -> Self {
        Self { config, runner }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Run the deploy, reporting progress to `on_event`.
    pub fn run(
        &self,
        options: DeployOptions,
        mut on_event: impl FnMut(DeployEvent),
    ) -> Result<DeployOutcome, DeployError> {
        if options.skip_backend {
            on_event(DeployEvent::StepSkipped(DeployStep::Backend));
        } else {
            on_event(DeployEvent::StepStarted(DeployStep::Backend));
            self.build_backend(&mut on_event)?;
        }

        if options.skip_frontend {
            on_event(DeployEvent::StepSkipped(DeployStep::Frontend));
        } else {
            on_event(DeployEvent::StepStarted(DeployStep::Frontend));
            self.build_frontend(&mut on_event)?;
        }

        on_event(DeployEvent::StepStarted(DeployStep::TerraformInit));
        self.execute(self.terraform(&["init"]), &mut on_event)?;

        if options.plan_only {
            on_event(DeployEvent::StepStarted(DeployStep::TerraformPlan));
            self.execute(self.terraform(&["plan"]), &mut on_event)?;
            Ok(DeployOutcome::Planned)
        } else {
            on_event(DeployEvent::StepStarted(DeployStep::TerraformApply));
            self.execute(self.terraform(&["apply", "-auto-approve"]), &mut on_event)?;
            Ok(DeployOutcome::Applied)
        }
    }

    fn build_backend(&self, on_event: &mut impl FnMut(DeployEvent)) -> Result<(), DeployError> {
        let (program, args) = self
            .config
            .backend_build
            .split_first()
            .ok_or(DeployError::EmptyBuildCommand)?;
        let spec = CommandSpec::new(program, &self.config.backend_dir).args(args);
        self.execute(spec, on_event)
    }

    fn build_frontend(&self, on_event: &mut impl FnMut(DeployEvent)) -> Result<(), DeployError> {
        let ui_dir = &self.config.ui_dir;
        if !ui_dir.join("node_modules").exists() {
            self.execute(CommandSpec::new("npm", ui_dir).arg("install"), &mut *on_event)?;
        }
        self.execute(
            CommandSpec::new("npm", ui_dir).args(["run", "build"]),
            on_event,
        )
    }

    fn terraform(&self, args: &[&str]) -> CommandSpec {
        let mut spec = CommandSpec::new("terraform", &self.config.iac_dir).args(args);
        if let Some(profile) = &self.config.aws_profile {
            spec = spec.env("AWS_PROFILE", profile);
        }
        if let Some(region) = &self.config.aws_region {
            spec = spec.env("AWS_REGION", region);
        }
        spec
    }

    fn execute(
        &self,
        spec: CommandSpec,
        on_event: &mut impl FnMut(DeployEvent),
    ) -> Result<(), DeployError> {
        let command = spec.to_string();
        on_event(DeployEvent::CommandStarted(command.clone()));
        tracing::info!("Running: {} (in {})", command, spec.cwd.display());

        let output = match self.runner.run(&spec) {
            Ok(output) => output,
            Err(e) => {
                let code = if e.kind() == std::io::ErrorKind::NotFound {
                    EXIT_NOT_FOUND
                } else {
                    1
                };
                return Err(DeployError::CommandFailed {
                    command,
                    code,
                    stdout: String::new(),
                    stderr: e.to_string(),
                });
            }
        };

        if output.success() {
            on_event(DeployEvent::CommandSucceeded {
                command,
                stdout: output.stdout,
            });
            return Ok(());
        }

        // Killed by a signal.
        let code = output.code.unwrap_or(1);
        tracing::warn!("{} exited with code {}", command, code);
        Err(DeployError::CommandFailed {
            command,
            code,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::{tempdir, TempDir};

    /// Records commands; fails the first command whose text contains `fail_on`.
    #[derive(Default)]
    struct RecordingRunner {
        calls: Mutex<Vec<CommandSpec>>,
        fail_on: Option<(&'static str, Option<i32>)>,
        missing: Option<&'static str>,
    }

    impl RecordingRunner {
        fn commands(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|c| c.to_string())
                .collect()
        }
    }

    impl CommandRunner for RecordingRunner {
        fn run(&self, command: &CommandSpec) -> std::io::Result<CommandOutput> {
            self.calls.lock().unwrap().push(command.clone());
            if self.missing == Some(command.program.as_str()) {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "No such file or directory",
                ));
            }
            match self.fail_on {
                Some((needle, code)) if command.to_string().contains(needle) => Ok(CommandOutput {
                    code,
                    stdout: "partial".to_string(),
                    stderr: "boom".to_string(),
                }),
                _ => Ok(CommandOutput {
                    code: Some(0),
                    stdout: "ok".to_string(),
                    stderr: String::new(),
                }),
            }
        }
    }

    fn project() -> (TempDir, DeployConfig) {
        let dir = tempdir().unwrap();
        let config = DeployConfig {
            backend_dir: dir.path().join("backend"),
            ui_dir: dir.path().join("ui"),
            iac_dir: dir.path().join("iac"),
            ..Default::default()
        };
        (dir, config)
    }

    fn skip_builds() -> DeployOptions {
        DeployOptions {
            skip_backend: true,
            skip_frontend: true,
            plan_only: false,
        }
    }

    #[test]
    fn test_skip_builds_runs_only_terraform() {
        let (_dir, config) = project();
        let deployer = Deployer::with_runner(config.clone(), RecordingRunner::default());
        let mut events = Vec::new();

        let outcome = deployer.run(skip_builds(), |e| events.push(e)).unwrap();

        assert_eq!(outcome, DeployOutcome::Applied);
        assert_eq!(
            deployer.runner().commands(),
            vec!["terraform init", "terraform apply -auto-approve"]
        );
        assert!(deployer
            .runner()
            .calls
            .lock()
            .unwrap()
            .iter()
            .all(|c| c.cwd == config.iac_dir));
        assert!(events.contains(&DeployEvent::StepSkipped(DeployStep::Backend)));
        assert!(events.contains(&DeployEvent::StepSkipped(DeployStep::Frontend)));
    }

    #[test]
    fn test_plan_only() {
        let (_dir, config) = project();
        let deployer = Deployer::with_runner(config, RecordingRunner::default());
        let options = DeployOptions {
            plan_only: true,
            ..skip_builds()
        };

        assert_eq!(deployer.run(options, |_| {}).unwrap(), DeployOutcome::Planned);
        assert_eq!(
            deployer.runner().commands(),
            vec!["terraform init", "terraform plan"]
        );
    }

    #[test]
    fn test_full_deploy_sequence() {
        let (_dir, config) = project();
        let deployer = Deployer::with_runner(config.clone(), RecordingRunner::default());

        deployer.run(DeployOptions::default(), |_| {}).unwrap();

        assert_eq!(
            deployer.runner().commands(),
            vec![
                "python3 build.py",
                "npm install",
                "npm run build",
                "terraform init",
                "terraform apply -auto-approve",
            ]
        );
        let calls = deployer.runner().calls.lock().unwrap().clone();
        assert_eq!(calls[0].cwd, config.backend_dir);
        assert_eq!(calls[1].cwd, config.ui_dir);
    }

    #[test]
    fn test_npm_install_skipped_when_node_modules_present() {
        let (_dir, config) = project();
        std::fs::create_dir_all(config.ui_dir.join("node_modules")).unwrap();
        let deployer = Deployer::with_runner(config, RecordingRunner::default());
        let options = DeployOptions {
            skip_backend: true,
            ..Default::default()
        };

        deployer.run(options, |_| {}).unwrap();

        assert_eq!(
            deployer.runner().commands(),
            vec![
                "npm run build",
                "terraform init",
                "terraform apply -auto-approve"
            ]
        );
    }

    #[test]
    fn test_failure_stops_sequence_with_exit_code() {
        let (_dir, config) = project();
        let runner = RecordingRunner {
            fail_on: Some(("npm run build", Some(2))),
            ..Default::default()
        };
        let deployer = Deployer::with_runner(config, runner);

        let err = deployer.run(DeployOptions::default(), |_| {}).unwrap_err();

        assert_eq!(err.exit_code(), 2);
        match err {
            DeployError::CommandFailed {
                command,
                stdout,
                stderr,
                ..
            } => {
                assert_eq!(command, "npm run build");
                assert_eq!(stdout, "partial");
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!deployer
            .runner()
            .commands()
            .iter()
            .any(|c| c.starts_with("terraform")));
    }

    #[test]
    fn test_signal_and_missing_program_codes() {
        let (_dir, config) = project();
        let runner = RecordingRunner {
            fail_on: Some(("terraform init", None)),
            ..Default::default()
        };
        let err = Deployer::with_runner(config.clone(), runner)
            .run(skip_builds(), |_| {})
            .unwrap_err();
        assert_eq!(err.exit_code(), 1);

        let runner = RecordingRunner {
            missing: Some("terraform"),
            ..Default::default()
        };
        let err = Deployer::with_runner(config, runner)
            .run(skip_builds(), |_| {})
            .unwrap_err();
        assert_eq!(err.exit_code(), EXIT_NOT_FOUND);
    }

    #[test]
    fn test_aws_environment_only_on_terraform() {
        let (_dir, mut config) = project();
        config.aws_profile = Some("deployer".to_string());
        config.aws_region = Some("us-west-1".to_string());
        config.backend_build = vec!["make".to_string(), "package".to_string()];
        let deployer = Deployer::with_runner(config, RecordingRunner::default());
        let options = DeployOptions {
            skip_frontend: true,
            ..Default::default()
        };

        deployer.run(options, |_| {}).unwrap();

        let calls = deployer.runner().calls.lock().unwrap().clone();
        assert_eq!(calls[0].to_string(), "make package");
        assert!(calls[0].env.is_empty());
        for call in &calls[1..] {
            assert_eq!(
                call.env,
                vec![
                    ("AWS_PROFILE".to_string(), "deployer".to_string()),
                    ("AWS_REGION".to_string(), "us-west-1".to_string()),
                ]
            );
        }
    }

    #[test]
    fn test_empty_build_command() {
        let (_dir, mut config) = project();
        config.backend_build.clear();
        let err = Deployer::with_runner(config, RecordingRunner::default())
            .run(DeployOptions::default(), |_| {})
            .unwrap_err();
        assert!(matches!(err, DeployError::EmptyBuildCommand));
    }
}
