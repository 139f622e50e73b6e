//! Command-line surface.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use qaflow_core::types::JsonMap;
use qaflow_core::workflow::{AuthType, Credentials, WorkflowConfig, WorkflowType};

#[derive(Parser, Debug)]
#[command(name = "qaflow", author, version, long_about = None)]
#[command(about = "Drive QA workflows on a remote orchestrator")]
pub struct Cli {
    /// Orchestrator base URL (overrides QAFLOW_API_URL)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start a workflow and follow it until it finishes
    Run(RunArgs),
    /// Print the current status of a workflow
    Status {
        #[arg(value_name = "WORKFLOW_ID")]
        workflow_id: String,
    },
    /// Print the results of a finished workflow
    Results {
        #[arg(value_name = "WORKFLOW_ID")]
        workflow_id: String,
    },
    /// Print the aggregate health of the backing services
    Health,
    /// Check that the orchestrator is reachable
    Ping,
    /// List workflows known to the orchestrator
    List,
    /// Cancel a running workflow
    Cancel {
        #[arg(value_name = "WORKFLOW_ID")]
        workflow_id: String,
    },
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Read the whole workflow configuration from a JSON file
    #[arg(
        long,
        value_name = "PATH",
        conflicts_with_all = ["url", "workflow_type", "figma_file_key", "username", "requirements", "option"]
    )]
    pub config: Option<PathBuf>,

    /// Target site URL
    #[arg(long, required_unless_present = "config")]
    pub url: Option<String>,

    /// Pipeline variant
    #[arg(long = "type", value_enum)]
    pub workflow_type: Option<WorkflowKind>,

    /// Figma file key used as the design reference
    #[arg(long, value_name = "KEY")]
    pub figma_file_key: Option<String>,

    /// Username for the site under test
    #[arg(long)]
    pub username: Option<String>,

    /// Password for the site under test (needs --username)
    #[arg(long, env = "QAFLOW_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Authentication mechanism of the site under test
    #[arg(long, value_enum, requires = "username")]
    pub auth_type: Option<AuthKind>,

    /// JSON file holding parsed requirements
    #[arg(long, value_name = "PATH")]
    pub requirements: Option<PathBuf>,

    /// Extra workflow option as KEY=VALUE (VALUE parsed as JSON when possible)
    #[arg(long = "option", short = 'o', value_name = "KEY=VALUE")]
    pub option: Vec<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowKind {
    Quick,
    Full,
}

impl From<WorkflowKind> for WorkflowType {
    fn from(kind: WorkflowKind) -> Self {
        match kind {
            WorkflowKind::Quick => Self::Quick,
            WorkflowKind::Full => Self::Full,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthKind {
    FormBased,
    Oauth,
    Saml,
    BasicAuth,
    Auto,
}

impl From<AuthKind> for AuthType {
    fn from(kind: AuthKind) -> Self {
        match kind {
            AuthKind::FormBased => Self::FormBased,
            AuthKind::Oauth => Self::Oauth,
            AuthKind::Saml => Self::Saml,
            AuthKind::BasicAuth => Self::BasicAuth,
            AuthKind::Auto => Self::Auto,
        }
    }
}

impl RunArgs {
    /// Assemble the workflow configuration from flags or the config file.
    pub fn into_config(self) -> anyhow::Result<WorkflowConfig> {
        if let Some(path) = &self.config {
            return read_json(path);
        }

        let Some(url) = self.url else {
            bail!("--url is required unless --config is given");
        };
        if self.password.is_some() && self.username.is_none() {
            bail!("--password (or QAFLOW_PASSWORD) was given without --username");
        }
        let workflow_type = self.workflow_type.map(WorkflowType::from).unwrap_or_default();
        let mut config = WorkflowConfig::new(url, workflow_type);

        config.figma_file_key = self.figma_file_key;
        config.credentials = self.username.map(|username| Credentials {
            username,
            password: self.password.unwrap_or_default(),
            auth_type: self.auth_type.map(AuthType::from).unwrap_or_default(),
            additional_fields: JsonMap::new(),
        });
        if let Some(path) = &self.requirements {
            config.requirements_data = Some(read_json(path)?);
        }
        for pair in &self.option {
            let (key, value) = parse_option(pair)?;
            config.options.insert(key, value);
        }

        Ok(config)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// Split `KEY=VALUE`. The value is taken as JSON if it parses, otherwise
/// as a plain string.
fn parse_option(pair: &str) -> anyhow::Result<(String, serde_json::Value)> {
    let Some((key, raw)) = pair.split_once('=') else {
        bail!("Option '{pair}' must have the form KEY=VALUE");
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("Option '{pair}' has an empty key");
    }
    let value = serde_json::from_str(raw)
        .unwrap_or_else(|_| serde_json::Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use serde_json::json;

    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("qaflow").chain(args.iter().copied())).unwrap()
    }

    fn run_args(args: &[&str]) -> RunArgs {
        match parse(args).command {
            Command::Run(run) => run,
            other => panic!("expected run, got {other:?}"),
        }
    }

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_flags_build_a_config() {
        let config = run_args(&[
            "run",
            "--url",
            "https://app.example.com",
            "--type",
            "quick",
            "--figma-file-key",
            "abc123",
            "--username",
            "qa@example.com",
            "--password",
            "secret",
            "--auth-type",
            "basic-auth",
            "-o",
            "headless=false",
            "-o",
            "label=nightly",
        ])
        .into_config()
        .unwrap();

        assert_eq!(config.url, "https://app.example.com");
        assert_eq!(config.workflow_type, WorkflowType::Quick);
        assert_eq!(config.figma_file_key.as_deref(), Some("abc123"));
        let credentials = config.credentials.unwrap();
        assert_eq!(credentials.username, "qa@example.com");
        assert_eq!(credentials.password, "secret");
        assert_eq!(credentials.auth_type, AuthType::BasicAuth);
        assert_eq!(config.options["headless"], json!(false));
        assert_eq!(config.options["label"], json!("nightly"));
    }

    #[test]
    fn workflow_type_defaults_to_full() {
        let config = run_args(&["run", "--url", "https://app.example.com"])
            .into_config()
            .unwrap();
        assert_eq!(config.workflow_type, WorkflowType::Full);
        assert!(config.credentials.is_none());
    }

    #[test]
    fn url_or_config_is_required() {
        assert!(Cli::try_parse_from(["qaflow", "run"]).is_err());
    }

    #[test]
    fn password_without_username_is_rejected() {
        let err = run_args(&["run", "--url", "https://app.example.com", "--password", "secret"])
            .into_config()
            .unwrap_err();
        assert!(err.to_string().contains("--username"), "{err}");
    }

    #[test]
    fn config_file_conflicts_with_flags() {
        assert!(Cli::try_parse_from([
            "qaflow",
            "run",
            "--config",
            "wf.json",
            "--url",
            "https://app.example.com",
        ])
        .is_err());
    }

    #[test]
    fn config_file_is_read_as_workflow_config() {
        let path = std::env::temp_dir().join(format!("qaflow-cli-test-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{"url": "https://app.example.com", "workflow_type": "full_analysis", "options": {"retries": 2}}"#,
        )
        .unwrap();

        let config = run_args(&["run", "--config", path.to_str().unwrap()])
            .into_config()
            .unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.workflow_type, WorkflowType::Full);
        assert_eq!(config.options["retries"], json!(2));
    }

    #[test]
    fn malformed_option_is_rejected() {
        assert!(parse_option("novalue").is_err());
        assert!(parse_option("=1").is_err());
        assert_eq!(parse_option("a=b=c").unwrap(), ("a".into(), json!("b=c")));
    }

    #[test]
    fn api_url_is_global() {
        let cli = parse(&["health", "--api-url", "http://orchestrator:8006"]);
        assert_eq!(cli.api_url.as_deref(), Some("http://orchestrator:8006"));
        assert!(matches!(cli.command, Command::Health));
    }
}
