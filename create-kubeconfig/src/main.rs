use std::fmt;
use std::path::Path;

use anyhow::Context as _;
use clap::Parser;
use tracing::info;
use tracing::level_filters::LevelFilter;

use kubeconfig::{resolve_token_path, write_config, write_token, KubeConfig};

#[derive(Parser, Debug)]
#[command(about = "Generates a single-cluster kubeconfig for a service account")]
struct Options {
    /// Level at which to log output.
    #[arg(long, default_value = "info")]
    log_level: String,
    /// Path to the kubeconfig file to write.
    #[arg(long, default_value = "")]
    kubeconfig: String,
    /// The token to use in the kubeconfig file.
    #[arg(long, default_value = "")]
    token: String,
    /// Path to the token file to reference from the kubeconfig file. A bare
    /// file name is saved under the same directory as the kubeconfig file.
    #[arg(long, default_value = "")]
    token_file: String,
    /// The Kubernetes API server.
    #[arg(long, default_value = "")]
    server: String,
    /// The cluster name.
    #[arg(long, default_value = "")]
    cluster: String,
    /// The service account.
    #[arg(long, default_value = "")]
    service_account: String,
    /// The namespace of the service account.
    #[arg(long, default_value = "ci")]
    namespace: String,
}

#[derive(Debug, PartialEq, Eq)]
enum ValidationError {
    InvalidLogLevel(String),
    MissingToken,
    MissingFlag(&'static str),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLogLevel(level) => write!(f, "invalid --log-level: {level}"),
            Self::MissingToken => {
                write!(f, "either --token or --token-file must be specified")
            }
            Self::MissingFlag(flag) => write!(f, "--{flag} must be specified"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Checks the flags in a fixed order, reporting the first violation. Pure;
/// nothing is opened or written here. Returns the parsed log level.
fn validate(o: &Options) -> Result<LevelFilter, ValidationError> {
    let level = o
        .log_level
        .parse::<LevelFilter>()
        .map_err(|_| ValidationError::InvalidLogLevel(o.log_level.clone()))?;

    if o.token.is_empty() && o.token_file.is_empty() {
        return Err(ValidationError::MissingToken);
    }
    let required = [
        ("service-account", &o.service_account),
        ("namespace", &o.namespace),
        ("cluster", &o.cluster),
        ("server", &o.server),
        ("kubeconfig", &o.kubeconfig),
    ];
    for (flag, value) in required {
        if value.is_empty() {
            return Err(ValidationError::MissingFlag(flag));
        }
    }

    Ok(level)
}

fn run(o: &Options) -> anyhow::Result<()> {
    let kc = KubeConfig::single_cluster(&o.server, &o.cluster, &o.namespace, &o.token, &o.token_file);

    let kubeconfig = Path::new(&o.kubeconfig);
    write_config(&kc, kubeconfig)
        .with_context(|| format!("failed to write the kubeconfig file {}", o.kubeconfig))?;
    info!(kubeconfig = %o.kubeconfig, "wrote kubeconfig");

    // The document references the token file; provision its contents when a
    // literal token was supplied alongside it. A failure here leaves the
    // already-written kubeconfig in place.
    if !o.token.is_empty() && !o.token_file.is_empty() {
        let path = resolve_token_path(&o.token_file, kubeconfig);
        write_token(&path, &o.token)
            .with_context(|| format!("failed to write the token file {}", path.display()))?;
        info!(token_file = %path.display(), "wrote token file");
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    let o = Options::parse();
    let level = validate(&o).context("invalid options")?;
    tracing_subscriber::fmt().with_max_level(level).init();

    run(&o)
}
