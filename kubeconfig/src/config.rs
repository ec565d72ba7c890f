use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::Context as _;
use serde::*;

// region: Cluster
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClusterSpec {
    pub server: String,
}
// endregion

// region: Context
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ContextSpec {
    pub cluster: String,
    pub namespace: String,
    pub user: String,
}
// endregion

// region: User
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields, untagged)]
pub enum UserSpec {
    Token {
        token: String,
    },
    #[serde(rename_all = "kebab-case")]
    TokenFile {
        token_file: String,
    },
}

impl UserSpec {
    /// A non-empty `token_file` wins over `token`: the document then holds a
    /// reference, and the literal token is only material for provisioning
    /// the referenced file (see [`crate::token::write_token`]).
    pub fn from_flags(token: &str, token_file: &str) -> Self {
        if token_file.is_empty() {
            UserSpec::Token {
                token: token.to_string(),
            }
        } else {
            UserSpec::TokenFile {
                token_file: token_file.to_string(),
            }
        }
    }
}
// endregion

/// A kubeconfig describing exactly one cluster/context/user triple.
///
/// All three maps are keyed by the same cluster identifier, which is also
/// the value of `current-context`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct KubeConfig {
    pub clusters: BTreeMap<String, ClusterSpec>,
    pub contexts: BTreeMap<String, ContextSpec>,
    pub current_context: String,
    pub users: BTreeMap<String, UserSpec>,
}

impl KubeConfig {
    pub fn single_cluster(
        server: &str,
        cluster: &str,
        namespace: &str,
        token: &str,
        token_file: &str,
    ) -> Self {
        Self {
            clusters: BTreeMap::from([(
                cluster.to_string(),
                ClusterSpec {
                    server: server.to_string(),
                },
            )]),
            contexts: BTreeMap::from([(
                cluster.to_string(),
                ContextSpec {
                    cluster: cluster.to_string(),
                    namespace: namespace.to_string(),
                    user: cluster.to_string(),
                },
            )]),
            current_context: cluster.to_string(),
            users: BTreeMap::from([(
                cluster.to_string(),
                UserSpec::from_flags(token, token_file),
            )]),
        }
    }

    pub fn read_from(path: impl AsRef<Path>) -> anyhow::Result<KubeConfig> {
        Ok(serde_yaml::from_reader(
            fs::OpenOptions::new()
                .read(true)
                .open(path)
                .context("Opening kube config")?,
        )
        .context("Parsing kube config")?)
    }
}

/// Writes the document to `path`, replacing any existing file.
pub fn write_config(kc: &KubeConfig, path: &Path) -> anyhow::Result<()> {
    let file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .with_context(|| format!("Opening kube config {}", path.display()))?;

    Ok(serde_yaml::to_writer(file, kc)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_a() -> KubeConfig {
        KubeConfig::single_cluster("https://api.x", "prow", "ci", "abc", "")
    }

    #[test]
    fn literal_token_when_no_token_file() {
        assert_eq!(
            UserSpec::from_flags("abc", ""),
            UserSpec::Token {
                token: "abc".to_string()
            }
        );
    }

    #[test]
    fn token_file_wins_over_literal_token() {
        assert_eq!(
            UserSpec::from_flags("abc", "sa-token"),
            UserSpec::TokenFile {
                token_file: "sa-token".to_string()
            }
        );
    }

    #[test]
    fn all_keys_use_the_cluster_name() {
        let kc = scenario_a();
        assert!(kc.clusters.contains_key("prow"));
        assert!(kc.contexts.contains_key("prow"));
        assert!(kc.users.contains_key("prow"));
        assert_eq!(kc.current_context, "prow");
        assert_eq!(kc.clusters.len(), 1);
        assert_eq!(kc.contexts.len(), 1);
        assert_eq!(kc.users.len(), 1);
    }

    #[test]
    fn context_references_cluster_and_user() {
        let kc = scenario_a();
        assert_eq!(
            kc.contexts["prow"],
            ContextSpec {
                cluster: "prow".to_string(),
                namespace: "ci".to_string(),
                user: "prow".to_string(),
            }
        );
        assert_eq!(kc.clusters["prow"].server, "https://api.x");
    }

    #[test]
    fn serializes_with_kebab_case_keys() {
        let yaml = serde_yaml::to_string(&scenario_a()).unwrap();
        assert!(yaml.contains("current-context: prow"));
        assert!(yaml.contains("token: abc"));

        let kc = KubeConfig::single_cluster("https://api.x", "prow", "ci", "abc", "sa-token");
        let yaml = serde_yaml::to_string(&kc).unwrap();
        assert!(yaml.contains("token-file: sa-token"));
        assert!(!yaml.contains("token: abc"));
    }

    #[test]
    fn write_config_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config");
        std::fs::write(&path, "stale contents that are longer than the document").unwrap();

        write_config(&scenario_a(), &path).unwrap();

        let kc = KubeConfig::read_from(&path).unwrap();
        assert_eq!(kc, scenario_a());
    }
}
