use crate::error::ConfigError;
use reqwest::Url;
use std::collections::HashMap;
use std::fmt;

pub const SLACK_WEBHOOK: &str = "SLACK_WEBHOOK";
pub const SLACK_CHANNEL: &str = "SLACK_CHANNEL";
pub const SLACK_USERNAME: &str = "SLACK_USERNAME";
pub const SLACK_ICON: &str = "SLACK_ICON";
pub const SLACK_ICON_EMOJI: &str = "SLACK_ICON_EMOJI";
pub const SLACK_TITLE: &str = "SLACK_TITLE";
pub const SLACK_MESSAGE: &str = "SLACK_MESSAGE";
pub const SLACK_COLOR: &str = "SLACK_COLOR";
pub const SLACK_PRETEXT: &str = "SLACK_PRETEXT";
pub const SLACK_FOOTER: &str = "SLACK_FOOTER";
pub const VERSION_NAME: &str = "VERSION_NAME";
pub const VARIANTS: &str = "VARIANTS";
pub const ENVIRONMENT: &str = "ENVIRONMENT";
pub const BASE_URL: &str = "BASE_URL";
pub const CHANGELOG_URL: &str = "CHANGELOG_URL";
pub const RELEASE_URL: &str = "RELEASE_URL";

pub const GITHUB_ACTION: &str = "GITHUB_ACTION";
pub const GITHUB_ACTOR: &str = "GITHUB_ACTOR";
pub const GITHUB_EVENT_NAME: &str = "GITHUB_EVENT_NAME";
pub const GITHUB_REF: &str = "GITHUB_REF";
pub const GITHUB_REPOSITORY: &str = "GITHUB_REPOSITORY";
pub const GITHUB_WORKFLOW: &str = "GITHUB_WORKFLOW";

const DEFAULT_COLOR: &str = "good";
const DEFAULT_FOOTER: &str = "AEVI Slack Notification";
const DEFAULT_ACTOR: &str = "Unknown";

const BRANCH_PREFIX: &str = "refs/heads/";
const TAG_PREFIX: &str = "refs/tags/";

/// Source of configuration variables.
pub trait Env {
    fn var(&self, name: &str) -> Option<String>;
}

/// The environment of the running process.
pub struct ProcessEnv;

impl Env for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var_os(name).map(|value| value.to_string_lossy().into_owned())
    }
}

impl Env for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// The value of `name` if it is set, even to an empty string, otherwise `default`.
pub fn env_or(env: &dyn Env, name: &str, default: &str) -> String {
    env.var(name).unwrap_or_else(|| default.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitRef {
    Branch(String),
    Tag(String),
}

impl GitRef {
    // Anything mentioning `heads` is a branch, everything else is treated as a tag.
    pub fn parse(reference: &str) -> Result<Self, ConfigError> {
        let is_branch = reference.contains("heads");
        let prefix_len = if is_branch {
            BRANCH_PREFIX.len()
        } else {
            TAG_PREFIX.len()
        };

        let short = reference
            .get(prefix_len..)
            .ok_or_else(|| ConfigError::MalformedRef(reference.to_string()))?
            .to_string();

        Ok(if is_branch {
            GitRef::Branch(short)
        } else {
            GitRef::Tag(short)
        })
    }

    pub fn short_name(&self) -> &str {
        match self {
            GitRef::Branch(name) | GitRef::Tag(name) => name,
        }
    }
}

/// Ambient metadata the CI runner exposes, used to describe the run when no
/// message is given.
#[derive(Debug, Clone)]
pub struct CiContext {
    pub action: String,
    pub actor: String,
    pub event_name: String,
    pub git_ref: String,
    pub repository: String,
    pub workflow: String,
}

impl CiContext {
    fn from_env(env: &dyn Env) -> Self {
        Self {
            action: env_or(env, GITHUB_ACTION, ""),
            actor: env_or(env, GITHUB_ACTOR, ""),
            event_name: env_or(env, GITHUB_EVENT_NAME, ""),
            git_ref: env_or(env, GITHUB_REF, ""),
            repository: env_or(env, GITHUB_REPOSITORY, ""),
            workflow: env_or(env, GITHUB_WORKFLOW, ""),
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "GITHUB_ACTION={} \n GITHUB_ACTOR={} \n GITHUB_EVENT_NAME={} \n GITHUB_REF={} \n GITHUB_REPOSITORY={} \n GITHUB_WORKFLOW={}",
            self.action, self.actor, self.event_name, self.git_ref, self.repository, self.workflow
        )
    }
}

pub struct Config {
    pub webhook_url: Url,
    pub channel: Option<String>,
    pub username: Option<String>,
    pub icon_url: Option<String>,
    pub icon_emoji: Option<String>,
    pub title: Option<String>,
    pub message: Option<String>,
    pub color: String,
    pub pretext: String,
    pub footer: String,
    pub version_name: Option<String>,
    pub variants: Option<String>,
    pub environments: Option<String>,
    pub base_url: Option<String>,
    pub changelog_url: Option<String>,
    pub release_url: Option<String>,
    pub actor: String,
    pub git_ref: GitRef,
    pub ci: CiContext,
}

// The webhook URL carries its own credentials, so only the host is shown.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("webhook_host", &self.webhook_url.host_str())
            .field("channel", &self.channel)
            .field("git_ref", &self.git_ref)
            .field("actor", &self.actor)
            .finish_non_exhaustive()
    }
}

pub fn get_config(env: &dyn Env) -> Result<Config, ConfigError> {
    let webhook = env
        .var(SLACK_WEBHOOK)
        .filter(|url| !url.is_empty())
        .ok_or(ConfigError::MissingWebhook)?;
    let webhook_url =
        Url::parse(&webhook).map_err(|e| ConfigError::InvalidWebhook(e.to_string()))?;

    let git_ref = GitRef::parse(&env_or(env, GITHUB_REF, ""))?;

    Ok(Config {
        webhook_url,
        channel: env.var(SLACK_CHANNEL),
        username: env.var(SLACK_USERNAME),
        icon_url: env.var(SLACK_ICON),
        icon_emoji: env.var(SLACK_ICON_EMOJI),
        title: env.var(SLACK_TITLE),
        message: env.var(SLACK_MESSAGE),
        color: env_or(env, SLACK_COLOR, DEFAULT_COLOR),
        pretext: env_or(env, SLACK_PRETEXT, ""),
        footer: env_or(env, SLACK_FOOTER, DEFAULT_FOOTER),
        version_name: env.var(VERSION_NAME),
        variants: env.var(VARIANTS),
        environments: env.var(ENVIRONMENT),
        base_url: env.var(BASE_URL),
        changelog_url: env.var(CHANGELOG_URL),
        release_url: env.var(RELEASE_URL),
        actor: env_or(env, GITHUB_ACTOR, DEFAULT_ACTOR),
        git_ref,
        ci: CiContext::from_env(env),
    })
}
