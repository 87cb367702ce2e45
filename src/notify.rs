use crate::config::{Config, GitRef};
use crate::slack::{Action, ActionKind, Attachment, Field, Message};

/// Appends fields in display order, dropping any without a value.
#[derive(Default)]
struct FieldList(Vec<Field>);

impl FieldList {
    fn push(mut self, title: &str, value: Option<&str>) -> Self {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            self.0.push(Field {
                title: title.to_string(),
                value: value.to_string(),
                short: true,
            });
        }
        self
    }
}

#[derive(Default)]
struct ButtonList(Vec<Action>);

impl ButtonList {
    fn push(mut self, text: &str, url: Option<&str>) -> Self {
        if let Some(url) = url.filter(|u| !u.is_empty()) {
            self.0.push(Action {
                kind: ActionKind::Button,
                text: text.to_string(),
                url: url.to_string(),
            });
        }
        self
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

fn fields(config: &Config) -> Vec<Field> {
    let built_from = match &config.git_ref {
        GitRef::Branch(_) => Some(config.git_ref.short_name()),
        GitRef::Tag(_) => None,
    };

    // An explicit version wins over the tag being built
    let version = match (config.version_name.as_deref(), &config.git_ref) {
        (Some(name), _) if !name.is_empty() => Some(name),
        (_, GitRef::Tag(_)) => Some(config.git_ref.short_name()),
        _ => None,
    };

    FieldList::default()
        .push("Base URL", config.base_url.as_deref())
        .push("Actioned by", Some(config.actor.as_str()))
        .push("Built from", built_from)
        .push("Environments", config.environments.as_deref())
        .push("Variants", config.variants.as_deref())
        .push("Version", version)
        .0
}

fn actions(config: &Config) -> Vec<Action> {
    ButtonList::default()
        .push("View release", config.release_url.as_deref())
        .push("Changelog", config.changelog_url.as_deref())
        .0
}

pub fn build_message(config: &Config) -> Message {
    let fallback = non_empty(config.message.as_deref()).unwrap_or_else(|| config.ci.summary());

    Message {
        text: None,
        username: non_empty(config.username.as_deref()),
        icon_url: non_empty(config.icon_url.as_deref()),
        icon_emoji: non_empty(config.icon_emoji.as_deref()),
        channel: non_empty(config.channel.as_deref()),
        unfurl_links: false,
        attachments: vec![Attachment {
            fallback,
            pretext: non_empty(Some(config.pretext.as_str())),
            color: non_empty(Some(config.color.as_str())),
            title: non_empty(config.title.as_deref()),
            author_name: None,
            author_link: None,
            author_icon: None,
            footer: non_empty(Some(config.footer.as_str())),
            fields: fields(config),
            actions: actions(config),
        }],
    }
}
