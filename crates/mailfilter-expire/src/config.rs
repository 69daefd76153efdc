//! Expiry job configuration.
//!
//! ```ini
//! [server]
//! host = imap.gmail.com
//! user = jane@example.com
//! password = app-password
//!
//! [filter:default]
//! folder = [Gmail]/All Mail
//! action = delete
//!
//! [filter:newsletters]
//! age = 30
//! filter = label:newsletters -is:starred
//! ```

use std::fmt;

use mailfilter_core::flat::{DEFAULTS_SECTION, FILTER_PREFIX, FlatDocument, Section};
use mailfilter_core::schema::{KeySpec, Schema, SectionSpec, ValueKind, lookup};
use tracing::debug;

use crate::action::Action;
use crate::error::{Error, Result};

/// Section holding the server settings.
pub const SERVER_SECTION: &str = "server";

/// Default IMAPS port.
pub const DEFAULT_PORT: u16 = 993;

/// Default trash folder.
pub const DEFAULT_TRASH: &str = "[Gmail]/Trash";

const RULE_KEYS: [(&str, ValueKind); 4] = [
    ("folder", ValueKind::String),
    ("age", ValueKind::Integer),
    ("filter", ValueKind::String),
    ("action", ValueKind::String),
];

/// Schema of expiry configuration documents.
#[must_use]
pub fn expire_schema() -> Schema {
    let defaults = RULE_KEYS
        .iter()
        .fold(SectionSpec::exact(DEFAULTS_SECTION), |spec, (name, kind)| {
            spec.key(KeySpec::optional(*name, *kind))
        });
    let rules = RULE_KEYS
        .iter()
        .fold(SectionSpec::prefixed(FILTER_PREFIX), |spec, (name, kind)| {
            spec.key(KeySpec::required(*name, *kind))
        })
        .fallback(DEFAULTS_SECTION);

    Schema::new()
        .section(
            SectionSpec::exact(SERVER_SECTION)
                .required()
                .key(KeySpec::required("host", ValueKind::String))
                .key(KeySpec::optional("port", ValueKind::Integer).with_default(DEFAULT_PORT.to_string()))
                .key(KeySpec::required("user", ValueKind::String))
                .key(KeySpec::required("password", ValueKind::String))
                .key(KeySpec::optional("trash", ValueKind::String).with_default(DEFAULT_TRASH)),
        )
        .section(defaults)
        .section(rules)
}

/// Mail server settings.
#[derive(Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Server hostname.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Login name.
    pub user: String,
    /// Login password.
    pub password: String,
    /// Folder deleted messages are copied to.
    pub trash: String,
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("trash", &self.trash)
            .finish()
    }
}

/// One expiry rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpireRule {
    /// Rule name (the section id).
    pub name: String,
    /// Folder to search.
    pub folder: String,
    /// Minimum message age in days.
    pub age_days: u32,
    /// Raw search predicate.
    pub criteria: String,
    /// What to do with matches.
    pub action: Action,
}

/// A complete expiry job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpireConfig {
    /// Server settings.
    pub server: ServerConfig,
    /// Rules in document order.
    pub rules: Vec<ExpireRule>,
}

impl ExpireConfig {
    /// Parses configuration text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid flat document or does not
    /// satisfy [`expire_schema`].
    pub fn parse(text: &str) -> Result<Self> {
        Self::from_flat(&FlatDocument::parse(text)?)
    }

    /// Builds a configuration from a flat document.
    ///
    /// Rule keys missing from a rule section are taken from `[filter:default]`.
    ///
    /// # Errors
    ///
    /// Returns [`mailfilter_core::Error::Validation`] (wrapped in
    /// [`Error::Core`]) with every schema violation, or [`Error::Config`] /
    /// [`Error::InvalidAction`] for values the schema cannot catch.
    pub fn from_flat(doc: &FlatDocument) -> Result<Self> {
        let schema = expire_schema();
        schema
            .validate(doc)
            .map_err(mailfilter_core::Error::Validation)?;
        let doc = schema.with_defaults(doc);

        let server = doc
            .section(SERVER_SECTION)
            .ok_or_else(|| Error::config(SERVER_SECTION, "missing section"))
            .and_then(server_config)?;

        let defaults = doc.section(DEFAULTS_SECTION);
        let rules = doc
            .sections()
            .filter(|section| section.name != DEFAULTS_SECTION)
            .filter_map(|section| {
                section
                    .name
                    .strip_prefix(FILTER_PREFIX)
                    .map(|name| (name, section))
            })
            .map(|(name, section)| rule(name, section, defaults))
            .collect::<Result<Vec<_>>>()?;

        debug!("Loaded {} expiry rule(s)", rules.len());
        Ok(Self { server, rules })
    }
}

fn server_config(section: &Section) -> Result<ServerConfig> {
    let text = |key: &str| {
        section
            .scalar(key)
            .map(str::to_string)
            .ok_or_else(|| Error::config(SERVER_SECTION, format!("missing '{key}'")))
    };

    let port = text("port")?;
    let port = port
        .trim()
        .parse::<u16>()
        .map_err(|_| Error::config(SERVER_SECTION, format!("port '{port}' is out of range")))?;

    Ok(ServerConfig {
        host: text("host")?,
        port,
        user: text("user")?,
        password: text("password")?,
        trash: text("trash")?,
    })
}

fn rule(name: &str, section: &Section, defaults: Option<&Section>) -> Result<ExpireRule> {
    let text = |key: &str| {
        lookup(section, defaults, key)
            .and_then(|value| value.as_scalar())
            .map(str::to_string)
            .ok_or_else(|| Error::config(name, format!("missing '{key}'")))
    };

    let age = text("age")?;
    let age_days = age
        .trim()
        .parse::<u32>()
        .map_err(|_| Error::config(name, format!("age '{age}' is not a number of days")))?;

    Ok(ExpireRule {
        name: name.to_string(),
        folder: text("folder")?,
        age_days,
        criteria: text("filter")?,
        action: text("action")?.parse()?,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use mailfilter_core::schema::ViolationKind;

    const CONFIG: &str = "[server]
host = imap.gmail.com
user = jane@example.com
password = secret

[filter:default]
folder = INBOX
action = delete

[filter:100]
age = 30
filter = from:x@y.com

[filter:archive]
folder = Newsletters
age = 7
filter = label:news
action = move:Archive
";

    #[test]
    fn test_parse_config() {
        let config = ExpireConfig::parse(CONFIG).unwrap();

        assert_eq!(config.server.host, "imap.gmail.com");
        assert_eq!(config.server.port, 993);
        assert_eq!(config.server.trash, "[Gmail]/Trash");
        assert_eq!(config.rules.len(), 2);

        let first = &config.rules[0];
        assert_eq!(first.name, "100");
        assert_eq!(first.folder, "INBOX");
        assert_eq!(first.age_days, 30);
        assert_eq!(first.criteria, "from:x@y.com");
        assert_eq!(first.action, Action::Delete);

        let second = &config.rules[1];
        assert_eq!(second.folder, "Newsletters");
        assert_eq!(second.action, Action::Move("Archive".to_string()));
    }

    #[test]
    fn test_missing_server() {
        let err = ExpireConfig::parse("[filter:1]\nfolder = a\nage = 1\nfilter = x\naction = label\n")
            .unwrap_err();
        let Error::Core(mailfilter_core::Error::Validation(violations)) = err else {
            panic!("expected validation failure");
        };
        assert_eq!(violations[0].kind, ViolationKind::MissingSection);
    }

    #[test]
    fn test_rule_without_fallback_reports_missing_keys() {
        let text = "[server]\nhost = h\nuser = u\npassword = p\n\n[filter:1]\nage = old\n";
        let Err(Error::Core(mailfilter_core::Error::Validation(violations))) =
            ExpireConfig::parse(text)
        else {
            panic!("expected validation failure");
        };
        // folder, filter and action missing; age has the wrong type
        assert_eq!(violations.len(), 4);
    }

    #[test]
    fn test_invalid_action() {
        let text = "[server]\nhost = h\nuser = u\npassword = p\n\n\
                    [filter:1]\nfolder = a\nage = 1\nfilter = x\naction = shred\n";
        assert!(matches!(
            ExpireConfig::parse(text),
            Err(Error::InvalidAction(_))
        ));
    }

    #[test]
    fn test_negative_age() {
        let text = "[server]\nhost = h\nuser = u\npassword = p\n\n\
                    [filter:1]\nfolder = a\nage = -3\nfilter = x\naction = label\n";
        assert!(matches!(
            ExpireConfig::parse(text),
            Err(Error::Config { rule, .. }) if rule == "1"
        ));
    }

    #[test]
    fn test_password_redacted() {
        let config = ExpireConfig::parse(CONFIG).unwrap();
        let debug = format!("{:?}", config.server);
        assert!(!debug.contains("secret"));
        assert!(debug.contains("<redacted>"));
    }
}
