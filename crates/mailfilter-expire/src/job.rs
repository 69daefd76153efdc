//! Expiry job runner.

use chrono::{Days, Local, NaiveDate};
use tracing::{debug, info};

use crate::action::Action;
use crate::config::{ExpireConfig, ExpireRule};
use crate::error::{Error, Result};
use crate::store::{MailStore, Uid, uid_set};

/// Options of one job run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Search and log, but change nothing.
    pub dry_run: bool,
    /// Date message ages are measured from.
    pub today: NaiveDate,
}

impl RunOptions {
    /// Options for a live run as of `today`.
    #[must_use]
    pub const fn new(today: NaiveDate) -> Self {
        Self {
            dry_run: false,
            today,
        }
    }

    /// Options for a live run as of the local date.
    #[must_use]
    pub fn now() -> Self {
        Self::new(Local::now().date_naive())
    }

    /// Sets dry-run mode.
    #[must_use]
    pub const fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// What happened to one rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleOutcome {
    /// Rule name.
    pub rule: String,
    /// The search that was run.
    pub query: String,
    /// Number of matching messages.
    pub matched: usize,
    /// Whether the action was carried out.
    pub applied: bool,
}

/// Returns the date before which a rule's messages are expired.
///
/// # Errors
///
/// Returns [`Error::Config`] if the age reaches past the calendar range.
pub fn cutoff(rule: &ExpireRule, today: NaiveDate) -> Result<NaiveDate> {
    today
        .checked_sub_days(Days::new(u64::from(rule.age_days)))
        .ok_or_else(|| Error::config(&rule.name, format!("age {} is too large", rule.age_days)))
}

/// Builds the provider search for a rule: `before:<YYYY-MM-DD> (<criteria>)`.
///
/// # Errors
///
/// See [`cutoff`].
pub fn search_query(rule: &ExpireRule, today: NaiveDate) -> Result<String> {
    let date = cutoff(rule, today)?;
    Ok(format!("before:{} ({})", date.format("%Y-%m-%d"), rule.criteria))
}

/// Runs every rule of `config` against `store`, in order.
///
/// Per rule: select the folder, search, and unless this is a dry run or
/// nothing matched, apply the action and expunge.
///
/// # Errors
///
/// Stops at the first failing rule and returns its error.
pub fn run<S>(store: &mut S, config: &ExpireConfig, options: &RunOptions) -> Result<Vec<RuleOutcome>>
where
    S: MailStore + ?Sized,
{
    info!(
        "Running {} expiry rule(s) for {} on {}:{}",
        config.rules.len(),
        config.server.user,
        config.server.host,
        config.server.port
    );

    let mut outcomes = Vec::with_capacity(config.rules.len());
    for rule in &config.rules {
        debug!(
            "Processing filter {} (folder={}, age={}, action={})",
            rule.name, rule.folder, rule.age_days, rule.action
        );

        let query = search_query(rule, options.today)?;
        debug!("Search query is {query}");

        store.select(&rule.folder)?;
        let uids = store.uid_search_raw(&query)?;

        info!(
            "filter {} will {} {} messages.",
            rule.name,
            rule.action.verb(),
            uids.len()
        );

        let applied = !options.dry_run && !uids.is_empty();
        if applied {
            apply(store, &rule.action, &uids, &config.server.trash)?;
            store.expunge()?;
        }

        outcomes.push(RuleOutcome {
            rule: rule.name.clone(),
            query,
            matched: uids.len(),
            applied,
        });
    }

    Ok(outcomes)
}

fn apply<S>(store: &mut S, action: &Action, uids: &[Uid], trash: &str) -> Result<()>
where
    S: MailStore + ?Sized,
{
    let Some(destination) = action.destination(trash) else {
        return Ok(());
    };

    debug!("Copying {} to {destination}", uid_set(uids));
    store.uid_copy(uids, destination)?;

    if action.flags_deleted() {
        debug!("Flagging {} as deleted", uid_set(uids));
        store.uid_store_deleted(uids)?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn rule(age_days: u32, criteria: &str) -> ExpireRule {
        ExpireRule {
            name: "test".to_string(),
            folder: "INBOX".to_string(),
            age_days,
            criteria: criteria.to_string(),
            action: Action::Label,
        }
    }

    #[test]
    fn test_search_query() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(
            search_query(&rule(30, "from:x@y.com"), today).unwrap(),
            "before:2024-02-14 (from:x@y.com)"
        );
        assert_eq!(
            search_query(&rule(0, "label:old"), today).unwrap(),
            "before:2024-03-15 (label:old)"
        );
    }

    #[test]
    fn test_cutoff_crosses_year() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        assert_eq!(
            cutoff(&rule(365, "x"), today).unwrap(),
            NaiveDate::from_ymd_opt(2023, 1, 10).unwrap()
        );
    }

    #[test]
    fn test_cutoff_out_of_range() {
        assert!(matches!(
            cutoff(&rule(u32::MAX, "x"), NaiveDate::MIN),
            Err(Error::Config { .. })
        ));
    }
}
