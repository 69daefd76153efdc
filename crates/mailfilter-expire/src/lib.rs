//! # mailfilter-expire
//!
//! Age-based mailbox cleanup configured with flat filter documents.
//!
//! Each `[filter:<name>]` rule selects a folder, searches for messages older
//! than `age` days that match a Gmail search predicate, and deletes, moves,
//! copies or labels them. Mail access goes through the [`MailStore`] trait.
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailfilter_expire::{ExpireConfig, RunOptions, run};
//!
//! let config = ExpireConfig::parse(&std::fs::read_to_string("expire.cf")?)?;
//! let outcomes = run(&mut store, &config, &RunOptions::now().dry_run(true))?;
//! for outcome in outcomes {
//!     println!("{}: {} message(s)", outcome.rule, outcome.matched);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod action;
mod config;
mod error;
mod job;
mod store;

pub use action::Action;
pub use config::{
    DEFAULT_PORT, DEFAULT_TRASH, ExpireConfig, ExpireRule, SERVER_SECTION, ServerConfig,
    expire_schema,
};
pub use error::{Error, Result};
pub use job::{RuleOutcome, RunOptions, cutoff, run, search_query};
pub use store::{MailStore, Uid, uid_set};
