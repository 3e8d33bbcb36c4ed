//! Positional argument validation for registry operations.
//!
//! Invocations arrive as an ordered list of strings. Every check here runs
//! before the store is touched, so a rejected invocation never writes.

use stonepaper_types::DocHash;

use crate::config::CreatorMode;
use crate::error::{RegistryError, RegistryResult};

/// Validated arguments of a `createDoc` invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateDocArgs {
    pub hash: DocHash,
    pub database: i64,
    pub sub_contract: String,
    pub contract_type: i64,
    /// Present only in [`CreatorMode::Explicit`].
    pub creator: Option<String>,
}

impl CreateDocArgs {
    /// Validate `createDoc` arguments under the given calling convention.
    ///
    /// Layout: `hash, database, subContract, contractType[, creator]`.
    pub fn parse(args: &[String], mode: CreatorMode) -> RegistryResult<Self> {
        expect_count(args, mode.create_arg_count())?;
        require_non_empty(args)?;

        let hash = DocHash::new(args[0].as_str())?;
        let database = parse_int(&args[1], 1)?;
        let sub_contract = args[2].clone();
        let contract_type = parse_int(&args[3], 3)?;
        let creator = match mode {
            CreatorMode::Ambient => None,
            CreatorMode::Explicit => Some(args[4].clone()),
        };

        Ok(Self {
            hash,
            database,
            sub_contract,
            contract_type,
            creator,
        })
    }
}

/// Validate the single `hash` argument of a lookup.
pub fn parse_lookup(args: &[String]) -> RegistryResult<DocHash> {
    expect_count(args, 1)?;
    require_non_empty(args)?;
    Ok(DocHash::new(args[0].as_str())?)
}

/// Fail unless exactly `expected` arguments were supplied.
pub fn expect_count(args: &[String], expected: usize) -> RegistryResult<()> {
    if args.len() != expected {
        return Err(RegistryError::Validation(format!(
            "incorrect number of arguments: expecting {expected}, got {}",
            args.len()
        )));
    }
    Ok(())
}

/// Fail on the first empty argument, naming its position.
pub fn require_non_empty(args: &[String]) -> RegistryResult<()> {
    match args.iter().position(String::is_empty) {
        Some(index) => Err(RegistryError::Validation(format!(
            "{} argument must be a non-empty string",
            ordinal(index + 1)
        ))),
        None => Ok(()),
    }
}

/// Parse a base-10 integer argument at zero-based `index`.
///
/// Accepts an optional leading sign; no range constraints beyond `i64`.
pub fn parse_int(arg: &str, index: usize) -> RegistryResult<i64> {
    arg.parse::<i64>().map_err(|_| {
        RegistryError::Validation(format!(
            "{} argument must be a numeric string",
            ordinal(index + 1)
        ))
    })
}

/// English ordinal for a 1-based position: 1st, 2nd, 3rd, 4th, 11th, 21st.
pub fn ordinal(n: usize) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}
