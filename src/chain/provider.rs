//! Source of contract ABIs for decoding packed transactions.

use std::collections::{HashMap, hash_map::Entry};

use thiserror::Error;
use tracing::debug;

use crate::{
    abi::{AbiDefinition, AbiResolver, ResolvedSchema},
    error::CodecError,
    serial::Name,
};

/// Why an ABI could not be supplied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbiProviderError {
    /// The account does not exist or has no ABI set.
    #[error("no ABI published for account {0}")]
    NotFound(String),
    /// The backing store could not be reached.
    #[error("ABI source unreachable: {0}")]
    Unreachable(String),
}

/// Looks up the current ABI of an account.
///
/// Implementations may cache or retry; callers treat any error as final.
pub trait AbiProvider {
    /// Fetch `account`'s ABI.
    ///
    /// # Errors
    /// Returns [`AbiProviderError::NotFound`] when the account has no ABI and
    /// [`AbiProviderError::Unreachable`] when the source fails.
    fn fetch_abi(&self, account: &str) -> Result<AbiDefinition, AbiProviderError>;
}

impl<P: AbiProvider + ?Sized> AbiProvider for &P {
    fn fetch_abi(&self, account: &str) -> Result<AbiDefinition, AbiProviderError> {
        (**self).fetch_abi(account)
    }
}

/// In-memory provider keyed by account name.
#[derive(Debug, Clone, Default)]
pub struct StaticAbiProvider {
    abis: HashMap<String, AbiDefinition>,
}

impl StaticAbiProvider {
    /// Empty provider.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Builder-style [`StaticAbiProvider::insert`].
    #[must_use]
    pub fn with_abi(mut self, account: impl Into<String>, abi: AbiDefinition) -> Self {
        self.insert(account, abi);
        self
    }

    /// Register or replace `account`'s ABI.
    pub fn insert(&mut self, account: impl Into<String>, abi: AbiDefinition) {
        self.abis.insert(account.into(), abi);
    }
}

impl AbiProvider for StaticAbiProvider {
    fn fetch_abi(&self, account: &str) -> Result<AbiDefinition, AbiProviderError> {
        self.abis
            .get(account)
            .cloned()
            .ok_or_else(|| AbiProviderError::NotFound(account.to_owned()))
    }
}

/// Per-call memo so each account's ABI is fetched and validated once.
pub(crate) struct AbiCache<'p, P: ?Sized> {
    provider: &'p P,
    abis: HashMap<Name, AbiDefinition>,
}

impl<'p, P: AbiProvider + ?Sized> AbiCache<'p, P> {
    pub(crate) fn new(provider: &'p P) -> Self {
        Self {
            provider,
            abis: HashMap::new(),
        }
    }

    pub(crate) fn get(&mut self, account: Name) -> Result<&AbiDefinition, CodecError> {
        match self.abis.entry(account) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                debug!(%account, "fetching abi");
                let abi = self
                    .provider
                    .fetch_abi(&account.to_string())
                    .map_err(|source| CodecError::AbiUnavailable {
                        account: account.to_string(),
                        source,
                    })?;
                abi.validate()?;
                Ok(entry.insert(abi))
            }
        }
    }

    /// Schema of `action`'s data in `account`'s ABI.
    pub(crate) fn action_schema(
        &mut self,
        account: Name,
        action: Name,
        max_depth: usize,
    ) -> Result<ResolvedSchema, CodecError> {
        let abi = self.get(account)?;
        let action_name = action.to_string();
        if abi.action(&action_name).is_none() {
            return Err(CodecError::UnknownAction(action_name));
        }
        AbiResolver::new(abi).with_max_depth(max_depth).resolve(&action_name)
    }
}
