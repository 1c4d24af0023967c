use crate::errors::Result;
use async_trait::async_trait;

/// A record held by a [`LookupCache`](super::LookupCache).
pub trait Record: Send + Sync + 'static {
    /// Canonical identifier, unique within one upstream response.
    fn id(&self) -> &str;

    /// Keys the record is indexed under, already case-normalised the way the
    /// owning source expects them (see [`RecordSource::lookup_keys`]).
    fn index_keys(&self) -> Vec<String>;
}

/// The upstream side of a lookup cache: one bulk fetch plus the key
/// normalisation rules of that upstream.
#[async_trait]
pub trait RecordSource: Send + Sync + 'static {
    type Record: Record;

    fn name(&self) -> &str;

    /// Fetch the complete record list. Implementations pace their own calls.
    async fn fetch_all(&self) -> Result<Vec<Self::Record>>;

    /// Normalised candidate keys for a raw lookup key, tried in order.
    fn lookup_keys(&self, key: &str) -> Vec<String>;
}
