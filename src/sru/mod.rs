//! SRU searchRetrieve client
//!
//! Consumes a remote paginated result set as a lazy sequence of record
//! payloads, continuing server-side result sets where possible and retrying
//! once with the original query when a page fetch fails.

mod cursor;
mod iterator;
mod request;
mod response;
mod transport;

pub use cursor::Cursor;
pub use iterator::{IterState, RecordSlot, SruResultIterator, MAX_FETCH_ATTEMPTS};
pub use request::{continuation_query, request_url, SearchParams};
pub use response::{
    first_diagnostic, Diagnostic, FacetField, FacetValue, SearchPage, DIAGNOSTIC_NS,
    DIAGNOSTIC_RESULT_SET_DOES_NOT_EXIST, SRW_NS,
};
pub use transport::{HttpTransport, PageTransport};
