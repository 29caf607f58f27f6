//! Networking for the REST API.
//!
//! DESIGN
//! ======
//! `Transport` is the async seam: it moves one request to the server and
//! hands back status + raw body. `SurveyApi` sits on top and owns every
//! decision about what a status or body means for a given endpoint, so
//! the state modules only ever see typed results.

pub mod api;
pub mod http;
pub mod transport;
pub mod types;

#[cfg(test)]
pub mod test_helpers;

pub use api::SurveyApi;
pub use http::HttpTransport;
pub use transport::{ApiRequest, ApiResponse, Method, Transport, TransportError};
pub use types::{ApiError, Credentials, CurrentUser, Entry, ExternalData, SurveyAnswers, SurveyField};
