pub mod client;
pub mod signer;

pub use client::{ClientError, DeliveryError, IngestionClient, LogSink};
pub use signer::{rfc1123_date, RequestSigner, SignerError, SigningInput};
