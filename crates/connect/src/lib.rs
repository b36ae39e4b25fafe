//! PPP Connect - remote document collection client.
//!
//! Talks to the remote functions endpoint that stores the instrument
//! collection and the broker profiles, and implements the corresponding
//! `ppp-core` collaborator traits.

pub mod client;
pub mod documents;

pub use client::{RemoteDataClient, BROKERS_COLLECTION, BULK_WRITE_PATH, FIND_PATH};
pub use documents::{BrokerDocument, BulkWriteReply, BulkWriteRequest, FindRequest};
