//! End-to-end tests through the operation handler.

mod bulk;
mod discovery;
mod dispatcher;
mod etag;
mod list;
mod patch;
