//! Message handling - dispatching resolved routes to workers

pub mod dispatcher;
pub mod worker;

pub use dispatcher::{job_queue, Job, JobMessage, MessageDispatcher, QUEUE_CAPACITY};
pub use worker::Worker;
