use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("kovcheg.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("kovcheg.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("kovcheg.client.request_duration_seconds");

pub(crate) static STREAM_EVENTS: Counter = Counter::new("kovcheg.stream.events");
pub(crate) static STREAM_ERRORS: Counter = Counter::new("kovcheg.stream.errors");
pub(crate) static STREAM_BYTES: Counter = Counter::new("kovcheg.stream.bytes");
pub(crate) static STREAM_MALFORMED_LINES: Counter = Counter::new("kovcheg.stream.malformed_lines");
pub(crate) static STREAM_UNRECOGNIZED_EVENTS: Counter =
    Counter::new("kovcheg.stream.unrecognized_events");
pub(crate) static STREAM_CANCELLED: Counter = Counter::new("kovcheg.stream.cancelled");
pub(crate) static STREAM_DURATION: Moments = Moments::new("kovcheg.stream.duration_seconds");

pub(crate) static UPLOADS: Counter = Counter::new("kovcheg.uploads");
pub(crate) static UPLOAD_ERRORS: Counter = Counter::new("kovcheg.upload_errors");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&STREAM_EVENTS);
    collector.register_counter(&STREAM_ERRORS);
    collector.register_counter(&STREAM_BYTES);
    collector.register_counter(&STREAM_MALFORMED_LINES);
    collector.register_counter(&STREAM_UNRECOGNIZED_EVENTS);
    collector.register_counter(&STREAM_CANCELLED);
    collector.register_moments(&STREAM_DURATION);

    collector.register_counter(&UPLOADS);
    collector.register_counter(&UPLOAD_ERRORS);
}
