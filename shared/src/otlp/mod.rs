//! OpenTelemetry Protocol (OTLP) decoding.
//!
//! Two wire encodings reach the store: protobuf messages from the gRPC
//! receiver ([`conversions`]) and OTLP JSON from export files ([`json`]).
//! Both apply the rules in [`decode`], so an entity decodes identically no
//! matter which path it arrived on.

pub mod conversions;
pub mod decode;
pub mod json;

/// Generated OTLP protobuf and collector service types.
pub use opentelemetry_proto::tonic as proto;
