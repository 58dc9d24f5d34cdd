// Library root
// -----------
// This crate exposes the export pipeline as a library; the binary
// (`main.rs`) wires it to the interactive prompts.
//
// Module responsibilities:
// - `api`: the `DeviceApi` capability trait plus the blocking HTTP client
//   that speaks digest-authenticated ISAPI, and the typed request/response
//   schemas for each endpoint.
// - `model`: raw device user shape and the normalized snapshot record.
// - `export`: pagination, per-user enrichment and the bounded worker pool.
// - `download`: the image retry loop.
// - `snapshot`: run-directory creation and the JSON snapshot writer.
// - `config`: run configuration and its between-run persistence.
// - `ui`: dialoguer prompts and the terminal summary.
//
// Keeping the pipeline behind `DeviceApi` makes the whole export testable
// against scripted fakes without a device on the network.

pub mod api;
pub mod config;
pub mod download;
pub mod export;
pub mod model;
pub mod snapshot;
pub mod ui;
