//! IO module - configuration files and the framed sample stream.

mod config;
mod record;

pub use config::{read_config, Config, PathConfig, SeedConfig, SeedMode, SimulationConfig, SweepConfig, SweepParam};
pub use record::{
    body_payload_bytes, read_stream, write_body, write_header, Header, RecordReader, Sample,
    SampleWriter, HEADER_PAYLOAD_BYTES, HEADER_RECORD_BYTES,
};
