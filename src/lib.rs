//! Loads MIDI classification results from a CSV export into the hosted
//! `midi_files` table, or renders them as raw INSERT files for manual runs.

pub mod config;
pub mod ingest;
pub mod record;
pub mod sqlfile;
pub mod upload;
