//! VoxAlarm Library
//!
//! Core of a voice-dismissal alarm clock: alarms fire on a weekly schedule
//! and are dismissed by reciting their scripts aloud, judged against the
//! live speech transcript.

pub mod alarm;
pub mod config;
pub mod controller;
pub mod error;
pub mod matching;
pub mod recognizer;
pub mod sayit;
pub mod schedule;
pub mod store;
pub mod worker;
