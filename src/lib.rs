//! Scheduling Agent - Sales conversation assistant for upholstery cleaning
//!
//! This crate tracks the customer data collected during a messaging
//! conversation, decides which stage of the sales script the dialogue is in,
//! and detects when the conversation must be handed to a human operator.

pub mod adapters;
pub mod app;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
