//! Battle Poker - real-time planning poker.
//!
//! A leader opens a battle, proposes plans and runs voting rounds while the
//! connected warriors estimate. Every accepted action is fanned out to the
//! other connections of the same battle.
//!
//! Layout follows ports and adapters: `domain` holds the battle model,
//! `ports` the storage and broadcast seams, `application` the voting state
//! machine and event dispatcher, `adapters` the HTTP, websocket, PostgreSQL
//! and in-memory implementations.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
