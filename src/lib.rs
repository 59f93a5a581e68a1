//! Rust library for sending and receiving DMX512 (ANSI E1.11) over a RS485 bus by using
//! interchangeable drivers. This library features no-std as well as no-alloc support
//! (no heap allocation) to target embedded as well as os platforms.
//!
//! Please refer to the [official specifications](https://tsp.esta.org/) published by the ESTA.
//!
//! # Usage
//! These examples use the in-memory [loopback::LoopbackBus] in place of a real uart. Any type
//! implementing the traits in [dmx_uart_driver] can be used instead.
//!
//! ## Controller
//!
//! ```rust
//! use dmx_link::dmx_controller::{DmxController, DmxControllerConfig};
//! use dmx_link::loopback::LoopbackBus;
//!
//! let bus = LoopbackBus::new();
//! let mut dmx_controller =
//!     DmxController::new(&bus, &bus, &DmxControllerConfig::default()).unwrap();
//!
//! // Full red on an rgb fixture at address 23 with its dimmer at 26.
//! dmx_controller.universe_mut().set(23, 255);
//! dmx_controller.universe_mut().set(26, 255);
//!
//! dmx_controller.send_frame().unwrap();
//! assert_eq!(dmx_controller.stats().frames_sent, 1);
//! ```
//!
//! ## Receiver
//!
//! ```rust
//! use dmx_link::dmx_controller::{DmxController, DmxControllerConfig};
//! use dmx_link::dmx_receiver::{DmxReceiver, DmxReceiverConfig};
//! use dmx_link::fixture::PICO_RIG;
//! use dmx_link::loopback::LoopbackBus;
//!
//! let bus = LoopbackBus::new();
//! let mut dmx_controller =
//!     DmxController::new(&bus, &bus, &DmxControllerConfig::default()).unwrap();
//! let mut dmx_receiver = DmxReceiver::new(&bus, &bus, &DmxReceiverConfig::default()).unwrap();
//!
//! dmx_controller.universe_mut().set(24, 128);
//! dmx_controller.send_frame().unwrap();
//!
//! if dmx_receiver.poll().is_frame() {
//!     for fixture in PICO_RIG.iter() {
//!         for change in dmx_receiver.fixture_changes(fixture) {
//!             println!(
//!                 "{} channel {}: {} -> {}",
//!                 fixture.name, change.channel, change.old_value, change.new_value
//!             );
//!         }
//!     }
//!
//!     dmx_receiver.update_last_frame();
//! }
//!
//! assert!(dmx_receiver.is_receiving_data());
//! assert_eq!(dmx_receiver.fixture_data(&PICO_RIG[2])[1], 128);
//! ```
//!

#![cfg_attr(not(feature = "std"), no_std)]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[macro_use]
mod fmt;

/// Compares universes against the last processed one.
pub mod change_detector;
pub mod consts;
/// Module for building dmx controllers.
pub mod dmx_controller;
/// Frame level access on top of the uart traits.
pub mod dmx_driver;
/// Module for building dmx receivers.
pub mod dmx_receiver;
/// Module for simplifying the implementation of new drivers/hardware that behave like direct uart devices.
pub mod dmx_uart_driver;
/// Named channel windows into a universe.
pub mod fixture;
mod layouts;
/// An in-memory bus with virtual time for tests and simulations.
pub mod loopback;
pub mod timer;
pub mod types;
pub mod universe;
pub mod utils;
