// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Report delivery
//!
//! A [`DeliveryClient`] performs exactly one attempt per call and reports
//! the outcome as a value. [`HttpDeliveryClient`] is the reqwest-backed
//! implementation used in production.

mod client;
mod endpoint;
mod http;

pub use client::{Delivered, DeliveryClient, DeliveryFailure, DeliveryResult};
pub use endpoint::{Endpoint, DEFAULT_ENDPOINT};
pub use http::{DeliveryConfig, HttpDeliveryClient, DEFAULT_USER_AGENT};
