// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Network clients used by the triggers.
//!
//! - [`SunEventsClient`]: solar times over HTTP (feature `sunevents`)
//! - [`IcmpProber`]: ICMP echo reachability probe (feature `ping`)
//! - [`RetryPolicy`]: bounded linear backoff shared by the clients

#[cfg(feature = "sunevents")]
mod http;
#[cfg(feature = "ping")]
mod icmp;
mod retry;

#[cfg(feature = "sunevents")]
pub use http::{DEFAULT_SUN_EVENTS_URL, SunData, SunEventsClient};
#[cfg(feature = "ping")]
pub use icmp::IcmpProber;
pub use retry::RetryPolicy;
