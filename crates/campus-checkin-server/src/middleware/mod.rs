// SPDX-License-Identifier: Apache-2.0

pub(crate) mod admission;
pub(crate) mod request_tracing;
