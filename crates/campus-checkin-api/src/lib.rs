// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

pub mod dto;
pub mod error_mapping;
mod errors;
pub mod openapi;

pub use dto::{
    AttendanceDto, AttendeeDto, CheckinRequestDto, CheckinResponseDto, RegistrationDto,
    RegistrationListDto, TicketDto,
};
pub use errors::{ApiError, ApiErrorCode, API_ERROR_CODES};
pub use openapi::openapi_v1_spec;

pub const CRATE_NAME: &str = "campus-checkin-api";
pub const API_VERSION: &str = "v1";
