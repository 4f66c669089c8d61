// SPDX-License-Identifier: Apache-2.0

use clap::{Subcommand, ValueEnum};
use campus_checkin_model::Role;

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Create the ledger schema if missing.
    InitDb,
    AddEvent {
        #[arg(long)]
        id: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        venue: String,
        /// RFC 3339 start time; defaults to now.
        #[arg(long)]
        starts_at: Option<String>,
        #[arg(long, default_value_t = false)]
        closed: bool,
    },
    AddProfile {
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        college_code: Option<String>,
        #[arg(long, value_enum, default_value_t = RoleCli::Student)]
        role: RoleCli,
    },
    Register {
        #[arg(long)]
        event: String,
        #[arg(long)]
        student: String,
    },
    /// Print the QR credential text for a registration.
    Ticket {
        #[arg(long)]
        event: String,
        #[arg(long)]
        student: String,
    },
    Registrations {
        #[arg(long)]
        student: String,
    },
    Attendance {
        #[arg(long)]
        event: String,
    },
    /// Door scanner fed one decoded QR payload per stdin line.
    Scan {
        #[arg(long)]
        operator: String,
        /// Return to scanning after every shown result.
        #[arg(long, default_value_t = false)]
        auto_reset: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub(crate) enum RoleCli {
    Student,
    ClubAdmin,
    CollegeAdmin,
}

impl From<RoleCli> for Role {
    fn from(role: RoleCli) -> Self {
        match role {
            RoleCli::Student => Role::Student,
            RoleCli::ClubAdmin => Role::ClubAdmin,
            RoleCli::CollegeAdmin => Role::CollegeAdmin,
        }
    }
}
