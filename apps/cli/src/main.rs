//! `housekeeping`: terminal client for the motel housekeeping backend.

mod commands;
mod config;
mod credentials;
mod table;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

use housekeeping_core::rooms::{DateField, OccupancyStatus, RoomStatus, SortKey};

use crate::config::{Config, DEFAULT_API_URL, DEFAULT_SOCKET_URL};

#[derive(Debug, Parser)]
#[command(name = "housekeeping", version, about = "Motel housekeeping client")]
struct Cli {
    /// REST API base URL
    #[arg(long, global = true, env = "HOUSEKEEPING_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// socket.io server URL for live updates
    #[arg(long, global = true, env = "HOUSEKEEPING_SOCKET_URL", default_value = DEFAULT_SOCKET_URL)]
    socket_url: String,

    /// Where the access token is stored
    #[arg(long, global = true, env = "HOUSEKEEPING_TOKEN_FILE")]
    token_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in and store the access token
    Login {
        /// Staff or room number
        #[arg(long)]
        number: String,
        #[arg(long, env = "HOUSEKEEPING_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored access token
    Logout,
    /// List rooms, optionally for one day, filtered and sorted
    Rooms(ListArgs),
    /// Flip a room between clean and dirty
    Toggle {
        /// Room number or id
        room: String,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Edit a room's details
    Edit(EditArgs),
    /// Copy a day's imported report into the housekeeping grid
    Import {
        #[arg(long)]
        date: NaiveDate,
    },
    /// Upload a PMS occupancy report (PDF)
    Upload {
        file: PathBuf,
        #[arg(long)]
        date: NaiveDate,
    },
    /// List generated room sheets for a day
    Sheets {
        #[arg(long)]
        date: NaiveDate,
    },
    /// Keep a room listing on screen, updated live
    Watch(ListArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    Clean,
    Dirty,
    Unavailable,
}

impl From<StatusArg> for RoomStatus {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::Clean => RoomStatus::Clean,
            StatusArg::Dirty => RoomStatus::Dirty,
            StatusArg::Unavailable => RoomStatus::Unavailable,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OccupancyArg {
    Occupied,
    Vacant,
}

impl From<OccupancyArg> for OccupancyStatus {
    fn from(value: OccupancyArg) -> Self {
        match value {
            OccupancyArg::Occupied => OccupancyStatus::Occupied,
            OccupancyArg::Vacant => OccupancyStatus::Vacant,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PetArg {
    Yes,
    No,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SortArg {
    #[default]
    Room,
    Status,
    CheckIn,
    CheckOut,
}

impl From<SortArg> for SortKey {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::Room => SortKey::Room,
            SortArg::Status => SortKey::Status,
            SortArg::CheckIn => SortKey::CheckIn,
            SortArg::CheckOut => SortKey::CheckOut,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DateFieldArg {
    CheckIn,
    CheckOut,
}

impl From<DateFieldArg> for DateField {
    fn from(value: DateFieldArg) -> Self {
        match value {
            DateFieldArg::CheckIn => DateField::CheckIn,
            DateFieldArg::CheckOut => DateField::CheckOut,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct ListArgs {
    /// Dashboard date; without it every room is listed
    #[arg(long)]
    pub date: Option<NaiveDate>,
    #[arg(long, value_enum)]
    pub status: Option<StatusArg>,
    #[arg(long, value_enum)]
    pub occupancy: Option<OccupancyArg>,
    #[arg(long, value_enum)]
    pub pet: Option<PetArg>,
    #[arg(long, value_enum, default_value_t = SortArg::Room)]
    pub sort: SortArg,
    /// Date field that --from/--to apply to
    #[arg(long, value_enum, default_value_t = DateFieldArg::CheckIn)]
    pub range_field: DateFieldArg,
    #[arg(long)]
    pub from: Option<NaiveDate>,
    #[arg(long, requires = "from")]
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Args)]
pub struct EditArgs {
    /// Room number or id
    pub room: String,
    #[arg(long)]
    pub date: Option<NaiveDate>,
    #[arg(long, value_enum)]
    pub status: Option<StatusArg>,
    #[arg(long, value_enum)]
    pub occupancy: Option<OccupancyArg>,
    #[arg(long, value_enum)]
    pub pet: Option<PetArg>,
    #[arg(long)]
    pub guest_status: Option<String>,
    #[arg(long)]
    pub check_in: Option<NaiveDate>,
    #[arg(long)]
    pub check_out: Option<NaiveDate>,
    #[arg(long)]
    pub notes: Option<String>,
    #[arg(long)]
    pub attendant: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = Config::new(&cli.api_url, &cli.socket_url, cli.token_file)?;
    commands::run(cli.command, &config).await
}
