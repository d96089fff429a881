//! Command handlers.

use std::io::Write;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use log::{debug, info};

use housekeeping_client::{HousekeepingClient, ProgressFn, ReportUpload, UploadProgress};
use housekeeping_core::auth::{AuthSession, LoginRequest};
use housekeeping_core::rooms::{
    DateRange, Room, RoomFilter, RoomId, RoomPatch, RoomScope, SortKey,
};
use housekeeping_core::sync::{
    ConnectionState, MemoryChannel, PushChannel, RoomView, ToggleOutcome, ViewOptions,
};

use crate::config::Config;
use crate::credentials::FileCredentialStore;
use crate::table;
use crate::{Command, EditArgs, ListArgs, PetArg};

const UPLOAD_SUCCESS_MESSAGE: &str = "Upload successful";

pub async fn run(command: Command, config: &Config) -> Result<()> {
    let session = AuthSession::new(FileCredentialStore::new(&config.token_file));

    match command {
        Command::Login { number, password } => login(config, &session, number, password).await,
        Command::Logout => {
            session.logout()?;
            println!("Signed out.");
            Ok(())
        }
        Command::Rooms(args) => list_rooms(authenticated(config, &session)?.0, &args).await,
        Command::Toggle { room, date } => {
            toggle(authenticated(config, &session)?.0, &room, date).await
        }
        Command::Edit(args) => edit(authenticated(config, &session)?.0, args).await,
        Command::Import { date } => import(authenticated(config, &session)?.0, date).await,
        Command::Upload { file, date } => {
            upload(&authenticated(config, &session)?.0, file, date).await
        }
        Command::Sheets { date } => {
            let (client, _) = authenticated(config, &session)?;
            let sheets = client.room_sheets(date).await?;
            print!("{}", table::render_sheets(&sheets));
            Ok(())
        }
        Command::Watch(args) => {
            let (client, token) = authenticated(config, &session)?;
            let channel: Arc<dyn PushChannel> = Arc::new(config.channel(&token));
            watch(client, channel, &args).await
        }
    }
}

/// Client carrying the stored token; fails with a sign-in hint when there is none.
fn authenticated(
    config: &Config,
    session: &AuthSession<FileCredentialStore>,
) -> Result<(HousekeepingClient, String)> {
    let token = session.require_token()?;
    Ok((config.client(Some(token.clone()))?, token))
}

async fn login(
    config: &Config,
    session: &AuthSession<FileCredentialStore>,
    number: String,
    password: String,
) -> Result<()> {
    let client = config.client(None)?;
    session
        .login(&client, LoginRequest { number, password })
        .await
        .context("Login failed")?;
    println!("Signed in.");
    Ok(())
}

fn scope_for(date: Option<NaiveDate>) -> RoomScope {
    date.map(RoomScope::Date).unwrap_or(RoomScope::All)
}

fn pet_flag(pet: PetArg) -> bool {
    matches!(pet, PetArg::Yes)
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn filter_from(args: &ListArgs) -> RoomFilter {
    RoomFilter {
        status: args.status.map(Into::into),
        occupancy: args.occupancy.map(Into::into),
        pet: args.pet.map(pet_flag),
        date_range: args.from.map(|start| DateRange {
            field: args.range_field.into(),
            start: format_date(start),
            end: args.to.map(format_date),
        }),
    }
}

/// A view for one-shot commands: one pull, no live updates.
async fn load_view(client: HousekeepingClient, scope: RoomScope) -> Result<RoomView> {
    let channel: Arc<dyn PushChannel> = Arc::new(MemoryChannel::new());
    let view = RoomView::new(Arc::new(client), channel, scope, ViewOptions::default());
    view.refresh().await?;
    Ok(view)
}

/// Finds a room by id, falling back to its number.
fn resolve_room(rooms: &[Room], key: &str) -> Result<RoomId> {
    let key = key.trim();
    rooms
        .iter()
        .find(|room| room.id.as_str() == key)
        .or_else(|| {
            rooms
                .iter()
                .find(|room| room.number.eq_ignore_ascii_case(key))
        })
        .map(|room| room.id.clone())
        .with_context(|| format!("No room matches '{}'", key))
}

async fn list_rooms(client: HousekeepingClient, args: &ListArgs) -> Result<()> {
    let view = load_view(client, scope_for(args.date)).await?;
    let rooms = view.filtered(&filter_from(args), SortKey::from(args.sort));
    print!("{}", table::render_rooms(&rooms));
    Ok(())
}

async fn toggle(client: HousekeepingClient, key: &str, date: Option<NaiveDate>) -> Result<()> {
    let view = load_view(client, scope_for(date)).await?;
    let id = resolve_room(&view.rooms(), key)?;

    match view.toggle_status(&id).await? {
        ToggleOutcome::Toggled { from, to } => {
            let number = view.room(&id).map(|room| room.number).unwrap_or_default();
            println!("Room {}: {} -> {}", number, from, to);
        }
        ToggleOutcome::Skipped { status } => {
            println!("Room status is {}; only clean and dirty rooms can be toggled.", status);
        }
    }
    Ok(())
}

fn patch_from(id: RoomId, args: &EditArgs) -> RoomPatch {
    let mut patch = RoomPatch::new(id);
    patch.status = args.status.map(Into::into);
    patch.occupancy_status = args.occupancy.map(Into::into);
    patch.pet = args.pet.map(pet_flag);
    patch.guest_status = args.guest_status.clone();
    patch.check_in = args.check_in.map(format_date);
    patch.check_out = args.check_out.map(format_date);
    patch.notes = args.notes.clone();
    patch.assigned_attendant = args.attendant.clone();
    patch
}

async fn edit(client: HousekeepingClient, args: EditArgs) -> Result<()> {
    let view = load_view(client, scope_for(args.date)).await?;
    let id = resolve_room(&view.rooms(), &args.room)?;

    let patch = patch_from(id.clone(), &args);
    if patch.is_empty() {
        bail!("Nothing to change; pass at least one field to edit");
    }
    view.save_edits(patch).await?;

    if let Some(room) = view.room(&id) {
        print!("{}", table::render_rooms(&[room]));
    }
    Ok(())
}

async fn import(client: HousekeepingClient, date: NaiveDate) -> Result<()> {
    let view = RoomView::new(
        Arc::new(client),
        Arc::new(MemoryChannel::new()),
        RoomScope::Date(date),
        ViewOptions::default(),
    );
    let message = view.import_to_housekeeping().await?;
    println!("{}", message);
    Ok(())
}

async fn upload(
    client: &HousekeepingClient,
    file: std::path::PathBuf,
    date: NaiveDate,
) -> Result<()> {
    let bytes = std::fs::read(&file)
        .with_context(|| format!("Failed to read report {}", file.display()))?;
    let file_name = file
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "report.pdf".to_string());

    let progress: ProgressFn = Arc::new(|update: UploadProgress| {
        eprint!("\rUploading... {:>3}%", update.percent());
        let _ = std::io::stderr().flush();
    });
    let message = client
        .upload_report(ReportUpload::new(date, file_name, bytes), Some(progress))
        .await;
    eprintln!();

    println!("{}", upload_message(message?));
    Ok(())
}

/// The backend's message, or the generic confirmation when it sent none.
fn upload_message(message: Option<String>) -> String {
    message
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| UPLOAD_SUCCESS_MESSAGE.to_string())
}

async fn watch(
    client: HousekeepingClient,
    channel: Arc<dyn PushChannel>,
    args: &ListArgs,
) -> Result<()> {
    let filter = filter_from(args);
    let sort = SortKey::from(args.sort);
    let view = RoomView::activate(
        Arc::new(client),
        channel,
        scope_for(args.date),
        ViewOptions::default(),
    )
    .await;

    let mut revisions = view.watch_revision();
    let mut connection = view.watch_connection();
    let mut shown_notices = 0;

    let render = |view: &RoomView, shown_notices: &mut usize| {
        let notices = view.notices();
        for notice in notices.iter().skip(*shown_notices) {
            eprintln!("{}", table::render_notice(notice));
        }
        *shown_notices = notices.len();
        println!("\n{} ({:?})", view.scope(), view.connection_state());
        print!("{}", table::render_rooms(&view.filtered(&filter, sort)));
    };
    render(&view, &mut shown_notices);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Stopping live updates");
                break;
            }
            changed = revisions.changed() => {
                if changed.is_err() {
                    break;
                }
                render(&view, &mut shown_notices);
            }
            changed = connection.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *connection.borrow_and_update();
                debug!("Connection state: {:?}", state);
                if state != ConnectionState::Connecting {
                    eprintln!("Live updates: {:?}", state);
                }
            }
        }
    }

    view.deactivate();
    Ok(())
}
