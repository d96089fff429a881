//! Plain-text rendering for the terminal.

use housekeeping_client::RoomSheet;
use housekeeping_core::notices::{Notice, NoticeLevel};
use housekeeping_core::rooms::Room;

const HEADERS: [&str; 7] = [
    "Room",
    "Status",
    "Occupancy",
    "Pet",
    "Check-in",
    "Check-out",
    "Notes",
];

fn row(room: &Room) -> [String; 7] {
    [
        room.number.clone(),
        room.status.to_string(),
        room.occupancy_status
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default(),
        if room.has_pet() { "yes" } else { "" }.to_string(),
        room.check_in.clone().unwrap_or_default(),
        room.check_out.clone().unwrap_or_default(),
        room.notes.clone().unwrap_or_default(),
    ]
}

pub fn render_rooms(rooms: &[Room]) -> String {
    if rooms.is_empty() {
        return "No rooms.\n".to_string();
    }

    let rows: Vec<[String; 7]> = rooms.iter().map(row).collect();
    let mut widths = HEADERS.map(|header| header.chars().count());
    for cells in &rows {
        for (width, cell) in widths.iter_mut().zip(cells) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, &HEADERS.map(str::to_string), &widths);
    push_line(&mut out, &widths.map(|width| "-".repeat(width)), &widths);
    for cells in &rows {
        push_line(&mut out, cells, &widths);
    }
    out
}

fn push_line(out: &mut String, cells: &[String; 7], widths: &[usize; 7]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(line.trim_end());
    out.push('\n');
}

pub fn render_sheets(sheets: &[RoomSheet]) -> String {
    if sheets.is_empty() {
        return "No room sheets for this date.\n".to_string();
    }
    sheets
        .iter()
        .map(|sheet| format!("{}\t{}\n", sheet.label(), sheet.secure_url))
        .collect()
}

pub fn render_notice(notice: &Notice) -> String {
    match notice.level {
        NoticeLevel::Success => format!("ok: {}", notice.message),
        NoticeLevel::Error => format!("error: {}", notice.message),
    }
}
