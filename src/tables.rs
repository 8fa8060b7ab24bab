use chrono_tz::Tz;
use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};
use itertools::Itertools;

use crate::{
    core::{arbitrage::PricePair, record::FlowRecord, summary::RunSummary},
    fmt::FormattedPercentage,
    quantity::{Zero, cost::Cost, energy::MegawattHours},
};

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .apply_modifier(modifiers::UTF8_ROUND_CORNERS)
        .enforce_styling();
    table
}

fn energy_cell(energy: MegawattHours, color: Color) -> Cell {
    let cell = Cell::new(energy).set_alignment(CellAlignment::Right);
    if energy > MegawattHours::EPSILON { cell.fg(color) } else { cell.add_attribute(Attribute::Dim) }
}

fn cost_cell(cost: Cost) -> Cell {
    Cell::new(cost).set_alignment(CellAlignment::Right).fg(if cost >= Cost::ZERO {
        Color::Green
    } else {
        Color::Red
    })
}

pub fn build_records_table(records: &[FlowRecord], time_zone: Tz) -> Table {
    let mut table = new_table();
    table.set_header(vec![
        "Date", "Start", "Price", "Surplus", "Deficit", "OZE", "ARBI", "Action", "Reason", "Import",
        "Export", "Limits", "Cash",
    ]);
    for record in records {
        let start = record.timestamp.with_timezone(&time_zone);
        let action = record.arbitrage.action;
        table.add_row(vec![
            Cell::new(start.format("%b %d")).add_attribute(Attribute::Dim),
            Cell::new(start.format("%H:%M")),
            Cell::new(record.price).set_alignment(CellAlignment::Right),
            energy_cell(record.surplus, Color::Green),
            energy_cell(record.deficit, Color::DarkYellow),
            Cell::new(FormattedPercentage(record.oze.fill)).set_alignment(CellAlignment::Right),
            Cell::new(FormattedPercentage(record.arbi.fill)).set_alignment(CellAlignment::Right),
            Cell::new(action).fg(action.color()),
            Cell::new(record.arbitrage.reason.map(|reason| reason.to_string()).unwrap_or_default())
                .add_attribute(Attribute::Dim),
            energy_cell(record.settlement.grid().import, Color::Red),
            energy_cell(record.settlement.grid().export, Color::Green),
            Cell::new(record.bindings.iter().join(", ")).fg(
                record.bindings.iter().map(|binding| binding.color()).next().unwrap_or(Color::Reset),
            ),
            cost_cell(record.cash_flow.total),
        ]);
    }
    table
}

pub fn build_pairs_table(pairs: &[PricePair], time_zone: Tz) -> Table {
    let mut table = new_table();
    table.set_header(vec![
        "Day", "Rank", "Low", "High", "Low price", "High price", "Spread", "Threshold", "Admitted",
    ]);
    for pair in pairs {
        let (admission, color) = match (pair.admitted, pair.forced_fill, pair.is_free) {
            (true, _, true) => ("free", Color::Cyan),
            (true, true, false) => ("forced", Color::DarkYellow),
            (true, false, false) => ("yes", Color::Green),
            (false, _, _) => ("no", Color::Red),
        };
        table.add_row(vec![
            Cell::new(pair.day.format("%b %d")).add_attribute(Attribute::Dim),
            Cell::new(pair.rank).set_alignment(CellAlignment::Right),
            Cell::new(pair.low.with_timezone(&time_zone).format("%H:%M")),
            Cell::new(pair.high.with_timezone(&time_zone).format("%H:%M")),
            Cell::new(pair.price_low).set_alignment(CellAlignment::Right),
            Cell::new(pair.price_high).set_alignment(CellAlignment::Right),
            Cell::new(pair.spread).set_alignment(CellAlignment::Right).fg(if pair.qualifies {
                Color::Green
            } else {
                Color::Reset
            }),
            Cell::new(pair.threshold).set_alignment(CellAlignment::Right).add_attribute(Attribute::Dim),
            Cell::new(admission).fg(color),
        ]);
    }
    table
}

pub fn build_summary_table(summary: &RunSummary) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Total", "Value"]);
    let energies = [
        ("Generation", summary.generation, Color::Reset),
        ("Load", summary.load, Color::Reset),
        ("Grid import", summary.grid.import, Color::Red),
        ("Grid export", summary.grid.export, Color::Green),
        ("Arbitrage import", summary.arbitrage_grid.import, Color::Red),
        ("Arbitrage export", summary.arbitrage_grid.export, Color::Green),
        ("Stored", summary.store.import, Color::Reset),
        ("Drawn", summary.store.export, Color::Reset),
        ("Efficiency loss", summary.efficiency_loss, Color::DarkYellow),
        ("Idle loss", summary.idle_loss, Color::DarkYellow),
        ("Spill", summary.spill, Color::DarkYellow),
        ("Curtailment", summary.curtailment, Color::Red),
        ("Unserved", summary.unserved, Color::Red),
        ("Final OZE", summary.final_oze_soc, Color::Reset),
        ("Final ARBI", summary.final_arbi_soc, Color::Reset),
    ];
    for (name, energy, color) in energies {
        table.add_row(vec![Cell::new(name), energy_cell(energy, color)]);
    }
    table.add_row(vec![
        Cell::new("Steps"),
        Cell::new(summary.n_steps).set_alignment(CellAlignment::Right),
    ]);
    table.add_row(vec![
        Cell::new("Charging / discharging"),
        Cell::new(format!("{} / {}", summary.n_charging_steps, summary.n_discharging_steps))
            .set_alignment(CellAlignment::Right),
    ]);
    table.add_row(vec![
        Cell::new("Cycles"),
        Cell::new(summary.n_cycles).set_alignment(CellAlignment::Right),
    ]);
    table.add_row(vec![Cell::new("Cash flow"), cost_cell(summary.cash_flow)]);
    table.add_row(vec![Cell::new("Arbitrage cash flow"), cost_cell(summary.arbitrage_cash_flow)]);
    table
}
